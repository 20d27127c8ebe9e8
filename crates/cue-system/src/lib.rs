//! cue-system: named-sound registry and engine lifecycle
//!
//! [`SoundManager`] is an explicitly owned context object: it holds the
//! audio engine instance and a map from string identifiers to loaded
//! sounds, and is constructed on initialization and consumed on shutdown.
//! Hosts that need a process-wide instance keep one themselves (the C
//! bridge does); the library never hides a singleton, so tests and
//! multi-system hosts can run independent instances side by side.
//!
//! Playback follows a small per-sound state machine:
//!
//! ```text
//! Stopped@0 ──play──▶ Playing ──stop──▶ Stopped@0
//!                       │  ▲
//!                    pause resume        (pause preserves the position,
//!                       ▼  │              stop rewinds to frame 0)
//!                  Stopped@cursor
//! ```

mod error;
mod manager;
mod params;

pub use error::{SoundError, SoundResult};
pub use manager::SoundManager;
pub use params::MIN_PITCH;
