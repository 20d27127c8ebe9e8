//! cue-engine: the audio subsystem behind the Cuedeck sound registry
//!
//! Owns the output device and everything that touches samples: file
//! decoding, the voice table, spatialization math and the cpal stream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ MixerEngine  │────▶│ MixerState  │────▶│ cpal Stream │
//! │              │     │             │     │             │
//! │ - load/decode│     │ - voices    │     │ - output    │
//! │ - listener   │     │ - render()  │     │   callback  │
//! │ - master gain│     │ - listener  │     │             │
//! └──────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Callers drive sounds through the [`AudioEngine`] / [`EngineSound`]
//! capability traits; [`MixerEngine`] is the default implementation.
//! Sources are fully decoded at load time (no streaming), so playback
//! never touches the filesystem.

mod decode;
mod engine;
mod error;
mod mixer;
mod stream;

pub use decode::{DecodedAudio, decode_file};
pub use engine::{AudioEngine, EngineSound, LoadMode};
pub use error::{EngineError, EngineResult};
pub use mixer::{MixerEngine, MixerSound};

/// Engine configuration
///
/// `None` fields fall back to the output device's defaults.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Output device name; `None` selects the platform default device.
    pub output_device: Option<String>,
    /// Requested output sample rate in Hz.
    pub sample_rate: Option<u32>,
}
