//! cue-bridge: C ABI for the Cuedeck sound system
//!
//! A flat `extern "C"` surface over one process-wide
//! [`SoundManager`](cue_system::SoundManager) instance:
//!
//! - `audio_*`: lifecycle and master gain
//! - `sound_*`: per-sound load/playback/parameter operations
//! - `listener_*`: spatialization listener
//!
//! Conventions: identifiers and paths are null-terminated UTF-8 strings;
//! functions returning `i32` use 1 for success/true and 0 for
//! failure/false; every failure and warning is reported on the `log`
//! channel (env_logger, `RUST_LOG` to adjust). No panic crosses the ABI:
//! each export runs inside a catch-unwind guard.
//!
//! Mutating calls serialize on a write lock, so hosts may call in from
//! multiple threads even though the registry itself is single-writer.

// FFI functions receive raw pointers from the host
#![allow(clippy::not_unsafe_ptr_arg_deref)]

#[macro_use]
mod helpers;

mod audio_ffi;
mod listener_ffi;
mod sound_ffi;

pub use audio_ffi::*;
pub use listener_ffi::*;
pub use sound_ffi::*;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use cue_engine::MixerEngine;
use cue_system::SoundManager;

/// The process-wide sound system. The library itself is instance-based;
/// only the C boundary pins one global instance.
static SOUND_SYSTEM: Lazy<RwLock<Option<SoundManager<MixerEngine>>>> =
    Lazy::new(|| RwLock::new(None));

/// Run `f` against the global system, or warn and return `default` when
/// the system has not been initialized (or was shut down).
fn with_system<R>(
    op: &str,
    default: R,
    f: impl FnOnce(&mut SoundManager<MixerEngine>) -> R,
) -> R {
    match SOUND_SYSTEM.write().as_mut() {
        Some(system) => f(system),
        None => {
            log::warn!("{op}: sound system not initialized");
            default
        }
    }
}

/// Serializes tests that touch the global system state.
#[cfg(test)]
static TEST_MUTEX: Lazy<parking_lot::Mutex<()>> = Lazy::new(|| parking_lot::Mutex::new(()));
