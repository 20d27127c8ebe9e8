//! Registry error types

use std::path::PathBuf;

use cue_engine::EngineError;
use thiserror::Error;

/// Errors surfaced by [`crate::SoundManager`] operations.
///
/// Operations on an unknown sound id are *not* errors: they are logged
/// warnings and no-ops, matching the registry's forgiving contract.
#[derive(Error, Debug)]
pub enum SoundError {
    /// Caller bug: empty identifier or path. Nothing was touched.
    #[error("{what} must be a non-empty string")]
    Usage { what: &'static str },

    /// The engine could not decode or prepare the asset; the registry is
    /// unchanged.
    #[error("failed to load '{path}' as '{id}': {source}")]
    Load {
        id: String,
        path: PathBuf,
        source: EngineError,
    },

    /// The engine rejected a start/stop transition; the entry stays in
    /// whatever state the engine left it.
    #[error("playback failure for '{id}': {source}")]
    Playback { id: String, source: EngineError },
}

pub type SoundResult<T> = Result<T, SoundError>;
