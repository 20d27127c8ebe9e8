//! Engine error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to query device config: {0}")]
    ConfigError(String),

    #[error("failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("audio stream error: {0}")]
    StreamError(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to decode '{path}': {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("no decodable audio in '{0}'")]
    InvalidFile(PathBuf),

    #[error("unsupported load mode: {0}")]
    Unsupported(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
