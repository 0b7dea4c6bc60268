use thiserror::Error;

use crate::SessionState;

/// Error types for macro recording and playback
#[derive(Debug, Error)]
pub enum MacroRecorderError {
    /// Error when initializing the recorder
    #[error("Failed to initialize recorder: {0}")]
    InitializationError(String),

    /// The global input hook could not be registered
    #[error("Failed to register input hook: {0}")]
    HookError(String),

    /// Error when saving the recorded macro
    #[error("Failed to save macro: {0}")]
    SaveError(String),

    /// Error when loading a macro file
    #[error("Failed to load macro: {0}")]
    LoadError(String),

    /// Error when grabbing or persisting a screen snapshot
    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    /// Error when synthesizing an input action
    #[error("Failed to synthesize input: {0}")]
    SynthesisError(String),

    /// The operation requires an idle session
    #[error("Recorder is busy ({0:?})")]
    Busy(SessionState),

    /// The recorder actor is gone
    #[error("Recorder task has shut down")]
    Disconnected,

    /// Error when serializing or deserializing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error when encoding or decoding a raster
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for macro recorder operations
pub type Result<T> = std::result::Result<T, MacroRecorderError>;
