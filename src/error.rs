//! Error types for the head anchoring library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Recording or pose record (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The video frame source failed or could not be opened
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// The landmark detector failed for a frame or could not be created
    #[error("Detector error: {0}")]
    Detector(String),

    /// The render sink rejected a pose
    #[error("Render sink error: {0}")]
    RenderSink(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
