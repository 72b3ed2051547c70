//! Error types for the smile lab library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "camera")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding, encoding or processing failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A required asset (background, glasses, music) could not be loaded
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// The detection backend could not be initialized
    #[error("Detection backend initialization error: {0}")]
    BackendInit(String),

    /// A detection backend failed while processing a frame
    #[error("Detection error: {0}")]
    Detection(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Frame capture error
    #[error("Capture error: {0}")]
    Capture(String),

    /// Snapshot export error
    #[error("Export error: {0}")]
    Export(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Application-specific error type (alias for main Error type)
pub type AppError = Error;

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
