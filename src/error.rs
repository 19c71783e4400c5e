//! Error types for filter design and resampling

use thiserror::Error;

/// Result type for resampler operations
pub type Result<T> = std::result::Result<T, ResampleError>;

/// Errors that can occur while designing filters, resampling or loading configuration
#[derive(Error, Debug)]
pub enum ResampleError {
    /// A parameter is outside its valid range (cutoff, Q, sample rate, L, M, FFT size)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file could not be read, parsed or written
    #[error("Config error: {0}")]
    Config(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResampleError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ResampleError::InvalidParameter(message.into())
    }
}
