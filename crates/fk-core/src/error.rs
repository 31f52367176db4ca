//! Error types for FrameKit

use thiserror::Error;

/// Core error type shared by buffers and stages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FkError {
    #[error("Construction failed: {0}")]
    Construction(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),

    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0} used after release")]
    Released(&'static str),

    #[error("DSP error: {0}")]
    Dsp(String),
}

impl FkError {
    /// Check that a call-time length matches the construction-time one
    #[inline]
    pub fn check_len(expected: usize, actual: usize) -> FkResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::SizeMismatch { expected, actual })
        }
    }
}

/// Result type alias
pub type FkResult<T> = Result<T, FkError>;
