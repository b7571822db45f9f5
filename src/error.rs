use thiserror::Error;
use std::io;

use crate::types::Span;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // The sentinel alphabet is exhausted by the input text
    #[error("No free padding character: {0}")]
    PaddingExhausted(String),

    #[error("Overlapping regions: {existing} : {incoming}")]
    OverlappingRegion {
        existing: Span,
        incoming: Span,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error conversions
impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn padding<S: Into<String>>(msg: S) -> Self {
        Error::PaddingExhausted(msg.into())
    }

    /// True for the errors that signal a caller bug rather than bad data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::PaddingExhausted(_) | Error::OverlappingRegion { .. })
    }
}
