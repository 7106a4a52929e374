//! Error types for Handsight
//!
//! The per-frame engines never fail; malformed frames degrade to an empty
//! result. These errors only surface at the parsing and binding boundaries.

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that can occur while reading or processing landmark frames
#[derive(Debug, Error)]
pub enum HandError {
    #[error("Failed to parse frame payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] ValidationError),

    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Projection failed for landmark {0}")]
    ProjectionFailed(usize),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
