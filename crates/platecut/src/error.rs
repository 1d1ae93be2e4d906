//! Error types for plate splitting.

use platecut_arc::ArcError;
use thiserror::Error;

/// Errors that can occur while splitting a plate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    /// Ring or line is too short, or holds non-finite or repeated points.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The geometry does not determine a unique cut.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Invalid split settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl From<ArcError> for SplitError {
    fn from(err: ArcError) -> Self {
        SplitError::DegenerateGeometry(err.to_string())
    }
}

/// Result type for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;
