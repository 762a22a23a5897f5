//! Error types for the alignment core.
//!
//! Construction-time failures are fatal and surface to the caller. Interactive
//! commands never return these; `DegenerateRange` is the only one produced
//! mid-session and callers recover from it by keeping the previous range.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AlignError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("Malformed input series '{name}': {reason}")]
    MalformedInput { name: String, reason: String },

    #[error("No candidate streams supplied for alignment")]
    EmptyQueue,

    #[error("Stream name '{0}' appears more than once")]
    DuplicateStreamName(String),

    #[error("Stream name '{0}' is reserved for the result structure")]
    ReservedStreamName(String),

    #[error("No finite samples in view to compute an amplitude range")]
    DegenerateRange,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl AlignError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        AlignError::MalformedInput {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
