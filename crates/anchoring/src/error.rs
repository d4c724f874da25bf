//! Codec failures
//!
//! Every codec operation returns one of these instead of panicking. They carry
//! enough context (selector text, offset, tag) for a caller to log or fall
//! back gracefully.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnchorError>;

#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("No element found matching '{selector}'")]
    NoMatch { selector: String },

    #[error("No text position found at offset {offset}")]
    OffsetOutOfRange { offset: i64 },

    #[error("Unsupported {tag} selector")]
    Unsupported { tag: String },

    #[error("Range construction failed: {reason}")]
    RangeConstructionFailed { reason: String },

    #[error("Invalid selection boundary: {reason}")]
    InvalidBoundary { reason: String },

    #[error("Malformed selector: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl AnchorError {
    pub fn no_match(selector: impl Into<String>) -> Self {
        AnchorError::NoMatch {
            selector: selector.into(),
        }
    }

    pub fn offset_out_of_range(offset: impl TryInto<i64>) -> Self {
        AnchorError::OffsetOutOfRange {
            offset: offset.try_into().unwrap_or(i64::MAX),
        }
    }

    pub fn unsupported(tag: impl Into<String>) -> Self {
        AnchorError::Unsupported { tag: tag.into() }
    }
}
