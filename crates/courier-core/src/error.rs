//! Error types for callback encoding and decoding.

use thiserror::Error;

/// Errors that can occur while framing or decoding callback data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Token has no valid prefix and is not valid legacy base64 either.
    #[error("malformed token {token:?}: {reason}")]
    MalformedToken { token: String, reason: String },

    /// Action prefix leaves no room for even a hashed payload.
    #[error("callback prefix {prefix:?} uses {overhead} bytes, leaving no room for a payload")]
    PrefixTooLong { prefix: String, overhead: usize },

    /// Callback data does not start with any known action prefix.
    #[error("unknown callback action: {0}")]
    UnknownAction(String),

    /// Page number in a page callback is not a valid integer.
    #[error("invalid page number: {0}")]
    InvalidPage(String),
}

impl CodecError {
    pub(crate) fn malformed(token: &str, reason: impl Into<String>) -> Self {
        CodecError::MalformedToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
