//! Error types for request dispatch failures.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading, parsing, or answering requests.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request line could not be parsed as a request.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Parser diagnostic.
        message: String,
        /// Underlying JSON error, when there is one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Request line exceeds the configured limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Size of the line in bytes.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// Reading requests or writing replies failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A reply could not be serialised.
    #[error("failed to serialise reply: {0}")]
    SerializeReply(#[source] serde_json::Error),
}

impl DispatchError {
    /// Status code of the reply describing this error.
    ///
    /// Protocol violations are the client's fault; IO and serialisation
    /// failures are the daemon's.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MalformedRequest { .. } | Self::RequestTooLarge { .. } => 400,
            Self::Io(_) | Self::SerializeReply(_) => 500,
        }
    }

    /// Short machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "malformed_request",
            Self::RequestTooLarge { .. } => "request_too_large",
            Self::Io(_) => "io",
            Self::SerializeReply(_) => "serialize_reply",
        }
    }

    /// Creates a malformed request error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a request too large error.
    #[must_use]
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}
