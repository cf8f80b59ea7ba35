//! Error types for the aEi client.
//!
//! # Design
//! Application-level failures (a non-200 `Status` in the body) are data, not
//! errors: the facade returns them untouched. `ApiError::Status` exists only
//! for callers that opt in through `Status::into_result`. Transport failures
//! carry the transport's message so custom `Transport` impls can report too.

use thiserror::Error;

/// Errors returned by the request builders, transports and decoders.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body is not the JSON shape the operation expects.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service reported a non-200 status.
    #[error("service returned {code}: {}", .error.as_deref().unwrap_or("no error message"))]
    Status {
        code: u16,
        error: Option<String>,
        help: Option<String>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An argument cannot be sent as given, e.g. an empty resource id.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_includes_code_and_message() {
        let err = ApiError::Status {
            code: 404,
            error: Some("not found".to_string()),
            help: Some("check id".to_string()),
        };
        assert_eq!(err.to_string(), "service returned 404: not found");
    }

    #[test]
    fn status_error_display_without_message() {
        let err = ApiError::Status {
            code: 500,
            error: None,
            help: None,
        };
        assert_eq!(err.to_string(), "service returned 500: no error message");
    }
}
