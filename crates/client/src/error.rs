//! Client error types

use thiserror::Error;

/// Errors surfaced by the validation-service client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("http transport failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The server answered with an unexpected status and no usable body
    #[error("server returned HTTP {status}")]
    Status {
        /// HTTP status code as received
        status: u16,
    },

    /// The body arrived but could not be decoded into the expected shape
    #[error("response payload could not be decoded: {detail}")]
    Decode {
        /// What was missing or malformed
        detail: String,
    },

    /// No bearer token is set, or the server refused the one presented
    #[error("bearer token missing or rejected")]
    Unauthorized,

    /// The client configuration is unusable
    #[error("invalid client configuration: {reason}")]
    Config {
        /// What failed validation
        reason: String,
    },
}

/// Convenience alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_lowercase_and_specific() {
        let err = ClientError::Status { status: 503 };
        assert_eq!(err.to_string(), "server returned HTTP 503");

        let err = ClientError::Config {
            reason: "base URL must use http or https".into(),
        };
        assert!(err.to_string().contains("base URL"));
    }
}
