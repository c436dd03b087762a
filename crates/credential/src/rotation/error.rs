//! Rotation-specific error types
//!
//! This module defines all errors that can occur while issuing and rotating
//! credentials. The first three variants form the issuance taxonomy every
//! [`CredentialIssuer`](crate::traits::CredentialIssuer) implementation maps
//! into; the rest are operational errors of the manager itself.

use thiserror::Error;

/// Errors that can occur during credential rotation
#[derive(Debug, Error)]
pub enum RotationError {
    /// No valid bearer credential available; issuance was not attempted.
    /// Fatal to the `start()` call that hit it - retrying without a token
    /// cannot succeed.
    #[error("authentication missing: no bearer credential available")]
    AuthenticationMissing,

    /// Network failure or server-side rejection during issuance.
    /// Recoverable: the manager retries within its policy, and a fresh
    /// `start()` is always safe.
    #[error("credential issuance failed: {reason}")]
    IssuanceFailed {
        /// What the transport or server reported
        reason: String,
    },

    /// Issuance response arrived but required fields were missing or
    /// nonsense (empty code, zero validity). Handled exactly like
    /// `IssuanceFailed`.
    #[error("issuer response invalid: {detail}")]
    InvalidResponse {
        /// Which field was missing or out of range
        detail: String,
    },

    /// `start()` called while a rotation loop is already running
    #[error("rotation already running for subject {subject_id}")]
    AlreadyRunning {
        /// Subject of the run that is already live
        subject_id: String,
    },

    /// Bounded retry gave up
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Name of the retried operation
        operation: String,
        /// Attempts made before giving up
        attempts: u32,
        /// Error of the final attempt
        last_error: String,
    },

    /// Configuration rejected at construction time
    #[error("invalid rotation config: {reason}")]
    InvalidConfig {
        /// Which parameter failed validation
        reason: String,
    },
}

impl RotationError {
    /// Whether retrying the issuance can possibly help
    ///
    /// `AuthenticationMissing` is permanent until a new bearer token
    /// appears, so the retry loop gives up on it immediately.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IssuanceFailed { .. } | Self::InvalidResponse { .. }
        )
    }
}

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuance_failures_are_recoverable() {
        assert!(
            RotationError::IssuanceFailed {
                reason: "503".into()
            }
            .is_recoverable()
        );
        assert!(
            RotationError::InvalidResponse {
                detail: "missing data".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn missing_auth_is_not_recoverable() {
        assert!(!RotationError::AuthenticationMissing.is_recoverable());
        assert!(
            !RotationError::AlreadyRunning {
                subject_id: "member-1".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn display_keeps_the_server_reason() {
        let err = RotationError::IssuanceFailed {
            reason: "subject suspended".into(),
        };
        assert_eq!(
            err.to_string(),
            "credential issuance failed: subject suspended"
        );
    }
}
