//! The short-lived access credential
//!
//! A credential is an opaque code minted by the remote issuer together with
//! the validity window the validation service will honour it for. It is
//! never reused: once a replacement is issued the old code is discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single issued access credential
///
/// The `code` is the payload a display renders as a QR image and a validator
/// submits for acceptance. It is opaque to this crate; all semantics
/// (uniqueness, unguessability, server-side expiry) belong to the issuer.
///
/// # Examples
///
/// ```
/// use turnstile_credential::Credential;
///
/// let cred = Credential::new("ABC123", 30);
/// assert_eq!(cred.code(), "ABC123");
/// assert_eq!(cred.validity_seconds(), 30);
/// assert!(!cred.is_stale());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque token rendered as the QR payload
    code: String,

    /// When the issuer minted this credential
    issued_at: DateTime<Utc>,

    /// Window during which the validation service accepts `code`
    validity_seconds: u64,
}

impl Credential {
    /// Create a credential issued now
    pub fn new(code: impl Into<String>, validity_seconds: u64) -> Self {
        Self {
            code: code.into(),
            issued_at: Utc::now(),
            validity_seconds,
        }
    }

    /// Override the issue timestamp
    ///
    /// Intended for tests and for replaying issuer responses that carry
    /// their own clock.
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// The opaque access code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// When the issuer minted this credential
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Validity window in whole seconds
    pub fn validity_seconds(&self) -> u64 {
        self.validity_seconds
    }

    /// Time elapsed since issuance
    ///
    /// Clock skew can make `issued_at` sit slightly in the future; age is
    /// clamped at zero rather than going negative.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.issued_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the validation service would still accept this code
    ///
    /// True once `now - issued_at >= validity_seconds`.
    pub fn is_stale(&self) -> bool {
        self.age() >= Duration::from_secs(self.validity_seconds)
    }
}
