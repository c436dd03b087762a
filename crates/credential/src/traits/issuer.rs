//! Credential issuer seam
//!
//! The remote service that mints access codes. The rotation manager only
//! ever talks to it through this trait, so tests can script issuance and
//! the transport stays swappable.

use async_trait::async_trait;

use crate::core::{Credential, SubjectId};
use crate::rotation::RotationResult;

/// Mints short-lived credentials for a subject
///
/// Implementations carry their own authentication state (the bearer token
/// obtained from the out-of-scope login flow). A missing bearer must surface
/// as [`RotationError::AuthenticationMissing`] without touching the network;
/// transport and server-side rejections map to `IssuanceFailed`; responses
/// with missing or nonsense fields map to `InvalidResponse`.
///
/// [`RotationError::AuthenticationMissing`]: crate::rotation::RotationError::AuthenticationMissing
///
/// # Example
///
/// ```rust,ignore
/// use turnstile_credential::{Credential, CredentialIssuer, SubjectId};
/// use turnstile_credential::rotation::{RotationError, RotationResult};
///
/// struct FixedIssuer;
///
/// #[async_trait::async_trait]
/// impl CredentialIssuer for FixedIssuer {
///     async fn issue(&self, subject: &SubjectId) -> RotationResult<Credential> {
///         if subject.is_empty() {
///             return Err(RotationError::IssuanceFailed {
///                 reason: "unknown subject".into(),
///             });
///         }
///         Ok(Credential::new("ABC123", 30))
///     }
/// }
/// ```
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Mint a fresh credential for `subject`
    ///
    /// Each successful call returns a brand-new code; the previous one is
    /// dead to the caller the moment this resolves.
    async fn issue(&self, subject: &SubjectId) -> RotationResult<Credential>;
}
