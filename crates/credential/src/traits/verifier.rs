//! Face verifier seam
//!
//! The external service that decides whether a captured image matches a
//! subject. The similarity computation is entirely server-side; this crate
//! only carries the image over and models the verdict.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{FaceImage, SubjectId, VerificationReport};

/// Errors a verifier implementation can surface
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No bearer credential available; the request was not attempted
    #[error("authentication missing: no bearer credential available")]
    AuthenticationMissing,

    /// Transport failure or server-side rejection of the request itself
    #[error("verification request failed: {reason}")]
    RequestFailed {
        /// What the transport or server reported
        reason: String,
    },

    /// Response arrived but required fields were missing or malformed
    #[error("verifier response invalid: {detail}")]
    InvalidResponse {
        /// Which field was missing or malformed
        detail: String,
    },
}

/// Decides whether a captured image belongs to a subject
///
/// A transport failure is a [`VerifyError`], never a
/// [`VerificationStatus::Rejected`]: rejection is a verdict only the
/// remote verifier may return.
///
/// [`VerificationStatus::Rejected`]: crate::core::VerificationStatus::Rejected
#[async_trait]
pub trait FaceVerifier: Send + Sync {
    /// Submit `image` for verification against `subject`
    async fn verify(
        &self,
        subject: &SubjectId,
        image: FaceImage,
    ) -> Result<VerificationReport, VerifyError>;
}
