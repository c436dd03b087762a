//! Face-verification outcomes
//!
//! Entry validation can also be face-based: the validator captures an image
//! and submits it to an external verifier, which decides. This module models
//! the outcome as an explicit three-state result. No similarity computation
//! happens on this side; a verdict always comes from the verifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::SubjectId;

/// Outcome of a face-verification attempt
///
/// `Pending` is the state before the external verifier has answered;
/// terminal verdicts are `Accepted` and `Rejected`. A transport failure is
/// an error on the calling operation, not a `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Submitted (or about to be); no verdict yet
    Pending,
    /// The verifier matched the image to the subject
    Accepted,
    /// The verifier declined the match
    Rejected,
}

impl VerificationStatus {
    /// Whether the verifier has answered
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A verifier's answer together with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Verdict for this attempt
    pub status: VerificationStatus,

    /// Who the image was checked against
    pub subject_id: SubjectId,

    /// Human-readable message from the verifier (shown to the operator)
    pub message: String,

    /// When the verdict arrived
    pub checked_at: DateTime<Utc>,
}

impl VerificationReport {
    /// Build a report with the verdict timestamped now
    pub fn new(
        status: VerificationStatus,
        subject_id: SubjectId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            subject_id,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }

    /// Whether entry should be granted on this report
    pub fn is_accepted(&self) -> bool {
        self.status == VerificationStatus::Accepted
    }
}

/// An image captured for verification
///
/// Carried as raw bytes plus the metadata the upload needs. Capture itself
/// (camera, framing) happens outside this crate.
#[derive(Debug, Clone)]
pub struct FaceImage {
    bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
}

impl FaceImage {
    /// Wrap captured image bytes
    ///
    /// # Example
    ///
    /// ```
    /// use turnstile_credential::FaceImage;
    ///
    /// let image = FaceImage::new(vec![0xFF, 0xD8], "face.jpg", "image/jpeg");
    /// assert_eq!(image.file_name(), "face.jpg");
    /// ```
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// JPEG convenience constructor with the upload name the service expects
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "face.jpg", "image/jpeg")
    }

    /// Raw image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the image, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Upload file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type of the capture
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the capture carries any data at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_not_decided() {
        assert!(!VerificationStatus::Pending.is_decided());
        assert!(VerificationStatus::Accepted.is_decided());
        assert!(VerificationStatus::Rejected.is_decided());
    }

    #[test]
    fn only_accepted_reports_grant_entry() {
        let subject = SubjectId::new("member-1");
        let accepted =
            VerificationReport::new(VerificationStatus::Accepted, subject.clone(), "match");
        let rejected = VerificationReport::new(VerificationStatus::Rejected, subject, "no match");

        assert!(accepted.is_accepted());
        assert!(!rejected.is_accepted());
    }

    #[test]
    fn status_serialises_snake_case() {
        let json = serde_json::to_string(&VerificationStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }

    #[test]
    fn jpeg_constructor_fills_upload_metadata() {
        let image = FaceImage::jpeg(vec![1, 2, 3]);
        assert_eq!(image.file_name(), "face.jpg");
        assert_eq!(image.mime_type(), "image/jpeg");
        assert!(!image.is_empty());
    }
}
