//! Face verification over multipart upload

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};
use uuid::Uuid;

use turnstile_credential::{
    FaceImage, FaceVerifier, SubjectId, VerificationReport, VerificationStatus, VerifyError,
};

use crate::http::{ApiClient, sanitize_body_for_log};
use crate::wire::FaceResponse;

/// Submits captured images to `POST /validate/face/{subjectId}`
///
/// The verdict is the server's alone: `success` maps to `Accepted`, an
/// explicit refusal to `Rejected`. A transport failure or unusable payload
/// is a [`VerifyError`] so a flaky network can never masquerade as a
/// rejection.
pub struct HttpFaceVerifier {
    api: Arc<ApiClient>,
}

impl HttpFaceVerifier {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FaceVerifier for HttpFaceVerifier {
    async fn verify(
        &self,
        subject: &SubjectId,
        image: FaceImage,
    ) -> Result<VerificationReport, VerifyError> {
        let request_id = Uuid::new_v4();

        if image.is_empty() {
            return Err(VerifyError::RequestFailed {
                reason: "captured image is empty".into(),
            });
        }
        if !self.api.has_bearer_token() {
            return Err(VerifyError::AuthenticationMissing);
        }

        let url = self
            .api
            .endpoint(&["validate", "face", subject.as_str()])
            .map_err(|e| VerifyError::RequestFailed {
                reason: e.to_string(),
            })?;

        let file_name = image.file_name().to_owned();
        let mime_type = image.mime_type().to_owned();
        let part = Part::bytes(image.into_bytes())
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| VerifyError::RequestFailed {
                reason: format!("image mime type: {e}"),
            })?;
        let form = Form::new().part("image", part);

        debug!(subject_id = %subject, %request_id, "Submitting face capture");

        let response = self
            .api
            .authorized_post(url)
            .map_err(|_| VerifyError::AuthenticationMissing)?
            .multipart(form)
            .send()
            .await
            .map_err(|e| VerifyError::RequestFailed {
                reason: format!("transport: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(subject_id = %subject, %request_id, status = %status, "Verification rejected: bearer token refused");
            return Err(VerifyError::AuthenticationMissing);
        }

        let body = response.text().await.map_err(|e| VerifyError::RequestFailed {
            reason: format!("reading body: {e}"),
        })?;

        match serde_json::from_str::<FaceResponse>(&body) {
            Ok(parsed) => {
                let verdict = if parsed.success {
                    VerificationStatus::Accepted
                } else {
                    VerificationStatus::Rejected
                };
                let message = parsed.message.unwrap_or_else(|| {
                    match verdict {
                        VerificationStatus::Accepted => "face accepted",
                        _ => "face rejected",
                    }
                    .to_owned()
                });
                debug!(subject_id = %subject, %request_id, verdict = ?verdict, "Verdict received");
                Ok(VerificationReport::new(verdict, subject.clone(), message))
            }
            Err(e) if status.is_success() => Err(VerifyError::InvalidResponse {
                detail: format!("verdict body: {e}"),
            }),
            // No verdict and no success status: a failed request, never a
            // rejection.
            Err(_) => {
                warn!(
                    subject_id = %subject,
                    %request_id,
                    status = %status,
                    body = %sanitize_body_for_log(&body),
                    "Verification failed without a verdict"
                );
                Err(VerifyError::RequestFailed {
                    reason: format!("HTTP {status}"),
                })
            }
        }
    }
}
