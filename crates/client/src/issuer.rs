//! HTTP-backed credential issuance

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use turnstile_credential::{Credential, CredentialIssuer, RotationError, RotationResult, SubjectId};

use crate::http::{ApiClient, sanitize_body_for_log};
use crate::wire::{GenerateRequest, GenerateResponse};

/// Issues rotating credentials from the campus validation service
///
/// Wraps `POST /validate/qr-code/generate` behind the issuance seam a
/// rotation manager drives. Error mapping follows the rotation taxonomy:
/// a missing or rejected bearer token is `AuthenticationMissing`, transport
/// and server refusals are `IssuanceFailed`, an unusable payload is
/// `InvalidResponse`.
///
/// # Example
///
/// ```rust,ignore
/// let api = Arc::new(ApiClient::new(config)?);
/// let manager = RotationManager::builder()
///     .issuer(Arc::new(HttpCredentialIssuer::new(api)))
///     .subject("member-42")
///     .build()?;
/// ```
pub struct HttpCredentialIssuer {
    api: Arc<ApiClient>,
}

impl HttpCredentialIssuer {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CredentialIssuer for HttpCredentialIssuer {
    async fn issue(&self, subject: &SubjectId) -> RotationResult<Credential> {
        let request_id = Uuid::new_v4();

        // Fail fast without touching the network; the login flow has to run
        // before rotation can.
        if !self.api.has_bearer_token() {
            return Err(RotationError::AuthenticationMissing);
        }

        let url = self
            .api
            .endpoint(&["validate", "qr-code", "generate"])
            .map_err(|e| RotationError::IssuanceFailed {
                reason: e.to_string(),
            })?;

        debug!(subject_id = %subject, %request_id, "Requesting credential");

        let response = self
            .api
            .authorized_post(url)
            .map_err(|_| RotationError::AuthenticationMissing)?
            .json(&GenerateRequest {
                user_id: subject.as_str(),
            })
            .send()
            .await
            .map_err(|e| RotationError::IssuanceFailed {
                reason: format!("transport: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(
                subject_id = %subject,
                %request_id,
                status = %status,
                "Issuance rejected: bearer token refused"
            );
            return Err(RotationError::AuthenticationMissing);
        }

        let body = response
            .text()
            .await
            .map_err(|e| RotationError::IssuanceFailed {
                reason: format!("reading body: {e}"),
            })?;

        if !status.is_success() {
            warn!(
                subject_id = %subject,
                %request_id,
                status = %status,
                body = %sanitize_body_for_log(&body),
                "Issuance failed"
            );
            return Err(RotationError::IssuanceFailed {
                reason: format!("HTTP {status}"),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| RotationError::InvalidResponse {
                detail: format!("malformed payload: {e}"),
            })?;

        if !parsed.success {
            let reason = parsed
                .message
                .unwrap_or_else(|| "issuance refused".to_owned());
            warn!(subject_id = %subject, %request_id, reason = %reason, "Issuance refused by server");
            return Err(RotationError::IssuanceFailed { reason });
        }

        let Some(data) = parsed.data else {
            return Err(RotationError::InvalidResponse {
                detail: "success without data".into(),
            });
        };
        if data.code.is_empty() {
            return Err(RotationError::InvalidResponse {
                detail: "empty code".into(),
            });
        }
        if data.expiration_time == 0 {
            return Err(RotationError::InvalidResponse {
                detail: "zero expirationTime".into(),
            });
        }

        debug!(
            subject_id = %subject,
            %request_id,
            validity_seconds = data.expiration_time,
            "Credential received"
        );

        Ok(Credential::new(data.code, data.expiration_time))
    }
}
