//! Validator role: submit scanned codes for acceptance

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, sanitize_body_for_log};
use crate::wire::{ValidateRequest, ValidateResponse};

/// Verdict of the validation service on one scanned code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeValidation {
    /// Whether entry should be granted
    pub accepted: bool,
    /// Server message shown to the operator
    pub message: String,
}

/// Submits scanned codes to `POST /validate/qr-code`
///
/// A denied code is a normal answer, not an error: the server's verdict
/// comes back as [`CodeValidation`] either way. Errors are reserved for
/// transport failures, authentication problems and unusable payloads.
pub struct CodeValidator {
    api: Arc<ApiClient>,
}

impl CodeValidator {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Submit a scanned code and return the server's verdict
    ///
    /// # Errors
    ///
    /// * `Unauthorized` if no bearer token is set or the server refused it
    /// * `Http` on transport failure
    /// * `Status` on an unexpected status with no decodable verdict
    /// * `Decode` if a success response carries an unusable body
    pub async fn submit_code(&self, code: &str) -> ClientResult<CodeValidation> {
        let request_id = Uuid::new_v4();
        let url = self.api.endpoint(&["validate", "qr-code"])?;

        debug!(%request_id, "Submitting scanned code");

        let response = self
            .api
            .authorized_post(url)?
            .json(&ValidateRequest { code })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(%request_id, status = %status, "Code submission rejected: bearer token refused");
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await?;

        match serde_json::from_str::<ValidateResponse>(&body) {
            Ok(parsed) => {
                let verdict = CodeValidation {
                    accepted: parsed.success,
                    message: parsed
                        .message
                        .unwrap_or_else(|| if parsed.success { "accepted" } else { "denied" }.to_owned()),
                };
                debug!(%request_id, accepted = verdict.accepted, "Verdict received");
                Ok(verdict)
            }
            // A rejection often rides on a 4xx; only give up when there is
            // neither a verdict nor a success status.
            Err(e) if status.is_success() => Err(ClientError::Decode {
                detail: format!("verdict body: {e}"),
            }),
            Err(_) => {
                warn!(
                    %request_id,
                    status = %status,
                    body = %sanitize_body_for_log(&body),
                    "Code submission failed without a verdict"
                );
                Err(ClientError::Status {
                    status: status.as_u16(),
                })
            }
        }
    }
}
