//! Wire-format payloads
//!
//! The validation service speaks camelCase JSON; the shapes here mirror its
//! responses exactly, with everything beyond `success` optional so a sparse
//! error body still decodes.

use serde::{Deserialize, Serialize};

/// Body of `POST /validate/qr-code/generate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    pub user_id: &'a str,
}

/// Response of `POST /validate/qr-code/generate`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<GeneratedCode>,
}

/// The `data` object of a successful generate response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeneratedCode {
    pub code: String,
    /// Validity window in seconds
    pub expiration_time: u64,
}

/// Body of `POST /validate/qr-code`
#[derive(Debug, Serialize)]
pub(crate) struct ValidateRequest<'a> {
    pub code: &'a str,
}

/// Response of `POST /validate/qr-code`
#[derive(Debug, Deserialize)]
pub(crate) struct ValidateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /validate/face/{subjectId}`
#[derive(Debug, Deserialize)]
pub(crate) struct FaceResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_serialises_camel_case() {
        let json = serde_json::to_string(&GenerateRequest { user_id: "member-1" }).unwrap();
        assert_eq!(json, r#"{"userId":"member-1"}"#);
    }

    #[test]
    fn generate_response_decodes_the_service_shape() {
        let body = r#"{"success": true, "data": {"code": "ABC123", "expirationTime": 30}}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        let data = parsed.data.unwrap();
        assert_eq!(data.code, "ABC123");
        assert_eq!(data.expiration_time, 30);
    }

    #[test]
    fn sparse_error_body_still_decodes() {
        let body = r#"{"success": false, "message": "expired token"}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.message.as_deref(), Some("expired token"));
        assert!(parsed.data.is_none());
    }
}
