//! Turnstile Client - HTTP access to the campus validation service
//!
//! Production implementations of the collaborator seams in
//! `turnstile-credential`, speaking the validation service's camelCase JSON
//! API over one shared transport:
//!
//! - **Issuer** - `HttpCredentialIssuer` mints rotating access codes
//! - **Validator** - `CodeValidator` submits scanned codes for a verdict
//! - **Verifier** - `HttpFaceVerifier` uploads face captures for a verdict
//!
//! All three share an [`ApiClient`] whose bearer token can be swapped at
//! runtime when a new login happens.
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Client configuration
pub mod config;
/// Client error types
pub mod error;
/// Shared HTTP transport
pub mod http;
/// Credential issuance over HTTP
pub mod issuer;
/// Scanned-code validation
pub mod validator;
/// Face verification upload
pub mod verifier;

mod wire;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `turnstile_client::TypeName`.

pub use crate::config::ApiConfig;
pub use crate::error::{ClientError, ClientResult};
pub use crate::http::ApiClient;
pub use crate::issuer::HttpCredentialIssuer;
pub use crate::validator::{CodeValidation, CodeValidator};
pub use crate::verifier::HttpFaceVerifier;

/// Commonly used types
pub mod prelude {
    pub use crate::config::ApiConfig;
    pub use crate::error::{ClientError, ClientResult};
    pub use crate::http::ApiClient;
    pub use crate::issuer::HttpCredentialIssuer;
    pub use crate::validator::{CodeValidation, CodeValidator};
    pub use crate::verifier::HttpFaceVerifier;
}
