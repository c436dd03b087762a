//! Collaborator seams
//!
//! The rotation manager and the consumer-facing surfaces depend on external
//! services only through these traits. Production implementations live in
//! `turnstile-client`; tests script their own.

mod issuer;
mod verifier;

pub use issuer::CredentialIssuer;
pub use verifier::{FaceVerifier, VerifyError};
