//! Turnstile Credential - rotating access-credential lifecycle
//!
//! Core library for a campus entry system built around short-lived access
//! codes: a credential is minted by a remote issuer, displayed as a QR
//! payload, counts down its validity window, and is replaced automatically
//! the moment it expires.
//!
//! # Features
//!
//! - **Rotation manager** - owns exactly one live credential and its countdown
//! - **Bounded renewal retry** - exponential backoff with jitter, never unbounded
//! - **Snapshot reads** - consumers observe atomic `RotationSnapshot` values
//! - **Pluggable issuer** - any `CredentialIssuer` implementation, injected
//! - **Three-state verification** - `Pending` / `Accepted` / `Rejected`, never a coin flip
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Core types: credential, subject, verification outcomes
pub mod core;
/// Rotation: manager, state machine, retry, events, errors
pub mod rotation;
/// Collaborator seams implemented outside this crate
pub mod traits;

/// Scriptable issuers for driving rotation in tests
#[cfg(feature = "test-util")]
pub mod test_util;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `turnstile_credential::TypeName`.

// Core types
pub use crate::core::{
    Credential, FaceImage, SubjectId, VerificationReport, VerificationStatus,
};

// Traits
pub use crate::traits::{CredentialIssuer, FaceVerifier, VerifyError};

// Rotation
pub use crate::rotation::{
    RetryPolicy, RotationConfig, RotationError, RotationEvent, RotationManager,
    RotationObserver, RotationPhase, RotationResult, RotationSnapshot,
};

/// Commonly used types and traits
pub mod prelude {
    // Core types
    pub use crate::core::{Credential, FaceImage, SubjectId, VerificationReport, VerificationStatus};

    // Rotation types
    pub use crate::rotation::{
        RetryPolicy, RotationConfig, RotationError, RotationEvent, RotationManager,
        RotationObserver, RotationPhase, RotationResult, RotationSnapshot, TickOutcome,
    };

    // Traits
    pub use crate::traits::{CredentialIssuer, FaceVerifier, VerifyError};
}
