//! Core types for the credential lifecycle
//!
//! Value types shared by the rotation machinery, the HTTP collaborators and
//! consumers: the [`Credential`] itself, the [`SubjectId`] it is minted for,
//! and the three-state face-verification outcome.

mod credential;
mod subject;
mod verification;

pub use credential::Credential;
pub use subject::SubjectId;
pub use verification::{FaceImage, VerificationReport, VerificationStatus};
