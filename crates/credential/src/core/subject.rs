//! Subject identifier
//!
//! The opaque user/member identifier the issuer mints credentials for.
//! Produced by the authentication flow, which is outside this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the person a credential is issued to
///
/// The issuing service treats this as a lookup key; this crate never
/// inspects its contents beyond rejecting the empty string at the
/// construction sites that care (`RotationManager::builder`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap an identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner_string() {
        let subject = SubjectId::new("member-42");
        assert_eq!(subject.to_string(), "member-42");
        assert_eq!(subject.as_str(), "member-42");
    }

    #[test]
    fn serde_round_trip_is_transparent() {
        let subject = SubjectId::new("member-42");
        let json = serde_json::to_string(&subject).unwrap();
        assert_eq!(json, "\"member-42\"");
    }
}
