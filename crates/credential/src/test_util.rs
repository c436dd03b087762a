//! Test doubles for rotation scenarios
//!
//! Compiled behind the `test-util` feature so downstream crates can pull
//! deterministic issuers into their dev-dependencies without dragging test
//! code into production builds.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Credential, SubjectId};
use crate::rotation::error::{RotationError, RotationResult};
use crate::traits::CredentialIssuer;

/// Issuer that mints the same credential on every call
///
/// # Example
///
/// ```rust,ignore
/// let issuer = Arc::new(StaticIssuer::new("ABC123", 30));
/// let manager = RotationManager::builder()
///     .issuer(issuer.clone())
///     .subject("member-1")
///     .build()?;
/// ```
pub struct StaticIssuer {
    code: String,
    validity_seconds: u64,
    calls: AtomicUsize,
}

impl StaticIssuer {
    /// Create an issuer that always returns `code` with the given window
    pub fn new(code: impl Into<String>, validity_seconds: u64) -> Self {
        Self {
            code: code.into(),
            validity_seconds,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `issue` has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for StaticIssuer {
    async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(self.code.clone(), self.validity_seconds))
    }
}

/// Issuer that replays a queue of scripted outcomes
///
/// Each `issue` call pops the front of the script; an exhausted script
/// fails with `IssuanceFailed`. Entries into `issue` are counted so tests
/// can assert that issuance is single-flight. An optional delay holds each
/// call open long enough for overlap to be observable under paused time.
pub struct ScriptedIssuer {
    script: Mutex<VecDeque<RotationResult<Credential>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedIssuer {
    /// Create an issuer with an empty script
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every call open for `delay` before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful issuance
    pub fn push_ok(&self, code: impl Into<String>, validity_seconds: u64) {
        self.script
            .lock()
            .push_back(Ok(Credential::new(code, validity_seconds)));
    }

    /// Queue a failure
    pub fn push_err(&self, error: RotationError) {
        self.script.lock().push_back(Err(error));
    }

    /// How many times `issue` has been called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scripted outcomes not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    /// Highest number of concurrently outstanding `issue` calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialIssuer for ScriptedIssuer {
    async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.script.lock().pop_front().unwrap_or_else(|| {
            Err(RotationError::IssuanceFailed {
                reason: "issuer script exhausted".into(),
            })
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}
