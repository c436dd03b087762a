//! Failure-path integration tests
//!
//! Issuance failures must never unwind the rotation loop: they are retried
//! within the budget, recorded on the snapshot, and at worst park the run
//! until the next start. A stop always wins over an in-flight issuance.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tokio::time;

use turnstile_credential::prelude::*;

/// Issuer that replays a fixed queue of outcomes, then keeps failing
struct QueueIssuer {
    script: Mutex<VecDeque<RotationResult<Credential>>>,
    calls: AtomicUsize,
}

impl QueueIssuer {
    fn new(outcomes: Vec<RotationResult<Credential>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for QueueIssuer {
    async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(RotationError::IssuanceFailed {
                reason: "script exhausted".into(),
            })
        })
    }
}

/// Issuer whose second and later calls block until released
struct GatedIssuer {
    gate: Notify,
    validity_seconds: u64,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl GatedIssuer {
    fn new(validity_seconds: u64) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            validity_seconds,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CredentialIssuer for GatedIssuer {
    async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        let credential = if call == 0 {
            Credential::new("FIRST", self.validity_seconds)
        } else {
            self.gate.notified().await;
            Credential::new("LATE", 30)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(credential)
    }
}

fn ok(code: &str, validity_seconds: u64) -> RotationResult<Credential> {
    Ok(Credential::new(code, validity_seconds))
}

fn fail(reason: &str) -> RotationResult<Credential> {
    Err(RotationError::IssuanceFailed {
        reason: reason.into(),
    })
}

fn single_attempt_config(validity: u64) -> RotationConfig {
    RotationConfig::new(Duration::from_secs(1), validity, RetryPolicy::no_retries()).unwrap()
}

fn manager_with(issuer: Arc<dyn CredentialIssuer>, config: RotationConfig) -> RotationManager {
    RotationManager::builder()
        .issuer(issuer)
        .subject("member-1")
        .config(config)
        .build()
        .unwrap()
}

async fn start_settled(manager: &RotationManager) {
    manager.start().await.unwrap();
    tokio::task::yield_now().await;
}

async fn advance_ticks(n: u64) {
    for _ in 0..n {
        time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
    }
}

/// Test that a failed renewal parks the run with the stale code flagged
#[tokio::test(start_paused = true)]
async fn renewal_failure_parks_rotation_with_the_stale_code() {
    let issuer = QueueIssuer::new(vec![ok("ABC123", 3), fail("backend unavailable")]);
    let manager = manager_with(issuer.clone(), single_attempt_config(30));
    start_settled(&manager).await;

    advance_ticks(3).await;

    let snap = manager.snapshot();
    assert_eq!(snap.phase(), RotationPhase::Refreshing);
    assert_eq!(snap.seconds_remaining(), 0);
    assert_eq!(snap.code(), Some("ABC123"));
    assert!(snap.last_error().is_some());
    assert!(!manager.is_running().await);

    // Parked means parked: more time changes nothing.
    advance_ticks(3).await;
    assert_eq!(manager.snapshot(), snap);
    assert_eq!(issuer.calls(), 2);
}

/// Test that a renewal retries within its budget and then succeeds
#[tokio::test(start_paused = true)]
async fn renewal_retries_until_an_attempt_succeeds() {
    let issuer = QueueIssuer::new(vec![
        ok("FIRST", 2),
        fail("transient"),
        fail("still transient"),
        ok("SECOND", 30),
    ]);
    let config = RotationConfig::new(
        Duration::from_secs(1),
        30,
        RetryPolicy::new(3, Duration::from_millis(500), 2.0, Duration::from_secs(5)),
    )
    .unwrap();
    let manager = manager_with(issuer.clone(), config);
    start_settled(&manager).await;

    // Two ticks to expiry, then enough time for both backoffs even at
    // maximum jitter (500ms and 1000ms, each up to +10%).
    advance_ticks(2).await;
    advance_ticks(3).await;

    let snap = manager.snapshot();
    assert_eq!(snap.code(), Some("SECOND"));
    assert_eq!(snap.phase(), RotationPhase::Active);
    assert_eq!(snap.last_error(), None);
    assert_eq!(issuer.calls(), 4);

    manager.stop().await;
}

/// Test that the initial issuance retries transparently inside start
#[tokio::test(start_paused = true)]
async fn initial_issuance_retries_then_succeeds() {
    let issuer = QueueIssuer::new(vec![fail("cold start"), ok("ABC123", 30)]);
    let config = RotationConfig::new(
        Duration::from_secs(1),
        30,
        RetryPolicy::new(3, Duration::from_millis(500), 2.0, Duration::from_secs(5)),
    )
    .unwrap();
    let manager = manager_with(issuer.clone(), config);

    // Paused time auto-advances through the backoff sleep.
    manager.start().await.unwrap();

    assert_eq!(issuer.calls(), 2);
    let snap = manager.snapshot();
    assert_eq!(snap.code(), Some("ABC123"));
    assert_eq!(snap.phase(), RotationPhase::Active);

    manager.stop().await;
}

/// Test that exhausting the initial retry budget fails start, recoverably
#[tokio::test(start_paused = true)]
async fn exhausted_initial_retries_fail_start_but_allow_another() {
    let issuer = QueueIssuer::new(vec![
        fail("down"),
        fail("down"),
        fail("down"),
        ok("ABC123", 30),
    ]);
    let config = RotationConfig::new(
        Duration::from_secs(1),
        30,
        RetryPolicy::new(3, Duration::from_millis(500), 2.0, Duration::from_secs(5)),
    )
    .unwrap();
    let manager = manager_with(issuer.clone(), config);

    let err = manager.start().await.unwrap_err();
    assert!(matches!(
        err,
        RotationError::RetriesExhausted { attempts: 3, .. }
    ));
    assert!(!manager.is_running().await);

    let parked = manager.snapshot();
    assert_eq!(parked.phase(), RotationPhase::Refreshing);
    assert_eq!(parked.code(), None);
    assert!(parked.last_error().is_some());

    // The failure is recoverable: a fresh start issues normally.
    start_settled(&manager).await;
    assert_eq!(manager.snapshot().code(), Some("ABC123"));
    assert!(manager.is_running().await);
    assert_eq!(issuer.calls(), 4);

    manager.stop().await;
}

/// Test that a missing bearer credential is terminal for the start call
#[tokio::test(start_paused = true)]
async fn missing_auth_fails_start_without_retrying() {
    struct NoAuthIssuer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialIssuer for NoAuthIssuer {
        async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RotationError::AuthenticationMissing)
        }
    }

    let issuer = Arc::new(NoAuthIssuer {
        calls: AtomicUsize::new(0),
    });
    let manager = RotationManager::builder()
        .issuer(issuer.clone())
        .subject("member-1")
        .build()
        .unwrap();

    let err = manager.start().await.unwrap_err();
    assert!(matches!(err, RotationError::AuthenticationMissing));
    // Not recoverable by waiting, so no retry was attempted.
    assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    assert!(!manager.is_running().await);
}

/// Test that a second start on a live manager is rejected
#[tokio::test(start_paused = true)]
async fn double_start_is_rejected() {
    let issuer = QueueIssuer::new(vec![ok("ABC123", 30), ok("UNEXPECTED", 30)]);
    let manager = manager_with(issuer.clone(), single_attempt_config(30));
    start_settled(&manager).await;

    let err = manager.start().await.unwrap_err();
    assert!(matches!(
        err,
        RotationError::AlreadyRunning { ref subject_id } if subject_id.as_str() == "member-1"
    ));

    // The original run is untouched.
    assert!(manager.is_running().await);
    advance_ticks(1).await;
    assert_eq!(manager.snapshot().seconds_remaining(), 29);
    assert_eq!(issuer.calls(), 1);

    manager.stop().await;
}

/// Test that an issuance completing after stop is discarded
#[tokio::test(start_paused = true)]
async fn stop_during_renewal_discards_the_late_result() {
    let issuer = GatedIssuer::new(2);
    let manager = manager_with(issuer.clone(), single_attempt_config(2));
    start_settled(&manager).await;

    // Run into the expiry; the renewal call is now parked on the gate.
    advance_ticks(2).await;
    assert_eq!(issuer.calls(), 2);
    assert!(manager.snapshot().is_refreshing());

    manager.stop().await;
    let frozen = manager.snapshot();
    assert_eq!(frozen.code(), Some("FIRST"));
    assert_eq!(frozen.seconds_remaining(), 0);

    // Release the gate after the fact; the late credential must not land.
    issuer.release();
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(manager.snapshot(), frozen);
}

/// Test that at most one issuance is ever outstanding
#[tokio::test(start_paused = true)]
async fn issuance_is_single_flight() {
    let issuer = GatedIssuer::new(1);
    let manager = manager_with(issuer.clone(), single_attempt_config(1));
    start_settled(&manager).await;

    // First expiry starts a renewal that hangs on the gate. Further ticks
    // elapse while it is outstanding; no second request may start.
    advance_ticks(4).await;
    assert_eq!(issuer.calls(), 2);
    assert_eq!(issuer.max_in_flight(), 1);

    issuer.release();
    tokio::task::yield_now().await;
    assert_eq!(manager.snapshot().code(), Some("LATE"));

    manager.stop().await;
    assert_eq!(issuer.max_in_flight(), 1);
}
