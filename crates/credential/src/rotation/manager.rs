//! Rotation manager - owns one live credential and its countdown
//!
//! The manager requests issuance, drives the one-second countdown, renews
//! the credential the moment the countdown hits zero, and publishes atomic
//! snapshots for consumers. It keeps rotating whether or not anybody is
//! watching.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::{Credential, SubjectId};
use crate::rotation::config::RotationConfig;
use crate::rotation::error::{RotationError, RotationResult};
use crate::rotation::events::{RotationEvent, RotationObserver};
use crate::rotation::retry::retry_with_backoff;
use crate::rotation::state::{RotationState, RotationSnapshot, TickOutcome};
use crate::traits::CredentialIssuer;

/// One running rotation loop
struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Maintains exactly one live credential for a subject
///
/// All issuance runs strictly sequentially inside `start()` or the spawned
/// tick loop, and a second `start()` is rejected while one is running - at
/// most one issuance request is ever outstanding.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use turnstile_credential::prelude::*;
///
/// let manager = RotationManager::builder()
///     .issuer(Arc::new(http_issuer))
///     .subject("member-42")
///     .build()?;
///
/// manager.start().await?;
/// let snap = manager.snapshot();
/// println!("{} ({}s left)", snap.code().unwrap_or("-"), snap.seconds_remaining());
/// manager.stop().await;
/// ```
pub struct RotationManager {
    /// Mints replacement credentials; carries its own auth state
    issuer: Arc<dyn CredentialIssuer>,

    /// Who the credentials are issued for
    subject: SubjectId,

    config: RotationConfig,

    /// Optional per-tick / per-issuance callback sink
    observer: Option<Arc<dyn RotationObserver>>,

    /// Publication side of the snapshot channel; the loop task holds a clone
    snapshot_tx: Arc<watch::Sender<RotationSnapshot>>,

    /// Current run, if any. The async mutex serialises start/stop so a stop
    /// cannot interleave with the initial issuance of a start.
    run: Mutex<Option<RunHandle>>,
}

impl RotationManager {
    /// Create builder for constructing a manager instance
    pub fn builder() -> RotationManagerBuilder<No> {
        RotationManagerBuilder::new()
    }

    /// Begin rotating: issue the initial credential and spawn the tick loop
    ///
    /// Blocks until the first issuance settles, so the caller learns
    /// immediately whether the run is live. The initial issuance goes
    /// through the configured retry policy.
    ///
    /// # Errors
    ///
    /// * `AlreadyRunning` if a rotation loop is active for this manager
    /// * `AuthenticationMissing` if the issuer has no bearer credential;
    ///   retrying without a new token cannot help
    /// * `RetriesExhausted` if the initial issuance failed past the retry
    ///   budget; the snapshot is left parked in `Refreshing` with the
    ///   failure recorded, and calling `start()` again is safe
    pub async fn start(&self) -> RotationResult<()> {
        let mut run = self.run.lock().await;
        if let Some(handle) = run.as_ref() {
            if handle.task.is_finished() {
                // Previous run parked after exhausting retries; clear it.
                *run = None;
            } else {
                return Err(RotationError::AlreadyRunning {
                    subject_id: self.subject.to_string(),
                });
            }
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        info!(
            subject_id = %self.subject,
            run_id = %run_id,
            "Starting credential rotation"
        );

        let mut state = RotationState::new(self.config.fallback_validity_seconds());
        state.begin_refresh();
        self.publish(&state);

        match self.issue_with_retry(&cancel).await {
            Ok(credential) => {
                info!(
                    subject_id = %self.subject,
                    run_id = %run_id,
                    validity_seconds = credential.validity_seconds(),
                    "Initial credential issued"
                );
                let issued_event = RotationEvent::Issued {
                    issued_at: credential.issued_at(),
                    validity_seconds: credential.validity_seconds(),
                };
                state.install(credential);
                self.publish(&state);
                self.notify(&RotationEvent::Started {
                    subject_id: self.subject.clone(),
                })
                .await;
                self.notify(&issued_event).await;
            }
            Err(e) => {
                warn!(
                    subject_id = %self.subject,
                    run_id = %run_id,
                    error = %e,
                    "Initial issuance failed; rotation not started"
                );
                state.record_failure(&e);
                self.publish(&state);
                self.notify(&RotationEvent::IssuanceFailed {
                    error: e.to_string(),
                    attempt: attempts_spent(&e),
                })
                .await;
                return Err(e);
            }
        }

        let ctx = LoopContext {
            issuer: Arc::clone(&self.issuer),
            subject: self.subject.clone(),
            config: self.config.clone(),
            observer: self.observer.clone(),
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            cancel: cancel.clone(),
            run_id,
            state,
        };
        let task = tokio::spawn(run_loop(ctx));
        *run = Some(RunHandle { cancel, task });

        Ok(())
    }

    /// Stop rotating and freeze the last published snapshot
    ///
    /// Cancels the tick loop and waits for it to exit, so once `stop()`
    /// returns no further mutation can occur - an issuance still in flight
    /// is dropped without being applied. Calling `stop()` when nothing is
    /// running is a no-op.
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        if let Some(handle) = run.take() {
            info!(subject_id = %self.subject, "Stopping credential rotation");
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                if e.is_panic() {
                    error!(subject_id = %self.subject, error = %e, "Rotation loop panicked");
                }
            }
        }
    }

    /// Atomic, side-effect-free read of the current rotation state
    pub fn snapshot(&self) -> RotationSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot changes
    ///
    /// The receiver observes one change per tick and one per issuance
    /// success or failure; a display re-renders on `changed()` instead of
    /// polling.
    pub fn subscribe(&self) -> watch::Receiver<RotationSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether a rotation loop is currently live
    ///
    /// False before `start()`, after `stop()`, and after a run parked by
    /// exhausting its renewal retries.
    pub async fn is_running(&self) -> bool {
        self.run
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    /// Subject this manager issues credentials for
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    async fn issue_with_retry(&self, cancel: &CancellationToken) -> RotationResult<Credential> {
        let issuer = Arc::clone(&self.issuer);
        let subject = self.subject.clone();
        retry_with_backoff(self.config.retry(), "credential issuance", cancel, move || {
            let issuer = Arc::clone(&issuer);
            let subject = subject.clone();
            async move { issuer.issue(&subject).await }
        })
        .await
    }

    fn publish(&self, state: &RotationState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    async fn notify(&self, event: &RotationEvent) {
        if let Some(observer) = &self.observer {
            observer.notify(event).await;
        }
    }
}

impl Drop for RotationManager {
    fn drop(&mut self) {
        // Best effort: a live loop must not outlive the manager that owns
        // its snapshot channel.
        if let Ok(mut run) = self.run.try_lock() {
            if let Some(handle) = run.take() {
                handle.cancel.cancel();
                handle.task.abort();
                debug!(subject_id = %self.subject, "Aborted rotation loop on drop");
            }
        }
    }
}

/// Everything the spawned tick loop owns
struct LoopContext {
    issuer: Arc<dyn CredentialIssuer>,
    subject: SubjectId,
    config: RotationConfig,
    observer: Option<Arc<dyn RotationObserver>>,
    snapshot_tx: Arc<watch::Sender<RotationSnapshot>>,
    cancel: CancellationToken,
    run_id: Uuid,
    state: RotationState,
}

impl LoopContext {
    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }

    async fn notify(&self, event: &RotationEvent) {
        if let Some(observer) = &self.observer {
            observer.notify(event).await;
        }
    }

    async fn emit_stopped(&self) {
        let seconds_remaining = self.state.snapshot().seconds_remaining();
        info!(
            subject_id = %self.subject,
            run_id = %self.run_id,
            seconds_remaining,
            "Rotation loop shutting down"
        );
        self.notify(&RotationEvent::Stopped { seconds_remaining })
            .await;
    }
}

/// The one-second tick loop
///
/// Sole mutator of the rotation state once a run is live. Issuance failures
/// are contained here: they are recorded, reported and end the run parked -
/// they never unwind across the timer boundary.
async fn run_loop(mut ctx: LoopContext) {
    let mut ticker = time::interval(ctx.config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a fresh interval completes immediately; the
    // countdown starts one full period after issuance.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                ctx.emit_stopped().await;
                return;
            }
            _ = ticker.tick() => {
                match ctx.state.tick() {
                    TickOutcome::Counting { seconds_remaining } => {
                        ctx.publish();
                        debug!(
                            subject_id = %ctx.subject,
                            run_id = %ctx.run_id,
                            seconds_remaining,
                            "Tick"
                        );
                        ctx.notify(&RotationEvent::Tick { seconds_remaining }).await;
                    }
                    TickOutcome::Expired => {
                        // Reaching zero and entering Refreshing is one
                        // transition; no snapshot shows Active at zero.
                        ctx.state.begin_refresh();
                        ctx.publish();
                        ctx.notify(&RotationEvent::Tick { seconds_remaining: 0 }).await;
                        info!(
                            subject_id = %ctx.subject,
                            run_id = %ctx.run_id,
                            "Credential window elapsed; requesting replacement"
                        );

                        if !renew(&mut ctx).await {
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Run one renewal. Returns false when the loop must exit (stopped while
/// the request was in flight, or the retry budget is spent).
async fn renew(ctx: &mut LoopContext) -> bool {
    let issued = {
        let issuer = &ctx.issuer;
        let subject = &ctx.subject;
        tokio::select! {
            _ = ctx.cancel.cancelled() => None,
            result = retry_with_backoff(
                ctx.config.retry(),
                "credential renewal",
                &ctx.cancel,
                move || {
                    let issuer = Arc::clone(issuer);
                    let subject = subject.clone();
                    async move { issuer.issue(&subject).await }
                },
            ) => Some(result),
        }
    };

    match issued {
        // Stopped while waiting on the issuer: drop the request un-applied.
        None => {
            ctx.emit_stopped().await;
            false
        }
        Some(Ok(credential)) => {
            info!(
                subject_id = %ctx.subject,
                run_id = %ctx.run_id,
                validity_seconds = credential.validity_seconds(),
                "Replacement credential issued"
            );
            let issued_event = RotationEvent::Issued {
                issued_at: credential.issued_at(),
                validity_seconds: credential.validity_seconds(),
            };
            ctx.state.install(credential);
            ctx.publish();
            ctx.notify(&issued_event).await;
            true
        }
        Some(Err(_)) if ctx.cancel.is_cancelled() => {
            ctx.emit_stopped().await;
            false
        }
        Some(Err(e)) => {
            error!(
                subject_id = %ctx.subject,
                run_id = %ctx.run_id,
                error = %e,
                "Renewal failed; rotation parked until a fresh start"
            );
            ctx.state.record_failure(&e);
            ctx.publish();
            ctx.notify(&RotationEvent::IssuanceFailed {
                error: e.to_string(),
                attempt: attempts_spent(&e),
            })
            .await;
            false
        }
    }
}

/// How many attempts a final issuance failure consumed
fn attempts_spent(error: &RotationError) -> u32 {
    match error {
        RotationError::RetriesExhausted { attempts, .. } => *attempts,
        _ => 1,
    }
}

/// Marker type: builder has an issuer
pub struct Yes;
/// Marker type: builder does not yet have an issuer
pub struct No;

/// Builder for [`RotationManager`]
///
/// The issuer is enforced at compile time; the subject and configuration
/// are validated by `build()`.
pub struct RotationManagerBuilder<HasIssuer> {
    issuer: Option<Arc<dyn CredentialIssuer>>,
    subject: Option<SubjectId>,
    config: RotationConfig,
    observer: Option<Arc<dyn RotationObserver>>,
    _marker: PhantomData<HasIssuer>,
}

impl RotationManagerBuilder<No> {
    fn new() -> Self {
        Self {
            issuer: None,
            subject: None,
            config: RotationConfig::default(),
            observer: None,
            _marker: PhantomData,
        }
    }

    /// Set the credential issuer (required)
    pub fn issuer(self, issuer: Arc<dyn CredentialIssuer>) -> RotationManagerBuilder<Yes> {
        RotationManagerBuilder {
            issuer: Some(issuer),
            subject: self.subject,
            config: self.config,
            observer: self.observer,
            _marker: PhantomData,
        }
    }
}

impl<HasIssuer> RotationManagerBuilder<HasIssuer> {
    /// Set the subject credentials are issued for (required)
    pub fn subject(mut self, subject: impl Into<SubjectId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Override the default rotation configuration
    pub fn config(mut self, config: RotationConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a per-tick / per-issuance observer
    pub fn observer(mut self, observer: Arc<dyn RotationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl RotationManagerBuilder<Yes> {
    /// Build the manager
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if the subject is missing or empty, or the
    ///   configuration fails validation
    pub fn build(self) -> RotationResult<RotationManager> {
        let issuer = self.issuer.ok_or_else(|| RotationError::InvalidConfig {
            reason: "issuer is required".into(),
        })?;
        let subject = self.subject.ok_or_else(|| RotationError::InvalidConfig {
            reason: "subject is required".into(),
        })?;
        if subject.is_empty() {
            return Err(RotationError::InvalidConfig {
                reason: "subject must not be empty".into(),
            });
        }
        self.config.validate()?;

        let initial = RotationState::new(self.config.fallback_validity_seconds()).snapshot();
        let (snapshot_tx, _) = watch::channel(initial);

        Ok(RotationManager {
            issuer,
            subject,
            config: self.config,
            observer: self.observer,
            snapshot_tx: Arc::new(snapshot_tx),
            run: Mutex::new(None),
        })
    }
}
