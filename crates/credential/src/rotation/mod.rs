//! Credential rotation - lifecycle of one live access code.
//!
//! This module provides the [`RotationManager`] type and supporting
//! infrastructure for issuing, counting down and automatically renewing a
//! single short-lived credential.
//!
//! # Overview
//!
//! The rotation manager is the primary interface of this crate. It provides:
//!
//! - **start() / stop()**: spawn and cancel the one-second tick loop
//! - **snapshot()**: atomic, side-effect-free reads of the current state
//! - **subscribe()**: a watch channel that changes per tick and per issuance
//! - **Bounded retry**: exponential backoff with jitter on issuance failure
//! - **Events**: per-tick and per-issuance notifications to an observer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │               RotationManager (public API)              │
//! ├─────────────────────────────────────────────────────────┤
//! │  • start()   • stop()   • snapshot()   • subscribe()    │
//! └─────────────────────────────────────────────────────────┘
//!                           │ spawns
//! ┌─────────────────────────▼───────────────────────────────┐
//! │                 tick loop (1s interval)                 │
//! │  decrement countdown → on expiry reissue with retry     │
//! │  publishes RotationSnapshot through a watch channel     │
//! └─────────────────────────────────────────────────────────┘
//!                           │ issues through
//! ┌─────────────────────────▼───────────────────────────────┐
//! │              CredentialIssuer (trait seam)              │
//! │     HTTP implementation in turnstile-client; tests      │
//! │     script their own                                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # State machine
//!
//! `Idle → Refreshing → Active → (countdown hits 0) → Refreshing → Active …`
//!
//! `stop()` freezes the last published snapshot from any state; a later
//! `start()` begins a fresh run. An issuance still in flight when `stop()`
//! lands is dropped without mutating anything.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnstile_credential::prelude::*;
//!
//! let manager = RotationManager::builder()
//!     .issuer(Arc::new(http_issuer))
//!     .subject(SubjectId::new("member-42"))
//!     .build()?;
//!
//! manager.start().await?;
//! let mut updates = manager.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snap = updates.borrow().clone();
//!     render(snap.code(), snap.seconds_remaining());
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod retry;
pub mod state;

pub use config::RotationConfig;
pub use error::{RotationError, RotationResult};
pub use events::{RotationEvent, RotationObserver};
pub use manager::{RotationManager, RotationManagerBuilder};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use state::{RotationPhase, RotationSnapshot, TickOutcome};
