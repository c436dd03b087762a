//! Rotation lifecycle events
//!
//! Event types and the observer seam for consumers that want callbacks
//! instead of polling snapshots: one event per tick and one per issuance
//! success or failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::SubjectId;

/// Event emitted by the rotation loop
///
/// Events carry timing and outcome data, never the access code itself; a
/// display that needs the code reads it from the snapshot subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RotationEvent {
    /// A rotation run began (initial issuance succeeded)
    Started {
        /// Subject the run issues credentials for
        subject_id: SubjectId,
    },

    /// One countdown second elapsed
    Tick {
        /// Seconds left after this tick
        seconds_remaining: u64,
    },

    /// A fresh credential was installed
    Issued {
        /// When the issuer minted it
        issued_at: DateTime<Utc>,

        /// Its validity window
        validity_seconds: u64,
    },

    /// An issuance attempt failed
    IssuanceFailed {
        /// Display form of the failure
        error: String,

        /// 1-based attempt number within the retry budget
        attempt: u32,
    },

    /// The run stopped; the last snapshot stays frozen
    Stopped {
        /// Countdown value at the moment of the stop
        seconds_remaining: u64,
    },
}

impl RotationEvent {
    /// Get a human-readable event description
    pub fn description(&self) -> String {
        match self {
            RotationEvent::Started { subject_id } => {
                format!("rotation started for subject {subject_id}")
            }
            RotationEvent::Tick { seconds_remaining } => {
                format!("tick: {seconds_remaining}s remaining")
            }
            RotationEvent::Issued {
                validity_seconds, ..
            } => {
                format!("credential issued, valid {validity_seconds}s")
            }
            RotationEvent::IssuanceFailed { error, attempt } => {
                format!("issuance failed (attempt {attempt}): {error}")
            }
            RotationEvent::Stopped { seconds_remaining } => {
                format!("rotation stopped at {seconds_remaining}s remaining")
            }
        }
    }

    /// Whether this event marks an issuance outcome (success or failure)
    pub fn is_issuance_outcome(&self) -> bool {
        matches!(
            self,
            RotationEvent::Issued { .. } | RotationEvent::IssuanceFailed { .. }
        )
    }
}

/// Callback seam for rotation events
///
/// Implementations must be quick: the rotation loop awaits `notify` between
/// ticks, and a slow observer delays the countdown it is observing. Fallible
/// delivery (webhooks and the like) belongs behind the implementation, not
/// in this contract - the loop never fails because an observer did.
///
/// # Example
///
/// ```rust,ignore
/// use turnstile_credential::rotation::{RotationEvent, RotationObserver};
///
/// struct LogObserver;
///
/// #[async_trait::async_trait]
/// impl RotationObserver for LogObserver {
///     async fn notify(&self, event: &RotationEvent) {
///         tracing::info!(event = %event.description(), "rotation event");
///     }
/// }
/// ```
#[async_trait]
pub trait RotationObserver: Send + Sync {
    /// Deliver one event
    async fn notify(&self, event: &RotationEvent);
}
