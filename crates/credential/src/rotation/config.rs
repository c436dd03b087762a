//! Rotation manager configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::rotation::error::{RotationError, RotationResult};
use crate::rotation::retry::RetryPolicy;

/// Observed validity window of production-issued credentials
pub const DEFAULT_VALIDITY_SECONDS: u64 = 30;

/// Tuning knobs for a [`RotationManager`](crate::rotation::RotationManager)
///
/// The defaults match the production service: one-second ticks and a
/// 30-second validity window. `fallback_validity_seconds` only sizes the
/// countdown shown before the first issuance answers; the authoritative
/// window always comes from the issuer response.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use turnstile_credential::rotation::{RetryPolicy, RotationConfig};
///
/// let config = RotationConfig::new(
///     Duration::from_secs(1),
///     30,
///     RetryPolicy::default(),
/// ).unwrap();
/// assert_eq!(config.fallback_validity_seconds(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Interval between countdown ticks
    #[serde(with = "humantime_serde")]
    tick_interval: Duration,

    /// Countdown shown while `Idle`, before the first issuance answers
    fallback_validity_seconds: u64,

    /// Bounded retry applied to every issuance attempt
    retry: RetryPolicy,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            fallback_validity_seconds: DEFAULT_VALIDITY_SECONDS,
            retry: RetryPolicy::default(),
        }
    }
}

impl RotationConfig {
    /// Create a configuration with validation
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `tick_interval` is zero, the fallback window is
    ///   zero, or the retry policy allows zero attempts
    pub fn new(
        tick_interval: Duration,
        fallback_validity_seconds: u64,
        retry: RetryPolicy,
    ) -> RotationResult<Self> {
        let config = Self {
            tick_interval,
            fallback_validity_seconds,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> RotationResult<()> {
        if self.tick_interval.is_zero() {
            return Err(RotationError::InvalidConfig {
                reason: "tick_interval must be greater than zero".into(),
            });
        }
        if self.fallback_validity_seconds == 0 {
            return Err(RotationError::InvalidConfig {
                reason: "fallback_validity_seconds must be greater than zero".into(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(RotationError::InvalidConfig {
                reason: "retry.max_attempts must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Interval between countdown ticks
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Countdown shown before the first issuance answers
    pub fn fallback_validity_seconds(&self) -> u64 {
        self.fallback_validity_seconds
    }

    /// Retry policy applied to issuance attempts
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}
