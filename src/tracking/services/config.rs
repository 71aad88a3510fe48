//! Configuration for tracking services.

use std::num::NonZeroU32;
use std::time::Duration;

/// Lifecycle dispatcher configuration.
///
/// # Examples
///
/// ```
/// use taskmeta::tracking::services::DispatcherConfig;
///
/// let config = DispatcherConfig::default();
/// assert_eq!(config.apply_attempts.get(), 3);
/// assert!(!config.reject_stale_events);
///
/// let ordered = DispatcherConfig::ordered();
/// assert!(ordered.reject_stale_events);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// How many times a handler is run for one event before the event is
    /// dropped. Only persistence failures are retried.
    pub apply_attempts: NonZeroU32,
    /// Pause between attempts.
    pub retry_backoff: Duration,
    /// When set, an event only overwrites records whose `updated_at` is
    /// not newer than the event, and `updated_at` is taken from the event
    /// instead of the apply-time clock.
    pub reject_stale_events: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            apply_attempts: NonZeroU32::new(3).unwrap_or(NonZeroU32::MIN),
            retry_backoff: Duration::from_millis(50),
            reject_stale_events: false,
        }
    }
}

impl DispatcherConfig {
    /// Creates a configuration that rejects out-of-order events.
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            reject_stale_events: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that never retries.
    ///
    /// Useful for tests that assert on dropped events.
    #[must_use]
    pub const fn single_attempt() -> Self {
        Self {
            apply_attempts: NonZeroU32::MIN,
            retry_backoff: Duration::ZERO,
            reject_stale_events: false,
        }
    }
}

/// Task tracking service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Rejects submissions for owners whose kind has no registered
    /// resolver.
    pub require_registered_owner_kinds: bool,
}

impl TrackingConfig {
    /// Creates a configuration that only accepts registered owner kinds.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            require_registered_owner_kinds: true,
        }
    }
}
