//! Reconnect policy.
//!
//! Pure decision logic: given a transport close code and the configured
//! policy, decide whether a reconnect attempt should be scheduled and
//! after what delay. The delay is a fixed timeout; there is no exponential
//! backoff, no jitter, and no attempt cap.
//!
//! Skip codes always suppress reconnection, even when the policy is
//! enabled. The default skip set models close codes that mean "do not
//! retry": going-away (1001) and no-status (1005).

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::transport::close_code;

// ============================================================================
// Constants
// ============================================================================

/// Default delay before a reconnect attempt.
pub const DEFAULT_RECONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default close codes that never trigger a reconnect.
pub const DEFAULT_SKIP_CODES: [u16; 2] = [close_code::GOING_AWAY, close_code::NO_STATUS];

// ============================================================================
// ReconnectConfig
// ============================================================================

/// Reconnection policy configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ws_session::ReconnectConfig;
///
/// let policy = ReconnectConfig::enabled().timeout(Duration::from_millis(250));
/// assert!(policy.delay_after(1006).is_some());
/// assert!(policy.delay_after(1001).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether reconnection is enabled at all.
    pub enabled: bool,
    /// Fixed delay before a reconnect attempt.
    pub timeout: Duration,
    /// Close codes that always suppress reconnection.
    pub skip_codes: FxHashSet<u16>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: DEFAULT_RECONNECT_TIMEOUT,
            skip_codes: DEFAULT_SKIP_CODES.into_iter().collect(),
        }
    }
}

impl ReconnectConfig {
    /// Creates an enabled policy with the default timeout and skip set.
    #[inline]
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Creates a disabled policy.
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Sets the reconnect delay.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the skip-code set.
    #[inline]
    #[must_use]
    pub fn skip_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.skip_codes = codes.into_iter().collect();
        self
    }

    /// Decides whether a close with `code` should trigger a reconnect.
    ///
    /// Returns the delay to wait before reconnecting, or `None` when no
    /// reconnect should be scheduled.
    #[must_use]
    pub fn delay_after(&self, code: u16) -> Option<Duration> {
        if self.enabled && !self.skip_codes.contains(&code) {
            Some(self.timeout)
        } else {
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
