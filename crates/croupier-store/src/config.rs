//! Configuration for the session store.

use std::time::Duration;

/// Default cap on concurrently active sessions.
pub const DEFAULT_MAX_ACTIVE_SESSIONS: usize = 3;

/// Default inactivity TTL for stored sessions.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// Default interval between background cleanup sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for [`SessionStore`] and its cleanup scheduler.
///
/// [`SessionStore`]: crate::SessionStore
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of sessions with Active status allowed to exist
    /// concurrently.
    pub max_active_sessions: usize,

    /// Sliding inactivity window; a session untouched for this long is
    /// expired and evicted on the next access or sweep.
    pub session_ttl: Duration,

    /// Interval for the background cleanup sweep.
    pub cleanup_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_active_sessions: DEFAULT_MAX_ACTIVE_SESSIONS,
            session_ttl: DEFAULT_SESSION_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active-session cap.
    pub fn with_max_active_sessions(mut self, max: usize) -> Self {
        self.max_active_sessions = max;
        self
    }

    /// Set the sliding TTL.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the cleanup sweep interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
