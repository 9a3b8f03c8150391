//! Sliding-expiration tracking for stored sessions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Tracks last-touch times for sliding TTL expiration.
///
/// Each successful store mutation touches the session's timer; a session
/// whose timer has not been touched within the TTL counts as expired. This
/// is one of the two expiry mechanisms the store consults; the other is the
/// session's own wall-clock `last_activity`.
#[derive(Debug)]
pub struct TtlTracker {
    touch_times: HashMap<Uuid, Instant>,
    ttl: Duration,
}

impl TtlTracker {
    /// Create a tracker with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            touch_times: HashMap::new(),
            ttl,
        }
    }

    /// Reset a session's expiration timer.
    pub fn touch(&mut self, session_id: Uuid) {
        self.touch_times.insert(session_id, Instant::now());
    }

    /// Whether a session's timer has lapsed. Untracked ids count as
    /// expired.
    pub fn is_expired(&self, session_id: Uuid) -> bool {
        match self.touch_times.get(&session_id) {
            None => true,
            Some(touched) => touched.elapsed() > self.ttl,
        }
    }

    /// Stop tracking a session.
    pub fn remove(&mut self, session_id: Uuid) {
        self.touch_times.remove(&session_id);
    }

    /// Ids of all sessions whose timer has lapsed.
    pub fn expired_ids(&self) -> Vec<Uuid> {
        let now = Instant::now();
        self.touch_times
            .iter()
            .filter(|(_, touched)| now.duration_since(**touched) > self.ttl)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove all lapsed entries and return their ids.
    pub fn drain_expired(&mut self) -> Vec<Uuid> {
        let expired = self.expired_ids();
        for id in &expired {
            self.touch_times.remove(id);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.touch_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touch_times.is_empty()
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn untracked_id_counts_as_expired() {
        let tracker = TtlTracker::new(Duration::from_secs(60));
        assert!(tracker.is_expired(Uuid::new_v4()));
    }

    #[test]
    fn touch_resets_timer() {
        let mut tracker = TtlTracker::new(Duration::from_millis(50));
        let id = Uuid::new_v4();
        tracker.touch(id);

        thread::sleep(Duration::from_millis(30));
        tracker.touch(id);
        thread::sleep(Duration::from_millis(30));

        assert!(!tracker.is_expired(id));
    }

    #[test]
    fn lapsed_timer_expires() {
        let mut tracker = TtlTracker::new(Duration::from_millis(10));
        let id = Uuid::new_v4();
        tracker.touch(id);

        thread::sleep(Duration::from_millis(20));

        assert!(tracker.is_expired(id));
        assert_eq!(tracker.expired_ids(), vec![id]);
    }

    #[test]
    fn drain_removes_lapsed_entries() {
        let mut tracker = TtlTracker::new(Duration::from_millis(10));
        tracker.touch(Uuid::new_v4());
        tracker.touch(Uuid::new_v4());

        thread::sleep(Duration::from_millis(20));

        assert_eq!(tracker.drain_expired().len(), 2);
        assert!(tracker.is_empty());
    }

    #[test]
    fn remove_stops_tracking() {
        let mut tracker = TtlTracker::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        tracker.touch(id);
        tracker.remove(id);

        assert!(tracker.is_empty());
        assert!(tracker.is_expired(id));
    }
}
