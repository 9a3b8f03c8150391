//! Background sweep for expired sessions.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::SessionStore;

/// Periodic background sweep that evicts expired sessions.
///
/// The store already evicts expired entries on access; this loop is the
/// safety net that reclaims sessions nobody touches again. Each tick calls
/// [`SessionStore::cleanup_expired`]; a tick can never take the loop down.
/// Cancellation is observed while waiting out the interval, so shutdown
/// does not stall for up to a full tick.
pub struct CleanupScheduler {
    store: SessionStore,
    interval: Duration,
}

impl CleanupScheduler {
    /// Create a scheduler using the store's configured cleanup interval.
    pub fn new(store: SessionStore) -> Self {
        let interval = store.config().cleanup_interval;
        Self { store, interval }
    }

    /// Create a scheduler with an explicit interval.
    pub fn with_interval(store: SessionStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the sweep loop until the token is cancelled.
    pub async fn run(self, token: CancellationToken) {
        info!(interval_secs = self.interval.as_secs_f64(), "session cleanup loop started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; consume it
        // so the loop only sweeps after a full interval has passed.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = self.store.cleanup_expired().await;
                    if removed > 0 {
                        info!(removed, "cleanup sweep evicted expired sessions");
                    } else {
                        debug!("cleanup sweep found nothing to evict");
                    }
                }
            }
        }

        info!("session cleanup loop stopped");
    }

    /// Spawn the sweep loop on the current runtime.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}

#[cfg(test)]
mod tests {
    use croupier_domain::User;

    use crate::config::StoreConfig;

    use super::*;

    #[tokio::test]
    async fn sweep_evicts_expired_sessions() {
        let config = StoreConfig::new()
            .with_session_ttl(Duration::from_millis(30))
            .with_cleanup_interval(Duration::from_millis(50));
        let store = SessionStore::new(config);

        store
            .create("room", User::new("alice", "fox"))
            .await
            .unwrap();

        let token = CancellationToken::new();
        let handle = CleanupScheduler::new(store.clone()).spawn(token.clone());

        // Past the TTL and past at least one sweep interval.
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.is_empty().await);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancellation_is_prompt() {
        let config = StoreConfig::new().with_cleanup_interval(Duration::from_secs(3600));
        let store = SessionStore::new(config);

        let token = CancellationToken::new();
        let handle = CleanupScheduler::new(store).spawn(token.clone());

        token.cancel();

        // Must resolve well before the hour-long interval elapses.
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop did not observe cancellation while waiting")
            .unwrap();
    }

    #[tokio::test]
    async fn live_sessions_survive_the_sweep() {
        let config = StoreConfig::new()
            .with_session_ttl(Duration::from_secs(60))
            .with_cleanup_interval(Duration::from_millis(20));
        let store = SessionStore::new(config);

        let session = store
            .create("room", User::new("alice", "fox"))
            .await
            .unwrap();

        let token = CancellationToken::new();
        let handle = CleanupScheduler::new(store.clone()).spawn(token.clone());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(store.get(session.id()).await.is_some());

        token.cancel();
        handle.await.unwrap();
    }
}
