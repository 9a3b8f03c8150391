//! Concurrent in-memory session store with sliding expiration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use croupier_domain::{Session, SessionStatus, User};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::ttl::TtlTracker;

/// Inner state protected by RwLock.
///
/// Three structures that must stay consistent: the keyed session map, the
/// sliding TTL tracker, and the creation-time index used for enumeration.
/// Every eviction path removes an id from all three.
struct StoreInner {
    /// Sessions keyed by id.
    sessions: HashMap<Uuid, Session>,

    /// Sliding expiration timers.
    ttl: TtlTracker,

    /// Enumeration index: id to creation timestamp.
    index: HashMap<Uuid, DateTime<Utc>>,
}

impl StoreInner {
    /// A session is dead when either expiry mechanism says so: the sliding
    /// timer lapsed, or its own `last_activity` is older than the TTL.
    /// The two must agree on eviction, so either one suffices.
    fn is_dead(&self, session_id: Uuid) -> bool {
        if self.ttl.is_expired(session_id) {
            return true;
        }
        match self.sessions.get(&session_id) {
            Some(session) => session.idle_time() > self.ttl.ttl(),
            None => true,
        }
    }

    /// Remove a session from all three structures.
    fn purge(&mut self, session_id: Uuid) -> Option<Session> {
        self.ttl.remove(session_id);
        self.index.remove(&session_id);
        self.sessions.remove(&session_id)
    }

    /// Evict every dead session, returning the evicted ids.
    fn purge_dead(&mut self) -> Vec<Uuid> {
        let ids: Vec<Uuid> = self.index.keys().copied().collect();
        let mut removed = Vec::new();
        for id in ids {
            if self.is_dead(id) {
                self.purge(id);
                removed.push(id);
            }
        }
        removed
    }

    /// Number of live sessions with Active status. Only meaningful after
    /// `purge_dead`.
    fn count_active(&self) -> usize {
        self.index
            .keys()
            .filter_map(|id| self.sessions.get(id))
            .filter(|s| s.status() == SessionStatus::Active)
            .count()
    }
}

/// Thread-safe keyed storage of sessions with sliding TTL, a cap on
/// concurrently active sessions, and a creation-time index.
///
/// Callers follow a read-modify-write pattern: [`get`] a session clone,
/// mutate it through its own methods, then write it back with [`update`]
/// (which resets the TTL). Two concurrent writers of the same session id
/// race and the last write wins; there is deliberately no per-session lock.
///
/// [`get`]: SessionStore::get
/// [`update`]: SessionStore::update
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
    config: StoreConfig,
}

impl SessionStore {
    /// Create a new store.
    pub fn new(config: StoreConfig) -> Self {
        let inner = StoreInner {
            sessions: HashMap::new(),
            ttl: TtlTracker::new(config.session_ttl),
            index: HashMap::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
        }
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of stored sessions, expired entries included until evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }

    /// Create a session with the given creator as its first user.
    ///
    /// The capacity check and the insert happen under one write lock, so
    /// concurrent creates cannot both slip past the cap.
    pub async fn create(&self, name: impl Into<String>, creator: User) -> Result<Session> {
        let mut inner = self.inner.write().await;

        inner.purge_dead();
        if inner.count_active() >= self.config.max_active_sessions {
            return Err(Error::Capacity(self.config.max_active_sessions));
        }

        let mut session = Session::new(name);
        session.add_user(creator)?;

        let id = session.id();
        inner.index.insert(id, session.created_at());
        inner.ttl.touch(id);
        inner.sessions.insert(id, session.clone());

        info!(session_id = %id, name = %session.name(), "session created");
        Ok(session)
    }

    /// Fetch a session clone by id.
    ///
    /// An entry found expired is evicted on the spot and reported as
    /// not-found, so callers never observe a session the sweep merely has
    /// not reached yet.
    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        let mut inner = self.inner.write().await;

        if !inner.sessions.contains_key(&session_id) {
            // A stale index entry must not outlive its session.
            inner.ttl.remove(session_id);
            inner.index.remove(&session_id);
            return None;
        }

        if inner.is_dead(session_id) {
            inner.purge(session_id);
            debug!(session_id = %session_id, "expired session evicted on access");
            return None;
        }

        inner.sessions.get(&session_id).cloned()
    }

    /// All live sessions with Active status, most recently created first.
    pub async fn list(&self) -> Vec<Session> {
        let mut inner = self.inner.write().await;

        for id in inner.purge_dead() {
            debug!(session_id = %id, "expired session evicted during list");
        }

        let mut active: Vec<Session> = inner
            .index
            .keys()
            .filter_map(|id| inner.sessions.get(id))
            .filter(|s| s.status() == SessionStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        active
    }

    /// Write a mutated session back, touching its activity timestamp and
    /// resetting its TTL timer.
    ///
    /// Returns false when the id is no longer present, which handles the
    /// race where the session was evicted or deleted concurrently.
    pub async fn update(&self, mut session: Session) -> bool {
        let mut inner = self.inner.write().await;

        let id = session.id();
        if !inner.sessions.contains_key(&id) {
            return false;
        }

        session.touch();
        inner.ttl.touch(id);
        inner.index.insert(id, session.created_at());
        inner.sessions.insert(id, session);
        true
    }

    /// Remove a session. Idempotent.
    pub async fn delete(&self, session_id: Uuid) {
        let mut inner = self.inner.write().await;
        if inner.purge(session_id).is_some() {
            info!(session_id = %session_id, "session deleted");
        }
    }

    /// Add a user to a session and write the result back.
    pub async fn add_user(&self, session_id: Uuid, user: User) -> Result<Session> {
        let mut session = self
            .get(session_id)
            .await
            .ok_or(Error::NotFound(session_id))?;

        let user_name = user.name.clone();
        session.add_user(user)?;

        if !self.update(session).await {
            return Err(Error::NotFound(session_id));
        }
        info!(session_id = %session_id, user_name = %user_name, "user joined session");

        self.get(session_id)
            .await
            .ok_or(Error::NotFound(session_id))
    }

    /// Remove a user from a session, deleting the session when the roster
    /// becomes empty.
    pub async fn remove_user(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut session = self
            .get(session_id)
            .await
            .ok_or(Error::NotFound(session_id))?;

        if !session.remove_user(user_id) {
            return Err(Error::UserNotFound {
                session_id,
                user_id,
            });
        }

        let roster_empty = session.users().is_empty();
        if !self.update(session).await {
            return Err(Error::NotFound(session_id));
        }
        info!(session_id = %session_id, user_id = %user_id, "user left session");

        if roster_empty {
            self.delete(session_id).await;
        }
        Ok(())
    }

    /// Clones of all sessions currently past their TTL, without evicting.
    pub async fn list_expired(&self) -> Vec<Session> {
        let inner = self.inner.read().await;
        inner
            .index
            .keys()
            .filter(|id| inner.is_dead(**id))
            .filter_map(|id| inner.sessions.get(id))
            .cloned()
            .collect()
    }

    /// Evict every expired session. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let removed = inner.purge_dead();
        for id in &removed {
            info!(session_id = %id, "cleaned up expired session");
        }
        removed.len()
    }

    /// Number of live Active sessions.
    pub async fn count_active(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.purge_dead();
        inner.count_active()
    }

    /// Whether a new session may be created under the cap.
    pub async fn can_create(&self) -> bool {
        self.count_active().await < self.config.max_active_sessions
    }
}
