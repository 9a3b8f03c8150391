//! Session operations exposed to the transport layer.

use croupier_domain::{Session, User};
use croupier_store::SessionStore;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::summary::SessionSummary;

const SESSION_NAME_LEN: std::ops::RangeInclusive<usize> = 3..=100;
const USER_NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

/// Facade over the session store for transport layers (REST handlers, the
/// push hub).
///
/// Every mutating operation follows get, mutate via the session's own
/// methods, write back via `update` (which resets the session's TTL). Two
/// concurrent mutations of the same session race and the last write wins;
/// there is no cross-request atomicity.
#[derive(Clone)]
pub struct SessionService {
    store: SessionStore,
}

impl SessionService {
    /// Create a service over the given store.
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a session with its creator as the first user. The creator is
    /// promoted to facilitator by the session itself.
    pub async fn create_session(
        &self,
        name: &str,
        creator_name: &str,
        avatar: &str,
    ) -> Result<Session> {
        let name = validate_session_name(name)?;
        let creator_name = validate_user_name(creator_name)?;
        let avatar = validate_avatar(avatar)?;

        let creator = User::new(creator_name.clone(), avatar);
        let session = self.store.create(name, creator).await?;

        info!(
            session_id = %session.id(),
            creator = %creator_name,
            "session created"
        );
        Ok(session)
    }

    /// Fetch a session by id.
    pub async fn get_session(&self, session_id: Uuid) -> Result<Session> {
        self.store
            .get(session_id)
            .await
            .ok_or(ServiceError::NotFound(session_id))
    }

    /// Summaries of all active sessions, most recently created first.
    pub async fn list_active_sessions(&self) -> Vec<SessionSummary> {
        self.store
            .list()
            .await
            .iter()
            .map(SessionSummary::from)
            .collect()
    }

    /// Join an existing session as a participant. Returns the updated
    /// session including the newly seated user.
    pub async fn join_session(
        &self,
        session_id: Uuid,
        user_name: &str,
        avatar: &str,
    ) -> Result<Session> {
        let user_name = validate_user_name(user_name)?;
        let avatar = validate_avatar(avatar)?;

        let user = User::new(user_name, avatar);
        let session = self.store.add_user(session_id, user).await?;
        Ok(session)
    }

    /// Leave a session. The session is deleted once its roster empties.
    pub async fn leave_session(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        self.store.remove_user(session_id, user_id).await?;
        Ok(())
    }

    /// End a session. Only the facilitator may do this; the session is
    /// removed from the store afterwards.
    pub async fn end_session(&self, session_id: Uuid, requester_id: Uuid) -> Result<()> {
        let mut session = self.get_session(session_id).await?;

        if session.facilitator_id() != Some(requester_id) {
            return Err(ServiceError::Forbidden);
        }

        session.end();
        self.store.update(session).await;
        self.store.delete(session_id).await;

        info!(session_id = %session_id, requester_id = %requester_id, "session ended");
        Ok(())
    }

    /// Start the next voting round. A no-op when the session is paused or
    /// has no facilitator.
    pub async fn start_voting_round(&self, session_id: Uuid) -> Result<Session> {
        self.mutate(session_id, |session| session.start_voting_round())
            .await
    }

    /// Submit a vote to the current round. A no-op when no round is
    /// collecting votes.
    pub async fn submit_vote(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        value: &str,
    ) -> Result<Session> {
        self.mutate(session_id, |session| session.submit_vote(user_id, value))
            .await
    }

    /// Reveal the current round's votes. A no-op when no round is
    /// collecting votes.
    pub async fn reveal_votes(&self, session_id: Uuid) -> Result<Session> {
        self.mutate(session_id, |session| session.reveal_votes()).await
    }

    /// Hand the facilitator role to another roster member.
    pub async fn transfer_facilitator(
        &self,
        session_id: Uuid,
        new_facilitator_id: Uuid,
    ) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;

        if !session.transfer_facilitator(new_facilitator_id) {
            return Err(ServiceError::UserNotFound {
                session_id,
                user_id: new_facilitator_id,
            });
        }

        self.write_back(session).await?;
        info!(
            session_id = %session_id,
            new_facilitator = %new_facilitator_id,
            "facilitator role transferred"
        );
        self.get_session(session_id).await
    }

    /// Record that a user's transport connection came up.
    pub async fn connect_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        connection_id: &str,
    ) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;

        if !session.mark_connected(user_id, connection_id) {
            return Err(ServiceError::UserNotFound {
                session_id,
                user_id,
            });
        }

        self.write_back(session).await?;
        self.get_session(session_id).await
    }

    /// Record that a user's transport connection dropped.
    pub async fn disconnect_user(&self, session_id: Uuid, user_id: Uuid) -> Result<Session> {
        let mut session = self.get_session(session_id).await?;

        if !session.mark_disconnected(user_id) {
            return Err(ServiceError::UserNotFound {
                session_id,
                user_id,
            });
        }

        self.write_back(session).await?;
        self.get_session(session_id).await
    }

    /// Read-modify-write helper for operations that cannot fail at the
    /// domain level (wrong-phase calls are no-ops there).
    async fn mutate<F>(&self, session_id: Uuid, op: F) -> Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.get_session(session_id).await?;
        op(&mut session);
        self.write_back(session).await?;
        self.get_session(session_id).await
    }

    async fn write_back(&self, session: Session) -> Result<()> {
        let id = session.id();
        if self.store.update(session).await {
            Ok(())
        } else {
            // Evicted between our read and this write.
            Err(ServiceError::NotFound(id))
        }
    }
}

fn validate_session_name(name: &str) -> Result<String> {
    let name = name.trim();
    if !SESSION_NAME_LEN.contains(&name.chars().count()) {
        return Err(ServiceError::Validation {
            field: "session name",
            reason: format!(
                "must be {}-{} characters",
                SESSION_NAME_LEN.start(),
                SESSION_NAME_LEN.end()
            ),
        });
    }
    Ok(name.to_string())
}

fn validate_user_name(name: &str) -> Result<String> {
    let name = name.trim();
    if !USER_NAME_LEN.contains(&name.chars().count()) {
        return Err(ServiceError::Validation {
            field: "username",
            reason: format!(
                "must be {}-{} characters",
                USER_NAME_LEN.start(),
                USER_NAME_LEN.end()
            ),
        });
    }
    Ok(name.to_string())
}

fn validate_avatar(avatar: &str) -> Result<String> {
    let avatar = avatar.trim();
    if avatar.is_empty() {
        return Err(ServiceError::Validation {
            field: "avatar",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(avatar.to_string())
}
