//! Error types for session store operations.

use uuid::Uuid;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The active-session cap is reached.
    #[error("maximum number of concurrent sessions reached ({0})")]
    Capacity(usize),

    /// Session not found, or found expired and evicted.
    #[error("session not found: {0}")]
    NotFound(Uuid),

    /// The user is not a member of the session.
    #[error("user {user_id} not found in session {session_id}")]
    UserNotFound { session_id: Uuid, user_id: Uuid },

    /// The session rejected a join attempt.
    #[error(transparent)]
    Join(#[from] croupier_domain::JoinError),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
