//! Service-level error taxonomy.

use croupier_domain::JoinError;
use uuid::Uuid;

/// Error type for session service operations.
///
/// Wrong-phase operations (voting on a revealed round, revealing twice)
/// are deliberately not errors: the domain treats them as silent no-ops so
/// retried calls stay idempotent.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A name or avatar failed validation.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// The active-session cap is reached.
    #[error("maximum number of concurrent sessions reached ({0})")]
    Capacity(usize),

    /// Unknown or expired session id.
    #[error("session not found or expired: {0}")]
    NotFound(Uuid),

    /// The user is not a member of the session.
    #[error("user {user_id} not found in session {session_id}")]
    UserNotFound { session_id: Uuid, user_id: Uuid },

    /// The session is full or not accepting new users.
    #[error("session is full or not accepting new users")]
    SessionClosed,

    /// Another user already holds this name (case-insensitive).
    #[error("username is already taken in this session")]
    NameTaken,

    /// A privileged action was attempted by a non-facilitator.
    #[error("only the facilitator may perform this action")]
    Forbidden,
}

impl From<croupier_store::Error> for ServiceError {
    fn from(err: croupier_store::Error) -> Self {
        match err {
            croupier_store::Error::Capacity(max) => Self::Capacity(max),
            croupier_store::Error::NotFound(id) => Self::NotFound(id),
            croupier_store::Error::UserNotFound {
                session_id,
                user_id,
            } => Self::UserNotFound {
                session_id,
                user_id,
            },
            croupier_store::Error::Join(JoinError::SessionClosed) => Self::SessionClosed,
            croupier_store::Error::Join(JoinError::NameTaken) => Self::NameTaken,
        }
    }
}

/// Result type for session service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
