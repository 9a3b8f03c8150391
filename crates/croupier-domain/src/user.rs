//! Session participants and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a user holds within a session.
///
/// Exactly zero or one user per session is the facilitator; everyone else
/// is a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Runs the session: starts rounds, reveals votes, can end the session.
    Facilitator,
    /// Regular voter.
    Participant,
}

/// A participant in an estimation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,

    /// Display name, unique case-insensitively within a session.
    pub name: String,

    /// Avatar identifier chosen by the user.
    pub avatar: String,

    /// Current role within the session.
    pub role: UserRole,

    /// When the user joined the session.
    pub joined_at: DateTime<Utc>,

    /// Last activity timestamp for this user.
    pub last_activity: DateTime<Utc>,

    /// Whether the user currently has a live transport connection.
    pub connected: bool,

    /// Opaque transport-layer connection handle, when connected.
    pub connection_id: Option<String>,

    /// Seat slot within the session, unique in 1..=16. Assigned on join.
    pub position: u8,
}

impl User {
    /// Create a new participant with a fresh id, connected and unseated.
    ///
    /// The seat position is assigned by [`Session::add_user`] when the user
    /// actually joins a session.
    ///
    /// [`Session::add_user`]: crate::Session::add_user
    pub fn new(name: impl Into<String>, avatar: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar: avatar.into(),
            role: UserRole::Participant,
            joined_at: now,
            last_activity: now,
            connected: true,
            connection_id: None,
            position: 0,
        }
    }

    /// Record activity for this user.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Mark the user as connected with the given transport handle.
    pub fn set_connected(&mut self, connection_id: impl Into<String>) {
        self.connected = true;
        self.connection_id = Some(connection_id.into());
        self.touch();
    }

    /// Mark the user as disconnected, dropping the transport handle.
    pub fn set_disconnected(&mut self) {
        self.connected = false;
        self.connection_id = None;
    }
}
