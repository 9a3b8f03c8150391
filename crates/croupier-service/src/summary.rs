//! Compact session listing for lobby views.

use chrono::{DateTime, Utc};
use croupier_domain::Session;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a session for listing without exposing the full roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user_count: usize,
    pub max_users: usize,
}

impl SessionSummary {
    /// Whether the roster has room for another user.
    pub fn can_join(&self) -> bool {
        self.user_count < self.max_users
    }
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id(),
            name: session.name().to_string(),
            created_at: session.created_at(),
            user_count: session.users().len(),
            max_users: Session::MAX_USERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use croupier_domain::User;

    use super::*;

    #[test]
    fn summary_reflects_roster_size() {
        let mut session = Session::new("sprint 3");
        session.add_user(User::new("alice", "fox")).unwrap();
        session.add_user(User::new("bob", "owl")).unwrap();

        let summary = SessionSummary::from(&session);
        assert_eq!(summary.name, "sprint 3");
        assert_eq!(summary.user_count, 2);
        assert_eq!(summary.max_users, 16);
        assert!(summary.can_join());
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut session = Session::new("sprint 3");
        session.add_user(User::new("alice", "fox")).unwrap();

        let json = serde_json::to_string(&SessionSummary::from(&session)).unwrap();
        assert!(json.contains("\"user_count\":1"));
        assert!(json.contains("\"max_users\":16"));
    }
}
