//! Session aggregate: roster, facilitator, and voting round history.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::round::{RoundStatus, VotingRound};
use crate::user::{User, UserRole};

/// Lifecycle state of a session.
///
/// `Active` and `Paused` can flip back and forth; `Ended` is terminal and
/// freezes the session against further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Ended,
}

/// Why a join attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The roster is full or the session is not accepting users.
    #[error("session is full or not accepting new users")]
    SessionClosed,

    /// Another user already holds this name (case-insensitive).
    #[error("username is already taken in this session")]
    NameTaken,
}

/// An estimation session: the aggregate root of the domain model.
///
/// All roster and round mutations go through methods on this type so the
/// invariants hold: at most [`Session::MAX_USERS`] users, case-insensitively
/// unique names, at most one facilitator, seat positions unique in 1..=16,
/// and `current_round` always pointing at the last round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    status: SessionStatus,
    users: Vec<User>,
    voting_rounds: Vec<VotingRound>,
    current_round: u32,
    facilitator_id: Option<Uuid>,
}

impl Session {
    /// Maximum roster size.
    pub const MAX_USERS: usize = 16;

    /// Inactivity window after which a session counts as expired.
    pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Create an empty active session.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            last_activity: now,
            status: SessionStatus::Active,
            users: Vec::new(),
            voting_rounds: Vec::new(),
            current_round: 0,
            facilitator_id: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Read-only view of the roster, in seating (insertion) order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Read-only view of the round history, oldest first.
    pub fn voting_rounds(&self) -> &[VotingRound] {
        &self.voting_rounds
    }

    /// Number of the latest round, 0 when no round has been started.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn facilitator_id(&self) -> Option<Uuid> {
        self.facilitator_id
    }

    /// The facilitator user, when one is assigned and still present.
    pub fn facilitator(&self) -> Option<&User> {
        self.facilitator_id.and_then(|id| self.user(id))
    }

    /// Look up a user by id.
    pub fn user(&self, user_id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    /// The round `current_round` points at, if any round exists.
    pub fn current_voting_round(&self) -> Option<&VotingRound> {
        self.voting_rounds
            .iter()
            .find(|r| r.round_number() == self.current_round)
    }

    /// Whether a new user could join right now.
    pub fn can_join(&self) -> bool {
        self.users.len() < Self::MAX_USERS && self.status == SessionStatus::Active
    }

    /// How long the session has been idle.
    pub fn idle_time(&self) -> Duration {
        (Utc::now() - self.last_activity).to_std().unwrap_or_default()
    }

    /// Whether the inactivity timeout has lapsed.
    pub fn is_expired(&self) -> bool {
        self.idle_time() > Self::INACTIVITY_TIMEOUT
    }

    /// Record activity, resetting the inactivity window.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Add a user to the roster.
    ///
    /// The first user ever added becomes the facilitator. The user is
    /// seated at the lowest free position in 1..=16.
    pub fn add_user(&mut self, mut user: User) -> Result<(), JoinError> {
        if !self.can_join() {
            return Err(JoinError::SessionClosed);
        }
        let folded = user.name.to_lowercase();
        if self.users.iter().any(|u| u.name.to_lowercase() == folded) {
            return Err(JoinError::NameTaken);
        }

        if self.users.is_empty() {
            user.role = UserRole::Facilitator;
            self.facilitator_id = Some(user.id);
        }

        user.position = self.next_available_position();
        self.users.push(user);
        self.touch();
        Ok(())
    }

    /// Remove a user, reassigning the facilitator role when the departing
    /// user held it. Returns false if the user was not in the roster.
    pub fn remove_user(&mut self, user_id: Uuid) -> bool {
        if self.status == SessionStatus::Ended {
            return false;
        }
        let Some(idx) = self.users.iter().position(|u| u.id == user_id) else {
            return false;
        };

        self.users.remove(idx);

        if self.facilitator_id == Some(user_id) {
            self.reassign_facilitator();
        }

        self.touch();
        true
    }

    /// Mark a user as connected with the given transport handle.
    pub fn mark_connected(&mut self, user_id: Uuid, connection_id: impl Into<String>) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) else {
            return false;
        };
        user.set_connected(connection_id);
        self.touch();
        true
    }

    /// Mark a user as disconnected.
    pub fn mark_disconnected(&mut self, user_id: Uuid) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) else {
            return false;
        };
        user.set_disconnected();
        true
    }

    /// Start the next voting round. Requires an assigned facilitator and
    /// an active session; otherwise a no-op.
    pub fn start_voting_round(&mut self) {
        if self.facilitator_id.is_none() || self.status != SessionStatus::Active {
            return;
        }

        self.current_round += 1;
        let mut round = VotingRound::new(self.current_round);
        round.start();
        self.voting_rounds.push(round);
        self.touch();
    }

    /// Submit a vote to the current round. A no-op unless that round is
    /// collecting votes.
    pub fn submit_vote(&mut self, user_id: Uuid, value: impl Into<String>) {
        if self.status == SessionStatus::Ended {
            return;
        }
        let current = self.current_round;
        if let Some(round) = self
            .voting_rounds
            .iter_mut()
            .find(|r| r.round_number() == current)
            && round.status() == RoundStatus::InProgress
        {
            round.submit_vote(user_id, value);
            self.touch();
        }
    }

    /// Reveal the current round's votes. A no-op unless that round is
    /// collecting votes.
    pub fn reveal_votes(&mut self) {
        if self.status == SessionStatus::Ended {
            return;
        }
        let current = self.current_round;
        if let Some(round) = self
            .voting_rounds
            .iter_mut()
            .find(|r| r.round_number() == current)
            && round.status() == RoundStatus::InProgress
        {
            round.reveal();
            self.touch();
        }
    }

    /// Pause the session. A no-op once ended.
    pub fn pause(&mut self) {
        if self.status == SessionStatus::Ended {
            return;
        }
        self.status = SessionStatus::Paused;
        self.touch();
    }

    /// Resume a paused session. A no-op once ended.
    pub fn resume(&mut self) {
        if self.status == SessionStatus::Ended {
            return;
        }
        self.status = SessionStatus::Active;
        self.touch();
    }

    /// End the session. Terminal: every later mutation is a no-op.
    pub fn end(&mut self) {
        self.status = SessionStatus::Ended;
        self.touch();
    }

    /// Hand the facilitator role to another roster member. Returns false
    /// if the target is not in the roster or the session has ended.
    pub fn transfer_facilitator(&mut self, new_facilitator_id: Uuid) -> bool {
        if self.status == SessionStatus::Ended {
            return false;
        }
        if !self.users.iter().any(|u| u.id == new_facilitator_id) {
            return false;
        }

        if let Some(current_id) = self.facilitator_id
            && let Some(current) = self.users.iter_mut().find(|u| u.id == current_id)
        {
            current.role = UserRole::Participant;
        }

        if let Some(target) = self.users.iter_mut().find(|u| u.id == new_facilitator_id) {
            target.role = UserRole::Facilitator;
        }
        self.facilitator_id = Some(new_facilitator_id);
        self.touch();
        true
    }

    /// Pick the connected user with the earliest join time as the new
    /// facilitator; with nobody connected, clear the role and pause.
    fn reassign_facilitator(&mut self) {
        let successor_id = self
            .users
            .iter()
            .filter(|u| u.connected)
            .min_by_key(|u| u.joined_at)
            .map(|u| u.id);

        match successor_id {
            Some(id) => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
                    user.role = UserRole::Facilitator;
                }
                self.facilitator_id = Some(id);
            }
            None => {
                self.facilitator_id = None;
                self.pause();
            }
        }
    }

    /// Lowest free seat in 1..=16. The fallback past the cap is unreachable
    /// while `add_user` enforces the roster limit.
    fn next_available_position(&self) -> u8 {
        let occupied: Vec<u8> = self.users.iter().map(|u| u.position).collect();
        for slot in 1..=Self::MAX_USERS as u8 {
            if !occupied.contains(&slot) {
                return slot;
            }
        }
        self.users.len() as u8 + 1
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn session_with_users(names: &[&str]) -> Session {
        let mut session = Session::new("sprint 12");
        for name in names {
            session.add_user(User::new(*name, "fox")).unwrap();
        }
        session
    }

    #[test]
    fn first_user_becomes_facilitator() {
        let session = session_with_users(&["alice", "bob"]);
        let alice = &session.users()[0];
        assert_eq!(alice.role, UserRole::Facilitator);
        assert_eq!(session.facilitator_id(), Some(alice.id));
        assert_eq!(session.users()[1].role, UserRole::Participant);
    }

    #[test]
    fn names_unique_case_insensitively() {
        let mut session = session_with_users(&["Alice"]);
        let err = session.add_user(User::new("aLiCe", "owl")).unwrap_err();
        assert_eq!(err, JoinError::NameTaken);
        assert_eq!(session.users().len(), 1);
    }

    #[test]
    fn name_uniqueness_folds_non_ascii_case() {
        let mut session = session_with_users(&["Émile"]);
        let err = session.add_user(User::new("émile", "owl")).unwrap_err();
        assert_eq!(err, JoinError::NameTaken);

        // Different letters with shared ASCII prefixes still get in.
        session.add_user(User::new("Emile", "cat")).unwrap();
        assert_eq!(session.users().len(), 2);
    }

    #[test]
    fn roster_cap_rejects_seventeenth_user() {
        let mut session = Session::new("big room");
        for i in 0..Session::MAX_USERS {
            session.add_user(User::new(format!("user-{i}"), "fox")).unwrap();
        }

        let err = session.add_user(User::new("late", "owl")).unwrap_err();
        assert_eq!(err, JoinError::SessionClosed);
    }

    #[test]
    fn positions_unique_in_range() {
        let mut session = Session::new("room");
        for i in 0..Session::MAX_USERS {
            session.add_user(User::new(format!("user-{i}"), "fox")).unwrap();
        }

        let positions: HashSet<u8> = session.users().iter().map(|u| u.position).collect();
        assert_eq!(positions.len(), Session::MAX_USERS);
        assert!(positions.iter().all(|p| (1..=16).contains(p)));
    }

    #[test]
    fn freed_seat_is_reused() {
        let mut session = session_with_users(&["alice", "bob", "carol"]);
        let bob_id = session.users()[1].id;
        assert_eq!(session.users()[1].position, 2);

        assert!(session.remove_user(bob_id));

        session.add_user(User::new("dave", "owl")).unwrap();
        let dave = session.user(session.users().last().unwrap().id).unwrap();
        assert_eq!(dave.position, 2);
    }

    #[test]
    fn join_rejected_when_paused() {
        let mut session = session_with_users(&["alice"]);
        session.pause();
        let err = session.add_user(User::new("bob", "owl")).unwrap_err();
        assert_eq!(err, JoinError::SessionClosed);
    }

    #[test]
    fn removing_facilitator_promotes_earliest_connected() {
        let mut session = session_with_users(&["alice", "bob", "carol"]);
        let alice_id = session.users()[0].id;
        let bob_id = session.users()[1].id;

        assert!(session.remove_user(alice_id));

        assert_eq!(session.facilitator_id(), Some(bob_id));
        assert_eq!(session.user(bob_id).unwrap().role, UserRole::Facilitator);
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn removing_facilitator_skips_disconnected_users() {
        let mut session = session_with_users(&["alice", "bob", "carol"]);
        let alice_id = session.users()[0].id;
        let bob_id = session.users()[1].id;
        let carol_id = session.users()[2].id;

        session.mark_disconnected(bob_id);
        assert!(session.remove_user(alice_id));

        assert_eq!(session.facilitator_id(), Some(carol_id));
    }

    #[test]
    fn removing_facilitator_with_nobody_connected_pauses() {
        let mut session = session_with_users(&["alice", "bob"]);
        let alice_id = session.users()[0].id;
        let bob_id = session.users()[1].id;

        session.mark_disconnected(bob_id);
        assert!(session.remove_user(alice_id));

        assert_eq!(session.facilitator_id(), None);
        assert_eq!(session.status(), SessionStatus::Paused);
    }

    #[test]
    fn start_round_requires_facilitator_and_active_status() {
        let mut session = Session::new("empty");
        session.start_voting_round();
        assert_eq!(session.current_round(), 0);

        let mut session = session_with_users(&["alice"]);
        session.pause();
        session.start_voting_round();
        assert_eq!(session.current_round(), 0);

        session.resume();
        session.start_voting_round();
        assert_eq!(session.current_round(), 1);
        assert_eq!(
            session.current_voting_round().unwrap().status(),
            RoundStatus::InProgress
        );
    }

    #[test]
    fn round_numbers_increase_monotonically() {
        let mut session = session_with_users(&["alice"]);
        session.start_voting_round();
        session.reveal_votes();
        session.start_voting_round();

        assert_eq!(session.current_round(), 2);
        let numbers: Vec<u32> = session
            .voting_rounds()
            .iter()
            .map(|r| r.round_number())
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn submit_vote_noop_outside_round() {
        let mut session = session_with_users(&["alice"]);
        let alice_id = session.users()[0].id;

        // No round started yet.
        session.submit_vote(alice_id, "5");
        assert!(session.current_voting_round().is_none());

        session.start_voting_round();
        session.reveal_votes();

        // Round already revealed.
        session.submit_vote(alice_id, "5");
        assert_eq!(session.current_voting_round().unwrap().vote_count(), 0);
    }

    #[test]
    fn earlier_rounds_stay_immutable() {
        let mut session = session_with_users(&["alice"]);
        let alice_id = session.users()[0].id;

        session.start_voting_round();
        session.submit_vote(alice_id, "3");
        session.reveal_votes();
        session.start_voting_round();
        session.submit_vote(alice_id, "8");

        let first = &session.voting_rounds()[0];
        assert_eq!(first.votes()[&alice_id].value, "3");
        assert_eq!(first.status(), RoundStatus::Revealed);
    }

    #[test]
    fn transfer_facilitator_swaps_roles() {
        let mut session = session_with_users(&["alice", "bob"]);
        let alice_id = session.users()[0].id;
        let bob_id = session.users()[1].id;

        assert!(session.transfer_facilitator(bob_id));

        assert_eq!(session.facilitator_id(), Some(bob_id));
        assert_eq!(session.user(alice_id).unwrap().role, UserRole::Participant);
        assert_eq!(session.user(bob_id).unwrap().role, UserRole::Facilitator);
    }

    #[test]
    fn transfer_to_unknown_user_fails() {
        let mut session = session_with_users(&["alice"]);
        let alice_id = session.users()[0].id;

        assert!(!session.transfer_facilitator(Uuid::new_v4()));
        assert_eq!(session.facilitator_id(), Some(alice_id));
    }

    #[test]
    fn ended_session_is_frozen() {
        let mut session = session_with_users(&["alice", "bob"]);
        let bob_id = session.users()[1].id;
        session.start_voting_round();
        session.end();

        session.resume();
        assert_eq!(session.status(), SessionStatus::Ended);

        session.pause();
        assert_eq!(session.status(), SessionStatus::Ended);

        assert!(!session.remove_user(bob_id));
        assert!(!session.transfer_facilitator(bob_id));
        assert!(session.add_user(User::new("late", "fox")).is_err());

        session.submit_vote(bob_id, "5");
        assert_eq!(session.current_voting_round().unwrap().vote_count(), 0);
    }

    #[test]
    fn pause_and_resume_flip_status() {
        let mut session = session_with_users(&["alice"]);
        session.pause();
        assert_eq!(session.status(), SessionStatus::Paused);
        assert!(!session.can_join());

        session.resume();
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.can_join());
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let session = Session::new("fresh");
        assert!(!session.is_expired());
        assert!(session.idle_time() < Duration::from_secs(1));
    }
}
