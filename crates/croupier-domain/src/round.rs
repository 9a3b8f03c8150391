//! Voting round state machine and vote statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vote::Vote;

/// Lifecycle state of a voting round.
///
/// Rounds only move forward: `NotStarted` → `InProgress` → `Revealed`.
/// A revealed round is immutable history; estimating again means starting
/// a new round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    NotStarted,
    InProgress,
    Revealed,
}

/// Aggregate statistics over a round's votes.
///
/// Meaningful after reveal, but computable at any time from the votes
/// collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingStats {
    /// Arithmetic mean of the numeric votes, or 0.0 when there are none.
    pub average: f64,

    /// Count of votes grouped by their literal card value, numeric and
    /// sentinel cards alike.
    pub distribution: HashMap<String, usize>,

    /// Whether all numeric votes agree on a single value. Sentinel cards
    /// such as "coffee" never count toward or against consensus; zero
    /// numeric votes means no consensus.
    pub consensus: bool,

    /// Total number of votes cast.
    pub total_votes: usize,

    /// Number of votes with a numeric value.
    pub numeric_votes: usize,
}

/// One bounded cycle of vote collection followed by a single reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingRound {
    round_number: u32,
    status: RoundStatus,
    started_at: DateTime<Utc>,
    revealed_at: Option<DateTime<Utc>>,
    votes: HashMap<Uuid, Vote>,
}

impl VotingRound {
    /// Create a round that has not started collecting votes yet.
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            status: RoundStatus::NotStarted,
            started_at: Utc::now(),
            revealed_at: None,
            votes: HashMap::new(),
        }
    }

    /// 1-based round number, monotonically increasing within a session.
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn revealed_at(&self) -> Option<DateTime<Utc>> {
        self.revealed_at
    }

    /// Read-only view of the collected votes, keyed by voter.
    pub fn votes(&self) -> &HashMap<Uuid, Vote> {
        &self.votes
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Whether the given user has a vote recorded in this round.
    pub fn has_user_voted(&self, user_id: Uuid) -> bool {
        self.votes.contains_key(&user_id)
    }

    /// Begin collecting votes: clears any stale votes and marks the round
    /// in progress with a fresh start timestamp.
    pub fn start(&mut self) {
        self.votes.clear();
        self.status = RoundStatus::InProgress;
        self.started_at = Utc::now();
    }

    /// Record a vote. Ignored unless the round is in progress. A repeated
    /// vote from the same user overwrites the previous value and timestamp.
    pub fn submit_vote(&mut self, user_id: Uuid, value: impl Into<String>) {
        if self.status != RoundStatus::InProgress {
            return;
        }
        self.votes.insert(user_id, Vote::new(user_id, value));
    }

    /// Reveal the collected votes. Only valid while in progress; the round
    /// becomes immutable afterwards.
    pub fn reveal(&mut self) {
        if self.status != RoundStatus::InProgress {
            return;
        }
        self.status = RoundStatus::Revealed;
        self.revealed_at = Some(Utc::now());
    }

    /// Compute statistics over the votes collected so far.
    pub fn stats(&self) -> VotingStats {
        let numeric: Vec<i64> = self.votes.values().filter_map(Vote::numeric_value).collect();

        let average = if numeric.is_empty() {
            0.0
        } else {
            numeric.iter().sum::<i64>() as f64 / numeric.len() as f64
        };

        let mut distribution: HashMap<String, usize> = HashMap::new();
        for vote in self.votes.values() {
            *distribution.entry(vote.value.clone()).or_default() += 1;
        }

        let mut distinct = numeric.clone();
        distinct.sort_unstable();
        distinct.dedup();

        VotingStats {
            average,
            distribution,
            consensus: distinct.len() == 1,
            total_votes: self.votes.len(),
            numeric_votes: numeric.len(),
        }
    }
}
