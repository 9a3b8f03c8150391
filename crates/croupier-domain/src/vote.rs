//! A single participant's submitted estimate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vote submitted by one participant during a voting round.
///
/// The value is kept as the literal string the participant picked: either a
/// numeric card ("1", "5", "13") or a non-numeric card such as "coffee" or
/// "?". Numeric interpretation happens lazily via [`Vote::numeric_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// The participant who cast this vote.
    pub user_id: Uuid,

    /// The literal card value as submitted.
    pub value: String,

    /// When the vote was submitted (overwritten on re-submission).
    pub submitted_at: DateTime<Utc>,
}

impl Vote {
    /// Create a new vote, timestamped now.
    pub fn new(user_id: Uuid, value: impl Into<String>) -> Self {
        Self {
            user_id,
            value: value.into(),
            submitted_at: Utc::now(),
        }
    }

    /// Whether the value parses as an integer estimate.
    pub fn is_numeric(&self) -> bool {
        self.value.parse::<i64>().is_ok()
    }

    /// The integer value of a numeric vote, or `None` for sentinel cards.
    pub fn numeric_value(&self) -> Option<i64> {
        self.value.parse::<i64>().ok()
    }
}
