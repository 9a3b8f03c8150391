//! Planning poker domain model.
//!
//! This crate holds the pure data model for estimation sessions:
//! - [`Vote`]: one participant's submitted card value
//! - [`User`]: a participant with a role and seat position
//! - [`VotingRound`]: one collect-then-reveal voting cycle
//! - [`Session`]: the aggregate root tying roster and rounds together
//!
//! Invariants (roster cap, unique names, single facilitator, seat
//! assignment, round monotonicity) are enforced by [`Session`]'s methods;
//! the internal collections are only exposed as read-only views. Storage
//! and concurrency live in `croupier-store`.

mod round;
mod session;
mod user;
mod vote;

pub use round::{RoundStatus, VotingRound, VotingStats};
pub use session::{JoinError, Session, SessionStatus};
pub use user::{User, UserRole};
pub use vote::Vote;
