//! Transport-facing facade for planning poker sessions.
//!
//! [`SessionService`] is the single entry point transport layers (REST
//! handlers, the push hub) use to drive sessions: create, join, leave,
//! vote, reveal, end. It validates input, maps store and domain failures
//! into the [`ServiceError`] taxonomy, and applies the read-modify-write
//! pattern against the store.

mod error;
mod service;
mod summary;

pub use error::{Result, ServiceError};
pub use service::SessionService;
pub use summary::SessionSummary;

// Re-export key types so transport crates need only this one dependency.
pub use croupier_domain::{
    JoinError, RoundStatus, Session, SessionStatus, User, UserRole, Vote, VotingRound, VotingStats,
};
pub use croupier_store::{CleanupScheduler, SessionStore, StoreConfig};
