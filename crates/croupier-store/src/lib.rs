//! In-memory session storage for planning poker sessions.
//!
//! This crate provides:
//! - [`SessionStore`]: concurrent keyed storage with sliding TTL
//!   expiration, a cap on concurrently active sessions, and a
//!   creation-time index for enumeration
//! - [`CleanupScheduler`]: a cancellable background sweep that evicts
//!   whatever the on-access expiry checks missed
//!
//! State lives only in process memory and is lost on restart.
//!
//! # Example
//!
//! ```rust,ignore
//! use croupier_store::{CleanupScheduler, SessionStore, StoreConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = SessionStore::new(StoreConfig::default());
//! let token = CancellationToken::new();
//! let sweeper = CleanupScheduler::new(store.clone()).spawn(token.clone());
//! ```

mod config;
mod error;
mod scheduler;
mod store;
mod ttl;

pub use config::{
    DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_ACTIVE_SESSIONS, DEFAULT_SESSION_TTL, StoreConfig,
};
pub use error::{Error, Result};
pub use scheduler::CleanupScheduler;
pub use store::SessionStore;
pub use ttl::TtlTracker;
