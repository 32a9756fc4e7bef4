//! Application state management for Risum
//!
//! This crate owns the two pieces of long-lived client state: the session
//! (who is signed in) and per-screen feed pagination.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pagination;
pub mod session;

pub use pagination::{ContentSource, FeedConfig, FeedCursor, FeedLoader, LoadOutcome};
pub use session::{
    SessionManager, SessionPhase, SessionServices, SessionState, SessionStateError, UserIdentity,
};
