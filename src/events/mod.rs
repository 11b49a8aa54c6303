//! State-change notifications.
//!
//! Every committed state transition appends one notification to an
//! append-only channel read by external subscribers (orchestrator, metrics).
//! Notification order always matches the order of the transitions that
//! produced them, and each carries the full field set needed to reconstruct
//! the transition without re-querying state.

pub mod notification;

pub use notification::{Notification, NotificationLog};
