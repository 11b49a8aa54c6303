//! Audit Log
//!
//! Signed, replay-protected decision records:
//! - Per-agent nonce counters binding each signature to a unique context
//! - Event-time buckets correlating decisions about the same event
//! - Deterministic conflict resolution between competing decisions

pub mod decision;
pub mod log;
pub mod signature;

pub use decision::{ConflictResolution, Decision, DecisionType, Severity, CONFLICT_REASON};
pub use log::{AuditLog, MIN_DECISION_SIGNERS};
pub use signature::{signing_message, Ed25519Verifier, SignatureVerifier};
