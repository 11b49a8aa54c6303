//! Error types for vigil.
//!
//! Every error aborts the triggering operation with zero side effects:
//! no record half-written, no counter half-incremented. Callers receive
//! the error synchronously; nothing is retried internally.

use thiserror::Error;

/// Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vigil operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Authorization errors
    #[error("caller {0} lacks required capability")]
    AuthorizationError(String),

    // Identity errors
    #[error("agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("node {0} already owns the maximum number of active agents")]
    NodeCapacityExceeded(String),

    #[error("agent not registered: {0}")]
    NotRegistered(String),

    #[error("agent not active: {0}")]
    InactiveAgent(String),

    // Crew errors
    #[error("invalid crew: {0}")]
    InvalidCrew(String),

    #[error("crew not active: {0}")]
    CrewNotActive(u64),

    // Consensus errors
    #[error("consensus request not found: {0}")]
    RequestNotFound(u64),

    #[error("agent {0} is not an eligible voter")]
    IneligibleVoter(String),

    #[error("agent {0} already voted")]
    AlreadyVoted(String),

    #[error("consensus request {0} already finalized")]
    AlreadyFinalized(u64),

    #[error("voting period for request {0} has not expired")]
    VotingPeriodNotExpired(u64),

    // Audit errors
    #[error("voter count mismatch: {0}")]
    VoterCountMismatch(String),

    #[error("invalid signature from {0}")]
    InvalidSignature(String),

    #[error("agent {0} is not a member of the referenced crew")]
    NotInCrew(String),

    #[error("decision not found: {0}")]
    DecisionNotFound(u64),

    #[error("decision {0} already executed")]
    AlreadyExecuted(u64),

    // Policy errors
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
