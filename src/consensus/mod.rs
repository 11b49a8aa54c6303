//! Consensus Engine
//!
//! Crew-scoped Byzantine-fault-tolerant voting:
//! - Majority or reputation-weighted rounds
//! - Auto-finalization once the outcome is decided
//! - Timed escape hatch for stalled requests

pub mod engine;
pub mod voting;

pub use engine::{ConsensusEngine, ConsensusRequest, VoteOutcome, VOTING_WINDOW_SECS};
pub use voting::{tally, vote_weight, Vote, VoteTally};
