//! Identity Registry
//!
//! Owns agent identities and their governance state:
//! - Registration with per-node anti-Sybil quotas
//! - Role assignment and lifecycle status
//! - Reputation-weighted trust scoring
//! - Crew formation and dissolution

pub mod agent;
pub mod crew;
pub mod registry;

pub use agent::{Agent, AgentRole, AgentStatus, INITIAL_REPUTATION, MAX_AGENTS_PER_NODE, MAX_REPUTATION};
pub use crew::Crew;
pub use registry::IdentityRegistry;
