//! Agent identity records and reputation arithmetic.

use crate::core::Timestamp;
use serde::{Deserialize, Serialize};

/// Initial reputation assigned at registration.
pub const INITIAL_REPUTATION: u32 = 500;

/// Reputation ceiling. The adjustment rule saturates toward this value
/// asymptotically and never overshoots it.
pub const MAX_REPUTATION: u32 = 1000;

/// Anti-Sybil cap: maximum simultaneously active identities per node.
pub const MAX_AGENTS_PER_NODE: u32 = 8;

/// Role an agent plays within a crew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    Sensor,
    Aggregator,
    Decision,
    Coordinator,
}

impl AgentRole {
    /// All roles a valid crew must cover.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Sensor,
        AgentRole::Aggregator,
        AgentRole::Decision,
        AgentRole::Coordinator,
    ];
}

/// Lifecycle status of an agent identity.
///
/// Agents are never deleted; deactivation is a status transition. Any
/// transition between statuses is legal (a suspended agent can be
/// reactivated directly).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    Inactive,
    Active,
    Suspended,
}

/// An agent identity owned by a physical node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    /// Verifiable identity (public-key-derived address).
    pub agent_id: String,
    /// Owning physical node identity.
    pub node_id: String,
    /// Role within crews.
    pub role: AgentRole,
    /// Lifecycle status.
    pub status: AgentStatus,
    /// Trust score in [0, 1000].
    pub reputation: u32,
    /// Registration timestamp.
    pub registered_at: Timestamp,
    /// Outcomes judged so far.
    pub total_decisions: u64,
    /// Outcomes judged correct.
    pub correct_decisions: u64,
}

impl Agent {
    /// Create a freshly registered, active agent.
    pub fn new(agent_id: &str, node_id: &str, role: AgentRole, at: Timestamp) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            node_id: node_id.to_string(),
            role,
            status: AgentStatus::Active,
            reputation: INITIAL_REPUTATION,
            registered_at: at,
            total_decisions: 0,
            correct_decisions: 0,
        }
    }

    /// Whether the agent is currently active.
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    /// Apply a judged outcome, returning `(old, new)` reputation.
    ///
    /// Correct outcomes close a tenth of the gap to the ceiling; incorrect
    /// outcomes shed a tenth of the current score. Both use integer
    /// division, so the score stays in [0, 1000] without clamping.
    pub fn record_outcome(&mut self, was_correct: bool) -> (u32, u32) {
        let old = self.reputation;
        self.reputation = adjust_reputation(old, was_correct);
        self.total_decisions += 1;
        if was_correct {
            self.correct_decisions += 1;
        }
        (old, self.reputation)
    }

    /// Percentage of judged outcomes that were correct; 0 before any outcome.
    pub fn accuracy(&self) -> u64 {
        if self.total_decisions == 0 {
            0
        } else {
            self.correct_decisions * 100 / self.total_decisions
        }
    }
}

/// Reputation adjustment rule.
pub fn adjust_reputation(current: u32, was_correct: bool) -> u32 {
    if was_correct {
        current + (MAX_REPUTATION - current) / 10
    } else {
        current - current / 10
    }
}
