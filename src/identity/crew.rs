//! Crew records and role-coverage validation.

use crate::core::{Hash256, Timestamp};
use crate::identity::agent::AgentRole;
use serde::{Deserialize, Serialize};

/// An ad-hoc group of agents formed in response to a triggering condition.
///
/// Crews are never physically removed; dissolution flips `active` off.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Crew {
    /// Monotonic crew identifier.
    pub crew_id: u64,
    /// Hash correlating the crew to its triggering condition.
    pub event_id: Hash256,
    /// Formation timestamp.
    pub formed_at: Timestamp,
    /// Member agent ids, in formation order.
    pub members: Vec<String>,
    /// Whether the crew is still active.
    pub active: bool,
    /// Sensor reading that triggered formation.
    pub trigger_value: u64,
}

impl Crew {
    /// Whether an agent belongs to this crew.
    pub fn has_member(&self, agent_id: &str) -> bool {
        self.members.iter().any(|m| m == agent_id)
    }
}

/// Whether a member role set covers all four required roles at least once.
/// Duplicates beyond the required set are permitted.
pub fn covers_all_roles(roles: &[AgentRole]) -> bool {
    AgentRole::ALL
        .iter()
        .all(|required| roles.contains(required))
}
