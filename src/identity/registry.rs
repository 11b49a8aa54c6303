//! Identity registry: agent lifecycle, anti-Sybil quotas, reputation,
//! and crew formation.

use crate::core::{AccessControl, Capability, Error, Hash256, Result, Timestamp};
use crate::events::{Notification, NotificationLog};
use crate::identity::agent::{Agent, AgentRole, AgentStatus, MAX_AGENTS_PER_NODE};
use crate::identity::crew::{covers_all_roles, Crew};
use crate::policy::PolicyStore;
use std::collections::HashMap;
use tracing::{info, warn};

/// Owns agent identities, node quotas, reputation, and crew records.
///
/// Agents and crews live in append-only arenas with id-to-index maps, so
/// lookups are O(1) and iteration preserves insertion order.
#[derive(Clone, Debug, Default)]
pub struct IdentityRegistry {
    agents: Vec<Agent>,
    agent_index: HashMap<String, usize>,
    /// node id -> count of currently active identities it owns.
    node_active: HashMap<String, u32>,
    crews: Vec<Crew>,
}

impl IdentityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Registration ---

    /// Register a new agent identity. Administrator-only.
    ///
    /// Fails `AlreadyRegistered` for a known identity and
    /// `NodeCapacityExceeded` when the owning node already holds
    /// [`MAX_AGENTS_PER_NODE`] active identities.
    pub fn register(
        &mut self,
        caller: &str,
        access: &AccessControl,
        agent_id: &str,
        node_id: &str,
        role: AgentRole,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManageAgents)?;
        self.register_unchecked(agent_id, node_id, role, at, events)
    }

    /// Register many agents in one call. Administrator-only.
    ///
    /// Lenient batch semantics: entries failing the duplicate or quota
    /// check are skipped rather than aborting the batch, one notification
    /// is emitted per success, and the ids actually registered are
    /// returned.
    pub fn register_batch(
        &mut self,
        caller: &str,
        access: &AccessControl,
        entries: &[(String, String, AgentRole)],
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<Vec<String>> {
        access.require(caller, Capability::ManageAgents)?;
        let mut registered = Vec::new();
        for (agent_id, node_id, role) in entries {
            match self.register_unchecked(agent_id, node_id, *role, at, events) {
                Ok(()) => registered.push(agent_id.clone()),
                Err(err) => {
                    warn!(agent_id = %agent_id, %err, "batch registration entry skipped");
                }
            }
        }
        Ok(registered)
    }

    fn register_unchecked(
        &mut self,
        agent_id: &str,
        node_id: &str,
        role: AgentRole,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        if self.agent_index.contains_key(agent_id) {
            return Err(Error::AlreadyRegistered(agent_id.to_string()));
        }
        let active = self.node_active.get(node_id).copied().unwrap_or(0);
        if active >= MAX_AGENTS_PER_NODE {
            return Err(Error::NodeCapacityExceeded(node_id.to_string()));
        }

        self.agent_index.insert(agent_id.to_string(), self.agents.len());
        self.agents.push(Agent::new(agent_id, node_id, role, at));
        self.node_active.insert(node_id.to_string(), active + 1);

        info!(agent_id = %agent_id, node_id = %node_id, ?role, "agent registered");
        events.emit(Notification::AgentRegistered {
            agent_id: agent_id.to_string(),
            node_id: node_id.to_string(),
            role,
            at,
        });
        Ok(())
    }

    // --- Status ---

    /// Transition an agent between statuses. Administrator-only.
    ///
    /// Any transition is legal, but activating an agent re-consumes a slot
    /// in its node's quota, so reactivation on a full node fails
    /// `NodeCapacityExceeded`.
    pub fn set_status(
        &mut self,
        caller: &str,
        access: &AccessControl,
        agent_id: &str,
        new_status: AgentStatus,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManageAgents)?;
        let idx = *self
            .agent_index
            .get(agent_id)
            .ok_or_else(|| Error::NotRegistered(agent_id.to_string()))?;
        let old_status = self.agents[idx].status;
        if old_status == new_status {
            return Ok(());
        }

        let node_id = self.agents[idx].node_id.clone();
        if new_status == AgentStatus::Active {
            let active = self.node_active.get(&node_id).copied().unwrap_or(0);
            if active >= MAX_AGENTS_PER_NODE {
                return Err(Error::NodeCapacityExceeded(node_id));
            }
            self.node_active.insert(node_id, active + 1);
        } else if old_status == AgentStatus::Active {
            let active = self.node_active.get(&node_id).copied().unwrap_or(0);
            self.node_active.insert(node_id, active.saturating_sub(1));
        }

        self.agents[idx].status = new_status;
        events.emit(Notification::AgentStatusChanged {
            agent_id: agent_id.to_string(),
            old_status,
            new_status,
            at,
        });
        Ok(())
    }

    // --- Reputation ---

    /// Apply a judged outcome to an agent's reputation. Administrator-only.
    ///
    /// Returns the new reputation.
    pub fn update_reputation(
        &mut self,
        caller: &str,
        access: &AccessControl,
        agent_id: &str,
        was_correct: bool,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<u32> {
        access.require(caller, Capability::ManageAgents)?;
        let idx = *self
            .agent_index
            .get(agent_id)
            .ok_or_else(|| Error::NotRegistered(agent_id.to_string()))?;
        let (old, new) = self.agents[idx].record_outcome(was_correct);
        events.emit(Notification::ReputationChanged {
            agent_id: agent_id.to_string(),
            old_reputation: old,
            new_reputation: new,
            was_correct,
            at,
        });
        Ok(new)
    }

    /// Percentage of an agent's judged outcomes that were correct.
    pub fn accuracy(&self, agent_id: &str) -> Result<u64> {
        self.agent(agent_id)
            .map(Agent::accuracy)
            .ok_or_else(|| Error::NotRegistered(agent_id.to_string()))
    }

    // --- Crews ---

    /// Form a crew for a triggering condition, returning its id.
    ///
    /// Requires at least `min_crew_size` members, every member currently
    /// active with reputation at or above the policy floor, and all four
    /// roles covered. Fails `InvalidCrew` otherwise with no partial state.
    pub fn form_crew(
        &mut self,
        policy: &PolicyStore,
        event_id: Hash256,
        members: &[String],
        trigger_value: u64,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<u64> {
        if (members.len() as u32) < policy.min_crew_size() {
            return Err(Error::InvalidCrew(format!(
                "{} members, need at least {}",
                members.len(),
                policy.min_crew_size()
            )));
        }

        let mut roles = Vec::with_capacity(members.len());
        for member in members {
            let agent = self
                .agent(member)
                .ok_or_else(|| Error::InvalidCrew(format!("unknown member {member}")))?;
            if !agent.is_active() {
                return Err(Error::InvalidCrew(format!("member {member} not active")));
            }
            if agent.reputation < policy.min_reputation_score() {
                return Err(Error::InvalidCrew(format!(
                    "member {member} reputation {} below floor {}",
                    agent.reputation,
                    policy.min_reputation_score()
                )));
            }
            roles.push(agent.role);
        }
        if !covers_all_roles(&roles) {
            return Err(Error::InvalidCrew("missing required role".into()));
        }

        let crew_id = self.crews.len() as u64 + 1;
        self.crews.push(Crew {
            crew_id,
            event_id: event_id.clone(),
            formed_at: at,
            members: members.to_vec(),
            active: true,
            trigger_value,
        });

        info!(crew_id, event_id = %event_id, trigger_value, "crew formed");
        events.emit(Notification::CrewFormed {
            crew_id,
            event_id,
            members: members.to_vec(),
            trigger_value,
            at,
        });
        Ok(crew_id)
    }

    /// Dissolve an active crew. Fails `CrewNotActive` if already inactive.
    pub fn dissolve_crew(
        &mut self,
        crew_id: u64,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        let crew = crew_id
            .checked_sub(1)
            .and_then(|idx| self.crews.get_mut(idx as usize))
            .ok_or_else(|| Error::InvalidCrew(format!("unknown crew {crew_id}")))?;
        if !crew.active {
            return Err(Error::CrewNotActive(crew_id));
        }
        crew.active = false;
        events.emit(Notification::CrewDissolved { crew_id, at });
        Ok(())
    }

    // --- Read surface ---

    /// Look up an agent by identity.
    pub fn agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agent_index.get(agent_id).map(|&idx| &self.agents[idx])
    }

    /// Total registered agents (all statuses).
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Registered agents in registration order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Count of active identities a node currently owns.
    pub fn node_active_count(&self, node_id: &str) -> u32 {
        self.node_active.get(node_id).copied().unwrap_or(0)
    }

    /// Look up a crew by id.
    pub fn crew(&self, crew_id: u64) -> Option<&Crew> {
        crew_id
            .checked_sub(1)
            .and_then(|idx| self.crews.get(idx as usize))
    }

    /// Member list of a crew.
    pub fn crew_members(&self, crew_id: u64) -> Option<&[String]> {
        self.crew(crew_id).map(|c| c.members.as_slice())
    }

    /// Total crews ever formed (active and dissolved).
    pub fn crew_count(&self) -> usize {
        self.crews.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{from_unix, sha3_256};

    fn setup() -> (IdentityRegistry, AccessControl, PolicyStore, NotificationLog) {
        crate::core::testing::init_tracing();
        (
            IdentityRegistry::new(),
            AccessControl::new("admin"),
            PolicyStore::new(),
            NotificationLog::new(),
        )
    }

    fn register_crew_agents(
        registry: &mut IdentityRegistry,
        acl: &AccessControl,
        events: &mut NotificationLog,
    ) -> Vec<String> {
        let at = from_unix(1_000);
        let roles = AgentRole::ALL;
        let mut ids = Vec::new();
        for (i, role) in roles.iter().enumerate() {
            let id = format!("agent-{i}");
            registry
                .register("admin", acl, &id, &format!("node-{i}"), *role, at, events)
                .unwrap();
            ids.push(id);
        }
        ids
    }

    #[test]
    fn test_register_and_lookup() {
        let (mut registry, acl, _, mut events) = setup();
        registry
            .register("admin", &acl, "agent-1", "node-1", AgentRole::Sensor, from_unix(0), &mut events)
            .unwrap();

        let agent = registry.agent("agent-1").unwrap();
        assert_eq!(agent.reputation, 500);
        assert_eq!(agent.status, AgentStatus::Active);
        assert_eq!(registry.node_active_count("node-1"), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        registry
            .register("admin", &acl, "agent-1", "node-1", AgentRole::Sensor, at, &mut events)
            .unwrap();
        let err = registry.register("admin", &acl, "agent-1", "node-2", AgentRole::Decision, at, &mut events);
        assert_eq!(err, Err(Error::AlreadyRegistered("agent-1".into())));
        assert_eq!(registry.agent_count(), 1);
    }

    #[test]
    fn test_node_capacity_cap() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        for i in 0..MAX_AGENTS_PER_NODE {
            registry
                .register("admin", &acl, &format!("agent-{i}"), "node-1", AgentRole::Sensor, at, &mut events)
                .unwrap();
        }
        let err = registry.register("admin", &acl, "agent-8", "node-1", AgentRole::Sensor, at, &mut events);
        assert_eq!(err, Err(Error::NodeCapacityExceeded("node-1".into())));
        assert_eq!(registry.node_active_count("node-1"), 8);
    }

    #[test]
    fn test_status_transitions_track_node_quota() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        for i in 0..MAX_AGENTS_PER_NODE {
            registry
                .register("admin", &acl, &format!("agent-{i}"), "node-1", AgentRole::Sensor, at, &mut events)
                .unwrap();
        }

        // Suspending frees a slot for a new registration.
        registry
            .set_status("admin", &acl, "agent-0", AgentStatus::Suspended, at, &mut events)
            .unwrap();
        assert_eq!(registry.node_active_count("node-1"), 7);
        registry
            .register("admin", &acl, "agent-8", "node-1", AgentRole::Sensor, at, &mut events)
            .unwrap();

        // Reactivating on a full node would exceed the cap.
        let err = registry.set_status("admin", &acl, "agent-0", AgentStatus::Active, at, &mut events);
        assert_eq!(err, Err(Error::NodeCapacityExceeded("node-1".into())));
        assert_eq!(registry.agent("agent-0").unwrap().status, AgentStatus::Suspended);
    }

    #[test]
    fn test_suspended_agent_reactivates_directly() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        registry
            .register("admin", &acl, "agent-1", "node-1", AgentRole::Sensor, at, &mut events)
            .unwrap();
        registry
            .set_status("admin", &acl, "agent-1", AgentStatus::Suspended, at, &mut events)
            .unwrap();
        registry
            .set_status("admin", &acl, "agent-1", AgentStatus::Active, at, &mut events)
            .unwrap();
        assert!(registry.agent("agent-1").unwrap().is_active());
    }

    #[test]
    fn test_status_update_requires_authorization() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        registry
            .register("admin", &acl, "agent-1", "node-1", AgentRole::Sensor, at, &mut events)
            .unwrap();
        let err = registry.set_status("mallory", &acl, "agent-1", AgentStatus::Suspended, at, &mut events);
        assert!(matches!(err, Err(Error::AuthorizationError(_))));
    }

    #[test]
    fn test_policy_capability_does_not_cover_registry() {
        let (mut registry, mut acl, _, mut events) = setup();
        let at = from_unix(0);
        acl.grant("admin", "ops", Capability::ManagePolicy).unwrap();

        let err = registry.register("ops", &acl, "agent-1", "node-1", AgentRole::Sensor, at, &mut events);
        assert_eq!(err, Err(Error::AuthorizationError("ops".into())));
        assert_eq!(registry.agent_count(), 0);
    }

    #[test]
    fn test_batch_registration_skips_failures() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        registry
            .register("admin", &acl, "agent-0", "node-1", AgentRole::Sensor, at, &mut events)
            .unwrap();

        // Duplicate id plus a quota-violating tail; the valid middle entry
        // still registers. Lenient semantics carried over from the
        // reference behavior.
        let mut entries = vec![
            ("agent-0".to_string(), "node-2".to_string(), AgentRole::Decision),
            ("agent-1".to_string(), "node-2".to_string(), AgentRole::Aggregator),
        ];
        for i in 0..MAX_AGENTS_PER_NODE {
            entries.push((format!("bulk-{i}"), "node-3".to_string(), AgentRole::Sensor));
        }
        entries.push(("bulk-overflow".to_string(), "node-3".to_string(), AgentRole::Sensor));

        let registered = registry
            .register_batch("admin", &acl, &entries, at, &mut events)
            .unwrap();
        assert_eq!(registered.len(), 9); // agent-1 + bulk-0..bulk-7
        assert!(registered.contains(&"agent-1".to_string()));
        assert!(!registered.contains(&"agent-0".to_string()));
        assert!(!registered.contains(&"bulk-overflow".to_string()));
        // One notification per success, plus the initial registration.
        assert_eq!(events.len(), 10);
    }

    #[test]
    fn test_reputation_updates() {
        let (mut registry, acl, _, mut events) = setup();
        let at = from_unix(0);
        registry
            .register("admin", &acl, "agent-1", "node-1", AgentRole::Decision, at, &mut events)
            .unwrap();

        let rep = registry
            .update_reputation("admin", &acl, "agent-1", true, at, &mut events)
            .unwrap();
        assert_eq!(rep, 550);
        let rep = registry
            .update_reputation("admin", &acl, "agent-1", false, at, &mut events)
            .unwrap();
        assert_eq!(rep, 495);
        assert_eq!(registry.accuracy("agent-1").unwrap(), 50);
    }

    #[test]
    fn test_form_crew_success() {
        let (mut registry, acl, policy, mut events) = setup();
        let members = register_crew_agents(&mut registry, &acl, &mut events);

        let crew_id = registry
            .form_crew(&policy, sha3_256(b"event-1"), &members, 5500, from_unix(2_000), &mut events)
            .unwrap();
        assert_eq!(crew_id, 1);

        let crew = registry.crew(crew_id).unwrap();
        assert!(crew.active);
        assert_eq!(crew.members, members);
        assert_eq!(crew.trigger_value, 5500);
    }

    #[test]
    fn test_form_crew_missing_role() {
        let (mut registry, acl, policy, mut events) = setup();
        let at = from_unix(0);
        // Two sensors, no aggregator.
        for (i, role) in [
            AgentRole::Sensor,
            AgentRole::Sensor,
            AgentRole::Decision,
            AgentRole::Coordinator,
        ]
        .iter()
        .enumerate()
        {
            registry
                .register("admin", &acl, &format!("agent-{i}"), &format!("node-{i}"), *role, at, &mut events)
                .unwrap();
        }
        let members: Vec<String> = (0..4).map(|i| format!("agent-{i}")).collect();
        let err = registry.form_crew(&policy, sha3_256(b"event-1"), &members, 5500, at, &mut events);
        assert!(matches!(err, Err(Error::InvalidCrew(_))));
        assert_eq!(registry.crew_count(), 0);
    }

    #[test]
    fn test_form_crew_rejects_inactive_member() {
        let (mut registry, acl, policy, mut events) = setup();
        let members = register_crew_agents(&mut registry, &acl, &mut events);
        registry
            .set_status("admin", &acl, &members[0], AgentStatus::Suspended, from_unix(1), &mut events)
            .unwrap();

        let err = registry.form_crew(&policy, sha3_256(b"event-1"), &members, 5500, from_unix(2), &mut events);
        assert!(matches!(err, Err(Error::InvalidCrew(_))));
    }

    #[test]
    fn test_form_crew_too_small() {
        let (mut registry, acl, policy, mut events) = setup();
        let members = register_crew_agents(&mut registry, &acl, &mut events);
        let err = registry.form_crew(&policy, sha3_256(b"event-1"), &members[..3], 5500, from_unix(2), &mut events);
        assert!(matches!(err, Err(Error::InvalidCrew(_))));
    }

    #[test]
    fn test_min_reputation_gate() {
        let (mut registry, acl, mut policy, mut events) = setup();
        let members = register_crew_agents(&mut registry, &acl, &mut events);
        policy
            .set_min_reputation_score("admin", &acl, 501, from_unix(1), &mut events)
            .unwrap();

        // Everyone starts at 500, below the new floor.
        let err = registry.form_crew(&policy, sha3_256(b"event-1"), &members, 5500, from_unix(2), &mut events);
        assert!(matches!(err, Err(Error::InvalidCrew(_))));
    }

    #[test]
    fn test_dissolve_crew_once() {
        let (mut registry, acl, policy, mut events) = setup();
        let members = register_crew_agents(&mut registry, &acl, &mut events);
        let crew_id = registry
            .form_crew(&policy, sha3_256(b"event-1"), &members, 5500, from_unix(2), &mut events)
            .unwrap();

        registry.dissolve_crew(crew_id, from_unix(3), &mut events).unwrap();
        assert!(!registry.crew(crew_id).unwrap().active);

        let err = registry.dissolve_crew(crew_id, from_unix(4), &mut events);
        assert_eq!(err, Err(Error::CrewNotActive(crew_id)));
    }
}
