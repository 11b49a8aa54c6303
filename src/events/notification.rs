//! Notification types and the append-only notification channel.

use crate::audit::decision::{DecisionType, Severity};
use crate::core::{Hash256, Timestamp};
use crate::identity::agent::{AgentRole, AgentStatus};
use serde::{Deserialize, Serialize};

/// A state-change notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    AgentRegistered {
        agent_id: String,
        node_id: String,
        role: AgentRole,
        at: Timestamp,
    },
    AgentStatusChanged {
        agent_id: String,
        old_status: AgentStatus,
        new_status: AgentStatus,
        at: Timestamp,
    },
    ReputationChanged {
        agent_id: String,
        old_reputation: u32,
        new_reputation: u32,
        was_correct: bool,
        at: Timestamp,
    },
    CrewFormed {
        crew_id: u64,
        event_id: Hash256,
        members: Vec<String>,
        trigger_value: u64,
        at: Timestamp,
    },
    CrewDissolved {
        crew_id: u64,
        at: Timestamp,
    },
    ConsensusRequested {
        request_id: u64,
        crew_id: u64,
        proposal_hash: Hash256,
        eligible_voters: Vec<String>,
        at: Timestamp,
    },
    VoteCast {
        request_id: u64,
        voter_id: String,
        approved: bool,
        weight: u32,
        at: Timestamp,
    },
    ConsensusReached {
        request_id: u64,
        approval_weight: u32,
        required_weight: u32,
        at: Timestamp,
    },
    ConsensusFailed {
        request_id: u64,
        approval_weight: u32,
        required_weight: u32,
        at: Timestamp,
    },
    DecisionLogged {
        decision_id: u64,
        crew_id: u64,
        decision_hash: Hash256,
        decision_type: DecisionType,
        severity: Severity,
        trigger_value: u64,
        voters: Vec<String>,
        at: Timestamp,
    },
    DecisionExecuted {
        decision_id: u64,
        at: Timestamp,
    },
    ConflictDetected {
        bucket: Hash256,
        decision_ids: Vec<u64>,
        at: Timestamp,
    },
    ConflictResolved {
        bucket: Hash256,
        resolved_decision_id: u64,
        final_severity: Severity,
        at: Timestamp,
    },
    PolicyUpdated {
        parameter: String,
        value: serde_json::Value,
        at: Timestamp,
    },
}

/// Append-only notification channel.
///
/// Components append to this log inside the same atomic step as the state
/// transition itself, so a failed operation never leaves a notification
/// behind.
#[derive(Clone, Debug, Default)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    /// Create an empty notification log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification and trace it.
    pub fn emit(&mut self, notification: Notification) {
        tracing::debug!(
            target: "vigil::events",
            event = %serde_json::to_string(&notification).unwrap_or_default(),
            "notification emitted"
        );
        self.entries.push(notification);
    }

    /// All notifications emitted so far, in transition order.
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    /// Number of notifications emitted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no notification has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain notifications for delivery to an external subscriber.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.entries)
    }
}
