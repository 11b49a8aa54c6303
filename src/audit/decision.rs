//! Decision records and conflict resolutions.

use crate::core::{Hash256, Timestamp};
use serde::{Deserialize, Serialize};

/// Kind of decision being audited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionType {
    CrewFormation,
    AnomalyDetection,
    ActionExecution,
}

/// Severity of the condition a decision responds to.
///
/// Variant order defines the ranking used by conflict resolution:
/// `Safe < Warning < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Safe,
    Warning,
    Critical,
}

/// An audited decision. Immutable except the one-way `executed` transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Decision {
    /// Monotonic decision identifier.
    pub decision_id: u64,
    /// Crew that made the decision.
    pub crew_id: u64,
    /// Reference to the off-chain decision payload.
    pub decision_hash: Hash256,
    /// Kind of decision.
    pub decision_type: DecisionType,
    /// Severity attributed to the triggering condition.
    pub severity: Severity,
    /// Sensor reading that triggered the decision.
    pub trigger_value: u64,
    /// Logging timestamp.
    pub logged_at: Timestamp,
    /// Agents whose signatures back the decision, in submission order.
    pub voters: Vec<String>,
    /// Whether the decision has been carried out.
    pub executed: bool,
    /// Execution timestamp, once executed.
    pub executed_at: Option<Timestamp>,
    /// Free-form operator notes.
    pub notes: String,
}

/// Fixed reason string recorded on every conflict resolution.
pub const CONFLICT_REASON: &str = "escalated to highest severity; first timestamp wins";

/// Deterministic selection of one authoritative decision among several
/// reporting the same event bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// All decisions in the bucket at resolution time.
    pub conflicting_decision_ids: Vec<u64>,
    /// The winning decision.
    pub resolved_decision_id: u64,
    /// Severity of the winning decision.
    pub final_severity: Severity,
    /// Resolution timestamp.
    pub resolved_at: Timestamp,
    /// Why this winner was chosen.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ranking() {
        assert!(Severity::Safe < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(
            [Severity::Critical, Severity::Safe, Severity::Warning]
                .iter()
                .max(),
            Some(&Severity::Critical)
        );
    }
}
