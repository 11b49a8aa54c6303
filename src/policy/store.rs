//! Governance parameter store.

use crate::core::{AccessControl, Capability, Error, Result, Timestamp};
use crate::events::{Notification, NotificationLog};
use serde::{Deserialize, Serialize};

/// Default critical severity threshold for sensor readings.
pub const DEFAULT_CRITICAL_THRESHOLD: u64 = 5000;
/// Default warning severity threshold for sensor readings.
pub const DEFAULT_WARNING_THRESHOLD: u64 = 3000;
/// Default window (seconds) within which decisions describe the same event.
pub const DEFAULT_SAME_EVENT_WINDOW_SECS: u32 = 30;
/// Default minimum crew size.
pub const DEFAULT_MIN_CREW_SIZE: u32 = 4;
/// Default consensus percentage.
pub const DEFAULT_CONSENSUS_PERCENTAGE: u32 = 51;

/// Tunable governance parameters.
///
/// All updates are administrator-only and validate ordering/bound invariants
/// before committing; a violation fails the call with no state change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyStore {
    critical_threshold: u64,
    warning_threshold: u64,
    same_event_window_secs: u32,
    min_crew_size: u32,
    consensus_percentage: u32,
    weighted_voting_enabled: bool,
    min_reputation_score: u32,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self {
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            same_event_window_secs: DEFAULT_SAME_EVENT_WINDOW_SECS,
            min_crew_size: DEFAULT_MIN_CREW_SIZE,
            consensus_percentage: DEFAULT_CONSENSUS_PERCENTAGE,
            weighted_voting_enabled: false,
            min_reputation_score: 0,
        }
    }
}

impl PolicyStore {
    /// Create a policy store with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Pure queries ---

    /// Whether a reading is at or above the critical threshold.
    pub fn is_critical(&self, value: u64) -> bool {
        value >= self.critical_threshold
    }

    /// Whether a reading falls in the warning band.
    pub fn is_warning(&self, value: u64) -> bool {
        value >= self.warning_threshold && value < self.critical_threshold
    }

    /// Whether two timestamps fall within the same-event window.
    pub fn is_same_window(&self, t1: Timestamp, t2: Timestamp) -> bool {
        (t1 - t2).num_seconds().abs() <= i64::from(self.same_event_window_secs)
    }

    /// Minimum approvals required among `n` voters: `ceil(n * pct / 100)`.
    pub fn required_consensus(&self, n: u32) -> u32 {
        let required = (u64::from(n) * u64::from(self.consensus_percentage)).div_ceil(100);
        required as u32
    }

    pub fn critical_threshold(&self) -> u64 {
        self.critical_threshold
    }

    pub fn warning_threshold(&self) -> u64 {
        self.warning_threshold
    }

    pub fn same_event_window_secs(&self) -> u32 {
        self.same_event_window_secs
    }

    pub fn min_crew_size(&self) -> u32 {
        self.min_crew_size
    }

    pub fn consensus_percentage(&self) -> u32 {
        self.consensus_percentage
    }

    pub fn weighted_voting_enabled(&self) -> bool {
        self.weighted_voting_enabled
    }

    pub fn min_reputation_score(&self) -> u32 {
        self.min_reputation_score
    }

    // --- Administrative updates ---

    /// Update both severity thresholds in one step so the ordering invariant
    /// `warning < critical` is checked atomically.
    pub fn set_thresholds(
        &mut self,
        caller: &str,
        access: &AccessControl,
        critical: u64,
        warning: u64,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        if warning >= critical {
            return Err(Error::InvalidParameter(format!(
                "warning threshold {warning} must be below critical threshold {critical}"
            )));
        }
        self.critical_threshold = critical;
        self.warning_threshold = warning;
        events.emit(Notification::PolicyUpdated {
            parameter: "thresholds".into(),
            value: serde_json::json!({ "critical": critical, "warning": warning }),
            at,
        });
        Ok(())
    }

    /// Update the same-event window. Bounded 1-300 seconds.
    pub fn set_same_event_window(
        &mut self,
        caller: &str,
        access: &AccessControl,
        seconds: u32,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        if !(1..=300).contains(&seconds) {
            return Err(Error::InvalidParameter(format!(
                "same-event window {seconds}s outside 1-300"
            )));
        }
        self.same_event_window_secs = seconds;
        events.emit(Notification::PolicyUpdated {
            parameter: "same_event_window_secs".into(),
            value: serde_json::json!(seconds),
            at,
        });
        Ok(())
    }

    /// Update minimum crew size. Must stay at least 2.
    pub fn set_min_crew_size(
        &mut self,
        caller: &str,
        access: &AccessControl,
        size: u32,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        if size < 2 {
            return Err(Error::InvalidParameter(format!(
                "minimum crew size {size} below 2"
            )));
        }
        self.min_crew_size = size;
        events.emit(Notification::PolicyUpdated {
            parameter: "min_crew_size".into(),
            value: serde_json::json!(size),
            at,
        });
        Ok(())
    }

    /// Update the consensus percentage. Bounded 1-100.
    pub fn set_consensus_percentage(
        &mut self,
        caller: &str,
        access: &AccessControl,
        percentage: u32,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        if !(1..=100).contains(&percentage) {
            return Err(Error::InvalidParameter(format!(
                "consensus percentage {percentage} outside 1-100"
            )));
        }
        self.consensus_percentage = percentage;
        events.emit(Notification::PolicyUpdated {
            parameter: "consensus_percentage".into(),
            value: serde_json::json!(percentage),
            at,
        });
        Ok(())
    }

    /// Enable or disable reputation-weighted voting.
    pub fn set_weighted_voting(
        &mut self,
        caller: &str,
        access: &AccessControl,
        enabled: bool,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        self.weighted_voting_enabled = enabled;
        events.emit(Notification::PolicyUpdated {
            parameter: "weighted_voting_enabled".into(),
            value: serde_json::json!(enabled),
            at,
        });
        Ok(())
    }

    /// Update the reputation floor required for crew membership. Bounded 0-1000.
    pub fn set_min_reputation_score(
        &mut self,
        caller: &str,
        access: &AccessControl,
        score: u32,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        access.require(caller, Capability::ManagePolicy)?;
        if score > 1000 {
            return Err(Error::InvalidParameter(format!(
                "minimum reputation {score} above 1000"
            )));
        }
        self.min_reputation_score = score;
        events.emit(Notification::PolicyUpdated {
            parameter: "min_reputation_score".into(),
            value: serde_json::json!(score),
            at,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{from_unix, AccessControl};

    fn setup() -> (PolicyStore, AccessControl, NotificationLog) {
        (PolicyStore::new(), AccessControl::new("admin"), NotificationLog::new())
    }

    #[test]
    fn test_severity_bands() {
        let policy = PolicyStore::new();
        assert!(policy.is_critical(5000));
        assert!(policy.is_critical(9000));
        assert!(!policy.is_critical(4999));

        assert!(policy.is_warning(3000));
        assert!(policy.is_warning(4999));
        assert!(!policy.is_warning(5000));
        assert!(!policy.is_warning(2999));
    }

    #[test]
    fn test_same_window() {
        let policy = PolicyStore::new();
        let t = from_unix(1_000_000);
        assert!(policy.is_same_window(t, from_unix(1_000_030)));
        assert!(policy.is_same_window(from_unix(1_000_030), t));
        assert!(!policy.is_same_window(t, from_unix(1_000_031)));
    }

    #[test]
    fn test_required_consensus_rounds_up() {
        let policy = PolicyStore::new();
        // 51% of 4 voters = 2.04, rounds up to 3.
        assert_eq!(policy.required_consensus(4), 3);
        assert_eq!(policy.required_consensus(5), 3);
        assert_eq!(policy.required_consensus(100), 51);
        assert_eq!(policy.required_consensus(0), 0);
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        let (mut policy, acl, mut events) = setup();
        let at = from_unix(0);

        let err = policy.set_thresholds("admin", &acl, 4000, 4000, at, &mut events);
        assert!(matches!(err, Err(Error::InvalidParameter(_))));
        // Rejected update leaves both thresholds untouched.
        assert_eq!(policy.critical_threshold(), DEFAULT_CRITICAL_THRESHOLD);
        assert_eq!(policy.warning_threshold(), DEFAULT_WARNING_THRESHOLD);
        assert!(events.is_empty());

        policy.set_thresholds("admin", &acl, 8000, 2000, at, &mut events).unwrap();
        assert_eq!(policy.critical_threshold(), 8000);
        assert_eq!(policy.warning_threshold(), 2000);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_window_bounds() {
        let (mut policy, acl, mut events) = setup();
        let at = from_unix(0);

        assert!(policy.set_same_event_window("admin", &acl, 0, at, &mut events).is_err());
        assert!(policy.set_same_event_window("admin", &acl, 301, at, &mut events).is_err());
        policy.set_same_event_window("admin", &acl, 300, at, &mut events).unwrap();
        assert_eq!(policy.same_event_window_secs(), 300);
    }

    #[test]
    fn test_updates_require_authorization() {
        let (mut policy, acl, mut events) = setup();
        let at = from_unix(0);

        let err = policy.set_consensus_percentage("mallory", &acl, 66, at, &mut events);
        assert!(matches!(err, Err(Error::AuthorizationError(_))));
        assert_eq!(policy.consensus_percentage(), DEFAULT_CONSENSUS_PERCENTAGE);
    }

    #[test]
    fn test_min_crew_size_floor() {
        let (mut policy, acl, mut events) = setup();
        let at = from_unix(0);

        assert!(policy.set_min_crew_size("admin", &acl, 1, at, &mut events).is_err());
        policy.set_min_crew_size("admin", &acl, 2, at, &mut events).unwrap();
        assert_eq!(policy.min_crew_size(), 2);
    }

    #[test]
    fn test_weighted_voting_toggle() {
        let (mut policy, acl, mut events) = setup();
        let at = from_unix(0);

        assert!(!policy.weighted_voting_enabled());
        policy.set_weighted_voting("admin", &acl, true, at, &mut events).unwrap();
        assert!(policy.weighted_voting_enabled());
    }
}
