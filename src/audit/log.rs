//! Append-only audit log with replay protection and conflict resolution.

use crate::audit::decision::{
    ConflictResolution, Decision, DecisionType, Severity, CONFLICT_REASON,
};
use crate::audit::signature::{signing_message, SignatureVerifier};
use crate::core::{sha3_256, Error, Hash256, Result, Timestamp};
use crate::events::{Notification, NotificationLog};
use crate::identity::IdentityRegistry;
use crate::policy::PolicyStore;
use std::collections::HashMap;
use tracing::{info, warn};

/// Minimum number of distinct signatures backing a decision.
pub const MIN_DECISION_SIGNERS: usize = 4;

/// Stores signed, replay-protected decision records and resolves conflicts
/// between crews reporting the same event-time bucket.
#[derive(Clone, Debug, Default)]
pub struct AuditLog {
    decisions: Vec<Decision>,
    /// event-time bucket -> decision ids logged in that bucket.
    buckets: HashMap<Hash256, Vec<u64>>,
    /// event-time bucket -> latest resolution for that bucket.
    conflicts: HashMap<Hash256, ConflictResolution>,
    /// agent id -> strictly increasing signature counter.
    nonces: HashMap<String, u64>,
}

impl AuditLog {
    /// Create an empty audit log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nonce for an agent; the value its next signature must bind.
    pub fn nonce(&self, agent_id: &str) -> u64 {
        self.nonces.get(agent_id).copied().unwrap_or(0)
    }

    /// Event-time bucket key for a timestamp under the configured window.
    ///
    /// Derived from time alone, not from the reading or site: two unrelated
    /// events in the same window map to the same bucket and are correlated
    /// as one event.
    pub fn bucket_key(policy: &PolicyStore, at: Timestamp) -> Hash256 {
        let window = i64::from(policy.same_event_window_secs());
        let bucket_start = at.timestamp().div_euclid(window) * window;
        sha3_256(&bucket_start.to_le_bytes())
    }

    /// Record an immutable decision backed by voter signatures.
    ///
    /// Every check runs against staged state before anything commits, so a
    /// failed call advances no nonce and writes no record. Each accepted
    /// signature must cover `(decision_hash, current_nonce)` for its voter
    /// and permanently advances that nonce; a voter listed twice in one
    /// call must therefore present consecutive-nonce signatures.
    #[allow(clippy::too_many_arguments)]
    pub fn log_decision(
        &mut self,
        registry: &IdentityRegistry,
        policy: &PolicyStore,
        verifier: &dyn SignatureVerifier,
        crew_id: u64,
        decision_hash: Hash256,
        decision_type: DecisionType,
        severity: Severity,
        trigger_value: u64,
        voters: &[String],
        signatures: &[Vec<u8>],
        notes: &str,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<u64> {
        if voters.len() != signatures.len() {
            return Err(Error::VoterCountMismatch(format!(
                "{} voters, {} signatures",
                voters.len(),
                signatures.len()
            )));
        }
        if voters.len() < MIN_DECISION_SIGNERS {
            return Err(Error::VoterCountMismatch(format!(
                "{} voters, need at least {MIN_DECISION_SIGNERS}",
                voters.len()
            )));
        }
        let crew = registry
            .crew(crew_id)
            .ok_or_else(|| Error::InvalidCrew(format!("unknown crew {crew_id}")))?;

        let mut staged_nonces: HashMap<String, u64> = HashMap::new();
        for (voter, signature) in voters.iter().zip(signatures) {
            let agent = registry
                .agent(voter)
                .ok_or_else(|| Error::NotRegistered(voter.clone()))?;
            if !agent.is_active() {
                return Err(Error::InactiveAgent(voter.clone()));
            }
            if !crew.has_member(voter) {
                return Err(Error::NotInCrew(voter.clone()));
            }
            let nonce = staged_nonces
                .get(voter)
                .copied()
                .unwrap_or_else(|| self.nonce(voter));
            let message = signing_message(&decision_hash, nonce);
            if !verifier.verify(voter, &message, signature) {
                return Err(Error::InvalidSignature(voter.clone()));
            }
            staged_nonces.insert(voter.clone(), nonce + 1);
        }

        // All checks passed; commit nonces and the record in one step.
        for (voter, nonce) in staged_nonces {
            self.nonces.insert(voter, nonce);
        }
        let decision_id = self.decisions.len() as u64 + 1;
        self.decisions.push(Decision {
            decision_id,
            crew_id,
            decision_hash: decision_hash.clone(),
            decision_type,
            severity,
            trigger_value,
            logged_at: at,
            voters: voters.to_vec(),
            executed: false,
            executed_at: None,
            notes: notes.to_string(),
        });

        info!(decision_id, crew_id, ?severity, "decision logged");
        events.emit(Notification::DecisionLogged {
            decision_id,
            crew_id,
            decision_hash,
            decision_type,
            severity,
            trigger_value,
            voters: voters.to_vec(),
            at,
        });

        let bucket = Self::bucket_key(policy, at);
        let bucket_len = {
            let ids = self.buckets.entry(bucket.clone()).or_default();
            ids.push(decision_id);
            ids.len()
        };
        if bucket_len >= 2 {
            self.resolve_conflict(&bucket, at, events);
        }
        Ok(decision_id)
    }

    /// Pick the authoritative decision for a contested bucket.
    ///
    /// The winner has the strictly highest severity; equal-severity ties go
    /// to the earliest `logged_at`, then to the earlier decision id. Each
    /// later decision in the bucket replaces the bucket's resolution with a
    /// fresh one.
    fn resolve_conflict(&mut self, bucket: &Hash256, at: Timestamp, events: &mut NotificationLog) {
        let ids = self.buckets[bucket].clone();
        events.emit(Notification::ConflictDetected {
            bucket: bucket.clone(),
            decision_ids: ids.clone(),
            at,
        });

        let mut winner = &self.decisions[(ids[0] - 1) as usize];
        for &id in &ids[1..] {
            let candidate = &self.decisions[(id - 1) as usize];
            if candidate.severity > winner.severity
                || (candidate.severity == winner.severity
                    && candidate.logged_at < winner.logged_at)
            {
                winner = candidate;
            }
        }

        let resolution = ConflictResolution {
            conflicting_decision_ids: ids.clone(),
            resolved_decision_id: winner.decision_id,
            final_severity: winner.severity,
            resolved_at: at,
            reason: CONFLICT_REASON.to_string(),
        };
        warn!(
            bucket = %bucket,
            winner = winner.decision_id,
            severity = ?winner.severity,
            "conflicting decisions resolved"
        );
        events.emit(Notification::ConflictResolved {
            bucket: bucket.clone(),
            resolved_decision_id: winner.decision_id,
            final_severity: winner.severity,
            at,
        });
        self.conflicts.insert(bucket.clone(), resolution);
    }

    /// Mark a decision executed. One-way; fails `AlreadyExecuted` on repeat
    /// calls and never touches conflict state.
    pub fn mark_executed(
        &mut self,
        decision_id: u64,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        let decision = decision_id
            .checked_sub(1)
            .and_then(|idx| self.decisions.get_mut(idx as usize))
            .ok_or(Error::DecisionNotFound(decision_id))?;
        if decision.executed {
            return Err(Error::AlreadyExecuted(decision_id));
        }
        decision.executed = true;
        decision.executed_at = Some(at);
        events.emit(Notification::DecisionExecuted { decision_id, at });
        Ok(())
    }

    // --- Read surface ---

    /// Look up a decision by id.
    pub fn decision(&self, decision_id: u64) -> Option<&Decision> {
        decision_id
            .checked_sub(1)
            .and_then(|idx| self.decisions.get(idx as usize))
    }

    /// Decision ids logged in an event-time bucket.
    pub fn decisions_in_bucket(&self, bucket: &Hash256) -> &[u64] {
        self.buckets.get(bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Latest conflict resolution for a bucket, if any.
    pub fn conflict(&self, bucket: &Hash256) -> Option<&ConflictResolution> {
        self.conflicts.get(bucket)
    }

    /// Total decisions logged.
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
}
