//! Consensus engine: weighted/majority voting rounds scoped to a crew.
//!
//! Each request is a small state machine, `Open -> {Passed | Failed}`, with
//! the terminal transition taken either automatically as votes arrive or by
//! the timed finalization escape hatch.

use crate::consensus::voting::{required_weight, tally, Vote, VoteTally};
use crate::core::{Error, Hash256, Result, Timestamp};
use crate::events::{Notification, NotificationLog};
use crate::identity::IdentityRegistry;
use crate::policy::PolicyStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Voting window after which anyone may force-finalize a request.
pub const VOTING_WINDOW_SECS: i64 = 300;

/// A voting round over a proposed action, scoped to one crew.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusRequest {
    /// Monotonic request identifier.
    pub request_id: u64,
    /// Crew whose members may vote.
    pub crew_id: u64,
    /// Hash of the proposed action.
    pub proposal_hash: Hash256,
    /// Crew membership snapshot taken at request time.
    pub eligible_voters: Vec<String>,
    /// Votes recorded so far, in cast order.
    pub votes: Vec<Vote>,
    /// Whether the request reached a terminal state.
    pub finalized: bool,
    /// Terminal outcome; meaningful only once finalized.
    pub passed: bool,
    /// Request creation timestamp.
    pub created_at: Timestamp,
}

impl ConsensusRequest {
    /// Whether an agent is in the eligibility snapshot.
    pub fn is_eligible(&self, agent_id: &str) -> bool {
        self.eligible_voters.iter().any(|v| v == agent_id)
    }

    /// Whether an agent has already voted.
    pub fn has_voted(&self, agent_id: &str) -> bool {
        self.votes.iter().any(|v| v.voter_id == agent_id)
    }
}

/// Outcome of a `cast_vote` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Whether the vote finalized the request.
    pub finalized: bool,
    /// Terminal outcome; meaningful only when `finalized`.
    pub passed: bool,
}

/// Runs voting rounds over crew-scoped consensus requests.
///
/// A crew of `n` honest-majority voters tolerates up to `floor((n - 1) / 2)`
/// dishonest voters under simple majority.
#[derive(Clone, Debug, Default)]
pub struct ConsensusEngine {
    requests: Vec<ConsensusRequest>,
}

impl ConsensusEngine {
    /// Create an engine with no requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a voting round for a crew, snapshotting its current members as
    /// the eligible voters. A member listed twice in the crew gets a single
    /// eligibility slot, so full participation stays reachable and the
    /// required weight counts each voter once. Fails `InvalidCrew` for an
    /// unknown, dissolved, or memberless crew.
    pub fn request_consensus(
        &mut self,
        registry: &IdentityRegistry,
        crew_id: u64,
        proposal_hash: Hash256,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<u64> {
        let crew = registry
            .crew(crew_id)
            .ok_or_else(|| Error::InvalidCrew(format!("unknown crew {crew_id}")))?;
        if !crew.active {
            return Err(Error::InvalidCrew(format!("crew {crew_id} dissolved")));
        }
        if crew.members.is_empty() {
            return Err(Error::InvalidCrew(format!("crew {crew_id} has no members")));
        }

        let request_id = self.requests.len() as u64 + 1;
        let mut eligible_voters: Vec<String> = Vec::with_capacity(crew.members.len());
        for member in &crew.members {
            if !eligible_voters.contains(member) {
                eligible_voters.push(member.clone());
            }
        }
        self.requests.push(ConsensusRequest {
            request_id,
            crew_id,
            proposal_hash: proposal_hash.clone(),
            eligible_voters: eligible_voters.clone(),
            votes: Vec::new(),
            finalized: false,
            passed: false,
            created_at: at,
        });

        info!(request_id, crew_id, proposal = %proposal_hash, "consensus requested");
        events.emit(Notification::ConsensusRequested {
            request_id,
            crew_id,
            proposal_hash,
            eligible_voters,
            at,
        });
        Ok(request_id)
    }

    /// Record a vote and auto-finalize when the outcome is already decided.
    ///
    /// Auto-finalization fires when every eligible voter has voted or when
    /// the approval weight already meets the required weight.
    pub fn cast_vote(
        &mut self,
        registry: &IdentityRegistry,
        policy: &PolicyStore,
        request_id: u64,
        voter_id: &str,
        approved: bool,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<VoteOutcome> {
        let idx = self.request_index(request_id)?;
        {
            let request = &self.requests[idx];
            if request.finalized {
                return Err(Error::AlreadyFinalized(request_id));
            }
            if !request.is_eligible(voter_id) {
                return Err(Error::IneligibleVoter(voter_id.to_string()));
            }
            if request.has_voted(voter_id) {
                return Err(Error::AlreadyVoted(voter_id.to_string()));
            }
        }
        let agent = registry
            .agent(voter_id)
            .ok_or_else(|| Error::NotRegistered(voter_id.to_string()))?;
        if !agent.is_active() {
            return Err(Error::InactiveAgent(voter_id.to_string()));
        }

        let weight = if policy.weighted_voting_enabled() {
            crate::consensus::voting::vote_weight(agent.reputation)
        } else {
            1
        };

        let request = &mut self.requests[idx];
        request.votes.push(Vote {
            voter_id: voter_id.to_string(),
            approved,
            weight,
            cast_at: at,
        });
        events.emit(Notification::VoteCast {
            request_id,
            voter_id: voter_id.to_string(),
            approved,
            weight,
            at,
        });

        let tallied = tally(&request.votes);
        let required = required_weight(policy, registry, &request.eligible_voters);
        let all_voted = request.votes.len() == request.eligible_voters.len();
        let threshold_met = tallied.approval_weight >= required;

        if threshold_met || all_voted {
            request.finalized = true;
            request.passed = threshold_met;
            Self::emit_finalized(request_id, threshold_met, tallied.approval_weight, required, at, events);
            Ok(VoteOutcome { finalized: true, passed: threshold_met })
        } else {
            Ok(VoteOutcome { finalized: false, passed: false })
        }
    }

    /// Force-finalize a request whose voting window has elapsed.
    ///
    /// Callable by anyone. A request the consensus rules never finalized is
    /// failed (`passed = false`). Before the window elapses this fails
    /// `VotingPeriodNotExpired`.
    pub fn finalize_consensus(
        &mut self,
        registry: &IdentityRegistry,
        policy: &PolicyStore,
        request_id: u64,
        at: Timestamp,
        events: &mut NotificationLog,
    ) -> Result<()> {
        let idx = self.request_index(request_id)?;
        let request = &self.requests[idx];
        if request.finalized {
            return Err(Error::AlreadyFinalized(request_id));
        }
        if (at - request.created_at).num_seconds() < VOTING_WINDOW_SECS {
            return Err(Error::VotingPeriodNotExpired(request_id));
        }

        let tallied = tally(&request.votes);
        let required = required_weight(policy, registry, &request.eligible_voters);
        let request = &mut self.requests[idx];
        request.finalized = true;
        request.passed = false;
        Self::emit_finalized(request_id, false, tallied.approval_weight, required, at, events);
        Ok(())
    }

    fn emit_finalized(
        request_id: u64,
        passed: bool,
        approval_weight: u32,
        required_weight: u32,
        at: Timestamp,
        events: &mut NotificationLog,
    ) {
        info!(request_id, passed, approval_weight, required_weight, "consensus finalized");
        if passed {
            events.emit(Notification::ConsensusReached {
                request_id,
                approval_weight,
                required_weight,
                at,
            });
        } else {
            events.emit(Notification::ConsensusFailed {
                request_id,
                approval_weight,
                required_weight,
                at,
            });
        }
    }

    fn request_index(&self, request_id: u64) -> Result<usize> {
        request_id
            .checked_sub(1)
            .map(|idx| idx as usize)
            .filter(|&idx| idx < self.requests.len())
            .ok_or(Error::RequestNotFound(request_id))
    }

    // --- Read surface ---

    /// Look up a request by id.
    pub fn request(&self, request_id: u64) -> Option<&ConsensusRequest> {
        request_id
            .checked_sub(1)
            .and_then(|idx| self.requests.get(idx as usize))
    }

    /// Number of votes cast on a request.
    pub fn vote_count(&self, request_id: u64) -> Option<usize> {
        self.request(request_id).map(|r| r.votes.len())
    }

    /// Current tally snapshot for a request.
    pub fn tally(&self, request_id: u64) -> Option<VoteTally> {
        self.request(request_id).map(|r| tally(&r.votes))
    }

    /// Total requests ever opened.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }
}
