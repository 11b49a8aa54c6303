//! Votes, weights, and tally arithmetic.

use crate::core::Timestamp;
use crate::identity::IdentityRegistry;
use crate::policy::PolicyStore;
use serde::{Deserialize, Serialize};

/// A single recorded vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Voter agent id.
    pub voter_id: String,
    /// Approval or rejection.
    pub approved: bool,
    /// Weight the vote carried when cast.
    pub weight: u32,
    /// Cast timestamp.
    pub cast_at: Timestamp,
}

/// Weight a reputation score carries under weighted voting.
///
/// Reputation stays in [0, 991] under the adjustment rule, so the derived
/// weight spans 1-10.
pub fn vote_weight(reputation: u32) -> u32 {
    1 + reputation / 100
}

/// Running totals over a request's recorded votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    /// Summed weight of approvals.
    pub approval_weight: u32,
    /// Summed weight of rejections.
    pub rejection_weight: u32,
    /// Number of votes cast.
    pub votes_cast: usize,
}

/// Tally recorded votes.
pub fn tally(votes: &[Vote]) -> VoteTally {
    let mut t = VoteTally::default();
    for vote in votes {
        if vote.approved {
            t.approval_weight += vote.weight;
        } else {
            t.rejection_weight += vote.weight;
        }
        t.votes_cast += 1;
    }
    t
}

/// Approval weight required to pass a request among `eligible` voters.
///
/// Simple voting counts heads; weighted voting sums the *current*
/// reputations of the eligible voters, not a snapshot, then applies the
/// consensus percentage. Under the external total-order assumption
/// reputations cannot change mid-request, so the value is stable across a
/// request's lifetime in practice.
pub fn required_weight(
    policy: &PolicyStore,
    registry: &IdentityRegistry,
    eligible: &[String],
) -> u32 {
    if policy.weighted_voting_enabled() {
        let total: u64 = eligible
            .iter()
            .map(|id| {
                let reputation = registry.agent(id).map(|a| a.reputation).unwrap_or(0);
                u64::from(vote_weight(reputation))
            })
            .sum();
        (total * u64::from(policy.consensus_percentage())).div_ceil(100) as u32
    } else {
        policy.required_consensus(eligible.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::from_unix;

    #[test]
    fn test_vote_weight_range() {
        assert_eq!(vote_weight(0), 1);
        assert_eq!(vote_weight(99), 1);
        assert_eq!(vote_weight(100), 2);
        assert_eq!(vote_weight(500), 6);
        assert_eq!(vote_weight(991), 10);
    }

    #[test]
    fn test_tally() {
        let votes = vec![
            Vote { voter_id: "a".into(), approved: true, weight: 3, cast_at: from_unix(0) },
            Vote { voter_id: "b".into(), approved: false, weight: 2, cast_at: from_unix(1) },
            Vote { voter_id: "c".into(), approved: true, weight: 1, cast_at: from_unix(2) },
        ];
        let t = tally(&votes);
        assert_eq!(t.approval_weight, 4);
        assert_eq!(t.rejection_weight, 2);
        assert_eq!(t.votes_cast, 3);
    }
}
