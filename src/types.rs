//! # Summary
//!
//! This module defines the immutable value objects exchanged between
//! agents: agent identifiers, proposals (decrees), ballot numbers,
//! ballots and votes. None of these types ever mutate after
//! construction; a proposer tracks mutable per-ballot bookkeeping
//! (`voters`) on its own side, never in a value shared with acceptors
//! (see the module-level note on `BeginBallot` in `message.rs`).

use std::sync::Arc;

use hashbrown::HashSet as Set;
use serde::{Deserialize, Serialize};

/// Unique identifier of an agent, handed out by the `Assembly`'s id
/// allocator at construction time.
pub type AgentId = usize;

/// The value being agreed upon. The simulator's only generator of
/// proposals is a proposer proposing its own identity, but the type
/// itself carries no such restriction.
#[derive(Serialize, Deserialize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Proposal(pub AgentId);

/// The lexicographic pair `(ballot_id, agent_id)`. Two proposers can
/// never pick the same `BallotNumber`, because each proposer only ever
/// increments its own `ballot_id` by the instance count and stamps its
/// own `agent_id` into the low half.
#[derive(Serialize, Deserialize)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BallotNumber {
    pub ballot_id: u64,
    pub agent_id: AgentId,
}

/// One attempt by a proposer to get a decree accepted by a quorum.
///
/// `quorum` is the set of acceptors this ballot was addressed to. It
/// is the only part of the classical `Ballot` tuple carried over the
/// wire; `voters` (who has actually voted) lives only in the
/// proposer's private `InFlightBallot` (see `proposer.rs`), per the
/// design note against sharing a mutable `voters` set between sender
/// and receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub number: BallotNumber,
    pub decree: Proposal,
    pub quorum: Arc<Set<AgentId>>,
}

/// An acceptor's record of having voted for a ballot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    pub ballot: Ballot,
    pub acceptor: AgentId,
}

impl Vote {
    pub fn number(&self) -> BallotNumber {
        self.ballot.number
    }
}

// `Vote` is ordered by its ballot number alone, matching the Python
// source's `@dataclass(order=True)` on `Ballot`/`Vote`: the `decree`
// and `quorum` never need to break ties because ballot numbers are
// already unique across the assembly.
impl PartialOrd for Vote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number().cmp(&other.number())
    }
}

/// Returns the majority quorum size for a cohort of `n_acceptors`.
pub fn majority(n_acceptors: usize) -> usize {
    n_acceptors / 2 + 1
}

/// `ballot_id mod nb_instances` recovers the target instance of a
/// ballot number, per invariant 5.
pub fn instance_of(ballot_number: BallotNumber, nb_instances: usize) -> usize {
    (ballot_number.ballot_id % nb_instances as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_number_orders_by_ballot_id_first() {
        let low = BallotNumber { ballot_id: 0, agent_id: 9 };
        let high = BallotNumber { ballot_id: 1, agent_id: 0 };
        assert!(low < high);
    }

    #[test]
    fn ballot_number_breaks_ties_by_agent_id() {
        let a = BallotNumber { ballot_id: 4, agent_id: 1 };
        let b = BallotNumber { ballot_id: 4, agent_id: 2 };
        assert!(a < b);
    }

    #[test]
    fn majority_is_floor_half_plus_one() {
        assert_eq!(majority(1), 1);
        assert_eq!(majority(2), 2);
        assert_eq!(majority(3), 2);
        assert_eq!(majority(5), 3);
        assert_eq!(majority(9), 5);
    }

    #[test]
    fn instance_of_routes_by_modulus() {
        let bn = BallotNumber { ballot_id: 7, agent_id: 0 };
        assert_eq!(instance_of(bn, 3), 1);
        assert_eq!(instance_of(bn, 1), 0);
    }
}
