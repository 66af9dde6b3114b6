//! # Summary
//!
//! This module defines the five message shapes agents exchange:
//! `NextBallot` and `LastVote` for phase 1, `BeginBallot` and `Voted`
//! for phase 2, and `Success` for the broadcast that closes out a
//! ballot. Each carries the author's `AgentId`, matching the Python
//! source's `Message.author_id` field.

use crate::types::{AgentId, Ballot, BallotNumber, Proposal, Vote};

/// Phase 1a: a proposer asks a prospective quorum member not to vote
/// below `ballot_number` again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextBallot {
    pub author_id: AgentId,
    pub ballot_number: BallotNumber,
}

/// Phase 1b: an acceptor's promise, echoing back its last vote (if
/// any) so the proposer can satisfy B3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastVote {
    pub author_id: AgentId,
    pub ballot_number: BallotNumber,
    pub last_vote: Option<Vote>,
}

/// Phase 2a: a proposer asks the quorum to vote for a fully-formed
/// ballot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeginBallot {
    pub author_id: AgentId,
    pub ballot: Ballot,
}

/// Phase 2b: an acceptor's vote. Carries only the acceptor's own id,
/// never a mutated copy of the ballot's `voters` set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voted {
    pub author_id: AgentId,
    pub vote: Vote,
}

/// Broadcast once a ballot becomes successful: every agent in the
/// assembly learns the decree for the instance named by
/// `ballot_number`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Success {
    pub author_id: AgentId,
    pub decree: Proposal,
    pub ballot_number: BallotNumber,
}

/// A message in flight on the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    NextBallot(NextBallot),
    LastVote(LastVote),
    BeginBallot(BeginBallot),
    Voted(Voted),
    Success(Success),
}

impl Message {
    pub fn author_id(&self) -> AgentId {
        match self {
            Message::NextBallot(m) => m.author_id,
            Message::LastVote(m) => m.author_id,
            Message::BeginBallot(m) => m.author_id,
            Message::Voted(m) => m.author_id,
            Message::Success(m) => m.author_id,
        }
    }

    /// Short tag used in log lines, e.g. "NextBallot".
    pub fn kind(&self) -> &'static str {
        match self {
            Message::NextBallot(_) => "NextBallot",
            Message::LastVote(_) => "LastVote",
            Message::BeginBallot(_) => "BeginBallot",
            Message::Voted(_) => "Voted",
            Message::Success(_) => "Success",
        }
    }
}
