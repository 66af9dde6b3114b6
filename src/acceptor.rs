//! # Summary
//!
//! This module defines the `Acceptor` role: purely reactive to
//! `NextBallot`, `BeginBallot` and `Success` messages, vectorized over
//! `nb_instances` independent slots. Basic Paxos is simply the
//! `nb_instances == 1` special case.

use std::sync::Arc;

use crate::agent::Agent;
use crate::message::{LastVote, Message, Voted};
use crate::transport::Transport;
use crate::types::{instance_of, AgentId, BallotNumber, Proposal, Vote};

pub struct Acceptor {
    id: AgentId,
    transport: Arc<dyn Transport>,
    nb_instances: usize,
    failure_rate: f64,
    avg_failure_duration: f64,

    next_ballot: Vec<Option<BallotNumber>>,
    last_vote: Vec<Option<Vote>>,
    ledger: Vec<Option<Proposal>>,
}

impl Acceptor {
    pub fn new(
        id: AgentId,
        transport: Arc<dyn Transport>,
        nb_instances: usize,
        failure_rate: f64,
        avg_failure_duration: f64,
    ) -> Self {
        transport.register(id);
        Acceptor {
            id,
            transport,
            nb_instances,
            failure_rate,
            avg_failure_duration,
            next_ballot: vec![None; nb_instances],
            last_vote: vec![None; nb_instances],
            ledger: vec![None; nb_instances],
        }
    }

    fn on_next_ballot(&mut self, msg: crate::message::NextBallot) {
        let i = instance_of(msg.ballot_number, self.nb_instances);
        let should_promise = match self.next_ballot[i] {
            None => true,
            Some(current) => msg.ballot_number > current,
        };
        if should_promise {
            self.next_ballot[i] = Some(msg.ballot_number);
            self.transport.send(
                msg.author_id,
                Message::LastVote(LastVote {
                    author_id: self.id,
                    ballot_number: msg.ballot_number,
                    last_vote: self.last_vote[i].clone(),
                }),
            );
        }
    }

    fn on_begin_ballot(&mut self, msg: crate::message::BeginBallot) {
        let i = instance_of(msg.ballot.number, self.nb_instances);
        if self.next_ballot[i] == Some(msg.ballot.number) {
            let vote = Vote {
                ballot: msg.ballot,
                acceptor: self.id,
            };
            self.last_vote[i] = Some(vote.clone());
            self.transport.send(
                msg.author_id,
                Message::Voted(Voted {
                    author_id: self.id,
                    vote,
                }),
            );
        }
    }

    fn on_success(&mut self, msg: crate::message::Success) {
        let i = instance_of(msg.ballot_number, self.nb_instances);
        log::info!("Agent #{} was notified that decree {:?} was accepted.", self.id, msg.decree);
        self.ledger[i] = Some(msg.decree);
    }
}

impl Agent for Acceptor {
    fn id(&self) -> AgentId {
        self.id
    }

    fn role(&self) -> &'static str {
        "Acceptor"
    }

    fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn avg_failure_duration(&self) -> f64 {
        self.avg_failure_duration
    }

    fn poll(&self) -> Option<Message> {
        self.transport.poll(self.id)
    }

    fn dispatch(&mut self, message: Message) {
        match message {
            Message::NextBallot(m) => self.on_next_ballot(m),
            Message::BeginBallot(m) => self.on_begin_ballot(m),
            Message::Success(m) => self.on_success(m),
            // An acceptor is never the target of LastVote or Voted.
            Message::LastVote(_) | Message::Voted(_) => {}
        }
    }

    fn reset(&mut self) {
        self.next_ballot = vec![None; self.nb_instances];
        self.last_vote = vec![None; self.nb_instances];
        // `ledger` is intentionally left untouched: learned decrees
        // are durable across a simulated crash.
    }

    fn ledger(&self) -> Vec<Option<Proposal>> {
        self.ledger.clone()
    }
}
