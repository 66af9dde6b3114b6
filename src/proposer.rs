//! # Summary
//!
//! This module defines the `Proposer` role: the two-phase ballot
//! initiator. A proposer periodically starts a new ballot per
//! instance (phase 1), collects `LastVote` promises until it has a
//! full quorum's worth, picks a decree that satisfies B3, asks the
//! quorum to vote (phase 2), and — once a majority has voted —
//! broadcasts `Success` to the whole assembly.
//!
//! Per-instance state (`last_tried`, `responses`, `ledger`) is
//! vectorized to `nb_instances` slots; basic Paxos is the
//! `nb_instances == 1` special case, matching `Acceptor`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashSet as Set;
use rand::seq::SliceRandom;

use crate::agent::Agent;
use crate::message::{BeginBallot, LastVote, Message, NextBallot, Success, Voted};
use crate::transport::Transport;
use crate::types::{instance_of, AgentId, Ballot, BallotNumber, Proposal, Vote};

/// A proposer's private view of a ballot it is currently organizing.
/// `voters` never leaves this struct: acceptors learn only that they
/// themselves voted, never the full set (see `types::Ballot`'s docs).
struct InFlightBallot {
    number: BallotNumber,
    quorum: Arc<Set<AgentId>>,
    decree: Option<Proposal>,
    voters: Set<AgentId>,
}

impl InFlightBallot {
    fn successful(&self) -> bool {
        self.quorum.iter().all(|a| self.voters.contains(a))
    }
}

pub struct Proposer {
    id: AgentId,
    transport: Arc<dyn Transport>,
    acceptors: Arc<Vec<AgentId>>,
    all_agents: Arc<Vec<AgentId>>,
    nb_instances: usize,
    failure_rate: f64,
    avg_failure_duration: f64,
    period: Duration,

    t0: Instant,
    last_tried: Vec<Option<InFlightBallot>>,
    responses: Vec<Vec<Option<Vote>>>,
    ledger: Vec<Option<Proposal>>,
}

impl Proposer {
    pub fn new(
        id: AgentId,
        transport: Arc<dyn Transport>,
        acceptors: Arc<Vec<AgentId>>,
        all_agents: Arc<Vec<AgentId>>,
        nb_instances: usize,
        failure_rate: f64,
        avg_failure_duration: f64,
        period: Duration,
    ) -> Self {
        transport.register(id);
        Proposer {
            id,
            transport,
            acceptors,
            all_agents,
            nb_instances,
            failure_rate,
            avg_failure_duration,
            period,
            // The first ballot fires `period - 5s` after start, i.e. 5s
            // of warm-up, matching `t0 = now() - period + 5s`.
            t0: Instant::now()
                .checked_sub(period)
                .unwrap_or_else(Instant::now)
                + Duration::from_secs(5),
            last_tried: (0..nb_instances).map(|_| None).collect(),
            responses: vec![Vec::new(); nb_instances],
            ledger: vec![None; nb_instances],
        }
    }

    fn create_random_quorum(&self) -> Arc<Set<AgentId>> {
        let size = crate::types::majority(self.acceptors.len());
        let chosen: Set<AgentId> = self
            .acceptors
            .choose_multiple(&mut rand::thread_rng(), size)
            .copied()
            .collect();
        Arc::new(chosen)
    }

    fn make_proposal(&self) -> Proposal {
        Proposal(self.id)
    }

    fn initiate_new_ballot(&mut self) {
        let quorum = self.create_random_quorum();
        log::info!("Agent #{} selected quorum {:?}", self.id, quorum);

        for i in 0..self.nb_instances {
            let number = match &self.last_tried[i] {
                None => BallotNumber { ballot_id: i as u64, agent_id: self.id },
                Some(ballot) => BallotNumber {
                    ballot_id: ballot.number.ballot_id + self.nb_instances as u64,
                    agent_id: self.id,
                },
            };

            self.last_tried[i] = Some(InFlightBallot {
                number,
                quorum: quorum.clone(),
                decree: None,
                voters: Set::new(),
            });
            self.responses[i].clear();

            for acceptor in quorum.iter() {
                self.transport.send(
                    *acceptor,
                    Message::NextBallot(NextBallot {
                        author_id: self.id,
                        ballot_number: number,
                    }),
                );
            }
        }
    }

    /// Locates the instance index whose in-flight ballot carries
    /// `number`, if any is still live (i.e. hasn't been superseded by
    /// a later `initiate_new_ballot`).
    fn find_instance(&self, number: BallotNumber) -> Option<usize> {
        self.last_tried
            .iter()
            .position(|b| matches!(b, Some(b) if b.number == number))
    }

    fn on_last_vote(&mut self, msg: LastVote) {
        let Some(i) = self.find_instance(msg.ballot_number) else {
            return; // abandoned ballot: dropped per §4.4
        };
        self.responses[i].push(msg.last_vote);

        let quorum_size = self.last_tried[i].as_ref().unwrap().quorum.len();
        if self.responses[i].len() != quorum_size {
            return;
        }

        let highest_vote = self.responses[i]
            .iter()
            .filter_map(|vote| vote.as_ref())
            .max_by_key(|vote| vote.number());
        let decree = match highest_vote {
            Some(vote) => vote.ballot.decree,
            None => self.make_proposal(),
        };

        let ballot = self.last_tried[i].as_mut().unwrap();
        ballot.decree = Some(decree);

        let wire_ballot = Ballot {
            number: ballot.number,
            decree,
            quorum: ballot.quorum.clone(),
        };
        for acceptor in wire_ballot.quorum.iter() {
            self.transport.send(
                *acceptor,
                Message::BeginBallot(BeginBallot {
                    author_id: self.id,
                    ballot: wire_ballot.clone(),
                }),
            );
        }
    }

    fn on_voted(&mut self, msg: Voted) {
        let Some(i) = self.find_instance(msg.vote.number()) else {
            return;
        };
        let ballot = self.last_tried[i].as_mut().unwrap();
        ballot.voters.insert(msg.vote.acceptor);

        if ballot.successful() {
            let decree = ballot
                .decree
                .expect("[INTERNAL ERROR]: a successful ballot always has a decree");
            let number = ballot.number;
            log::info!("Agent #{} decree {:?} accepted", self.id, decree);
            for agent in self.all_agents.iter() {
                self.transport.send(
                    *agent,
                    Message::Success(Success {
                        author_id: self.id,
                        decree,
                        ballot_number: number,
                    }),
                );
            }
            self.ledger[i] = Some(decree);
        }
    }

    fn on_success(&mut self, msg: Success) {
        let i = instance_of(msg.ballot_number, self.nb_instances);
        self.ledger[i] = Some(msg.decree);
    }
}

impl Agent for Proposer {
    fn id(&self) -> AgentId {
        self.id
    }

    fn role(&self) -> &'static str {
        "Proposer"
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
            Message::LastVote(m) => self.on_last_vote(m),
            Message::Voted(m) => self.on_voted(m),
            Message::Success(m) => self.on_success(m),
            // A proposer is never the target of NextBallot or BeginBallot.
            Message::NextBallot(_) | Message::BeginBallot(_) => {}
        }
    }

    fn on_tick(&mut self) {
        if self.t0.elapsed() >= self.period {
            self.t0 = Instant::now();
            self.initiate_new_ballot();
        }
    }

    fn reset(&mut self) {
        self.last_tried = (0..self.nb_instances).map(|_| None).collect();
        self.responses = vec![Vec::new(); self.nb_instances];
        self.t0 = Instant::now().checked_sub(self.period).unwrap_or_else(Instant::now)
            + Duration::from_secs(5);
        // `ledger` survives: learned decrees are durable.
    }

    fn ledger(&self) -> Vec<Option<Proposal>> {
        self.ledger.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ReliableTransport;

    fn setup(n_acceptors: usize) -> (Proposer, Arc<ReliableTransport>, Vec<AgentId>) {
        let transport = Arc::new(ReliableTransport::new());
        let acceptors: Vec<AgentId> = (1..=n_acceptors).collect();
        for a in &acceptors {
            transport.register(*a);
        }
        let all_agents = Arc::new({
            let mut v = acceptors.clone();
            v.push(0);
            v
        });
        let proposer = Proposer::new(
            0,
            transport.clone(),
            Arc::new(acceptors.clone()),
            all_agents,
            1,
            0.0,
            0.0,
            Duration::from_secs(60),
        );
        (proposer, transport, acceptors)
    }

    #[test]
    fn initiate_new_ballot_numbers_start_at_instance_index() {
        let (mut proposer, transport, acceptors) = setup(3);
        proposer.initiate_new_ballot();
        let expected_number = BallotNumber { ballot_id: 0, agent_id: 0 };
        let mut seen = 0;
        for a in &acceptors {
            if let Some(Message::NextBallot(m)) = transport.poll(*a) {
                assert_eq!(m.ballot_number, expected_number);
                seen += 1;
            }
        }
        assert_eq!(seen, crate::types::majority(3));
    }

    #[test]
    fn on_last_vote_drops_messages_for_abandoned_ballots() {
        let (mut proposer, _transport, _acceptors) = setup(3);
        proposer.initiate_new_ballot();
        let stale = BallotNumber { ballot_id: 99, agent_id: 0 };
        proposer.on_last_vote(LastVote {
            author_id: 1,
            ballot_number: stale,
            last_vote: None,
        });
        // No response recorded for the live instance.
        assert!(proposer.responses[0].is_empty());
    }

    #[test]
    fn b3_extends_the_highest_numbered_vote() {
        let (mut proposer, transport, acceptors) = setup(3);
        proposer.initiate_new_ballot();
        let number = proposer.last_tried[0].as_ref().unwrap().number;
        for a in &acceptors {
            transport.poll(*a);
        }

        let quorum = Arc::new(acceptors.iter().copied().collect::<Set<_>>());
        let old_ballot = Ballot {
            number: BallotNumber { ballot_id: 0, agent_id: 7 },
            decree: Proposal(7),
            quorum: quorum.clone(),
        };
        let newer_ballot = Ballot {
            number: BallotNumber { ballot_id: 1, agent_id: 8 },
            decree: Proposal(8),
            quorum,
        };

        proposer.on_last_vote(LastVote {
            author_id: acceptors[0],
            ballot_number: number,
            last_vote: Some(Vote { ballot: old_ballot, acceptor: acceptors[0] }),
        });
        proposer.on_last_vote(LastVote {
            author_id: acceptors[1],
            ballot_number: number,
            last_vote: Some(Vote { ballot: newer_ballot, acceptor: acceptors[1] }),
        });
        proposer.on_last_vote(LastVote {
            author_id: acceptors[2],
            ballot_number: number,
            last_vote: None,
        });

        assert_eq!(proposer.last_tried[0].as_ref().unwrap().decree, Some(Proposal(8)));
    }

    #[test]
    fn on_voted_is_idempotent_and_broadcasts_success_once_majority_reached() {
        let (mut proposer, transport, acceptors) = setup(3);
        proposer.initiate_new_ballot();
        let number = proposer.last_tried[0].as_ref().unwrap().number;
        for a in &acceptors {
            transport.poll(*a);
        }
        let quorum = proposer.last_tried[0].as_ref().unwrap().quorum.clone();
        proposer.last_tried[0].as_mut().unwrap().decree = Some(Proposal(0));

        let vote = |acceptor: AgentId| Vote {
            ballot: Ballot { number, decree: Proposal(0), quorum: quorum.clone() },
            acceptor,
        };

        proposer.on_voted(Voted { author_id: acceptors[0], vote: vote(acceptors[0]) });
        proposer.on_voted(Voted { author_id: acceptors[0], vote: vote(acceptors[0]) }); // duplicate
        assert!(proposer.ledger[0].is_none());

        proposer.on_voted(Voted { author_id: acceptors[1], vote: vote(acceptors[1]) });
        assert_eq!(proposer.ledger[0], Some(Proposal(0)));
    }
}
