//! # Summary
//!
//! This module defines `Assembly`, which wires a transport together
//! with a cohort of proposers and acceptors, spawns one worker thread
//! per agent (plus one for the transport's delivery pump, if it has
//! one), busy-polls a termination predicate, and stops everything once
//! every agent has learned every instance's decree.
//!
//! `Assembly` also owns agent-id allocation (§9's Design Notes replace
//! the reference simulator's process-global counter with an allocator
//! scoped to the assembly that constructs the agents).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hashbrown::HashSet as Set;
use parking_lot::RwLock;

use crate::acceptor::Acceptor;
use crate::agent::{self, Agent};
use crate::config::AssemblyConfig;
use crate::proposer::Proposer;
use crate::transport::Transport;
use crate::types::{AgentId, Proposal};

type Ledger = Arc<RwLock<Vec<Option<Proposal>>>>;

/// A full cohort (proposers + acceptors) plus the transport they share,
/// runnable as a unit via `start`.
pub struct Assembly {
    transport: Arc<dyn Transport>,
    proposer_ids: Vec<AgentId>,
    acceptor_ids: Vec<AgentId>,
    nb_instances: usize,
    ledgers: Vec<(AgentId, Ledger)>,
    handles: Vec<Box<dyn FnOnce(Arc<AtomicBool>) -> JoinHandle<()> + Send>>,
}

impl std::fmt::Debug for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembly")
            .field("proposer_ids", &self.proposer_ids)
            .field("acceptor_ids", &self.acceptor_ids)
            .field("nb_instances", &self.nb_instances)
            .finish_non_exhaustive()
    }
}

impl Assembly {
    pub(crate) fn new<T: Transport>(transport: Arc<T>, config: AssemblyConfig) -> Self {
        let transport: Arc<dyn Transport> = transport;
        let mut next_id: AgentId = 0;
        let mut alloc = move || {
            let id = next_id;
            next_id += 1;
            id
        };

        let acceptor_ids: Vec<AgentId> = (0..config.n_acceptors()).map(|_| alloc()).collect();
        let proposer_ids: Vec<AgentId> = (0..config.n_proposers()).map(|_| alloc()).collect();

        let mut all_agents: Vec<AgentId> = acceptor_ids.clone();
        all_agents.extend(proposer_ids.iter().copied());
        let all_agents = Arc::new(all_agents);
        let acceptors = Arc::new(acceptor_ids.clone());

        let mut ledgers = Vec::new();
        let mut handles: Vec<Box<dyn FnOnce(Arc<AtomicBool>) -> JoinHandle<()> + Send>> = Vec::new();

        for id in acceptor_ids.iter().copied() {
            let ledger: Ledger = Arc::new(RwLock::new(vec![None; config.nb_instances()]));
            ledgers.push((id, ledger.clone()));
            let transport = Arc::clone(&transport);
            let nb_instances = config.nb_instances();
            let failure_rate = config.acceptor_fail_rate();
            let avg_failure_duration = config.avg_failure_duration();
            handles.push(Box::new(move |stop| {
                thread::Builder::new()
                    .name(format!("acceptor-{id}"))
                    .spawn(move || {
                        let acceptor = Acceptor::new(id, transport, nb_instances, failure_rate, avg_failure_duration);
                        run_with_ledger(acceptor, stop, ledger);
                    })
                    .expect("[INTERNAL ERROR]: failed to spawn acceptor thread")
            }));
        }

        for id in proposer_ids.iter().copied() {
            let ledger: Ledger = Arc::new(RwLock::new(vec![None; config.nb_instances()]));
            ledgers.push((id, ledger.clone()));
            let transport = Arc::clone(&transport);
            let acceptors = Arc::clone(&acceptors);
            let all_agents = Arc::clone(&all_agents);
            let nb_instances = config.nb_instances();
            let failure_rate = config.proposer_fail_rate();
            let avg_failure_duration = config.avg_failure_duration();
            let period = config.period_proposer();
            handles.push(Box::new(move |stop| {
                thread::Builder::new()
                    .name(format!("proposer-{id}"))
                    .spawn(move || {
                        let proposer = Proposer::new(
                            id,
                            transport,
                            acceptors,
                            all_agents,
                            nb_instances,
                            failure_rate,
                            avg_failure_duration,
                            period,
                        );
                        run_with_ledger(proposer, stop, ledger);
                    })
                    .expect("[INTERNAL ERROR]: failed to spawn proposer thread")
            }));
        }

        Assembly {
            transport,
            proposer_ids,
            acceptor_ids,
            nb_instances: config.nb_instances(),
            ledgers,
            handles,
        }
    }

    /// Runs the assembly to completion: spawns the transport pump (if
    /// any) and every agent thread, busy-polls until every agent has
    /// learned every instance, signals a stop, joins every worker, and
    /// returns the agreed decree vector.
    ///
    /// # Panics
    ///
    /// Panics if two agents end up with different ledgers for the same
    /// instance — the visible signal that the protocol implementation
    /// violated safety (§7).
    pub fn start(mut self) -> Vec<Proposal> {
        let stop = Arc::new(AtomicBool::new(false));
        let mut join_handles = Vec::new();

        if self.transport.has_pump() {
            let transport = Arc::clone(&self.transport);
            let stop = Arc::clone(&stop);
            join_handles.push(
                thread::Builder::new()
                    .name("transport-pump".to_string())
                    .spawn(move || transport.run_pump(stop))
                    .expect("[INTERNAL ERROR]: failed to spawn transport pump thread"),
            );
        }

        for spawn in std::mem::take(&mut self.handles) {
            join_handles.push(spawn(Arc::clone(&stop)));
        }

        while !self.all_agents_learned_everything() {
            thread::sleep(Duration::from_millis(1));
        }

        stop.store(true, Ordering::Relaxed);
        for handle in join_handles {
            let _ = handle.join();
        }

        self.collect_unique_ledger()
    }

    fn all_agents_learned_everything(&self) -> bool {
        self.ledgers
            .iter()
            .all(|(_, ledger)| ledger.read().iter().all(Option::is_some))
    }

    fn collect_unique_ledger(&self) -> Vec<Proposal> {
        let distinct: Set<Vec<Proposal>> = self
            .ledgers
            .iter()
            .map(|(_, ledger)| {
                ledger
                    .read()
                    .iter()
                    .map(|slot| slot.expect("[INTERNAL ERROR]: checked by all_agents_learned_everything"))
                    .collect::<Vec<_>>()
            })
            .collect();

        assert_eq!(
            distinct.len(),
            1,
            "safety violation: more than one decree vector was accepted by a majority of voters: {distinct:?}",
        );
        distinct.into_iter().next().expect("[INTERNAL ERROR]: non-empty assembly")
    }

    pub fn proposer_ids(&self) -> &[AgentId] {
        &self.proposer_ids
    }

    pub fn acceptor_ids(&self) -> &[AgentId] {
        &self.acceptor_ids
    }

    pub fn nb_instances(&self) -> usize {
        self.nb_instances
    }
}

/// Runs `agent`'s main loop, publishing its ledger into `ledger` after
/// every dispatch so the assembly's termination predicate can observe
/// progress without joining the thread first.
fn run_with_ledger<A: Agent>(agent: A, stop: Arc<AtomicBool>, ledger: Ledger) {
    struct Published<A: Agent> {
        inner: A,
        ledger: Ledger,
    }

    impl<A: Agent> Agent for Published<A> {
        fn id(&self) -> AgentId {
            self.inner.id()
        }
        fn role(&self) -> &'static str {
            self.inner.role()
        }
        fn failure_rate(&self) -> f64 {
            self.inner.failure_rate()
        }
        fn avg_failure_duration(&self) -> f64 {
            self.inner.avg_failure_duration()
        }
        fn poll(&self) -> Option<crate::message::Message> {
            self.inner.poll()
        }
        fn dispatch(&mut self, message: crate::message::Message) {
            self.inner.dispatch(message);
            *self.ledger.write() = self.inner.ledger();
        }
        fn on_tick(&mut self) {
            self.inner.on_tick();
            *self.ledger.write() = self.inner.ledger();
        }
        fn reset(&mut self) {
            self.inner.reset();
            *self.ledger.write() = self.inner.ledger();
        }
        fn ledger(&self) -> Vec<Option<Proposal>> {
            self.inner.ledger()
        }
    }

    agent::run(Published { inner: agent, ledger }, stop);
}
