//! # Summary
//!
//! This module defines the `Agent` trait shared by `Proposer` and
//! `Acceptor`, and the main loop driver every agent thread runs:
//! poll the transport for one message, dispatch it, give proposers a
//! chance to start a new ballot, and roll the dice on a simulated
//! crash. A crash sleeps for an exponentially-distributed duration and
//! then re-enters the loop with in-RAM protocol state reset; the
//! agent's `ledger` is the one thing that survives, because learned
//! facts are durable in this model even though nothing else is.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::message::Message;
use crate::types::{AgentId, Proposal};

/// Common behavior of a Paxos participant thread.
pub trait Agent {
    /// This agent's unique id.
    fn id(&self) -> AgentId;

    /// A short name for log lines, e.g. "Proposer" or "Acceptor".
    fn role(&self) -> &'static str;

    /// Rate at which this agent simulates a crash on each loop
    /// iteration, in `[0, 1]`.
    fn failure_rate(&self) -> f64;

    /// Mean duration, in seconds, of a simulated crash sleep.
    fn avg_failure_duration(&self) -> f64;

    /// Polls this agent's mailbox for the next message, if any.
    fn poll(&self) -> Option<Message>;

    /// Handles one message.
    fn dispatch(&mut self, message: Message);

    /// Called once per loop iteration after the poll/dispatch step.
    /// Proposers use this to check whether it's time to start a new
    /// ballot; acceptors have nothing to do here.
    fn on_tick(&mut self) {}

    /// Clears all in-RAM protocol state as if this agent had just
    /// crashed and restarted. Must NOT touch the learned ledger.
    fn reset(&mut self);

    /// A snapshot of the decrees learned so far, one slot per
    /// instance, in instance order.
    fn ledger(&self) -> Vec<Option<Proposal>>;
}

/// Draws a crash-sleep duration from `Exp(1) * avg_failure_duration`,
/// matching `numpy.random.exponential(avg_failure_duration)`.
fn sample_crash_duration(avg_failure_duration: f64) -> Duration {
    let sample: f64 = Exp::new(1.0)
        .expect("[INTERNAL ERROR]: rate 1.0 is a valid exponential parameter")
        .sample(&mut rand::thread_rng());
    Duration::from_secs_f64((avg_failure_duration * sample).max(0.0))
}

/// Runs `agent`'s main loop until `stop` is observed. Used as the body
/// of every agent's worker thread.
pub fn run<A: Agent>(mut agent: A, stop: Arc<AtomicBool>) {
    log::info!("Agent #{} started ({})", agent.id(), agent.role());
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        if let Some(message) = agent.poll() {
            log::debug!(
                "Agent #{} received a {} message from agent #{}",
                agent.id(),
                message.kind(),
                message.author_id(),
            );
            agent.dispatch(message);
        }

        agent.on_tick();

        let roll: f64 = rand::thread_rng().gen();
        if roll < agent.failure_rate() {
            log::warn!("Agent #{} failed ({})", agent.id(), agent.role());
            thread::sleep(sample_crash_duration(agent.avg_failure_duration()));
            agent.reset();
        }

        // A small yield keeps the busy-poll from pegging a core while
        // not altering the correctness of the protocol.
        thread::yield_now();
    }
}
