//! # Summary
//!
//! This module abstracts over message delivery between agents.
//!
//! `ReliableTransport` delivers every sent message instantly and in
//! FIFO order, with no loss. `UnreliableTransport` drops messages with
//! probability `failure_rate` and, for everything that survives,
//! schedules delivery after a random delay drawn from
//! `min(max_delay, max_delay * Exp(1) / 2)` — mirroring the reference
//! simulator's `numpy.random.exponential()` delay model, reimplemented
//! here on top of `rand_distr::Exp`.
//!
//! Mailboxes and pending-delivery queues are owned by the transport,
//! never by an agent; callers only ever touch their own mailbox
//! through `poll`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hashbrown::HashMap as Map;
use parking_lot::Mutex;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::message::Message;
use crate::types::AgentId;

/// A transport agents use to exchange `Message`s.
///
/// `register`, `send` and `poll` must be safe to call concurrently
/// from many threads; each agent only ever calls them with its own
/// `AgentId` as sender or destination.
pub trait Transport: Send + Sync + 'static {
    /// Registers a new agent so that any other agent can send it
    /// messages. Idempotent.
    fn register(&self, agent_id: AgentId);

    /// Sends a message to `dest`. No delivery guarantee: the
    /// implementation may drop, delay or reorder it.
    fn send(&self, dest: AgentId, message: Message);

    /// Non-blocking: returns the oldest undelivered message addressed
    /// to `dest`, or `None` if its mailbox is empty.
    fn poll(&self, dest: AgentId) -> Option<Message>;

    /// Whether this transport needs a dedicated worker thread to drive
    /// background delivery (e.g. `UnreliableTransport`'s delay pump).
    fn has_pump(&self) -> bool {
        false
    }

    /// Runs the background pump until `stop` is set. No-op for
    /// transports that don't report `has_pump`.
    fn run_pump(self: Arc<Self>, _stop: Arc<AtomicBool>) {}
}

#[derive(Default)]
struct Mailboxes {
    boxes: Map<AgentId, VecDeque<Message>>,
}

impl Mailboxes {
    fn register(&mut self, agent_id: AgentId) {
        self.boxes.entry(agent_id).or_default();
    }

    fn push(&mut self, dest: AgentId, message: Message) {
        if let Some(box_) = self.boxes.get_mut(&dest) {
            box_.push_back(message);
        }
    }

    fn pop(&mut self, dest: AgentId) -> Option<Message> {
        self.boxes.get_mut(&dest)?.pop_front()
    }
}

/// Delivers every send immediately, in order, with no loss. Sends to
/// an unregistered destination are silently dropped.
#[derive(Default)]
pub struct ReliableTransport {
    mailboxes: Mutex<Mailboxes>,
}

impl ReliableTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReliableTransport {
    fn register(&self, agent_id: AgentId) {
        self.mailboxes.lock().register(agent_id);
    }

    fn send(&self, dest: AgentId, message: Message) {
        self.mailboxes.lock().push(dest, message);
    }

    fn poll(&self, dest: AgentId) -> Option<Message> {
        self.mailboxes.lock().pop(dest)
    }
}

/// Delivers sends unreliably: drops a fraction `failure_rate` of
/// messages outright, and delays the rest by up to `max_delay` before
/// they land in the recipient's mailbox.
pub struct UnreliableTransport {
    mailboxes: Mutex<Mailboxes>,
    pending: Mutex<Vec<(AgentId, Message)>>,
    failure_rate: f64,
    max_delay: Duration,
}

impl UnreliableTransport {
    /// `failure_rate` is clamped into `[0, 1]`; `max_delay` of zero
    /// means every surviving message is delivered essentially at once
    /// (on its own short-lived delivery thread).
    pub fn new(failure_rate: f64, max_delay: Duration) -> Self {
        UnreliableTransport {
            mailboxes: Mutex::new(Mailboxes::default()),
            pending: Mutex::new(Vec::new()),
            failure_rate: failure_rate.clamp(0.0, 1.0),
            max_delay,
        }
    }

    fn sample_delay(max_delay: Duration) -> Duration {
        if max_delay.is_zero() {
            return Duration::ZERO;
        }
        let sample: f64 = Exp::new(1.0)
            .expect("[INTERNAL ERROR]: rate 1.0 is a valid exponential parameter")
            .sample(&mut rand::thread_rng());
        let secs = max_delay.as_secs_f64();
        Duration::from_secs_f64(secs.min(secs * sample / 2.0))
    }
}

impl Transport for UnreliableTransport {
    fn register(&self, agent_id: AgentId) {
        self.mailboxes.lock().register(agent_id);
    }

    fn send(&self, dest: AgentId, message: Message) {
        let roll: f64 = rand::thread_rng().gen();
        if roll < self.failure_rate {
            log::warn!(
                "Agent #{} failed to message agent #{dest}",
                message.author_id()
            );
            return;
        }
        self.pending.lock().push((dest, message));
    }

    fn poll(&self, dest: AgentId) -> Option<Message> {
        self.mailboxes.lock().pop(dest)
    }

    fn has_pump(&self) -> bool {
        true
    }

    fn run_pump(self: Arc<Self>, stop: Arc<AtomicBool>) {
        while !stop.load(Ordering::Relaxed) {
            // Drain whatever is pending under the lock, then hand each
            // message to its own delivery thread so no lock is held
            // across the random delay.
            let batch: Vec<(AgentId, Message)> = std::mem::take(&mut *self.pending.lock());
            for (dest, message) in batch {
                let transport = Arc::clone(&self);
                let max_delay = self.max_delay;
                thread::spawn(move || {
                    thread::sleep(UnreliableTransport::sample_delay(max_delay));
                    // If `dest` was never registered, or its mailbox
                    // was cleared by a crash-restart in the meantime,
                    // this is a silent no-op.
                    transport.mailboxes.lock().push(dest, message);
                });
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NextBallot;
    use crate::types::BallotNumber;

    fn sample_message() -> Message {
        Message::NextBallot(NextBallot {
            author_id: 0,
            ballot_number: BallotNumber { ballot_id: 0, agent_id: 0 },
        })
    }

    #[test]
    fn reliable_transport_delivers_fifo() {
        let transport = ReliableTransport::new();
        transport.register(1);
        for i in 0..3 {
            transport.send(1, Message::NextBallot(NextBallot {
                author_id: i,
                ballot_number: BallotNumber { ballot_id: i as u64, agent_id: i },
            }));
        }
        for i in 0..3 {
            match transport.poll(1) {
                Some(Message::NextBallot(m)) => assert_eq!(m.author_id, i),
                other => panic!("unexpected message: {other:?}"),
            }
        }
        assert!(transport.poll(1).is_none());
    }

    #[test]
    fn reliable_transport_drops_sends_to_unregistered_destination() {
        let transport = ReliableTransport::new();
        transport.send(42, sample_message());
        assert!(transport.poll(42).is_none());
    }

    #[test]
    fn unreliable_transport_always_drops_at_failure_rate_one() {
        let transport = UnreliableTransport::new(1.0, Duration::ZERO);
        transport.register(1);
        transport.send(1, sample_message());
        let stop = Arc::new(AtomicBool::new(false));
        stop.store(true, Ordering::Relaxed);
        // Pump never needs to run: the message never entered `pending`.
        assert!(transport.pending.lock().is_empty());
        assert!(transport.poll(1).is_none());
    }

    #[test]
    fn unreliable_transport_clamps_failure_rate() {
        let transport = UnreliableTransport::new(5.0, Duration::ZERO);
        assert_eq!(transport.failure_rate, 1.0);
        let transport = UnreliableTransport::new(-5.0, Duration::ZERO);
        assert_eq!(transport.failure_rate, 0.0);
    }

    #[test]
    fn sample_delay_never_exceeds_max() {
        for _ in 0..1000 {
            let d = UnreliableTransport::sample_delay(Duration::from_millis(50));
            assert!(d <= Duration::from_millis(50));
        }
    }
}
