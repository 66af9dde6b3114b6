//! # Summary
//!
//! `paxos-sim` is a simulator and reference implementation of
//! Lamport's Paxos consensus protocol, in both its basic (single
//! decree) and Multi-Paxos (vectorized, multi-instance) forms, running
//! over an in-process transport with injectable message loss, delay,
//! and agent crash/restart.
//!
//! Each proposer and acceptor runs on its own OS thread (see
//! [`agent::run`]); threads never share mutable protocol state —
//! everything crosses thread boundaries as a [`message::Message`] over
//! a [`transport::Transport`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paxos_sim::{AssemblyConfig, ReliableTransport};
//!
//! let transport = Arc::new(ReliableTransport::new());
//! let assembly = AssemblyConfig::new(2, 3)
//!     .build(transport)
//!     .expect("valid configuration");
//! let decrees = assembly.start();
//! println!("agreed decree: {:?}", decrees[0]);
//! ```
//!
//! # Safety vs. configuration errors
//!
//! A misconfigured cohort (zero proposers, zero acceptors, an
//! out-of-range failure rate) is rejected by
//! [`AssemblyConfig::build`] with a [`ConfigError`] before any agent
//! thread runs. A protocol *safety* violation — two agents converging
//! on different decrees for the same instance, which would mean this
//! implementation has a bug — is instead raised as a panic from
//! [`Assembly::start`], since it is never a condition a caller can
//! recover from or configure around.

mod acceptor;
mod agent;
mod assembly;
mod config;
mod error;
mod message;
mod proposer;
mod transport;
mod types;

pub use assembly::Assembly;
pub use config::{AssemblyConfig, DEFAULT_AVG_FAILURE_DURATION, DEFAULT_PERIOD};
pub use error::ConfigError;
pub use message::Message;
pub use transport::{ReliableTransport, Transport, UnreliableTransport};
pub use types::{AgentId, Ballot, BallotNumber, Proposal, Vote};
