//! # Summary
//!
//! This module defines `AssemblyConfig`, a builder that captures the
//! language-neutral `Assembly::new(n_proposers, n_acceptors, transport,
//! proposer_fail_rate?, acceptor_fail_rate?, period_proposer?,
//! nb_instances?)` constructor from §6 of the specification, and
//! validates it into an `Assembly` (or a `ConfigError`, for the one
//! class of caller mistake the core treats as recoverable).

use std::sync::Arc;
use std::time::Duration;

use crate::assembly::Assembly;
use crate::error::ConfigError;
use crate::transport::Transport;

/// Default ballot-initiation period from the reference simulator.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

/// Default mean crash-sleep duration.
pub const DEFAULT_AVG_FAILURE_DURATION: f64 = 5.0;

/// Builds an `Assembly`. Every knob beyond `n_proposers`/`n_acceptors`
/// has a default matching the reference simulator's.
#[derive(Clone, Debug)]
pub struct AssemblyConfig {
    n_proposers: usize,
    n_acceptors: usize,
    proposer_fail_rate: f64,
    acceptor_fail_rate: f64,
    avg_failure_duration: f64,
    period_proposer: Duration,
    nb_instances: usize,
}

impl AssemblyConfig {
    /// Starts a config for `n_proposers` proposers and `n_acceptors`
    /// acceptors, with no injected failures, a 60s ballot period and a
    /// single (basic Paxos) instance.
    pub fn new(n_proposers: usize, n_acceptors: usize) -> Self {
        AssemblyConfig {
            n_proposers,
            n_acceptors,
            proposer_fail_rate: 0.0,
            acceptor_fail_rate: 0.0,
            avg_failure_duration: DEFAULT_AVG_FAILURE_DURATION,
            period_proposer: DEFAULT_PERIOD,
            nb_instances: 1,
        }
    }

    pub fn with_proposer_fail_rate(mut self, rate: f64) -> Self {
        self.proposer_fail_rate = rate;
        self
    }

    pub fn with_acceptor_fail_rate(mut self, rate: f64) -> Self {
        self.acceptor_fail_rate = rate;
        self
    }

    pub fn with_avg_failure_duration(mut self, duration: f64) -> Self {
        self.avg_failure_duration = duration;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period_proposer = period;
        self
    }

    /// Sets the number of parallel Multi-Paxos instances. `1` (the
    /// default) is basic Paxos.
    pub fn with_instances(mut self, nb_instances: usize) -> Self {
        self.nb_instances = nb_instances;
        self
    }

    /// Validates this configuration and wires up an `Assembly` over
    /// `transport`.
    pub fn build<T: Transport>(self, transport: Arc<T>) -> Result<Assembly, ConfigError> {
        if self.n_proposers == 0 {
            return Err(ConfigError::NoProposers);
        }
        if self.n_acceptors == 0 {
            return Err(ConfigError::NoAcceptors);
        }
        if self.nb_instances == 0 {
            return Err(ConfigError::ZeroInstances(self.nb_instances));
        }
        for rate in [self.proposer_fail_rate, self.acceptor_fail_rate] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidFailureRate(rate));
            }
        }

        Ok(Assembly::new(transport, self))
    }

    pub(crate) fn n_proposers(&self) -> usize {
        self.n_proposers
    }

    pub(crate) fn n_acceptors(&self) -> usize {
        self.n_acceptors
    }

    pub(crate) fn proposer_fail_rate(&self) -> f64 {
        self.proposer_fail_rate
    }

    pub(crate) fn acceptor_fail_rate(&self) -> f64 {
        self.acceptor_fail_rate
    }

    pub(crate) fn avg_failure_duration(&self) -> f64 {
        self.avg_failure_duration
    }

    pub(crate) fn period_proposer(&self) -> Duration {
        self.period_proposer
    }

    pub(crate) fn nb_instances(&self) -> usize {
        self.nb_instances
    }
}
