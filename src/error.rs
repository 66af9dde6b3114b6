//! # Summary
//!
//! Construction-time validation errors for `AssemblyConfig::build`.
//!
//! These are the one place the core returns a `Result`: a
//! misconfigured cohort (no acceptors, no proposers, zero instances,
//! an out-of-range failure rate) is caller error discoverable before
//! any agent thread runs, not a runtime protocol event. A protocol
//! safety violation, by contrast, is raised as a panic from
//! `Assembly::start` — see the crate-level docs.

/// Why an `AssemblyConfig` could not be turned into an `Assembly`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("assembly requires at least one proposer")]
    NoProposers,

    #[error("assembly requires at least one acceptor")]
    NoAcceptors,

    #[error("nb_instances must be at least 1, got {0}")]
    ZeroInstances(usize),

    #[error("failure rate must lie within [0, 1], got {0}")]
    InvalidFailureRate(f64),
}
