//! Randomized safety/liveness property from the testable-properties
//! section: for any reasonably small, reasonably reliable cohort,
//! `Assembly::start()` must terminate and must not panic (a panic from
//! `collect_unique_ledger` is this crate's signal for a safety
//! violation — see `assembly.rs`).

use std::sync::Arc;
use std::time::Duration;

use paxos_sim::{AssemblyConfig, UnreliableTransport};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn random_cohorts_terminate_safely(
        n_proposers in 1usize..=5,
        n_acceptors in 1usize..=9,
        failure_rate in 0.0f64..=0.1,
        max_delay_secs in 0.0f64..=1.0,
    ) {
        let transport = Arc::new(UnreliableTransport::new(
            failure_rate,
            Duration::from_secs_f64(max_delay_secs),
        ));
        let assembly = AssemblyConfig::new(n_proposers, n_acceptors)
            .with_period(Duration::from_secs(1))
            .build(transport)
            .expect("valid configuration");

        // `start()` only returns once every agent has converged on the
        // same decree; a safety violation panics instead of returning.
        let decrees = assembly.start();
        prop_assert_eq!(decrees.len(), 1);
    }
}
