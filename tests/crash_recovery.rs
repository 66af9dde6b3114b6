//! End-to-end scenario 5: a proposer that can crash and restart mid-run
//! must not prevent the assembly from reaching a decree.

use std::sync::Arc;
use std::time::Duration;

use paxos_sim::{AssemblyConfig, Proposal, ReliableTransport};

#[test]
fn crashing_proposer_does_not_prevent_agreement() {
    let transport = Arc::new(ReliableTransport::new());
    let assembly = AssemblyConfig::new(2, 5)
        .with_proposer_fail_rate(1e-7)
        .with_period(Duration::from_secs(10))
        .build(transport)
        .expect("valid configuration");

    let proposer_ids = assembly.proposer_ids().to_vec();
    let decrees = assembly.start();

    assert_eq!(decrees.len(), 1);
    assert!(proposer_ids.iter().any(|&id| decrees[0] == Proposal(id)));
}
