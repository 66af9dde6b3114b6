//! End-to-end scenarios 3 and 4: message loss and delay.

use std::sync::Arc;
use std::time::Duration;

use paxos_sim::{AssemblyConfig, Proposal, UnreliableTransport};

#[test]
fn lossy_transport_still_reaches_a_single_decree() {
    let transport = Arc::new(UnreliableTransport::new(0.10, Duration::ZERO));
    let assembly = AssemblyConfig::new(1, 5)
        .with_period(Duration::from_secs(1))
        .build(transport)
        .expect("valid configuration");

    let proposer_ids = assembly.proposer_ids().to_vec();
    let decrees = assembly.start();

    assert_eq!(decrees, vec![Proposal(proposer_ids[0])]);
}

#[test]
fn delayed_transport_still_reaches_a_single_decree() {
    let transport = Arc::new(UnreliableTransport::new(0.05, Duration::from_secs(1)));
    let assembly = AssemblyConfig::new(2, 5)
        .with_period(Duration::from_secs(10))
        .build(transport)
        .expect("valid configuration");

    let proposer_ids = assembly.proposer_ids().to_vec();
    let decrees = assembly.start();

    assert_eq!(decrees.len(), 1);
    assert!(proposer_ids.iter().any(|&id| decrees[0] == Proposal(id)));
}
