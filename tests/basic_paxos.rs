//! End-to-end scenarios 1 and 2: basic Paxos over a reliable transport.

use std::sync::Arc;
use std::time::Duration;

use paxos_sim::{AssemblyConfig, Proposal, ReliableTransport};

#[test]
fn trivial_agreement_reliable_transport() {
    let transport = Arc::new(ReliableTransport::new());
    let assembly = AssemblyConfig::new(1, 3)
        .with_period(Duration::from_secs(1))
        .build(transport)
        .expect("valid configuration");

    let proposer_ids = assembly.proposer_ids().to_vec();
    assert_eq!(proposer_ids.len(), 1);

    let decrees = assembly.start();
    assert_eq!(decrees, vec![Proposal(proposer_ids[0])]);
}

#[test]
fn two_competing_proposers_reliable_transport() {
    let transport = Arc::new(ReliableTransport::new());
    let assembly = AssemblyConfig::new(2, 5)
        .with_period(Duration::from_secs(1))
        .build(transport)
        .expect("valid configuration");

    let proposer_ids = assembly.proposer_ids().to_vec();
    let decrees = assembly.start();

    assert_eq!(decrees.len(), 1);
    assert!(
        proposer_ids.iter().any(|&id| decrees[0] == Proposal(id)),
        "decree {:?} was not proposed by either competing proposer {proposer_ids:?}",
        decrees[0],
    );
}
