//! Runs Multi-Paxos (three parallel instances) over an unreliable
//! transport with modest loss, and prints the agreed decree vector.
//!
//! ```text
//! RUST_LOG=info cargo run --example multi_paxos
//! ```

use std::sync::Arc;
use std::time::Duration;

use paxos_sim::{AssemblyConfig, UnreliableTransport};

fn main() {
    env_logger::init();

    let transport = Arc::new(UnreliableTransport::new(0.05, Duration::from_millis(0)));
    let assembly = AssemblyConfig::new(3, 5)
        .with_instances(3)
        .with_period(Duration::from_secs(2))
        .build(transport)
        .expect("valid configuration");

    let decrees = assembly.start();
    println!("agreed decrees: {:?}", decrees);
}
