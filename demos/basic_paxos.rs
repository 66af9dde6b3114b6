//! Runs a single instance of basic Paxos over a reliable transport and
//! prints the agreed decree.
//!
//! ```text
//! RUST_LOG=info cargo run --example basic_paxos
//! ```

use std::sync::Arc;

use paxos_sim::{AssemblyConfig, ReliableTransport};

fn main() {
    env_logger::init();

    let transport = Arc::new(ReliableTransport::new());
    let assembly = AssemblyConfig::new(2, 5)
        .with_period(std::time::Duration::from_secs(1))
        .build(transport)
        .expect("valid configuration");

    let decrees = assembly.start();
    println!("agreed decree: {:?}", decrees[0]);
}
