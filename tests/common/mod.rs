//! Integration test common infrastructure.
//!
//! Provides recording mock collaborators and a test client that drives a
//! [`tkellem::Connection`] over an in-memory duplex stream.

pub mod client;
pub mod mocks;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use mocks::{MockBackend, MockBacklog, MockRegistry};

/// Install a test-friendly tracing subscriber once per test binary.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
