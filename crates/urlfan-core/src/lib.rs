#![doc = include_str!("../README.md")]

mod common;
pub mod fanout;
pub mod fetcher;
pub mod gate;
pub mod pool;

pub use common::*;
pub use fanout::coordinator::FanOut;
pub use fetcher::{Fetch, HttpFetcher};
pub use gate::{AdmissionGate, AdmissionPermit, MAX_GATE_CAPACITY};
// Re-exported so callers can build scopes without naming `tokio-util`
// directly.
pub use tokio_util::sync::CancellationToken;
