//! Batch-level coordination.
//!
//! - [`coordinator`] - splits a [`Batch`](crate::types::Batch) across a worker
//!   pool and aggregates the outcome.

pub mod coordinator;
