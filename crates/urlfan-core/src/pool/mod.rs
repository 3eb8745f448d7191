//! Fixed-size worker pool that drains one batch's job queue.
//!
//! ## Structure
//!
//! - [`queue`] - closed, pre-seeded multi-consumer job queue.
//! - [`slot`] - single-winner holder for a batch's first error.
//! - [`worker`] - the per-worker fetch loop.
//! - [`manager`] - spawns the workers and joins them.

pub mod manager;
pub mod queue;
pub mod slot;
pub mod worker;

pub use manager::WorkerPool;
pub use queue::JobQueue;
pub use slot::FirstErrorSlot;

/// One successfully fetched `(url, content)` pair.
pub type ResultEntry = (String, String);

/// Write half of the result buffer shared by a batch's workers.
pub type ResultSink = tokio::sync::mpsc::Sender<ResultEntry>;
