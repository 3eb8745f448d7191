//! Spawning and joining the workers of one batch.
//!
//! A [`WorkerPool`] is created per batch with a fixed size. [`WorkerPool::run`]
//! starts that many [`worker_loop`] tasks in a [`JoinSet`] and returns only once
//! every one of them has finished. Because the tasks live in the `JoinSet`,
//! dropping the `run` future aborts any worker still running, so no fetch
//! outlives the caller.

use super::{FirstErrorSlot, JobQueue, ResultSink, worker::worker_loop};
use crate::{Error, fetcher::Fetch};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A fixed number of fetch workers sharing one fetcher.
pub struct WorkerPool<F> {
    fetcher: Arc<F>,
    size: usize,
}

impl<F> WorkerPool<F>
where
    F: Fetch + 'static,
{
    pub const fn new(fetcher: Arc<F>, size: usize) -> Self {
        Self { fetcher, size }
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    /// Runs the workers against `jobs` until the queue is drained or `scope`
    /// is cancelled, then joins them.
    ///
    /// A worker that panics is reported through `first_error` like any other
    /// failure.
    pub async fn run(
        &self,
        scope: &CancellationToken,
        jobs: JobQueue,
        results: ResultSink,
        first_error: &Arc<FirstErrorSlot>,
    ) {
        let mut workers = JoinSet::new();

        for worker_id in 0..self.size {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&self.fetcher),
                scope.clone(),
                jobs.clone(),
                results.clone(),
                Arc::clone(first_error),
            ));
        }

        // Only the workers hold the queue and sink from here on.
        drop(jobs);
        drop(results);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker terminated abnormally: {e}");
                first_error.try_claim(Error::Worker {
                    context: e.to_string(),
                });
            }
        }
    }
}
