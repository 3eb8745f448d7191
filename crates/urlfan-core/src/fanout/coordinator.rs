use crate::{
    Error, Result,
    fetcher::Fetch,
    pool::{FirstErrorSlot, JobQueue, WorkerPool},
    types::{Batch, FetchedContent},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Fans a [`Batch`] out across a bounded worker pool and aggregates the
/// results all-or-nothing.
///
/// The coordinator owns nothing per batch: every call to [`FanOut::fan_out`]
/// builds its own scope, queue, result buffer and error slot, so one instance
/// is shared by all concurrent requests.
pub struct FanOut<F> {
    fetcher: Arc<F>,
    num_workers: usize,
}

impl<F> FanOut<F>
where
    F: Fetch + 'static,
{
    /// Creates a coordinator running at most `num_workers` fetches per batch.
    pub fn new(fetcher: F, num_workers: usize) -> Self {
        Self::with_shared(Arc::new(fetcher), num_workers)
    }

    /// Like [`FanOut::new`], for a fetcher that is already shared.
    pub fn with_shared(fetcher: Arc<F>, num_workers: usize) -> Self {
        Self {
            fetcher,
            num_workers: num_workers.max(1),
        }
    }

    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Fetches every URL in `batch` and returns the URL → body mapping.
    ///
    /// Work runs under a child of `caller_scope`. The child is cancelled as
    /// soon as one fetch fails, and unconditionally when this call returns or
    /// its future is dropped, so no worker outlives the call.
    ///
    /// # Errors
    ///
    /// - The first fetch error observed by any worker. Errors from other
    ///   workers are discarded, as are any results already collected.
    /// - [`Error::Cancelled`] if `caller_scope` was cancelled before every URL
    ///   was fetched.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(urls = batch.len())))]
    pub async fn fan_out(
        &self,
        caller_scope: &CancellationToken,
        batch: Batch,
    ) -> Result<FetchedContent> {
        let scope = caller_scope.child_token();
        let _cancel_on_exit = scope.clone().drop_guard();

        let total = batch.len();
        let jobs = JobQueue::seeded(batch)?;

        // Sized to the batch so a worker's `try_send` can never hit capacity
        // while this task is waiting on the join below.
        let (results_tx, mut results_rx) = mpsc::channel(total);
        let first_error = Arc::new(FirstErrorSlot::new(scope.clone()));

        let pool = WorkerPool::new(Arc::clone(&self.fetcher), self.num_workers.min(total));
        pool.run(&scope, jobs, results_tx, &first_error).await;

        if let Some(err) = first_error.take() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Batch failed: {err}");
            return Err(err);
        }

        let mut output = FetchedContent::with_capacity(total);
        while let Ok((url, content)) = results_rx.try_recv() {
            output.insert(url, content);
        }

        // Workers only stop short without claiming an error when the caller
        // cancelled; never hand back a partial mapping.
        if output.len() < total {
            #[cfg(feature = "tracing")]
            tracing::debug!("Batch cancelled after {} of {total} fetches", output.len());
            return Err(Error::Cancelled);
        }

        Ok(output)
    }
}
