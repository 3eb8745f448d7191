use super::{FirstErrorSlot, JobQueue, ResultSink};
use crate::{Error, fetcher::Fetch};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Worker task that drains a batch's [`JobQueue`].
///
/// Each iteration checks the batch scope, takes the next URL and fetches it.
/// Successful results go to `results`. The first failure ends the worker: it
/// tries to claim `first_error` (which cancels the scope for every sibling) and
/// exits whether or not the claim succeeded.
///
/// # Arguments
///
/// - `worker_id`: Index of this worker within the batch (used for
///   logs/tracing).
/// - `fetcher`: Shared fetcher used for every job.
/// - `scope`: Batch scope, checked before each job is taken.
/// - `jobs`: Closed, pre-seeded queue of URLs.
/// - `results`: Sink sized to the batch, so `try_send` never hits capacity.
/// - `first_error`: Single-winner error slot shared with sibling workers.
pub async fn worker_loop<F>(
    worker_id: usize,
    fetcher: Arc<F>,
    scope: CancellationToken,
    jobs: JobQueue,
    results: ResultSink,
    first_error: Arc<FirstErrorSlot>,
) where
    F: Fetch,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    loop {
        if scope.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {worker_id} observed cancellation");
            break;
        }

        let Some(url) = jobs.next_job() else {
            break;
        };

        match fetcher.fetch(&scope, &url).await {
            Ok(content) => {
                if let Err(e) = results.try_send((url, content)) {
                    first_error.try_claim(Error::ChannelError {
                        context: format!("Worker {worker_id} failed to record result: {e}"),
                    });
                    break;
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} fetch failed: {e}");
                // Losing the claim means a sibling already owns the batch
                // error; this one is dropped.
                first_error.try_claim(e);
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}
