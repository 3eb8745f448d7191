use crate::{Error, Result};
use crossbeam_channel::{Receiver, bounded};

/// A finite, closed queue of URLs shared by the workers of one batch.
///
/// The queue is seeded with every identifier up front and closed before any
/// worker starts, so taking a job never waits: it either yields the next URL or
/// reports that the queue is exhausted. Clones share the same items and each
/// item is handed to exactly one consumer.
#[derive(Clone, Debug)]
pub struct JobQueue {
    rx: Receiver<String>,
}

impl JobQueue {
    /// Seeds a queue with `urls` and closes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if a URL cannot be enqueued, which
    /// cannot happen while the buffer is sized to the input.
    pub fn seeded<I>(urls: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: ExactSizeIterator,
    {
        let urls = urls.into_iter();
        let (tx, rx) = bounded(urls.len());
        for url in urls {
            tx.try_send(url).map_err(|e| Error::ChannelError {
                context: format!("Failed to seed job queue: {e}"),
            })?;
        }
        // Dropping the only sender closes the queue.
        drop(tx);
        Ok(Self { rx })
    }

    /// Takes the next job, or `None` once the queue is drained.
    pub fn next_job(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
