use crate::Error;
use parking_lot::Mutex;
use portable_atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Holds at most one error for a batch.
///
/// The first failing worker wins a compare-and-set on `claimed`, stores its
/// error and cancels the batch scope. Every later claim loses immediately and
/// its error is dropped: a batch reports one representative failure, never a
/// list.
#[derive(Debug)]
pub struct FirstErrorSlot {
    claimed: AtomicBool,
    error: Mutex<Option<Error>>,
    scope: CancellationToken,
}

impl FirstErrorSlot {
    /// Creates an empty slot that cancels `scope` when claimed.
    pub fn new(scope: CancellationToken) -> Self {
        Self {
            claimed: AtomicBool::new(false),
            error: Mutex::new(None),
            scope,
        }
    }

    /// Attempts to record `err`. Returns `true` if this call won the slot.
    ///
    /// Never blocks on other claimants.
    pub fn try_claim(&self, err: Error) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        *self.error.lock() = Some(err);
        self.scope.cancel();
        true
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Removes the stored error, if any. Meant to be called after all workers
    /// have joined.
    pub fn take(&self) -> Option<Error> {
        self.error.lock().take()
    }
}
