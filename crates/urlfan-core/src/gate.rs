//! Admission control for concurrently processed batches.
//!
//! [`AdmissionGate`] caps the number of batches in flight. Admission is purely
//! non-blocking: when every slot is taken the caller is refused immediately
//! rather than queued. An admitted batch holds an [`AdmissionPermit`] whose
//! `Drop` returns the slot, so release happens exactly once on every exit path
//! including errors, cancellation, panics and dropped futures.

use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Largest capacity an [`AdmissionGate`] can be built with.
pub const MAX_GATE_CAPACITY: usize = Semaphore::MAX_PERMITS;

/// Fixed-capacity, non-blocking admission counter.
///
/// Shared by reference (`Arc`) with the request-handling layer.
#[derive(Debug)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
}

/// Proof of admission for one batch. Dropping it releases the slot.
#[derive(Debug)]
#[must_use = "the admission slot is released as soon as the permit is dropped"]
pub struct AdmissionPermit {
    _slot: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `capacity` batches at once.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_GATE_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Reserves one slot if fewer than `capacity` batches are outstanding.
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyRequests`] if the gate is full. No state changes.
    /// - [`Error::ServiceShutdown`] if the gate has been closed.
    pub fn try_admit(&self) -> Result<AdmissionPermit> {
        match Arc::clone(&self.slots).try_acquire_owned() {
            Ok(slot) => Ok(AdmissionPermit { _slot: slot }),
            Err(TryAcquireError::NoPermits) => Err(Error::TooManyRequests {
                capacity: self.capacity,
            }),
            Err(TryAcquireError::Closed) => Err(Error::ServiceShutdown),
        }
    }

    /// Number of batches currently admitted.
    pub fn outstanding(&self) -> usize {
        self.capacity.saturating_sub(self.slots.available_permits())
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Refuses all future admissions. Permits already handed out stay valid.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAX_CLIENTS;

    #[test]
    fn refuses_once_capacity_is_reached() {
        let gate = AdmissionGate::new(DEFAULT_MAX_CLIENTS);
        let permits: Vec<_> = (0..DEFAULT_MAX_CLIENTS)
            .map(|_| gate.try_admit().expect("slot available"))
            .collect();
        assert_eq!(gate.outstanding(), DEFAULT_MAX_CLIENTS);

        let err = gate.try_admit().unwrap_err();
        assert_eq!(
            err,
            Error::TooManyRequests {
                capacity: DEFAULT_MAX_CLIENTS
            }
        );
        // A refusal must not consume anything.
        assert_eq!(gate.outstanding(), DEFAULT_MAX_CLIENTS);
        drop(permits);
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn readmits_after_release() {
        let gate = AdmissionGate::new(1);
        let first = gate.try_admit().unwrap();
        assert!(gate.try_admit().is_err());
        drop(first);
        let _second = gate.try_admit().unwrap();
        assert_eq!(gate.outstanding(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn releases_when_task_panics() {
        let gate = Arc::new(AdmissionGate::new(1));
        let permit = gate.try_admit().unwrap();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let outcome: Option<()> = None;
            outcome.expect("batch processing blew up");
        });
        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(gate.outstanding(), 0);
        assert!(gate.try_admit().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn never_exceeds_capacity_under_contention() {
        let capacity = 16;
        let gate = Arc::new(AdmissionGate::new(capacity));
        let tasks = (0..256).map(|_| {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                match gate.try_admit() {
                    Ok(_permit) => {
                        assert!(gate.outstanding() <= capacity);
                        tokio::task::yield_now().await;
                        true
                    }
                    Err(_) => false,
                }
            })
        });
        let admitted = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|res| matches!(res, Ok(true)))
            .count();
        assert!(admitted >= capacity.min(256));
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn accepts_largest_capacity() {
        let gate = AdmissionGate::new(MAX_GATE_CAPACITY);
        let _permit = gate.try_admit().unwrap();
        assert_eq!(gate.outstanding(), 1);
    }

    #[test]
    fn closed_gate_reports_shutdown() {
        let gate = AdmissionGate::new(4);
        let held = gate.try_admit().unwrap();
        gate.close();
        assert!(gate.is_closed());
        assert_eq!(gate.try_admit().unwrap_err(), Error::ServiceShutdown);
        assert_eq!(gate.outstanding(), 1);
        drop(held);
    }
}
