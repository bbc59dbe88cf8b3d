//! Concurrency control and backpressure management.
//!
//! Bounds the number of operations in flight with a semaphore. Tokio's
//! semaphore queues waiters fairly, so operations dispatched in submission
//! order also start in submission order when permits are contended.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use toolfuse_core::error::RuntimeError;

use crate::RuntimeResult;

/// Concurrency controller for limiting in-flight operations.
pub struct ConcurrencyControl {
    /// Semaphore controlling max in-flight operations.
    semaphore: Arc<Semaphore>,

    /// Maximum number of concurrent operations allowed.
    max_inflight: usize,

    /// Current number of in-flight operations (approximate).
    in_flight: Arc<AtomicUsize>,

    /// Cancellation signal; when set, acquire() fails immediately.
    cancelled: Arc<AtomicBool>,
}

impl ConcurrencyControl {
    /// Create a new concurrency controller.
    ///
    /// # Arguments
    /// * `max_inflight` - Maximum number of operations that can execute concurrently
    pub fn new(max_inflight: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_inflight)),
            max_inflight,
            in_flight: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquire a permit to execute an operation.
    ///
    /// Blocks until a permit is available or cancellation is triggered.
    /// Returns an RAII guard that releases the permit when dropped.
    pub async fn acquire(&self) -> RuntimeResult<ConcurrencyPermit> {
        if self.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        // Acquire an owned semaphore permit so the permit isn't bound to a lifetime.
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| RuntimeError::Cancelled)?;

        self.in_flight.fetch_add(1, Ordering::Relaxed);

        Ok(ConcurrencyPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Cancel all pending and future acquire attempts.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.semaphore.close();
    }

    /// Check if execution has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Get the number of available permits.
    ///
    /// Note: This is approximate due to concurrent modifications.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the current number of in-flight operations.
    ///
    /// Note: This is approximate due to concurrent modifications.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Get the maximum allowed in-flight operations.
    pub fn max_inflight(&self) -> usize {
        self.max_inflight
    }
}

/// RAII guard for a concurrency permit.
///
/// Automatically releases the permit when dropped.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_creation() {
        let control = ConcurrencyControl::new(10);
        assert_eq!(control.max_inflight(), 10);
        assert_eq!(control.available_permits(), 10);
        assert_eq!(control.in_flight_count(), 0);
        assert!(!control.is_cancelled());
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let control = ConcurrencyControl::new(2);

        let permit1 = control
            .acquire()
            .await
            .expect("failed to acquire first permit");
        assert_eq!(control.in_flight_count(), 1);
        assert_eq!(control.available_permits(), 1);

        let permit2 = control
            .acquire()
            .await
            .expect("failed to acquire second permit");
        assert_eq!(control.in_flight_count(), 2);
        assert_eq!(control.available_permits(), 0);

        drop(permit1);
        assert_eq!(control.in_flight_count(), 1);

        drop(permit2);
        assert_eq!(control.in_flight_count(), 0);
        assert_eq!(control.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let control = ConcurrencyControl::new(10);

        control.cancel();
        assert!(control.is_cancelled());

        let result = control.acquire().await;
        assert!(matches!(result, Err(RuntimeError::Cancelled)));
    }

    #[tokio::test]
    async fn test_blocking_behavior() {
        let control = Arc::new(ConcurrencyControl::new(1));

        let permit = control.acquire().await.expect("failed to acquire permit");

        let control_clone = Arc::clone(&control);
        let handle = tokio::spawn(async move { control_clone.acquire().await });

        // Give the task time to block.
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(permit);

        let result = handle.await.expect("join");
        assert!(result.is_ok());
    }
}
