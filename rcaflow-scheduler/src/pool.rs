//! Bounded worker pool for tasklet execution.
//!
//! The pool is injected into the scheduler and shared; the scheduler never
//! owns its lifecycle. Tasklets acquire a permit before evaluating, which
//! bounds how many evaluations run concurrently regardless of how many
//! tasklets are pending.

use std::sync::Arc;
use tokio::sync::Semaphore;

/// A semaphore-bounded pool of evaluation slots.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool with the given number of concurrent evaluation slots.
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// The configured number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Shut the pool down. Pending acquisitions fail; tasklets affected by
    /// the closure emit empty units for the tick.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    pub(crate) fn permits(&self) -> Arc<Semaphore> {
        Arc::clone(&self.permits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn permits_are_bounded() {
        let pool = WorkerPool::new(2);
        let sem = pool.permits();
        let _a = sem.clone().acquire_owned().await.unwrap();
        let _b = sem.clone().acquire_owned().await.unwrap();
        assert_eq!(pool.available(), 0);
    }

    #[tokio::test]
    async fn closed_pool_refuses_acquisition() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert!(pool.is_closed());
        assert!(pool.permits().acquire_owned().await.is_err());
    }
}
