//! Worker pool with load-aware selection.
//!
//! A fixed set of interchangeable worker connections to the message store,
//! each with a live in-flight counter. Requests pick the least-loaded
//! worker, hold a [`LoadGuard`] for their lifetime, and reuse one cached
//! [`StreamAdapter`] per worker.

use crate::store::{MessageStore, StreamAdapter};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle to one worker connection in the pool.
///
/// Workers are created at startup and live for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerHandle {
    index: usize,
}

impl WorkerHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Fixed pool of workers plus the shared load table and adapter cache.
///
/// Cheap to clone; clones share the same counters and cache.
#[derive(Clone)]
pub struct WorkerPool {
    store: Arc<dyn MessageStore>,
    loads: Arc<Vec<AtomicUsize>>,
    adapters: Arc<DashMap<usize, Arc<StreamAdapter>>>,
}

impl WorkerPool {
    /// Create a pool of `size` workers. The pool is never empty; `size` is
    /// validated at config load.
    pub fn new(store: Arc<dyn MessageStore>, size: usize) -> Self {
        assert!(size > 0, "worker pool cannot be empty");
        Self {
            store,
            loads: Arc::new((0..size).map(|_| AtomicUsize::new(0)).collect()),
            adapters: Arc::new(DashMap::new()),
        }
    }

    /// Number of workers in the pool.
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Pick the worker with the minimum in-flight load. Ties go to the
    /// lowest index, so selection is deterministic.
    pub fn select_worker(&self) -> WorkerHandle {
        let mut best = 0;
        let mut best_load = usize::MAX;
        for (index, load) in self.loads.iter().enumerate() {
            let load = load.load(Ordering::Relaxed);
            if load < best_load {
                best = index;
                best_load = load;
            }
        }
        WorkerHandle::new(best)
    }

    /// Mark a request as started on `worker`. The returned guard decrements
    /// the counter when dropped, on every exit path including a client
    /// disconnect mid-stream.
    pub fn begin(&self, worker: WorkerHandle) -> LoadGuard {
        self.loads[worker.index].fetch_add(1, Ordering::Relaxed);
        LoadGuard {
            loads: Arc::clone(&self.loads),
            index: worker.index,
        }
    }

    /// The cached stream adapter for `worker`, constructed on first use.
    /// Concurrent first use converges on a single instance.
    pub fn adapter_for(&self, worker: WorkerHandle) -> Arc<StreamAdapter> {
        self.adapters
            .entry(worker.index)
            .or_insert_with(|| Arc::new(StreamAdapter::new(Arc::clone(&self.store), worker)))
            .clone()
    }

    /// Snapshot of every worker's in-flight count, indexed by worker.
    pub fn loads(&self) -> Vec<usize> {
        self.loads
            .iter()
            .map(|load| load.load(Ordering::Relaxed))
            .collect()
    }

    /// Current in-flight count for one worker.
    pub fn current_load(&self, worker: WorkerHandle) -> usize {
        self.loads[worker.index].load(Ordering::Relaxed)
    }
}

/// Scoped load release for one in-flight request.
pub struct LoadGuard {
    loads: Arc<Vec<AtomicUsize>>,
    index: usize,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.loads[self.index].fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn pool(size: usize) -> WorkerPool {
        WorkerPool::new(Arc::new(MemoryStore::new()), size)
    }

    #[test]
    fn test_select_prefers_least_loaded() {
        let pool = pool(3);
        let _g0 = pool.begin(WorkerHandle::new(0));
        let _g1 = pool.begin(WorkerHandle::new(1));

        assert_eq!(pool.select_worker().index(), 2);
    }

    #[test]
    fn test_select_tie_break_is_first_minimum() {
        let pool = pool(3);
        assert_eq!(pool.select_worker().index(), 0);

        let _g = pool.begin(WorkerHandle::new(0));
        // Workers 1 and 2 now tie at zero; the first wins.
        assert_eq!(pool.select_worker().index(), 1);
    }

    #[test]
    fn test_guard_restores_load_on_drop() {
        let pool = pool(2);
        let worker = pool.select_worker();

        let guard = pool.begin(worker);
        assert_eq!(pool.current_load(worker), 1);
        drop(guard);
        assert_eq!(pool.current_load(worker), 0);
    }

    #[test]
    fn test_adapter_is_cached_per_worker() {
        let pool = pool(2);
        let worker = pool.select_worker();

        let a = pool.adapter_for(worker);
        let b = pool.adapter_for(worker);
        assert!(Arc::ptr_eq(&a, &b));

        let other = pool.adapter_for(WorkerHandle::new(1));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(other.worker().index(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_begin_end_leaves_counters_at_zero() {
        let pool = pool(4);

        let mut handles = Vec::new();
        for _ in 0..64 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let worker = pool.select_worker();
                let _guard = pool.begin(worker);
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(pool.loads(), vec![0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "worker pool cannot be empty")]
    fn test_empty_pool_is_rejected() {
        let _ = pool(0);
    }
}
