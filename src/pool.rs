//! Bounded worker pool for part fetches
//!
//! Each unit of work runs as its own tokio task so parts progress in
//! parallel on the multi-threaded runtime. `buffer_unordered` keeps at most
//! `limit` of them alive at once and pulls the next unit only when a slot
//! frees up, which is also the point where dispatching can be halted.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};

/// Default number of simultaneous part fetches per task
pub const DEFAULT_POOL_LIMIT: usize = 10;

/// Caps how many units of work run at the same time
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    limit: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_LIMIT)
    }
}

impl WorkerPool {
    /// Pool running at most `limit` units at once (a limit of 0 behaves as 1)
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Concurrency bound
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `work` for every unit and wait for all dispatched units to finish
    ///
    /// `halted` is consulted before each dispatch; once it returns true no
    /// further units start, while the ones already running are awaited to
    /// completion. A unit that panics halts dispatch the same way. Results
    /// are not inspected.
    pub async fn run<T, F, Fut, H>(&self, units: Vec<T>, halted: H, work: F) -> PoolReport
    where
        T: Send + 'static,
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
        H: Fn() -> bool,
    {
        let total = units.len();
        let panicked = AtomicUsize::new(0);
        let dispatched = stream::iter(units.into_iter().enumerate())
            .take_while(|_| {
                futures::future::ready(panicked.load(Ordering::SeqCst) == 0 && !halted())
            })
            .map(|(index, unit)| tokio::spawn(work(index, unit)))
            .buffer_unordered(self.limit)
            .fold(0usize, |count, joined| {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Worker task panicked");
                    panicked.fetch_add(1, Ordering::SeqCst);
                }
                futures::future::ready(count + 1)
            })
            .await;

        if dispatched < total {
            tracing::debug!(dispatched, total, "Dispatch halted early");
        }
        PoolReport {
            dispatched,
            panicked: panicked.into_inner(),
        }
    }
}

/// What a [`WorkerPool::run`] call did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Units that were started
    pub dispatched: usize,
    /// Started units that panicked instead of finishing
    pub panicked: usize,
}
