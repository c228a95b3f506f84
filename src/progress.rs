//! Per-task progress accumulation
//!
//! One [`ProgressTracker`] is shared by every part fetch of a task. It owns
//! the byte counter behind a mutex and derives the percentage from it on
//! demand; the percentage is never tracked separately from the bytes.

use tokio::sync::{Mutex, broadcast};

use crate::types::{Event, Task};

/// Size of the increments used by [`ProgressTracker::simulate`]
pub const SIMULATED_SEGMENT: u64 = 1000;

/// `floor(done / total * 100)`, clamped to 100; 0 when the total is unknown
pub fn percentage(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(done) * 100) / u128::from(total);
    pct.min(100) as u8
}

struct ProgressState {
    task: Task,
    bytes_done: u64,
}

/// Thread-safe byte counter for one task that notifies subscribers on change
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    event_tx: broadcast::Sender<Event>,
}

impl ProgressTracker {
    /// Start tracking `task`; its `total_bytes` is the 100% mark
    pub fn new(task: Task, event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                task,
                bytes_done: 0,
            }),
            event_tx,
        }
    }

    /// Add `bytes` to the completed counter
    ///
    /// The counter only grows. Bytes re-fetched by a retry are counted again.
    pub async fn add_done(&self, bytes: u64) {
        let mut state = self.state.lock().await;
        state.bytes_done = state.bytes_done.saturating_add(bytes);
    }

    /// Recompute the percentage from the counter and emit `ProgressRefreshed`
    pub async fn recompute_percentage(&self) -> u8 {
        let mut state = self.state.lock().await;
        let pct = percentage(state.bytes_done, state.task.total_bytes);
        state.task.percentage = pct;
        tracing::debug!(
            task_id = %state.task.id,
            bytes_done = state.bytes_done,
            percentage = pct,
            "Download progress"
        );
        self.event_tx
            .send(Event::ProgressRefreshed {
                task: state.task.clone(),
                bytes_done: state.bytes_done,
            })
            .ok();
        pct
    }

    /// Add `bytes` and notify
    pub async fn record(&self, bytes: u64) -> u8 {
        self.add_done(bytes).await;
        self.recompute_percentage().await
    }

    /// Report `bytes` as a series of [`SIMULATED_SEGMENT`]-sized increments
    ///
    /// For callers that only learn a total after the fact; it smooths the
    /// progress a UI sees and adds exactly `bytes` to the counter.
    pub async fn simulate(&self, bytes: u64) {
        let mut remaining = bytes;
        while remaining > 0 {
            let step = remaining.min(SIMULATED_SEGMENT);
            self.record(step).await;
            remaining -= step;
        }
    }

    /// Bytes completed so far
    pub async fn bytes_done(&self) -> u64 {
        self.state.lock().await.bytes_done
    }

    /// Current task snapshot
    pub async fn snapshot(&self) -> Task {
        self.state.lock().await.task.clone()
    }
}
