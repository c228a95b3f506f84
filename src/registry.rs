//! Active-download and cancellation registries
//!
//! Both are plain service objects owned by [`crate::MediaDownloader`] and
//! cloned cheaply (every field is an `Arc`). Tests build isolated instances.
//!
//! Temp-file cleanup never guesses whether a file is still being written.
//! Each task has a [`WriteGate`]: part fetches hold a shared [`WriteLease`]
//! for the whole of an attempt, and [`ActiveDownloads::clear_temp_files`]
//! takes the exclusive side before deleting anything.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, OwnedRwLockReadGuard, RwLock};
use tokio_util::sync::CancellationToken;

use crate::types::TaskId;

/// Shared-side guard held by a part fetch while it touches its temp file
pub type WriteLease = OwnedRwLockReadGuard<()>;

/// Per-task gate between part writers and temp-file cleanup
#[derive(Clone, Default)]
pub struct WriteGate(Arc<RwLock<()>>);

impl WriteGate {
    /// Acquire a lease; waits while a cleanup is in progress
    pub async fn lease(&self) -> WriteLease {
        Arc::clone(&self.0).read_owned().await
    }

    /// Whether both handles guard the same task run
    pub fn same_run(&self, other: &WriteGate) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Wait until no lease is outstanding and keep new ones out until the guard drops
    async fn exclusive(&self) -> tokio::sync::OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.0).write_owned().await
    }
}

#[derive(Default)]
struct ActiveEntry {
    temp_paths: Vec<PathBuf>,
    gate: WriteGate,
}

/// Set of in-flight task ids plus the temp files each one created
#[derive(Clone, Default)]
pub struct ActiveDownloads {
    entries: Arc<Mutex<HashMap<TaskId, ActiveEntry>>>,
}

impl ActiveDownloads {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as active and return the write gate of this run
    ///
    /// Returns `None` and leaves the registry untouched if `id` is already
    /// active.
    pub async fn push(&self, id: TaskId) -> Option<WriteGate> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&id) {
            return None;
        }
        let entry = entries.entry(id).or_default();
        Some(entry.gate.clone())
    }

    /// Remove `id`; returns whether it was active
    pub async fn pop(&self, id: TaskId) -> bool {
        self.entries.lock().await.remove(&id).is_some()
    }

    /// Remove `id` only if its entry still belongs to the run holding `gate`
    ///
    /// A run that was cancelled and then superseded by a new download of the
    /// same id must not take the new run's entry with it.
    pub async fn release(&self, id: TaskId, gate: &WriteGate) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get(&id) {
            Some(entry) if entry.gate.same_run(gate) => {
                entries.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Number of active tasks
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when no task is active
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Whether `id` is active
    pub async fn contains(&self, id: TaskId) -> bool {
        self.entries.lock().await.contains_key(&id)
    }

    /// Ids of all active tasks
    pub async fn ids(&self) -> Vec<TaskId> {
        self.entries.lock().await.keys().copied().collect()
    }

    /// Remember a temp file created for `id`; ignored if `id` is not active
    pub async fn register_temp_path(&self, id: TaskId, path: PathBuf) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(&id)
            && !entry.temp_paths.contains(&path)
        {
            entry.temp_paths.push(path);
        }
    }

    /// Temp files registered for `id`
    pub async fn temp_paths(&self, id: TaskId) -> Vec<PathBuf> {
        self.entries
            .lock()
            .await
            .get(&id)
            .map(|e| e.temp_paths.clone())
            .unwrap_or_default()
    }

    /// Delete every temp file registered for `id`, best effort
    ///
    /// Waits for outstanding write leases first. Files that are already gone
    /// (renamed into place by a finished fetch) are skipped silently. Returns
    /// the number of files removed.
    pub async fn clear_temp_files(&self, id: TaskId) -> usize {
        let (paths, gate) = {
            let mut entries = self.entries.lock().await;
            match entries.get_mut(&id) {
                Some(entry) => (std::mem::take(&mut entry.temp_paths), entry.gate.clone()),
                None => return 0,
            }
        };

        let _exclusive = gate.exclusive().await;

        let mut removed = 0;
        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        task_id = %id,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove temp file"
                    );
                }
            }
        }
        tracing::debug!(task_id = %id, removed, "Temp files cleared");
        removed
    }
}

/// Identifies one registration of a trigger in a [`CancellationRegistry`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration(u64);

struct Trigger {
    token: CancellationToken,
    registration: Registration,
}

/// Map from task id to its cancellation trigger
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    tokens: Arc<Mutex<HashMap<TaskId, Trigger>>>,
    next_registration: Arc<AtomicU64>,
}

impl CancellationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `token` as the trigger for `id`, replacing any previous one
    pub async fn register(&self, id: TaskId, token: CancellationToken) -> Registration {
        let registration = Registration(self.next_registration.fetch_add(1, Ordering::Relaxed));
        self.tokens.lock().await.insert(
            id,
            Trigger {
                token,
                registration,
            },
        );
        registration
    }

    /// Fire the trigger for `id`; returns false if none is registered
    ///
    /// Firing twice is harmless.
    pub async fn cancel(&self, id: TaskId) -> bool {
        match self.tokens.lock().await.get(&id) {
            Some(trigger) => {
                trigger.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the trigger for `id`
    pub async fn remove(&self, id: TaskId) -> Option<CancellationToken> {
        self.tokens.lock().await.remove(&id).map(|trigger| trigger.token)
    }

    /// Drop the trigger for `id` only if it is still `registration`
    ///
    /// Returns false when the trigger was already removed or replaced.
    pub async fn remove_registration(&self, id: TaskId, registration: Registration) -> bool {
        let mut tokens = self.tokens.lock().await;
        match tokens.get(&id) {
            Some(trigger) if trigger.registration == registration => {
                tokens.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Number of registered triggers
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// True when no trigger is registered
    pub async fn is_empty(&self) -> bool {
        self.tokens.lock().await.is_empty()
    }
}
