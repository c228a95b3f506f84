//! Download task context: registration, shared state and terminal events.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::fetcher::FetchContext;
use crate::progress::ProgressTracker;
use crate::registry::{Registration, WriteGate};
use crate::types::{Event, Task, TaskId};

use super::super::MediaDownloader;

/// Shared context for a single download task, reducing parameter passing between helpers.
///
/// Exists only while the task is registered: building one pushes the task
/// into the active and cancellation registries, [`unregister`] takes it out
/// of both.
///
/// [`unregister`]: DownloadTaskContext::unregister
pub(crate) struct DownloadTaskContext {
    pub(crate) id: TaskId,
    pub(crate) title: String,
    pub(crate) referer: String,
    pub(crate) download_dir: PathBuf,
    pub(crate) cancel_token: CancellationToken,
    pub(crate) gate: WriteGate,
    pub(crate) registration: Registration,
    pub(crate) progress: Arc<ProgressTracker>,
    pub(crate) downloader: MediaDownloader,
}

impl DownloadTaskContext {
    /// Register `task` as running and build its context
    ///
    /// Fails with [`Error::AlreadyRunning`] if another download of the same
    /// id is still registered; that run is left untouched.
    pub(super) async fn register(downloader: &MediaDownloader, task: Task) -> Result<Self> {
        let id = task.id;
        let registries = &downloader.registries;

        let gate = registries
            .active
            .push(id)
            .await
            .ok_or(Error::AlreadyRunning(id))?;
        let cancel_token = CancellationToken::new();
        let registration = registries
            .cancellations
            .register(id, cancel_token.clone())
            .await;

        Ok(Self {
            id,
            title: task.title.clone(),
            referer: task.url.clone(),
            download_dir: downloader.config.download.download_dir.clone(),
            cancel_token,
            gate,
            registration,
            progress: Arc::new(ProgressTracker::new(task, downloader.event_tx.clone())),
            downloader: downloader.clone(),
        })
    }

    /// Per-part view handed to the fetcher
    pub(super) fn fetch_context(&self) -> FetchContext {
        FetchContext {
            task_id: self.id,
            download_dir: self.download_dir.clone(),
            title: self.title.clone(),
            referer: self.referer.clone(),
            cancel: self.cancel_token.clone(),
            progress: Arc::clone(&self.progress),
            active: self.downloader.registries.active.clone(),
            gate: self.gate.clone(),
        }
    }

    /// Stop accepting cancellation for this run.
    ///
    /// Returns false if the trigger already fired, in which case the caller
    /// must report the task as cancelled.
    pub(super) async fn detach_cancellation(&self) -> bool {
        let detached = self
            .downloader
            .registries
            .cancellations
            .remove_registration(self.id, self.registration)
            .await;
        detached && !self.cancel_token.is_cancelled()
    }

    /// Remove this run from the active and cancellation registries.
    ///
    /// Entries that a later run of the same id registered are left alone.
    pub(super) async fn unregister(&self) {
        let registries = &self.downloader.registries;
        registries.active.release(self.id, &self.gate).await;
        registries
            .cancellations
            .remove_registration(self.id, self.registration)
            .await;
    }

    /// Emit the done event with the percentage forced to 100.
    pub(super) async fn mark_done(&self) {
        let mut task = self.progress.snapshot().await;
        task.percentage = 100;
        self.downloader.emit_event(Event::DownloadDone { task });
    }

    /// Emit the failure event for `error`.
    pub(super) async fn mark_failed(&self, error: &Error) {
        let task = self.progress.snapshot().await;
        self.downloader.emit_event(Event::DownloadFailed {
            task,
            code: error.code().to_string(),
            error: error.to_string(),
        });
    }
}
