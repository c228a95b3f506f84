//! Download control (cancel) and shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::{Error, Result};
use crate::types::{Event, TaskId};

use super::MediaDownloader;

impl MediaDownloader {
    /// Cancel a running download
    ///
    /// Fires the task's cancellation trigger, waits for part writes that are
    /// already under way, deletes every temp file the task registered and
    /// emits [`Event::DownloadCancelled`]. Parts that finished before the
    /// trigger fired stay on disk, so downloading the task again resumes
    /// from them.
    ///
    /// The [`download`](MediaDownloader::download) call for the task
    /// returns [`DownloadOutcome::Cancelled`](crate::DownloadOutcome::Cancelled)
    /// once its in-flight fetches have returned.
    ///
    /// # Errors
    ///
    /// [`Error::TaskNotFound`] if the task is not running, or is already
    /// merging its parts.
    pub async fn cancel(&self, id: TaskId) -> Result<()> {
        let registries = &self.registries;

        // Signal the download task to stop
        if !registries.cancellations.cancel(id).await {
            return Err(Error::TaskNotFound(id));
        }
        tracing::info!(task_id = %id, "Cancelling download");

        // Delete partial part files once in-flight writes have finished
        let removed = registries.active.clear_temp_files(id).await;

        // Trigger first: the id stays active until the pop, so no new run can
        // register a trigger in between
        registries.cancellations.remove(id).await;
        registries.active.pop(id).await;

        tracing::debug!(task_id = %id, removed, "Download cancelled");
        self.emit_event(Event::DownloadCancelled { id });
        Ok(())
    }

    /// Stop accepting downloads and cancel every running one
    ///
    /// Subsequent [`download`](MediaDownloader::download) calls fail with
    /// [`Error::ShuttingDown`]. Returns the number of downloads cancelled.
    pub async fn shutdown(&self) -> usize {
        tracing::info!("Initiating shutdown");

        // 1. Stop accepting new downloads
        self.registries.accepting_new.store(false, Ordering::SeqCst);

        // 2. Cancel everything that is still running
        let active = self.registries.active.ids().await;
        tracing::debug!(active_count = active.len(), "Cancelling active downloads");

        let mut cancelled = 0;
        for id in active {
            match self.cancel(id).await {
                Ok(()) => cancelled += 1,
                // Finished on its own between listing and cancelling
                Err(Error::TaskNotFound(_)) => {}
                Err(e) => tracing::warn!(task_id = %id, error = %e, "Failed to cancel download"),
            }
        }

        tracing::info!(cancelled, "Shutdown complete");
        cancelled
    }

    /// Whether the downloader still accepts new downloads
    pub fn is_accepting_downloads(&self) -> bool {
        self.registries.accepting_new.load(Ordering::SeqCst)
    }
}
