//! Download task orchestration: top-level lifecycle for a single download.

use std::sync::atomic::Ordering;

use crate::captions::fetch_caption;
use crate::error::{Error, Result};
use crate::selector::select_stream;
use crate::types::{DownloadOutcome, Event, MediaInfo, StreamDescriptor, Task};
use crate::utils::{file_size, format_size, output_path};

use super::super::MediaDownloader;
use super::context::DownloadTaskContext;
use super::finalization::finalize_download;
use super::parts::fetch_parts;

impl MediaDownloader {
    /// Download `task` into the configured download directory
    ///
    /// Phases:
    /// 1. Validate the download directory and select the stream
    /// 2. Register the task as active and cancellable
    /// 3. Fetch captions
    /// 4. Short-circuit if the merged output already exists
    /// 5. Fetch all parts through the worker pool
    /// 6. Merge the parts into the output
    ///
    /// Cancellation is honoured up to the start of phase 6. From then on
    /// [`MediaDownloader::cancel`] reports the task as not found.
    ///
    /// The task is unregistered on every way out of phases 2-6, and a
    /// terminal event is emitted for everything but cancellation (which
    /// [`MediaDownloader::cancel`] reports).
    ///
    /// # Errors
    ///
    /// [`Error::ShuttingDown`] after [`MediaDownloader::shutdown`],
    /// [`Error::TaskNotFound`] for an id that was never registered,
    /// [`Error::AlreadyRunning`] while another download of the same id is in
    /// progress, and any fatal error of the phases above.
    pub async fn download(&self, task: &Task) -> Result<DownloadOutcome> {
        if !self.registries.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let media = self
            .media(task.id)
            .await
            .ok_or(Error::TaskNotFound(task.id))?;

        // The running download owns the id; refuse without touching its state
        if self.registries.active.contains(task.id).await {
            tracing::warn!(task_id = %task.id, "Download already running");
            return Err(Error::AlreadyRunning(task.id));
        }

        // Phase 1: Validate before anything is registered
        let stream = match self.prepare(&media).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Download rejected");
                self.emit_event(Event::DownloadFailed {
                    task: task.clone(),
                    code: e.code().to_string(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        // Phase 2: Register
        let ctx = DownloadTaskContext::register(self, task_snapshot(task, &media, stream)).await?;
        tracing::info!(
            task_id = %ctx.id,
            title = %media.title,
            stream = %stream.id,
            parts = stream.parts.len(),
            "Download started"
        );

        // Phases 3-6
        let result = run_download_task(&ctx, &media, stream).await;

        finalize_download(&ctx, &result).await;
        result
    }

    async fn prepare<'a>(&self, media: &'a MediaInfo) -> Result<&'a StreamDescriptor> {
        self.config.check_download_dir().await?;
        select_stream(media)
    }
}

/// Fresh snapshot for the selected stream, keeping the host's task identity
fn task_snapshot(task: &Task, media: &MediaInfo, stream: &StreamDescriptor) -> Task {
    Task {
        id: task.id,
        title: media.title.clone(),
        media_type: media.media_type.clone(),
        url: media.url.clone(),
        quality: stream.quality.clone(),
        size: format_size(stream.size),
        total_bytes: stream.size,
        percentage: 0,
    }
}

async fn run_download_task(
    ctx: &DownloadTaskContext,
    media: &MediaInfo,
    stream: &StreamDescriptor,
) -> Result<DownloadOutcome> {
    let downloader = &ctx.downloader;

    // Phase 3: Captions
    for (language, caption) in &media.captions {
        tracing::debug!(task_id = %ctx.id, language = %language, "Fetching caption");
        fetch_caption(&downloader.client, caption, &ctx.download_dir, &ctx.title).await?;
    }

    // Phase 4: Merged output already present
    let output = output_path(&ctx.download_dir, &ctx.title, &stream.ext);
    if file_size(&output).await?.is_some() {
        if !ctx.detach_cancellation().await {
            return Ok(DownloadOutcome::Cancelled);
        }
        tracing::info!(
            task_id = %ctx.id,
            output = %output.display(),
            "Output already exists, skipping"
        );
        return Ok(DownloadOutcome::AlreadyExists { output });
    }

    // Phase 5: Parts
    let fetched = fetch_parts(ctx, stream).await;
    if ctx.cancel_token.is_cancelled() {
        return Ok(DownloadOutcome::Cancelled);
    }
    let part_paths = fetched?;

    // Phase 6: Merge, no longer cancellable
    if !ctx.detach_cancellation().await {
        return Ok(DownloadOutcome::Cancelled);
    }
    let output = downloader
        .finalizer
        .finalize(stream, &part_paths, &output)
        .await?;
    Ok(DownloadOutcome::Completed { output })
}
