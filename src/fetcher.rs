//! Resumable part fetching
//!
//! A part is written to `<part file>.download` and renamed into place once
//! the whole body has been appended. A restart picks up whatever the temp
//! file already holds and asks the server only for the remainder.
//!
//! Cancellation is cooperative: the task's token is checked once at the top
//! of every attempt, before the network call, and never mid-transfer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{RANGE, REFERER};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::progress::ProgressTracker;
use crate::registry::{ActiveDownloads, WriteGate};
use crate::retry::download_with_retry;
use crate::types::{PartDescriptor, PartOutcome, TaskId};
use crate::utils::{file_size, part_path, temp_path};

/// Task-level state shared by every part fetch of one task
#[derive(Clone)]
pub struct FetchContext {
    /// Owning task
    pub task_id: TaskId,
    /// Download root
    pub download_dir: PathBuf,
    /// Media title, names the part files
    pub title: String,
    /// Sent as the Referer header with every request
    pub referer: String,
    /// The task's cancellation trigger
    pub cancel: CancellationToken,
    /// The task's byte counter
    pub progress: Arc<ProgressTracker>,
    /// Registry that records temp files for cleanup
    pub active: ActiveDownloads,
    /// Gate shared with temp-file cleanup
    pub gate: WriteGate,
}

/// Fetches single parts over HTTP with resume and bounded retry
#[derive(Clone)]
pub struct PartFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl PartFetcher {
    /// Create a fetcher using `client` and the given retry policy
    pub fn new(client: reqwest::Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Fetch part `index` of the task described by `ctx`
    ///
    /// Returns [`PartOutcome::AlreadyComplete`] without touching the network
    /// when the part file already has the declared size, and
    /// [`PartOutcome::Cancelled`] when the trigger fired before an attempt.
    /// An error is returned only after the retry budget is spent or on a
    /// non-retryable failure.
    pub async fn fetch(
        &self,
        ctx: &FetchContext,
        index: usize,
        part: &PartDescriptor,
    ) -> Result<PartOutcome> {
        let final_path = part_path(&ctx.download_dir, &ctx.title, index, &part.ext);
        let temp = temp_path(&final_path);

        if file_size(&final_path).await? == Some(part.size) {
            tracing::debug!(
                task_id = %ctx.task_id,
                part = index,
                path = %final_path.display(),
                "Part already complete"
            );
            return Ok(PartOutcome::AlreadyComplete);
        }

        ctx.active.register_temp_path(ctx.task_id, temp.clone()).await;

        download_with_retry(&self.retry, |attempt| {
            self.attempt(ctx, index, part, &final_path, &temp, attempt)
        })
        .await
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        index: usize,
        part: &PartDescriptor,
        final_path: &Path,
        temp: &Path,
        attempt: u32,
    ) -> Result<PartOutcome> {
        let _lease = ctx.gate.lease().await;

        if ctx.cancel.is_cancelled() {
            tracing::debug!(task_id = %ctx.task_id, part = index, "Fetch cancelled");
            return Ok(PartOutcome::Cancelled);
        }

        let offset = file_size(temp).await?.unwrap_or(0);
        if part.size > 0 && offset >= part.size {
            // An earlier run got every byte but stopped before the rename
            tokio::fs::rename(temp, final_path).await?;
            return Ok(PartOutcome::Fetched { bytes: 0 });
        }

        tracing::debug!(
            task_id = %ctx.task_id,
            part = index,
            attempt,
            offset,
            url = %part.url,
            "Fetching part"
        );

        let mut request = self.client.get(&part.url).header(REFERER, &ctx.referer);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: part.url.clone(),
            });
        }

        // A 200 to a ranged request carries the whole body again
        let restart = offset > 0 && status != StatusCode::PARTIAL_CONTENT;
        if restart {
            tracing::debug!(
                task_id = %ctx.task_id,
                part = index,
                "Server ignored range, rewriting part from the start"
            );
        }

        let body = response.bytes().await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(!restart)
            .truncate(restart)
            .open(temp)
            .await?;
        file.write_all(&body).await?;
        file.flush().await?;
        drop(file);

        let written = body.len() as u64;
        ctx.progress.record(written).await;

        tokio::fs::rename(temp, final_path).await?;
        Ok(PartOutcome::Fetched { bytes: written })
    }
}
