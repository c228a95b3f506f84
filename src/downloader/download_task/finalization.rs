//! Download finalization: terminal events and unregistration.

use crate::error::Result;
use crate::types::DownloadOutcome;

use super::context::DownloadTaskContext;

/// Report the task's result and take it out of the registries.
pub(super) async fn finalize_download(ctx: &DownloadTaskContext, result: &Result<DownloadOutcome>) {
    let id = ctx.id;

    match result {
        Ok(DownloadOutcome::Completed { output }) => {
            let bytes = ctx.progress.bytes_done().await;
            tracing::info!(
                task_id = %id,
                output = %output.display(),
                bytes,
                "Download complete"
            );
            ctx.mark_done().await;
        }
        Ok(DownloadOutcome::AlreadyExists { .. }) => {
            ctx.mark_done().await;
        }
        Ok(DownloadOutcome::Cancelled) => {
            tracing::info!(task_id = %id, "Download cancelled");
        }
        Err(e) => {
            tracing::error!(task_id = %id, error = %e, "Download failed");
            ctx.mark_failed(e).await;
        }
    }

    ctx.unregister().await;
}
