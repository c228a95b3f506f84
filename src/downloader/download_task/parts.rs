//! Part fetching: fan the parts of one stream out over the worker pool.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::pool::PoolReport;
use crate::types::{PartOutcome, StreamDescriptor};
use crate::utils::part_path;

use super::context::DownloadTaskContext;

/// Fetch every part of `stream` and return the part file paths in part order.
///
/// Once a part fails for good no further parts are dispatched; the ones
/// already running are left to finish and the first recorded error is
/// returned. Cancellation stops dispatch the same way and is reported by the
/// caller, not here.
pub(super) async fn fetch_parts(
    ctx: &DownloadTaskContext,
    stream: &StreamDescriptor,
) -> Result<Vec<PathBuf>> {
    let part_paths: Vec<PathBuf> = stream
        .parts
        .iter()
        .enumerate()
        .map(|(index, part)| part_path(&ctx.download_dir, &ctx.title, index, &part.ext))
        .collect();

    let errors: Arc<Mutex<Vec<Error>>> = Arc::new(Mutex::new(Vec::new()));
    let failed = Arc::new(AtomicBool::new(false));
    let skipped = Arc::new(AtomicUsize::new(0));

    let halted = {
        let failed = Arc::clone(&failed);
        let cancel = ctx.cancel_token.clone();
        move || failed.load(Ordering::SeqCst) || cancel.is_cancelled()
    };

    let fetch_ctx = ctx.fetch_context();
    let fetcher = &ctx.downloader.fetcher;
    let total = stream.parts.len();

    let report = ctx
        .downloader
        .pool
        .run(stream.parts.clone(), halted, |index, part| {
            let fetcher = fetcher.clone();
            let fetch_ctx = fetch_ctx.clone();
            let errors = Arc::clone(&errors);
            let failed = Arc::clone(&failed);
            let skipped = Arc::clone(&skipped);
            async move {
                match fetcher.fetch(&fetch_ctx, index, &part).await {
                    Ok(PartOutcome::Fetched { bytes }) => {
                        tracing::debug!(task_id = %fetch_ctx.task_id, part = index, bytes, "Part fetched");
                    }
                    Ok(PartOutcome::AlreadyComplete) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(PartOutcome::Cancelled) => {}
                    Err(e) => {
                        tracing::error!(
                            task_id = %fetch_ctx.task_id,
                            part = index,
                            error = %e,
                            "Part fetch failed"
                        );
                        failed.store(true, Ordering::SeqCst);
                        errors.lock().await.push(e);
                    }
                }
            }
        })
        .await;

    tracing::debug!(
        task_id = %ctx.id,
        dispatched = report.dispatched,
        panicked = report.panicked,
        total,
        already_complete = skipped.load(Ordering::Relaxed),
        "Part fetches finished"
    );

    let first_error = errors.lock().await.drain(..).next();
    settle(first_error, report, part_paths)
}

/// Turn the collected results of one pool run into the task's part result
///
/// A recorded fetch error wins; otherwise a panicked worker is fatal, since
/// its part file cannot be trusted.
fn settle(
    first_error: Option<Error>,
    report: PoolReport,
    part_paths: Vec<PathBuf>,
) -> Result<Vec<PathBuf>> {
    match first_error {
        Some(e) => Err(e),
        None if report.panicked > 0 => Err(Error::PartPanicked {
            count: report.panicked,
        }),
        None => Ok(part_paths),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> Vec<PathBuf> {
        vec![PathBuf::from("a[0].flv"), PathBuf::from("a[1].flv")]
    }

    #[test]
    fn clean_run_returns_part_paths_in_order() {
        let report = PoolReport {
            dispatched: 2,
            panicked: 0,
        };
        assert_eq!(settle(None, report, paths()).unwrap(), paths());
    }

    #[test]
    fn panicked_worker_fails_the_task() {
        let report = PoolReport {
            dispatched: 2,
            panicked: 1,
        };
        let err = settle(None, report, paths()).unwrap_err();
        assert!(matches!(err, Error::PartPanicked { count: 1 }));
    }

    #[test]
    fn recorded_fetch_error_takes_precedence() {
        let report = PoolReport {
            dispatched: 2,
            panicked: 1,
        };
        let fetch_error = Error::Http {
            status: 404,
            url: "https://cdn.example.com/p/1".into(),
        };
        let err = settle(Some(fetch_error), report, paths()).unwrap_err();
        assert!(matches!(err, Error::Http { status: 404, .. }));
    }
}
