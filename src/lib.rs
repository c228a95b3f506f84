//! # media-dl
//!
//! Download engine for desktop media-downloader applications.
//!
//! Given resolved media (a title plus alternative quality streams, each
//! split into parts), media-dl picks the best stream, fetches its parts
//! concurrently with resume and bounded retry, reports byte-level progress,
//! supports cancellation mid-flight and merges the parts into one file by
//! concatenation or container multiplexing.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Resumable** - Interrupted parts continue where they stopped
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, DownloadOutcome, MediaDownloader, MediaInfo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.download_dir = "/tmp/videos".into();
//!
//!     let downloader = MediaDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let media: MediaInfo = serde_json::from_str(&std::fs::read_to_string("media.json")?)?;
//!     let task = downloader.register_media(media).await;
//!
//!     match downloader.download(&task).await? {
//!         DownloadOutcome::Completed { output } => println!("saved {}", output.display()),
//!         DownloadOutcome::AlreadyExists { output } => println!("{} exists", output.display()),
//!         DownloadOutcome::Cancelled => println!("cancelled"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Caption download and format conversion
pub mod captions;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Link resolver seam
pub mod extractor;
/// Resumable part fetching
pub mod fetcher;
/// Merging parts into the final output
pub mod merge;
/// Bounded worker pool
pub mod pool;
/// Per-task progress tracking
pub mod progress;
/// Active-download and cancellation registries
pub mod registry;
/// Retry logic with configurable backoff
pub mod retry;
/// Stream selection
pub mod selector;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, RetryConfig, ToolsConfig};
pub use downloader::MediaDownloader;
pub use error::{Error, Result};
pub use extractor::Extractor;
pub use merge::{FfmpegMuxer, MergePlan, MuxMode, MuxRequest, Muxer, NoOpMuxer};
pub use types::{
    CaptionDescriptor, CaptionTransform, DownloadOutcome, Event, MediaInfo, PartDescriptor,
    PartOutcome, StreamDescriptor, StreamInfo, Task, TaskId,
};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
/// Returns the number of downloads that were cancelled.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{Config, MediaDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = MediaDownloader::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> usize {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
