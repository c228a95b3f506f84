//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`resolve`] - Turning links into tasks and the resolved-media map
//! - [`download_task`] - Core download execution
//! - [`control`] - Cancellation and shutdown

mod control;
mod download_task;
mod resolve;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::fetcher::PartFetcher;
use crate::merge::{Finalizer, Muxer, muxer_from_config};
use crate::pool::WorkerPool;
use crate::registry::{ActiveDownloads, CancellationRegistry};
use crate::types::{Event, MediaInfo, TaskId};

/// Task bookkeeping shared by every running download
#[derive(Clone, Default)]
pub(crate) struct Registries {
    /// Tasks currently between registration and their terminal state
    pub(crate) active: ActiveDownloads,
    /// One cancellation trigger per running task
    pub(crate) cancellations: CancellationRegistry,
    /// Resolved media keyed by the task id handed to the host
    pub(crate) media: Arc<RwLock<HashMap<TaskId, Arc<MediaInfo>>>>,
    /// Flag to indicate whether new downloads are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// HTTP client shared by part and caption fetches
    pub(crate) client: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Active, cancellation and media bookkeeping
    pub(crate) registries: Registries,
    /// Part fetcher with the configured retry policy
    pub(crate) fetcher: PartFetcher,
    /// Concurrency bound for the parts of one task
    pub(crate) pool: WorkerPool,
    /// Merge step
    pub(crate) finalizer: Finalizer,
    /// Link resolver, if the host plugged one in
    pub(crate) extractor: Option<Arc<dyn Extractor>>,
}

impl MediaDownloader {
    /// Create a new MediaDownloader instance
    ///
    /// Builds the HTTP client, picks a muxer from the tool settings and sets
    /// up the event channel. The download directory is validated per
    /// download, not here, so a host can fix its settings without rebuilding
    /// the downloader.
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build()?;

        let (event_tx, _rx) = broadcast::channel(config.event_buffer.max(1));

        let muxer = muxer_from_config(&config.tools);
        let fetcher = PartFetcher::new(client.clone(), config.retry.clone());
        let pool = WorkerPool::new(config.download.max_concurrent_parts);

        let registries = Registries {
            accepting_new: Arc::new(AtomicBool::new(true)),
            ..Registries::default()
        };

        tracing::info!(
            download_dir = %config.download.download_dir.display(),
            max_concurrent_parts = pool.limit(),
            max_attempts = config.retry.max_attempts,
            "Media downloader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            client,
            event_tx,
            registries,
            fetcher,
            pool,
            finalizer: Finalizer::new(muxer),
            extractor: None,
        })
    }

    /// Use `extractor` to resolve links in [`MediaDownloader::resolve`]
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Replace the muxer picked from the tool settings
    pub fn with_muxer(mut self, muxer: Arc<dyn Muxer>) -> Self {
        tracing::debug!(muxer = muxer.name(), "Muxer replaced");
        self.finalizer = Finalizer::new(muxer);
        self
    }

    /// Subscribe to download events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events
    /// independently. A subscriber that falls more than `event_buffer` events
    /// behind receives `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use media_dl::{Config, Event, MediaDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default())?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             if let Event::ProgressRefreshed { task, .. } = event {
    ///                 println!("{}: {}%", task.title, task.percentage);
    ///             }
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Number of tasks currently downloading
    pub async fn active_count(&self) -> usize {
        self.registries.active.len().await
    }

    /// True while any task is still downloading
    ///
    /// Hosts use this to ask for confirmation before closing.
    pub async fn has_unfinished_downloads(&self) -> bool {
        !self.registries.active.is_empty().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped, so
    /// downloads never depend on anyone listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
