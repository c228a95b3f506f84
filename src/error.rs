//! Error types for media-dl
//!
//! Every fatal condition a download task can hit is a variant of [`Error`].
//! Outcomes that are not failures (already-exists, cancellation) are values of
//! [`crate::types::DownloadOutcome`] instead, so callers never have to match on
//! an error to learn that nothing went wrong.

use crate::types::TaskId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// The configured download directory is empty or whitespace
    #[error("download path is blank")]
    DownloadPathBlank,

    /// The configured download directory exists but is not a directory
    #[error("download path is not a directory: {0}")]
    DownloadPathNotDir(PathBuf),

    /// The resolved media has no stream that can be fetched
    #[error("no streams in title {title}")]
    NoStreams {
        /// Title of the media item
        title: String,
    },

    /// The selected stream id is not present in the resolver's stream map
    #[error("no stream named {name}")]
    StreamMissing {
        /// Stream id the selector picked
        name: String,
    },

    /// No resolved media is registered under this task id
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A download for this task id is already running
    #[error("task already running: {0}")]
    AlreadyRunning(TaskId),

    /// Part fetch workers died without reporting a result
    #[error("{count} part fetch worker(s) panicked")]
    PartPanicked {
        /// Number of workers that panicked
        count: usize,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caption download or transform failed
    #[error("caption error: {0}")]
    Caption(String),

    /// Merging part files into the final output failed
    #[error("merge failed: {0}")]
    Merge(String),

    /// External tool execution failed (ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, no extractor configured, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The resolver reported a failure
    #[error("extractor error: {0}")]
    Extractor(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,
}

impl Error {
    /// Machine-readable error code, carried in failure events for the host UI
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::DownloadPathBlank => "download_path_blank",
            Error::DownloadPathNotDir(_) => "download_path_not_dir",
            Error::NoStreams { .. } => "no_streams",
            Error::StreamMissing { .. } => "stream_missing",
            Error::TaskNotFound(_) => "task_not_found",
            Error::AlreadyRunning(_) => "already_running",
            Error::PartPanicked { .. } => "part_panicked",
            Error::Http { .. } => "http_error",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Caption(_) => "caption_error",
            Error::Merge(_) => "merge_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Extractor(_) => "extractor_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}
