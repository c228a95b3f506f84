//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Download behavior configuration (directory and part concurrency)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Download root directory (default: "./downloads")
    ///
    /// Part files, temp files, captions and merged outputs are all written
    /// directly under this directory.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum number of parts of one task fetched at the same time (default: 10)
    #[serde(default = "default_max_concurrent_parts")]
    pub max_concurrent_parts: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_parts: default_max_concurrent_parts(),
        }
    }
}

/// External tool paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ffmpeg binary used for container multiplexing
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Search PATH for ffmpeg when `ffmpeg_path` is not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Retry configuration for transient part-fetch failures
///
/// The defaults give three attempts one second apart: the multiplier of 1.0
/// keeps the backoff fixed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, counting the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 1 second)
    #[serde(default = "default_delay", with = "duration_serde")]
    pub delay: Duration,

    /// Upper bound for the delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry (default: 1.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for [`crate::MediaDownloader`]
///
/// Persisting this value is the host application's job; it is plain serde
/// data and round-trips through JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Download directory and part concurrency
    #[serde(default)]
    pub download: DownloadConfig,

    /// Retry policy for part fetches
    #[serde(default)]
    pub retry: RetryConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// User-Agent header sent with every request (None = reqwest default)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download: DownloadConfig::default(),
            retry: RetryConfig::default(),
            tools: ToolsConfig::default(),
            event_buffer: default_event_buffer(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Validate the download directory before any fetch begins
    ///
    /// A blank path and a path that is not a directory are reported as
    /// distinct errors; a missing path surfaces the underlying I/O error.
    pub async fn check_download_dir(&self) -> Result<()> {
        let dir = &self.download.download_dir;
        if dir.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(Error::DownloadPathBlank);
        }

        let metadata = tokio::fs::metadata(dir).await?;
        if !metadata.is_dir() {
            return Err(Error::DownloadPathNotDir(dir.clone()));
        }
        Ok(())
    }
}

// Default value functions
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent_parts() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_event_buffer() -> usize {
    1000
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
