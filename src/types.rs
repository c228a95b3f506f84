//! Core types for media-dl
//!
//! The resolved-media model ([`MediaInfo`], [`StreamDescriptor`],
//! [`PartDescriptor`], [`CaptionDescriptor`]) is what an
//! [`Extractor`](crate::extractor::Extractor) hands over. [`Task`] is the
//! snapshot the host UI sees; it travels inside every [`Event`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::utils::format_size;

/// Opaque identifier for one download task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a fresh random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One fetchable segment of a stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDescriptor {
    /// Source URL
    pub url: String,
    /// Declared size in bytes
    pub size: u64,
    /// File extension of the part (without the dot)
    pub ext: String,
}

/// One quality/format alternative of a media item
///
/// Part order is significant: the merged output follows it byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stream id as reported by the resolver (matches its key in [`MediaInfo::streams`])
    pub id: String,
    /// Quality label, e.g. "1080P 高清" or "hd720"
    pub quality: String,
    /// Declared total size in bytes
    pub size: u64,
    /// Extension of the merged output
    pub ext: String,
    /// The parts are separate tracks that must be multiplexed into one container
    #[serde(default)]
    pub need_mux: bool,
    /// Ordered parts
    pub parts: Vec<PartDescriptor>,
}

/// Display-oriented summary of a stream
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Quality label
    pub quality: String,
    /// Human-readable size ("12.34 MiB")
    pub size: String,
    /// Size in bytes
    pub bytes: u64,
}

impl StreamDescriptor {
    /// Summarise quality and size for display
    pub fn info(&self) -> StreamInfo {
        StreamInfo {
            quality: self.quality.clone(),
            size: format_size(self.size),
            bytes: self.size,
        }
    }
}

/// Transform applied to caption bytes before they are written
///
/// A closed set of data-only variants, so a caption descriptor serializes
/// cleanly between the resolver and the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionTransform {
    /// Write the bytes unchanged
    #[default]
    Identity,
    /// Convert a JSON subtitle document (`{"body":[{"from","to","content"}]}`) to SubRip
    JsonToSrt,
}

/// One caption track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionDescriptor {
    /// Source URL
    pub url: String,
    /// Extension of the written caption file
    pub ext: String,
    /// Transform applied before writing
    #[serde(default)]
    pub transform: CaptionTransform,
}

/// A resolved media item as produced by an extractor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Title, used to name every file the task writes
    pub title: String,
    /// Media type ("video", "audio", "image", ...)
    pub media_type: String,
    /// Page URL the item was resolved from; sent as Referer for every part
    pub url: String,
    /// Alternative streams keyed by stream id
    #[serde(default)]
    pub streams: BTreeMap<String, StreamDescriptor>,
    /// Caption tracks keyed by language
    #[serde(default)]
    pub captions: BTreeMap<String, CaptionDescriptor>,
}

/// Snapshot of a download task as shown to the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    pub id: TaskId,
    /// Media title
    pub title: String,
    /// Media type
    pub media_type: String,
    /// Source page URL
    pub url: String,
    /// Quality label of the selected stream
    pub quality: String,
    /// Human-readable size of the selected stream
    pub size: String,
    /// Total size of the selected stream in bytes
    pub total_bytes: u64,
    /// Completion percentage (0-100, truncated)
    pub percentage: u8,
}

/// Result of a download that did not fail
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// All parts fetched and merged into `output`
    Completed {
        /// Merged output file
        output: PathBuf,
    },
    /// The merged output was already present; nothing was fetched
    AlreadyExists {
        /// Existing output file
        output: PathBuf,
    },
    /// The task was cancelled before it could finish
    Cancelled,
}

/// Result of one part fetch that did not fail
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartOutcome {
    /// Bytes were fetched and the part file is in place
    Fetched {
        /// Bytes written by this call
        bytes: u64,
    },
    /// The part file already existed with the declared size
    AlreadyComplete,
    /// The task's cancellation trigger fired before the network call
    Cancelled,
}

/// Event emitted during a task's lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Byte counter advanced
    ProgressRefreshed {
        /// Task snapshot with the recomputed percentage
        task: Task,
        /// Bytes completed so far
        bytes_done: u64,
    },

    /// Task finished (merged, or output already present); percentage is 100
    DownloadDone {
        /// Final task snapshot
        task: Task,
    },

    /// Task failed with a fatal error
    DownloadFailed {
        /// Task snapshot at the time of failure
        task: Task,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },

    /// Task was cancelled and its temp files removed
    DownloadCancelled {
        /// Task identifier
        id: TaskId,
    },
}
