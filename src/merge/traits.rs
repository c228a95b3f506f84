//! Traits and types for container multiplexing

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// How the inputs of a mux relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxMode {
    /// Consecutive time segments of one presentation, joined end to end
    Segments,
    /// Separate tracks of the same presentation (e.g. video + audio), laid side by side
    Tracks,
}

/// One multiplexing job
#[derive(Debug, Clone)]
pub struct MuxRequest<'a> {
    /// Input files in part order
    pub inputs: &'a [PathBuf],
    /// File to write; may carry a temporary suffix
    pub output: &'a Path,
    /// Container extension of the final file ("mp4", "mkv", ...)
    pub container: &'a str,
    /// Relationship between the inputs
    pub mode: MuxMode,
}

/// Trait for producing one valid container file from several inputs
///
/// Implementations can drive an external binary or stand in when no tool is
/// available. The downloader picks one at construction time and calls it
/// only for streams that cannot be merged by plain concatenation.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Write `request.output` from `request.inputs`
    ///
    /// Inputs are left in place; the caller removes them after a successful
    /// merge.
    async fn mux(&self, request: MuxRequest<'_>) -> crate::Result<()>;

    /// Whether this muxer can do any work at all
    fn is_available(&self) -> bool;

    /// Name of the implementation for logging
    fn name(&self) -> &'static str;
}
