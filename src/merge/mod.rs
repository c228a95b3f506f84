//! Merging fetched parts into the final output
//!
//! Streams whose parts are plain byte segments are concatenated in part
//! order. Streams that need a real container (mp4 output, or separate tracks
//! flagged `need_mux`) go through a [`Muxer`]:
//!
//! - [`FfmpegMuxer`]: drives an external `ffmpeg` binary
//! - [`NoOpMuxer`]: stand-in when ffmpeg is unavailable
//!
//! Either way the result is written to `<output>.download` first and renamed
//! into place, so an interrupted merge never looks like a finished file.
//! Part files are removed once the merge succeeded.

mod ffmpeg;
mod noop;
mod traits;

pub use ffmpeg::FfmpegMuxer;
pub use noop::NoOpMuxer;
pub use traits::{MuxMode, MuxRequest, Muxer};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::types::StreamDescriptor;
use crate::utils::temp_path;

/// Container extension that always goes through the muxer
pub const MUX_CONTAINER: &str = "mp4";

/// How a stream's parts become one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePlan {
    /// Byte-for-byte concatenation in part order
    Concat,
    /// Container multiplexing
    Mux(MuxMode),
}

impl MergePlan {
    /// Plan for `stream`
    pub fn for_stream(stream: &StreamDescriptor) -> Self {
        if stream.need_mux {
            MergePlan::Mux(MuxMode::Tracks)
        } else if stream.ext == MUX_CONTAINER {
            MergePlan::Mux(MuxMode::Segments)
        } else {
            MergePlan::Concat
        }
    }
}

/// Sibling path with `suffix` appended to the full file name
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Pick the muxer the tool settings allow
///
/// An explicit `ffmpeg_path` wins; otherwise PATH is searched when
/// `search_path` is set. Falls back to [`NoOpMuxer`].
pub fn muxer_from_config(tools: &ToolsConfig) -> Arc<dyn Muxer> {
    let muxer: Arc<dyn Muxer> = if let Some(ref ffmpeg_path) = tools.ffmpeg_path {
        Arc::new(FfmpegMuxer::new(ffmpeg_path.clone()))
    } else if tools.search_path {
        FfmpegMuxer::from_path()
            .map(|m| Arc::new(m) as Arc<dyn Muxer>)
            .unwrap_or_else(|| Arc::new(NoOpMuxer))
    } else {
        Arc::new(NoOpMuxer)
    };

    tracing::info!(
        muxer = muxer.name(),
        available = muxer.is_available(),
        "Muxer initialized"
    );
    muxer
}

/// Concatenate `parts` in order into `output`
async fn concat_parts(parts: &[PathBuf], output: &Path) -> Result<()> {
    let mut out = tokio::fs::File::create(output).await?;
    for part in parts {
        let mut input = tokio::fs::File::open(part).await.map_err(|e| {
            Error::Merge(format!("cannot open part {}: {}", part.display(), e))
        })?;
        tokio::io::copy(&mut input, &mut out).await?;
    }
    out.flush().await?;
    Ok(())
}

/// Merges a completed stream's parts into its output file
#[derive(Clone)]
pub struct Finalizer {
    muxer: Arc<dyn Muxer>,
}

impl Finalizer {
    /// Finalizer that hands container merges to `muxer`
    pub fn new(muxer: Arc<dyn Muxer>) -> Self {
        Self { muxer }
    }

    /// Merge `parts` (in part order) for `stream` into `output`
    ///
    /// On failure the partially written output is removed and the parts are
    /// kept, so a rerun can merge again without fetching anything.
    pub async fn finalize(
        &self,
        stream: &StreamDescriptor,
        parts: &[PathBuf],
        output: &Path,
    ) -> Result<PathBuf> {
        let staging = temp_path(output);
        let plan = MergePlan::for_stream(stream);

        tracing::debug!(
            output = %output.display(),
            parts = parts.len(),
            plan = ?plan,
            "Merging parts"
        );

        let merged = match plan {
            MergePlan::Concat => concat_parts(parts, &staging).await,
            MergePlan::Mux(mode) => {
                self.muxer
                    .mux(MuxRequest {
                        inputs: parts,
                        output: &staging,
                        container: &stream.ext,
                        mode,
                    })
                    .await
            }
        };

        if let Err(e) = merged {
            tokio::fs::remove_file(&staging).await.ok();
            return Err(e);
        }

        tokio::fs::rename(&staging, output).await?;

        for part in parts {
            if let Err(e) = tokio::fs::remove_file(part).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %part.display(), error = %e, "Failed to remove part file");
            }
        }

        tracing::info!(output = %output.display(), "Merge complete");
        Ok(output.to_path_buf())
    }
}
