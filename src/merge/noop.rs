//! No-op muxer for hosts without ffmpeg

use super::traits::{MuxRequest, Muxer};
use async_trait::async_trait;

/// Muxer used when no ffmpeg binary is configured or found
///
/// Streams that only need concatenation still download normally; anything
/// that needs a real container merge fails with `Error::NotSupported`.
///
/// # Examples
///
/// ```
/// use media_dl::merge::{MuxMode, MuxRequest, Muxer, NoOpMuxer};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() {
/// let inputs = vec![PathBuf::from("a.mp4")];
/// let result = NoOpMuxer
///     .mux(MuxRequest {
///         inputs: &inputs,
///         output: Path::new("out.mp4"),
///         container: "mp4",
///         mode: MuxMode::Segments,
///     })
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpMuxer;

#[async_trait]
impl Muxer for NoOpMuxer {
    async fn mux(&self, request: MuxRequest<'_>) -> crate::Result<()> {
        Err(crate::Error::NotSupported(format!(
            "merging into {} requires ffmpeg. \
             Configure ffmpeg_path in config or ensure ffmpeg is in PATH.",
            request.container
        )))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
