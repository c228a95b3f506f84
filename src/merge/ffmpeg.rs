//! ffmpeg-backed muxer

use super::traits::{MuxMode, MuxRequest, Muxer};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Muxer that shells out to an `ffmpeg` binary
///
/// Segments go through ffmpeg's concat demuxer, tracks are mapped as
/// separate inputs. Both copy the streams without re-encoding.
///
/// # Examples
///
/// ```no_run
/// use media_dl::merge::FfmpegMuxer;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let muxer = FfmpegMuxer::new(PathBuf::from("/usr/bin/ffmpeg"));
///
/// // Or discover it on PATH
/// let muxer = FfmpegMuxer::from_path().expect("ffmpeg not found in PATH");
/// ```
pub struct FfmpegMuxer {
    binary_path: PathBuf,
}

impl FfmpegMuxer {
    /// Create a muxer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }
}

/// ffmpeg muxer name for a container extension
fn output_format(container: &str) -> &str {
    match container {
        "mkv" => "matroska",
        "m4a" => "ipod",
        "ts" => "mpegts",
        other => other,
    }
}

/// Concat demuxer script listing `inputs` in order
fn concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

/// Command-line arguments for one job
///
/// `list_file` is only consulted for [`MuxMode::Segments`].
fn build_args(request: &MuxRequest<'_>, list_file: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-loglevel".into(), "error".into()];

    match request.mode {
        MuxMode::Segments => {
            args.extend(["-f", "concat", "-safe", "0", "-i"].map(OsString::from));
            args.push(list_file.as_os_str().to_owned());
        }
        MuxMode::Tracks => {
            for input in request.inputs {
                args.push("-i".into());
                args.push(input.as_os_str().to_owned());
            }
            for index in 0..request.inputs.len() {
                args.push("-map".into());
                args.push(index.to_string().into());
            }
        }
    }

    args.extend(["-c", "copy", "-f"].map(OsString::from));
    args.push(output_format(request.container).into());
    args.push(request.output.as_os_str().to_owned());
    args
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, request: MuxRequest<'_>) -> crate::Result<()> {
        let list_file = super::with_suffix(request.output, ".concat.txt");
        if request.mode == MuxMode::Segments {
            tokio::fs::write(&list_file, concat_list(request.inputs)).await?;
        }

        let args = build_args(&request, &list_file);
        tracing::debug!(
            binary = %self.binary_path.display(),
            inputs = request.inputs.len(),
            mode = ?request.mode,
            "Running ffmpeg"
        );
        let output = Command::new(&self.binary_path).args(&args).output().await;

        if request.mode == MuxMode::Segments {
            tokio::fs::remove_file(&list_file).await.ok();
        }

        let output = output
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::Error::ExternalTool(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
