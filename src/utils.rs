//! File naming and size helpers

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Suffix of a part file that is still being fetched
pub const TEMP_SUFFIX: &str = ".download";

/// Characters that cannot appear in a file name on at least one supported platform
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make a media title safe to use as a file name
///
/// Reserved characters and control characters become `-`, surrounding
/// whitespace and trailing dots are dropped. An empty result falls back to
/// `"download"`.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if RESERVED_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<dir>/<title>.<ext>`: merged output and caption files
pub fn output_path(dir: &Path, title: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", sanitize_file_name(title), ext))
}

/// `<dir>/<title>[<index>].<ext>`: one part of a stream
pub fn part_path(dir: &Path, title: &str, index: usize, ext: &str) -> PathBuf {
    dir.join(format!("{}[{}].{}", sanitize_file_name(title), index, ext))
}

/// Sibling path with [`TEMP_SUFFIX`] appended
pub fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(TEMP_SUFFIX);
    PathBuf::from(os)
}

/// Size of the file at `path`, or `None` if it does not exist
pub async fn file_size(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Human-readable size in mebibytes with two decimals
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MiB", bytes as f64 / (1024.0 * 1024.0))
}
