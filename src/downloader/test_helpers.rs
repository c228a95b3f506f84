//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::merge::NoOpMuxer;
use crate::types::{MediaInfo, PartDescriptor, StreamDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Helper to create a test MediaDownloader writing into a fresh temp directory.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader() -> (MediaDownloader, tempfile::TempDir) {
    create_test_downloader_with(|_| {})
}

/// Like [`create_test_downloader`], with a hook to adjust the config first.
pub(crate) fn create_test_downloader_with(
    adjust: impl FnOnce(&mut Config),
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().to_path_buf();
    config.retry.delay = Duration::from_millis(10);
    config.tools.search_path = false;
    adjust(&mut config);

    let downloader = MediaDownloader::new(config)
        .unwrap()
        .with_muxer(Arc::new(NoOpMuxer));

    (downloader, temp_dir)
}

/// Media with one `flv` stream whose parts are served at `<base>/part/<i>`
pub(crate) fn sample_media(base: &str, title: &str, part_sizes: &[u64]) -> MediaInfo {
    let parts: Vec<PartDescriptor> = part_sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| PartDescriptor {
            url: format!("{}/part/{}", base, i),
            size,
            ext: "flv".to_string(),
        })
        .collect();

    let stream = StreamDescriptor {
        id: "hd".to_string(),
        quality: "1080P".to_string(),
        size: part_sizes.iter().sum(),
        ext: "flv".to_string(),
        need_mux: false,
        parts,
    };

    MediaInfo {
        title: title.to_string(),
        media_type: "video".to_string(),
        url: format!("{}/watch", base),
        streams: BTreeMap::from([(stream.id.clone(), stream)]),
        captions: BTreeMap::new(),
    }
}

/// Deterministic body for part `index`
pub(crate) fn part_body(index: usize, size: u64) -> Vec<u8> {
    vec![b'a' + (index % 26) as u8; size as usize]
}
