//! Test fixtures: mock media hosts, media descriptions and downloaders

use async_trait::async_trait;
use media_dl::{
    Config, Extractor, MediaDownloader, MediaInfo, NoOpMuxer, PartDescriptor, StreamDescriptor,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Deterministic content of part `index`
pub fn part_body(index: usize, size: u64) -> Vec<u8> {
    (0..size)
        .map(|offset| (index as u64 * 31 + offset) as u8)
        .collect()
}

/// Concatenation of the bodies for `sizes`, i.e. the expected merged file
pub fn merged_body(sizes: &[u64]) -> Vec<u8> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(index, &size)| part_body(index, size))
        .collect()
}

/// Serve `sizes.len()` parts at `/media/<title>/<index>`, each after `delay`
pub async fn mount_parts(server: &MockServer, title: &str, sizes: &[u64], delay: Duration) {
    for (index, &size) in sizes.iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/media/{}/{}", title, index)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(part_body(index, size))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }
}

/// One-stream media whose parts are served by [`mount_parts`]
pub fn media(server: &MockServer, title: &str, ext: &str, sizes: &[u64]) -> MediaInfo {
    let parts = sizes
        .iter()
        .enumerate()
        .map(|(index, &size)| PartDescriptor {
            url: format!("{}/media/{}/{}", server.uri(), title, index),
            size,
            ext: ext.to_string(),
        })
        .collect();

    let stream = StreamDescriptor {
        id: "best".to_string(),
        quality: "1080P".to_string(),
        size: sizes.iter().sum(),
        ext: ext.to_string(),
        need_mux: false,
        parts,
    };

    MediaInfo {
        title: title.to_string(),
        media_type: "video".to_string(),
        url: format!("{}/watch/{}", server.uri(), title),
        streams: BTreeMap::from([(stream.id.clone(), stream)]),
        captions: BTreeMap::new(),
    }
}

/// Extractor that returns a fixed list for every link
pub struct StaticExtractor(pub Vec<MediaInfo>);

#[async_trait]
impl Extractor for StaticExtractor {
    async fn extract(&self, _url: &str) -> media_dl::Result<Vec<MediaInfo>> {
        Ok(self.0.clone())
    }
}

/// Downloader writing into a fresh temp directory, without ffmpeg
///
/// Retries are kept fast; `adjust` can change anything else.
pub fn create_downloader(adjust: impl FnOnce(&mut Config)) -> (MediaDownloader, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();

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

/// Install a test subscriber once so `RUST_LOG` shows engine logs
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
