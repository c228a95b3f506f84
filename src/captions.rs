//! Caption tracks
//!
//! Captions are small, so they are fetched in one request with no resume and
//! no retry, run through their [`CaptionTransform`] and written straight to
//! `<root>/<title>.<ext>`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use reqwest::header::REFERER;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{CaptionDescriptor, CaptionTransform};
use crate::utils::output_path;

#[derive(Debug, Deserialize)]
struct JsonSubtitle {
    body: Vec<JsonCue>,
}

#[derive(Debug, Deserialize)]
struct JsonCue {
    from: f64,
    to: f64,
    content: String,
}

impl CaptionTransform {
    /// Apply the transform to raw caption bytes
    pub fn apply(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            CaptionTransform::Identity => Ok(raw),
            CaptionTransform::JsonToSrt => json_to_srt(&raw),
        }
    }
}

/// Convert a `{"body":[{"from","to","content"}]}` document to SubRip
fn json_to_srt(raw: &[u8]) -> Result<Vec<u8>> {
    let doc: JsonSubtitle = serde_json::from_slice(raw)
        .map_err(|e| Error::Caption(format!("invalid JSON subtitle: {}", e)))?;

    let mut srt = String::new();
    for (i, cue) in doc.body.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = write!(
            srt,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(cue.from),
            srt_timestamp(cue.to),
            cue.content
        );
    }
    Ok(srt.into_bytes())
}

/// `HH:MM:SS,mmm` for a position in seconds
fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms
    )
}

/// Fetch one caption track and write it next to the media
///
/// Any failure is reported as [`Error::Caption`].
pub async fn fetch_caption(
    client: &reqwest::Client,
    caption: &CaptionDescriptor,
    download_dir: &Path,
    title: &str,
) -> Result<PathBuf> {
    let caption_err = |what: &str, e: &dyn std::fmt::Display| {
        Error::Caption(format!("{} {}: {}", what, caption.url, e))
    };

    let response = client
        .get(&caption.url)
        .header(REFERER, &caption.url)
        .send()
        .await
        .map_err(|e| caption_err("request to", &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(caption_err("unexpected status from", &status));
    }

    let raw = response
        .bytes()
        .await
        .map_err(|e| caption_err("reading body of", &e))?;
    let body = caption.transform.apply(raw.to_vec())?;

    let path = output_path(download_dir, title, &caption.ext);
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| caption_err("writing caption from", &e))?;

    tracing::debug!(path = %path.display(), "Caption saved");
    Ok(path)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn timestamps_use_srt_format() {
        assert_eq!(srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(srt_timestamp(1.5), "00:00:01,500");
        assert_eq!(srt_timestamp(3725.042), "01:02:05,042");
    }

    #[test]
    fn json_subtitles_convert_to_srt() {
        let raw = br#"{"body":[
            {"from":0.5,"to":2.0,"content":"hello"},
            {"from":2.25,"to":4.0,"content":"world"}
        ]}"#;

        let srt = CaptionTransform::JsonToSrt.apply(raw.to_vec()).unwrap();

        assert_eq!(
            String::from_utf8(srt).unwrap(),
            "1\n00:00:00,500 --> 00:00:02,000\nhello\n\n\
             2\n00:00:02,250 --> 00:00:04,000\nworld\n\n"
        );
    }

    #[test]
    fn malformed_json_is_a_caption_error() {
        let err = CaptionTransform::JsonToSrt
            .apply(b"not json".to_vec())
            .unwrap_err();
        assert!(matches!(err, Error::Caption(_)));
    }

    #[test]
    fn identity_keeps_bytes() {
        let raw = b"WEBVTT\n\n".to_vec();
        assert_eq!(CaptionTransform::Identity.apply(raw.clone()).unwrap(), raw);
    }

    #[tokio::test]
    async fn fetch_writes_transformed_caption() {
        let server = MockServer::start().await;
        let url = format!("{}/sub.json", server.uri());
        Mock::given(method("GET"))
            .and(path("/sub.json"))
            .and(header("Referer", url.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"body":[{"from":1,"to":2,"content":"hi"}]}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let caption = CaptionDescriptor {
            url,
            ext: "srt".into(),
            transform: CaptionTransform::JsonToSrt,
        };

        let written = fetch_caption(&reqwest::Client::new(), &caption, dir.path(), "Clip")
            .await
            .unwrap();

        assert_eq!(written, dir.path().join("Clip.srt"));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            "1\n00:00:01,000 --> 00:00:02,000\nhi\n\n"
        );
    }

    #[tokio::test]
    async fn failed_fetch_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let caption = CaptionDescriptor {
            url: format!("{}/sub.vtt", server.uri()),
            ext: "vtt".into(),
            transform: CaptionTransform::Identity,
        };

        let err = fetch_caption(&reqwest::Client::new(), &caption, dir.path(), "Clip")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Caption(_)));
        assert!(!dir.path().join("Clip.vtt").exists());
    }
}
