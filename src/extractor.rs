//! Resolver seam
//!
//! Turning a page URL into [`MediaInfo`] records is site-specific and lives
//! outside this crate. Hosts plug their resolver in through [`Extractor`];
//! hosts that resolve media elsewhere can skip it and call
//! [`MediaDownloader::register_media`](crate::MediaDownloader::register_media).

use async_trait::async_trait;

use crate::types::MediaInfo;

/// Trait for turning a link into downloadable media descriptions
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use media_dl::extractor::Extractor;
/// use media_dl::MediaInfo;
///
/// struct Fixed(MediaInfo);
///
/// #[async_trait]
/// impl Extractor for Fixed {
///     async fn extract(&self, _url: &str) -> media_dl::Result<Vec<MediaInfo>> {
///         Ok(vec![self.0.clone()])
///     }
/// }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Resolve `url` into one record per media item found on the page
    ///
    /// Failures should be reported as [`crate::Error::Extractor`].
    async fn extract(&self, url: &str) -> crate::Result<Vec<MediaInfo>>;
}
