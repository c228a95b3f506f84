//! Link resolution and the resolved-media map.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::selector::sorted_streams;
use crate::types::{MediaInfo, Task, TaskId};
use crate::utils::format_size;

use super::MediaDownloader;

/// Task snapshot for freshly resolved media, described by its best stream
fn task_for(id: TaskId, info: &MediaInfo) -> Task {
    let best = sorted_streams(&info.streams).into_iter().next();
    Task {
        id,
        title: info.title.clone(),
        media_type: info.media_type.clone(),
        url: info.url.clone(),
        quality: best.map(|s| s.quality.clone()).unwrap_or_default(),
        size: format_size(best.map_or(0, |s| s.size)),
        total_bytes: best.map_or(0, |s| s.size),
        percentage: 0,
    }
}

impl MediaDownloader {
    /// Resolve `url` with the configured extractor
    ///
    /// Every media item found becomes a task with a fresh id; the returned
    /// snapshots can be passed straight to [`MediaDownloader::download`].
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] when no extractor was configured, otherwise
    /// whatever the extractor reports.
    pub async fn resolve(&self, url: &str) -> Result<Vec<Task>> {
        let extractor = self.extractor.as_ref().ok_or_else(|| {
            Error::NotSupported(
                "resolving links requires an extractor; use MediaDownloader::with_extractor"
                    .into(),
            )
        })?;

        let infos = extractor.extract(url).await?;
        tracing::info!(url, items = infos.len(), "Link resolved");

        let mut tasks = Vec::with_capacity(infos.len());
        for info in infos {
            tasks.push(self.register_media(info).await);
        }
        Ok(tasks)
    }

    /// Register media resolved outside the downloader and get its task
    pub async fn register_media(&self, info: MediaInfo) -> Task {
        let id = TaskId::new();
        let task = task_for(id, &info);
        tracing::debug!(
            task_id = %id,
            title = %task.title,
            quality = %task.quality,
            size = %task.size,
            "Media registered"
        );
        self.registries.media.write().await.insert(id, Arc::new(info));
        task
    }

    /// Resolved media registered under `id`
    pub async fn media(&self, id: TaskId) -> Option<Arc<MediaInfo>> {
        self.registries.media.read().await.get(&id).cloned()
    }

    /// Forget the media registered under `id`; returns whether it was known
    ///
    /// A running download keeps its own copy and is not affected.
    pub async fn remove_media(&self, id: TaskId) -> bool {
        self.registries.media.write().await.remove(&id).is_some()
    }
}
