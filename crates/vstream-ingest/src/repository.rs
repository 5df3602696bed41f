//! Video metadata persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vstream_models::{VideoId, VideoMetadata};

use crate::error::{IngestError, IngestResult};

/// Metadata store for video records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, video_id: &VideoId) -> IngestResult<Option<VideoMetadata>>;

    /// Set the playback URL. Fails with `NotFound` for an unknown video.
    async fn update_video_url(&self, video_id: &VideoId, url: &str) -> IngestResult<VideoMetadata>;

    /// Set the thumbnail URL. Fails with `NotFound` for an unknown video.
    async fn update_thumbnail_url(
        &self,
        video_id: &VideoId,
        url: &str,
    ) -> IngestResult<VideoMetadata>;
}

/// Process-local repository, for tests and single-node tooling.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<VideoId, VideoMetadata>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn insert(&self, video: VideoMetadata) {
        self.videos
            .write()
            .await
            .insert(video.video_id.clone(), video);
    }

    async fn modify<F>(&self, video_id: &VideoId, f: F) -> IngestResult<VideoMetadata>
    where
        F: FnOnce(&mut VideoMetadata) + Send,
    {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(video_id)
            .ok_or_else(|| IngestError::NotFound(video_id.to_string()))?;
        f(video);
        Ok(video.clone())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, video_id: &VideoId) -> IngestResult<Option<VideoMetadata>> {
        Ok(self.videos.read().await.get(video_id).cloned())
    }

    async fn update_video_url(&self, video_id: &VideoId, url: &str) -> IngestResult<VideoMetadata> {
        self.modify(video_id, |video| video.set_video_url(url)).await
    }

    async fn update_thumbnail_url(
        &self,
        video_id: &VideoId,
        url: &str,
    ) -> IngestResult<VideoMetadata> {
        self.modify(video_id, |video| video.set_thumbnail_url(url))
            .await
    }
}
