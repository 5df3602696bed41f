//! Upload services in front of the pipeline.
//!
//! These own admission and the metadata update; the pipeline itself never
//! touches the metadata store.

use std::sync::Arc;

use tokio::io::AsyncRead;
use vstream_models::{MediaAsset, VideoId, VideoMetadata};
use vstream_storage::{Thumbnail, ThumbnailStore};

use crate::admission::{check_thumbnail_upload, check_video_upload};
use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::logging::RunLogger;
use crate::pipeline::IngestPipeline;
use crate::repository::VideoRepository;

/// URL under which a stored thumbnail is served.
pub fn thumbnail_url(public_base_url: &str, video_id: &VideoId) -> String {
    format!(
        "{}/api/thumbnails/{}",
        public_base_url.trim_end_matches('/'),
        video_id.as_str()
    )
}

/// Video and thumbnail uploads for existing video records.
#[derive(Clone)]
pub struct UploadService {
    pipeline: IngestPipeline,
    videos: Arc<dyn VideoRepository>,
    thumbnails: Arc<dyn ThumbnailStore>,
    max_video_bytes: u64,
    max_thumbnail_bytes: u64,
    public_base_url: String,
}

impl UploadService {
    pub fn new(
        pipeline: IngestPipeline,
        videos: Arc<dyn VideoRepository>,
        thumbnails: Arc<dyn ThumbnailStore>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            pipeline,
            videos,
            thumbnails,
            max_video_bytes: config.max_video_bytes,
            max_thumbnail_bytes: config.max_thumbnail_bytes,
            public_base_url: config.public_base_url.clone(),
        }
    }

    /// Ingest a video and record its playback URL.
    ///
    /// The metadata store is updated exactly once, and only after the
    /// pipeline has published the file.
    pub async fn upload_video<R>(
        &self,
        asset: MediaAsset,
        reader: &mut R,
    ) -> IngestResult<VideoMetadata>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        check_video_upload(&asset, self.max_video_bytes)?;
        self.require_video(&asset.video_id).await?;

        let outcome = self.pipeline.run(&asset, reader).await?;

        self.videos
            .update_video_url(&asset.video_id, &outcome.location.url)
            .await
    }

    /// Store a thumbnail and record its URL.
    pub async fn upload_thumbnail(
        &self,
        video_id: &VideoId,
        content_type: &str,
        data: Vec<u8>,
    ) -> IngestResult<VideoMetadata> {
        video_id
            .validate()
            .map_err(|e| IngestError::invalid_upload(format!("Invalid video ID: {}", e)))?;
        check_thumbnail_upload(content_type, data.len() as u64, self.max_thumbnail_bytes)?;
        self.require_video(video_id).await?;

        let logger = RunLogger::new(video_id, "thumbnail_upload");
        logger.log_start(&format!("{} bytes of {}", data.len(), content_type));

        self.thumbnails
            .put(video_id, Thumbnail::new(content_type, data))
            .await?;

        let url = thumbnail_url(&self.public_base_url, video_id);
        let video = self.videos.update_thumbnail_url(video_id, &url).await?;

        logger.log_completion(&url);
        Ok(video)
    }

    /// Fetch a stored thumbnail.
    pub async fn get_thumbnail(&self, video_id: &VideoId) -> IngestResult<Thumbnail> {
        self.thumbnails
            .get(video_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("thumbnail for {}", video_id)))
    }

    async fn require_video(&self, video_id: &VideoId) -> IngestResult<VideoMetadata> {
        self.videos
            .get(video_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(video_id.to_string()))
    }
}
