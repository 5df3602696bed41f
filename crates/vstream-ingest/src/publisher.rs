//! Storage key construction and upload.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use vstream_models::encoding::VIDEO_EXTENSION;
use vstream_models::{Orientation, PublishedLocation, VideoId};
use vstream_storage::{ObjectStore, PlaybackUrlTemplate, StorageResult};

/// Storage key for a published video: `{orientation}/{video_id}.mp4`.
///
/// The orientation prefix lets consumers partition by category without
/// probing the file again.
pub fn object_key(orientation: Orientation, video_id: &VideoId) -> String {
    format!("{}/{}.{}", orientation, video_id.as_str(), VIDEO_EXTENSION)
}

/// Uploads remuxed files and builds their playback location.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    urls: PlaybackUrlTemplate,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, urls: PlaybackUrlTemplate) -> Self {
        Self { store, urls }
    }

    /// Upload `path` and return where it can be played from.
    ///
    /// Storage errors are returned as-is; retrying is the store's business.
    pub async fn publish(
        &self,
        path: &Path,
        orientation: Orientation,
        video_id: &VideoId,
        content_type: &str,
    ) -> StorageResult<PublishedLocation> {
        let key = object_key(orientation, video_id);
        self.store.put_file(&key, path, content_type).await?;

        let url = self.urls.url_for(&key);
        info!(video_id = %video_id, key = %key, "Published video");
        Ok(PublishedLocation::new(key, url))
    }
}
