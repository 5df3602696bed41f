//! Upload service: admission, metadata updates and thumbnails.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use vstream_ingest::{
    IngestError, IngestResult, InMemoryVideoRepository, UploadService, VideoRepository,
};
use vstream_models::{MediaAsset, VideoId, VideoMetadata};
use vstream_storage::InMemoryThumbnailStore;

use common::{leftover_files, pipeline, test_config, FakeStore, FakeTools};

/// Counts playback URL updates on top of the in-memory repository.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryVideoRepository,
    video_url_updates: AtomicUsize,
}

#[async_trait]
impl VideoRepository for CountingRepository {
    async fn get(&self, video_id: &VideoId) -> IngestResult<Option<VideoMetadata>> {
        self.inner.get(video_id).await
    }

    async fn update_video_url(&self, video_id: &VideoId, url: &str) -> IngestResult<VideoMetadata> {
        self.video_url_updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_video_url(video_id, url).await
    }

    async fn update_thumbnail_url(
        &self,
        video_id: &VideoId,
        url: &str,
    ) -> IngestResult<VideoMetadata> {
        self.inner.update_thumbnail_url(video_id, url).await
    }
}

struct Harness {
    dir: TempDir,
    tools: Arc<FakeTools>,
    store: Arc<FakeStore>,
    videos: Arc<CountingRepository>,
    service: UploadService,
}

async fn harness(tools: FakeTools, store: FakeStore) -> Harness {
    harness_with_limit(tools, store, None).await
}

async fn harness_with_limit(
    tools: FakeTools,
    store: FakeStore,
    max_video_bytes: Option<u64>,
) -> Harness {
    let dir = TempDir::new().unwrap();
    let tools = Arc::new(tools);
    let store = Arc::new(store);
    let videos = Arc::new(CountingRepository::default());
    videos
        .inner
        .insert(VideoMetadata::new(VideoId::from("abc123"), "user1", "Boots"))
        .await;

    let mut config = test_config(dir.path());
    if let Some(max) = max_video_bytes {
        config.max_video_bytes = max;
    }

    let service = UploadService::new(
        pipeline(dir.path(), tools.clone(), store.clone())
            .with_max_video_bytes(config.max_video_bytes),
        videos.clone(),
        Arc::new(InMemoryThumbnailStore::default()),
        &config,
    );

    Harness {
        dir,
        tools,
        store,
        videos,
        service,
    }
}

fn mp4(id: &str, payload: &[u8]) -> MediaAsset {
    MediaAsset::new(VideoId::from(id), payload.len() as u64, "video/mp4")
}

#[tokio::test]
async fn test_upload_video_records_url_once() {
    let h = harness(FakeTools::portrait(), FakeStore::default()).await;
    let payload = b"portrait".to_vec();

    let video = h
        .service
        .upload_video(mp4("abc123", &payload), &mut payload.as_slice())
        .await
        .unwrap();

    assert_eq!(
        video.video_url.as_deref(),
        Some("https://tubes.s3.us-east-1.amazonaws.com/portrait/abc123.mp4")
    );
    assert_eq!(h.videos.video_url_updates.load(Ordering::SeqCst), 1);
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_failed_run_leaves_metadata_untouched() {
    let h = harness(FakeTools::portrait(), FakeStore::failing()).await;

    let err = h
        .service
        .upload_video(mp4("abc123", b"x"), &mut &b"x"[..])
        .await
        .unwrap_err();

    assert!(err.is_publish_failed());
    assert_eq!(h.videos.video_url_updates.load(Ordering::SeqCst), 0);
    let stored = h.videos.get(&VideoId::from("abc123")).await.unwrap().unwrap();
    assert!(stored.video_url.is_none());
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_unknown_video_is_rejected_before_staging() {
    let h = harness(FakeTools::portrait(), FakeStore::default()).await;

    let err = h
        .service
        .upload_video(mp4("missing", b"x"), &mut &b"x"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::NotFound(_)));
    assert!(h.tools.calls().is_empty());
    assert!(leftover_files(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected() {
    let h = harness(FakeTools::portrait(), FakeStore::default()).await;
    let asset = MediaAsset::new(VideoId::from("abc123"), 1, "video/webm");

    let err = h
        .service
        .upload_video(asset, &mut &b"x"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::InvalidUpload(_)));
    assert!(err.is_client_error());
    assert!(h.tools.calls().is_empty());
    assert!(h.store.uploads().is_empty());
}

#[tokio::test]
async fn test_thumbnail_upload_and_fetch() {
    let h = harness(FakeTools::portrait(), FakeStore::default()).await;
    let id = VideoId::from("abc123");

    let video = h
        .service
        .upload_thumbnail(&id, "image/png", vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();
    assert_eq!(
        video.thumbnail_url.as_deref(),
        Some("http://localhost:8091/api/thumbnails/abc123")
    );

    let thumbnail = h.service.get_thumbnail(&id).await.unwrap();
    assert_eq!(thumbnail.content_type, "image/png");
    assert_eq!(thumbnail.data, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_thumbnail_rejections() {
    let h = harness(FakeTools::portrait(), FakeStore::default()).await;

    let err = h
        .service
        .upload_thumbnail(&VideoId::from("abc123"), "application/pdf", vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidUpload(_)));

    let err = h
        .service
        .upload_thumbnail(&VideoId::from("missing"), "image/png", vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NotFound(_)));

    let err = h
        .service
        .get_thumbnail(&VideoId::from("abc123"))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NotFound(_)));
}

#[tokio::test]
async fn test_oversized_stream_with_small_declared_size_is_rejected() {
    let h = harness_with_limit(FakeTools::portrait(), FakeStore::default(), Some(16)).await;
    let payload = vec![0u8; 1 << 20];

    let err = h
        .service
        .upload_video(mp4("abc123", b"x"), &mut payload.as_slice())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::InvalidUpload(_)));
    assert!(h.tools.calls().is_empty());
    assert!(h.store.uploads().is_empty());
    assert_eq!(h.videos.video_url_updates.load(Ordering::SeqCst), 0);
    assert!(leftover_files(h.dir.path()).is_empty());
}
