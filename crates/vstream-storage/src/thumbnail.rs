//! Thumbnail storage.
//!
//! Thumbnails live in an explicitly owned store injected into whoever needs
//! it. The in-memory implementation is bounded: at most `capacity` entries
//! (least recently used evicted first) and each entry expires after `ttl`.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;
use vstream_models::VideoId;

use crate::error::StorageResult;

/// Default number of thumbnails kept in memory.
pub const DEFAULT_THUMBNAIL_CAPACITY: usize = 1024;

/// Default lifetime of an in-memory thumbnail.
pub const DEFAULT_THUMBNAIL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Thumbnail image bytes and their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Thumbnail {
    pub fn new(content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            data,
        }
    }
}

/// Thumbnail storage keyed by video.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Store or replace the thumbnail for a video.
    async fn put(&self, video_id: &VideoId, thumbnail: Thumbnail) -> StorageResult<()>;

    /// Fetch the thumbnail for a video, if present.
    async fn get(&self, video_id: &VideoId) -> StorageResult<Option<Thumbnail>>;

    /// Remove the thumbnail for a video. Returns whether one was present.
    async fn remove(&self, video_id: &VideoId) -> StorageResult<bool>;
}

struct Entry {
    thumbnail: Thumbnail,
    inserted_at: Instant,
}

/// Bounded in-process thumbnail store.
pub struct InMemoryThumbnailStore {
    entries: Mutex<LruCache<VideoId, Entry>>,
    ttl: Duration,
}

impl Default for InMemoryThumbnailStore {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_CAPACITY, DEFAULT_THUMBNAIL_TTL)
    }
}

impl InMemoryThumbnailStore {
    /// Create a store holding at most `capacity` entries (minimum 1), each
    /// living for at most `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Number of live (possibly expired but not yet purged) entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let expired: Vec<VideoId> = entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() >= self.ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            entries.pop(id);
        }
        expired.len()
    }
}

#[async_trait]
impl ThumbnailStore for InMemoryThumbnailStore {
    async fn put(&self, video_id: &VideoId, thumbnail: Thumbnail) -> StorageResult<()> {
        let mut entries = self.entries.lock().await;
        let evicted = entries.push(
            video_id.clone(),
            Entry {
                thumbnail,
                inserted_at: Instant::now(),
            },
        );

        if let Some((evicted_id, _)) = evicted {
            if &evicted_id != video_id {
                debug!(video_id = %evicted_id, "Evicted thumbnail from in-memory store");
            }
        }
        Ok(())
    }

    async fn get(&self, video_id: &VideoId) -> StorageResult<Option<Thumbnail>> {
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(video_id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Ok(Some(entry.thumbnail.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(video_id);
            debug!(video_id = %video_id, "Dropped expired thumbnail");
        }
        Ok(None)
    }

    async fn remove(&self, video_id: &VideoId) -> StorageResult<bool> {
        Ok(self.entries.lock().await.pop(video_id).is_some())
    }
}
