//! Ingest configuration.

use std::path::PathBuf;
use std::time::Duration;

use vstream_media::{DEFAULT_FFMPEG_BIN, DEFAULT_FFPROBE_BIN};
use vstream_models::encoding::{MAX_THUMBNAIL_UPLOAD_SIZE, MAX_VIDEO_UPLOAD_SIZE};
use vstream_storage::thumbnail::{DEFAULT_THUMBNAIL_CAPACITY, DEFAULT_THUMBNAIL_TTL};

use crate::error::{IngestError, IngestResult};

/// Ingest configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory for staged and remuxed files
    pub work_dir: PathBuf,
    /// Probing binary
    pub ffprobe_bin: String,
    /// Transcoding binary
    pub ffmpeg_bin: String,
    /// Largest accepted video upload in bytes
    pub max_video_bytes: u64,
    /// Largest accepted thumbnail upload in bytes
    pub max_thumbnail_bytes: u64,
    /// Base URL under which thumbnails are served
    pub public_base_url: String,
    /// In-memory thumbnail store capacity (entries)
    pub thumbnail_cache_capacity: usize,
    /// In-memory thumbnail lifetime
    pub thumbnail_cache_ttl: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vstream"),
            ffprobe_bin: DEFAULT_FFPROBE_BIN.to_string(),
            ffmpeg_bin: DEFAULT_FFMPEG_BIN.to_string(),
            max_video_bytes: MAX_VIDEO_UPLOAD_SIZE,
            max_thumbnail_bytes: MAX_THUMBNAIL_UPLOAD_SIZE,
            public_base_url: "http://localhost:8091".to_string(),
            thumbnail_cache_capacity: DEFAULT_THUMBNAIL_CAPACITY,
            thumbnail_cache_ttl: DEFAULT_THUMBNAIL_TTL,
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup, falling back to
    /// defaults for anything missing or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            work_dir: lookup("INGEST_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffprobe_bin: lookup("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            ffmpeg_bin: lookup("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            max_video_bytes: lookup("MAX_VIDEO_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_video_bytes),
            max_thumbnail_bytes: lookup("MAX_THUMBNAIL_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_thumbnail_bytes),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            thumbnail_cache_capacity: lookup("THUMBNAIL_CACHE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.thumbnail_cache_capacity),
            thumbnail_cache_ttl: lookup("THUMBNAIL_CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.thumbnail_cache_ttl),
        }
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> IngestResult<()> {
        if self.ffprobe_bin.is_empty() || self.ffmpeg_bin.is_empty() {
            return Err(IngestError::config_error("FFPROBE_BIN and FFMPEG_BIN must not be empty"));
        }
        if self.max_video_bytes == 0 || self.max_thumbnail_bytes == 0 {
            return Err(IngestError::config_error("upload size limits must be positive"));
        }
        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(IngestError::config_error(format!(
                "PUBLIC_BASE_URL must be an http(s) URL, got {}",
                self.public_base_url
            )));
        }
        Ok(())
    }
}
