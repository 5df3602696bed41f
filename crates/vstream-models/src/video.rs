//! Video identity and metadata models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Maximum accepted length of a caller-supplied video identifier.
pub const MAX_VIDEO_ID_LEN: usize = 128;

/// Errors produced when validating a caller-supplied identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoIdError {
    #[error("video ID is empty")]
    Empty,

    #[error("video ID exceeds {} characters", MAX_VIDEO_ID_LEN)]
    TooLong,

    #[error("video ID contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Unique identifier for an uploaded video.
///
/// The identifier becomes both a local file name and a storage key segment,
/// so [`VideoId::parse`] only admits `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string without validation.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Create from an untrusted string, rejecting anything that is not safe
    /// to embed in a path or object key.
    pub fn parse(s: impl Into<String>) -> Result<Self, VideoIdError> {
        let id = Self(s.into());
        id.validate()?;
        Ok(id)
    }

    /// Check that the identifier is path and key safe.
    pub fn validate(&self) -> Result<(), VideoIdError> {
        if self.0.is_empty() {
            return Err(VideoIdError::Empty);
        }
        if self.0.chars().count() > MAX_VIDEO_ID_LEN {
            return Err(VideoIdError::TooLong);
        }
        if let Some(c) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(VideoIdError::InvalidCharacter(c));
        }
        Ok(())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An incoming upload as seen by one pipeline run.
///
/// Created at request admission and dropped when the run returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Caller-supplied identifier, unique for the duration of processing
    pub video_id: VideoId,
    /// Original byte length as declared by the caller
    pub size: u64,
    /// Declared MIME type
    pub content_type: String,
}

impl MediaAsset {
    pub fn new(video_id: VideoId, size: u64, content_type: impl Into<String>) -> Self {
        Self {
            video_id,
            size,
            content_type: content_type.into(),
        }
    }
}

/// Persisted video record, owned by the metadata collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Unique video ID
    pub video_id: VideoId,

    /// User ID (owner)
    pub user_id: String,

    /// Video title
    pub title: String,

    /// Playback URL, set once the ingest pipeline has published the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Thumbnail URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl VideoMetadata {
    /// Create a new record with no media attached yet.
    pub fn new(video_id: VideoId, user_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            user_id: user_id.into(),
            title: title.into(),
            video_url: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the published playback URL.
    pub fn set_video_url(&mut self, url: impl Into<String>) {
        self.video_url = Some(url.into());
        self.updated_at = Utc::now();
    }

    /// Attach a thumbnail URL.
    pub fn set_thumbnail_url(&mut self, url: impl Into<String>) {
        self.thumbnail_url = Some(url.into());
        self.updated_at = Utc::now();
    }
}
