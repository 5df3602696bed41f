//! Published object location.

use serde::{Deserialize, Serialize};

/// Where a published video lives in object storage.
///
/// Returned to the caller once and not retained by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedLocation {
    /// Object storage key, `{orientation}/{video_id}.mp4`
    pub key: String,
    /// Fully-qualified playback URL
    pub url: String,
}

impl PublishedLocation {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}
