//! Upload admission checks.
//!
//! The pipeline assumes its input was already vetted; these checks run in
//! front of it.

use vstream_models::encoding::VIDEO_CONTENT_TYPE;
use vstream_models::MediaAsset;

use crate::error::{IngestError, IngestResult};

/// Accept a video upload: `video/mp4`, non-empty, at most `max_bytes`, with a
/// path-safe identifier.
pub fn check_video_upload(asset: &MediaAsset, max_bytes: u64) -> IngestResult<()> {
    asset
        .video_id
        .validate()
        .map_err(|e| IngestError::invalid_upload(format!("Invalid video ID: {}", e)))?;

    if asset.size == 0 {
        return Err(IngestError::invalid_upload("No video file provided"));
    }

    if asset.size > max_bytes {
        return Err(IngestError::invalid_upload("Video file is too large"));
    }

    if asset.content_type != VIDEO_CONTENT_TYPE {
        return Err(IngestError::invalid_upload(format!(
            "Unsupported file type for video: {}",
            asset.content_type
        )));
    }

    Ok(())
}

/// Accept a thumbnail upload: any `image/*` type, non-empty, at most `max_bytes`.
pub fn check_thumbnail_upload(content_type: &str, size: u64, max_bytes: u64) -> IngestResult<()> {
    if size == 0 {
        return Err(IngestError::invalid_upload("No thumbnail file provided"));
    }

    if size > max_bytes {
        return Err(IngestError::invalid_upload("Thumbnail file is too large"));
    }

    let is_image = content_type
        .split_once('/')
        .is_some_and(|(kind, sub)| kind == "image" && !sub.is_empty());
    if !is_image {
        return Err(IngestError::invalid_upload(format!(
            "Unsupported file type for thumbnail: {}",
            content_type
        )));
    }

    Ok(())
}
