//! Container and upload constants shared by the ingest path.

/// The only video container accepted for ingest.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Extension used for staged files and storage keys.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Suffix appended to a staged path to name its remuxed sibling.
pub const REMUXED_SUFFIX: &str = ".processed.mp4";

/// Container format passed to ffmpeg when remuxing.
pub const REMUX_CONTAINER_FORMAT: &str = "mp4";

/// Upper bound for a video upload (1 GiB).
pub const MAX_VIDEO_UPLOAD_SIZE: u64 = 1 << 30;

/// Upper bound for a thumbnail upload (10 MiB).
pub const MAX_THUMBNAIL_UPLOAD_SIZE: u64 = 10 << 20;
