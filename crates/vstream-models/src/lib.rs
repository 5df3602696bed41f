//! Shared data models for the VStream ingest path.
//!
//! This crate provides Serde-serializable types for:
//! - Video identity and metadata records
//! - Stream geometry and orientation bucketing
//! - Published object locations
//! - Container and upload constants

pub mod encoding;
pub mod location;
pub mod orientation;
pub mod video;

// Re-export common types
pub use location::PublishedLocation;
pub use orientation::{classify, Geometry, Orientation, OrientationParseError};
pub use video::{MediaAsset, VideoId, VideoIdError, VideoMetadata};
