//! Object storage for published videos and thumbnails.
//!
//! This crate provides:
//! - The `ObjectStore` abstraction used by the ingest publisher
//! - An S3 implementation (AWS or any S3-compatible endpoint)
//! - Playback URL construction
//! - A bounded in-memory thumbnail store

pub mod client;
pub mod error;
pub mod store;
pub mod thumbnail;
pub mod url;

pub use client::{S3Client, S3Config, StaticCredentials};
pub use error::{StorageError, StorageResult};
pub use store::ObjectStore;
pub use thumbnail::{InMemoryThumbnailStore, Thumbnail, ThumbnailStore};
pub use url::PlaybackUrlTemplate;
