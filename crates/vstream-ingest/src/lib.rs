//! Video upload ingest.
//!
//! This crate provides:
//! - Staging of uploaded payloads to local disk
//! - Geometry probe, orientation classification and fast-start remux
//! - Publishing to object storage under an orientation-prefixed key
//! - Guaranteed cleanup of every local file a run creates
//! - Upload admission, metadata updates and thumbnail storage

pub mod admission;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod publisher;
pub mod repository;
pub mod service;
pub mod stager;

pub use config::IngestConfig;
pub use error::{IngestError, IngestResult, PipelineStage, StageCause};
pub use logging::RunLogger;
pub use pipeline::{IngestOutcome, IngestPipeline, RunState};
pub use publisher::{object_key, Publisher};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use service::{thumbnail_url, UploadService};
pub use stager::{RunArtifacts, StagedFile, Stager};
