//! Ingest error types.

use std::fmt;

use thiserror::Error;
use vstream_media::MediaError;
use vstream_storage::StorageError;

pub type IngestResult<T> = Result<T, IngestError>;

/// Pipeline stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Writing the incoming payload to local disk
    Stage,
    /// Reading stream geometry with ffprobe
    Probe,
    /// Fast-start remux with ffmpeg
    Remux,
    /// Uploading to object storage
    Publish,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Stage => "stage",
            PipelineStage::Probe => "probe",
            PipelineStage::Remux => "remux",
            PipelineStage::Publish => "publish",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Underlying failure of a pipeline stage.
#[derive(Debug, Error)]
pub enum StageCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{stage} stage failed: {cause}")]
    StageFailed {
        stage: PipelineStage,
        #[source]
        cause: StageCause,
    },

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    /// Failure inside a [`VideoRepository`](crate::repository::VideoRepository) backend
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IngestError {
    pub fn stage_failed(stage: PipelineStage, cause: impl Into<StageCause>) -> Self {
        Self::StageFailed {
            stage,
            cause: cause.into(),
        }
    }

    pub fn stage_write_failed(err: std::io::Error) -> Self {
        Self::stage_failed(PipelineStage::Stage, err)
    }

    pub fn probe_failed(err: MediaError) -> Self {
        Self::stage_failed(PipelineStage::Probe, err)
    }

    pub fn remux_failed(err: MediaError) -> Self {
        Self::stage_failed(PipelineStage::Remux, err)
    }

    pub fn publish_failed(err: StorageError) -> Self {
        Self::stage_failed(PipelineStage::Publish, err)
    }

    pub fn invalid_upload(msg: impl Into<String>) -> Self {
        Self::InvalidUpload(msg.into())
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Stage at which the pipeline failed, if this is a pipeline failure.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            IngestError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Captured tool diagnostics for probe/remux failures.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            IngestError::StageFailed {
                cause: StageCause::Media(e),
                ..
            } => e.stderr(),
            _ => None,
        }
    }

    pub fn is_stage_write_failed(&self) -> bool {
        self.stage() == Some(PipelineStage::Stage)
    }

    pub fn is_probe_failed(&self) -> bool {
        self.stage() == Some(PipelineStage::Probe)
    }

    pub fn is_remux_failed(&self) -> bool {
        self.stage() == Some(PipelineStage::Remux)
    }

    pub fn is_publish_failed(&self) -> bool {
        self.stage() == Some(PipelineStage::Publish)
    }

    /// Whether the caller supplied something unacceptable.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::InvalidUpload(_) | IngestError::NotFound(_))
            || self.is_probe_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_display_and_predicates() {
        let err = IngestError::probe_failed(MediaError::ffprobe_failed(
            "ffprobe exited with Some(1)",
            Some("moov atom not found".to_string()),
        ));

        assert_eq!(err.stage(), Some(PipelineStage::Probe));
        assert!(err.is_probe_failed());
        assert!(!err.is_remux_failed());
        assert_eq!(err.diagnostics(), Some("moov atom not found"));
        assert!(err.to_string().starts_with("probe stage failed:"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_non_pipeline_errors_have_no_stage() {
        let err = IngestError::invalid_upload("Video file is too large");
        assert_eq!(err.stage(), None);
        assert!(err.is_client_error());

        let err = IngestError::publish_failed(StorageError::upload_failed("timeout"));
        assert!(err.is_publish_failed());
        assert!(!err.is_client_error());
        assert!(err.diagnostics().is_none());
    }
}
