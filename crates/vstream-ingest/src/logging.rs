//! Structured run logging.
//!
//! Every event carries `video_id` and `operation`. Events emitted while a
//! pipeline run is in flight also carry the run's `state`, and failures carry
//! the failed `stage` plus any captured tool diagnostics.

use tracing::{debug, error, info, warn, Span};
use vstream_models::VideoId;

use crate::error::IngestError;
use crate::pipeline::RunState;

/// Logger for one ingest run or upload operation.
#[derive(Debug, Clone)]
pub struct RunLogger {
    video_id: String,
    operation: &'static str,
}

impl RunLogger {
    /// Create a logger for `video_id`; `operation` names the kind of work,
    /// e.g. `"video_ingest"` or `"thumbnail_upload"`.
    pub fn new(video_id: &VideoId, operation: &'static str) -> Self {
        Self {
            video_id: video_id.to_string(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, state: RunState, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = self.operation,
            state = %state,
            "Run progress: {}", message
        );
    }

    /// One step of the run state machine.
    pub fn log_transition(&self, from: RunState, to: RunState) {
        debug!(
            video_id = %self.video_id,
            operation = self.operation,
            from = %from,
            to = %to,
            "Ingest state transition"
        );
    }

    /// Failure of a run that had reached `state`.
    ///
    /// Rejected input is a warning; stage failures are errors and carry the
    /// stage name and tool stderr when there is one.
    pub fn log_failure(&self, state: RunState, err: &IngestError) {
        match err.stage() {
            Some(stage) => error!(
                video_id = %self.video_id,
                operation = self.operation,
                state = %state,
                stage = stage.as_str(),
                diagnostics = err.diagnostics().unwrap_or(""),
                "Run failed: {}", err
            ),
            None if err.is_client_error() => warn!(
                video_id = %self.video_id,
                operation = self.operation,
                state = %state,
                "Run rejected: {}", err
            ),
            None => error!(
                video_id = %self.video_id,
                operation = self.operation,
                state = %state,
                "Run failed: {}", err
            ),
        }
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = self.operation,
            "Run completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span wrapping one pipeline run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "ingest_run",
            video_id = %self.video_id,
            operation = self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineStage;
    use vstream_media::MediaError;

    #[test]
    fn test_run_logger_creation() {
        let logger = RunLogger::new(&VideoId::from("abc123"), "video_ingest");

        assert_eq!(logger.video_id(), "abc123");
        assert_eq!(logger.operation(), "video_ingest");
    }

    #[test]
    fn test_log_failure_for_each_error_kind() {
        let logger = RunLogger::new(&VideoId::from("abc123"), "video_ingest");
        let failed = RunState::Failed {
            at: PipelineStage::Remux,
        };

        logger.log_transition(RunState::Probed, RunState::Classified);
        logger.log_failure(
            failed,
            &IngestError::remux_failed(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid data found when processing input".to_string()),
                Some(1),
            )),
        );
        logger.log_failure(
            RunState::Received,
            &IngestError::invalid_upload("Video file is too large"),
        );
        logger.log_failure(RunState::Received, &IngestError::metadata("connection refused"));
    }
}
