//! Ingest pipeline orchestration.
//!
//! One run moves strictly forward through
//! `Received -> Staged -> Probed -> Classified -> Remuxed -> Published -> Cleaned`,
//! or jumps to `Failed` from any non-terminal state. Every stage runs at most
//! once and nothing is retried. Local files are removed before the run's
//! result is handed back, whichever way it ended.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, Instrument};

use vstream_media::{remuxed_path, ProcessRunner, Prober, Remuxer};
use vstream_models::encoding::MAX_VIDEO_UPLOAD_SIZE;
use vstream_models::{classify, Geometry, MediaAsset, Orientation, PublishedLocation};
use vstream_storage::{ObjectStore, PlaybackUrlTemplate};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult, PipelineStage};
use crate::logging::RunLogger;
use crate::publisher::Publisher;
use crate::stager::{RunArtifacts, Stager};

/// Position of a run in the ingest state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Received,
    Staged,
    Probed,
    Classified,
    Remuxed,
    Published,
    Cleaned,
    Failed { at: PipelineStage },
}

impl RunState {
    /// The only state a successful step may move to.
    pub fn next(&self) -> Option<RunState> {
        match self {
            RunState::Received => Some(RunState::Staged),
            RunState::Staged => Some(RunState::Probed),
            RunState::Probed => Some(RunState::Classified),
            RunState::Classified => Some(RunState::Remuxed),
            RunState::Remuxed => Some(RunState::Published),
            RunState::Published => Some(RunState::Cleaned),
            RunState::Cleaned | RunState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Cleaned | RunState::Failed { .. })
    }

    /// Whether `to` is a legal transition from this state.
    pub fn can_transition_to(&self, to: RunState) -> bool {
        match to {
            RunState::Failed { .. } => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Received => write!(f, "received"),
            RunState::Staged => write!(f, "staged"),
            RunState::Probed => write!(f, "probed"),
            RunState::Classified => write!(f, "classified"),
            RunState::Remuxed => write!(f, "remuxed"),
            RunState::Published => write!(f, "published"),
            RunState::Cleaned => write!(f, "cleaned"),
            RunState::Failed { at } => write!(f, "failed at {}", at),
        }
    }
}

/// Tracks and logs a run's state transitions.
struct RunTracker {
    state: RunState,
    logger: RunLogger,
}

impl RunTracker {
    fn new(logger: RunLogger) -> Self {
        Self {
            state: RunState::Received,
            logger,
        }
    }

    fn advance(&mut self, to: RunState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal transition {} -> {}",
            self.state,
            to
        );
        self.logger.log_transition(self.state, to);
        self.state = to;
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub location: PublishedLocation,
    pub geometry: Geometry,
    pub orientation: Orientation,
    /// Bytes written by the stager
    pub staged_size: u64,
}

/// Sequences staging, probing, classification, remuxing and publishing.
///
/// Holds no per-run state, so one pipeline can serve any number of
/// concurrent runs.
#[derive(Clone)]
pub struct IngestPipeline {
    stager: Stager,
    prober: Prober,
    remuxer: Remuxer,
    publisher: Publisher,
    max_video_bytes: u64,
}

impl IngestPipeline {
    pub fn new(stager: Stager, prober: Prober, remuxer: Remuxer, publisher: Publisher) -> Self {
        Self {
            stager,
            prober,
            remuxer,
            publisher,
            max_video_bytes: MAX_VIDEO_UPLOAD_SIZE,
        }
    }

    /// Cap on the number of bytes a run will stage.
    pub fn with_max_video_bytes(mut self, max_video_bytes: u64) -> Self {
        self.max_video_bytes = max_video_bytes;
        self
    }

    /// Wire a pipeline from configuration and its external collaborators.
    pub fn from_config(
        config: &IngestConfig,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn ObjectStore>,
        urls: PlaybackUrlTemplate,
    ) -> Self {
        Self::new(
            Stager::new(&config.work_dir),
            Prober::with_binary(runner.clone(), &config.ffprobe_bin),
            Remuxer::with_binary(runner, &config.ffmpeg_bin),
            Publisher::new(store, urls),
        )
        .with_max_video_bytes(config.max_video_bytes)
    }

    pub fn stager(&self) -> &Stager {
        &self.stager
    }

    /// Run the full pipeline for one upload.
    ///
    /// Either returns a published location or an error naming the failed
    /// stage; in both cases no local file of this run is left on disk. If the
    /// returned future is dropped early the tracked files are removed by
    /// [`RunArtifacts`]'s `Drop`.
    pub async fn run<R>(&self, asset: &MediaAsset, reader: &mut R) -> IngestResult<IngestOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let logger = RunLogger::new(&asset.video_id, "video_ingest");
        let span = logger.create_span();
        let started = Instant::now();

        logger.log_start(&format!(
            "{} bytes of {}",
            asset.size, asset.content_type
        ));

        let mut tracker = RunTracker::new(logger.clone());
        let mut artifacts = RunArtifacts::new();

        let result = self
            .execute(asset, reader, &mut tracker, &mut artifacts)
            .instrument(span)
            .await;

        if let Err(e) = &result {
            if let Some(stage) = e.stage() {
                tracker.advance(RunState::Failed { at: stage });
                metrics::counter!("vstream_ingest_stage_failures_total", "stage" => stage.as_str())
                    .increment(1);
            }
            logger.log_failure(tracker.state, e);
        }

        let removed = artifacts.release().await;
        debug!(video_id = %asset.video_id, removed, "Released run artifacts");

        metrics::histogram!("vstream_ingest_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                tracker.advance(RunState::Cleaned);
                metrics::counter!("vstream_ingest_runs_total", "outcome" => "success")
                    .increment(1);
                logger.log_completion(&format!(
                    "{} ({}) published at {}",
                    outcome.geometry, outcome.orientation, outcome.location.url
                ));
                Ok(outcome)
            }
            Err(e) => {
                metrics::counter!("vstream_ingest_runs_total", "outcome" => "failure")
                    .increment(1);
                Err(e)
            }
        }
    }

    /// Run the stages in order, registering each local file before it exists.
    async fn execute<R>(
        &self,
        asset: &MediaAsset,
        reader: &mut R,
        tracker: &mut RunTracker,
        artifacts: &mut RunArtifacts,
    ) -> IngestResult<IngestOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let video_id = &asset.video_id;
        video_id
            .validate()
            .map_err(|e| IngestError::invalid_upload(format!("Invalid video ID: {}", e)))?;

        // One byte past the limit is enough to tell an oversized stream apart
        let mut limited = (&mut *reader).take(self.max_video_bytes.saturating_add(1));

        artifacts.track(self.stager.staged_path(video_id));
        let staged = self
            .stager
            .stage(video_id, &mut limited)
            .await
            .map_err(IngestError::stage_write_failed)?;

        if staged.size > self.max_video_bytes {
            return Err(IngestError::invalid_upload("Video file is too large"));
        }
        if staged.size != asset.size {
            return Err(IngestError::invalid_upload(format!(
                "Received {} bytes but {} were declared",
                staged.size, asset.size
            )));
        }
        tracker.advance(RunState::Staged);

        let geometry = self
            .prober
            .probe_geometry(&staged.path)
            .await
            .map_err(IngestError::probe_failed)?;
        tracker.advance(RunState::Probed);

        let orientation = classify(geometry);
        tracker.advance(RunState::Classified);
        tracker
            .logger
            .log_progress(tracker.state, &format!("{} classified as {}", geometry, orientation));

        let remux_target: PathBuf = remuxed_path(&staged.path);
        artifacts.track(&remux_target);
        let remuxed = self
            .remuxer
            .remux(&staged.path)
            .await
            .map_err(IngestError::remux_failed)?;
        tracker.advance(RunState::Remuxed);

        let location = self
            .publisher
            .publish(&remuxed, orientation, video_id, &asset.content_type)
            .await
            .map_err(IngestError::publish_failed)?;
        tracker.advance(RunState::Published);

        Ok(IngestOutcome {
            location,
            geometry,
            orientation,
            staged_size: staged.size,
        })
    }
}
