//! Local temp-file lifecycle.
//!
//! The stager writes the incoming payload to `{work_dir}/{video_id}.mp4` and
//! removes intermediate files when a run ends. [`RunArtifacts`] is the scoped
//! guard that makes removal unconditional: paths are tracked before the
//! stage that creates them runs, released explicitly on every normal exit,
//! and removed from `Drop` if the run is abandoned mid-flight.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use vstream_media::{remove_if_present, remove_if_present_blocking};
use vstream_models::encoding::VIDEO_EXTENSION;
use vstream_models::VideoId;

/// A payload written to local disk, owned by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Writes incoming payloads to the work directory.
#[derive(Debug, Clone)]
pub struct Stager {
    work_dir: PathBuf,
}

impl Stager {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Local path a video is staged at.
    pub fn staged_path(&self, video_id: &VideoId) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}", video_id.as_str(), VIDEO_EXTENSION))
    }

    /// Whether `source` is the very file a run for `video_id` would stage to.
    /// Staging such a source would truncate it before it is read.
    pub async fn is_staged_path(&self, video_id: &VideoId, source: &Path) -> bool {
        let staged = self.staged_path(video_id);
        match (fs::canonicalize(source).await, fs::canonicalize(&staged).await) {
            (Ok(source), Ok(staged)) => source == staged,
            _ => false,
        }
    }

    /// Copy the full stream to the staged path.
    ///
    /// Returns once every byte has been handed to the filesystem and the file
    /// is closed. No fsync is performed.
    pub async fn stage<R>(&self, video_id: &VideoId, reader: &mut R) -> io::Result<StagedFile>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        fs::create_dir_all(&self.work_dir).await?;

        let path = self.staged_path(video_id);
        let mut file = File::create(&path).await?;
        let size = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        drop(file);

        debug!(video_id = %video_id, size, "Staged upload at {}", path.display());
        Ok(StagedFile { path, size })
    }

    /// Stage an in-memory buffer.
    pub async fn stage_bytes(&self, video_id: &VideoId, bytes: &[u8]) -> io::Result<StagedFile> {
        let mut reader = bytes;
        self.stage(video_id, &mut reader).await
    }

    /// Remove every listed path. See [`release`].
    pub async fn release<P: AsRef<Path>>(&self, paths: &[P]) -> usize {
        release(paths).await
    }
}

/// Best-effort removal of every listed path.
///
/// Missing files are fine and removal errors are logged, never returned, so
/// calling this twice with the same paths is harmless. Returns the number of
/// files this call actually removed.
pub async fn release<P: AsRef<Path>>(paths: &[P]) -> usize {
    let mut removed = 0;
    for path in paths {
        let path = path.as_ref();
        match remove_if_present(path).await {
            Ok(true) => {
                removed += 1;
                debug!("Removed {}", path.display());
            }
            Ok(false) => {}
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
    removed
}

/// Scoped guard over the local files of one run.
#[derive(Debug, Default)]
pub struct RunArtifacts {
    paths: Vec<PathBuf>,
    released: bool,
}

impl RunArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for removal. Call before the file is created so a
    /// partially written file is covered too.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove all tracked files. Returns the number actually removed.
    pub async fn release(mut self) -> usize {
        let removed = release(&self.paths).await;
        self.released = true;
        removed
    }
}

impl Drop for RunArtifacts {
    fn drop(&mut self) {
        if self.released || self.paths.is_empty() {
            return;
        }

        // Run abandoned before release (cancelled or panicked): clean up synchronously.
        warn!(
            files = self.paths.len(),
            "RunArtifacts dropped without release(), removing files synchronously"
        );
        for path in &self.paths {
            if let Err(e) = remove_if_present_blocking(path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}
