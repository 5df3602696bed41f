//! Fast-start remux.
//!
//! Rewrites the container so the index sits at the front of the file,
//! copying audio and video streams unchanged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use vstream_models::encoding::{REMUXED_SUFFIX, REMUX_CONTAINER_FORMAT};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::runner::{ProcessRunner, DEFAULT_FFMPEG_BIN};

/// Derive the remuxed sibling of a staged file (`<input>.processed.mp4`).
pub fn remuxed_path(input: impl AsRef<Path>) -> PathBuf {
    let mut path = OsString::from(input.as_ref().as_os_str());
    path.push(REMUXED_SUFFIX);
    PathBuf::from(path)
}

/// Build the fixed fast-start remux command.
pub fn remux_command(input: impl AsRef<Path>, output: impl AsRef<Path>) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .log_level("error")
        .faststart()
        .map_metadata(0)
        .copy_codecs()
        .format(REMUX_CONTAINER_FORMAT)
}

/// Runs ffmpeg to produce a progressive-playback copy of a file.
#[derive(Clone)]
pub struct Remuxer {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl Remuxer {
    /// Create a remuxer using the default `ffmpeg` binary.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self::with_binary(runner, DEFAULT_FFMPEG_BIN)
    }

    /// Create a remuxer using an explicit binary name or path.
    pub fn with_binary(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Remux `input` and return the path of the fully written output.
    ///
    /// On failure a partially written output may remain at
    /// [`remuxed_path`]; removing it is the caller's job.
    pub async fn remux(&self, input: impl AsRef<Path>) -> MediaResult<PathBuf> {
        let input = input.as_ref();
        let output_path = remuxed_path(input);
        let cmd = remux_command(input, &output_path);

        debug!("Remuxing {} -> {}", input.display(), output_path.display());
        let output = self.runner.run(&self.binary, &cmd.build_args()).await?;

        if !output.success() {
            let stderr = output.stderr_text();
            warn!(
                exit_code = ?output.exit_code,
                "FFmpeg remux failed for {}: {}",
                input.display(),
                stderr
            );
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                output.exit_code,
            ));
        }

        if !tokio::fs::try_exists(&output_path).await? {
            return Err(MediaError::ffmpeg_failed(
                format!("FFmpeg reported success but {} is missing", output_path.display()),
                Some(output.stderr_text()),
                output.exit_code,
            ));
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessOutput;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Writes the last argument (the output path) when told to succeed.
    struct FakeFfmpeg {
        exit_code: i32,
        write_output: bool,
    }

    #[async_trait]
    impl ProcessRunner for FakeFfmpeg {
        async fn run(&self, _program: &str, args: &[String]) -> MediaResult<ProcessOutput> {
            if self.write_output {
                let out = args.last().expect("output path");
                tokio::fs::write(out, b"remuxed").await?;
            }
            Ok(ProcessOutput {
                exit_code: Some(self.exit_code),
                stdout: Vec::new(),
                stderr: b"Error while opening encoder".to_vec(),
            })
        }
    }

    #[test]
    fn test_remuxed_path_appends_suffix() {
        assert_eq!(
            remuxed_path("/tmp/abc123.mp4"),
            PathBuf::from("/tmp/abc123.mp4.processed.mp4")
        );
    }

    #[test]
    fn test_remux_command_arguments() {
        let args = remux_command("/tmp/a.mp4", "/tmp/a.mp4.processed.mp4").build_args();
        assert_eq!(
            args,
            vec![
                "-y",
                "-v",
                "error",
                "-i",
                "/tmp/a.mp4",
                "-movflags",
                "faststart",
                "-map_metadata",
                "0",
                "-codec",
                "copy",
                "-f",
                "mp4",
                "/tmp/a.mp4.processed.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_remux_success_returns_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("abc123.mp4");
        tokio::fs::write(&input, b"raw").await.unwrap();

        let remuxer = Remuxer::new(Arc::new(FakeFfmpeg {
            exit_code: 0,
            write_output: true,
        }));
        let output = remuxer.remux(&input).await.unwrap();

        assert_eq!(output, remuxed_path(&input));
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"remuxed");
    }

    #[tokio::test]
    async fn test_remux_failure_carries_diagnostics() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("abc123.mp4");

        let remuxer = Remuxer::new(Arc::new(FakeFfmpeg {
            exit_code: 1,
            write_output: true,
        }));
        let err = remuxer.remux(&input).await.unwrap_err();

        match err {
            MediaError::FfmpegFailed {
                stderr, exit_code, ..
            } => {
                assert_eq!(stderr.as_deref(), Some("Error while opening encoder"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The partial output is left for the caller to clean up
        assert!(remuxed_path(&input).exists());
    }

    #[tokio::test]
    async fn test_remux_missing_output_is_failure() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("abc123.mp4");

        let remuxer = Remuxer::new(Arc::new(FakeFfmpeg {
            exit_code: 0,
            write_output: false,
        }));
        assert!(matches!(
            remuxer.remux(&input).await,
            Err(MediaError::FfmpegFailed { .. })
        ));
    }
}
