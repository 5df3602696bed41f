//! FFprobe stream geometry.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use vstream_models::Geometry;

use crate::error::{MediaError, MediaResult};
use crate::runner::{ProcessRunner, DEFAULT_FFPROBE_BIN};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Reads the primary video stream's dimensions with ffprobe.
///
/// Probing is deterministic for a given file, so failures are never retried.
#[derive(Clone)]
pub struct Prober {
    runner: Arc<dyn ProcessRunner>,
    binary: String,
}

impl Prober {
    /// Create a prober using the default `ffprobe` binary.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self::with_binary(runner, DEFAULT_FFPROBE_BIN)
    }

    /// Create a prober using an explicit binary name or path.
    pub fn with_binary(runner: Arc<dyn ProcessRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Probe a fully written local file for its width and height.
    pub async fn probe_geometry(&self, path: impl AsRef<Path>) -> MediaResult<Geometry> {
        let path = path.as_ref();

        if !tokio::fs::try_exists(path).await? {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let output = self.runner.run(&self.binary, &probe_args(path)).await?;

        if !output.success() {
            return Err(MediaError::ffprobe_failed(
                format!("ffprobe exited with {:?}", output.exit_code),
                Some(output.stderr_text()),
            ));
        }

        let geometry = parse_geometry(&output.stdout)?;
        debug!("Probed {}: {}", path.display(), geometry);
        Ok(geometry)
    }
}

/// Fixed ffprobe arguments selecting the first video stream's dimensions.
pub fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-show_entries".to_string(),
        "stream=width,height".to_string(),
        "-of".to_string(),
        "json".to_string(),
        path.to_string_lossy().to_string(),
    ]
}

/// Extract geometry from ffprobe's JSON output.
fn parse_geometry(stdout: &[u8]) -> MediaResult<Geometry> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::InvalidVideo("No video streams found".to_string()))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(Geometry::new(width, height)),
        _ => Err(MediaError::InvalidVideo(
            "Video stream is missing width or height".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct CannedRunner {
        output: ProcessOutput,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl CannedRunner {
        fn new(exit_code: i32, stdout: &str, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                output: ProcessOutput {
                    exit_code: Some(exit_code),
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                },
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProcessRunner for CannedRunner {
        async fn run(&self, program: &str, args: &[String]) -> MediaResult<ProcessOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            Ok(self.output.clone())
        }
    }

    fn staged_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("abc123.mp4");
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    #[tokio::test]
    async fn test_probe_geometry_parses_first_stream() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir);
        let runner = CannedRunner::new(
            0,
            r#"{"programs":[],"streams":[{"width":1920,"height":1080}]}"#,
            "",
        );

        let geometry = Prober::new(runner.clone())
            .probe_geometry(&path)
            .await
            .unwrap();
        assert_eq!(geometry, Geometry::new(1920, 1080));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "ffprobe");
        assert_eq!(calls[0].1, probe_args(&path));
    }

    #[tokio::test]
    async fn test_probe_nonzero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let path = staged_file(&dir);
        let runner = CannedRunner::new(1, "", "Invalid data found when processing input\n");

        let err = Prober::new(runner).probe_geometry(&path).await.unwrap_err();
        assert!(matches!(err, MediaError::FfprobeFailed { .. }));
        assert_eq!(err.stderr(), Some("Invalid data found when processing input"));
    }

    #[tokio::test]
    async fn test_probe_missing_file_does_not_launch() {
        let dir = TempDir::new().unwrap();
        let runner = CannedRunner::new(0, "{}", "");

        let err = Prober::new(runner.clone())
            .probe_geometry(dir.path().join("missing.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_geometry_rejects_bad_output() {
        assert!(matches!(
            parse_geometry(br#"{"streams":[]}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_geometry(br#"{}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_geometry(br#"{"streams":[{"width":1920}]}"#),
            Err(MediaError::InvalidVideo(_))
        ));
        assert!(matches!(
            parse_geometry(br#"{"streams":[{"width":"wide","height":1080}]}"#),
            Err(MediaError::JsonParse(_))
        ));
        assert!(matches!(
            parse_geometry(b"not json"),
            Err(MediaError::JsonParse(_))
        ));
    }
}
