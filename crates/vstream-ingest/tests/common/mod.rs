//! Shared fakes for ingest integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vstream_ingest::{IngestConfig, IngestPipeline};
use vstream_media::{MediaResult, ProcessOutput, ProcessRunner};
use vstream_storage::{ObjectStore, PlaybackUrlTemplate, StorageError, StorageResult};

pub const PORTRAIT_PROBE: &str = r#"{"programs":[],"streams":[{"width":1080,"height":1920}]}"#;
pub const LANDSCAPE_PROBE: &str = r#"{"programs":[],"streams":[{"width":1920,"height":1080}]}"#;

/// Stand-in for ffprobe and ffmpeg.
///
/// ffprobe answers with `probe_stdout`; ffmpeg writes its last argument (the
/// output path) when `write_remux_output` is set. Either can be made to hang
/// forever to simulate a stuck child.
pub struct FakeTools {
    pub probe_stdout: String,
    pub probe_exit: i32,
    pub remux_exit: i32,
    pub write_remux_output: bool,
    pub hang_on: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeTools {
    pub fn new(probe_stdout: &str) -> Self {
        Self {
            probe_stdout: probe_stdout.to_string(),
            probe_exit: 0,
            remux_exit: 0,
            write_remux_output: true,
            hang_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn portrait() -> Self {
        Self::new(PORTRAIT_PROBE)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeTools {
    async fn run(&self, program: &str, args: &[String]) -> MediaResult<ProcessOutput> {
        self.calls.lock().unwrap().push(program.to_string());

        let output = match program {
            "ffprobe" => ProcessOutput {
                exit_code: Some(self.probe_exit),
                stdout: self.probe_stdout.clone().into_bytes(),
                stderr: b"moov atom not found".to_vec(),
            },
            "ffmpeg" => {
                if self.write_remux_output {
                    let out = args.last().expect("output path");
                    tokio::fs::write(out, b"remuxed payload").await?;
                }
                ProcessOutput {
                    exit_code: Some(self.remux_exit),
                    stdout: Vec::new(),
                    stderr: b"Invalid data found when processing input".to_vec(),
                }
            }
            other => panic!("unexpected program {}", other),
        };

        if self.hang_on == Some(program) {
            std::future::pending::<()>().await;
        }
        Ok(output)
    }
}

/// Object store that records uploads, or fails every one of them.
#[derive(Default)]
pub struct FakeStore {
    pub fail: bool,
    puts: Mutex<Vec<Upload>>,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<()> {
        if self.fail {
            return Err(StorageError::upload_failed("connection reset by peer"));
        }
        let body = tokio::fs::read(path).await?;
        self.puts.lock().unwrap().push(Upload {
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }
}

pub fn test_config(work_dir: &Path) -> IngestConfig {
    IngestConfig {
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn pipeline(work_dir: &Path, tools: Arc<FakeTools>, store: Arc<FakeStore>) -> IngestPipeline {
    IngestPipeline::from_config(
        &test_config(work_dir),
        tools,
        store,
        PlaybackUrlTemplate::new("tubes", "us-east-1"),
    )
}

/// Every file left under `dir`.
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
