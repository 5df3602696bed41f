//! FFprobe/FFmpeg CLI wrapper for the ingest pipeline.
//!
//! This crate provides:
//! - An injectable process runner for external tools
//! - Stream geometry probing via ffprobe
//! - Fast-start remuxing via ffmpeg (stream copy, no re-encode)
//! - Idempotent removal of intermediate files

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod remux;
pub mod runner;

pub use command::FfmpegCommand;
pub use error::{MediaError, MediaResult};
pub use fs_utils::{remove_if_present, remove_if_present_blocking};
pub use probe::Prober;
pub use remux::{remuxed_path, Remuxer};
pub use runner::{
    check_tool, ProcessOutput, ProcessRunner, TokioProcessRunner, DEFAULT_FFMPEG_BIN,
    DEFAULT_FFPROBE_BIN,
};
