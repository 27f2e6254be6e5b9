//! FFmpeg CLI wrapper and clip cutter.
//!
//! This crate provides:
//! - FFmpeg command building and execution with timeouts
//! - FFprobe duration measurement
//! - The [`CutTool`] seam and its FFmpeg implementation
//! - [`ClipCutter`], which cuts validated segments in parallel

pub mod command;
pub mod cutter;
pub mod error;
pub mod fs_utils;
pub mod metrics;
pub mod probe;
pub mod tool;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cutter::{default_max_workers, ClipCutter, CutterConfig, CANCELLED_REASON};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use tool::{CutRequest, CutTool, FfmpegTool};
