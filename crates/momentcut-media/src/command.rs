//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use momentcut_models::timestamp::format_ffmpeg_time;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format_ffmpeg_time(seconds))
    }

    /// Set duration (before input, so it counts from the seek point).
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format_ffmpeg_time(seconds))
    }

    /// Copy every stream without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_args(["-map", "0", "-c", "copy", "-avoid_negative_ts", "make_zero"])
    }

    /// Strip muxer version tags so identical inputs give identical files.
    pub fn bitexact(self) -> Self {
        self.output_args(["-fflags", "+bitexact", "-map_metadata", "-1"])
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-nostdin".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with a timeout.
///
/// Stderr is captured so failures carry FFmpeg's own message.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// FFmpeg binary (name on PATH or absolute path)
    binary: PathBuf,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRunner {
    /// Create a runner for the given binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let binary = resolve_binary(&self.binary)
            .map_err(|_| MediaError::FfmpegNotFound(self.binary.display().to_string()))?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", binary.display(), args.join(" "));

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), output).await {
                Ok(result) => result?,
                Err(_) => {
                    // Dropping the future kills the child.
                    warn!("FFmpeg timed out after {} seconds, killed process", secs);
                    return Err(MediaError::Timeout(secs));
                }
            },
            None => output.await?,
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(MediaError::ffmpeg_failed(
                match output.status.code() {
                    Some(code) => format!("FFmpeg exited with status {code}"),
                    None => "FFmpeg terminated by signal".to_string(),
                },
                (!stderr.trim().is_empty()).then_some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Resolve a binary name on PATH, or check an explicit path exists.
pub fn resolve_binary(binary: &Path) -> Result<PathBuf, which::Error> {
    which::which(binary)
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg(binary: &Path) -> MediaResult<PathBuf> {
    resolve_binary(binary).map_err(|_| MediaError::FfmpegNotFound(binary.display().to_string()))
}

/// Check if FFprobe is available.
pub fn check_ffprobe(binary: &Path) -> MediaResult<PathBuf> {
    resolve_binary(binary).map_err(|_| MediaError::FfprobeNotFound(binary.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_copy_args() {
        let cmd = FfmpegCommand::new("talk.mp4", "out/000_intro.mp4")
            .seek(8.0)
            .duration(12.5)
            .stream_copy()
            .bitexact();

        let args = cmd.build_args();
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        let ss_pos = args.iter().position(|a| a == "-ss").unwrap();
        assert!(ss_pos < input_pos);
        assert_eq!(args[ss_pos + 1], "8.000");
        assert!(args.contains(&"12.500".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert_eq!(args.first().map(String::as_str), Some("-y"));
        assert_eq!(args.last().map(String::as_str), Some("out/000_intro.mp4"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = FfmpegRunner::new("/nonexistent/momentcut-ffmpeg");
        let cmd = FfmpegCommand::new("a.mp4", "b.mp4");
        assert!(matches!(
            runner.run(&cmd).await,
            Err(MediaError::FfmpegNotFound(_))
        ));
    }
}
