//! The external cutting tool seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use momentcut_models::{CutMode, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_duration;

/// One cut: a time range of an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct CutRequest {
    pub input: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
}

impl CutRequest {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// An external program that can cut and measure media.
#[async_trait]
pub trait CutTool: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Write `request` to `output` using `mode`. Overwrites `output`.
    async fn cut(&self, request: &CutRequest, output: &Path, mode: CutMode) -> MediaResult<()>;

    /// Duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;
}

/// FFmpeg/FFprobe backed [`CutTool`].
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    runner: FfmpegRunner,
    ffprobe: PathBuf,
    encoding: EncodingConfig,
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            runner: FfmpegRunner::new(ffmpeg),
            ffprobe: ffprobe.into(),
            encoding: EncodingConfig::default(),
        }
    }

    /// Kill FFmpeg if a single cut runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Build the FFmpeg invocation for a cut.
    pub fn command(&self, request: &CutRequest, output: &Path, mode: CutMode) -> FfmpegCommand {
        let cmd = FfmpegCommand::new(&request.input, output)
            .seek(request.start_time)
            .duration(request.duration());

        let cmd = match mode {
            CutMode::StreamCopy => cmd.stream_copy(),
            CutMode::Reencode => cmd
                .output_args(["-map", "0:v:0?", "-map", "0:a:0?"])
                .output_args(self.encoding.to_ffmpeg_args())
                .output_args(["-movflags", "+faststart"]),
        };
        cmd.bitexact()
    }
}

#[async_trait]
impl CutTool for FfmpegTool {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn cut(&self, request: &CutRequest, output: &Path, mode: CutMode) -> MediaResult<()> {
        self.runner.run(&self.command(request, output, mode)).await
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration(&self.ffprobe, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CutRequest {
        CutRequest {
            input: PathBuf::from("talk.mp4"),
            start_time: 8.0,
            end_time: 20.0,
        }
    }

    #[test]
    fn test_stream_copy_command() {
        let tool = FfmpegTool::new("ffmpeg", "ffprobe");
        let args = tool
            .command(&request(), Path::new("out.mp4"), CutMode::StreamCopy)
            .build_args();
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "12.000"));
        assert!(!args.contains(&"libx264".to_string()));
    }

    #[test]
    fn test_reencode_command() {
        let tool = FfmpegTool::new("ffmpeg", "ffprobe").with_encoding(EncodingConfig::default().with_crf(20));
        let args = tool
            .command(&request(), Path::new("out.mp4"), CutMode::Reencode)
            .build_args();
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "20"));
        assert!(!args.contains(&"copy".to_string()));
    }
}
