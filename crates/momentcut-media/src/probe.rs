//! FFprobe media duration.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::resolve_binary;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    duration: Option<String>,
}

/// Probe a media file for its duration in seconds.
pub async fn probe_duration(ffprobe: &Path, path: &Path) -> MediaResult<f64> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let binary = resolve_binary(ffprobe)
        .map_err(|_| MediaError::FfprobeNotFound(ffprobe.display().to_string()))?;

    let output = Command::new(binary)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed on {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_duration(&output.stdout)
}

/// Extract the duration from FFprobe JSON.
///
/// Prefers the container duration and falls back to the longest stream.
pub fn parse_probe_duration(json: &[u8]) -> MediaResult<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let container = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    let duration = container.or_else(|| {
        probe
            .streams
            .iter()
            .filter_map(|s| s.duration.as_ref()?.parse::<f64>().ok())
            .reduce(f64::max)
    });

    match duration {
        Some(d) if d.is_finite() && d > 0.0 => Ok(d),
        Some(d) => Err(MediaError::InvalidMedia(format!("reported duration {d}"))),
        None => Err(MediaError::InvalidMedia("no duration reported".to_string())),
    }
}
