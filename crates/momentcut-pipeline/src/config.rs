//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;

use momentcut_ai::AiConfig;
use momentcut_media::CutterConfig;
use momentcut_models::DEFAULT_MIN_CLIP_LENGTH;

/// Number of moments requested when nothing else is configured.
pub const DEFAULT_TARGET_COUNT: usize = 5;

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| {
        !matches!(
            v.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
    })
}

/// Segment validation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    /// Shortest clip kept, in seconds.
    pub min_clip_length: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_clip_length: DEFAULT_MIN_CLIP_LENGTH,
        }
    }
}

impl ValidatorConfig {
    pub fn from_env() -> Self {
        Self {
            min_clip_length: env_parse::<f64>("MIN_CLIP_SECS")
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(DEFAULT_MIN_CLIP_LENGTH),
        }
    }
}

/// FFmpeg and FFprobe locations.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaToolConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Per-cut timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MediaToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_secs: 600,
        }
    }
}

impl MediaToolConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),
            timeout_secs: env_parse("CUT_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Moment cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: std::env::temp_dir().join("momentcut").join("moments"),
        }
    }
}

impl CacheConfig {
    /// Enabled unless `MOMENT_CACHE_ENABLED` turns it off.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("MOMENT_CACHE_ENABLED").unwrap_or(true),
            dir: std::env::var("MOMENT_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
        }
    }
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub ai: AiConfig,
    pub validator: ValidatorConfig,
    pub cutter: CutterConfig,
    pub tools: MediaToolConfig,
    pub cache: CacheConfig,
    /// Moments requested from the AI service.
    pub target_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            validator: ValidatorConfig::default(),
            cutter: CutterConfig::default(),
            tools: MediaToolConfig::default(),
            cache: CacheConfig::default(),
            target_count: DEFAULT_TARGET_COUNT,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ai: AiConfig::from_env(),
            validator: ValidatorConfig::from_env(),
            cutter: CutterConfig::from_env(),
            tools: MediaToolConfig::from_env(),
            cache: CacheConfig::from_env(),
            target_count: env_parse::<usize>("MOMENT_COUNT")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TARGET_COUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_count, 5);
        assert_eq!(config.validator.min_clip_length, 3.0);
        assert!(!config.cache.enabled);
        assert_eq!(config.cutter.extension, "mp4");
        assert!(config.cutter.max_workers >= 1 && config.cutter.max_workers <= 4);
        assert_eq!(config.tools.ffmpeg_path, PathBuf::from("ffmpeg"));
    }
}
