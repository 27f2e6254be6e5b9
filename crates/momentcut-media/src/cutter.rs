//! Parallel clip cutter.
//!
//! One external process per segment, bounded by a semaphore. Per-segment
//! failures are recorded in the result list and never abort the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use momentcut_models::{
    check_segment_set, clip_output_path, ClipResult, CutMode, ValidatedSegment,
    DEFAULT_MIN_CLIP_LENGTH,
};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_non_empty, partial_path, promote, remove_if_exists};
use crate::metrics;
use crate::tool::{CutRequest, CutTool};

/// Upper bound on the default worker count.
pub const DEFAULT_MAX_WORKERS_CAP: usize = 4;

/// Reason recorded for segments that never started.
pub const CANCELLED_REASON: &str = "cancelled before launch";

/// Cutter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CutterConfig {
    /// Maximum concurrent cutting processes.
    pub max_workers: usize,
    /// Retry with a re-encode when stream copy fails or writes nothing.
    pub reencode_fallback: bool,
    /// Output container extension.
    pub extension: String,
    /// Measure each written clip.
    pub probe_outputs: bool,
    /// Shortest clip written, in seconds. Segments cut short by the media
    /// end below this length fail.
    pub min_clip_length: f64,
}

impl Default for CutterConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            reencode_fallback: true,
            extension: "mp4".to_string(),
            probe_outputs: true,
            min_clip_length: DEFAULT_MIN_CLIP_LENGTH,
        }
    }
}

impl CutterConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_workers: std::env::var("CUT_MAX_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_workers),
            reencode_fallback: std::env::var("CUT_REENCODE_FALLBACK")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.reencode_fallback),
            extension: std::env::var("CLIP_EXTENSION")
                .ok()
                .map(|v| v.trim().trim_start_matches('.').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.extension),
            probe_outputs: defaults.probe_outputs,
            min_clip_length: defaults.min_clip_length,
        }
    }
}

/// `min(available cores, 4)`.
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_MAX_WORKERS_CAP)
}

/// Cuts validated segments out of a media file.
#[derive(Clone)]
pub struct ClipCutter {
    tool: Arc<dyn CutTool>,
    config: CutterConfig,
}

impl ClipCutter {
    pub fn new(tool: Arc<dyn CutTool>, config: CutterConfig) -> Self {
        Self { tool, config }
    }

    pub fn config(&self) -> &CutterConfig {
        &self.config
    }

    /// Output path a segment will be written to.
    pub fn output_path(&self, output_dir: &Path, segment: &ValidatedSegment) -> PathBuf {
        clip_output_path(output_dir, segment.id(), segment.title(), &self.config.extension)
    }

    /// Cut every segment, returning one result per segment in id order.
    ///
    /// Once `cancel` reads `true`, segments that have not started are reported
    /// as failed; cuts already running are allowed to finish.
    pub async fn cut(
        &self,
        media_path: &Path,
        segments: &[ValidatedSegment],
        output_dir: &Path,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<Vec<ClipResult>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        check_segment_set(segments, None, self.config.min_clip_length)
            .map_err(|e| MediaError::InvalidSegments(e.to_string()))?;

        if !media_path.exists() {
            return Err(MediaError::FileNotFound(media_path.to_path_buf()));
        }
        tokio::fs::create_dir_all(output_dir).await?;

        let media_duration = match self.tool.probe_duration(media_path).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                warn!(
                    media = %media_path.display(),
                    "Could not measure source media, cutting without bounds check: {}",
                    e
                );
                None
            }
        };

        let workers = self.config.max_workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        info!(
            segments = segments.len(),
            workers,
            tool = self.tool.name(),
            "Cutting clips"
        );

        let futures: Vec<_> = segments
            .iter()
            .map(|segment| {
                let semaphore = Arc::clone(&semaphore);
                let cancel = cancel.clone();
                async move {
                    let output = self.output_path(output_dir, segment);
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return ClipResult::failed(segment.id(), output, "worker pool closed")
                        }
                    };
                    if *cancel.borrow() {
                        debug!(segment_id = segment.id(), "Skipping segment after cancellation");
                        metrics::record_clip("cancelled", "none");
                        return ClipResult::failed(segment.id(), output, CANCELLED_REASON);
                    }
                    self.cut_segment(media_path, media_duration, segment, output).await
                }
            })
            .collect();

        let mut results = join_all(futures).await;
        results.sort_by_key(|r| r.segment_id);

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            succeeded,
            failed = results.len() - succeeded,
            "Finished cutting clips"
        );
        Ok(results)
    }

    async fn cut_segment(
        &self,
        media_path: &Path,
        media_duration: Option<f64>,
        segment: &ValidatedSegment,
        output: PathBuf,
    ) -> ClipResult {
        let id = segment.id();
        let mut end_time = segment.end_time();

        if let Some(duration) = media_duration {
            if segment.start_time() >= duration {
                let reason = format!(
                    "segment starts at {:.3}s but media is only {:.3}s long",
                    segment.start_time(),
                    duration
                );
                return self.fail(id, output, reason).await;
            }
            if end_time > duration {
                warn!(
                    segment_id = id,
                    end_time,
                    media_duration = duration,
                    "Segment runs past end of media, cutting to media end"
                );
                end_time = duration;
            }
        }

        let length = end_time - segment.start_time();
        if length < self.config.min_clip_length {
            let reason = format!(
                "only {:.3}s of media left after {:.3}s, below minimum {:.3}s",
                length,
                segment.start_time(),
                self.config.min_clip_length
            );
            return self.fail(id, output, reason).await;
        }

        let request = CutRequest {
            input: media_path.to_path_buf(),
            start_time: segment.start_time(),
            end_time,
        };
        let partial = partial_path(&output);

        let mut attempt = self.attempt(&request, &partial, CutMode::StreamCopy).await;
        if let Err(e) = &attempt {
            if self.config.reencode_fallback {
                warn!(
                    segment_id = id,
                    "Stream copy failed ({}), retrying with re-encode",
                    e.reason()
                );
                metrics::record_fallback();
                attempt = self.attempt(&request, &partial, CutMode::Reencode).await;
            }
        }

        let mode = match attempt {
            Ok(mode) => mode,
            Err(e) => {
                let _ = remove_if_exists(&partial).await;
                return self.fail(id, output, e.reason()).await;
            }
        };

        if let Err(e) = promote(&partial, &output).await {
            let _ = remove_if_exists(&partial).await;
            return self.fail(id, output, e.reason()).await;
        }

        let duration_actual = if self.config.probe_outputs {
            match self.tool.probe_duration(&output).await {
                Ok(d) => Some(d),
                Err(e) => {
                    debug!(segment_id = id, "Could not measure clip: {}", e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            segment_id = id,
            output = %output.display(),
            mode = mode.as_str(),
            "Clip written"
        );
        metrics::record_clip("succeeded", mode.as_str());
        ClipResult::succeeded(id, output, mode, duration_actual)
    }

    async fn attempt(&self, request: &CutRequest, partial: &Path, mode: CutMode) -> MediaResult<CutMode> {
        remove_if_exists(partial).await?;
        let started = Instant::now();
        let result = self.tool.cut(request, partial, mode).await;
        metrics::record_cut_duration(mode.as_str(), started.elapsed().as_secs_f64());
        result?;
        ensure_non_empty(partial).await?;
        Ok(mode)
    }

    /// Record a failure and clear any clip left from an earlier run.
    async fn fail(&self, id: usize, output: PathBuf, reason: String) -> ClipResult {
        warn!(segment_id = id, reason = %reason, "Clip failed");
        if let Err(e) = remove_if_exists(&output).await {
            debug!(segment_id = id, "Could not remove stale clip: {}", e);
        }
        metrics::record_clip("failed", "none");
        ClipResult::failed(id, output, reason)
    }
}
