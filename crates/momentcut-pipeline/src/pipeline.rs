//! Pipeline orchestration.
//!
//! TranscriptSource → MomentExtractor → SegmentValidator → CutSheetBuilder,
//! then exporters and the clip cutter as independent consumers of the same
//! cut sheet.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn, Instrument};

use momentcut_ai::{AiError, GeminiClient, MomentCache, MomentExtractor, MomentModel};
use momentcut_media::{ClipCutter, CutTool, FfmpegTool};
use momentcut_models::{
    ClipResult, CutSheet, CutSummary, Rejection, SegmentValidator, Transcript, ValidatedSegment,
    ValidationError, ValidationReport,
};

use crate::config::PipelineConfig;
use crate::cutsheet::CutSheetBuilder;
use crate::error::{PipelineError, PipelineResult};
use crate::export::{export, ExportFormat, JobTarget};
use crate::logging::RunLogger;
use crate::metrics;
use crate::transcript_source::TranscriptSource;

/// Cut results file written next to the clips.
pub const RESULTS_FILE: &str = "results.json";

/// Cut sheet file written by a full run.
pub const CUT_SHEET_FILE: &str = "cut_sheet.json";

/// Outcome of extraction and validation.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Candidates returned by the AI service.
    pub candidates: usize,
    pub report: ValidationReport,
    pub cut_sheet: CutSheet,
}

/// Outcome of a cut batch.
#[derive(Debug, Clone)]
pub struct CutOutcome {
    pub results: Vec<ClipResult>,
    pub summary: CutSummary,
}

/// Contents of `results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsRecord<'a> {
    pub run_id: &'a str,
    pub generated_at: DateTime<Utc>,
    pub media_path: &'a Path,
    pub summary: &'a CutSummary,
    pub clips: &'a [ClipResult],
}

/// Everything a full run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub extraction: Extraction,
    pub cut: CutOutcome,
    pub exports: Vec<PathBuf>,
    pub results_path: PathBuf,
}

/// The moment-to-clip pipeline.
pub struct Pipeline {
    extractor: Option<MomentExtractor>,
    validator: SegmentValidator,
    builder: CutSheetBuilder,
    cutter: ClipCutter,
    tool: Arc<dyn CutTool>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build the production pipeline: Gemini for moments, FFmpeg for cuts.
    ///
    /// Without an API key the pipeline can still cut and export; extraction
    /// then fails with a configuration error.
    pub fn from_config(config: PipelineConfig) -> Self {
        let model: Option<Arc<dyn MomentModel>> = match GeminiClient::new(&config.ai) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                debug!("Moment extraction unavailable: {}", e);
                None
            }
        };
        let tool = Arc::new(
            FfmpegTool::new(&config.tools.ffmpeg_path, &config.tools.ffprobe_path)
                .with_timeout(config.tools.timeout_secs),
        );
        Self::build(model, tool, config)
    }

    /// Build a pipeline around explicit components.
    pub fn with_components(
        model: Arc<dyn MomentModel>,
        tool: Arc<dyn CutTool>,
        config: PipelineConfig,
    ) -> Self {
        Self::build(Some(model), tool, config)
    }

    fn build(
        model: Option<Arc<dyn MomentModel>>,
        tool: Arc<dyn CutTool>,
        config: PipelineConfig,
    ) -> Self {
        let extractor = model.map(|model| {
            let extractor = MomentExtractor::new(model)
                .with_retry(config.ai.retry_config())
                .with_min_clip_length(config.validator.min_clip_length);
            if config.cache.enabled {
                extractor.with_cache(MomentCache::new(&config.cache.dir))
            } else {
                extractor
            }
        });

        let mut cutter_config = config.cutter.clone();
        cutter_config.min_clip_length = config.validator.min_clip_length;

        Self {
            extractor,
            validator: SegmentValidator::new(config.validator.min_clip_length),
            builder: CutSheetBuilder::new(),
            cutter: ClipCutter::new(Arc::clone(&tool), cutter_config),
            tool,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Measure a media file.
    pub async fn probe_media(&self, media_path: &Path) -> PipelineResult<f64> {
        Ok(self.tool.probe_duration(media_path).await?)
    }

    /// Load and parse a transcript file.
    pub async fn load_transcript(
        &self,
        path: &Path,
        media_duration: Option<f64>,
    ) -> PipelineResult<Transcript> {
        let source = TranscriptSource::from_path(path).await?;
        Ok(source.transcript(media_duration)?)
    }

    /// Ask for moments, validate them against the transcript duration and
    /// build the cut sheet. Every rejected candidate is logged with its reason.
    pub async fn extract(
        &self,
        transcript: &Transcript,
        target_count: Option<usize>,
        logger: &RunLogger,
    ) -> PipelineResult<Extraction> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or_else(|| AiError::Config("GEMINI_API_KEY not set".to_string()))?;
        let target_count = target_count.unwrap_or(self.config.target_count);
        let duration = transcript.duration();

        logger.log_progress(&format!(
            "extracting up to {} moments from {} spans ({:.1}s)",
            target_count,
            transcript.len(),
            duration
        ));
        let candidates = extractor.extract(transcript, target_count).await?;

        let report = match self.validator.validate(&candidates, duration) {
            Ok(report) => report,
            Err(e) => {
                if let ValidationError::AllRejected { rejections, .. } = &e {
                    report_rejections(rejections, logger);
                }
                return Err(e.into());
            }
        };
        report_rejections(&report.rejections, logger);
        metrics::record_validated(report.segments.len());

        if report.clamped > 0 {
            logger.log_warning(&format!(
                "{} segment(s) clamped to the media end",
                report.clamped
            ));
        }
        logger.log_progress(&format!(
            "{} of {} candidates kept ({} malformed, {} too short, {} overlapping)",
            report.segments.len(),
            candidates.len(),
            report.rejected_malformed,
            report.rejected_too_short,
            report.rejected_overlap
        ));

        let cut_sheet = self.builder.build(&report.segments, duration)?;
        Ok(Extraction {
            candidates: candidates.len(),
            report,
            cut_sheet,
        })
    }

    /// Cut every segment. Per-segment failures are logged and returned,
    /// never raised.
    pub async fn cut(
        &self,
        media_path: &Path,
        segments: &[ValidatedSegment],
        output_dir: &Path,
        cancel: watch::Receiver<bool>,
        logger: &RunLogger,
    ) -> PipelineResult<CutOutcome> {
        logger.log_progress(&format!("cutting {} segments", segments.len()));
        let results = self
            .cutter
            .cut(media_path, segments, output_dir, cancel)
            .await?;

        for result in &results {
            if let Some(reason) = result.failure_reason() {
                logger.log_error(&format!(
                    "segment {} ({}) failed: {}",
                    result.segment_id,
                    result.output_path.display(),
                    reason
                ));
            }
        }

        let summary = CutSummary::from_results(&results);
        logger.log_progress(&format!("cut summary: {}", summary));
        Ok(CutOutcome { results, summary })
    }

    /// Job target for clips of `media_path` written into `output_dir`.
    pub fn job_target(&self, media_path: &Path, output_dir: &Path) -> JobTarget {
        JobTarget {
            media_path: media_path.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            extension: self.config.cutter.extension.clone(),
        }
    }

    /// Render one export.
    pub fn export(
        &self,
        sheet: &CutSheet,
        format: ExportFormat,
        target: Option<&JobTarget>,
    ) -> PipelineResult<Vec<u8>> {
        export(sheet, format, target)
    }

    /// Write the cut sheet JSON and every export format into `dir`.
    pub async fn write_exports(
        &self,
        sheet: &CutSheet,
        dir: &Path,
        target: &JobTarget,
    ) -> PipelineResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;

        let mut written = Vec::with_capacity(ExportFormat::ALL.len() + 1);
        let sheet_path = dir.join(CUT_SHEET_FILE);
        tokio::fs::write(&sheet_path, serde_json::to_vec_pretty(sheet)?).await?;
        written.push(sheet_path);

        for format in ExportFormat::ALL {
            let path = dir.join(format.default_file_name());
            let bytes = self.export(sheet, format, Some(target))?;
            tokio::fs::write(&path, bytes).await?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write `results.json` into `output_dir`.
    pub async fn write_results(
        &self,
        output_dir: &Path,
        run_id: &str,
        media_path: &Path,
        outcome: &CutOutcome,
    ) -> PipelineResult<PathBuf> {
        let record = ResultsRecord {
            run_id,
            generated_at: Utc::now(),
            media_path,
            summary: &outcome.summary,
            clips: &outcome.results,
        };
        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(RESULTS_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&record)?).await?;
        Ok(path)
    }

    /// Full run: transcript file and media in, clips and documents out.
    ///
    /// Cancellation before cutting starts aborts the run with
    /// [`PipelineError::Cancelled`] and writes nothing; once cutting has
    /// started it only stops new cuts from launching.
    pub async fn run(
        &self,
        transcript_path: &Path,
        media_path: &Path,
        output_dir: &Path,
        target_count: Option<usize>,
        cancel: watch::Receiver<bool>,
    ) -> PipelineResult<RunReport> {
        let logger = RunLogger::new("run");
        let span = logger.create_span();

        async {
            logger.log_start(&format!(
                "transcript={} media={}",
                transcript_path.display(),
                media_path.display()
            ));

            if !media_path.exists() {
                return Err(PipelineError::Media(momentcut_media::MediaError::FileNotFound(
                    media_path.to_path_buf(),
                )));
            }

            let media_duration = match self.probe_media(media_path).await {
                Ok(duration) => Some(duration),
                Err(e) => {
                    logger.log_warning(&format!(
                        "could not measure media, using transcript duration: {}",
                        e
                    ));
                    None
                }
            };

            let transcript = self.load_transcript(transcript_path, media_duration).await?;
            let extraction = tokio::select! {
                biased;
                _ = cancelled(cancel.clone()) => {
                    logger.log_warning("cancelled during extraction");
                    return Err(PipelineError::Cancelled);
                }
                result = self.extract(&transcript, target_count, &logger) => result?,
            };
            if *cancel.borrow() {
                logger.log_warning("cancelled before cutting");
                return Err(PipelineError::Cancelled);
            }

            let target = self.job_target(media_path, output_dir);
            let exports = self
                .write_exports(&extraction.cut_sheet, output_dir, &target)
                .await?;

            let segments = extraction.cut_sheet.segments();
            let cut = self
                .cut(media_path, &segments, output_dir, cancel, &logger)
                .await?;
            let results_path = self
                .write_results(output_dir, logger.run_id(), media_path, &cut)
                .await?;

            if cut.summary.is_success() {
                logger.log_completion(&format!(
                    "{} • {}",
                    extraction.cut_sheet.summary(),
                    cut.summary
                ));
            } else {
                logger.log_error(&format!("no clip was cut: {}", cut.summary));
            }

            Ok(RunReport {
                run_id: logger.run_id().to_string(),
                extraction,
                cut,
                exports,
                results_path,
            })
        }
        .instrument(span)
        .await
    }
}

/// Resolves once the cancel flag is set. Never resolves if the sender is gone
/// without setting it.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
    if cancel.wait_for(|flag| *flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn report_rejections(rejections: &[Rejection], logger: &RunLogger) {
    for rejection in rejections {
        metrics::record_rejection(&rejection.reason);
        warn!(
            run_id = logger.run_id(),
            rank = rejection.rank,
            title = %rejection.title,
            reason = metrics::rejection_kind(&rejection.reason),
            "Rejected candidate: {}",
            rejection.reason
        );
    }
}
