//! momentcut command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use momentcut_media::check_ffmpeg;
use momentcut_models::{CutJob, CutSheet};
use momentcut_pipeline::{ExportFormat, Pipeline, PipelineConfig, RunLogger};

#[derive(Debug, Parser)]
#[command(
    name = "momentcut",
    version,
    about = "Find viral moments in a transcript and cut them into short clips"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract and validate moments, write the cut sheet JSON
    Extract(ExtractArgs),
    /// Cut clips from a cut sheet or cut job
    Cut(CutArgs),
    /// Render a cut sheet as CSV, Markdown, PDF or a cut job
    Export(ExportArgs),
    /// Run the whole pipeline
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[arg(long)]
    transcript: PathBuf,
    /// Media to measure for the duration
    #[arg(long, conflicts_with = "duration")]
    media: Option<PathBuf>,
    /// Media duration in seconds
    #[arg(long)]
    duration: Option<f64>,
    /// Number of moments to ask for
    #[arg(long)]
    count: Option<usize>,
    /// Cut sheet JSON to write
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct CutArgs {
    /// Source media; taken from the job when omitted
    #[arg(long)]
    media: Option<PathBuf>,
    #[arg(long, conflicts_with = "job", required_unless_present = "job")]
    cut_sheet: Option<PathBuf>,
    #[arg(long)]
    job: Option<PathBuf>,
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
struct ExportArgs {
    #[arg(long)]
    cut_sheet: PathBuf,
    /// csv, markdown, pdf or job
    #[arg(long)]
    format: ExportFormat,
    #[arg(long)]
    output: PathBuf,
    /// Source media (job exports)
    #[arg(long)]
    media: Option<PathBuf>,
    /// Clip directory (job exports)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long)]
    transcript: PathBuf,
    #[arg(long)]
    media: PathBuf,
    #[arg(long)]
    out_dir: PathBuf,
    #[arg(long)]
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();
    let pipeline = Pipeline::from_config(config);

    // Extract and export keep the default interrupt behaviour.
    let interruptible = matches!(cli.command, Command::Cut(_) | Command::Run(_));
    if !interruptible {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        return exit_code(execute(cli.command, &pipeline, cancel_rx).await);
    }

    let (cancel_rx, abort_rx) = install_interrupt_handler();
    tokio::select! {
        result = execute(cli.command, &pipeline, cancel_rx) => exit_code(result),
        Ok(()) = abort_rx => {
            error!("Aborted by second interrupt");
            ExitCode::from(130)
        }
    }
}

fn exit_code(result: anyhow::Result<bool>) -> ExitCode {
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// First Ctrl-C sets the cancel flag, the second fires the abort channel.
fn install_interrupt_handler() -> (watch::Receiver<bool>, oneshot::Receiver<()>) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (abort_tx, abort_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Received interrupt, finishing running cuts (press Ctrl-C again to abort)");
        let _ = cancel_tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = abort_tx.send(());
        }
    });
    (cancel_rx, abort_rx)
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("momentcut=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Run one subcommand. `Ok(false)` means a cut batch produced no clip.
async fn execute(
    command: Command,
    pipeline: &Pipeline,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    match command {
        Command::Extract(args) => extract(args, pipeline).await,
        Command::Cut(args) => cut(args, pipeline, cancel).await,
        Command::Export(args) => export(args, pipeline).await,
        Command::Run(args) => run(args, pipeline, cancel).await,
    }
}

async fn extract(args: ExtractArgs, pipeline: &Pipeline) -> anyhow::Result<bool> {
    let logger = RunLogger::new("extract");
    logger.log_start(&format!("transcript={}", args.transcript.display()));

    let media_duration = match (&args.media, args.duration) {
        (Some(media), _) => Some(
            pipeline
                .probe_media(media)
                .await
                .with_context(|| format!("measuring {}", media.display()))?,
        ),
        (None, duration) => duration,
    };

    let transcript = pipeline
        .load_transcript(&args.transcript, media_duration)
        .await
        .with_context(|| format!("reading transcript {}", args.transcript.display()))?;
    let extraction = pipeline.extract(&transcript, args.count, &logger).await?;

    write_file(&args.out, &serde_json::to_vec_pretty(&extraction.cut_sheet)?).await?;
    logger.log_completion(&format!(
        "{} → {}",
        extraction.cut_sheet.summary(),
        args.out.display()
    ));
    Ok(true)
}

async fn cut(
    args: CutArgs,
    pipeline: &Pipeline,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    let logger = RunLogger::new("cut");

    let (media, segments) = if let Some(job_path) = &args.job {
        let json = tokio::fs::read_to_string(job_path)
            .await
            .with_context(|| format!("reading cut job {}", job_path.display()))?;
        let job = CutJob::from_json(&json)?;
        let media = match (&args.media, job.input_path()?) {
            (Some(media), _) => media.clone(),
            (None, Some(input)) => input.to_path_buf(),
            (None, None) => bail!("cut job has no entries and no --media was given"),
        };
        (media, job.into_segments()?)
    } else if let Some(sheet_path) = &args.cut_sheet {
        let Some(media) = args.media.clone() else {
            bail!("--media is required with --cut-sheet");
        };
        let sheet = read_cut_sheet(sheet_path).await?;
        (media, sheet.segments())
    } else {
        bail!("one of --cut-sheet or --job is required");
    };

    logger.log_start(&format!(
        "media={} segments={}",
        media.display(),
        segments.len()
    ));
    if !segments.is_empty() {
        check_ffmpeg(&pipeline.config().tools.ffmpeg_path)?;
    }

    let outcome = pipeline
        .cut(&media, &segments, &args.out_dir, cancel, &logger)
        .await?;
    let results_path = pipeline
        .write_results(&args.out_dir, logger.run_id(), &media, &outcome)
        .await?;

    logger.log_completion(&format!("{} → {}", outcome.summary, results_path.display()));
    Ok(outcome.summary.is_success())
}

async fn export(args: ExportArgs, pipeline: &Pipeline) -> anyhow::Result<bool> {
    let sheet = read_cut_sheet(&args.cut_sheet).await?;
    let target = match (&args.media, &args.out_dir) {
        (Some(media), Some(out_dir)) => Some(pipeline.job_target(media, out_dir)),
        _ => None,
    };

    let bytes = pipeline.export(&sheet, args.format, target.as_ref())?;
    write_file(&args.output, &bytes).await?;
    info!(
        format = %args.format,
        clips = sheet.len(),
        "Wrote {}",
        args.output.display()
    );
    Ok(true)
}

async fn run(
    args: RunArgs,
    pipeline: &Pipeline,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    check_ffmpeg(&pipeline.config().tools.ffmpeg_path)?;
    let report = pipeline
        .run(
            &args.transcript,
            &args.media,
            &args.out_dir,
            args.count,
            cancel,
        )
        .await?;

    for path in &report.exports {
        info!(run_id = %report.run_id, "Wrote {}", path.display());
    }
    Ok(report.cut.summary.is_success())
}

async fn read_cut_sheet(path: &Path) -> anyhow::Result<CutSheet> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading cut sheet {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing cut sheet {}", path.display()))
}

async fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
