use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faultline::analysis::RuleBasedAnalyzer;
use faultline::app::{handle_fatal_error, init_logging, AppConfig, FaultlineConfig, Pipeline};
use faultline::domain::{AnalysisStatus, EventId};
use faultline::ingest::{AnalyzeErrorRequest, ErrorAnalysisResponse};
use faultline::report::{render_completed, MarkdownReportGenerator};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Classify error reports and suggest remediations
#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Classify error reports and suggest remediations", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (falls back to $FAULTLINE_CONFIG)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the error reports in a JSON file (one object or an array)
    Analyze {
        /// JSON file containing error reports
        input: PathBuf,

        /// Write one Markdown report per event into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print status responses as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    CheckConfig,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReportBatch {
    Many(Vec<AnalyzeErrorRequest>),
    One(AnalyzeErrorRequest),
}

impl ReportBatch {
    fn into_requests(self) -> Vec<AnalyzeErrorRequest> {
        match self {
            Self::Many(requests) => requests,
            Self::One(request) => vec![request],
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::new(cli.verbose).with_config_path(cli.config.clone());
    init_logging(&app_config);

    let result = match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            json,
        } => run_analyze(&app_config, &input, output_dir.as_deref(), json).await,
        Commands::CheckConfig => run_check_config(&app_config).await,
    };

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}

async fn run_analyze(
    app_config: &AppConfig,
    input: &Path,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = FaultlineConfig::resolve(app_config.config_path.as_deref()).await?;

    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let batch: ReportBatch = serde_json::from_str(&content).map_err(faultline::Error::from)?;
    let requests = batch.into_requests();
    info!("Loaded {} error reports from {}", requests.len(), input.display());

    let pipeline = Pipeline::start(&config, Arc::new(RuleBasedAnalyzer::new()))?;

    let interrupt = pipeline.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping analysis");
            interrupt.cancel();
        }
    });

    let cancel = CancellationToken::new();
    let mut accepted: Vec<EventId> = Vec::new();
    for (index, request) in requests.into_iter().enumerate() {
        match pipeline.service().submit(request, &cancel).await {
            Ok(response) => accepted.push(response.id),
            Err(faultline::Error::Validation(reason)) => {
                warn!("Skipping report #{}: {}", index + 1, reason);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let service = pipeline.service().clone();
    let stats = pipeline.drain().await?;
    info!(
        "Analyzed {} reports ({} completed, {} failed)",
        stats.processed, stats.completed, stats.failed
    );

    let mut responses = Vec::new();
    for id in &accepted {
        if let Some(response) = service.query(id, &cancel).await? {
            responses.push(response);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&responses)?);
        return Ok(());
    }

    write_reports(&service, &responses, output_dir, &cancel).await
}

async fn write_reports(
    service: &faultline::ingest::IngestService,
    responses: &[ErrorAnalysisResponse],
    output_dir: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let generator = MarkdownReportGenerator::new()?;
    if let Some(dir) = output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    for response in responses {
        if response.status != AnalysisStatus::Completed {
            eprintln!(
                "{}: {} ({})",
                response.id,
                response.status,
                response.failure.as_deref().unwrap_or("no result")
            );
            continue;
        }

        let Some(event) = service.repository().get_by_id(&response.id, cancel).await? else {
            continue;
        };
        let report = render_completed(&generator, &event)?;

        match output_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.md", response.id));
                tokio::fs::write(&path, report)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                debug!("Wrote {}", path.display());
            }
            None => println!("{report}\n---\n"),
        }
    }
    Ok(())
}

async fn run_check_config(app_config: &AppConfig) -> Result<()> {
    let config = FaultlineConfig::resolve(app_config.config_path.as_deref()).await?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
