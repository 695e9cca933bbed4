// src/bin/extractor.rs

//! # Extractor Binary
//!
//! Command-line entry point for contract metadata extraction.
//!
//! - With a FILE argument it extracts that one document, prints the record as
//!   JSON and writes `<stem>_metadata.json` into the current directory.
//! - With `--container` or `--input-dir` it runs a batch without prompting.
//! - Otherwise it asks where the contracts live and what to call the report.
//!
//! Azure endpoints and keys come from the environment (a `.env` file is
//! loaded first). Pipeline tunables come from an optional YAML file, then
//! environment overrides, then command-line flags.

use anyhow::Context;
use clap::Parser;
use indicatif::HumanDuration;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ContractBlaster::config::extractor::Args;
use ContractBlaster::config::{load_pipeline_config, PipelineConfig, ServiceSettings};
use ContractBlaster::orchestrator::write_sidecar;
use ContractBlaster::services::Services;
use ContractBlaster::utils::setup_prometheus_metrics;
use ContractBlaster::{BatchOrchestrator, DocumentSource};

const DEFAULT_CONTAINER: &str = "documents";
const DEFAULT_LOCAL_FOLDER: &str = "sample_contracts";
const DEFAULT_OUTPUT: &str = "sirion_metadata.csv";

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "extractor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().json().with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.pipeline_config {
        Some(path) => load_pipeline_config(path)
            .with_context(|| format!("loading pipeline config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides();
    args.apply_to(&mut config);
    config.validate().context("invalid pipeline configuration")?;
    Ok(config)
}

fn prompt(question: &str, default: &str) -> anyhow::Result<String> {
    print!("{} [{}]: ", question, default);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

fn ask_for_source() -> anyhow::Result<(DocumentSource, PathBuf)> {
    println!("Where are the contracts?");
    println!("  1. Azure Blob Storage container");
    println!("  2. Local folder");
    let source = loop {
        match prompt("Choose 1 or 2", "1")?.as_str() {
            "1" => {
                let container = prompt("Container name", DEFAULT_CONTAINER)?;
                break DocumentSource::ObjectStore { container };
            }
            "2" => {
                let folder = prompt("Folder path", DEFAULT_LOCAL_FOLDER)?;
                break DocumentSource::LocalDirectory(PathBuf::from(folder));
            }
            other => println!("'{}' is not a valid choice.", other),
        }
    };
    let output = prompt("Output CSV file", DEFAULT_OUTPUT)?;
    Ok((source, PathBuf::from(output)))
}

async fn run_single(orchestrator: &BatchOrchestrator, file: &Path) -> anyhow::Result<()> {
    info!(file = %file.display(), "Processing single file");
    let record = orchestrator
        .process_single_file(file)
        .await
        .with_context(|| format!("extracting {}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    let sidecar = write_sidecar(&record, file, Path::new("."))?;
    info!(path = %sidecar.display(), "Metadata written");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref());

    if let Err(e) = setup_prometheus_metrics(args.metrics_port).await {
        error!("Failed to start metrics endpoint: {}", e);
    }

    let config = load_config(&args)?;
    if args.validate_config {
        info!("Pipeline configuration is valid.");
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }
    info!(
        schema = ?config.schema,
        max_workers = config.max_workers,
        max_retries = config.max_retries,
        parallel = config.parallel,
        "Pipeline configuration loaded"
    );

    let mut settings = ServiceSettings::from_env().context("reading Azure settings")?;
    if let Some(deployment) = &config.llm_deployment {
        settings.openai.deployment = deployment.clone();
    }
    let services = Services::from_settings(&settings).context("creating service clients")?;
    let orchestrator = BatchOrchestrator::new(config, services);

    if let Some(file) = &args.file {
        return run_single(&orchestrator, file).await;
    }

    let (source, output) = match args.batch_source() {
        Some(source) => (source, args.output.clone()),
        None => ask_for_source()?,
    };

    let start = Instant::now();
    let artifacts = orchestrator
        .run(&source, &output)
        .await
        .context("batch extraction failed")?;

    artifacts.summary.log();
    info!("Report: {}", artifacts.report_path.display());
    if let Some(path) = &artifacts.failure_list_path {
        info!("Failed documents listed in: {}", path.display());
    }
    info!("Finished in {}", HumanDuration(start.elapsed()));
    Ok(())
}
