//! Veriscan command line
//!
//! Classifies documents sentence by sentence as human-written, AI-written
//! or over-polished, using the same pipeline and quota rules as the service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use veriscan_service::{
    build_detector, build_service, InMemoryQuotaGate, ServiceConfig, UploadHandler,
};
use veriscan_telemetry::{MetricsCollector, ScanLogSink as _};

/// Crates whose logs are shown
const LOG_TARGETS: &[&str] = &[
    "veriscan",
    "veriscan_core",
    "veriscan_features",
    "veriscan_policy",
    "veriscan_classifier",
    "veriscan_telemetry",
    "veriscan_service",
];

#[derive(Parser, Debug)]
#[command(name = "veriscan")]
#[command(about = "Sentence-level AI authorship detection", long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, global = true, env = "VERISCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a document and print the report as JSON
    Classify {
        #[command(flatten)]
        input: InputArgs,

        /// Account charged for the scan
        #[arg(short, long, default_value = "local")]
        user: String,

        /// Tokens granted to the account for this run
        #[arg(long, default_value_t = 1)]
        tokens: u64,
    },

    /// Print the classifier feature rows for a document
    Features {
        #[command(flatten)]
        input: InputArgs,

        /// One row for the whole text instead of one per sentence
        #[arg(long)]
        span: bool,
    },

    /// Extract the text of an uploaded file without classifying it
    Extract {
        /// File to read (txt)
        file: PathBuf,
    },

    /// Show an account's recent scans
    History {
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Load every model eagerly and exit
    Warmup,
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Document file; stdin when omitted
    file: Option<PathBuf>,

    /// Inline text instead of a file
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,
}

enum Input {
    Text(String),
    Upload { filename: String, bytes: Vec<u8> },
}

impl InputArgs {
    fn read(&self) -> Result<Input> {
        if let Some(text) = &self.text {
            return Ok(Input::Text(text.clone()));
        }

        match &self.file {
            Some(path) => Ok(Input::Upload {
                filename: file_name(path),
                bytes: std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            }),
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
                Ok(Input::Text(text))
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    MetricsCollector::describe();

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if config.scan_log_path.is_none() {
        config.scan_log_path = ServiceConfig::default_scan_log_path();
    }
    info!(
        model = %config.classifier_model_path.display(),
        chunk_size = config.features.chunk_size,
        "Configuration loaded"
    );

    match cli.command {
        Command::Classify {
            input,
            user,
            tokens,
        } => {
            let quota = Arc::new(InMemoryQuotaGate::new().with_account(user.clone(), tokens));
            let service = build_service(&config, quota)?;

            let response = match input.read()? {
                Input::Text(text) => service.classify(&text, &user).await?,
                Input::Upload { filename, bytes } => {
                    service.classify_upload(&filename, &bytes, &user).await?
                }
            };
            print_json(&response)?;
            service.flush().await;
        }

        Command::Features { input, span } => {
            let detector = build_detector(&config)?;
            let uploads = UploadHandler::new(config.max_upload_bytes);
            let text = match input.read()? {
                Input::Text(text) => text,
                Input::Upload { filename, bytes } => uploads.extract_upload(&filename, &bytes)?,
            };

            let rows: Vec<Vec<f32>> = if span {
                vec![detector.span_features(&text)?.into_inner()]
            } else {
                detector
                    .extract_features(&text)?
                    .into_iter()
                    .map(|row| row.into_inner())
                    .collect()
            };
            print_json(&rows)?;
        }

        Command::Extract { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let extracted =
                UploadHandler::new(config.max_upload_bytes).extract_text(&file_name(&file), &bytes)?;
            print_json(&extracted)?;
        }

        Command::History { user } => {
            let scan_log = veriscan_service::build_scan_log(&config)?;
            let records = scan_log.history(&user, config.history_limit).await?;
            print_json(&records)?;
        }

        Command::Warmup => {
            config.warmup = true;
            build_detector(&config)?;
            info!("All models loaded");
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing/logging on stderr so stdout stays machine-readable
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let default_directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    let filter = if verbose {
        EnvFilter::new(default_directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
