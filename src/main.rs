//! RailRush - Festival Railway Rush Advisory Service
//!
//! # Usage
//!
//! ```bash
//! # Generate the synthetic training corpus
//! railrush generate --samples 10000 --out data/processed/festive_travel_data.csv
//!
//! # Train the model trio and persist artifacts
//! railrush train --models data/models
//!
//! # Serve the advisory API (default)
//! railrush --addr 0.0.0.0:8080 --models data/models
//! ```
//!
//! # Environment Variables
//!
//! - `RAILRUSH_CONFIG`: Path to an alternate railrush.toml
//! - `RAILRUSH_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use railrush::advisor::AdvisoryComposer;
use railrush::api::{create_app, ApiState};
use railrush::artifacts::ArtifactStore;
use railrush::config::AdvisorConfig;
use railrush::training::TrainingConfig;
use railrush::{generator, training, TrainingExample};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "railrush")]
#[command(about = "Festival railway rush prediction and booking advisory")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default from config: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the artifact store directory
    #[arg(long)]
    models: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Generate the synthetic training corpus CSV
    Generate {
        /// Number of rows to generate
        #[arg(long)]
        samples: Option<usize>,
        /// Output CSV path
        #[arg(long)]
        out: Option<PathBuf>,
        /// RNG seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
        /// Emit the simple corpus variant instead of the enhanced one
        #[arg(long)]
        simple: bool,
    },

    /// Train the model trio and persist artifacts
    Train {
        /// Corpus CSV to train from (generated in-memory when absent)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Artifact store directory
        #[arg(long)]
        models: Option<PathBuf>,
        /// Rows to generate when no dataset file is given
        #[arg(long)]
        samples: Option<usize>,
        /// RNG seed for generation, splitting and fitting
        #[arg(long)]
        seed: Option<u64>,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = AdvisorConfig::load();

    match args.command {
        Some(SubCommand::Generate {
            samples,
            out,
            seed,
            simple,
        }) => run_generate(&config, samples, out, seed, simple),
        Some(SubCommand::Train {
            dataset,
            models,
            samples,
            seed,
        }) => run_train(&config, dataset, models.or(args.models), samples, seed),
        None => run_serve(&config, args.addr, args.models).await,
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_generate(
    config: &AdvisorConfig,
    samples: Option<usize>,
    out: Option<PathBuf>,
    seed: Option<u64>,
    simple: bool,
) -> Result<()> {
    let samples = samples.unwrap_or(config.generation.samples);
    let seed = seed.unwrap_or(config.generation.seed);
    let out = out.unwrap_or_else(|| config.paths.dataset.clone());

    let csv = if simple {
        let rows = generator::generate_simple(samples, seed)?;
        generator::simple_to_csv(&rows)
    } else {
        let rows = generator::generate(samples, seed)?;
        generator::to_csv(&rows)
    };

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&out, csv).with_context(|| format!("writing {}", out.display()))?;

    info!(samples, seed, path = %out.display(), "corpus generated");
    Ok(())
}

fn run_train(
    config: &AdvisorConfig,
    dataset: Option<PathBuf>,
    models: Option<PathBuf>,
    samples: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let seed = seed.unwrap_or(config.generation.seed);
    let models_dir = models.unwrap_or_else(|| config.paths.models_dir.clone());

    let rows = match dataset {
        Some(path) => load_corpus(&path)?,
        None => {
            let samples = samples.unwrap_or(config.generation.samples);
            info!(samples, seed, "no dataset given, generating corpus in-memory");
            generator::generate(samples, seed)?
        }
    };

    let training_config = TrainingConfig {
        seed,
        ..TrainingConfig::default()
    };
    let artifacts = training::train(&rows, &training_config)?;

    let store = ArtifactStore::open(&models_dir)
        .with_context(|| format!("opening artifact store at {}", models_dir.display()))?;
    store.save(&artifacts)?;

    info!(
        accuracy = artifacts.report.rush_accuracy,
        path = %models_dir.display(),
        "training complete, artifacts persisted"
    );
    Ok(())
}

fn load_corpus(path: &PathBuf) -> Result<Vec<TrainingExample>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut rows = Vec::new();
    for (line_no, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let row = TrainingExample::parse_csv_row(line)
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        rows.push(row);
    }
    info!(rows = rows.len(), path = %path.display(), "corpus loaded");
    Ok(rows)
}

async fn run_serve(
    config: &AdvisorConfig,
    addr: Option<String>,
    models: Option<PathBuf>,
) -> Result<()> {
    let models_dir = models.unwrap_or_else(|| config.paths.models_dir.clone());
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());

    // Any missing artifact key is fatal here: do not serve without a
    // complete, consistent model set.
    let store = ArtifactStore::open(&models_dir)
        .with_context(|| format!("opening artifact store at {}", models_dir.display()))?;
    let context = store
        .load_context()
        .context("loading inference context (run `railrush train` first?)")?;

    let composer = AdvisoryComposer::new(Arc::new(context));
    let app = create_app(ApiState::new(composer));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "advisory API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
