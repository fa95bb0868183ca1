//! Sensorcast - live sensor dashboard backend
//!
//! Main entry point for the Sensorcast CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;

use commands::{config, serve};
use sensorcast_config::{Environment, LoadedConfig, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Sensorcast - live sensor dashboard backend
#[derive(Parser)]
#[command(name = "sensorcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of discovery
    #[arg(short, long, global = true, env = "SENSORCAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => sensorcast_config::load_config_from(path)?,
        None => sensorcast_config::load_config(None)?,
    };

    let _guard = init_tracing(&loaded.config.logging(), loaded.config.env(), cli.verbose)?;
    report_sources(&loaded);

    let ctx = commands::Context {
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx),
    }
}

/// Console logging to stderr, plus a daily rolling JSON file when configured.
///
/// `RUST_LOG` wins over `logging.level`; `--verbose` forces debug for our crates.
fn init_tracing(
    logging: &LoggingConfig,
    env: Environment,
    verbose: bool,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{EnvFilter, Layer, prelude::*};

    let filter = || {
        if verbose {
            EnvFilter::new(
                "sensorcast=debug,sensorcast_server=debug,sensorcast_sensors=debug,sensorcast_cache=debug,sensorcast_config=debug,info",
            )
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
        }
    };

    let console = if logging.json_for(env) {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    };

    let (file, guard) = match &logging.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "sensorcast.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(filter())
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();

    Ok(guard)
}

fn report_sources(loaded: &LoadedConfig) {
    for path in loaded.loaded_from() {
        tracing::debug!(path = %path.display(), "Loaded config layer");
    }
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }
}
