mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::Settings;
use crate::output::OutputFormat;

/// pinsync - keep pinned items converged across collections
#[derive(Parser)]
#[command(name = "pinsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Path to the canonical store file
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show what a sync would change, without changing anything
  Plan {
    /// World file describing every collection
    #[arg(long)]
    world: PathBuf,
  },

  /// Run one reconciliation pass against a world file
  Sync {
    /// World file describing every collection
    #[arg(long)]
    world: PathBuf,
  },

  /// Add a URL to the canonical pins
  Pin {
    /// URL to pin
    url: String,
  },

  /// Remove a URL's identity key from the canonical pins
  Unpin {
    /// URL to unpin
    url: String,
  },

  /// Show the effective configuration and canonical pins
  Status,

  /// Run the convergence engine, reading host events from stdin
  Watch {
    /// World file describing every collection
    #[arg(long)]
    world: PathBuf,

    /// Override the configured suppression window (e.g. "2s")
    #[arg(long, value_parser = humantime::parse_duration)]
    suppression_window: Option<Duration>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let settings = Settings::load(cli.config, cli.store, cli.output)?;

  match cli.command {
    Commands::Plan { world } => cmd::cmd_plan(&settings, &world),
    Commands::Sync { world } => cmd::cmd_sync(&settings, &world),
    Commands::Pin { url } => cmd::cmd_pin(&settings, &url),
    Commands::Unpin { url } => cmd::cmd_unpin(&settings, &url),
    Commands::Status => cmd::cmd_status(&settings, cli.verbose),
    Commands::Watch {
      world,
      suppression_window,
    } => cmd::cmd_watch(&settings, &world, suppression_window),
  }
}
