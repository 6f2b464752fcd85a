//! voicelab CLI - cross-video speaker matching and voice-quality cache tooling.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{CacheCommand, ConfigCommand, LearningCommand, MatchCommand};

/// voicelab CLI - speaker identity and voice quality tooling.
///
/// This tool lets you:
///   - find the same speaker across videos from extracted speaker records
///   - inspect, refresh and invalidate the cached voice-quality snapshot
///   - inspect the learning state that drives cache invalidation
///
/// Configuration is stored in ~/.voicelab/config.yaml.
#[derive(Parser)]
#[command(name = "voicelab")]
#[command(about = "Voice identity and quality cache CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voicelab/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find speakers that appear in more than one video
    Match(MatchCommand),
    /// Inspect and manage the quality snapshot cache
    Cache(CacheCommand),
    /// Inspect the learning state
    Learning(LearningCommand),
    /// Manage CLI configuration
    Config(ConfigCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag.
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Match(cmd) => cmd.run(&cli),
        Commands::Cache(cmd) => cmd.run(&cli),
        Commands::Learning(cmd) => cmd.run(&cli),
        Commands::Config(cmd) => cmd.run(&cli),
    }
}
