//! Quality snapshot cache commands.

use clap::{Args, Subcommand};

use voicelab_qualitycache::{QualityMetric, QualityOverview};

use super::{
    get_config, load_document, open_service, output_result, print_info, print_success,
    print_warning,
};
use crate::Cli;

/// Inspect and manage the cached voice-quality snapshot.
///
/// Snapshots expire after `cache.max_age_minutes`, are never served past
/// `cache.force_refresh_hours`, and go stale once the learning state has
/// advanced `cache.learning_update_threshold` iterations.
#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand)]
enum CacheSubcommand {
    /// Print the cached snapshot if it is still servable
    Get {
        /// Treat the cache as a miss regardless of its state
        #[arg(long)]
        force: bool,
    },
    /// Store a fresh measurement pass
    Set {
        /// Quality metrics file (JSON or YAML array)
        metrics: String,
    },
    /// Show why the cache is or is not servable
    Status,
    /// Delete the cached snapshot
    Invalidate,
    /// Record one external learning iteration
    Advance,
}

impl CacheCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let svc = open_service(&cfg);

        match &self.command {
            CacheSubcommand::Get { force } => match svc.get_cached_data(*force) {
                Some(snapshot) => output_result(&snapshot, cli.output.as_deref(), cli.json),
                None => {
                    let reason = if *force {
                        "forced refresh".to_string()
                    } else {
                        svc.get_cache_status().reason
                    };
                    anyhow::bail!("cache miss: {reason}");
                }
            },

            CacheSubcommand::Set { metrics } => {
                let metrics: Vec<QualityMetric> = load_document(metrics)?;
                let overview = QualityOverview::from_metrics(&metrics);
                let report = svc.set_cached_data(overview, metrics)?;

                match &report.learning {
                    Ok(iteration) => print_success(&format!(
                        "Snapshot stored ({} voices, health {}), learning iteration {}",
                        report.snapshot.overview.total_voices,
                        report.snapshot.overview.system_health,
                        iteration
                    )),
                    Err(e) => print_warning(&format!(
                        "Snapshot stored but learning state was not updated: {e}"
                    )),
                }
                output_result(&report.snapshot.overview, cli.output.as_deref(), cli.json)
            }

            CacheSubcommand::Status => {
                let status = svc.get_cache_status();
                if status.refresh_recommended {
                    print_info("Refresh recommended");
                }
                output_result(&status, cli.output.as_deref(), cli.json)
            }

            CacheSubcommand::Invalidate => {
                svc.invalidate_cache()?;
                print_success("Cache invalidated");
                Ok(())
            }

            CacheSubcommand::Advance => {
                let iteration = svc.record_learning_iteration()?;
                print_success(&format!("Learning iteration advanced to {iteration}"));
                Ok(())
            }
        }
    }
}
