//! Learning state commands.

use clap::{Args, Subcommand};

use super::{get_config, open_service, output_result};
use crate::Cli;

/// Inspect the learning state that drives cache invalidation.
#[derive(Args)]
pub struct LearningCommand {
    #[command(subcommand)]
    command: LearningSubcommand,
}

#[derive(Subcommand)]
enum LearningSubcommand {
    /// Show the full learning document
    Show,
    /// Show only the system performance summary
    Performance,
}

impl LearningCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let state = open_service(&cfg).learning_state();

        match &self.command {
            LearningSubcommand::Show => output_result(&state, cli.output.as_deref(), cli.json),
            LearningSubcommand::Performance => {
                output_result(&state.system_performance, cli.output.as_deref(), cli.json)
            }
        }
    }
}
