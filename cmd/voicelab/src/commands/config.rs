//! Configuration management commands.

use clap::{Args, Subcommand};

use super::{get_config, output_result, print_success};
use crate::config::Config;
use crate::Cli;

/// Manage CLI configuration.
///
/// Configuration is stored in ~/.voicelab/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// View the effective configuration
    View,
    /// Print the config file path
    Path,
    /// Set the directory holding cache and learning documents
    #[command(name = "set-data-dir")]
    SetDataDir {
        /// Directory path (relative paths are resolved against the config directory)
        dir: String,
    },
    /// Reset the configuration to defaults
    Reset,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                output_result(&cfg, cli.output.as_deref(), cli.json)
            }

            ConfigSubcommand::Path => {
                let cfg = get_config(cli)?;
                println!("{}", cfg.path().display());
                Ok(())
            }

            ConfigSubcommand::SetDataDir { dir } => {
                let mut cfg = get_config(cli)?;
                cfg.data_dir = Some(dir.into());
                cfg.save()?;
                print_success(&format!(
                    "Data directory set to {}",
                    cfg.data_dir().display()
                ));
                Ok(())
            }

            ConfigSubcommand::Reset => {
                let cfg = get_config(cli)?;
                let fresh = Config::default();
                std::fs::write(cfg.path(), serde_yaml::to_string(&fresh)?)?;
                print_success("Configuration reset to defaults");
                Ok(())
            }
        }
    }
}
