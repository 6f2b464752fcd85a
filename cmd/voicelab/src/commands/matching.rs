//! Cross-video speaker matching command.

use clap::Args;
use serde::Serialize;

use voicelab_voiceid::{ClusterEngine, ClusterOverview, CrossVideoMatch, SpeakerRecord};

use super::{get_config, load_document, output_result, print_info};
use crate::Cli;

/// Find speakers that appear in more than one video.
///
/// The input is a JSON (or YAML) array of speaker records as produced by
/// transcription and speaker extraction.
#[derive(Args)]
pub struct MatchCommand {
    /// Speaker records file (JSON or YAML)
    records: String,

    /// Only print the N most significant matches
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchOutput<'a> {
    overview: &'a ClusterOverview,
    matches: &'a [CrossVideoMatch],
}

impl MatchCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let records: Vec<SpeakerRecord> = load_document(&self.records)?;

        let engine = ClusterEngine::new(cfg.signature.clone());
        let report = engine.analyze(&records);

        let matches = match self.top {
            Some(n) => report.top(n),
            None => report.matches.as_slice(),
        };
        if matches.is_empty() {
            print_info(&format!(
                "No cross-video matches among {} records",
                report.overview.total_records
            ));
        }

        output_result(
            &MatchOutput {
                overview: &report.overview,
                matches,
            },
            cli.output.as_deref(),
            cli.json,
        )
    }
}
