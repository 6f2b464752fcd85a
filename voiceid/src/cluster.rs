use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::scorer::{average_quality, MatchWeights};
use crate::signature::{SignatureBuilder, SignatureConfig};
use crate::types::{CrossVideoMatch, SpeakerRecord};

/// Aggregate counts of one clustering pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOverview {
    pub total_records: usize,
    /// Signature groups before the cross-video filter.
    pub total_groups: usize,
    pub distinct_videos: usize,
    pub cross_video_matches: usize,
}

/// Result of [`ClusterEngine::analyze`]. Matches are most significant first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub overview: ClusterOverview,
    pub matches: Vec<CrossVideoMatch>,
}

impl ClusterReport {
    /// Returns at most the `n` most significant matches.
    pub fn top(&self, n: usize) -> &[CrossVideoMatch] {
        &self.matches[..n.min(self.matches.len())]
    }
}

/// Groups speaker records by signature and reports cross-video matches.
///
/// # Algorithm
///
/// 1. Partition records by [`SignatureBuilder::build`], keeping first-seen order.
/// 2. Drop groups whose members all come from one video.
/// 3. Score the rest with [`MatchWeights::score`].
/// 4. Stable-sort by `confidence x video_count x average_quality`, descending.
///
/// Output depends only on the input order through tie-breaks.
#[derive(Debug, Clone, Default)]
pub struct ClusterEngine {
    signatures: SignatureBuilder,
    weights: MatchWeights,
}

impl ClusterEngine {
    pub fn new(cfg: SignatureConfig) -> Self {
        Self {
            signatures: SignatureBuilder::new(cfg),
            weights: MatchWeights::default(),
        }
    }

    /// Replaces the scoring weights.
    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn signatures(&self) -> &SignatureBuilder {
        &self.signatures
    }

    /// Returns cross-video matches, most significant first.
    pub fn find_cross_video_matches(&self, records: &[SpeakerRecord]) -> Vec<CrossVideoMatch> {
        self.analyze(records).matches
    }

    /// Runs a full clustering pass. Empty input yields an empty report.
    pub fn analyze(&self, records: &[SpeakerRecord]) -> ClusterReport {
        let groups = self.partition(records);
        let distinct_videos: HashSet<&str> = records.iter().map(|r| r.video_id.as_str()).collect();

        let mut matches: Vec<CrossVideoMatch> = groups
            .iter()
            .filter_map(|(sig, members)| self.assemble(sig, members))
            .collect();

        // sort_by is stable: equal keys keep first-seen group order.
        matches.sort_by(|a, b| b.significance().total_cmp(&a.significance()));

        tracing::debug!(
            records = records.len(),
            groups = groups.len(),
            matches = matches.len(),
            "voiceid: clustering done"
        );

        ClusterReport {
            overview: ClusterOverview {
                total_records: records.len(),
                total_groups: groups.len(),
                distinct_videos: distinct_videos.len(),
                cross_video_matches: matches.len(),
            },
            matches,
        }
    }

    /// Groups records by signature in first-seen order.
    fn partition<'a>(&self, records: &'a [SpeakerRecord]) -> Vec<(String, Vec<&'a SpeakerRecord>)> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<&SpeakerRecord>)> = Vec::new();
        for r in records {
            let sig = self.signatures.build(r);
            match index.get(&sig) {
                Some(&i) => groups[i].1.push(r),
                None => {
                    index.insert(sig.clone(), groups.len());
                    groups.push((sig, vec![r]));
                }
            }
        }
        groups
    }

    /// Builds a match for a group, or None if it lacks cross-video evidence.
    fn assemble(&self, sig: &str, members: &[&SpeakerRecord]) -> Option<CrossVideoMatch> {
        let videos: HashSet<&str> = members.iter().map(|r| r.video_id.as_str()).collect();
        if videos.len() < 2 {
            return None;
        }
        let first = members[0];
        Some(CrossVideoMatch {
            signature: sig.to_string(),
            name: first.name.clone(),
            accent: first.accent.clone(),
            video_count: videos.len(),
            record_count: members.len(),
            average_quality: average_quality(members),
            confidence: self.weights.score(members),
            members: members.iter().map(|&r| r.clone()).collect(),
        })
    }
}
