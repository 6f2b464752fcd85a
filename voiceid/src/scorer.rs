use std::collections::HashSet;

use crate::types::SpeakerRecord;

/// Weights of the three consistency sub-scores. Should sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub name: f64,
    pub accent: f64,
    pub quality: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name: 0.4,
            accent: 0.3,
            quality: 0.3,
        }
    }
}

impl MatchWeights {
    /// Returns the confidence in [0, 100], rounded to one decimal, that
    /// `members` are one real voice. Groups smaller than 2 score 0.
    pub fn score(&self, members: &[&SpeakerRecord]) -> f64 {
        if members.len() < 2 {
            return 0.0;
        }

        let name = consistency(members.iter().map(|r| r.name.trim()), 20.0);
        let accent = consistency(members.iter().map(|r| r.accent.trim()), 30.0);
        let quality = quality_score(members);

        let total = self.name * name + self.accent * accent + self.quality * quality;
        round1(total.clamp(0.0, 100.0))
    }
}

/// Scores a group with the default weights (name 0.4, accent 0.3, quality 0.3).
pub fn score_group(members: &[&SpeakerRecord]) -> f64 {
    MatchWeights::default().score(members)
}

/// 100 when every value is identical, minus `penalty` per extra distinct value.
fn consistency<'a>(values: impl Iterator<Item = &'a str>, penalty: f64) -> f64 {
    let distinct: HashSet<&str> = values.collect();
    if distinct.len() <= 1 {
        return 100.0;
    }
    (100.0 - penalty * (distinct.len() - 1) as f64).max(0.0)
}

/// Mean member quality (0-10) scaled to 0-100.
fn quality_score(members: &[&SpeakerRecord]) -> f64 {
    (average_quality(members) * 10.0).clamp(0.0, 100.0)
}

pub(crate) fn average_quality(members: &[&SpeakerRecord]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|r| r.quality_score).sum::<f64>() / members.len() as f64
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
