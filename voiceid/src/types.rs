use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A voice detected in one video by the external speaker detector.
///
/// Records are read-only to this crate. Every field tolerates absence so a
/// partially filled detector output still clusters (with defaults) instead of
/// being rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerRecord {
    #[serde(default)]
    pub id: String,

    /// Display name as reported by the detector (e.g. "Alex").
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub accent: String,

    /// Free-form characteristics, e.g. `{"pitch": "high", "tone": "warm"}`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub voice_characteristics: HashMap<String, Value>,

    /// Detector quality estimate on a 0-10 scale.
    #[serde(default)]
    pub quality_score: f64,

    /// Source video this record was detected in.
    #[serde(default)]
    pub video_id: String,
}

impl SpeakerRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        accent: impl Into<String>,
        video_id: impl Into<String>,
        quality_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            accent: accent.into(),
            voice_characteristics: HashMap::new(),
            quality_score,
            video_id: video_id.into(),
        }
    }

    /// Sets a voice characteristic, returning the record for chaining.
    pub fn with_characteristic(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.voice_characteristics.insert(key.into(), value.into());
        self
    }
}

/// A group of records spanning at least two videos that likely share one voice.
///
/// Produced by [`crate::ClusterEngine`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossVideoMatch {
    pub signature: String,

    /// Name of the first record in the group.
    pub name: String,

    /// Accent of the first record in the group.
    pub accent: String,

    pub video_count: usize,
    pub record_count: usize,

    /// Mean member quality on the 0-10 scale.
    pub average_quality: f64,

    /// Match confidence in [0, 100], one decimal.
    pub confidence: f64,

    pub members: Vec<SpeakerRecord>,
}

impl CrossVideoMatch {
    /// Ranking key: confidence x distinct videos x average quality.
    pub fn significance(&self) -> f64 {
        self.confidence * self.video_count as f64 * self.average_quality
    }
}
