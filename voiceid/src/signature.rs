use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::SpeakerRecord;

/// Maps one voice characteristic to a coarse bucket.
///
/// The raw value is lowercased and trimmed, then looked up in `aliases`.
/// Values without an alias are used as-is. Missing, empty or non-scalar
/// values fall back to `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRule {
    /// Characteristic key to read (e.g. "pitch").
    pub key: String,

    /// Bucket used when the characteristic is absent.
    pub default: String,

    /// Raw value -> bucket. Keys must be lowercase.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aliases: HashMap<String, String>,
}

impl BucketRule {
    pub fn new(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            aliases: HashMap::new(),
        }
    }

    /// Adds an alias, returning the rule for chaining.
    pub fn alias(mut self, raw: &str, bucket: &str) -> Self {
        self.aliases.insert(raw.to_lowercase(), bucket.to_string());
        self
    }

    /// Resolves the bucket for a characteristic map.
    pub fn bucket(&self, characteristics: &HashMap<String, Value>) -> String {
        let raw = match characteristics.get(&self.key) {
            Some(Value::String(s)) => s.trim().to_lowercase(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };
        if raw.is_empty() {
            return self.default.clone();
        }
        match self.aliases.get(&raw) {
            Some(bucket) => bucket.clone(),
            None => raw,
        }
    }
}

/// Bucketing table for [`SignatureBuilder`].
///
/// Controls clustering sensitivity: more aliases collapse more records
/// into the same candidate group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureConfig {
    pub pitch: BucketRule,
    pub tone: BucketRule,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            pitch: BucketRule::new("pitch", "medium")
                .alias("deep", "low")
                .alias("bass", "low")
                .alias("mid", "medium")
                .alias("normal", "medium")
                .alias("average", "medium")
                .alias("high-pitched", "high"),
            tone: BucketRule::new("tone", "neutral")
                .alias("flat", "neutral")
                .alias("calm", "neutral")
                .alias("soft", "warm")
                .alias("friendly", "warm"),
        }
    }
}

/// Derives coarse identity keys from speaker records.
#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    cfg: SignatureConfig,
}

impl SignatureBuilder {
    pub fn new(cfg: SignatureConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.cfg
    }

    /// Returns `name_accent_pitch_tone` for the record.
    ///
    /// Never fails: missing fields degrade to defaults. A name or accent that
    /// normalizes to nothing leaves its segment empty, which no real name
    /// can produce.
    pub fn build(&self, record: &SpeakerRecord) -> String {
        let name = normalize_name(&record.name);
        let accent = normalize_accent(&record.accent);
        let pitch = self.cfg.pitch.bucket(&record.voice_characteristics);
        let tone = self.cfg.tone.bucket(&record.voice_characteristics);
        format!("{name}_{accent}_{pitch}_{tone}")
    }
}

/// Lowercases and keeps only alphanumeric characters.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn normalize_accent(accent: &str) -> String {
    accent.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_characteristics_missing() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "Alex", "American", "v1", 8.0);
        assert_eq!(b.build(&r), "alex_american_medium_neutral");
    }

    #[test]
    fn name_is_lowercase_alphanumeric() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "  Dr. Mary-Jane O'Neil ", "british", "v1", 5.0);
        assert_eq!(b.build(&r), "drmaryjaneoneil_british_medium_neutral");
    }

    #[test]
    fn empty_name_and_accent_leave_empty_segments() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "!!", "  ", "v1", 5.0);
        assert_eq!(b.build(&r), "__medium_neutral");
    }

    #[test]
    fn unnamed_record_differs_from_speaker_named_unknown() {
        let b = SignatureBuilder::default();
        let unnamed = SpeakerRecord::new("1", "", "", "v1", 5.0);
        let named = SpeakerRecord::new("2", "Unknown", "unknown", "v2", 5.0);
        assert_eq!(b.build(&named), "unknown_unknown_medium_neutral");
        assert_ne!(b.build(&unnamed), b.build(&named));
    }

    #[test]
    fn characteristics_are_bucketed() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "Sam", "irish", "v1", 7.0)
            .with_characteristic("pitch", "Deep")
            .with_characteristic("tone", "warm");
        assert_eq!(b.build(&r), "sam_irish_low_warm");
    }

    #[test]
    fn unaliased_value_passes_through() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "Sam", "irish", "v1", 7.0)
            .with_characteristic("pitch", "high")
            .with_characteristic("tone", "raspy");
        assert_eq!(b.build(&r), "sam_irish_high_raspy");
    }

    #[test]
    fn non_scalar_characteristic_uses_default() {
        let b = SignatureBuilder::default();
        let r = SpeakerRecord::new("1", "Sam", "irish", "v1", 7.0)
            .with_characteristic("pitch", serde_json::json!({"hz": 180}))
            .with_characteristic("tone", Value::Null);
        assert_eq!(b.build(&r), "sam_irish_medium_neutral");
    }

    #[test]
    fn custom_table() {
        let cfg = SignatureConfig {
            pitch: BucketRule::new("register", "mid").alias("baritone", "low"),
            tone: BucketRule::new("timbre", "plain"),
        };
        let b = SignatureBuilder::new(cfg);
        let r = SpeakerRecord::new("1", "Kim", "korean", "v1", 6.0)
            .with_characteristic("register", "Baritone")
            .with_characteristic("pitch", "high");
        assert_eq!(b.build(&r), "kim_korean_low_plain");
    }
}
