use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Version stamped into every snapshot. Snapshots with another version load as absent.
pub const CACHE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// SystemHealth
// ---------------------------------------------------------------------------

/// Four-level health of the voice catalogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Excellent,
    Good,
    Fair,
    #[default]
    Poor,
}

impl SystemHealth {
    /// Derives health from the average overall score and production-ready ratio.
    pub fn classify(average_score: f64, ready_ratio: f64) -> Self {
        if average_score >= 0.85 && ready_ratio >= 0.8 {
            SystemHealth::Excellent
        } else if average_score >= 0.70 && ready_ratio >= 0.5 {
            SystemHealth::Good
        } else if average_score >= 0.50 {
            SystemHealth::Fair
        } else {
            SystemHealth::Poor
        }
    }

    /// Numeric score used for trend comparison.
    pub fn score(self) -> u32 {
        match self {
            SystemHealth::Excellent => 95,
            SystemHealth::Good => 80,
            SystemHealth::Fair => 65,
            SystemHealth::Poor => 40,
        }
    }
}

impl std::fmt::Display for SystemHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemHealth::Excellent => f.write_str("excellent"),
            SystemHealth::Good => f.write_str("good"),
            SystemHealth::Fair => f.write_str("fair"),
            SystemHealth::Poor => f.write_str("poor"),
        }
    }
}

// ---------------------------------------------------------------------------
// QualityMetric / QualityOverview
// ---------------------------------------------------------------------------

/// Measured quality of one voice. Sub-scores are in [0, 1].
///
/// Replaced wholesale on every measurement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetric {
    pub id: String,
    pub name: String,
    pub transcription_accuracy: f64,
    pub audio_clarity: f64,
    pub naturalness: f64,
    pub overall_score: f64,
    pub production_ready: bool,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub last_tested: DateTime<Utc>,
}

/// Aggregate over all measured voices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityOverview {
    pub total_voices: usize,
    pub average_score: f64,
    pub production_ready_count: usize,
    pub system_health: SystemHealth,
}

impl QualityOverview {
    /// Computes the overview of a measurement pass. No metrics yields a
    /// zero overview with poor health.
    pub fn from_metrics(metrics: &[QualityMetric]) -> Self {
        let total = metrics.len();
        if total == 0 {
            return Self {
                total_voices: 0,
                average_score: 0.0,
                production_ready_count: 0,
                system_health: SystemHealth::Poor,
            };
        }
        let average = metrics.iter().map(|m| m.overall_score).sum::<f64>() / total as f64;
        let ready = metrics.iter().filter(|m| m.production_ready).count();
        Self {
            total_voices: total,
            average_score: average,
            production_ready_count: ready,
            system_health: SystemHealth::classify(average, ready as f64 / total as f64),
        }
    }
}

// ---------------------------------------------------------------------------
// CachedQualitySnapshot
// ---------------------------------------------------------------------------

/// The persisted unit of cache validity.
///
/// Invariant: `expires_at = timestamp + max_age`. Individual metrics are
/// never invalidated on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedQualitySnapshot {
    pub overview: QualityOverview,
    pub metrics: Vec<QualityMetric>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub cache_version: u32,
    /// Learning iteration at write time.
    pub learning_iteration: u64,
}

impl CachedQualitySnapshot {
    pub fn new(
        overview: QualityOverview,
        metrics: Vec<QualityMetric>,
        now: DateTime<Utc>,
        max_age: Duration,
        learning_iteration: u64,
    ) -> Self {
        Self {
            overview,
            metrics,
            timestamp: now,
            expires_at: now
                .checked_add_signed(max_age)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            cache_version: CACHE_VERSION,
            learning_iteration,
        }
    }

    /// Time since creation. Never negative.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).max(Duration::zero())
    }
}
