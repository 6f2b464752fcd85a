use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::types::{QualityMetric, QualityOverview, SystemHealth};

/// Default number of trend entries kept in [`TrendHistory`].
pub const DEFAULT_TREND_CAPACITY: usize = 50;

/// Number of most recent entries inspected for the trend direction.
const TREND_WINDOW: usize = 5;

/// Minimum entries before a direction is reported.
const TREND_MIN_ENTRIES: usize = 3;

/// Average-quality delta beyond which the trend is not "stable".
const TREND_DELTA: f64 = 0.05;

// ---------------------------------------------------------------------------
// TrendHistory
// ---------------------------------------------------------------------------

/// One committed measurement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEntry {
    pub timestamp: DateTime<Utc>,
    pub average_quality: f64,
    pub production_ready_count: usize,
    pub health: SystemHealth,
    pub total_voices: usize,
}

impl TrendEntry {
    pub fn from_overview(overview: &QualityOverview, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            average_quality: overview.average_score,
            production_ready_count: overview.production_ready_count,
            health: overview.system_health,
            total_voices: overview.total_voices,
        }
    }
}

/// Fixed-capacity, append-only trend log.
///
/// Invariant: `len() <= capacity()`. When full, pushing evicts the oldest
/// entry first. Serializes as a plain JSON array, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendHistory {
    entries: VecDeque<TrendEntry>,
    capacity: usize,
}

impl TrendHistory {
    /// Creates an empty history. A zero capacity falls back to the default.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_TREND_CAPACITY } else { capacity };
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = if capacity == 0 { DEFAULT_TREND_CAPACITY } else { capacity };
        self.evict();
    }

    pub fn push(&mut self, entry: TrendEntry) {
        self.entries.push_back(entry);
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TrendEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&TrendEntry> {
        self.entries.back()
    }

    /// Direction of average quality over the most recent entries.
    pub fn direction(&self) -> TrendDirection {
        if self.entries.len() < TREND_MIN_ENTRIES {
            return TrendDirection::InsufficientData;
        }
        let start = self.entries.len().saturating_sub(TREND_WINDOW);
        let first = self.entries[start].average_quality;
        let last = self.entries[self.entries.len() - 1].average_quality;
        let delta = last - first;
        if delta > TREND_DELTA {
            TrendDirection::Improving
        } else if delta < -TREND_DELTA {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

impl Default for TrendHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TREND_CAPACITY)
    }
}

impl Serialize for TrendHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for TrendHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<TrendEntry>::deserialize(deserializer)?;
        let mut history = TrendHistory::default();
        for e in entries {
            history.push(e);
        }
        Ok(history)
    }
}

// ---------------------------------------------------------------------------
// SystemPerformance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    #[default]
    InsufficientData,
}

/// Signals derived from the latest commit and the trend history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemPerformance {
    pub average_quality: f64,
    pub health_score: u32,
    pub trend_direction: TrendDirection,
    /// Percentage of the max age still left on the latest snapshot.
    pub cache_efficiency: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// `round((1 - age/max_age) * 100)`, clamped to [0, 100].
pub fn cache_efficiency(age: Duration, max_age: Duration) -> i64 {
    let max_ms = max_age.num_milliseconds();
    if max_ms <= 0 {
        return 0;
    }
    let ratio = age.num_milliseconds() as f64 / max_ms as f64;
    (((1.0 - ratio) * 100.0).round() as i64).clamp(0, 100)
}

// ---------------------------------------------------------------------------
// VoiceAnalytics
// ---------------------------------------------------------------------------

/// Running statistics of one voice across commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAnalytics {
    pub name: String,
    pub samples: u64,
    pub average_overall: f64,
    pub best_overall: f64,
    pub last_overall: f64,
    pub last_tested: DateTime<Utc>,
}

impl VoiceAnalytics {
    fn first(m: &QualityMetric) -> Self {
        Self {
            name: m.name.clone(),
            samples: 1,
            average_overall: m.overall_score,
            best_overall: m.overall_score,
            last_overall: m.overall_score,
            last_tested: m.last_tested,
        }
    }

    fn record(&mut self, m: &QualityMetric) {
        self.samples += 1;
        self.average_overall += (m.overall_score - self.average_overall) / self.samples as f64;
        self.best_overall = self.best_overall.max(m.overall_score);
        self.last_overall = m.overall_score;
        self.last_tested = m.last_tested;
        self.name = m.name.clone();
    }
}

// ---------------------------------------------------------------------------
// LearningState
// ---------------------------------------------------------------------------

/// Persisted learning document.
///
/// `cloning_analytics` and `best_settings` belong to the external learning
/// process; they are carried through every update untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningState {
    /// Monotonic and saturating; advanced once per commit and once per
    /// external revision.
    pub learning_iterations: u64,
    pub quality_trends: TrendHistory,
    pub system_performance: SystemPerformance,
    pub voice_analytics: BTreeMap<String, VoiceAnalytics>,
    pub cloning_analytics: Map<String, Value>,
    pub best_settings: Map<String, Value>,
}

impl Default for LearningState {
    fn default() -> Self {
        Self {
            learning_iterations: 0,
            quality_trends: TrendHistory::default(),
            system_performance: SystemPerformance::default(),
            voice_analytics: BTreeMap::new(),
            cloning_analytics: Map::new(),
            best_settings: Map::new(),
        }
    }
}

impl LearningState {
    /// Folds a freshly committed measurement pass into the state.
    ///
    /// Appends one trend entry, recomputes system performance, updates
    /// per-voice analytics and advances the iteration by exactly one.
    pub fn commit(
        &mut self,
        overview: &QualityOverview,
        metrics: &[QualityMetric],
        efficiency: i64,
        now: DateTime<Utc>,
    ) {
        self.quality_trends.push(TrendEntry::from_overview(overview, now));

        self.system_performance = SystemPerformance {
            average_quality: overview.average_score,
            health_score: overview.system_health.score(),
            trend_direction: self.quality_trends.direction(),
            cache_efficiency: efficiency,
            last_updated: Some(now),
        };

        for m in metrics {
            match self.voice_analytics.get_mut(&m.id) {
                Some(a) => a.record(m),
                None => {
                    self.voice_analytics.insert(m.id.clone(), VoiceAnalytics::first(m));
                }
            }
        }

        self.learning_iterations = self.learning_iterations.saturating_add(1);
    }

    /// Records an external revision of quality judgments.
    pub fn advance(&mut self) -> u64 {
        self.learning_iterations = self.learning_iterations.saturating_add(1);
        self.learning_iterations
    }
}
