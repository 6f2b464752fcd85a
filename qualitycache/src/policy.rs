use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::learning::DEFAULT_TREND_CAPACITY;
use crate::types::CachedQualitySnapshot;

/// Fraction of the max age after which a refresh is recommended.
const REFRESH_AHEAD_RATIO: f64 = 0.8;

/// Largest accepted `max_age_minutes` (one year).
pub const MAX_AGE_MINUTES_LIMIT: u64 = 525_600;

/// Largest accepted `force_refresh_hours` (one year).
pub const FORCE_REFRESH_HOURS_LIMIT: u64 = 8_760;

/// Controls cache validity. Zero values fall back to defaults; durations
/// above one year are capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot lifetime. Default: 30.
    pub max_age_minutes: u64,

    /// Hard ceiling on snapshot age, independent of expiry. Default: 4.
    pub force_refresh_hours: u64,

    /// Learning iterations after which a snapshot is stale. Default: 5.
    pub learning_update_threshold: u64,

    /// Trend history capacity. Default: 50.
    pub max_trend_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: 30,
            force_refresh_hours: 4,
            learning_update_threshold: 5,
            max_trend_entries: DEFAULT_TREND_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn with_defaults(mut self) -> Self {
        let d = Self::default();
        if self.max_age_minutes == 0 {
            self.max_age_minutes = d.max_age_minutes;
        }
        if self.force_refresh_hours == 0 {
            self.force_refresh_hours = d.force_refresh_hours;
        }
        if self.learning_update_threshold == 0 {
            self.learning_update_threshold = d.learning_update_threshold;
        }
        if self.max_trend_entries == 0 {
            self.max_trend_entries = d.max_trend_entries;
        }
        if self.max_age_minutes > MAX_AGE_MINUTES_LIMIT {
            tracing::warn!(
                value = self.max_age_minutes,
                limit = MAX_AGE_MINUTES_LIMIT,
                "qualitycache: max_age_minutes capped"
            );
            self.max_age_minutes = MAX_AGE_MINUTES_LIMIT;
        }
        if self.force_refresh_hours > FORCE_REFRESH_HOURS_LIMIT {
            tracing::warn!(
                value = self.force_refresh_hours,
                limit = FORCE_REFRESH_HOURS_LIMIT,
                "qualitycache: force_refresh_hours capped"
            );
            self.force_refresh_hours = FORCE_REFRESH_HOURS_LIMIT;
        }
        self
    }

    /// Snapshot lifetime, capped at [`MAX_AGE_MINUTES_LIMIT`].
    pub fn max_age(&self) -> Duration {
        Duration::try_minutes(self.max_age_minutes.min(MAX_AGE_MINUTES_LIMIT) as i64)
            .unwrap_or(Duration::MAX)
    }

    /// Force-refresh ceiling, capped at [`FORCE_REFRESH_HOURS_LIMIT`].
    pub fn force_refresh_threshold(&self) -> Duration {
        Duration::try_hours(self.force_refresh_hours.min(FORCE_REFRESH_HOURS_LIMIT) as i64)
            .unwrap_or(Duration::MAX)
    }
}

/// Outcome of evaluating a snapshot, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CacheVerdict {
    /// All rules pass; the snapshot may be served.
    Fresh,
    /// No snapshot stored.
    Missing,
    /// `now >= expires_at`.
    Expired,
    /// Older than the force-refresh threshold.
    TooOld,
    /// Learning moved on by at least the threshold since capture.
    LearningAdvanced { iterations: u64 },
}

impl CacheVerdict {
    pub fn is_servable(&self) -> bool {
        matches!(self, CacheVerdict::Fresh)
    }

    pub fn reason(&self) -> String {
        match self {
            CacheVerdict::Fresh => "fresh".to_string(),
            CacheVerdict::Missing => "no cached snapshot".to_string(),
            CacheVerdict::Expired => "snapshot expired".to_string(),
            CacheVerdict::TooOld => "snapshot older than force-refresh threshold".to_string(),
            CacheVerdict::LearningAdvanced { iterations } => {
                format!("learning advanced {iterations} iterations since capture")
            }
        }
    }
}

/// Decides whether a cached snapshot may be served.
///
/// Rules, in order; the first failing rule decides:
///
/// 1. a snapshot exists
/// 2. `now < expires_at`
/// 3. `now - timestamp < force_refresh_threshold`
/// 4. `current_iteration - captured_iteration < learning_update_threshold`
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    cfg: CacheConfig,
}

impl CachePolicy {
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            cfg: cfg.with_defaults(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.cfg
    }

    pub fn evaluate(
        &self,
        snapshot: Option<&CachedQualitySnapshot>,
        current_iteration: u64,
        now: DateTime<Utc>,
    ) -> CacheVerdict {
        let Some(s) = snapshot else {
            return CacheVerdict::Missing;
        };
        if now >= s.expires_at {
            return CacheVerdict::Expired;
        }
        if now - s.timestamp >= self.cfg.force_refresh_threshold() {
            return CacheVerdict::TooOld;
        }
        // A reset learning document reads as no progress.
        let iterations = current_iteration.saturating_sub(s.learning_iteration);
        if iterations >= self.cfg.learning_update_threshold {
            return CacheVerdict::LearningAdvanced { iterations };
        }
        CacheVerdict::Fresh
    }

    pub fn is_servable(
        &self,
        snapshot: Option<&CachedQualitySnapshot>,
        current_iteration: u64,
        now: DateTime<Utc>,
    ) -> bool {
        self.evaluate(snapshot, current_iteration, now).is_servable()
    }

    /// Builds the diagnostic view of the same rules.
    pub fn status(
        &self,
        snapshot: Option<&CachedQualitySnapshot>,
        current_iteration: u64,
        now: DateTime<Utc>,
    ) -> CacheStatus {
        let verdict = self.evaluate(snapshot, current_iteration, now);
        let Some(s) = snapshot else {
            return CacheStatus {
                has_cache: false,
                valid: false,
                reason: verdict.reason(),
                verdict,
                created_at: None,
                expires_at: None,
                age_minutes: None,
                expires_in_minutes: None,
                captured_iteration: None,
                current_iteration,
                iterations_since_capture: None,
                refresh_recommended: true,
            };
        };

        let age = s.age(now);
        let near_expiry = age.num_milliseconds() as f64
            >= self.cfg.max_age().num_milliseconds() as f64 * REFRESH_AHEAD_RATIO;

        CacheStatus {
            has_cache: true,
            valid: verdict.is_servable(),
            reason: verdict.reason(),
            verdict,
            created_at: Some(s.timestamp),
            expires_at: Some(s.expires_at),
            age_minutes: Some(age.num_minutes()),
            expires_in_minutes: Some((s.expires_at - now).num_minutes().max(0)),
            captured_iteration: Some(s.learning_iteration),
            current_iteration,
            iterations_since_capture: Some(current_iteration.saturating_sub(s.learning_iteration)),
            refresh_recommended: !verdict.is_servable() || near_expiry,
        }
    }
}

/// Read-only diagnostic of the stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub has_cache: bool,
    pub valid: bool,
    pub verdict: CacheVerdict,
    pub reason: String,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub age_minutes: Option<i64>,
    pub expires_in_minutes: Option<i64>,
    pub captured_iteration: Option<u64>,
    pub current_iteration: u64,
    pub iterations_since_capture: Option<u64>,
    pub refresh_recommended: bool,
}
