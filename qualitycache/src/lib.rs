//! Persisted voice-quality snapshots with adaptive invalidation.
//!
//! Measuring voice quality is expensive, so the latest measurement pass is
//! kept as a single snapshot. A snapshot stays servable until one of:
//!
//! - its max age passes (default 30 minutes),
//! - it crosses the hard force-refresh ceiling (default 4 hours),
//! - the external learning process has advanced 5 or more iterations since
//!   the snapshot was captured.
//!
//! # Usage
//!
//! ```no_run
//! use voicelab_qualitycache::{
//!     CacheConfig, FileLearningStore, FileQualityStore, QualityCacheService, QualityMetric,
//!     QualityOverview,
//! };
//!
//! let svc = QualityCacheService::new(
//!     CacheConfig::default(),
//!     Box::new(FileQualityStore::new("data/quality_cache.json")),
//!     Box::new(FileLearningStore::new("data/learning_state.json")),
//! );
//!
//! if svc.get_cached_data(false).is_none() {
//!     let metrics: Vec<QualityMetric> = Vec::new(); // measured by the caller
//!     let overview = QualityOverview::from_metrics(&metrics);
//!     svc.set_cached_data(overview, metrics).unwrap();
//! }
//! ```
//!
//! # Failure model
//!
//! Missing and malformed documents load as absent, which is always a cache
//! miss. A learning-state write failure after a successful snapshot write is
//! reported in [`CommitReport`] but never rolls the snapshot back.

mod clock;
mod error;
mod learning;
mod policy;
mod service;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CacheError;
pub use learning::{
    cache_efficiency, LearningState, SystemPerformance, TrendDirection, TrendEntry, TrendHistory,
    VoiceAnalytics, DEFAULT_TREND_CAPACITY,
};
pub use policy::{
    CacheConfig, CachePolicy, CacheStatus, CacheVerdict, FORCE_REFRESH_HOURS_LIMIT,
    MAX_AGE_MINUTES_LIMIT,
};
pub use service::{CommitReport, QualityCacheService};
pub use store::{
    FileLearningStore, FileQualityStore, JsonFile, LearningStore, MemoryLearningStore,
    MemoryQualityStore, QualityStore,
};
pub use types::{CachedQualitySnapshot, QualityMetric, QualityOverview, SystemHealth, CACHE_VERSION};

#[cfg(test)]
mod tests;
