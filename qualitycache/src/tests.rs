use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Utc};

use crate::clock::ManualClock;
use crate::error::CacheError;
use crate::learning::{LearningState, TrendDirection};
use crate::policy::{CacheConfig, CacheVerdict};
use crate::service::QualityCacheService;
use crate::store::{
    FileLearningStore, FileQualityStore, LearningStore, MemoryLearningStore, MemoryQualityStore,
};
use crate::types::{QualityMetric, QualityOverview, SystemHealth};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn metric(id: &str, overall: f64, ready: bool) -> QualityMetric {
    QualityMetric {
        id: id.into(),
        name: format!("Voice {id}"),
        transcription_accuracy: 0.9,
        audio_clarity: 0.8,
        naturalness: 0.75,
        overall_score: overall,
        production_ready: ready,
        recommendations: if ready {
            Vec::new()
        } else {
            vec!["record a longer sample".into()]
        },
        last_tested: t0(),
    }
}

fn pass(avg: f64) -> (QualityOverview, Vec<QualityMetric>) {
    let metrics = vec![metric("a", avg, avg >= 0.8), metric("b", avg, avg >= 0.8)];
    (QualityOverview::from_metrics(&metrics), metrics)
}

fn memory_service(clock: Arc<ManualClock>, learning: LearningState) -> QualityCacheService {
    QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(MemoryQualityStore::new()),
        Box::new(MemoryLearningStore::with_state(learning)),
        clock,
    )
}

/// Learning store whose writes always fail.
struct BrokenLearningStore {
    state: LearningState,
}

impl LearningStore for BrokenLearningStore {
    fn load(&self) -> Option<LearningState> {
        Some(self.state.clone())
    }

    fn save(&self, _state: &LearningState) -> Result<(), CacheError> {
        Err(CacheError::Store("disk full".into()))
    }
}

// ---------------------------------------------------------------------------
// Round trip and miss paths
// ---------------------------------------------------------------------------

#[test]
fn set_then_get_round_trips() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock, LearningState::default());
    let (overview, metrics) = pass(0.9);

    svc.set_cached_data(overview.clone(), metrics.clone()).unwrap();

    let got = svc.get_cached_data(false).expect("fresh snapshot should be served");
    assert_eq!(got.overview, overview);
    assert_eq!(got.metrics, metrics);
    assert_eq!(got.expires_at - got.timestamp, Duration::minutes(30));
}

#[test]
fn empty_store_misses() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock, LearningState::default());
    assert!(svc.get_cached_data(false).is_none());
}

#[test]
fn force_refresh_bypasses_valid_snapshot() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock, LearningState::default());
    let (o, m) = pass(0.9);
    svc.set_cached_data(o, m).unwrap();

    assert!(svc.get_cached_data(true).is_none());
    assert!(svc.get_cached_data(false).is_some());
}

#[test]
fn snapshot_expires_after_max_age() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock.clone(), LearningState::default());
    let (o, m) = pass(0.9);
    svc.set_cached_data(o, m).unwrap();

    clock.advance(Duration::minutes(29));
    assert!(svc.get_cached_data(false).is_some());

    clock.advance(Duration::minutes(2));
    assert!(svc.get_cached_data(false).is_none());
    assert_eq!(svc.get_cache_status().verdict, CacheVerdict::Expired);
}

#[test]
fn learning_progress_makes_snapshot_stale() {
    let clock = Arc::new(ManualClock::new(t0()));
    let learning = LearningState {
        learning_iterations: 10,
        ..LearningState::default()
    };
    let svc = memory_service(clock, learning);
    let (o, m) = pass(0.9);

    let report = svc.set_cached_data(o, m).unwrap();
    assert_eq!(report.snapshot.learning_iteration, 10);
    assert_eq!(report.learning.as_ref().ok(), Some(&11));

    // 11 -> 14: delta 4, still fresh.
    for _ in 0..3 {
        svc.record_learning_iteration().unwrap();
    }
    assert!(svc.get_cached_data(false).is_some());

    // 14 -> 16: delta 6, stale although time-valid.
    svc.record_learning_iteration().unwrap();
    svc.record_learning_iteration().unwrap();
    assert_eq!(svc.learning_state().learning_iterations, 16);
    assert!(svc.get_cached_data(false).is_none());
    assert_eq!(
        svc.get_cache_status().verdict,
        CacheVerdict::LearningAdvanced { iterations: 6 }
    );
}

#[test]
fn oversized_config_does_not_panic() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = QualityCacheService::with_clock(
        CacheConfig {
            max_age_minutes: u64::MAX / 2,
            force_refresh_hours: u64::MAX,
            ..CacheConfig::default()
        },
        Box::new(MemoryQualityStore::new()),
        Box::new(MemoryLearningStore::new()),
        clock.clone(),
    );
    let (o, m) = pass(0.9);

    let report = svc.set_cached_data(o, m).unwrap();
    assert_eq!(
        report.snapshot.expires_at - report.snapshot.timestamp,
        Duration::minutes(crate::policy::MAX_AGE_MINUTES_LIMIT as i64)
    );

    clock.advance(Duration::days(300));
    assert!(svc.get_cached_data(false).is_some());
    assert!(svc.get_cache_status().valid);
}

#[test]
fn invalidate_is_idempotent() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock, LearningState::default());
    svc.invalidate_cache().unwrap();

    let (o, m) = pass(0.9);
    svc.set_cached_data(o, m).unwrap();
    svc.invalidate_cache().unwrap();
    assert!(svc.get_cached_data(false).is_none());
    assert!(!svc.get_cache_status().has_cache);
    svc.invalidate_cache().unwrap();
}

// ---------------------------------------------------------------------------
// Learning feedback
// ---------------------------------------------------------------------------

#[test]
fn learning_failure_keeps_snapshot() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(MemoryQualityStore::new()),
        Box::new(BrokenLearningStore {
            state: LearningState::default(),
        }),
        clock,
    );
    let (o, m) = pass(0.9);

    let report = svc.set_cached_data(o.clone(), m).unwrap();
    assert!(!report.learning_updated());
    assert!(matches!(report.learning, Err(CacheError::Store(_))));

    let got = svc.get_cached_data(false).expect("snapshot must survive learning failure");
    assert_eq!(got.overview, o);
}

#[test]
fn commits_build_trend_history() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock.clone(), LearningState::default());

    for avg in [0.6, 0.65, 0.7, 0.75, 0.8] {
        let (o, m) = pass(avg);
        svc.set_cached_data(o, m).unwrap();
        clock.advance(Duration::minutes(5));
    }

    let state = svc.learning_state();
    assert_eq!(state.learning_iterations, 5);
    assert_eq!(state.quality_trends.len(), 5);
    assert_eq!(state.system_performance.trend_direction, TrendDirection::Improving);
    assert_eq!(state.system_performance.health_score, SystemHealth::Good.score());
    assert_eq!(state.system_performance.cache_efficiency, 100);
    assert_eq!(state.voice_analytics["a"].samples, 5);
}

#[test]
fn trend_history_stays_bounded() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock.clone(), LearningState::default());

    for _ in 0..60 {
        let (o, m) = pass(0.7);
        svc.set_cached_data(o, m).unwrap();
        clock.advance(Duration::minutes(1));
        assert!(svc.learning_state().quality_trends.len() <= 50);
    }

    let state = svc.learning_state();
    assert_eq!(state.quality_trends.len(), 50);
    // Commits at minutes 0..60; the first ten were evicted.
    let oldest = state.quality_trends.iter().next().unwrap();
    assert_eq!(oldest.timestamp, t0() + Duration::minutes(10));
    assert_eq!(state.quality_trends.latest().unwrap().timestamp, t0() + Duration::minutes(59));
}

#[test]
fn custom_trend_capacity() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = QualityCacheService::with_clock(
        CacheConfig {
            max_trend_entries: 3,
            ..CacheConfig::default()
        },
        Box::new(MemoryQualityStore::new()),
        Box::new(MemoryLearningStore::new()),
        clock,
    );
    for _ in 0..5 {
        let (o, m) = pass(0.7);
        svc.set_cached_data(o, m).unwrap();
    }
    assert_eq!(svc.learning_state().quality_trends.len(), 3);
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[test]
fn status_reports_age_and_iterations() {
    let clock = Arc::new(ManualClock::new(t0()));
    let svc = memory_service(clock.clone(), LearningState::default());
    let (o, m) = pass(0.9);
    svc.set_cached_data(o, m).unwrap();

    clock.advance(Duration::minutes(12));
    let st = svc.get_cache_status();
    assert!(st.has_cache);
    assert!(st.valid);
    assert_eq!(st.age_minutes, Some(12));
    assert_eq!(st.captured_iteration, Some(0));
    assert_eq!(st.current_iteration, 1);
    assert!(!st.refresh_recommended);
}

// ---------------------------------------------------------------------------
// File-backed service
// ---------------------------------------------------------------------------

#[test]
fn file_backed_service_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let snap_path = dir.path().join("quality_cache.json");
    let learn_path = dir.path().join("learning_state.json");
    let clock = Arc::new(ManualClock::new(t0()));

    let svc = QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(FileQualityStore::new(&snap_path)),
        Box::new(FileLearningStore::new(&learn_path)),
        clock.clone(),
    );
    let (o, m) = pass(0.9);
    svc.set_cached_data(o.clone(), m.clone()).unwrap();

    // A second service over the same files sees the same state.
    let other = QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(FileQualityStore::new(&snap_path)),
        Box::new(FileLearningStore::new(&learn_path)),
        clock,
    );
    let got = other.get_cached_data(false).unwrap();
    assert_eq!(got.overview, o);
    assert_eq!(got.metrics, m);
    assert_eq!(other.learning_state().learning_iterations, 1);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&learn_path).unwrap()).unwrap();
    assert_eq!(raw["learningIterations"], 1);
    assert_eq!(raw["qualityTrends"].as_array().unwrap().len(), 1);
    assert_eq!(raw["systemPerformance"]["trendDirection"], "insufficient_data");
}

#[test]
fn corrupt_files_degrade_to_miss_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let snap_path = dir.path().join("quality_cache.json");
    let learn_path = dir.path().join("learning_state.json");
    std::fs::write(&snap_path, "garbage").unwrap();
    std::fs::write(&learn_path, "{").unwrap();

    let svc = QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(FileQualityStore::new(&snap_path)),
        Box::new(FileLearningStore::new(&learn_path)),
        Arc::new(ManualClock::new(t0())),
    );
    assert!(svc.get_cached_data(false).is_none());
    assert_eq!(svc.learning_state(), LearningState::default());

    // Recomputing overwrites both documents with valid content.
    let (o, m) = pass(0.9);
    let report = svc.set_cached_data(o, m).unwrap();
    assert!(report.learning_updated());
    assert!(svc.get_cached_data(false).is_some());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_commits_serialize() {
    let dir = tempfile::tempdir().unwrap();
    let svc = Arc::new(QualityCacheService::with_clock(
        CacheConfig::default(),
        Box::new(FileQualityStore::new(dir.path().join("quality_cache.json"))),
        Box::new(FileLearningStore::new(dir.path().join("learning_state.json"))),
        Arc::new(ManualClock::new(t0())),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                let (o, m) = pass(0.5 + i as f64 * 0.05);
                svc.set_cached_data(o, m).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Every commit's read-modify-write landed; none were lost.
    let state = svc.learning_state();
    assert_eq!(state.learning_iterations, 8);
    assert_eq!(state.quality_trends.len(), 8);
    assert!(svc.get_cached_data(false).is_some());
}

