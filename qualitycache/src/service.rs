use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::CacheError;
use crate::learning::{cache_efficiency, LearningState};
use crate::policy::{CacheConfig, CachePolicy, CacheStatus};
use crate::store::{LearningStore, QualityStore};
use crate::types::{CachedQualitySnapshot, QualityMetric, QualityOverview};

/// Result of [`QualityCacheService::set_cached_data`].
///
/// The snapshot is always persisted when this is returned. The learning
/// update is reported separately because its failure does not undo the write.
#[derive(Debug)]
pub struct CommitReport {
    pub snapshot: CachedQualitySnapshot,
    /// New learning iteration, or the error that prevented the update.
    pub learning: Result<u64, CacheError>,
}

impl CommitReport {
    pub fn learning_updated(&self) -> bool {
        self.learning.is_ok()
    }
}

/// Serves and refreshes the cached quality snapshot.
///
/// Construct once at the process entry point and share by reference.
/// Read paths take no lock; every read-modify-write of the stored
/// documents runs under a single writer lock, so concurrent refreshes
/// serialize and the last writer wins.
pub struct QualityCacheService {
    policy: CachePolicy,
    snapshots: Box<dyn QualityStore>,
    learning: Box<dyn LearningStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl QualityCacheService {
    pub fn new(
        cfg: CacheConfig,
        snapshots: Box<dyn QualityStore>,
        learning: Box<dyn LearningStore>,
    ) -> Self {
        Self::with_clock(cfg, snapshots, learning, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cfg: CacheConfig,
        snapshots: Box<dyn QualityStore>,
        learning: Box<dyn LearningStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy: CachePolicy::new(cfg),
            snapshots,
            learning,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Returns the stored snapshot if the policy allows serving it.
    ///
    /// `None` is a cache miss: the caller must recompute the metrics and
    /// call [`Self::set_cached_data`]. `force_refresh` always misses.
    pub fn get_cached_data(&self, force_refresh: bool) -> Option<CachedQualitySnapshot> {
        if force_refresh {
            tracing::debug!("qualitycache: forced refresh, bypassing cache");
            return None;
        }
        let snapshot = self.snapshots.load();
        let iteration = self.learning_state().learning_iterations;
        let verdict = self.policy.evaluate(snapshot.as_ref(), iteration, self.clock.now());
        if !verdict.is_servable() {
            tracing::debug!("qualitycache: miss: {}", verdict.reason());
            return None;
        }
        snapshot
    }

    /// Persists a fresh measurement pass and feeds it to the learning state.
    ///
    /// Fails only if the snapshot itself cannot be written.
    pub fn set_cached_data(
        &self,
        overview: QualityOverview,
        metrics: Vec<QualityMetric>,
    ) -> Result<CommitReport, CacheError> {
        let _guard = self.write_lock.lock();
        let now = self.clock.now();
        let cfg = *self.policy.config();

        let mut state = self.learning_state();
        let snapshot = CachedQualitySnapshot::new(
            overview,
            metrics,
            now,
            cfg.max_age(),
            state.learning_iterations,
        );
        self.snapshots.save(&snapshot)?;

        let efficiency = cache_efficiency(snapshot.age(self.clock.now()), cfg.max_age());
        state.commit(&snapshot.overview, &snapshot.metrics, efficiency, now);
        let learning = match self.learning.save(&state) {
            Ok(()) => Ok(state.learning_iterations),
            Err(e) => {
                tracing::error!("qualitycache: learning update failed, snapshot kept: {e}");
                Err(e)
            }
        };

        tracing::info!(
            voices = snapshot.overview.total_voices,
            health = %snapshot.overview.system_health,
            iteration = snapshot.learning_iteration,
            "qualitycache: snapshot committed"
        );
        Ok(CommitReport { snapshot, learning })
    }

    /// Deletes the stored snapshot. Idempotent.
    pub fn invalidate_cache(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock();
        self.snapshots.clear()?;
        tracing::info!("qualitycache: snapshot invalidated");
        Ok(())
    }

    /// Diagnostic view of the stored snapshot against the policy.
    pub fn get_cache_status(&self) -> CacheStatus {
        let snapshot = self.snapshots.load();
        let iteration = self.learning_state().learning_iterations;
        self.policy.status(snapshot.as_ref(), iteration, self.clock.now())
    }

    /// Records that the external learning process revised its judgments.
    /// Returns the new iteration.
    pub fn record_learning_iteration(&self) -> Result<u64, CacheError> {
        let _guard = self.write_lock.lock();
        let mut state = self.learning_state();
        let iteration = state.advance();
        self.learning.save(&state)?;
        tracing::debug!(iteration, "qualitycache: learning iteration recorded");
        Ok(iteration)
    }

    /// Current learning document, or the default state if none is stored.
    pub fn learning_state(&self) -> LearningState {
        let mut state = self.learning.load().unwrap_or_default();
        state
            .quality_trends
            .set_capacity(self.policy.config().max_trend_entries);
        state
    }
}
