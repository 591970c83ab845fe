//! Memoised epoch schedules.
//!
//! A schedule is a pure function of `(snapshot root, epoch)`, so entries never go stale on
//! their own. They only need dropping when the retained snapshot set is replaced, which
//! callers signal with [`ScheduleCache::clear`].

use crate::consensus::schedule::{EpochSchedule, ScheduleSource};
use crate::consensus::snapshot::BeaconSnapshot;
use crate::consensus::spec::ChainSpec;
use crate::consensus::types::{Epoch, Hash256};
use crate::utils::errors::{DutiesError, Result};
use crate::utils::metrics::{METRICS, SCHEDULE_CACHE_HITS, SCHEDULE_CACHE_MISSES};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub type ScheduleKey = (Hash256, Epoch);

#[derive(Clone, Default)]
pub struct ScheduleCache {
    entries: Arc<RwLock<HashMap<ScheduleKey, Arc<EpochSchedule>>>>,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ScheduleKey) -> Option<Arc<EpochSchedule>> {
        let hit = self.entries.read().get(key).cloned();
        if hit.is_some() {
            METRICS.inc_counter(SCHEDULE_CACHE_HITS);
        } else {
            METRICS.inc_counter(SCHEDULE_CACHE_MISSES);
        }
        hit
    }

    /// Insert unless present; returns the entry that ends up cached.
    pub fn insert(&self, key: ScheduleKey, schedule: Arc<EpochSchedule>) -> Arc<EpochSchedule> {
        self.entries.write().entry(key).or_insert(schedule).clone()
    }

    pub fn contains(&self, key: &ScheduleKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// A `ScheduleSource` fronted by a `ScheduleCache`.
pub struct Scheduler {
    source: Arc<dyn ScheduleSource>,
    cache: ScheduleCache,
    spec: ChainSpec,
}

impl Scheduler {
    pub fn new(source: Arc<dyn ScheduleSource>, cache: ScheduleCache, spec: ChainSpec) -> Self {
        Self { source, cache, spec }
    }

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    /// The schedule for `epoch` as decided by `snapshot`.
    ///
    /// Computed outside the cache lock; two concurrent misses may both compute, and the
    /// first insert wins.
    pub fn schedule_for(
        &self,
        snapshot: &BeaconSnapshot,
        epoch: Epoch,
    ) -> Result<Arc<EpochSchedule>> {
        let key = (snapshot.root(), epoch);
        if let Some(schedule) = self.cache.get(&key) {
            return Ok(schedule);
        }

        let schedule = self
            .source
            .compute(snapshot, epoch, &self.spec)
            .map_err(|e| match e {
                DutiesError::Internal(msg) => DutiesError::Internal(format!(
                    "Could not compute committee assignments: {}",
                    msg
                )),
                other => other,
            })?;
        if schedule.epoch != epoch {
            return Err(DutiesError::Internal(format!(
                "schedule source returned epoch {} for requested epoch {}",
                schedule.epoch, epoch
            )));
        }
        Ok(self.cache.insert(key, Arc::new(schedule)))
    }
}
