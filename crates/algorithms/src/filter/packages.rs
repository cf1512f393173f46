//! Cached stage results and dirty tracking

use super::params::ReliefParams;
use super::stage::{Stage, StageParams};
use relief_core::{Grid, GridPool};
use std::sync::Arc;

/// Cache slot of one stage
#[derive(Debug, Clone, Default)]
pub(crate) enum CacheEntry {
    #[default]
    Stale,
    Computed {
        result: Arc<Grid>,
        params: StageParams,
    },
}

/// The stages' cached results and their parameter snapshots
#[derive(Debug, Default)]
pub(crate) struct WorkPackageGraph {
    entries: [CacheEntry; Stage::COUNT],
    runs: [usize; Stage::COUNT],
}

impl WorkPackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every stage stale, recycling results nobody else holds
    pub fn reset(&mut self, pool: &GridPool) {
        for entry in &mut self.entries {
            if let CacheEntry::Computed { result, .. } = std::mem::take(entry) {
                pool.release_shared(result);
            }
        }
    }

    /// Which stages must run for `params`, indexed by [`Stage::index`].
    ///
    /// A stage is dirty when it has no result, when its snapshot differs
    /// from `params`, or when any of its dependencies is dirty.
    pub fn dirty_stages(&self, params: &ReliefParams) -> [bool; Stage::COUNT] {
        let mut dirty = [false; Stage::COUNT];
        for stage in Stage::ORDER {
            let own = match &self.entries[stage.index()] {
                CacheEntry::Stale => true,
                CacheEntry::Computed { params: snapshot, .. } => {
                    *snapshot != StageParams::snapshot(stage, params)
                }
            };
            dirty[stage.index()] =
                own || stage.dependencies().iter().any(|dep| dirty[dep.index()]);
        }
        dirty
    }

    /// Cached result of `stage`
    pub fn cached(&self, stage: Stage) -> Option<&Arc<Grid>> {
        match &self.entries[stage.index()] {
            CacheEntry::Computed { result, .. } => Some(result),
            CacheEntry::Stale => None,
        }
    }

    pub fn is_cached(&self, stage: Stage) -> bool {
        self.cached(stage).is_some()
    }

    /// Replace the entry of `stage`, recycling the previous result if
    /// nobody else holds it
    pub fn commit(&mut self, stage: Stage, result: Arc<Grid>, params: StageParams, pool: &GridPool) {
        let previous = std::mem::replace(
            &mut self.entries[stage.index()],
            CacheEntry::Computed { result, params },
        );
        if let CacheEntry::Computed { result, .. } = previous {
            pool.release_shared(result);
        }
    }

    pub fn record_run(&mut self, stage: Stage) {
        self.runs[stage.index()] += 1;
    }

    /// How often `stage` has been computed
    pub fn runs(&self, stage: Stage) -> usize {
        self.runs[stage.index()]
    }
}
