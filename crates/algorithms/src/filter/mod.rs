//! The relief filter pipeline
//!
//! Seven stages turn an elevation grid into a sculpted terrain:
//!
//! ```text
//! LevelOfDetail ──────────────┬──► RidgesExaggeration ──┐
//! RidgesWeight ───────────────┘                         │
//! LevelOfDetail ──────────────┬──► ValleysExaggeration ─┼──► FinalCombination
//! ValleysWeight ──────────────┘                         │
//! FlatMask ─────────────────────────────────────────────┘
//! ```
//!
//! Stage results are cached together with the parameters they were computed
//! from. A pass recomputes only the stages whose parameters changed and the
//! stages downstream of them. Results of a pass are staged and committed
//! only when the whole pass succeeds, so a cancelled pass leaves the cache
//! as it was.

mod output;
mod packages;
mod params;
mod progress;
mod stage;

pub use output::{FilterOutcome, FilterOutput, LayerKind};
pub use params::ReliefParams;
pub use progress::{CancelToken, NoProgress, ProgressSink};
pub use stage::{Stage, StageParams};

use crate::operators::{
    Assign, CellOperator, ClipScale, Combine, Curvature, CurvatureCombine, CurvatureKind,
    GridOperator, ScaleToRange, Slope, VoidFill, WeightedScale,
};
use crate::smoothing::{smooth, smooth_in_place};
use packages::WorkPackageGraph;
use relief_core::{Error, Grid, GridPool, Result};
use relief_parallel::ProcessingMode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Share of `grid_filter_loops` used for level of detail and flat areas
const DETAIL_LOOP_FACTOR: f64 = 0.4;
/// Share of the ridge and valley loop counts actually applied
const CURVATURE_LOOP_FACTOR: f64 = 0.7;
/// Replaces voids in the detail grid
const VOID_FILLER: f32 = 0.0;

type Staged = [Option<Arc<Grid>>; Stage::COUNT];

/// The loaded grid and what is derived from it once per load
#[derive(Debug, Clone)]
struct Inputs {
    /// As loaded, possibly with voids
    original: Arc<Grid>,
    /// Voids replaced; the same grid as `original` when it has none
    detail: Arc<Grid>,
    /// Slope of `detail` in radians, zero border
    slope: Arc<Grid>,
}

/// Incremental terrain sculpting filter
///
/// # Example
///
/// ```
/// use relief_algorithms::filter::{NoProgress, ReliefFilter};
/// use relief_core::Grid;
///
/// let mut filter = ReliefFilter::new();
/// filter.set_grid(Some(Grid::filled(10, 10, 100.0))).unwrap();
/// let outcome = filter.filter(&mut NoProgress).unwrap();
/// let result = outcome.output().unwrap().result();
/// assert_eq!(result.shape(), (10, 10));
/// ```
#[derive(Debug, Default)]
pub struct ReliefFilter {
    params: ReliefParams,
    mode: ProcessingMode,
    inputs: Option<Inputs>,
    pool: GridPool,
    graph: WorkPackageGraph,
}

impl ReliefFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ReliefParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    // Input

    /// Load a new grid, or unload with `None`.
    ///
    /// Every stage becomes stale. Grids smaller than 3x3 are rejected.
    pub fn set_grid(&mut self, grid: Option<Grid>) -> Result<()> {
        let Some(grid) = grid else {
            self.graph.reset(&self.pool);
            self.pool.clear();
            self.inputs = None;
            return Ok(());
        };

        let (rows, cols) = grid.shape();
        if rows < 3 || cols < 3 {
            return Err(Error::InvalidDimensions { cols, rows });
        }

        let start = Instant::now();
        let voids = grid.void_count();
        let original = Arc::new(grid);
        let detail = if voids > 0 {
            let mut detail = Grid::clone(&original);
            VoidFill::new(VOID_FILLER).apply_in_place(&mut detail, self.mode);
            Arc::new(detail)
        } else {
            Arc::clone(&original)
        };

        let mut slope = detail.like(0.0);
        Slope.operate_with(&detail, &mut slope, self.mode);

        self.graph.reset(&self.pool);
        self.pool.reset(original.grid_shape());
        self.inputs = Some(Inputs {
            original,
            detail,
            slope: Arc::new(slope),
        });

        info!(
            rows,
            cols,
            voids,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "grid loaded"
        );
        Ok(())
    }

    /// The loaded grid
    pub fn grid(&self) -> Option<&Arc<Grid>> {
        self.inputs.as_ref().map(|inputs| &inputs.original)
    }

    // Parameters

    pub fn params(&self) -> &ReliefParams {
        &self.params
    }

    /// Replace all parameters; takes effect on the next pass
    pub fn set_params(&mut self, params: ReliefParams) {
        self.params = params;
    }

    pub fn set_grid_filter_loops(&mut self, loops: u32) {
        self.params.grid_filter_loops = loops;
    }

    pub fn set_ridges_plan_curvature_weight(&mut self, weight: f32) {
        self.params.ridges_plan_curvature_weight = weight;
    }

    pub fn set_ridges_mean_filter_loops(&mut self, loops: u32) {
        self.params.ridges_mean_filter_loops = loops;
    }

    pub fn set_ridges_mean_filter_loops_for_combination(&mut self, loops: u32) {
        self.params.ridges_mean_filter_loops_for_combination = loops;
    }

    pub fn set_valleys_mean_filter_loops(&mut self, loops: u32) {
        self.params.valleys_mean_filter_loops = loops;
    }

    pub fn set_valleys_curvature_upper_limit(&mut self, limit: f32) {
        self.params.valleys_curvature_upper_limit = limit;
    }

    pub fn set_ridges_exaggeration(&mut self, exaggeration: f32) {
        self.params.ridges_exaggeration = exaggeration;
    }

    pub fn set_valleys_exaggeration(&mut self, exaggeration: f32) {
        self.params.valleys_exaggeration = exaggeration;
    }

    /// Slope in degrees separating flat from mountainous terrain
    pub fn set_combination_slope_threshold(&mut self, degrees: f32) {
        self.params.combination_slope_threshold = degrees;
    }

    pub fn processing_mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn set_processing_mode(&mut self, mode: ProcessingMode) {
        self.mode = mode;
    }

    // Diagnostics

    /// How often `stage` has been computed since this filter was created
    pub fn stage_runs(&self, stage: Stage) -> usize {
        self.graph.runs(stage)
    }

    /// Whether `stage` holds a committed result
    pub fn is_cached(&self, stage: Stage) -> bool {
        self.graph.is_cached(stage)
    }

    /// Scratch grids waiting in the pool
    pub fn pooled_buffers(&self) -> usize {
        self.pool.available()
    }

    /// Grids the pool has allocated since this filter was created
    pub fn allocated_buffers(&self) -> usize {
        self.pool.allocations()
    }

    // Processing

    /// Bring every stage up to date with the current parameters.
    ///
    /// Only dirty stages run. `progress` is told the number of dirty stages
    /// and may cancel before each of them.
    pub fn filter(&mut self, progress: &mut dyn ProgressSink) -> Result<FilterOutcome> {
        self.params.validate()?;
        let Some(inputs) = self.inputs.clone() else {
            return Ok(FilterOutcome::Empty);
        };

        progress.start();
        let dirty = self.graph.dirty_stages(&self.params);
        let total = dirty.iter().filter(|&&d| d).count();
        progress.set_total_stage_count(total);

        let start = Instant::now();
        let mut staged: Staged = Default::default();
        let mut done = 0;

        for stage in Stage::ORDER {
            if !dirty[stage.index()] {
                continue;
            }
            if progress.is_cancelled() {
                return Ok(self.cancel(staged));
            }
            progress.on_stage_begin(stage);
            if !progress.on_progress_percent((done * 100 / total) as u32) {
                return Ok(self.cancel(staged));
            }

            let stage_start = Instant::now();
            let result = self.process(stage, &inputs, &staged)?;
            self.graph.record_run(stage);
            debug!(
                stage = ?stage,
                elapsed_ms = stage_start.elapsed().as_millis() as u64,
                "stage computed"
            );

            staged[stage.index()] = Some(Arc::new(result));
            done += 1;
        }

        for stage in Stage::ORDER {
            if let Some(result) = staged[stage.index()].take() {
                let params = StageParams::snapshot(stage, &self.params);
                self.graph.commit(stage, result, params, &self.pool);
            }
        }
        progress.on_progress_percent(100);

        debug!(
            computed = total,
            pooled = self.pool.available(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "filter pass complete"
        );
        Ok(FilterOutcome::Completed(self.output(&inputs)?))
    }

    fn cancel(&self, staged: Staged) -> FilterOutcome {
        let discarded = staged.iter().flatten().count();
        for result in staged.into_iter().flatten() {
            self.pool.release_shared(result);
        }
        debug!(discarded, "filter pass cancelled");
        FilterOutcome::Cancelled
    }

    fn output(&self, inputs: &Inputs) -> Result<FilterOutput> {
        let cached = |stage: Stage| {
            self.graph
                .cached(stage)
                .cloned()
                .ok_or_else(|| Error::Other(format!("{stage:?} has no result")))
        };
        Ok(FilterOutput::new([
            Arc::clone(&inputs.original),
            cached(Stage::LevelOfDetail)?,
            cached(Stage::RidgesWeight)?,
            cached(Stage::FlatMask)?,
            cached(Stage::ValleysWeight)?,
            cached(Stage::RidgesExaggeration)?,
            cached(Stage::ValleysExaggeration)?,
            cached(Stage::FinalCombination)?,
        ]))
    }

    /// Result of `stage` for the running pass: staged if it ran in this
    /// pass, cached otherwise
    fn upstream<'a>(&'a self, stage: Stage, staged: &'a Staged) -> Result<&'a Grid> {
        staged[stage.index()]
            .as_deref()
            .or_else(|| self.graph.cached(stage).map(|result| &**result))
            .ok_or_else(|| Error::Other(format!("{stage:?} has not been computed")))
    }

    fn process(&self, stage: Stage, inputs: &Inputs, staged: &Staged) -> Result<Grid> {
        let params = &self.params;
        let mode = self.mode;
        let mut out = self.pool.acquire();

        match stage {
            Stage::LevelOfDetail => {
                let loops = DETAIL_LOOP_FACTOR * params.grid_filter_loops as f64;
                smooth(&inputs.detail, &mut out, loops, &self.pool, mode);
            }
            Stage::RidgesWeight => self.ridges_weight(&inputs.detail, &mut out),
            Stage::FlatMask => self.flat_mask(&inputs.slope, &mut out),
            Stage::ValleysWeight => self.valleys_weight(&inputs.detail, &mut out),
            Stage::RidgesExaggeration => {
                let lod = self.upstream(Stage::LevelOfDetail, staged)?;
                let weight = self.upstream(Stage::RidgesWeight, staged)?;
                WeightedScale::new(weight, params.ridges_exaggeration).operate_with(lod, &mut out, mode);
            }
            Stage::ValleysExaggeration => {
                let lod = self.upstream(Stage::LevelOfDetail, staged)?;
                let weight = self.upstream(Stage::ValleysWeight, staged)?;
                WeightedScale::new(weight, params.valleys_exaggeration).operate_with(lod, &mut out, mode);
            }
            Stage::FinalCombination => {
                let ridges = self.upstream(Stage::RidgesExaggeration, staged)?;
                let valleys = self.upstream(Stage::ValleysExaggeration, staged)?;
                let flat_mask = self.upstream(Stage::FlatMask, staged)?;
                Combine::new(valleys, flat_mask, &inputs.original).operate_with(ridges, &mut out, mode);
            }
        }

        Ok(out.into_inner().with_name(stage.layer().name()))
    }

    /// Ridge indicator in [0, 1] from plan and maximum curvature
    fn ridges_weight(&self, detail: &Grid, out: &mut Grid) {
        let params = &self.params;
        let (pool, mode) = (&self.pool, self.mode);

        let mut smoothed = pool.acquire();
        let loops = CURVATURE_LOOP_FACTOR * params.ridges_mean_filter_loops as f64;
        smooth(detail, &mut smoothed, loops, pool, mode);

        let mut max_curvature = pool.acquire();
        Curvature::new(CurvatureKind::PositiveMax).operate_with(&smoothed, &mut max_curvature, mode);
        max_curvature.fill_border(0.0);

        let mut plan_curvature = pool.acquire();
        Curvature::new(CurvatureKind::Plan).operate_with(&smoothed, &mut plan_curvature, mode);
        plan_curvature.fill_border(0.0);

        CurvatureCombine::new(&plan_curvature, &max_curvature, params.ridges_plan_curvature_weight)
            .operate_with(&plan_curvature, out, mode);

        let loops = CURVATURE_LOOP_FACTOR * params.ridges_mean_filter_loops_for_combination as f64;
        smooth_in_place(out, loops, pool, mode);
        ScaleToRange::for_grid(out, 0.0, 1.0).apply_in_place(out, mode);
    }

    /// 0 on flat terrain rising to 1 at the slope threshold
    fn flat_mask(&self, slope: &Grid, out: &mut Grid) {
        let params = &self.params;
        let (pool, mode) = (&self.pool, self.mode);

        if params.combination_slope_threshold <= 0.0 {
            Assign::new(1.0).apply_in_place(out, mode);
            return;
        }

        let loops = DETAIL_LOOP_FACTOR * params.grid_filter_loops as f64;
        smooth(slope, out, loops, pool, mode);
        let threshold = (params.combination_slope_threshold as f64).to_radians() as f32;
        ClipScale::new(threshold, 1.0 / threshold).apply_in_place(out, mode);
        smooth_in_place(out, loops, pool, mode);
    }

    /// Valley indicator in [0, 1] from negative minimum curvature
    fn valleys_weight(&self, detail: &Grid, out: &mut Grid) {
        let params = &self.params;
        let (pool, mode) = (&self.pool, self.mode);
        let limit = params.valleys_curvature_upper_limit;

        if limit <= 0.0 {
            Assign::new(0.0).apply_in_place(out, mode);
            return;
        }

        let mut smoothed = pool.acquire();
        let loops = CURVATURE_LOOP_FACTOR * params.valleys_mean_filter_loops as f64;
        smooth(detail, &mut smoothed, loops, pool, mode);

        Curvature::new(CurvatureKind::NegativeMin).operate_with(&smoothed, out, mode);
        out.fill_border(0.0);

        let max = out.min_max().map_or(0.0, |(_, max)| max);
        if max <= 0.0 {
            Assign::new(0.0).apply_in_place(out, mode);
            return;
        }
        let threshold = limit * max;
        ClipScale::new(threshold, 1.0 / threshold).apply_in_place(out, mode);
    }
}
