//! End-to-end tests of the relief filter on synthetic terrain.

use approx::assert_relative_eq;
use relief_algorithms::filter::{
    CancelToken, FilterOutcome, FilterOutput, LayerKind, NoProgress, ProgressSink, ReliefFilter,
    Stage,
};
use relief_algorithms::operators::{Curvature, CurvatureKind, GridOperator, Slope};
use relief_core::{Grid, GridGeometry};
use relief_parallel::ProcessingMode;
use std::sync::Arc;

/// Parallel ridges running north-south on a slope rising towards north
fn ridged_terrain(rows: usize, cols: usize) -> Grid {
    let data = (0..rows * cols)
        .map(|i| {
            let (row, col) = ((i / cols) as f32, (i % cols) as f32);
            500.0 + 40.0 * (col * 0.45).sin() + 15.0 * (row * 0.2).cos() - 3.0 * row
        })
        .collect();
    Grid::from_vec(data, rows, cols)
        .unwrap()
        .with_geometry(GridGeometry::new(1000.0, 2000.0, 10.0).unwrap())
}

fn completed(filter: &mut ReliefFilter, progress: &mut dyn ProgressSink) -> FilterOutput {
    match filter.filter(progress).unwrap() {
        FilterOutcome::Completed(output) => output,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

fn runs(filter: &ReliefFilter) -> Vec<usize> {
    Stage::ORDER.iter().map(|&s| filter.stage_runs(s)).collect()
}

fn assert_all_close(grid: &Grid, expected: f32) {
    for &v in grid.data().iter() {
        assert_relative_eq!(v, expected, epsilon = 1e-4);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start,
    Total(usize),
    Begin(Stage),
    Percent(u32),
}

/// Records every call; optionally refuses the n-th progress update
#[derive(Debug, Default)]
struct Recorder {
    events: Vec<Event>,
    refuse_update: Option<usize>,
    updates: usize,
}

impl Recorder {
    fn refusing_update(n: usize) -> Self {
        Self {
            refuse_update: Some(n),
            ..Self::default()
        }
    }

    fn begun(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Begin(stage) => Some(*stage),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for Recorder {
    fn start(&mut self) {
        self.events.push(Event::Start);
    }

    fn set_total_stage_count(&mut self, count: usize) {
        self.events.push(Event::Total(count));
    }

    fn on_stage_begin(&mut self, stage: Stage) {
        self.events.push(Event::Begin(stage));
    }

    fn on_progress_percent(&mut self, percent: u32) -> bool {
        self.events.push(Event::Percent(percent));
        self.updates += 1;
        self.refuse_update != Some(self.updates)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[test]
fn flat_grid_stays_flat() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(Grid::filled(10, 10, 100.0))).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    assert_all_close(output.result(), 100.0);
    assert_all_close(output.get(LayerKind::LevelOfDetail), 100.0);
    assert_all_close(output.get(LayerKind::RidgesWeight), 0.0);
    assert_all_close(output.get(LayerKind::ValleysWeight), 0.0);
    assert_all_close(output.get(LayerKind::FlatMask), 0.0);
}

#[test]
fn every_layer_keeps_the_input_shape() {
    let dem = ridged_terrain(40, 50);
    let shape = dem.grid_shape();
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(dem)).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    for (kind, grid) in output.layers() {
        assert_eq!(grid.grid_shape(), shape, "{kind}");
        assert!(!grid.has_voids(), "{kind}");
    }
    assert_eq!(output.result().name(), Some("Result"));
    assert!(Arc::ptr_eq(output.by_name("Result").unwrap(), output.result()));
    assert!(output.by_name("Nonexistent").is_none());
}

#[test]
fn weights_stay_in_unit_range() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(40, 40))).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    for kind in [LayerKind::RidgesWeight, LayerKind::FlatMask, LayerKind::ValleysWeight] {
        let (min, max) = output.get(kind).min_max().unwrap();
        assert!(min >= -1e-6 && max <= 1.0 + 1e-6, "{kind}: {min}..{max}");
    }
}

#[test]
fn sequential_and_parallel_agree() {
    let dem = ridged_terrain(33, 27);
    let mut sequential = ReliefFilter::new();
    sequential.set_processing_mode(ProcessingMode::Sequential);
    sequential.set_grid(Some(dem.clone())).unwrap();
    let mut parallel = ReliefFilter::new();
    parallel.set_processing_mode(ProcessingMode::ParallelWith(4));
    parallel.set_grid(Some(dem)).unwrap();

    let a = completed(&mut sequential, &mut NoProgress);
    let b = completed(&mut parallel, &mut NoProgress);
    for ((kind, x), (_, y)) in a.layers().zip(b.layers()) {
        assert_eq!(x.data(), y.data(), "{kind}");
    }
}

#[test]
fn voids_reach_the_result_only() {
    let mut dem = ridged_terrain(20, 20);
    dem.set(0, 0, f32::NAN).unwrap();
    dem.set(7, 9, f32::NAN).unwrap();

    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(dem)).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    let result = output.result();
    assert!(result.get(0, 0).unwrap().is_nan());
    assert!(result.get(7, 9).unwrap().is_nan());
    assert_eq!(result.void_count(), 2);
    assert_eq!(output.get(LayerKind::Original).void_count(), 2);
    assert!(!output.get(LayerKind::LevelOfDetail).has_voids());
}

// ---------------------------------------------------------------------------
// Degenerate parameters
// ---------------------------------------------------------------------------

#[test]
fn zero_slope_threshold_selects_ridges_everywhere() {
    let mut filter = ReliefFilter::new();
    filter.set_combination_slope_threshold(0.0);
    filter.set_grid(Some(ridged_terrain(25, 25))).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    assert_all_close(output.get(LayerKind::FlatMask), 1.0);
    assert_eq!(
        output.result().data(),
        output.get(LayerKind::RidgesExaggeration).data()
    );
}

#[test]
fn zero_valley_limit_disables_valleys() {
    let mut filter = ReliefFilter::new();
    filter.set_valleys_curvature_upper_limit(0.0);
    filter.set_grid(Some(ridged_terrain(25, 25))).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    assert_all_close(output.get(LayerKind::ValleysWeight), 0.0);
    assert_eq!(
        output.get(LayerKind::ValleysExaggeration).data(),
        output.get(LayerKind::LevelOfDetail).data()
    );
}

#[test]
fn unit_exaggeration_keeps_level_of_detail() {
    let mut filter = ReliefFilter::new();
    filter.set_ridges_exaggeration(1.0);
    filter.set_valleys_exaggeration(1.0);
    filter.set_grid(Some(ridged_terrain(25, 25))).unwrap();
    let output = completed(&mut filter, &mut NoProgress);

    let lod = output.get(LayerKind::LevelOfDetail);
    assert_eq!(output.get(LayerKind::RidgesExaggeration).data(), lod.data());
    for (r, l) in output.result().data().iter().zip(lod.data().iter()) {
        assert_relative_eq!(*r, *l, max_relative = 1e-5);
    }
}

#[test]
fn zero_loops_copy_the_input() {
    let dem = ridged_terrain(15, 15);
    let mut filter = ReliefFilter::new();
    filter.set_grid_filter_loops(0);
    filter.set_grid(Some(dem.clone())).unwrap();
    let output = completed(&mut filter, &mut NoProgress);
    assert_eq!(output.get(LayerKind::LevelOfDetail).data(), dem.data());
}

// ---------------------------------------------------------------------------
// Incremental recomputation
// ---------------------------------------------------------------------------

#[test]
fn first_pass_reports_every_stage() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(12, 12))).unwrap();
    let mut recorder = Recorder::default();
    completed(&mut filter, &mut recorder);

    let mut expected = vec![Event::Start, Event::Total(7)];
    for (i, stage) in Stage::ORDER.into_iter().enumerate() {
        expected.push(Event::Begin(stage));
        expected.push(Event::Percent((i * 100 / 7) as u32));
    }
    expected.push(Event::Percent(100));
    assert_eq!(recorder.events, expected);
    assert_eq!(runs(&filter), vec![1; 7]);
}

#[test]
fn repeated_pass_reuses_every_result() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(20, 20))).unwrap();
    let first = completed(&mut filter, &mut NoProgress);

    let mut recorder = Recorder::default();
    let second = completed(&mut filter, &mut recorder);

    assert_eq!(runs(&filter), vec![1; 7]);
    assert_eq!(
        recorder.events,
        vec![Event::Start, Event::Total(0), Event::Percent(100)]
    );
    for ((kind, a), (_, b)) in first.layers().zip(second.layers()) {
        assert!(Arc::ptr_eq(a, b), "{kind} was recomputed");
    }
}

#[test]
fn ridge_exaggeration_change_reruns_downstream_only() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(20, 20))).unwrap();
    let first = completed(&mut filter, &mut NoProgress);

    filter.set_ridges_exaggeration(2.0);
    let mut recorder = Recorder::default();
    let second = completed(&mut filter, &mut recorder);

    assert_eq!(
        recorder.begun(),
        vec![Stage::RidgesExaggeration, Stage::FinalCombination]
    );
    assert_eq!(runs(&filter), vec![1, 1, 1, 1, 2, 1, 2]);
    assert!(Arc::ptr_eq(
        first.get(LayerKind::LevelOfDetail),
        second.get(LayerKind::LevelOfDetail)
    ));
    assert!(!Arc::ptr_eq(first.result(), second.result()));
}

#[test]
fn loading_a_grid_invalidates_everything() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(10, 10))).unwrap();
    completed(&mut filter, &mut NoProgress);
    filter.set_grid(Some(ridged_terrain(10, 10))).unwrap();
    completed(&mut filter, &mut NoProgress);
    assert_eq!(runs(&filter), vec![2; 7]);
}

#[test]
fn held_results_survive_later_passes() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(16, 16))).unwrap();
    let first = completed(&mut filter, &mut NoProgress);
    let kept = first.result().data().clone();

    for exaggeration in [1.5, 2.0, 2.5] {
        filter.set_ridges_exaggeration(exaggeration);
        completed(&mut filter, &mut NoProgress);
    }
    assert_eq!(first.result().data(), &kept);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancelled_before_start_computes_nothing() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(10, 10))).unwrap();
    let mut token = CancelToken::new();
    token.cancel();

    assert!(filter.filter(&mut token).unwrap().is_cancelled());
    assert_eq!(runs(&filter), vec![0; 7]);
    assert!(Stage::ORDER.iter().all(|&s| !filter.is_cached(s)));
}

#[test]
fn cancelled_pass_keeps_the_cache() {
    let mut filter = ReliefFilter::new();
    filter.set_grid(Some(ridged_terrain(20, 20))).unwrap();
    let first = completed(&mut filter, &mut NoProgress);
    let pooled = filter.pooled_buffers();
    let allocated = filter.allocated_buffers();

    // Refuse the update before FinalCombination, after RidgesExaggeration ran
    filter.set_ridges_exaggeration(3.0);
    let mut recorder = Recorder::refusing_update(2);
    assert!(filter.filter(&mut recorder).unwrap().is_cancelled());

    assert_eq!(
        recorder.begun(),
        vec![Stage::RidgesExaggeration, Stage::FinalCombination]
    );
    assert_eq!(filter.stage_runs(Stage::RidgesExaggeration), 2);
    assert!(Stage::ORDER.iter().all(|&s| filter.is_cached(s)));

    // The staged RidgesExaggeration grid was the only new buffer and went
    // back to the pool
    assert_eq!(filter.allocated_buffers(), allocated + 1);
    assert_eq!(filter.pooled_buffers(), pooled + 1, "staged result returned to the pool");

    // The discarded stage is still dirty
    let mut recorder = Recorder::default();
    let second = completed(&mut filter, &mut recorder);
    assert_eq!(
        recorder.begun(),
        vec![Stage::RidgesExaggeration, Stage::FinalCombination]
    );
    // RidgesExaggeration reuses the recycled grid, only FinalCombination allocates
    assert_eq!(filter.allocated_buffers(), allocated + 2);
    assert_eq!(filter.pooled_buffers(), pooled);
    assert!(Arc::ptr_eq(
        first.get(LayerKind::RidgesWeight),
        second.get(LayerKind::RidgesWeight)
    ));
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[test]
fn neighborhood_operators_leave_the_border() {
    const SENTINEL: f32 = -999.0;
    let dem = ridged_terrain(12, 15);
    let operators: Vec<Box<dyn GridOperator>> = vec![
        Box::new(Slope),
        Box::new(Curvature::new(CurvatureKind::PositiveMax)),
        Box::new(Curvature::new(CurvatureKind::NegativeMin)),
        Box::new(Curvature::new(CurvatureKind::Plan)),
        Box::new(Curvature::new(CurvatureKind::Profile)),
    ];

    for op in operators {
        let mut dst = dem.like(SENTINEL);
        op.operate(&dem, &mut dst);
        let (rows, cols) = dst.shape();
        for row in 0..rows {
            for col in 0..cols {
                let v = dst.get(row, col).unwrap();
                let border = row == 0 || col == 0 || row == rows - 1 || col == cols - 1;
                if border {
                    assert_eq!(v, SENTINEL, "{} wrote ({row}, {col})", op.name());
                } else {
                    assert_ne!(v, SENTINEL, "{} skipped ({row}, {col})", op.name());
                    assert!(v.is_finite());
                }
            }
        }
    }
}
