//! Scaling cell operators

use super::CellOperator;
use relief_core::{assert_same_shape, Grid};

/// Scale values, capping them at a threshold first.
///
/// `out = v > threshold ? threshold * scale : v * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipScale {
    threshold: f32,
    scale: f32,
}

impl ClipScale {
    pub fn new(threshold: f32, scale: f32) -> Self {
        Self { threshold, scale }
    }
}

impl CellOperator for ClipScale {
    const NAME: &'static str = "ClipScale";

    fn apply(&self, value: f32, _row: usize, _col: usize) -> f32 {
        if value > self.threshold {
            self.threshold * self.scale
        } else {
            value * self.scale
        }
    }
}

/// Linear stretch of an observed value range onto `[lo, hi]`.
///
/// A grid without extent maps to `lo`; voids stay void.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleToRange {
    min: f32,
    range: f32,
    lo: f32,
    hi: f32,
}

impl ScaleToRange {
    /// Stretch the value range of `grid` onto `[lo, hi]`
    pub fn for_grid(grid: &Grid, lo: f32, hi: f32) -> Self {
        let (min, max) = grid.min_max().unwrap_or((0.0, 0.0));
        Self {
            min,
            range: max - min,
            lo,
            hi,
        }
    }
}

impl CellOperator for ScaleToRange {
    const NAME: &'static str = "ScaleToRange";

    fn apply(&self, value: f32, _row: usize, _col: usize) -> f32 {
        if value.is_nan() {
            value
        } else if self.range > 0.0 {
            self.lo + (value - self.min) / self.range * (self.hi - self.lo)
        } else {
            self.lo
        }
    }
}

/// Scale each cell by a factor blended between 1 and `scale` by a weight grid.
///
/// `out = in * (w * (scale - 1) + 1)`: a weight of 0 keeps the value, a
/// weight of 1 multiplies it by `scale`.
#[derive(Debug, Clone, Copy)]
pub struct WeightedScale<'a> {
    weight: &'a Grid,
    scale_minus_one: f32,
}

impl<'a> WeightedScale<'a> {
    pub fn new(weight: &'a Grid, scale: f32) -> Self {
        Self {
            weight,
            scale_minus_one: scale - 1.0,
        }
    }
}

impl CellOperator for WeightedScale<'_> {
    const NAME: &'static str = "WeightedScale";

    fn apply(&self, value: f32, row: usize, col: usize) -> f32 {
        let w = self.weight.data()[(row, col)];
        value * (w * self.scale_minus_one + 1.0)
    }

    fn check_inputs(&self, src: &Grid) {
        assert_same_shape(src, self.weight, Self::NAME);
    }
}

/// Merge plan curvature (the source) with maximum curvature into one ridge
/// indicator.
///
/// Positive plan curvature is scaled by `scale / plan_max`, negative by
/// `scale / |plan_min|`; maximum curvature is stretched onto `[0, 1]`. The
/// two are summed. A branch without extent contributes nothing.
#[derive(Debug, Clone, Copy)]
pub struct CurvatureCombine<'a> {
    max_curvature: &'a Grid,
    positive_plan_scale: f32,
    negative_plan_scale: f32,
    max_min: f32,
    max_range: f32,
}

impl<'a> CurvatureCombine<'a> {
    /// Prepare the scales from the value ranges of both curvature grids
    pub fn new(plan_curvature: &Grid, max_curvature: &'a Grid, scale: f32) -> Self {
        let (plan_min, plan_max) = plan_curvature.min_max().unwrap_or((0.0, 0.0));
        let (max_min, max_max) = max_curvature.min_max().unwrap_or((0.0, 0.0));
        Self {
            max_curvature,
            positive_plan_scale: if plan_max > 0.0 { scale / plan_max } else { 0.0 },
            negative_plan_scale: if plan_min < 0.0 { scale / -plan_min } else { 0.0 },
            max_min,
            max_range: max_max - max_min,
        }
    }
}

impl CellOperator for CurvatureCombine<'_> {
    const NAME: &'static str = "CurvatureCombine";

    fn apply(&self, plan: f32, row: usize, col: usize) -> f32 {
        let plan = if plan > 0.0 {
            plan * self.positive_plan_scale
        } else if plan < 0.0 {
            plan * self.negative_plan_scale
        } else {
            plan
        };

        let max = self.max_curvature.data()[(row, col)];
        let max = if self.max_range > 0.0 {
            (max - self.max_min) / self.max_range
        } else {
            // zero, keeping voids
            max * 0.0
        };

        plan + max
    }

    fn check_inputs(&self, src: &Grid) {
        assert_same_shape(src, self.max_curvature, Self::NAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::GridOperator;
    use approx::assert_relative_eq;
    use relief_parallel::ProcessingMode;

    fn row(values: &[f32]) -> Grid {
        Grid::from_vec(values.to_vec(), 1, values.len()).unwrap()
    }

    #[test]
    fn test_clip_scale_branches() {
        let op = ClipScale::new(2.0, 0.5);
        assert_eq!(op.apply(1.0, 0, 0), 0.5);
        assert_eq!(op.apply(2.0, 0, 0), 1.0);
        assert_eq!(op.apply(8.0, 0, 0), 1.0);
        assert_eq!(op.apply(-4.0, 0, 0), -2.0);
        assert!(op.apply(f32::NAN, 0, 0).is_nan());
    }

    #[test]
    fn test_scale_to_range() {
        let mut grid = row(&[2.0, 4.0, f32::NAN, 6.0]);
        ScaleToRange::for_grid(&grid, 0.0, 1.0).apply_in_place(&mut grid, ProcessingMode::Sequential);
        assert_eq!(grid.get(0, 0).unwrap(), 0.0);
        assert_eq!(grid.get(0, 1).unwrap(), 0.5);
        assert!(grid.get(0, 2).unwrap().is_nan());
        assert_eq!(grid.get(0, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_scale_to_range_without_extent() {
        let mut grid = Grid::filled(3, 3, 7.0);
        ScaleToRange::for_grid(&grid, -1.0, 1.0).apply_in_place(&mut grid, ProcessingMode::Sequential);
        assert_eq!(grid.min_max(), Some((-1.0, -1.0)));
    }

    #[test]
    fn test_weighted_scale_identities() {
        let input = row(&[3.0, -2.0, 10.0]);
        let zero = Grid::filled(1, 3, 0.0);
        let one = Grid::filled(1, 3, 1.0);
        let half = Grid::filled(1, 3, 0.5);

        assert_eq!(WeightedScale::new(&zero, 4.0).operate_new(&input), input);
        assert_eq!(WeightedScale::new(&half, 1.0).operate_new(&input), input);

        let scaled = WeightedScale::new(&one, 1.25).operate_new(&input);
        assert_relative_eq!(scaled.get(0, 0).unwrap(), 3.75);
        assert_relative_eq!(scaled.get(0, 1).unwrap(), -2.5);

        let blended = WeightedScale::new(&half, 3.0).operate_new(&input);
        assert_relative_eq!(blended.get(0, 2).unwrap(), 20.0);
    }

    #[test]
    fn test_curvature_combine() {
        let plan = row(&[-2.0, 0.0, 1.0, 4.0]);
        let max = row(&[1.0, 3.0, 5.0, 1.0]);
        let out = CurvatureCombine::new(&plan, &max, 1.5).operate_new(&plan);
        assert_relative_eq!(out.get(0, 0).unwrap(), -1.5);
        assert_relative_eq!(out.get(0, 1).unwrap(), 0.5);
        assert_relative_eq!(out.get(0, 2).unwrap(), 0.375 + 1.0);
        assert_relative_eq!(out.get(0, 3).unwrap(), 1.5);
    }

    #[test]
    fn test_curvature_combine_degenerate_ranges() {
        let zero = Grid::new(3, 3);
        let out = CurvatureCombine::new(&zero, &zero, 1.5).operate_new(&zero);
        assert_eq!(out.min_max(), Some((0.0, 0.0)));
    }
}
