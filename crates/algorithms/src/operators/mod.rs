//! Grid operators
//!
//! An operator reads a source grid and writes a destination grid of the
//! identical [`GridShape`](relief_core::GridShape). The destination is cut
//! into disjoint [`RowBand`]s that are filled independently, sequentially
//! or on worker threads depending on the [`ProcessingMode`].
//!
//! Two families exist:
//! - neighborhood operators (slope, curvatures) read a 3x3 window and only
//!   write the interior `[1, rows-1) x [1, cols-1)`; the border of the
//!   destination is left as it was
//! - cell operators ([`CellOperator`]) map each cell on its own and write
//!   every cell, including the border

mod combine;
mod curvature;
mod scale;
mod slope;

pub use combine::{Assign, Combine, VoidFill};
pub use curvature::{Curvature, CurvatureKind, Derivatives};
pub use scale::{ClipScale, CurvatureCombine, ScaleToRange, WeightedScale};
pub use slope::Slope;

use ndarray::s;
use relief_core::{assert_same_shape, Grid, RowBand};
use relief_parallel::{ParallelStrategy, ProcessingMode};
use std::ops::Range;

/// A transform from a source grid to a same-shaped destination grid
pub trait GridOperator: Sync {
    /// Operator name used in diagnostics
    fn name(&self) -> &'static str;

    /// Write the rows of `band` from `src`.
    ///
    /// `band` may cover any contiguous row range of the destination; row
    /// indices are global grid rows.
    fn operate_rows(&self, src: &Grid, band: RowBand<'_>);

    /// Check auxiliary input grids against `src`. Panics on mismatch.
    fn check_inputs(&self, _src: &Grid) {}

    /// Run over all rows with the default processing mode
    #[track_caller]
    fn operate(&self, src: &Grid, dst: &mut Grid) {
        self.operate_with(src, dst, ProcessingMode::default());
    }

    /// Run over all rows with an explicit processing mode
    #[track_caller]
    fn operate_with(&self, src: &Grid, dst: &mut Grid, mode: ProcessingMode) {
        let rows = dst.rows();
        self.operate_range(src, dst, 0..rows, mode);
    }

    /// Run over the destination rows in `rows` only.
    ///
    /// # Panics
    /// If `src` and `dst` differ in shape or geometry, or `rows` exceeds the
    /// grid.
    #[track_caller]
    fn operate_range(&self, src: &Grid, dst: &mut Grid, rows: Range<usize>, mode: ProcessingMode) {
        assert_same_shape(src, dst, self.name());
        self.check_inputs(src);
        assert!(
            rows.start <= rows.end && rows.end <= dst.rows(),
            "{}: row range {}..{} outside grid of {} rows",
            self.name(),
            rows.start,
            rows.end,
            dst.rows()
        );

        let first_row = rows.start;
        let view = dst.view_mut().slice_move(s![rows, ..]);
        mode.for_each_row_band(view, first_row, |band| self.operate_rows(src, band));
    }

    /// Run into a freshly allocated zeroed grid
    fn operate_new(&self, src: &Grid) -> Grid {
        let mut dst = src.like(0.0);
        self.operate(src, &mut dst);
        dst
    }
}

/// A per-cell transform
///
/// Every cell operator is a [`GridOperator`] that writes all cells of the
/// destination. It can also rewrite a grid in place.
pub trait CellOperator: Sync {
    /// Operator name used in diagnostics
    const NAME: &'static str;

    /// New value of the cell at (`row`, `col`) holding `value`
    fn apply(&self, value: f32, row: usize, col: usize) -> f32;

    /// Check auxiliary input grids against `src`. Panics on mismatch.
    fn check_inputs(&self, _src: &Grid) {}

    /// Replace every cell of `grid` with its transformed value
    #[track_caller]
    fn apply_in_place(&self, grid: &mut Grid, mode: ProcessingMode) {
        CellOperator::check_inputs(self, grid);
        mode.for_each_row_band(grid.view_mut(), 0, |mut band| {
            band.for_each_cell_mut(|row, col, cell| *cell = self.apply(*cell, row, col));
        });
    }
}

impl<T: CellOperator> GridOperator for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn operate_rows(&self, src: &Grid, mut band: RowBand<'_>) {
        let src = src.view();
        band.for_each_cell_mut(|row, col, cell| *cell = self.apply(src[(row, col)], row, col));
    }

    fn check_inputs(&self, src: &Grid) {
        CellOperator::check_inputs(self, src);
    }
}

/// Evaluate `f` on the 3x3 window of every interior cell in `band`.
///
/// The window holds `z1..z9` in reading order (north-west first, row 0 is
/// north). A void anywhere in the window writes a void.
pub(crate) fn for_each_interior_window<F>(src: &Grid, band: &mut RowBand<'_>, f: F)
where
    F: Fn(&[f64; 9]) -> f64,
{
    let (rows, cols) = src.shape();
    if rows < 3 || cols < 3 {
        return;
    }

    let data = src.view();
    let range = band.row_range();
    for row in range.start.max(1)..range.end.min(rows - 1) {
        let mut out = band.row_mut(row);
        for col in 1..cols - 1 {
            let z: [f64; 9] =
                std::array::from_fn(|i| data[(row + i / 3 - 1, col + i % 3 - 1)] as f64);
            out[col] = if z.iter().any(|v| v.is_nan()) {
                f32::NAN
            } else {
                f(&z) as f32
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    impl CellOperator for Double {
        const NAME: &'static str = "Double";

        fn apply(&self, value: f32, _row: usize, _col: usize) -> f32 {
            value * 2.0
        }
    }

    /// Writes the window center, so the border must keep its old value
    struct Center;

    impl GridOperator for Center {
        fn name(&self) -> &'static str {
            "Center"
        }

        fn operate_rows(&self, src: &Grid, mut band: RowBand<'_>) {
            for_each_interior_window(src, &mut band, |z| z[4]);
        }
    }

    fn ramp(rows: usize, cols: usize) -> Grid {
        Grid::from_vec((0..rows * cols).map(|v| v as f32).collect(), rows, cols).unwrap()
    }

    #[test]
    fn test_cell_operator_writes_every_cell() {
        let src = ramp(5, 4);
        let mut dst = Grid::filled(5, 4, -1.0);
        Double.operate_with(&src, &mut dst, ProcessingMode::ParallelWith(2));
        assert_eq!(dst.get(0, 0).unwrap(), 0.0);
        assert_eq!(dst.get(4, 3).unwrap(), 38.0);
    }

    #[test]
    fn test_apply_in_place() {
        let mut grid = ramp(3, 3);
        Double.apply_in_place(&mut grid, ProcessingMode::Sequential);
        assert_eq!(grid.get(2, 2).unwrap(), 16.0);
    }

    #[test]
    fn test_operate_range_limits_rows() {
        let src = ramp(6, 3);
        let mut dst = Grid::new(6, 3);
        Double.operate_range(&src, &mut dst, 2..4, ProcessingMode::Sequential);
        assert_eq!(dst.get(1, 0).unwrap(), 0.0);
        assert_eq!(dst.get(2, 0).unwrap(), 12.0);
        assert_eq!(dst.get(3, 2).unwrap(), 22.0);
        assert_eq!(dst.get(4, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_interior_window_leaves_border() {
        let src = ramp(6, 5);
        let mut dst = Grid::filled(6, 5, -7.0);
        Center.operate_with(&src, &mut dst, ProcessingMode::Parallel);
        for col in 0..5 {
            assert_eq!(dst.get(0, col).unwrap(), -7.0);
            assert_eq!(dst.get(5, col).unwrap(), -7.0);
        }
        for row in 0..6 {
            assert_eq!(dst.get(row, 0).unwrap(), -7.0);
            assert_eq!(dst.get(row, 4).unwrap(), -7.0);
        }
        assert_eq!(dst.get(3, 2).unwrap(), src.get(3, 2).unwrap());
    }

    #[test]
    fn test_void_in_window_writes_void() {
        let mut src = ramp(5, 5);
        src.set(1, 1, f32::NAN).unwrap();
        let dst = Center.operate_new(&src);
        assert!(dst.get(2, 2).unwrap().is_nan());
        assert!(!dst.get(3, 3).unwrap().is_nan());
    }

    #[test]
    #[should_panic(expected = "Double: grid shape mismatch")]
    fn test_shape_mismatch_panics() {
        let src = Grid::new(4, 4);
        let mut dst = Grid::new(4, 5);
        Double.operate(&src, &mut dst);
    }
}
