//! Low-pass smoothing
//!
//! Repeated 3x3 binomial mean:
//!
//! ```text
//! 1 2 1
//! 2 4 2  / 16
//! 1 2 1
//! ```
//!
//! Near the grid edge and next to voids the kernel is renormalized over the
//! cells that exist, so every cell is written and a constant grid stays
//! constant. Void centers stay void.
//!
//! The number of passes may be fractional: for `L = n + f` the result is
//! `(1 - f) * S^n + f * S^(n+1)`, which makes the amount of smoothing vary
//! continuously with `L`.

use crate::operators::{CellOperator, GridOperator};
use relief_core::{assert_same_shape, Grid, GridPool, RowBand};
use relief_parallel::ProcessingMode;

/// Fractions below this are treated as a whole number of passes
const MIN_FRACTION: f64 = 1e-6;

/// One pass of the binomial kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct LowPassFilter;

impl GridOperator for LowPassFilter {
    fn name(&self) -> &'static str {
        "LowPassFilter"
    }

    fn operate_rows(&self, src: &Grid, mut band: RowBand<'_>) {
        let data = src.view();
        let (rows, cols) = src.shape();

        band.for_each_cell_mut(|row, col, cell| {
            if data[(row, col)].is_nan() {
                *cell = f32::NAN;
                return;
            }

            let mut sum = 0.0f64;
            let mut weights = 0.0f64;
            for r in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                let row_weight = if r == row { 2.0 } else { 1.0 };
                for c in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                    let v = data[(r, c)];
                    if v.is_nan() {
                        continue;
                    }
                    let w = row_weight * if c == col { 2.0 } else { 1.0 };
                    sum += w * v as f64;
                    weights += w;
                }
            }
            *cell = (sum / weights) as f32;
        });
    }
}

/// `dst = (1 - fraction) * dst + fraction * next`
struct Blend<'a> {
    next: &'a Grid,
    fraction: f64,
}

impl CellOperator for Blend<'_> {
    const NAME: &'static str = "Blend";

    fn apply(&self, value: f32, row: usize, col: usize) -> f32 {
        let next = self.next.data()[(row, col)] as f64;
        ((1.0 - self.fraction) * value as f64 + self.fraction * next) as f32
    }

    fn check_inputs(&self, src: &Grid) {
        assert_same_shape(src, self.next, Self::NAME);
    }
}

/// Smooth `src` into `dst` with `loops` (possibly fractional) passes.
///
/// Scratch grids come from `pool`, whose shape must match `src`.
/// Non-positive `loops` copy `src`.
#[track_caller]
pub fn smooth(src: &Grid, dst: &mut Grid, loops: f64, pool: &GridPool, mode: ProcessingMode) {
    assert_same_shape(src, dst, LowPassFilter.name());
    if !(loops > 0.0) {
        dst.copy_from(src);
        return;
    }

    let whole = loops.floor();
    let fraction = loops - whole;
    let passes = whole as usize;

    if passes == 0 {
        dst.copy_from(src);
    } else {
        LowPassFilter.operate_with(src, dst, mode);
        if passes > 1 {
            let mut scratch = pool.acquire();
            for _ in 1..passes {
                LowPassFilter.operate_with(dst, &mut scratch, mode);
                dst.swap_data(&mut scratch);
            }
        }
    }

    if fraction > MIN_FRACTION {
        let mut next = pool.acquire();
        LowPassFilter.operate_with(dst, &mut next, mode);
        Blend {
            next: &*next,
            fraction,
        }
        .apply_in_place(dst, mode);
    }
}

/// Smooth `grid` in place, see [`smooth`]
#[track_caller]
pub fn smooth_in_place(grid: &mut Grid, loops: f64, pool: &GridPool, mode: ProcessingMode) {
    if !(loops > 0.0) {
        return;
    }
    let mut out = pool.acquire();
    smooth(grid, &mut out, loops, pool, mode);
    grid.swap_data(&mut out);
}
