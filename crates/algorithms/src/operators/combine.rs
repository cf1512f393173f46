//! Cell operators that assign or blend values

use super::CellOperator;
use relief_core::{assert_same_shape, Grid};

/// Replace void cells with a filler value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoidFill {
    filler: f32,
}

impl VoidFill {
    pub fn new(filler: f32) -> Self {
        Self { filler }
    }
}

impl CellOperator for VoidFill {
    const NAME: &'static str = "VoidFill";

    fn apply(&self, value: f32, _row: usize, _col: usize) -> f32 {
        if value.is_nan() {
            self.filler
        } else {
            value
        }
    }
}

/// Set every cell to a constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assign {
    value: f32,
}

impl Assign {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl CellOperator for Assign {
    const NAME: &'static str = "Assign";

    fn apply(&self, _value: f32, _row: usize, _col: usize) -> f32 {
        self.value
    }
}

/// Weighted blend of the source (first) and a second grid.
///
/// `out = w * first + (1 - w) * second`, or void where the mask is void.
#[derive(Debug, Clone, Copy)]
pub struct Combine<'a> {
    second: &'a Grid,
    weight: &'a Grid,
    mask: &'a Grid,
}

impl<'a> Combine<'a> {
    pub fn new(second: &'a Grid, weight: &'a Grid, mask: &'a Grid) -> Self {
        Self {
            second,
            weight,
            mask,
        }
    }
}

impl CellOperator for Combine<'_> {
    const NAME: &'static str = "Combine";

    fn apply(&self, first: f32, row: usize, col: usize) -> f32 {
        if self.mask.data()[(row, col)].is_nan() {
            return f32::NAN;
        }
        let w = self.weight.data()[(row, col)];
        w * first + (1.0 - w) * self.second.data()[(row, col)]
    }

    fn check_inputs(&self, src: &Grid) {
        assert_same_shape(src, self.second, Self::NAME);
        assert_same_shape(src, self.weight, Self::NAME);
        assert_same_shape(src, self.mask, Self::NAME);
    }
}
