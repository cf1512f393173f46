//! Row bands: disjoint mutable row ranges of a destination grid

use ndarray::{ArrayViewMut1, ArrayViewMut2, Axis};
use std::ops::Range;

/// A contiguous run of rows of a destination grid.
///
/// Bands produced from one grid never overlap, so each can be written by a
/// different worker without locking. Row indices passed to the accessors are
/// global grid rows, not offsets into the band.
#[derive(Debug)]
pub struct RowBand<'a> {
    first_row: usize,
    view: ArrayViewMut2<'a, f32>,
}

impl<'a> RowBand<'a> {
    /// Wrap `view`, whose first row is row `first_row` of the grid
    pub fn new(first_row: usize, view: ArrayViewMut2<'a, f32>) -> Self {
        Self { first_row, view }
    }

    /// Global row range covered by this band
    pub fn row_range(&self) -> Range<usize> {
        self.first_row..self.first_row + self.view.nrows()
    }

    /// Number of rows in this band
    pub fn rows(&self) -> usize {
        self.view.nrows()
    }

    /// Mutable access to global row `row`
    ///
    /// # Panics
    /// If `row` lies outside this band.
    #[track_caller]
    pub fn row_mut(&mut self, row: usize) -> ArrayViewMut1<'_, f32> {
        let range = self.row_range();
        assert!(
            range.contains(&row),
            "row {row} outside band {}..{}",
            range.start,
            range.end
        );
        self.view.row_mut(row - self.first_row)
    }

    /// Call `f(row, col, cell)` for every cell of the band
    pub fn for_each_cell_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize, &mut f32),
    {
        let first_row = self.first_row;
        for (offset, mut line) in self.view.axis_iter_mut(Axis(0)).enumerate() {
            let row = first_row + offset;
            for (col, cell) in line.iter_mut().enumerate() {
                f(row, col, cell);
            }
        }
    }

    /// Split into bands of at most `band_rows` rows each
    pub fn split(self, band_rows: usize) -> Vec<RowBand<'a>> {
        let band_rows = band_rows.max(1);
        let mut bands = Vec::with_capacity(self.rows().div_ceil(band_rows).max(1));
        let mut first_row = self.first_row;
        let mut rest = self.view;

        while rest.nrows() > band_rows {
            let (head, tail) = rest.split_at(Axis(0), band_rows);
            bands.push(RowBand::new(first_row, head));
            first_row += band_rows;
            rest = tail;
        }
        bands.push(RowBand::new(first_row, rest));
        bands
    }
}
