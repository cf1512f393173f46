//! Main Grid type

use crate::error::{Error, Result};
use crate::raster::{GridGeometry, GridShape};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A georeferenced 2D grid of elevation samples.
///
/// Values are stored row-major as `f32`; `NaN` marks a void cell (no data).
/// The optional name is display metadata only and takes no part in shape
/// comparisons.
///
/// # Example
///
/// ```
/// use relief_core::Grid;
///
/// let mut grid = Grid::new(100, 100);
/// grid.set(10, 20, 42.0).unwrap();
/// assert_eq!(grid.get(10, 20).unwrap(), 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Samples in row-major order (row, col)
    data: Array2<f32>,
    geometry: GridGeometry,
    name: Option<String>,
}

impl Grid {
    /// Create a new grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a grid from row-major samples
    pub fn from_vec(data: Vec<f32>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions { cols, rows });
        }

        let array =
            Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<f32>) -> Self {
        // Row bands rely on contiguous row-major storage.
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self {
            data,
            geometry: GridGeometry::default(),
            name: None,
        }
    }

    /// Create a zeroed grid for a shape
    pub fn from_shape(shape: GridShape) -> Self {
        Self::new(shape.rows, shape.cols).with_geometry(shape.geometry)
    }

    /// Builder-style geometry setter
    pub fn with_geometry(mut self, geometry: GridGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Builder-style name setter
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Create a grid with the same dimensions and geometry, filled with a value
    pub fn like(&self, fill_value: f32) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            geometry: self.geometry,
            name: None,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Dimensions and geometry
    pub fn grid_shape(&self) -> GridShape {
        GridShape {
            rows: self.rows(),
            cols: self.cols(),
            geometry: self.geometry,
        }
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f32> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            }),
        }
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Set every cell to `value`
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Set the outermost rows and columns to `value`
    pub fn fill_border(&mut self, value: f32) {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return;
        }
        self.data.row_mut(0).fill(value);
        self.data.row_mut(rows - 1).fill(value);
        self.data.column_mut(0).fill(value);
        self.data.column_mut(cols - 1).fill(value);
    }

    /// Copy all samples of `other`, which must have the same shape
    #[track_caller]
    pub fn copy_from(&mut self, other: &Grid) {
        assert_same_shape(other, self, "copy_from");
        self.data.assign(&other.data);
    }

    /// Exchange samples with `other`, which must have the same shape.
    ///
    /// Names and geometry stay with their grids.
    #[track_caller]
    pub fn swap_data(&mut self, other: &mut Grid) {
        assert_same_shape(other, self, "swap_data");
        std::mem::swap(&mut self.data, &mut other.data);
    }

    // Metadata

    /// Get the geometry
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Set the geometry
    pub fn set_geometry(&mut self, geometry: GridGeometry) {
        self.geometry = geometry;
    }

    /// Cell size in map units
    pub fn cell_size(&self) -> f64 {
        self.geometry.cell_size()
    }

    /// Display name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the display name
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Map coordinates of the sample at (row, col)
    pub fn cell_to_geo(&self, row: usize, col: usize) -> (f64, f64) {
        self.geometry.cell_to_geo(col, row)
    }

    // Statistics

    /// Number of void (NaN) cells
    pub fn void_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Whether any cell is void
    pub fn has_voids(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Smallest and largest non-void value, `None` if every cell is void
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let stats = self.statistics();
        stats.min.zip(stats.max)
    }

    /// Calculate basic statistics (min, max, mean, count of valid cells)
    pub fn statistics(&self) -> GridStatistics {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if value.is_nan() {
                continue;
            }
            min = min.min(value);
            max = max.max(value);
            sum += value as f64;
            count += 1;
        }

        let (min, max, mean) = if count > 0 {
            (Some(min), Some(max), Some(sum / count as f64))
        } else {
            (None, None, None)
        };

        GridStatistics {
            min,
            max,
            mean,
            valid_count: count,
            void_count: self.len() - count,
        }
    }
}

/// Basic statistics for a grid, ignoring void cells
#[derive(Debug, Clone, PartialEq)]
pub struct GridStatistics {
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub void_count: usize,
}

/// Panic unless both grids have identical dimensions and geometry.
///
/// Mismatched shapes are a caller bug: operators never resample.
#[track_caller]
pub fn assert_same_shape(expected: &Grid, actual: &Grid, operation: &str) {
    let (e, a) = (expected.grid_shape(), actual.grid_shape());
    assert!(
        e == a,
        "{operation}: grid shape mismatch, expected {}x{} {:?}, got {}x{} {:?}",
        e.cols,
        e.rows,
        e.geometry,
        a.cols,
        a.rows,
        a.geometry
    );
}
