//! Georeferencing of grids

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Cell size and anchor of a north-up grid.
///
/// The anchor is the coordinate of the first sample (row 0, col 0):
/// ```text
/// x = west + col * cell_size
/// y = north - row * cell_size
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    west: f64,
    north: f64,
    cell_size: f64,
}

impl GridGeometry {
    /// Create a geometry, rejecting non-positive or non-finite cell sizes
    pub fn new(west: f64, north: f64, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::invalid_parameter(
                "cell_size",
                cell_size,
                "must be a positive finite number",
            ));
        }
        if !west.is_finite() || !north.is_finite() {
            return Err(Error::invalid_parameter(
                "anchor",
                format!("({west}, {north})"),
                "must be finite",
            ));
        }
        Ok(Self {
            west,
            north,
            cell_size,
        })
    }

    /// X coordinate of the first column
    pub fn west(&self) -> f64 {
        self.west
    }

    /// Y coordinate of the first row
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Distance between neighboring samples in map units
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Convert cell indices to map coordinates of the sample
    pub fn cell_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.west + col as f64 * self.cell_size,
            self.north - row as f64 * self.cell_size,
        )
    }

    /// Convert map coordinates to fractional cell indices (col, row)
    ///
    /// Use `.round()` to get the nearest sample.
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.west) / self.cell_size,
            (self.north - y) / self.cell_size,
        )
    }

    /// Extent covered by the samples of a grid (min_x, min_y, max_x, max_y)
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let (max_x, min_y) = self.cell_to_geo(cols.saturating_sub(1), rows.saturating_sub(1));
        (self.west, min_y, max_x, self.north)
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            west: 0.0,
            north: 0.0,
            cell_size: 1.0,
        }
    }
}

/// Dimensions plus geometry: two grids with equal shapes can be combined
/// cell by cell without resampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
    pub geometry: GridGeometry,
}

impl GridShape {
    /// Total number of cells
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the shape contains no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_to_geo_roundtrip() {
        let geometry = GridGeometry::new(100.0, 200.0, 10.0).unwrap();

        let (x, y) = geometry.cell_to_geo(5, 10);
        assert_relative_eq!(x, 150.0, epsilon = 1e-10);
        assert_relative_eq!(y, 100.0, epsilon = 1e-10);

        let (col, row) = geometry.geo_to_cell(x, y);
        assert_relative_eq!(col, 5.0, epsilon = 1e-10);
        assert_relative_eq!(row, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bounds() {
        let geometry = GridGeometry::new(0.0, 99.0, 1.0).unwrap();
        let (min_x, min_y, max_x, max_y) = geometry.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 99.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 99.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        assert!(GridGeometry::new(0.0, 0.0, 0.0).is_err());
        assert!(GridGeometry::new(0.0, 0.0, -2.5).is_err());
        assert!(GridGeometry::new(0.0, 0.0, f64::NAN).is_err());
        assert!(GridGeometry::new(f64::INFINITY, 0.0, 1.0).is_err());
    }
}
