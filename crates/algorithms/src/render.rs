//! Grids to gray images for display
//!
//! Images are row-major `u8` arrays, row 0 at the top (north).

use ndarray::Array2;
use relief_core::Grid;
use serde::{Deserialize, Serialize};

/// Direction of the light source for shaded relief
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightDirection {
    /// Degrees clockwise from north
    pub azimuth: f64,
    /// Degrees from the vertical
    pub zenith: f64,
}

impl Default for LightDirection {
    fn default() -> Self {
        Self {
            azimuth: 315.0, // NW illumination
            zenith: 45.0,
        }
    }
}

impl LightDirection {
    /// Unit vector pointing towards the light (x east, y north, z up)
    pub fn vector(&self) -> [f64; 3] {
        let azimuth = self.azimuth.to_radians();
        let zenith = self.zenith.to_radians();
        let sin_z = zenith.sin();
        [azimuth.sin() * sin_z, azimuth.cos() * sin_z, zenith.cos()]
    }
}

/// Lambertian shading of the grid interior.
///
/// The image covers `(rows - 2) x (cols - 2)` cells, one pixel per interior
/// cell; gray 255 faces the light and 0 faces away. Cells next to a void
/// are black. Returns `None` when the interior has two or fewer rows or
/// columns.
pub fn shaded_relief(grid: &Grid, light: LightDirection) -> Option<Array2<u8>> {
    let (rows, cols) = grid.shape();
    if rows <= 4 || cols <= 4 {
        return None;
    }

    let [lx, ly, lz] = light.vector();
    let nz = 2.0 * grid.cell_size();
    let data = grid.view();

    Some(Array2::from_shape_fn((rows - 2, cols - 2), |(r, c)| {
        let (row, col) = (r + 1, c + 1);
        let nx = -(data[(row, col + 1)] as f64 - data[(row, col - 1)] as f64);
        let ny = -(data[(row - 1, col)] as f64 - data[(row + 1, col)] as f64);
        let length = (nx * nx + ny * ny + nz * nz).sqrt();
        let dot = (nx * lx + ny * ly + nz * lz) / length;
        // NaN casts to 0
        ((dot + 1.0) / 2.0 * 255.0) as u8
    }))
}

/// Linear stretch of the grid's value range onto 0..=255.
///
/// A grid without extent renders white; voids render black.
pub fn grayscale(grid: &Grid) -> Array2<u8> {
    match grid.min_max() {
        Some((min, max)) if max > min => {
            let range = max - min;
            grid.data().mapv(|v| ((v - min) / range * 255.0) as u8)
        }
        _ => grid
            .data()
            .mapv(|v| if v.is_nan() { 0 } else { u8::MAX }),
    }
}

/// Mean gray value of an image
pub fn mean_gray(image: &Array2<u8>) -> f64 {
    if image.is_empty() {
        return 0.0;
    }
    image.iter().map(|&v| v as f64).sum::<f64>() / image.len() as f64
}
