//! Synthetic test terrain

use relief_core::{Grid, GridGeometry, Result};
use std::f32::consts::TAU;

/// Options for [`ridges_and_valleys`]
#[derive(Debug, Clone, Copy)]
pub struct TerrainOptions {
    /// Rows and columns
    pub size: usize,
    /// Cell size in meters
    pub cell_size: f64,
    /// Phase offset of the ridge pattern in degrees
    pub seed: u32,
    /// Cut a circular hole of void cells into the terrain
    pub voids: bool,
}

/// Meandering ridges running north-south on a plateau falling off towards
/// south-east, with finer cross ridges.
///
/// The same options always give the same grid.
pub fn ridges_and_valleys(options: TerrainOptions) -> Result<Grid> {
    let size = options.size;
    let phase = (options.seed % 360) as f32 * TAU / 360.0;
    let extent = size.max(1) as f32;

    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        let y = row as f32 / extent;
        for col in 0..size {
            let x = col as f32 / extent;
            let plateau = 400.0 * (1.0 - 0.5 * x - 0.5 * y);
            let ridges = 120.0 * (TAU * 4.0 * x + phase + 0.8 * (TAU * y).sin()).sin();
            let cross = 40.0 * (TAU * 11.0 * y + 2.0 * phase).sin() * (TAU * 7.0 * x).cos();
            data.push(800.0 + plateau + ridges + cross);
        }
    }

    let geometry = GridGeometry::new(0.0, size as f64 * options.cell_size, options.cell_size)?;
    let mut grid = Grid::from_vec(data, size, size)?
        .with_geometry(geometry)
        .with_name("Synthetic Terrain");

    if options.voids {
        let center = size as f64 / 3.0;
        let radius = size as f64 / 10.0;
        for row in 0..size {
            for col in 0..size {
                let (dr, dc) = (row as f64 - center, col as f64 - center);
                if dr * dr + dc * dc <= radius * radius {
                    grid.set(row, col, f32::NAN)?;
                }
            }
        }
    }
    Ok(grid)
}
