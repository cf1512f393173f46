//! # Relief Core
//!
//! Core types for the relief terrain filters.
//!
//! This crate provides:
//! - `Grid`: a georeferenced `f32` elevation grid where `NaN` marks void cells
//! - `GridGeometry` / `GridShape`: cell size, anchor and dimensions shared by
//!   every grid of one filter run
//! - `RowBand`: a mutable run of rows of a destination grid, the unit of work
//!   handed to parallel workers
//! - `GridPool`: recycling of same-shaped scratch grids with scoped release

pub mod error;
pub mod pool;
pub mod raster;

pub use error::{Error, Result};
pub use pool::{GridPool, PooledGrid};
pub use raster::{assert_same_shape, Grid, GridGeometry, GridShape, GridStatistics, RowBand};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::pool::{GridPool, PooledGrid};
    pub use crate::raster::{Grid, GridGeometry, GridShape, RowBand};
}
