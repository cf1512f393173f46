//! Grid data structures and operations

mod band;
mod geometry;
mod grid;

pub use band::RowBand;
pub use geometry::{GridGeometry, GridShape};
pub use grid::{assert_same_shape, Grid, GridStatistics};
