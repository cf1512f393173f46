//! # Relief Algorithms
//!
//! Terrain sculpting for relief shading.
//!
//! ## Modules
//!
//! - **operators**: slope, curvatures and per-cell scaling/blending operators
//! - **smoothing**: fractional low-pass filtering
//! - **filter**: the incremental seven-stage pipeline (`ReliefFilter`)
//! - **render**: shaded relief and grayscale images of grids

pub mod filter;
pub mod operators;
pub mod render;
pub mod smoothing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::filter::{
        CancelToken, FilterOutcome, FilterOutput, LayerKind, NoProgress, ProgressSink,
        ReliefFilter, ReliefParams, Stage,
    };
    pub use crate::operators::{CellOperator, GridOperator};
    pub use crate::render::{grayscale, shaded_relief, LightDirection};
    pub use crate::smoothing::{smooth, smooth_in_place, LowPassFilter};
    pub use relief_core::prelude::*;
    pub use relief_parallel::ProcessingMode;
}
