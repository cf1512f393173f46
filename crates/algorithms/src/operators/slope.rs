//! Slope calculation
//!
//! Central differences of the four direct neighbors:
//!
//! ```text
//!     n          dz/dx = (e - w) / 2cs
//!   w c e        dz/dy = (n - s) / 2cs
//!     s          slope = atan(sqrt(dz/dx² + dz/dy²))
//! ```

use super::{for_each_interior_window, GridOperator};
use relief_core::{Grid, RowBand};

/// Slope in radians (neighborhood)
#[derive(Debug, Clone, Copy, Default)]
pub struct Slope;

impl GridOperator for Slope {
    fn name(&self) -> &'static str {
        "Slope"
    }

    fn operate_rows(&self, src: &Grid, mut band: RowBand<'_>) {
        let two_cs = 2.0 * src.cell_size();
        for_each_interior_window(src, &mut band, |z| {
            let dzdx = (z[5] - z[3]) / two_cs;
            let dzdy = (z[1] - z[7]) / two_cs;
            (dzdx * dzdx + dzdy * dzdy).sqrt().atan()
        });
    }
}
