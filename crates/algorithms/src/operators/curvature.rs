//! Surface curvature from a 3x3 neighborhood
//!
//! Partial derivatives are the Evans-Young least-squares estimates of a
//! quadratic surface fitted to all nine cells:
//!
//! ```text
//! z1 z2 z3      p = (z3 + z6 + z9 - z1 - z4 - z7) / 6cs
//! z4 z5 z6      q = (z1 + z2 + z3 - z7 - z8 - z9) / 6cs
//! z7 z8 z9      r = (z1 + z3 + z4 + z6 + z7 + z9 - 2(z2 + z5 + z8)) / 3cs²
//!               s = (z3 + z7 - z1 - z9) / 4cs²
//!               t = (z1 + z2 + z3 + z7 + z8 + z9 - 2(z4 + z5 + z6)) / 3cs²
//! ```
//!
//! `z1` is the north-west neighbor; `q` is positive where the surface rises
//! towards north.
//!
//! Curvatures:
//!   Maximum  = -(r + t) / 2 + sqrt(((r - t) / 2)² + s²)
//!   Minimum  = -(r + t) / 2 - sqrt(((r - t) / 2)² + s²)
//!   Plan     = -(r*q² - 2*s*p*q + t*p²) / (p² + q²)^1.5
//!   Profile  = -(r*p² + 2*s*p*q + t*q²) / ((p² + q²) * (1 + p² + q²)^1.5)
//!
//! Plan curvature is positive on convex contours (ridges) and negative on
//! concave contours (valleys).

use super::{for_each_interior_window, GridOperator};
use relief_core::{Grid, RowBand};

/// Gradients below this squared magnitude are treated as flat
const FLAT_GRADIENT: f64 = 1e-20;

/// Which curvature to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurvatureKind {
    /// Maximum principal curvature, negative values clamped to zero
    PositiveMax,
    /// Magnitude of the minimum principal curvature where it is negative,
    /// zero elsewhere
    NegativeMin,
    /// Plan (contour) curvature
    Plan,
    /// Profile curvature along the direction of steepest slope
    Profile,
}

/// First and second partial derivatives at one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivatives {
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub s: f64,
    pub t: f64,
}

impl Derivatives {
    /// Estimate derivatives from the window `z1..z9` and the cell size
    pub fn evans_young(z: &[f64; 9], cell_size: f64) -> Self {
        let [z1, z2, z3, z4, z5, z6, z7, z8, z9] = *z;
        let cs2 = cell_size * cell_size;
        Self {
            p: (z3 + z6 + z9 - z1 - z4 - z7) / (6.0 * cell_size),
            q: (z1 + z2 + z3 - z7 - z8 - z9) / (6.0 * cell_size),
            r: (z1 + z3 + z4 + z6 + z7 + z9 - 2.0 * (z2 + z5 + z8)) / (3.0 * cs2),
            s: (z3 + z7 - z1 - z9) / (4.0 * cs2),
            t: (z1 + z2 + z3 + z7 + z8 + z9 - 2.0 * (z4 + z5 + z6)) / (3.0 * cs2),
        }
    }

    fn mean(&self) -> f64 {
        -(self.r + self.t) / 2.0
    }

    fn spread(&self) -> f64 {
        let half_diff = (self.r - self.t) / 2.0;
        (half_diff * half_diff + self.s * self.s).sqrt()
    }

    /// Maximum principal curvature
    pub fn max_curvature(&self) -> f64 {
        self.mean() + self.spread()
    }

    /// Minimum principal curvature
    pub fn min_curvature(&self) -> f64 {
        self.mean() - self.spread()
    }

    /// Plan curvature, zero on flats
    pub fn plan_curvature(&self) -> f64 {
        let Self { p, q, r, s, t } = *self;
        let p2q2 = p * p + q * q;
        if p2q2 < FLAT_GRADIENT {
            return 0.0;
        }
        -(r * q * q - 2.0 * s * p * q + t * p * p) / p2q2.powf(1.5)
    }

    /// Profile curvature, zero on flats
    pub fn profile_curvature(&self) -> f64 {
        let Self { p, q, r, s, t } = *self;
        let p2q2 = p * p + q * q;
        if p2q2 < FLAT_GRADIENT {
            return 0.0;
        }
        -(r * p * p + 2.0 * s * p * q + t * q * q) / (p2q2 * (1.0 + p2q2).powf(1.5))
    }
}

/// Curvature operator (neighborhood)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Curvature {
    kind: CurvatureKind,
}

impl Curvature {
    pub fn new(kind: CurvatureKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> CurvatureKind {
        self.kind
    }

    fn evaluate(&self, d: &Derivatives) -> f64 {
        match self.kind {
            CurvatureKind::PositiveMax => d.max_curvature().max(0.0),
            CurvatureKind::NegativeMin => {
                let k = d.min_curvature();
                if k < 0.0 {
                    -k
                } else {
                    0.0
                }
            }
            CurvatureKind::Plan => d.plan_curvature(),
            CurvatureKind::Profile => d.profile_curvature(),
        }
    }
}

impl GridOperator for Curvature {
    fn name(&self) -> &'static str {
        match self.kind {
            CurvatureKind::PositiveMax => "PositiveMaxCurvature",
            CurvatureKind::NegativeMin => "NegativeMinCurvature",
            CurvatureKind::Plan => "PlanCurvature",
            CurvatureKind::Profile => "ProfileCurvature",
        }
    }

    fn operate_rows(&self, src: &Grid, mut band: RowBand<'_>) {
        let cell_size = src.cell_size();
        for_each_interior_window(src, &mut band, |z| {
            self.evaluate(&Derivatives::evans_young(z, cell_size))
        });
    }
}
