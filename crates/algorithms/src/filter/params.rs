//! Filter parameters

use relief_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// User parameters of the relief filter.
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliefParams {
    /// Low-pass passes for the level of detail and the flat-area mask
    pub grid_filter_loops: u32,
    /// Weight of plan curvature relative to maximum curvature for ridges
    pub ridges_plan_curvature_weight: f32,
    /// Low-pass passes before ridge curvature
    pub ridges_mean_filter_loops: u32,
    /// Low-pass passes over the combined ridge curvature
    pub ridges_mean_filter_loops_for_combination: u32,
    /// Low-pass passes before valley curvature
    pub valleys_mean_filter_loops: u32,
    /// Fraction of the largest valley curvature that maps to full weight
    pub valleys_curvature_upper_limit: f32,
    /// Scale applied to ridges
    pub ridges_exaggeration: f32,
    /// Scale applied to valleys
    pub valleys_exaggeration: f32,
    /// Slope in degrees above which terrain counts as mountainous
    pub combination_slope_threshold: f32,
}

impl Default for ReliefParams {
    fn default() -> Self {
        Self {
            grid_filter_loops: 10,
            ridges_plan_curvature_weight: 1.5,
            ridges_mean_filter_loops: 5,
            ridges_mean_filter_loops_for_combination: 1,
            valleys_mean_filter_loops: 5,
            valleys_curvature_upper_limit: 0.5,
            ridges_exaggeration: 1.25,
            valleys_exaggeration: 0.4,
            combination_slope_threshold: 15.0,
        }
    }
}

impl ReliefParams {
    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("ridges_plan_curvature_weight", self.ridges_plan_curvature_weight),
            ("valleys_curvature_upper_limit", self.valleys_curvature_upper_limit),
            ("ridges_exaggeration", self.ridges_exaggeration),
            ("valleys_exaggeration", self.valleys_exaggeration),
            ("combination_slope_threshold", self.combination_slope_threshold),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(Error::invalid_parameter(name, value, "must be finite"));
            }
        }

        if self.valleys_curvature_upper_limit < 0.0 {
            return Err(Error::invalid_parameter(
                "valleys_curvature_upper_limit",
                self.valleys_curvature_upper_limit,
                "must not be negative",
            ));
        }
        if self.combination_slope_threshold < 0.0 {
            return Err(Error::invalid_parameter(
                "combination_slope_threshold",
                self.combination_slope_threshold,
                "must not be negative",
            ));
        }
        Ok(())
    }
}
