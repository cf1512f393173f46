//! Pipeline stages and their parameter snapshots

use super::output::LayerKind;
use super::params::ReliefParams;
use std::fmt;

/// A stage of the relief filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LevelOfDetail,
    RidgesWeight,
    FlatMask,
    ValleysWeight,
    RidgesExaggeration,
    ValleysExaggeration,
    FinalCombination,
}

impl Stage {
    pub const COUNT: usize = 7;

    /// All stages in processing order; dependencies come first
    pub const ORDER: [Stage; Stage::COUNT] = [
        Stage::LevelOfDetail,
        Stage::RidgesWeight,
        Stage::FlatMask,
        Stage::ValleysWeight,
        Stage::RidgesExaggeration,
        Stage::ValleysExaggeration,
        Stage::FinalCombination,
    ];

    /// Position in [`Stage::ORDER`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stages whose results this stage reads
    pub fn dependencies(self) -> &'static [Stage] {
        match self {
            Stage::LevelOfDetail | Stage::RidgesWeight | Stage::FlatMask | Stage::ValleysWeight => {
                &[]
            }
            Stage::RidgesExaggeration => &[Stage::LevelOfDetail, Stage::RidgesWeight],
            Stage::ValleysExaggeration => &[Stage::LevelOfDetail, Stage::ValleysWeight],
            Stage::FinalCombination => &[
                Stage::FlatMask,
                Stage::RidgesExaggeration,
                Stage::ValleysExaggeration,
            ],
        }
    }

    /// Progress message shown while the stage runs
    pub fn message(self) -> &'static str {
        match self {
            Stage::LevelOfDetail => "Reducing Level of Detail",
            Stage::RidgesWeight => "Filtering Ridges",
            Stage::FlatMask => "Finding Flat Areas",
            Stage::ValleysWeight => "Filtering Valleys",
            Stage::RidgesExaggeration => "Exaggerating Ridges",
            Stage::ValleysExaggeration => "Exaggerating Valleys",
            Stage::FinalCombination => "Combining Valleys and Ridges Using Flat Areas",
        }
    }

    /// Output layer holding this stage's result
    pub fn layer(self) -> LayerKind {
        match self {
            Stage::LevelOfDetail => LayerKind::LevelOfDetail,
            Stage::RidgesWeight => LayerKind::RidgesWeight,
            Stage::FlatMask => LayerKind::FlatMask,
            Stage::ValleysWeight => LayerKind::ValleysWeight,
            Stage::RidgesExaggeration => LayerKind::RidgesExaggeration,
            Stage::ValleysExaggeration => LayerKind::ValleysExaggeration,
            Stage::FinalCombination => LayerKind::Result,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The parameters one stage read when it was computed
#[derive(Debug, Clone, PartialEq)]
pub enum StageParams {
    LevelOfDetail {
        grid_filter_loops: u32,
    },
    RidgesWeight {
        mean_filter_loops: u32,
        plan_curvature_weight: f32,
        combination_loops: u32,
    },
    FlatMask {
        grid_filter_loops: u32,
        slope_threshold: f32,
    },
    ValleysWeight {
        mean_filter_loops: u32,
        curvature_upper_limit: f32,
    },
    RidgesExaggeration {
        exaggeration: f32,
    },
    ValleysExaggeration {
        exaggeration: f32,
    },
    FinalCombination,
}

impl StageParams {
    /// Take the snapshot `stage` depends on from `params`
    pub fn snapshot(stage: Stage, params: &ReliefParams) -> Self {
        match stage {
            Stage::LevelOfDetail => StageParams::LevelOfDetail {
                grid_filter_loops: params.grid_filter_loops,
            },
            Stage::RidgesWeight => StageParams::RidgesWeight {
                mean_filter_loops: params.ridges_mean_filter_loops,
                plan_curvature_weight: params.ridges_plan_curvature_weight,
                combination_loops: params.ridges_mean_filter_loops_for_combination,
            },
            Stage::FlatMask => StageParams::FlatMask {
                grid_filter_loops: params.grid_filter_loops,
                slope_threshold: params.combination_slope_threshold,
            },
            Stage::ValleysWeight => StageParams::ValleysWeight {
                mean_filter_loops: params.valleys_mean_filter_loops,
                curvature_upper_limit: params.valleys_curvature_upper_limit,
            },
            Stage::RidgesExaggeration => StageParams::RidgesExaggeration {
                exaggeration: params.ridges_exaggeration,
            },
            Stage::ValleysExaggeration => StageParams::ValleysExaggeration {
                exaggeration: params.valleys_exaggeration,
            },
            Stage::FinalCombination => StageParams::FinalCombination,
        }
    }
}
