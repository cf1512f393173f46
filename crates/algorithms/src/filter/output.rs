//! Filter results

use relief_core::Grid;
use std::fmt;
use std::sync::Arc;

/// The grids a completed filter pass hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Original,
    LevelOfDetail,
    RidgesWeight,
    FlatMask,
    ValleysWeight,
    RidgesExaggeration,
    ValleysExaggeration,
    Result,
}

impl LayerKind {
    pub const COUNT: usize = 8;

    /// All layers in output order
    pub const ALL: [LayerKind; LayerKind::COUNT] = [
        LayerKind::Original,
        LayerKind::LevelOfDetail,
        LayerKind::RidgesWeight,
        LayerKind::FlatMask,
        LayerKind::ValleysWeight,
        LayerKind::RidgesExaggeration,
        LayerKind::ValleysExaggeration,
        LayerKind::Result,
    ];

    /// Display name, also used as the grid name
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Original => "Original Grid",
            LayerKind::LevelOfDetail => "Level of Detail",
            LayerKind::RidgesWeight => "Ridges Weight",
            LayerKind::FlatMask => "Combination Weight",
            LayerKind::ValleysWeight => "Valleys Weight",
            LayerKind::RidgesExaggeration => "Ridges",
            LayerKind::ValleysExaggeration => "Valleys",
            LayerKind::Result => "Result",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result grids of a completed pass, shared with the filter's cache
#[derive(Debug, Clone)]
pub struct FilterOutput {
    layers: [Arc<Grid>; LayerKind::COUNT],
}

impl FilterOutput {
    pub(crate) fn new(layers: [Arc<Grid>; LayerKind::COUNT]) -> Self {
        Self { layers }
    }

    /// Grid of one layer
    pub fn get(&self, kind: LayerKind) -> &Arc<Grid> {
        &self.layers[kind as usize]
    }

    /// Grid of the layer with display name `name`
    pub fn by_name(&self, name: &str) -> Option<&Arc<Grid>> {
        LayerKind::ALL
            .iter()
            .find(|kind| kind.name() == name)
            .map(|&kind| self.get(kind))
    }

    /// The sculpted terrain
    pub fn result(&self) -> &Arc<Grid> {
        self.get(LayerKind::Result)
    }

    /// All layers in output order
    pub fn layers(&self) -> impl Iterator<Item = (LayerKind, &Arc<Grid>)> {
        LayerKind::ALL.into_iter().zip(self.layers.iter())
    }
}

/// What a call to `ReliefFilter::filter` produced
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    /// No grid is loaded
    Empty,
    /// The progress sink cancelled the pass; cached results are unchanged
    Cancelled,
    Completed(FilterOutput),
}

impl FilterOutcome {
    /// The output of a completed pass
    pub fn output(&self) -> Option<&FilterOutput> {
        match self {
            FilterOutcome::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FilterOutcome::Cancelled)
    }
}
