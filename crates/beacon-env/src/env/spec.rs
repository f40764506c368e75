use serde::{Deserialize, Serialize};

use crate::FunctionId;

use super::ScreenLayer;

/// Shape of the observations an environment produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSpec {
    pub screen_width: usize,
    pub screen_height: usize,
    pub layers: Vec<ScreenLayer>,
}

impl ObservationSpec {
    /// Number of cells in one screen layer.
    #[must_use]
    pub fn layer_area(&self) -> usize {
        self.screen_width * self.screen_height
    }

    #[must_use]
    pub fn has_layer(&self, layer: ScreenLayer) -> bool {
        self.layers.contains(&layer)
    }
}

/// Functions an environment understands and the bounds of screen arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub functions: Vec<FunctionId>,
    pub screen_width: usize,
    pub screen_height: usize,
}

impl ActionSpec {
    #[must_use]
    pub fn supports(&self, function: FunctionId) -> bool {
        self.functions.contains(&function)
    }
}
