use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{FeatureLayer, FunctionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum StepType {
    First,
    Mid,
    Last,
}

/// Screen feature layers carried by an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenLayer {
    /// Ownership of each cell relative to the observing player.
    PlayerRelative,
    /// 1 where a currently selected unit stands.
    Selected,
}

impl ScreenLayer {
    pub const ALL: [Self; 2] = [Self::PlayerRelative, Self::Selected];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::PlayerRelative => 0,
            Self::Selected => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    screen: [FeatureLayer; 2],
    available_actions: BTreeSet<FunctionId>,
}

impl Observation {
    /// Creates an observation.
    ///
    /// # Panics
    ///
    /// Panics if the two layers differ in shape.
    #[must_use]
    pub fn new(
        player_relative: FeatureLayer,
        selected: FeatureLayer,
        available_actions: BTreeSet<FunctionId>,
    ) -> Self {
        assert_eq!(
            (player_relative.width(), player_relative.height()),
            (selected.width(), selected.height()),
            "screen layers must share one shape"
        );
        Self {
            screen: [player_relative, selected],
            available_actions,
        }
    }

    #[must_use]
    pub fn screen(&self, layer: ScreenLayer) -> &FeatureLayer {
        &self.screen[layer.index()]
    }

    #[must_use]
    pub fn available_actions(&self) -> &BTreeSet<FunctionId> {
        &self.available_actions
    }

    #[must_use]
    pub fn is_available(&self, function: FunctionId) -> bool {
        self.available_actions.contains(&function)
    }
}

/// What one agent sees after a reset or a step.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    pub step_type: StepType,
    pub reward: f32,
    pub observation: Observation,
}

impl TimeStep {
    #[must_use]
    pub fn first(observation: Observation) -> Self {
        Self {
            step_type: StepType::First,
            reward: 0.0,
            observation,
        }
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.step_type.is_first()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.step_type.is_last()
    }
}
