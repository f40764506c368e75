use std::collections::BTreeSet;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{FeatureLayer, FunctionCall, FunctionId, Point, StepError, core::player_relative};

use super::{
    ActionSpec, Environment, Observation, ObservationSpec, ScreenLayer, StepType, TimeStep,
};

/// Parameters of the [`BeaconEnv`] grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Width and height of the square screen.
    pub screen_size: usize,
    /// Number of steps after which the episode ends.
    pub episode_steps: usize,
    /// Cells the unit covers per step on each axis.
    pub unit_speed: i32,
    /// Half-width of the square beacon.
    pub beacon_radius: i32,
    pub seed: u64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            screen_size: 16,
            episode_steps: 240,
            unit_speed: 1,
            beacon_radius: 1,
            seed: 0,
        }
    }
}

/// A single-agent grid world: walk the friendly unit onto the neutral beacon.
///
/// Moving requires the army to be selected first, so `Move_screen` is only
/// legal after `select_army`. Reaching the beacon yields a reward of 1 and the
/// beacon respawns elsewhere. Every episode lasts exactly
/// [`BeaconConfig::episode_steps`] steps.
///
/// Layouts are drawn from a generator seeded with [`BeaconConfig::seed`], so
/// two environments built from the same config replay the same episodes.
#[derive(Debug, Clone)]
pub struct BeaconEnv {
    config: BeaconConfig,
    rng: Pcg64Mcg,
    unit: Point,
    beacon: Point,
    selected: bool,
    move_target: Option<Point>,
    steps: usize,
    state: EpisodeState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EpisodeState {
    NotStarted,
    Running,
    Ended,
}

impl BeaconEnv {
    /// Creates an environment.
    ///
    /// # Panics
    ///
    /// Panics if the screen is too small to hold a beacon and a separate unit.
    #[must_use]
    pub fn new(config: BeaconConfig) -> Self {
        let min_size = usize::try_from(config.beacon_radius * 2 + 3).unwrap_or(usize::MAX);
        assert!(
            config.screen_size >= min_size,
            "screen of size {} cannot hold a beacon of radius {}",
            config.screen_size,
            config.beacon_radius
        );
        Self {
            rng: Pcg64Mcg::seed_from_u64(config.seed),
            config,
            unit: Point::ORIGIN,
            beacon: Point::ORIGIN,
            selected: false,
            move_target: None,
            steps: 0,
            state: EpisodeState::NotStarted,
        }
    }

    #[must_use]
    pub fn unit_position(&self) -> Point {
        self.unit
    }

    #[must_use]
    pub fn beacon_position(&self) -> Point {
        self.beacon
    }

    fn screen_extent(&self) -> i32 {
        i32::try_from(self.config.screen_size).unwrap_or(i32::MAX)
    }

    fn random_cell(&mut self, margin: i32) -> Point {
        let size = self.screen_extent();
        Point::new(
            self.rng.random_range(margin..size - margin),
            self.rng.random_range(margin..size - margin),
        )
    }

    fn on_beacon(&self) -> bool {
        self.unit.chebyshev_distance_to(self.beacon) <= self.config.beacon_radius.unsigned_abs()
    }

    fn respawn_beacon(&mut self) {
        loop {
            self.beacon = self.random_cell(self.config.beacon_radius);
            if !self.on_beacon() {
                break;
            }
        }
    }

    fn available_actions(&self) -> BTreeSet<FunctionId> {
        let mut actions = BTreeSet::from([FunctionId::NoOp, FunctionId::SelectArmy]);
        if self.selected {
            actions.insert(FunctionId::MoveScreen);
        }
        actions
    }

    fn observe(&self) -> Observation {
        let size = self.config.screen_size;
        let mut relative = FeatureLayer::new(size, size);
        let r = self.config.beacon_radius;
        for dy in -r..=r {
            for dx in -r..=r {
                let cell = Point::new(self.beacon.x + dx, self.beacon.y + dy);
                relative.set(cell, player_relative::NEUTRAL);
            }
        }
        relative.set(self.unit, player_relative::SELF);

        let mut selected = FeatureLayer::new(size, size);
        if self.selected {
            selected.set(self.unit, 1);
        }
        Observation::new(relative, selected, self.available_actions())
    }

    fn apply(
        &mut self,
        action: &FunctionCall,
        available: &BTreeSet<FunctionId>,
    ) -> Result<(), StepError> {
        let function = action.function();
        if !available.contains(&function) {
            return Err(StepError::UnavailableFunction { function });
        }
        match function {
            FunctionId::NoOp => {}
            FunctionId::SelectArmy => self.selected = true,
            FunctionId::MoveScreen => {
                let target = action
                    .screen_target()
                    .ok_or(StepError::MissingArgument { function })?;
                let size = self.screen_extent();
                if !(0..size).contains(&target.x) || !(0..size).contains(&target.y) {
                    return Err(StepError::TargetOutOfBounds {
                        target,
                        width: self.config.screen_size,
                        height: self.config.screen_size,
                    });
                }
                self.move_target = Some(target);
            }
        }
        Ok(())
    }
}

impl Environment for BeaconEnv {
    fn observation_spec(&self) -> ObservationSpec {
        ObservationSpec {
            screen_width: self.config.screen_size,
            screen_height: self.config.screen_size,
            layers: ScreenLayer::ALL.to_vec(),
        }
    }

    fn action_spec(&self) -> ActionSpec {
        ActionSpec {
            functions: FunctionId::ALL.to_vec(),
            screen_width: self.config.screen_size,
            screen_height: self.config.screen_size,
        }
    }

    fn reset(&mut self) -> Result<Vec<TimeStep>, StepError> {
        self.unit = self.random_cell(0);
        self.respawn_beacon();
        self.selected = false;
        self.move_target = None;
        self.steps = 0;
        self.state = EpisodeState::Running;
        Ok(vec![TimeStep::first(self.observe())])
    }

    fn step(&mut self, actions: &[FunctionCall]) -> Result<Vec<TimeStep>, StepError> {
        match self.state {
            EpisodeState::NotStarted => return Err(StepError::NotStarted),
            EpisodeState::Ended => return Err(StepError::EpisodeEnded),
            EpisodeState::Running => {}
        }
        let [action] = actions else {
            return Err(StepError::ActionCountMismatch {
                expected: 1,
                actual: actions.len(),
            });
        };
        let available = self.available_actions();
        self.apply(action, &available)?;

        if let Some(target) = self.move_target {
            self.unit = self.unit.step_toward(target, self.config.unit_speed);
            if self.unit == target {
                self.move_target = None;
            }
        }

        let mut reward = 0.0;
        if self.on_beacon() {
            reward = 1.0;
            self.respawn_beacon();
        }

        self.steps += 1;
        let step_type = if self.steps >= self.config.episode_steps {
            self.state = EpisodeState::Ended;
            StepType::Last
        } else {
            StepType::Mid
        };
        Ok(vec![TimeStep {
            step_type,
            reward,
            observation: self.observe(),
        }])
    }
}
