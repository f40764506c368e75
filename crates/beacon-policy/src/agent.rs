//! Policy agent: one observation in, one environment action out.
//!
//! # Decision Policy
//!
//! The network sees both screen layers flattened row-major and answers with four
//! raw outputs `[select, move, target_x, target_y]`. The target outputs are
//! clamped to `[0, 1]` before use; the two gates are compared unclamped:
//!
//! ```text
//! select > 0.5                    => select_army       (+50 first time this episode)
//! move > 0.5 and Move_screen legal => Move_screen(x, y) (+25 first time this episode)
//! otherwise                       => no_op
//!
//! x = round(clamp(target_x) * 15), y = round(clamp(target_y) * 15)
//! ```
//!
//! Shaping bonuses are returned with the action in a [`Decision`]; the agent never
//! touches genome fitness itself. Which bonuses were already granted is tracked
//! in a [`RunState`] that [`PolicyAgent::reset`] clears at every episode start.

use beacon_env::{
    ActionSpec, FunctionCall, FunctionId, Observation, ObservationSpec, Point, Queue,
    ScreenLayer, SelectAdd,
};

use crate::network::Network;

/// Number of raw outputs the policy network must produce.
pub const POLICY_OUTPUT_COUNT: usize = 4;

/// Gate level above which the select and move outputs fire.
pub const ACTIVATION_THRESHOLD: f32 = 0.5;

/// Scale applied to the clamped target outputs to obtain a screen cell.
pub const MOVE_TARGET_SCALE: f32 = 15.0;

/// Smallest square screen that contains every cell the policy can target.
pub const MIN_SCREEN_SIZE: usize = 16;

pub const SELECT_ARMY_BONUS: f32 = 50.0;
pub const INITIAL_MOVE_BONUS: f32 = 25.0;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PolicyError {
    #[display("agent used before setup")]
    NotSetUp,
    #[display("observation spec lacks the {layer:?} screen layer")]
    MissingScreenLayer { layer: ScreenLayer },
    #[display("action spec lacks {function}")]
    UnsupportedFunction { function: FunctionId },
    #[display("network produced {actual} outputs, policy needs {expected}")]
    OutputCountMismatch { expected: usize, actual: usize },
    #[display("observation has {actual} features, observation spec promised {expected}")]
    ObservationMismatch { expected: usize, actual: usize },
}

/// One-time bonus gates, scoped to a single episode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub selected_army_done: bool,
    pub initial_move_done: bool,
}

/// An action together with the shaping bonus it earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: FunctionCall,
    pub bonus: f32,
}

impl Decision {
    fn without_bonus(action: FunctionCall) -> Self {
        Self { action, bonus: 0.0 }
    }
}

/// Drives one agent of the environment with a policy network.
#[derive(Debug, Default, Clone)]
pub struct PolicyAgent {
    /// Features per observation, known once set up.
    feature_count: Option<usize>,
    run_state: RunState,
    episodes: u64,
    steps: u64,
    features: Vec<f32>,
}

impl PolicyAgent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the environment's specs to this agent.
    ///
    /// Fails if the environment cannot provide the screen layers the policy reads
    /// or the functions it emits.
    pub fn setup(
        &mut self,
        observation_spec: &ObservationSpec,
        action_spec: &ActionSpec,
    ) -> Result<(), PolicyError> {
        for layer in [ScreenLayer::PlayerRelative, ScreenLayer::Selected] {
            if !observation_spec.has_layer(layer) {
                return Err(PolicyError::MissingScreenLayer { layer });
            }
        }
        for function in FunctionId::ALL {
            if !action_spec.supports(function) {
                return Err(PolicyError::UnsupportedFunction { function });
            }
        }
        let feature_count = 2 * observation_spec.layer_area();
        self.features = Vec::with_capacity(feature_count);
        self.feature_count = Some(feature_count);
        Ok(())
    }

    /// Starts a new episode: clears the bonus gates.
    pub fn reset(&mut self) {
        self.run_state = RunState::default();
        self.episodes += 1;
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Episodes started since creation.
    #[must_use]
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Decisions made since creation.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Chooses the action for `observation`.
    pub fn decide<N>(
        &mut self,
        observation: &Observation,
        network: &N,
    ) -> Result<Decision, PolicyError>
    where
        N: Network + ?Sized,
    {
        let expected = self.feature_count.ok_or(PolicyError::NotSetUp)?;
        self.steps += 1;

        fill_features(observation, &mut self.features);
        if self.features.len() != expected {
            return Err(PolicyError::ObservationMismatch {
                expected,
                actual: self.features.len(),
            });
        }
        let outputs = network.activate(&self.features);
        let outputs: [f32; POLICY_OUTPUT_COUNT] = outputs
            .get(..POLICY_OUTPUT_COUNT)
            .and_then(|o| o.try_into().ok())
            .ok_or(PolicyError::OutputCountMismatch {
                expected: POLICY_OUTPUT_COUNT,
                actual: outputs.len(),
            })?;
        Ok(decode(outputs, observation, &mut self.run_state))
    }
}

/// Concatenates the player-relative and selected layers row-major into `features`.
#[expect(clippy::cast_precision_loss)]
pub fn fill_features(observation: &Observation, features: &mut Vec<f32>) {
    features.clear();
    for layer in [ScreenLayer::PlayerRelative, ScreenLayer::Selected] {
        features.extend(
            observation
                .screen(layer)
                .cells()
                .iter()
                .map(|v| *v as f32),
        );
    }
}

/// Turns raw network outputs into a decision, updating the bonus gates.
#[must_use]
pub fn decode(
    outputs: [f32; POLICY_OUTPUT_COUNT],
    observation: &Observation,
    run_state: &mut RunState,
) -> Decision {
    let [select, move_gate, target_x, target_y] = outputs;

    if select > ACTIVATION_THRESHOLD {
        let bonus = if run_state.selected_army_done {
            0.0
        } else {
            run_state.selected_army_done = true;
            SELECT_ARMY_BONUS
        };
        return Decision {
            action: FunctionCall::select_army(SelectAdd::Replace),
            bonus,
        };
    }

    if move_gate > ACTIVATION_THRESHOLD {
        if !observation.is_available(FunctionId::MoveScreen) {
            return Decision::without_bonus(FunctionCall::no_op());
        }
        let target = Point::new(scale_target(target_x), scale_target(target_y));
        let bonus = if run_state.initial_move_done {
            0.0
        } else {
            run_state.initial_move_done = true;
            INITIAL_MOVE_BONUS
        };
        return Decision {
            action: FunctionCall::move_screen(Queue::Now, target),
            bonus,
        };
    }

    Decision::without_bonus(FunctionCall::no_op())
}

#[expect(clippy::cast_possible_truncation)]
fn scale_target(raw: f32) -> i32 {
    // NaN reads as 0
    let clamped = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
    (clamped * MOVE_TARGET_SCALE).round() as i32
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use beacon_env::FeatureLayer;

    use super::*;

    struct FixedOutputs(Vec<f32>);

    impl Network for FixedOutputs {
        fn activate(&self, _inputs: &[f32]) -> Vec<f32> {
            self.0.clone()
        }
    }

    fn observation(move_available: bool) -> Observation {
        let mut available = BTreeSet::from([FunctionId::NoOp, FunctionId::SelectArmy]);
        if move_available {
            available.insert(FunctionId::MoveScreen);
        }
        Observation::new(
            FeatureLayer::from_fn(16, 16, |x, y| i32::from(x == 2 && y == 3)),
            FeatureLayer::new(16, 16),
            available,
        )
    }

    fn specs() -> (ObservationSpec, ActionSpec) {
        (
            ObservationSpec {
                screen_width: 16,
                screen_height: 16,
                layers: ScreenLayer::ALL.to_vec(),
            },
            ActionSpec {
                functions: FunctionId::ALL.to_vec(),
                screen_width: 16,
                screen_height: 16,
            },
        )
    }

    fn ready_agent() -> PolicyAgent {
        let mut agent = PolicyAgent::new();
        let (obs, act) = specs();
        agent.setup(&obs, &act).unwrap();
        agent.reset();
        agent
    }

    #[test]
    fn test_select_bonus_granted_once() {
        let obs = observation(false);
        let mut run_state = RunState::default();
        let first = decode([0.9, 0.0, 0.0, 0.0], &obs, &mut run_state);
        assert_eq!(first.action, FunctionCall::select_army(SelectAdd::Replace));
        assert_eq!(first.bonus, SELECT_ARMY_BONUS);
        for _ in 0..10 {
            let again = decode([0.9, 0.0, 0.0, 0.0], &obs, &mut run_state);
            assert_eq!(again.action.function(), FunctionId::SelectArmy);
            assert_eq!(again.bonus, 0.0);
        }
        assert!(run_state.selected_army_done);
    }

    #[test]
    fn test_select_takes_priority_over_move() {
        let obs = observation(true);
        let mut run_state = RunState::default();
        let decision = decode([0.6, 0.9, 1.0, 1.0], &obs, &mut run_state);
        assert_eq!(decision.action.function(), FunctionId::SelectArmy);
        assert!(!run_state.initial_move_done);
    }

    #[test]
    fn test_move_bonus_granted_once() {
        let obs = observation(true);
        let mut run_state = RunState::default();
        let first = decode([0.0, 0.9, 0.4, 0.6], &obs, &mut run_state);
        assert_eq!(
            first.action,
            FunctionCall::move_screen(Queue::Now, Point::new(6, 9))
        );
        assert_eq!(first.bonus, INITIAL_MOVE_BONUS);
        let second = decode([0.0, 0.9, 0.4, 0.6], &obs, &mut run_state);
        assert_eq!(second.bonus, 0.0);
    }

    #[test]
    fn test_illegal_move_is_no_op_without_bonus() {
        let obs = observation(false);
        let mut run_state = RunState::default();
        let decision = decode([0.0, 0.9, 0.5, 0.5], &obs, &mut run_state);
        assert_eq!(decision.action, FunctionCall::no_op());
        assert_eq!(decision.bonus, 0.0);
        assert!(!run_state.initial_move_done);
    }

    #[test]
    fn test_gates_at_threshold_do_not_fire() {
        let obs = observation(true);
        let mut run_state = RunState::default();
        let decision = decode([0.5, 0.5, 1.0, 1.0], &obs, &mut run_state);
        assert_eq!(decision, Decision::without_bonus(FunctionCall::no_op()));
    }

    #[test]
    fn test_target_outputs_are_clamped() {
        let obs = observation(true);
        let clamped = decode([0.0, 0.9, -5.0, 5.0], &obs, &mut RunState::default());
        let bounded = decode([0.0, 0.9, 0.0, 1.0], &obs, &mut RunState::default());
        assert_eq!(clamped, bounded);
        assert_eq!(clamped.action.screen_target(), Some(Point::new(0, 15)));

        let nan = decode([0.0, 0.9, f32::NAN, 0.5], &obs, &mut RunState::default());
        assert_eq!(nan.action.screen_target(), Some(Point::new(0, 8)));
    }

    #[test]
    fn test_gate_outputs_are_not_clamped() {
        // a large negative select output must not clamp up to a firing value
        let obs = observation(true);
        let decision = decode([-3.0, 7.0, 0.0, 0.0], &obs, &mut RunState::default());
        assert_eq!(decision.action.function(), FunctionId::MoveScreen);
    }

    #[test]
    fn test_features_are_both_layers_row_major() {
        let obs = observation(false);
        let mut features = Vec::new();
        fill_features(&obs, &mut features);
        assert_eq!(features.len(), 2 * 16 * 16);
        assert_eq!(features[3 * 16 + 2], 1.0);
        assert_eq!(features.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_decide_requires_setup() {
        let mut agent = PolicyAgent::new();
        let network = FixedOutputs(vec![0.0; 4]);
        assert!(matches!(
            agent.decide(&observation(false), &network),
            Err(PolicyError::NotSetUp)
        ));
    }

    #[test]
    fn test_setup_rejects_missing_layer() {
        let mut agent = PolicyAgent::new();
        let (mut obs, act) = specs();
        obs.layers = vec![ScreenLayer::PlayerRelative];
        assert!(matches!(
            agent.setup(&obs, &act),
            Err(PolicyError::MissingScreenLayer {
                layer: ScreenLayer::Selected
            })
        ));
    }

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_min_screen_holds_every_target() {
        assert_eq!(scale_target(1.0), 15);
        assert!(MOVE_TARGET_SCALE < MIN_SCREEN_SIZE as f32);
    }

    #[test]
    fn test_decide_rejects_observation_of_other_size() {
        let mut agent = ready_agent();
        let small = Observation::new(
            FeatureLayer::new(8, 8),
            FeatureLayer::new(8, 8),
            BTreeSet::from([FunctionId::NoOp]),
        );
        let network = FixedOutputs(vec![0.0; 4]);
        assert!(matches!(
            agent.decide(&small, &network),
            Err(PolicyError::ObservationMismatch {
                expected: 512,
                actual: 128
            })
        ));
        assert_eq!(agent.run_state(), RunState::default());
    }

    #[test]
    fn test_decide_rejects_short_output() {
        let mut agent = ready_agent();
        let network = FixedOutputs(vec![0.9, 0.0, 0.0]);
        assert!(matches!(
            agent.decide(&observation(false), &network),
            Err(PolicyError::OutputCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut agent = ready_agent();
        let network = FixedOutputs(vec![0.9, 0.0, 0.0, 0.0]);
        let decision = agent.decide(&observation(false), &network).unwrap();
        assert_eq!(decision.bonus, SELECT_ARMY_BONUS);
        assert!(agent.run_state().selected_army_done);

        agent.reset();
        assert_eq!(agent.run_state(), RunState::default());
        let decision = agent.decide(&observation(false), &network).unwrap();
        assert_eq!(decision.bonus, SELECT_ARMY_BONUS);
        assert_eq!(agent.episodes(), 2);
        assert_eq!(agent.steps(), 2);
    }
}
