//! Episode evaluation: the fitness of one genome.
//!
//! # How It Works
//!
//! 1. **Reset** - Reset the environment and every agent's bonus gates
//! 2. **Reference** - Locate the friendly unit (`origin`) and the beacon (`target`)
//!    as the truncated mean position of their cells in the player-relative layer
//! 3. **Run** - Step agents and environment until the episode ends or the frame
//!    budget is spent, collecting shaping bonuses
//! 4. **Score** - Locate the unit again and compare its distance to the beacon
//!    with the starting distance
//!
//! ```text
//! score   = (1 - final_distance / origin_distance) × 100
//! fitness = bonuses + score
//! ```
//!
//! Ending on the beacon scores 100, ending where the unit started (distance-wise)
//! scores 0, and ending farther away goes negative.
//!
//! # Termination
//!
//! The loop checks for termination *before* asking agents for actions, so no
//! action is computed from a terminal observation. With a frame budget of `N`
//! (`N > 0`) at most `N` environment steps are taken per episode.
//!
//! # Degenerate Layouts
//!
//! If the unit or the beacon cannot be found (no matching cells), or the unit
//! starts exactly on the beacon (`origin_distance == 0`), the distance score is
//! 0.0. Shaping bonuses still count.

use std::iter;

use beacon_env::{Environment, Point, ScreenLayer, StepError, TimeStep, player_relative};
use tracing::debug;

use crate::{
    agent::{PolicyAgent, PolicyError},
    network::Network,
};

/// Everything an evaluation needs besides the network.
///
/// Owned by the trainer for the whole run and lent to each generation.
#[derive(Debug)]
pub struct EvaluationContext<E> {
    pub env: E,
    pub agents: Vec<PolicyAgent>,
    /// Maximum environment steps per episode; 0 means unlimited.
    pub frame_budget: u64,
    /// Environment steps taken since the context was created.
    pub total_frames: u64,
}

impl<E> EvaluationContext<E>
where
    E: Environment,
{
    #[must_use]
    pub fn new(env: E, agents: Vec<PolicyAgent>, frame_budget: u64) -> Self {
        Self {
            env,
            agents,
            frame_budget,
            total_frames: 0,
        }
    }

    /// Binds the environment's specs to every agent.
    pub fn setup_agents(&mut self) -> Result<(), PolicyError> {
        let observation_spec = self.env.observation_spec();
        let action_spec = self.env.action_spec();
        for agent in &mut self.agents {
            agent.setup(&observation_spec, &action_spec)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Termination {
    /// The environment reported the last step.
    Terminal,
    /// The frame budget ran out first.
    BudgetExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub termination: Termination,
    /// Environment steps taken in this episode.
    pub frames: u64,
    /// Sum of shaping bonuses granted by the agents.
    pub bonus: f32,
    /// Distance-based score; see the module docs.
    pub score: f32,
    /// Sum of environment rewards, reported but not part of fitness.
    pub reward: f32,
    pub origin: Option<Point>,
    pub target: Option<Point>,
    pub final_position: Option<Point>,
}

impl EpisodeOutcome {
    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.bonus + self.score
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EpisodeFailure {
    #[display("environment failed: {_0}")]
    Step(StepError),
    #[display("policy failed: {_0}")]
    Policy(PolicyError),
    #[display("environment returned {actual} time steps for {expected} agents")]
    #[from(skip)]
    TimeStepCount { expected: usize, actual: usize },
}

/// An episode that ended early, with what it had earned so far.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("episode aborted after {frames} frames: {source}")]
pub struct EpisodeError {
    pub frames: u64,
    pub bonus: f32,
    pub source: EpisodeFailure,
}

impl EpisodeError {
    fn new<S>(frames: u64, bonus: f32, source: S) -> Self
    where
        S: Into<EpisodeFailure>,
    {
        Self {
            frames,
            bonus,
            source: source.into(),
        }
    }
}

/// Converts the start and end distances to the beacon into a score.
///
/// Returns 0.0 when `origin_distance` is not positive.
///
/// ```
/// use beacon_policy::episode::distance_score;
///
/// assert_eq!(distance_score(10.0, 5.0), 50.0);
/// assert_eq!(distance_score(10.0, 0.0), 100.0);
/// assert_eq!(distance_score(10.0, 20.0), -100.0);
/// assert_eq!(distance_score(0.0, 3.0), 0.0);
/// ```
#[must_use]
pub fn distance_score(origin_distance: f32, final_distance: f32) -> f32 {
    if origin_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - final_distance / origin_distance) * 100.0
}

fn locate(time_step: &TimeStep, marker: i32) -> Option<Point> {
    time_step
        .observation
        .screen(ScreenLayer::PlayerRelative)
        .mean_position(marker)
}

fn check_time_steps(time_steps: &[TimeStep], expected: usize) -> Result<(), EpisodeFailure> {
    if time_steps.is_empty() || time_steps.len() != expected {
        return Err(EpisodeFailure::TimeStepCount {
            expected,
            actual: time_steps.len(),
        });
    }
    Ok(())
}

/// Runs one full episode of `network` against the context's environment.
pub fn run_episode<E, N>(
    ctx: &mut EvaluationContext<E>,
    network: &N,
) -> Result<EpisodeOutcome, EpisodeError>
where
    E: Environment,
    N: Network + ?Sized,
{
    let agent_count = ctx.agents.len();
    let mut time_steps = ctx.env.reset().map_err(|e| EpisodeError::new(0, 0.0, e))?;
    check_time_steps(&time_steps, agent_count).map_err(|e| EpisodeError::new(0, 0.0, e))?;
    for agent in &mut ctx.agents {
        agent.reset();
    }

    let origin = locate(&time_steps[0], player_relative::SELF);
    let target = locate(&time_steps[0], player_relative::NEUTRAL);

    let mut frames = 0;
    let mut bonus = 0.0;
    let mut reward = 0.0;
    let mut actions = Vec::with_capacity(agent_count);
    let termination = loop {
        if time_steps.iter().any(TimeStep::is_last) {
            break Termination::Terminal;
        }
        if ctx.frame_budget > 0 && frames >= ctx.frame_budget {
            break Termination::BudgetExhausted;
        }

        actions.clear();
        for (agent, time_step) in iter::zip(&mut ctx.agents, &time_steps) {
            let decision = agent
                .decide(&time_step.observation, network)
                .map_err(|e| EpisodeError::new(frames, bonus, e))?;
            bonus += decision.bonus;
            actions.push(decision.action);
        }

        time_steps = ctx
            .env
            .step(&actions)
            .map_err(|e| EpisodeError::new(frames, bonus, e))?;
        frames += 1;
        ctx.total_frames += 1;
        check_time_steps(&time_steps, agent_count)
            .map_err(|e| EpisodeError::new(frames, bonus, e))?;
        reward += time_steps[0].reward;
    };

    let final_position = locate(&time_steps[0], player_relative::SELF);
    let score = match (origin, target, final_position) {
        (Some(origin), Some(target), Some(final_position)) => distance_score(
            origin.distance_to(target),
            final_position.distance_to(target),
        ),
        _ => 0.0,
    };

    let outcome = EpisodeOutcome {
        termination,
        frames,
        bonus,
        score,
        reward,
        origin,
        target,
        final_position,
    };
    debug!(
        ?termination,
        frames,
        bonus,
        score,
        fitness = outcome.fitness(),
        "episode finished"
    );
    Ok(outcome)
}
