//! Environment contract and the built-in grid environment.
//!
//! - [`Environment`] - Reset/step contract consumed by the training loop
//! - [`TimeStep`] / [`Observation`] - What the environment reports after each step
//! - [`ObservationSpec`] / [`ActionSpec`] - Static shape of observations and actions
//! - [`BeaconEnv`] - Grid world with one unit and one beacon
//!
//! # Episode Flow
//!
//! 1. [`Environment::reset`] starts an episode and returns [`StepType::First`] steps
//! 2. [`Environment::step`] takes one [`FunctionCall`] per agent
//! 3. The episode ends when a step reports [`StepType::Last`]; stepping further is an error
//!
//! [`FunctionCall`]: crate::FunctionCall

pub use self::{beacon::*, spec::*, time_step::*};

use crate::{FunctionCall, StepError};

mod beacon;
mod spec;
mod time_step;

/// An episodic environment stepped by one action per agent.
pub trait Environment {
    fn observation_spec(&self) -> ObservationSpec;

    fn action_spec(&self) -> ActionSpec;

    /// Starts a new episode, returning the first time step of every agent.
    fn reset(&mut self) -> Result<Vec<TimeStep>, StepError>;

    /// Applies one action per agent and advances the simulation.
    fn step(&mut self, actions: &[FunctionCall]) -> Result<Vec<TimeStep>, StepError>;
}

impl<E> Environment for &mut E
where
    E: Environment + ?Sized,
{
    fn observation_spec(&self) -> ObservationSpec {
        (**self).observation_spec()
    }

    fn action_spec(&self) -> ActionSpec {
        (**self).action_spec()
    }

    fn reset(&mut self) -> Result<Vec<TimeStep>, StepError> {
        (**self).reset()
    }

    fn step(&mut self, actions: &[FunctionCall]) -> Result<Vec<TimeStep>, StepError> {
        (**self).step(actions)
    }
}
