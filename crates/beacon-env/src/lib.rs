//! Stepping environment contract for beacon training.
//!
//! The training loop treats the environment as an opaque stepper: it is reset,
//! fed one action per agent per step, and answers with a [`TimeStep`] per agent.
//! Observations expose screen feature layers ([`FeatureLayer`]) and the set of
//! functions legal in the current state.
//!
//! [`BeaconEnv`] is a small grid world that implements the contract: one
//! friendly unit, one neutral beacon, and the `no_op` / `select_army` /
//! `Move_screen` functions.

pub use self::{core::*, env::*};

pub mod core;
pub mod env;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StepError {
    #[display("{function} is not available in the current observation")]
    UnavailableFunction { function: FunctionId },
    #[display("expected {expected} actions, got {actual}")]
    ActionCountMismatch { expected: usize, actual: usize },
    #[display("screen target {target} is outside the {width}x{height} screen")]
    TargetOutOfBounds {
        target: Point,
        width: usize,
        height: usize,
    },
    #[display("{function} is missing its arguments")]
    MissingArgument { function: FunctionId },
    #[display("step called before the first reset")]
    NotStarted,
    #[display("step called after the episode ended")]
    EpisodeEnded,
}
