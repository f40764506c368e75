use std::path::PathBuf;

use anyhow::Context;
use beacon_env::{BeaconEnv, Point};
use beacon_policy::{
    agent::PolicyAgent,
    episode::{EvaluationContext, run_episode},
};
use beacon_training::config::TrainingConfig;
use serde::Serialize;

use crate::{command::DEFAULT_MODEL_PATH, model::policy_model::PolicyModel, util::Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the model file (JSON format)
    #[arg(default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,
    /// Maximum environment steps (0 = until the episode ends)
    #[arg(long, default_value_t = 0)]
    max_frames: u64,
    /// Environment seed; defaults to the one the model was trained with
    #[arg(long)]
    seed: Option<u64>,
}

/// Result of a replayed episode, printed to stdout as JSON.
#[derive(Debug, Serialize)]
struct PlayReport<'a> {
    model: &'a str,
    frames: u64,
    bonus: f32,
    score: f32,
    fitness: f32,
    reward: f32,
    origin: Option<Point>,
    target: Option<Point>,
    final_position: Option<Point>,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        model_path,
        max_frames,
        seed,
    } = arg;

    let model = PolicyModel::open(model_path)?;
    let network = model.build_network()?;

    let mut env_config = model.environment.clone();
    if let Some(seed) = *seed {
        env_config.seed = seed;
    }
    TrainingConfig {
        network: model.network.clone(),
        environment: env_config.clone(),
        ..TrainingConfig::default()
    }
    .validate()
    .with_context(|| format!("Policy model {} cannot be replayed", model.name))?;

    let env = BeaconEnv::new(env_config);
    let mut ctx = EvaluationContext::new(env, vec![PolicyAgent::new()], *max_frames);
    ctx.setup_agents()?;
    let outcome = run_episode(&mut ctx, &network)?;

    let report = PlayReport {
        model: &model.name,
        frames: outcome.frames,
        bonus: outcome.bonus,
        score: outcome.score,
        fitness: outcome.fitness(),
        reward: outcome.reward,
        origin: outcome.origin,
        target: outcome.target,
        final_position: outcome.final_position,
    };
    Output::save_json(&report, None)
}
