use std::path::PathBuf;

use anyhow::Context;
use beacon_env::BeaconEnv;
use beacon_policy::agent::PolicyAgent;
use beacon_training::{
    cancel::CancellationToken,
    config::TrainingConfig,
    trainer::{self, TrainOptions},
};
use chrono::Utc;

use crate::{command::DEFAULT_MODEL_PATH, model::policy_model::PolicyModel, util};

const DEFAULT_GENERATIONS: usize = 100;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration file (JSON); built-in defaults fill anything it omits
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of generations to run
    #[arg(long, default_value_t = DEFAULT_GENERATIONS)]
    generations: usize,
    /// Maximum environment steps per episode (0 = until the episode ends)
    #[arg(long, default_value_t = 0)]
    max_frames: u64,
    /// Seed for both the environment and the population
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path for the winning policy
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    output: PathBuf,
    /// Name stored in the saved model
    #[arg(long, default_value = "movetobeacon")]
    name: String,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        generations,
        max_frames,
        seed,
        output,
        name,
    } = arg;

    let mut config: TrainingConfig = match config {
        Some(path) => util::read_json_file("training config", path)?,
        None => TrainingConfig::default(),
    };
    if let Some(seed) = *seed {
        config.population.seed = seed;
        config.environment.seed = seed;
    }
    config
        .validate()
        .context("Invalid training configuration")?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let env = BeaconEnv::new(config.environment.clone());
    let options = TrainOptions {
        generations: *generations,
        max_frames: *max_frames,
    };
    let report = trainer::train(vec![PolicyAgent::new()], env, &config, options, &cancel)?;

    let model = PolicyModel {
        name: name.clone(),
        trained_at: Utc::now(),
        final_fitness: report.best.fitness(),
        network: config.network,
        genome: report.best.clone(),
        environment: config.environment,
        fitness_history: report.history.iter().map(|s| s.best_fitness).collect(),
    };
    model.save(output)?;

    eprintln!();
    if report.interrupted {
        eprintln!("Training interrupted; saving the best policy so far");
    }
    eprintln!("Model saved successfully");
    eprintln!("  Path: {}", output.display());
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Generations: {}", report.generations);
    eprintln!("  Final fitness: {:.3}", model.final_fitness);
    eprintln!(
        "  Took {:.3} seconds for {} steps: {:.3} fps",
        report.elapsed.as_secs_f64(),
        report.total_frames,
        report.frames_per_second()
    );

    Ok(())
}
