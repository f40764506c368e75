//! Entry point of a training run.
//!
//! [`train`] wires everything together: it binds the environment's specs to the
//! agents, creates the population with its reporters, and lets the search call
//! [`evaluate_generation`] once per generation until it stops. The result is the
//! fittest genome seen across the run plus timing and frame counts.

use std::time::{Duration, Instant};

use beacon_env::Environment;
use beacon_policy::{
    agent::{PolicyAgent, PolicyError},
    episode::EvaluationContext,
    genome::Genome,
};
use tracing::info;

use crate::{
    cancel::CancellationToken,
    config::{ConfigError, TrainingConfig, check_network},
    generation::{EvaluateError, evaluate_generation},
    genetic::Population,
    reporter::{GenerationStats, StatisticsReporter, StdOutReporter},
    search::EvolutionarySearch as _,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainError {
    #[display("no agents to train")]
    #[from(skip)]
    NoAgents,
    #[display("agent setup failed: {_0}")]
    Setup(PolicyError),
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("{_0}")]
    Evaluate(EvaluateError),
    #[display("training stopped before any genome was evaluated")]
    #[from(skip)]
    NoGenomeEvaluated,
}

/// Per-run limits that usually come from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainOptions {
    pub generations: usize,
    /// Maximum environment steps per episode; 0 means unlimited.
    pub max_frames: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            generations: 100,
            max_frames: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub best: Genome,
    /// Generations that scored at least one genome.
    pub generations: usize,
    pub elapsed: Duration,
    pub total_frames: u64,
    pub interrupted: bool,
    pub history: Vec<GenerationStats>,
}

impl TrainingReport {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Trains `agents` against `env` and returns the fittest genome found.
///
/// Stops after `options.generations` generations, once the configured fitness
/// threshold is reached, or when `cancel` fires. A cancelled run still returns
/// the best genome scored before the cancel.
pub fn train<E>(
    agents: Vec<PolicyAgent>,
    env: E,
    config: &TrainingConfig,
    options: TrainOptions,
    cancel: &CancellationToken,
) -> Result<TrainingReport, TrainError>
where
    E: Environment,
{
    if agents.is_empty() {
        return Err(TrainError::NoAgents);
    }
    let observation_spec = env.observation_spec();
    check_network(
        &config.network,
        observation_spec.layer_area() * observation_spec.layers.len(),
    )?;

    let mut ctx = EvaluationContext::new(env, agents, options.max_frames);
    ctx.setup_agents()?;

    let mut population =
        Population::new(config.population.clone(), config.network.weight_count())?;
    let stats = StatisticsReporter::new();
    population.add_reporter(StdOutReporter::new(true));
    population.add_reporter(stats.clone());

    info!(
        population = config.population.size,
        weights = config.network.weight_count(),
        generations = options.generations,
        "starting training"
    );

    let start = Instant::now();
    let mut interrupted = false;
    let best = population.run(
        |genomes| {
            let summary = evaluate_generation(genomes, &config.network, &mut ctx, cancel)?;
            interrupted |= summary.interrupted;
            info!(
                scored = summary.scored,
                failed = summary.failed,
                frames = summary.frames,
                "generation evaluated"
            );
            Ok::<_, TrainError>(summary.flow())
        },
        options.generations,
    )?;
    let elapsed = start.elapsed();

    let history = stats.history();
    let report = TrainingReport {
        best: best.ok_or(TrainError::NoGenomeEvaluated)?,
        generations: history.len(),
        elapsed,
        total_frames: ctx.total_frames,
        interrupted,
        history,
    };
    info!(
        "Took {:.3} seconds for {} steps: {:.3} fps",
        report.elapsed.as_secs_f64(),
        report.total_frames,
        report.frames_per_second()
    );
    info!(
        "Best genome {} with fitness {:.3}",
        report.best.id(),
        report.best.fitness()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use beacon_env::{BeaconConfig, BeaconEnv};
    use beacon_policy::network::NetworkConfig;

    use crate::genetic::PopulationConfig;

    use super::*;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            network: NetworkConfig {
                input_count: 2 * 16 * 16,
                hidden_layers: vec![4],
                ..NetworkConfig::default()
            },
            population: PopulationConfig {
                size: 6,
                elite_count: 1,
                tournament_size: 2,
                seed: 5,
                ..PopulationConfig::default()
            },
            environment: BeaconConfig {
                screen_size: 16,
                episode_steps: 10,
                seed: 5,
                ..BeaconConfig::default()
            },
        }
    }

    fn run(
        config: &TrainingConfig,
        options: TrainOptions,
        cancel: &CancellationToken,
    ) -> TrainingReport {
        let env = BeaconEnv::new(config.environment.clone());
        train(vec![PolicyAgent::new()], env, config, options, cancel).unwrap()
    }

    #[test]
    fn test_train_runs_all_generations() {
        let config = small_config();
        let options = TrainOptions {
            generations: 3,
            max_frames: 0,
        };
        let report = run(&config, options, &CancellationToken::new());

        assert_eq!(report.generations, 3);
        assert_eq!(report.history.len(), 3);
        assert!(!report.interrupted);
        // 3 generations x 6 genomes x 10 steps
        assert_eq!(report.total_frames, 180);
        let best_seen = report
            .history
            .iter()
            .map(|s| s.best_fitness)
            .fold(f32::MIN, f32::max);
        assert_eq!(report.best.fitness(), best_seen);
    }

    #[test]
    fn test_frame_budget_limits_episodes() {
        let config = small_config();
        let options = TrainOptions {
            generations: 1,
            max_frames: 4,
        };
        let report = run(&config, options, &CancellationToken::new());
        assert_eq!(report.total_frames, 6 * 4);
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = small_config();
        let options = TrainOptions {
            generations: 2,
            max_frames: 0,
        };
        let a = run(&config, options, &CancellationToken::new());
        let b = run(&config, options, &CancellationToken::new());
        assert_eq!(a.best, b.best);
    }

    #[test]
    fn test_cancelled_before_start() {
        let config = small_config();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let env = BeaconEnv::new(config.environment.clone());
        let result = train(
            vec![PolicyAgent::new()],
            env,
            &config,
            TrainOptions::default(),
            &cancel,
        );
        assert!(matches!(result, Err(TrainError::NoGenomeEvaluated)));
    }

    #[test]
    fn test_mismatched_network_rejected() {
        let mut config = small_config();
        config.network.input_count = 10;
        let env = BeaconEnv::new(config.environment.clone());
        let result = train(
            vec![PolicyAgent::new()],
            env,
            &config,
            TrainOptions::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(TrainError::Config(ConfigError::InputCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_no_agents_rejected() {
        let config = small_config();
        let env = BeaconEnv::new(config.environment.clone());
        let result = train(
            vec![],
            env,
            &config,
            TrainOptions::default(),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(TrainError::NoAgents)));
    }
}
