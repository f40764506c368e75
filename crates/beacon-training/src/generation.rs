//! Scores one generation of genomes.
//!
//! Each genome gets its own freshly built network and one episode; the
//! episode's fitness is written straight back into the genome. A cancelled
//! [`CancellationToken`] ends the pass early without an error, leaving every
//! genome after the cancel point untouched.

use beacon_env::Environment;
use beacon_policy::{
    episode::{EvaluationContext, run_episode},
    genome::{Genome, GenomeId},
    network::{BuildNetwork, NetworkBuildError},
};
use tracing::{debug, warn};

use crate::{cancel::CancellationToken, search::Flow};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvaluateError {
    #[display("cannot build network for genome {genome}: {source}")]
    Build {
        genome: GenomeId,
        source: NetworkBuildError,
    },
}

/// What happened during one generation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Genomes whose fitness was written, failed episodes included.
    pub scored: usize,
    /// Episodes that ended with an error; their fitness is the bonus earned before it.
    pub failed: usize,
    pub interrupted: bool,
    /// Environment steps taken during the pass.
    pub frames: u64,
}

impl GenerationSummary {
    /// How the search should proceed after this pass.
    #[must_use]
    pub fn flow(&self) -> Flow {
        match (self.interrupted, self.scored) {
            (false, _) => Flow::Continue,
            (true, 0) => Flow::Abort,
            (true, scored) => Flow::Stop { scored },
        }
    }
}

/// Evaluates `genomes` in order, writing each one's fitness.
///
/// The token is checked before every genome. Fitness is reset to 0.0 before the
/// network is built; an episode that fails part-way stores the bonus it earned
/// and the pass continues. A network that cannot be built is returned as an error.
pub fn evaluate_generation<E, B>(
    genomes: &mut [Genome],
    builder: &B,
    ctx: &mut EvaluationContext<E>,
    cancel: &CancellationToken,
) -> Result<GenerationSummary, EvaluateError>
where
    E: Environment,
    B: BuildNetwork + ?Sized,
{
    let start_frames = ctx.total_frames;
    let mut summary = GenerationSummary::default();

    for genome in genomes {
        if cancel.is_cancelled() {
            summary.interrupted = true;
            break;
        }

        genome.set_fitness(0.0);
        let network = builder.build(genome).map_err(|source| EvaluateError::Build {
            genome: genome.id(),
            source,
        })?;

        match run_episode(ctx, &network) {
            Ok(outcome) => {
                genome.set_fitness(outcome.fitness());
                debug!(
                    genome = %genome.id(),
                    fitness = outcome.fitness(),
                    frames = outcome.frames,
                    "genome evaluated"
                );
            }
            Err(e) => {
                warn!(genome = %genome.id(), bonus = e.bonus, "{e}");
                genome.set_fitness(e.bonus);
                summary.failed += 1;
            }
        }
        summary.scored += 1;
    }

    summary.frames = ctx.total_frames - start_frames;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use beacon_env::{
        ActionSpec, BeaconConfig, BeaconEnv, FunctionCall, ObservationSpec, StepError, TimeStep,
    };
    use beacon_policy::{
        agent::{INITIAL_MOVE_BONUS, PolicyAgent, SELECT_ARMY_BONUS},
        network::{Network, NetworkConfig},
    };

    use super::*;

    /// Selects the army on the first call and moves to the far corner afterwards.
    #[derive(Debug, Default)]
    struct SelectThenMove {
        calls: Cell<u32>,
    }

    impl Network for SelectThenMove {
        fn activate(&self, _inputs: &[f32]) -> Vec<f32> {
            let calls = self.calls.get();
            self.calls.set(calls + 1);
            if calls == 0 {
                vec![1.0, 0.0, 0.0, 0.0]
            } else {
                vec![0.0, 1.0, 1.0, 1.0]
            }
        }
    }

    struct SelectOnly;

    impl Network for SelectOnly {
        fn activate(&self, _inputs: &[f32]) -> Vec<f32> {
            vec![1.0, 0.0, 0.0, 0.0]
        }
    }

    struct Builder<F>(F);

    impl<F, N> BuildNetwork for Builder<F>
    where
        F: Fn() -> N,
        N: Network,
    {
        type Network = N;

        fn build(&self, _genome: &Genome) -> Result<N, NetworkBuildError> {
            Ok((self.0)())
        }
    }

    /// Cancels `token` once `episodes` episodes have ended.
    #[derive(Debug)]
    struct CancelAfter {
        inner: BeaconEnv,
        token: CancellationToken,
        episodes: usize,
    }

    impl Environment for CancelAfter {
        fn observation_spec(&self) -> ObservationSpec {
            self.inner.observation_spec()
        }

        fn action_spec(&self) -> ActionSpec {
            self.inner.action_spec()
        }

        fn reset(&mut self) -> Result<Vec<TimeStep>, StepError> {
            self.inner.reset()
        }

        fn step(&mut self, actions: &[FunctionCall]) -> Result<Vec<TimeStep>, StepError> {
            let time_steps = self.inner.step(actions)?;
            if time_steps.iter().any(TimeStep::is_last) {
                self.episodes -= 1;
                if self.episodes == 0 {
                    self.token.cancel();
                }
            }
            Ok(time_steps)
        }
    }

    fn env_config(screen_size: usize) -> BeaconConfig {
        BeaconConfig {
            screen_size,
            episode_steps: 5,
            seed: 11,
            ..BeaconConfig::default()
        }
    }

    fn context<E>(env: E) -> EvaluationContext<E>
    where
        E: Environment,
    {
        let mut ctx = EvaluationContext::new(env, vec![PolicyAgent::new()], 0);
        ctx.setup_agents().unwrap();
        ctx
    }

    fn genomes(count: u64) -> Vec<Genome> {
        (0..count).map(|i| Genome::new(GenomeId(i), vec![])).collect()
    }

    #[test]
    fn test_every_genome_scored() {
        let mut genomes = genomes(3);
        for genome in &mut genomes {
            genome.set_fitness(-7.0);
        }
        let mut ctx = context(BeaconEnv::new(env_config(16)));
        let summary = evaluate_generation(
            &mut genomes,
            &Builder(|| SelectOnly),
            &mut ctx,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(summary.scored, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.frames, 15);
        assert_eq!(summary.flow(), Flow::Continue);
        // selecting never moves the unit, so only the bonus counts
        assert!(genomes.iter().all(|g| g.fitness() == SELECT_ARMY_BONUS));
    }

    #[test]
    fn test_interrupt_after_third_genome() {
        let token = CancellationToken::new();
        let env = CancelAfter {
            inner: BeaconEnv::new(env_config(16)),
            token: token.clone(),
            episodes: 3,
        };
        let mut ctx = context(env);
        let mut genomes = genomes(5);

        let summary =
            evaluate_generation(&mut genomes, &Builder(|| SelectOnly), &mut ctx, &token).unwrap();

        assert_eq!(summary.scored, 3);
        assert!(summary.interrupted);
        assert_eq!(summary.flow(), Flow::Stop { scored: 3 });
        let fitness: Vec<_> = genomes.iter().map(Genome::fitness).collect();
        assert_eq!(fitness, vec![50.0, 50.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cancelled_before_start_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        let mut ctx = context(BeaconEnv::new(env_config(16)));
        let mut genomes = genomes(2);

        let summary =
            evaluate_generation(&mut genomes, &Builder(|| SelectOnly), &mut ctx, &token).unwrap();

        assert_eq!(summary.scored, 0);
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.flow(), Flow::Abort);
    }

    #[test]
    fn test_failed_episode_keeps_bonus() {
        // the move target (15, 15) lies outside an 8x8 screen
        let mut ctx = context(BeaconEnv::new(env_config(8)));
        let mut genomes = genomes(2);

        let summary = evaluate_generation(
            &mut genomes,
            &Builder(SelectThenMove::default),
            &mut ctx,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(summary.scored, 2);
        assert_eq!(summary.failed, 2);
        assert!(!summary.interrupted);
        for genome in &genomes {
            assert_eq!(genome.fitness(), SELECT_ARMY_BONUS + INITIAL_MOVE_BONUS);
        }
    }

    #[test]
    fn test_build_failure_propagates() {
        let config = NetworkConfig::default();
        let mut ctx = context(BeaconEnv::new(env_config(16)));
        let mut genomes = genomes(1);

        let result =
            evaluate_generation(&mut genomes, &config, &mut ctx, &CancellationToken::new());
        assert!(matches!(
            result,
            Err(EvaluateError::Build {
                genome: GenomeId(0),
                ..
            })
        ));
    }
}
