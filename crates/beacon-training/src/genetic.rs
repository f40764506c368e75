//! Fixed-topology population search over network weights.
//!
//! # Algorithm Overview
//!
//! Each generation follows this cycle:
//!
//! 1. **Evaluate Fitness** - The evaluation callback scores every genome
//! 2. **Track Best** - The fittest genome seen so far is kept across generations
//! 3. **Elite Selection** - The top `elite_count` genomes pass unchanged
//! 4. **Tournament Selection** - Each remaining slot picks the fittest of
//!    `tournament_size` random genomes as its parent
//! 5. **Mutation** - The child is a copy of the parent with Gaussian noise added to
//!    a random subset of its weights
//!
//! Children get fresh [`GenomeId`]s and a fitness of 0.0.
//!
//! # Stopping
//!
//! The run ends after the requested number of generations, as soon as the best
//! genome of a generation reaches `fitness_threshold`, or when the callback
//! returns [`Flow::Stop`] or [`Flow::Abort`]. After a stop only the genomes the
//! callback reported as scored take part in best tracking and reporting.
//!
//! # Current Limitations
//!
//! - **No crossover**: every child has a single parent
//! - **No speciation**: all genomes compete in one pool
//! - **No structural mutation**: the weight count is fixed for the whole run

use beacon_policy::genome::{Genome, GenomeId};
use rand::{SeedableRng as _, seq::IndexedRandom as _};
use rand_distr::Normal;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    reporter::{Reporter, ReporterSet},
    search::{EvolutionarySearch, Flow},
    weights,
};

/// Parameters of the population search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of genomes per generation.
    pub size: usize,
    /// Number of top genomes preserved unchanged.
    pub elite_count: usize,
    /// Genomes drawn per tournament (larger = stronger selection pressure).
    pub tournament_size: usize,
    /// Standard deviation of initial weights.
    pub init_stdev: f32,
    /// Probability of mutating each weight of a child.
    pub mutation_rate: f32,
    /// Standard deviation of mutation noise.
    pub mutation_sigma: f32,
    /// Weights are clamped to `[-weight_bound, weight_bound]`.
    pub weight_bound: f32,
    /// Stop once a generation's best fitness reaches this value.
    pub fitness_threshold: Option<f32>,
    pub seed: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 50,
            elite_count: 2,
            tournament_size: 3,
            init_stdev: 1.0,
            mutation_rate: 0.1,
            mutation_sigma: 0.5,
            weight_bound: 30.0,
            fitness_threshold: None,
            seed: 0,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_count > self.size {
            return Err(ConfigError::TooManyElites {
                elite_count: self.elite_count,
                size: self.size,
            });
        }
        if !(1..=self.size).contains(&self.tournament_size) {
            return Err(ConfigError::InvalidTournamentSize {
                tournament_size: self.tournament_size,
            });
        }
        check_range("init_stdev", "[0, inf)", self.init_stdev, |v| v >= 0.0)?;
        check_range("mutation_rate", "[0, 1]", self.mutation_rate, |v| {
            (0.0..=1.0).contains(&v)
        })?;
        check_range("mutation_sigma", "[0, inf)", self.mutation_sigma, |v| {
            v >= 0.0
        })?;
        check_range("weight_bound", "(0, inf)", self.weight_bound, |v| v > 0.0)?;
        Ok(())
    }
}

fn check_range(
    name: &'static str,
    range: &'static str,
    value: f32,
    accept: impl FnOnce(f32) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && accept(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, range, value })
    }
}

fn normal(name: &'static str, std_dev: f32) -> Result<Normal<f32>, ConfigError> {
    Normal::new(0.0, std_dev).map_err(|_| ConfigError::OutOfRange {
        name,
        range: "[0, inf)",
        value: std_dev,
    })
}

/// A population of fixed-length weight genomes.
#[derive(Debug)]
pub struct Population {
    config: PopulationConfig,
    rng: Pcg64Mcg,
    noise: Normal<f32>,
    genomes: Vec<Genome>,
    next_id: u64,
    generation: usize,
    best: Option<Genome>,
    reporters: ReporterSet,
}

impl Population {
    /// Creates `config.size` genomes of `weight_count` random weights each.
    ///
    /// # Arguments
    ///
    /// * `config` - Search parameters; validated before anything is drawn
    /// * `weight_count` - Length of every genome, as required by the network topology
    ///
    /// # Returns
    ///
    /// A population at generation 0 whose genomes have ids `0..size` and a
    /// fitness of 0.0, or the first problem found in `config`
    pub fn new(config: PopulationConfig, weight_count: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let init = normal("init_stdev", config.init_stdev)?;
        let noise = normal("mutation_sigma", config.mutation_sigma)?;
        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);

        let genomes = (0..config.size)
            .map(|i| {
                let weights = weights::random(&mut rng, init, config.weight_bound, weight_count);
                Genome::new(GenomeId(i as u64), weights)
            })
            .collect();

        Ok(Self {
            next_id: config.size as u64,
            config,
            rng,
            noise,
            genomes,
            generation: 0,
            best: None,
            reporters: ReporterSet::default(),
        })
    }

    pub fn add_reporter<R>(&mut self, reporter: R)
    where
        R: Reporter + 'static,
    {
        self.reporters.add(reporter);
    }

    #[must_use]
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Index of the generation currently being evaluated, counted from 0.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The fittest genome seen so far.
    #[must_use]
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    fn allocate_id(&mut self) -> GenomeId {
        let id = GenomeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Replaces the current genomes with the next generation.
    ///
    /// The genomes are sorted by fitness, the top `elite_count` are carried over
    /// unchanged, and every other slot is filled with a mutated copy of a
    /// tournament winner.
    fn evolve(&mut self) {
        // sort by fitness descending
        self.genomes.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let mut next = Vec::with_capacity(self.config.size);
        next.extend(self.genomes[..self.config.elite_count].iter().cloned());

        while next.len() < self.config.size {
            let parent =
                tournament_select(&self.genomes, self.config.tournament_size, &mut self.rng);
            let mut child = parent.weights().to_vec();
            weights::mutate(
                &mut child,
                self.noise,
                self.config.weight_bound,
                self.config.mutation_rate,
                &mut self.rng,
            );
            let id = self.allocate_id();
            next.push(Genome::new(id, child));
        }

        self.genomes = next;
    }
}

impl EvolutionarySearch for Population {
    fn run<F, E>(&mut self, mut evaluate: F, generations: usize) -> Result<Option<Genome>, E>
    where
        F: FnMut(&mut [Genome]) -> Result<Flow, E>,
    {
        for _ in 0..generations {
            let generation = self.generation;
            self.reporters.start_generation(generation);

            let flow = evaluate(&mut self.genomes)?;
            let evaluated = match flow {
                Flow::Continue => self.genomes.len(),
                Flow::Stop { scored } => scored.min(self.genomes.len()),
                Flow::Abort => 0,
            };
            let Some(champion) = fittest(&self.genomes[..evaluated]).cloned() else {
                self.reporters.interrupted(generation);
                break;
            };
            if self
                .best
                .as_ref()
                .is_none_or(|best| champion.fitness() > best.fitness())
            {
                self.best = Some(champion.clone());
            }
            self.reporters
                .post_evaluate(generation, &self.genomes[..evaluated], &champion);

            if flow.is_stop() {
                self.reporters.interrupted(generation);
                break;
            }
            if let Some(threshold) = self.config.fitness_threshold
                && champion.fitness() >= threshold
            {
                self.reporters.found_solution(generation, &champion);
                break;
            }

            self.evolve();
            self.reporters.end_generation(generation, &self.genomes);
            self.generation += 1;
        }
        Ok(self.best.clone())
    }
}

fn fittest(genomes: &[Genome]) -> Option<&Genome> {
    genomes
        .iter()
        .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
}

/// Returns the fittest of `tournament_size` genomes drawn without replacement.
///
/// # Arguments
///
/// * `genomes` - Scored genomes to draw from
/// * `tournament_size` - Number of competitors (larger = stronger selection pressure)
/// * `rng` - Random number generator
///
/// # Panics
///
/// Panics if `tournament_size` is zero or `genomes` is empty.
fn tournament_select<'a, R>(
    genomes: &'a [Genome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Genome
where
    R: rand::Rng + ?Sized,
{
    assert!(tournament_size > 0);
    genomes
        .choose_multiple(rng, tournament_size)
        .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        .expect("tournament draws from a non-empty population")
}
