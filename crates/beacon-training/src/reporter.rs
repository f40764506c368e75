//! Observers of a running search.
//!
//! A search notifies its reporters at fixed points of every generation:
//!
//! ```text
//! start_generation → post_evaluate → (found_solution | interrupted | end_generation)
//! ```
//!
//! [`StdOutReporter`] logs progress through `tracing`, [`StatisticsReporter`]
//! keeps a per-generation history the caller can read after the run.

use std::{
    cell::RefCell,
    fmt,
    rc::Rc,
    time::{Duration, Instant},
};

use beacon_policy::genome::{Genome, GenomeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::statistics::FitnessStats;

pub trait Reporter: fmt::Debug {
    fn start_generation(&mut self, _generation: usize) {}

    /// Called once the generation's genomes carry their fitness.
    fn post_evaluate(&mut self, _generation: usize, _genomes: &[Genome], _best: &Genome) {}

    /// Called when `best` reached the fitness threshold; no further generation runs.
    fn found_solution(&mut self, _generation: usize, _best: &Genome) {}

    /// Called after the next generation has been produced.
    fn end_generation(&mut self, _generation: usize, _genomes: &[Genome]) {}

    fn interrupted(&mut self, _generation: usize) {}
}

/// Forwards every notification to each registered reporter in order.
#[derive(Debug, Default)]
pub struct ReporterSet {
    reporters: Vec<Box<dyn Reporter>>,
}

impl ReporterSet {
    pub fn add<R>(&mut self, reporter: R)
    where
        R: Reporter + 'static,
    {
        self.reporters.push(Box::new(reporter));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for ReporterSet {
    fn start_generation(&mut self, generation: usize) {
        for r in &mut self.reporters {
            r.start_generation(generation);
        }
    }

    fn post_evaluate(&mut self, generation: usize, genomes: &[Genome], best: &Genome) {
        for r in &mut self.reporters {
            r.post_evaluate(generation, genomes, best);
        }
    }

    fn found_solution(&mut self, generation: usize, best: &Genome) {
        for r in &mut self.reporters {
            r.found_solution(generation, best);
        }
    }

    fn end_generation(&mut self, generation: usize, genomes: &[Genome]) {
        for r in &mut self.reporters {
            r.end_generation(generation, genomes);
        }
    }

    fn interrupted(&mut self, generation: usize) {
        for r in &mut self.reporters {
            r.interrupted(generation);
        }
    }
}

/// Logs per-generation progress at `info` level.
#[derive(Debug)]
pub struct StdOutReporter {
    show_individuals: bool,
    generation_start: Option<Instant>,
}

impl StdOutReporter {
    /// With `show_individuals`, every genome's fitness is also logged at `debug` level.
    #[must_use]
    pub fn new(show_individuals: bool) -> Self {
        Self {
            show_individuals,
            generation_start: None,
        }
    }
}

impl Reporter for StdOutReporter {
    fn start_generation(&mut self, generation: usize) {
        info!("****** Running generation {generation} ******");
        self.generation_start = Some(Instant::now());
    }

    fn post_evaluate(&mut self, _generation: usize, genomes: &[Genome], best: &Genome) {
        if self.show_individuals {
            for genome in genomes {
                debug!(genome = %genome.id(), fitness = genome.fitness(), "individual");
            }
        }
        if let Some(stats) = FitnessStats::new(genomes.iter().map(Genome::fitness)) {
            info!(
                "Population's average fitness: {:.5} stdev: {:.5}",
                stats.mean, stats.std_dev
            );
        }
        info!("Best fitness: {:.5} - id {}", best.fitness(), best.id());
    }

    fn found_solution(&mut self, generation: usize, best: &Genome) {
        info!(
            "Best individual in generation {generation} meets fitness threshold - id {}",
            best.id()
        );
    }

    fn end_generation(&mut self, _generation: usize, genomes: &[Genome]) {
        info!("Population of {} members", genomes.len());
        if let Some(start) = self.generation_start.take() {
            info!("Generation time: {:.3} sec", start.elapsed().as_secs_f64());
        }
    }

    fn interrupted(&mut self, generation: usize) {
        warn!("Training interrupted during generation {generation}");
    }
}

/// Fitness statistics of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: GenomeId,
    pub best_fitness: f32,
    pub fitness: FitnessStats,
    /// Time from generation start to the end of evaluation.
    pub elapsed: Duration,
}

/// Records a [`GenerationStats`] for every evaluated generation.
///
/// Clones share the same history, so a caller can keep one clone and hand the
/// other to the search.
#[derive(Debug, Default, Clone)]
pub struct StatisticsReporter {
    history: Rc<RefCell<Vec<GenerationStats>>>,
    generation_start: Option<Instant>,
}

impl StatisticsReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<GenerationStats> {
        self.history.borrow().clone()
    }

    /// Best fitness of each recorded generation, oldest first.
    #[must_use]
    pub fn best_fitness(&self) -> Vec<f32> {
        self.history.borrow().iter().map(|s| s.best_fitness).collect()
    }
}

impl Reporter for StatisticsReporter {
    fn start_generation(&mut self, _generation: usize) {
        self.generation_start = Some(Instant::now());
    }

    fn post_evaluate(&mut self, generation: usize, genomes: &[Genome], best: &Genome) {
        let Some(fitness) = FitnessStats::new(genomes.iter().map(Genome::fitness)) else {
            return;
        };
        let elapsed = self
            .generation_start
            .as_ref()
            .map(Instant::elapsed)
            .unwrap_or_default();
        self.history.borrow_mut().push(GenerationStats {
            generation,
            best: best.id(),
            best_fitness: best.fitness(),
            fitness,
            elapsed,
        });
    }
}
