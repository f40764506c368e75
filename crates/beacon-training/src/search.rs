//! The contract between the trainer and an evolutionary search.
//!
//! The search owns the genomes. Once per generation it hands them, mutably, to an
//! evaluation callback that writes each genome's fitness, then uses the fitness
//! values to decide what the next generation looks like. How it does that
//! (selection, mutation, speciation) is the search's business.

use beacon_policy::genome::Genome;

/// What the evaluation callback asks the search to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Flow {
    /// Every genome was scored; carry on.
    Continue,
    /// The first `scored` genomes were scored before an interrupt. Their fitness
    /// counts, the rest is ignored, and no further generation is run.
    Stop { scored: usize },
    /// Nothing was scored; the generation is discarded.
    Abort,
}

pub trait EvolutionarySearch {
    /// Runs at most `generations` generations, scoring each through `evaluate`.
    ///
    /// Returns the fittest genome seen across the run, or `None` if no generation
    /// was scored. Errors from `evaluate` stop the run and are returned as is.
    fn run<F, E>(&mut self, evaluate: F, generations: usize) -> Result<Option<Genome>, E>
    where
        F: FnMut(&mut [Genome]) -> Result<Flow, E>;
}
