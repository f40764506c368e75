use serde::{Deserialize, Serialize};

/// Identity of a genome within a training run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("#{_0}")]
pub struct GenomeId(pub u64);

/// A candidate policy: the weights a network is built from, plus its fitness.
///
/// Fitness starts at 0.0 and is overwritten by every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    id: GenomeId,
    weights: Vec<f32>,
    fitness: f32,
}

impl Genome {
    #[must_use]
    pub fn new(id: GenomeId, weights: Vec<f32>) -> Self {
        Self {
            id,
            weights,
            fitness: 0.0,
        }
    }

    #[must_use]
    pub fn id(&self) -> GenomeId {
        self.id
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }
}
