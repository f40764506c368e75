//! Training system that evolves beacon policies.
//!
//! This crate connects the evaluation side (`beacon-policy`) with a population
//! search. The search owns genomes and decides which ones survive; this crate
//! only scores them and reads the results back.
//!
//! # How Training Works
//!
//! 1. **Setup** - Bind the environment's specs to every agent ([`trainer`])
//! 2. **Population** - Create genomes with random weights ([`genetic`])
//! 3. **Evaluation** - Play one episode per genome and store its fitness ([`generation`])
//! 4. **Report** - Log and record per-generation statistics ([`reporter`])
//! 5. **Reproduction** - Keep elites, derive the rest from tournament winners
//! 6. **Repeat** - Until the generation count, the fitness threshold, or a cancel
//!
//! # Architecture
//!
//! ```text
//! Trainer (train)
//!     ↓ runs
//! Evolutionary Search (Population)
//!     ↓ calls per generation
//! Generation Driver (evaluate_generation)
//!     ↓ per genome
//! Episode Runner (beacon-policy)
//! ```
//!
//! # Cancellation
//!
//! A [`CancellationToken`](cancel::CancellationToken) is checked between genome
//! evaluations. A cancelled generation keeps the fitness of every genome scored
//! before the cancel; the search then stops and the best genome so far is
//! returned.
//!
//! # Current Limitations
//!
//! - **Fixed topology**: genomes are flat weight vectors for one network shape; there
//!   is no structural mutation
//! - **No crossover or speciation**: children are mutated copies of one parent
//! - **Single-threaded**: genomes are evaluated one after another against one
//!   environment

pub mod cancel;
pub mod config;
pub mod generation;
pub mod genetic;
pub mod reporter;
pub mod search;
pub mod statistics;
pub mod trainer;
pub mod weights;
