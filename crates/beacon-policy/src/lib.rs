//! Turning a genome into behaviour, and behaviour into fitness.
//!
//! This crate implements the evaluation side of beacon training:
//!
//! 1. **Network** ([`network`]) - Builds a feed-forward network from a genome's weights.
//! 2. **Policy** ([`agent`]) - Maps one observation to one environment action through the
//!    network, and reports one-time shaping bonuses.
//! 3. **Episode** ([`episode`]) - Drives a whole episode and scores how much closer the
//!    friendly unit ended up to the beacon.
//!
//! # Architecture
//!
//! ```text
//! Episode Runner (fitness of one genome)
//!     ↓ asks
//! Policy Agent (one action per observation)
//!     ↓ uses
//! Network (built from the genome)
//! ```
//!
//! The search that produces genomes lives in `beacon-training`; it only reads back
//! fitness values.

pub mod agent;
pub mod episode;
pub mod genome;
pub mod network;
