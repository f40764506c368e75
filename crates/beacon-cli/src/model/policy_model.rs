use std::path::Path;

use anyhow::Context;
use beacon_env::BeaconConfig;
use beacon_policy::{
    genome::Genome,
    network::{BuildNetwork as _, FeedForwardNetwork, NetworkConfig},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{self, Output};

/// A trained policy as saved by `beacon train`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolicyModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f32,
    pub network: NetworkConfig,
    pub genome: Genome,
    /// Environment the policy was trained in.
    #[serde(default)]
    pub environment: BeaconConfig,
    /// Best fitness of each generation, oldest first.
    #[serde(default)]
    pub fitness_history: Vec<f32>,
}

impl PolicyModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("policy model", path)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        Output::save_json(self, Some(path))
    }

    pub fn build_network(&self) -> anyhow::Result<FeedForwardNetwork> {
        self.network
            .build(&self.genome)
            .with_context(|| format!("Policy model {} does not fit its network", self.name))
    }
}
