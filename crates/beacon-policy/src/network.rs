//! Feed-forward networks built from genome weights.
//!
//! A genome carries a flat weight vector; [`NetworkConfig`] fixes the topology it
//! is read against. Each layer consumes `(inputs + 1) × outputs` weights in
//! output-major order, the trailing weight of every output being its bias:
//!
//! ```text
//! layer weights = [w(0,0) .. w(0,in-1) bias(0), w(1,0) .. bias(1), ...]
//! ```
//!
//! Networks are stateless: [`Network::activate`] is a pure function of its input,
//! so one network can be built per evaluation and dropped afterwards.

use serde::{Deserialize, Serialize};

use crate::genome::Genome;

/// A decision function mapping a feature vector to a raw output vector.
pub trait Network {
    fn activate(&self, inputs: &[f32]) -> Vec<f32>;
}

impl<N> Network for &N
where
    N: Network + ?Sized,
{
    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        (**self).activate(inputs)
    }
}

impl<N> Network for Box<N>
where
    N: Network + ?Sized,
{
    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        (**self).activate(inputs)
    }
}

/// Builds a [`Network`] from a genome.
pub trait BuildNetwork {
    type Network: Network;

    fn build(&self, genome: &Genome) -> Result<Self::Network, NetworkBuildError>;
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum NetworkBuildError {
    #[display("genome {genome} has {actual} weights, topology needs {expected}")]
    WeightCountMismatch {
        genome: String,
        expected: usize,
        actual: usize,
    },
    #[display("network layers must have at least one node")]
    EmptyLayer,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    Relu,
    Identity,
}

impl Activation {
    #[must_use]
    pub fn apply(self, z: f32) -> f32 {
        match self {
            Self::Sigmoid => {
                let z = (5.0 * z).clamp(-60.0, 60.0);
                1.0 / (1.0 + (-z).exp())
            }
            Self::Tanh => (2.5 * z).clamp(-60.0, 60.0).tanh(),
            Self::Relu => z.max(0.0),
            Self::Identity => z,
        }
    }
}

/// Fixed topology of the policy network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub input_count: usize,
    pub hidden_layers: Vec<usize>,
    pub output_count: usize,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            // two 16x16 screen layers
            input_count: 2 * 16 * 16,
            hidden_layers: vec![8],
            output_count: 4,
            hidden_activation: Activation::Tanh,
            output_activation: Activation::Sigmoid,
        }
    }
}

impl NetworkConfig {
    /// Node counts from the input layer to the output layer.
    #[must_use]
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.input_count);
        sizes.extend(self.hidden_layers.iter().copied());
        sizes.push(self.output_count);
        sizes
    }

    /// Length of the weight vector a genome must carry for this topology.
    ///
    /// ```
    /// use beacon_policy::network::NetworkConfig;
    ///
    /// let config = NetworkConfig {
    ///     input_count: 3,
    ///     hidden_layers: vec![2],
    ///     output_count: 4,
    ///     ..NetworkConfig::default()
    /// };
    /// // (3 + 1) * 2 + (2 + 1) * 4
    /// assert_eq!(config.weight_count(), 20);
    /// ```
    #[must_use]
    pub fn weight_count(&self) -> usize {
        self.layer_sizes()
            .windows(2)
            .map(|w| (w[0] + 1) * w[1])
            .sum()
    }
}

impl BuildNetwork for NetworkConfig {
    type Network = FeedForwardNetwork;

    fn build(&self, genome: &Genome) -> Result<Self::Network, NetworkBuildError> {
        FeedForwardNetwork::create(genome, self)
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    input_count: usize,
    weights: Vec<f32>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        self.weights
            .chunks_exact(self.input_count + 1)
            .map(|row| {
                let (weights, bias) = row.split_at(self.input_count);
                let sum = weights
                    .iter()
                    .zip(inputs)
                    .map(|(w, x)| w * x)
                    .sum::<f32>();
                self.activation.apply(sum + bias[0])
            })
            .collect()
    }
}

/// A fully connected feed-forward network.
#[derive(Debug, Clone)]
pub struct FeedForwardNetwork {
    layers: Vec<DenseLayer>,
}

impl FeedForwardNetwork {
    /// Reads the genome's weights against `config`'s topology.
    pub fn create(genome: &Genome, config: &NetworkConfig) -> Result<Self, NetworkBuildError> {
        let sizes = config.layer_sizes();
        if sizes.contains(&0) {
            return Err(NetworkBuildError::EmptyLayer);
        }
        let expected = config.weight_count();
        let weights = genome.weights();
        if weights.len() != expected {
            return Err(NetworkBuildError::WeightCountMismatch {
                genome: genome.id().to_string(),
                expected,
                actual: weights.len(),
            });
        }

        let last = sizes.len() - 2;
        let mut offset = 0;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let len = (w[0] + 1) * w[1];
                let layer = DenseLayer {
                    input_count: w[0],
                    weights: weights[offset..offset + len].to_vec(),
                    activation: if i == last {
                        config.output_activation
                    } else {
                        config.hidden_activation
                    },
                };
                offset += len;
                layer
            })
            .collect();
        Ok(Self { layers })
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.layers[0].input_count
    }
}

impl Network for FeedForwardNetwork {
    /// Propagates `inputs` through every layer.
    ///
    /// Inputs beyond [`FeedForwardNetwork::input_count`] are ignored and missing
    /// ones read as zero.
    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        let mut values = inputs.to_vec();
        for layer in &self.layers {
            values = layer.forward(&values);
        }
        values
    }
}
