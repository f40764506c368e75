//! Weight vector operations used by the population search.
//!
//! Network weights are unbounded in sign, so every operation here clamps to a
//! symmetric `[-bound, bound]` range instead of normalizing.
//!
//! - **Initialization**: [`random`] samples each weight from a normal distribution
//! - **Mutation**: [`mutate`] adds Gaussian noise to a random subset of weights

use rand::Rng;
use rand_distr::Normal;

/// Creates a weight vector by applying a function to each index.
///
/// # Arguments
///
/// * `f` - Function mapping index to weight value
/// * `len` - Number of weights to generate
///
/// # Examples
///
/// ```
/// use beacon_training::weights;
///
/// let weights = weights::from_fn(|i| i as f32 * 0.5, 3);
/// assert_eq!(weights, vec![0.0, 0.5, 1.0]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Generates `len` weights drawn from `init`, clamped to `[-bound, bound]`.
///
/// Used for the initial population of the search.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `init` - Distribution of a fresh weight, usually centred on zero
/// * `bound` - Largest magnitude any weight may take
/// * `len` - Number of weights to generate
///
/// # Returns
///
/// A vector of `len` random weights in `[-bound, bound]`
pub fn random<R>(rng: &mut R, init: Normal<f32>, bound: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.sample(init).clamp(-bound, bound), len)
}

/// Applies Gaussian mutation in place.
///
/// Each weight is perturbed by a sample of `noise` with probability `rate`, then
/// clamped to `[-bound, bound]`. Weights that are not picked keep their value.
///
/// # Arguments
///
/// * `weights` - Weight vector to mutate (modified in place)
/// * `noise` - Distribution of the perturbation added to a picked weight
/// * `bound` - Largest magnitude any weight may take
/// * `rate` - Probability of mutating each weight (0.0 to 1.0)
/// * `rng` - Random number generator
pub fn mutate<R>(weights: &mut [f32], noise: Normal<f32>, bound: f32, rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for w in weights {
        if rng.random_bool(rate.into()) {
            *w = (*w + rng.sample(noise)).clamp(-bound, bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_random_respects_bound() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let init = Normal::new(0.0, 10.0).unwrap();
        let weights = random(&mut rng, init, 2.0, 200);
        assert_eq!(weights.len(), 200);
        assert!(weights.iter().all(|w| (-2.0..=2.0).contains(w)));
    }

    #[test]
    fn test_mutate_rate_zero_is_noop() {
        let mut rng = Pcg64Mcg::seed_from_u64(2);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut weights = vec![0.5; 16];
        mutate(&mut weights, noise, 5.0, 0.0, &mut rng);
        assert_eq!(weights, vec![0.5; 16]);
    }

    #[test]
    fn test_mutate_rate_one_changes_weights() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut weights = vec![0.5; 16];
        mutate(&mut weights, noise, 5.0, 1.0, &mut rng);
        assert!(weights.iter().any(|&w| w != 0.5));
        assert!(weights.iter().all(|w| (-5.0..=5.0).contains(w)));
    }
}
