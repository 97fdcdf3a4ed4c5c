use kanon_validator::errors::*;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use statrs::distribution::{Binomial, Univariate};

use kanon_validator::base::EncodedDataset;
use kanon_validator::components::EdDifferentialPrivacy;
use kanon_validator::RowIndex;

use crate::base::DataManager;
use crate::components::{Bind, Binding};
use crate::components::k_anonymity::MinimalClassSize;

/// Sample sizes considered per candidate `k`, beyond the first one.
const MAX_SAMPLE_SIZES: u64 = 100_000;

impl Bind for EdDifferentialPrivacy {
    fn bind(&self, dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        let k = minimal_class_size(self.epsilon, self.delta, dataset.num_records() + 1)?;
        tracing::debug!(epsilon = self.epsilon, delta = self.delta, k, "differential privacy class size");
        Ok(Binding::Class(Box::new(MinimalClassSize { k })))
    }
}

/// Rows kept by the random sampling step, each with probability `1 - exp(-epsilon)`.
pub fn sample(model: &EdDifferentialPrivacy, rows: usize) -> Vec<RowIndex> {
    let mut rng = StdRng::seed_from_u64(model.seed);
    let probability = num::clamp(model.sampling_probability(), 0., 1.);
    (0..rows).filter(|_| rng.gen_bool(probability)).collect()
}

/// Kullback-Leibler divergence between two Bernoulli distributions.
fn divergence(p: f64, q: f64) -> f64 {
    p * (p / q).ln() + (1. - p) * ((1. - p) / (1. - q)).ln()
}

/// Largest probability, over sample sizes, that a class of `k` rows is distinguishable.
///
/// `δ(k) = max over n >= ceil(k / γ - 1) of P[Binomial(n, β) > γ n]`
/// with `β = 1 - exp(-ε)` and `γ = 1 - exp(-2ε)`.
/// The tails are bounded by `exp(-n D(γ || β))`, which ends the search once it drops below the maximum.
pub fn delta(epsilon: f64, k: usize) -> Result<f64> {
    let beta = 1. - (-epsilon).exp();
    let gamma = 1. - (-2. * epsilon).exp();
    let bound = divergence(gamma, beta);

    let first = ((k as f64 / gamma - 1.).ceil() as u64).max(1);
    let mut maximum: f64 = 0.;
    for n in first..first + MAX_SAMPLE_SIZES {
        let binomial = Binomial::new(beta, n)
            .map_err(|_| Error::from(format!("invalid binomial distribution ({}, {})", beta, n)))?;
        maximum = maximum.max(1. - binomial.cdf((gamma * n as f64).floor()));
        if (-(n as f64) * bound).exp() < maximum {
            break;
        }
    }
    Ok(maximum)
}

/// Smallest class size which bounds the probability of distinguishing a class by `delta`, capped at `limit`.
///
/// `δ(k)` does not increase with `k`, so the size is found by doubling and then bisecting.
pub fn minimal_class_size(epsilon: f64, delta_limit: f64, limit: usize) -> Result<usize> {
    let satisfied = |k: usize| -> Result<bool> { Ok(delta(epsilon, k)? <= delta_limit) };
    if limit <= 1 || satisfied(1)? {
        return Ok(1);
    }

    // lower never satisfies, upper satisfies or is the limit
    let (mut lower, mut upper) = (1, 2);
    while upper < limit && !satisfied(upper)? {
        lower = upper;
        upper = upper.saturating_mul(2);
    }
    upper = upper.min(limit);
    while upper - lower > 1 {
        let middle = lower + (upper - lower) / 2;
        if satisfied(middle)? {
            upper = middle;
        } else {
            lower = middle;
        }
    }
    Ok(upper)
}
