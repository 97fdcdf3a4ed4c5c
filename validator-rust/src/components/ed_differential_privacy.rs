use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::Criterion;

/// (ε,δ)-differential privacy by random sampling followed by k-anonymization.
///
/// Rows are sampled with probability `β = 1 - exp(-ε)`. Every released class
/// then contains at least `k(ε, δ)` sampled rows, with `k` derived from the binomial tails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdDifferentialPrivacy {
    pub epsilon: f64,
    pub delta: f64,
    /// Seed of the sampling step.
    #[serde(default)]
    pub seed: u64,
}

impl EdDifferentialPrivacy {
    pub fn sampling_probability(&self) -> f64 {
        1. - (-self.epsilon).exp()
    }
}

impl Criterion for EdDifferentialPrivacy {
    fn validate(&self, _dataset: &EncodedDataset) -> Result<()> {
        if !(self.epsilon > 0.) || !self.epsilon.is_finite() {
            bail!(ErrorKind::Configuration("epsilon must be positive and finite".to_string()))
        }
        if !(self.delta > 0. && self.delta < 1.) {
            bail!(ErrorKind::Configuration("delta must be within (0, 1)".to_string()))
        }
        Ok(())
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn summarize(&self) -> String {
        format!("({}, {})-differential privacy", self.epsilon, self.delta)
    }
}
