use kanon_validator::errors::*;

use statrs::function::gamma::digamma;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::{EntropyEstimator, EntropyLDiversity};
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::components::{Bind, Binding, ClassCriterion, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for EntropyLDiversity {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(EntropyDiversity {
            index: sensitive_index(dataset, manager, &self.attribute)?,
            // small tolerance, so that exactly l equally frequent values pass
            threshold: self.l.log2() - 1e-10,
            estimator: self.estimator,
        })))
    }
}

#[derive(Clone, Debug)]
pub struct EntropyDiversity {
    index: usize,
    threshold: f64,
    estimator: EntropyEstimator,
}

/// Plug-in entropy of a distribution, in bits.
pub fn shannon_entropy(distribution: &Distribution) -> f64 {
    let total = distribution.values().sum::<usize>() as f64;
    distribution.values()
        .map(|frequency| *frequency as f64 / total)
        .map(|probability| -probability * probability.log2())
        .sum()
}

/// Entropy of a distribution in bits, with Grassberger's bias correction for small samples.
///
/// `H = log N - 1/N * sum n_i G(n_i)`, with
/// `G(n) = digamma(n) + (-1)^n / 2 * (digamma((n + 1) / 2) - digamma(n / 2))`.
pub fn grassberger_entropy(distribution: &Distribution) -> f64 {
    let total = distribution.values().sum::<usize>() as f64;
    let correction = distribution.values()
        .map(|frequency| {
            let n = *frequency as f64;
            let sign = if frequency % 2 == 0 { 1. } else { -1. };
            n * (digamma(n) + sign * 0.5 * (digamma((n + 1.) / 2.) - digamma(n / 2.)))
        })
        .sum::<f64>();
    (total.ln() - correction / total) / std::f64::consts::LN_2
}

impl ClassCriterion for EntropyDiversity {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        let distribution = &entry.distributions[self.index];
        if distribution.is_empty() {
            return false;
        }
        let entropy = match self.estimator {
            EntropyEstimator::Shannon => shannon_entropy(distribution),
            EntropyEstimator::Grassberger => grassberger_entropy(distribution),
        };
        entropy >= self.threshold
    }
}


#[cfg(test)]
mod test_entropy_l_diversity {
    use crate::base::Distribution;
    use crate::components::entropy_l_diversity::{grassberger_entropy, shannon_entropy};

    fn distribution(frequencies: &[usize]) -> Distribution {
        frequencies.iter().enumerate().map(|(code, frequency)| (code as u32, *frequency)).collect()
    }

    #[test]
    fn test_shannon() {
        assert!((shannon_entropy(&distribution(&[3, 3])) - 1.).abs() < 1e-12);
        assert!((shannon_entropy(&distribution(&[2, 2, 2, 2])) - 2.).abs() < 1e-12);
        assert_eq!(shannon_entropy(&distribution(&[5])), 0.);
    }

    #[test]
    fn test_grassberger_exceeds_plug_in() {
        // the correction counters the downward bias of the plug-in estimate
        let small = distribution(&[2, 1]);
        assert!(grassberger_entropy(&small) > shannon_entropy(&small));
        assert!(grassberger_entropy(&distribution(&[40, 40])).is_finite());
    }
}
