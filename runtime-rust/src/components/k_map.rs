use kanon_validator::errors::*;

use statrs::distribution::{Poisson, Univariate};

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::{EstimatorModel, KMap, PopulationEstimator};
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::{Bind, Binding, ClassCriterion};
use crate::components::k_anonymity::MinimalClassSize;
use crate::groupify::GroupifyEntry;

impl Bind for KMap {
    fn bind(&self, dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        match (&self.estimator, self.sampling_fraction(dataset.num_records())) {
            (Some(estimator), Some(fraction)) => {
                let k = derived_class_size(self.k, estimator, fraction)?;
                tracing::debug!(k = self.k, derived = k, "k-map estimator");
                Ok(Binding::Class(Box::new(MinimalClassSize { k })))
            }
            _ => Ok(Binding::Class(Box::new(PopulationClassSize { k: self.k })))
        }
    }
}

/// Every released class corresponds to at least `k` rows of the whole dataset, the population of the research subset.
#[derive(Clone, Debug)]
pub struct PopulationClassSize {
    k: usize,
}

impl ClassCriterion for PopulationClassSize {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        entry.pcount >= self.k
    }
}

/// Smallest sample class size which a population class of size `k` only reaches with probability `significance`.
///
/// The size of the sample class drawn from a population class of size `k` follows
/// a Poisson distribution with mean `k * fraction`, truncated at zero for the zero-truncated model.
pub fn derived_class_size(k: usize, estimator: &PopulationEstimator, fraction: f64) -> Result<usize> {
    let lambda = k as f64 * fraction;
    let poisson = Poisson::new(lambda)
        .map_err(|_| Error::from(format!("invalid Poisson mean {}", lambda)))?;
    let zero = (-lambda).exp();

    let cdf = |size: u64| match estimator.model {
        EstimatorModel::Poisson => poisson.cdf(size as f64),
        EstimatorModel::ZeroTruncatedPoisson => if size == 0 { 0. } else {
            (poisson.cdf(size as f64) - zero) / (1. - zero)
        },
    };

    let confidence = 1. - estimator.significance;
    let limit = estimator.population_size as u64;
    let size = (0..=limit).find(|size| cdf(*size) >= confidence).unwrap_or(limit);
    Ok(size as usize + 1)
}
