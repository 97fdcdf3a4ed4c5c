use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, check_subset, check_range};
use crate::RowIndex;

/// Statistical model of the population class sizes, when no population table is available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorModel {
    Poisson,
    ZeroTruncatedPoisson,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationEstimator {
    pub model: EstimatorModel,
    /// Probability of accepting a class whose population size is below `k`.
    pub significance: f64,
    pub population_size: usize,
}

/// Every released class corresponds to at least `k` individuals of the population.
///
/// The population is either the whole dataset, with the sample given by `subset`,
/// or an estimated population of `population_size` individuals.
/// In the latter case `k` is replaced by the smallest sample class size
/// whose population size is at least `k` with the requested significance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KMap {
    pub k: usize,
    #[serde(default)]
    pub subset: Option<Vec<RowIndex>>,
    #[serde(default)]
    pub estimator: Option<PopulationEstimator>,
}

impl KMap {
    /// Fraction of the population contained in a sample of `num_records` rows.
    pub fn sampling_fraction(&self, num_records: usize) -> Option<f64> {
        self.estimator.as_ref()
            .map(|estimator| num_records as f64 / estimator.population_size as f64)
    }
}

impl Criterion for KMap {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        if self.k < 1 {
            bail!(ErrorKind::Configuration("k must be at least 1".to_string()))
        }
        match (&self.subset, &self.estimator) {
            (Some(subset), None) => check_subset(dataset, subset),
            (None, Some(estimator)) => {
                check_range("significance", estimator.significance, 0., 1.)?;
                if estimator.population_size < dataset.num_records() {
                    bail!(ErrorKind::Configuration(format!(
                        "population size {} is smaller than the sample size {}",
                        estimator.population_size, dataset.num_records())))
                }
                Ok(())
            }
            _ => bail!(ErrorKind::Configuration(
                "k-map requires either a research subset or a population estimator".to_string()))
        }
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn research_subset(&self) -> Option<&[RowIndex]> {
        self.subset.as_ref().map(Vec::as_slice)
    }

    fn summarize(&self) -> String {
        match &self.estimator {
            Some(estimator) => format!("{}-map with {:?} estimator", self.k, estimator.model),
            None => format!("{}-map", self.k),
        }
    }
}
