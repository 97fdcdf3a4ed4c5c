//! Transformation search for k-anonymity and related privacy models.
//!
//! The runtime takes an encoded dataset and a validated configuration from `kanon_validator`,
//! searches the generalization lattice for the transformation with the lowest information loss
//! that satisfies every privacy model within the suppression limit, and hands out the released data.
//!
//! Node checks group the rows into equivalence classes ([`groupify`]), flag the classes violating a
//! privacy model ([`components`]) and measure the loss ([`metrics`]).
//! Checks may run in parallel on the rayon thread pool. Progress is reported through `tracing`;
//! the library never installs a subscriber.

#[macro_use]
extern crate error_chain;
#[cfg(test)]
#[macro_use]
extern crate itertools;

use kanon_validator::errors::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use kanon_validator::base::{DataDefinition, EncodedDataset, Transformation};
use kanon_validator::components::PrivacyModel;
use kanon_validator::config::{AnonymizationConfig, SearchStrategy};
use kanon_validator::RowIndex;

pub mod algorithms;
pub mod base;
pub mod checker;
pub mod components;
pub mod groupify;
pub mod history;
pub mod lattice;
pub mod metrics;
pub mod output;

use crate::algorithms::SearchOutcome;
use crate::base::DataManager;
use crate::checker::NodeChecker;
use crate::lattice::SolutionSpace;
use crate::metrics::InformationLoss;
use crate::output::DataOutput;


/// Search the transformation with the lowest loss satisfying the privacy models.
///
/// The configuration is validated against the dataset first.
/// A search without any anonymous transformation is not an error: check [`AnonymizationResult::is_result_available`].
///
/// # Example
/// ```
/// use kanon_validator::base::{AttributeDefinition, DataDefinition};
/// use kanon_validator::components::{KAnonymity, PrivacyModel};
/// use kanon_validator::config::AnonymizationConfig;
/// use kanon_validator::encode_dataset;
///
/// let header = vec!["zip".to_string()];
/// let rows = vec![vec!["47677".to_string()], vec!["47602".to_string()]];
/// let definition = DataDefinition {
///     attributes: vec![AttributeDefinition::quasi_identifying("zip", vec![
///         vec!["47677", "476**", "*"], vec!["47602", "476**", "*"]])]
/// };
/// let dataset = encode_dataset(&header, &rows, &definition).unwrap();
///
/// let config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))]);
/// let result = kanon_runtime::anonymize(dataset, &config).unwrap();
/// assert_eq!(result.optimum().unwrap().levels(), &[1]);
/// assert_eq!(result.output().unwrap().row(0).unwrap(), vec!["476**"]);
/// ```
pub fn anonymize(dataset: EncodedDataset, config: &AnonymizationConfig) -> Result<AnonymizationResult> {
    kanon_validator::validate_configuration(&dataset, config)?;

    let subset = research_subset(&dataset, config);
    let manager = Arc::new(DataManager::new(&dataset, subset.as_ref().map(Vec::as_slice))?);
    let space = SolutionSpace::new(manager.heights())?;
    tracing::info!(
        rows = manager.num_rows(), subset = manager.subset_size(), quasi_identifiers = manager.num_quasi_identifiers(),
        "anonymizing");

    let start = Instant::now();
    let checker = NodeChecker::new(&dataset, config, manager)?;
    let outcome = algorithms::search(&checker, space, &config.search)?;
    let elapsed = start.elapsed();
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, available = outcome.optimum.is_some(), "anonymization finished");

    Ok(AnonymizationResult { dataset, config: config.clone(), checker, outcome, elapsed })
}

/// Encode string rows and anonymize them.
pub fn anonymize_rows(
    header: &[String],
    rows: &[Vec<String>],
    definition: &DataDefinition,
    config: &AnonymizationConfig,
) -> Result<AnonymizationResult> {
    let dataset = kanon_validator::encode_dataset(header, rows, definition)?;
    anonymize(dataset, config)
}

/// Rows the privacy models are enforced on: the research subset, or the random sample of differential privacy.
fn research_subset(dataset: &EncodedDataset, config: &AnonymizationConfig) -> Option<Vec<RowIndex>> {
    if let Some(subset) = config.research_subset() {
        return Some(subset.to_vec());
    }
    config.privacy_models.iter()
        .find_map(|model| match model {
            PrivacyModel::EdDifferentialPrivacy(model) => Some(model),
            _ => None
        })
        .map(|model| {
            let sample = components::ed_differential_privacy::sample(model, dataset.num_records());
            tracing::debug!(sampled = sample.len(), "rows sampled");
            sample
        })
}


/// Outcome of an anonymization, and the handle to its released data.
pub struct AnonymizationResult {
    dataset: EncodedDataset,
    config: AnonymizationConfig,
    checker: NodeChecker,
    outcome: SearchOutcome,
    elapsed: Duration,
}

impl AnonymizationResult {
    /// Whether an anonymous transformation was found.
    pub fn is_result_available(&self) -> bool {
        self.outcome.optimum.is_some()
    }

    /// Whether no transformation is preferred over the result, either because the search covered the lattice
    /// or because pruning proved it.
    pub fn is_optimal(&self) -> bool {
        self.outcome.optimal
    }

    pub fn optimum(&self) -> Option<&Transformation> {
        self.outcome.optimum.as_ref().map(|optimum| &optimum.transformation)
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.outcome.strategy
    }

    /// Number of node checks of the search.
    pub fn checks(&self) -> usize {
        self.outcome.checks
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn dataset(&self) -> &EncodedDataset {
        &self.dataset
    }

    /// Loss of any node of the lattice, checking it if the search did not.
    pub fn information_loss(&self, transformation: &Transformation) -> Result<InformationLoss> {
        if !self.outcome.lattice.space.contains(transformation) {
            bail!(ErrorKind::Configuration(format!("{} is not a node of the lattice", transformation)))
        }
        Ok(match self.outcome.lattice.record(transformation).and_then(|record| record.loss()) {
            Some(loss) => loss.clone(),
            None => self.checker.check(transformation).loss
        })
    }

    /// Released data of the optimum.
    pub fn output(&self) -> Result<DataOutput> {
        match self.optimum() {
            Some(optimum) => self.output_for(optimum),
            None => Err(ErrorKind::NoResult.into())
        }
    }

    /// Released data of any node of the lattice, whether anonymous or not.
    pub fn output_for(&self, transformation: &Transformation) -> Result<DataOutput> {
        if !self.outcome.lattice.space.contains(transformation) {
            bail!(ErrorKind::Configuration(format!("{} is not a node of the lattice", transformation)))
        }
        DataOutput::new(&self.dataset, &self.checker, transformation, &self.config.suppression_string)
    }

    /// Recode the suppressed rows of an output with a second search over them alone.
    ///
    /// Returns the number of rows recoded, 0 if the combined output was rolled back.
    pub fn optimize(&self, output: &mut DataOutput) -> Result<usize> {
        output.optimize(&self.checker, &self.config)
    }

    pub fn summary(&self) -> Result<Summary> {
        let optimum = self.outcome.optimum.as_ref();
        let relative_loss = match (optimum, self.outcome.lattice.loss_range()?) {
            (Some(optimum), Some((min, max))) => Some(optimum.loss.relative_to(&min, &max)?),
            _ => None
        };
        Ok(Summary {
            strategy: self.outcome.strategy,
            optimal: self.outcome.optimal,
            transformation: optimum.map(|optimum| optimum.transformation.levels().to_vec()),
            metric: self.config.metric.name(),
            loss: optimum.map(|optimum| optimum.loss.value()),
            relative_loss,
            suppressed: optimum.map(|optimum| optimum.suppressed),
            classes: optimum.map(|optimum| optimum.classes),
            checks: self.outcome.checks,
            lattice_size: self.outcome.lattice.space.size(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        })
    }

    /// Summary as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.summary()?)?)
    }
}

/// Statistics of an anonymization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub strategy: SearchStrategy,
    pub optimal: bool,
    /// Levels of the optimum, if any.
    pub transformation: Option<Vec<u32>>,
    pub metric: &'static str,
    pub loss: Option<f64>,
    /// Loss of the optimum between the lowest and highest loss of the checked nodes.
    pub relative_loss: Option<f64>,
    pub suppressed: Option<usize>,
    pub classes: Option<usize>,
    pub checks: usize,
    pub lattice_size: u64,
    pub elapsed_ms: u64,
}
