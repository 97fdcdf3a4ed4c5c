//! Information-loss metrics
//!
//! A metric is initialized once per anonymization against the data manager,
//! then evaluated for every checked node.
//! Each evaluation reports the loss of the node, and a lower bound on the loss
//! of the node and of every generalization of it, used to prune the search.
//!
//! Metrics which only depend on the transformation are independent:
//! they can report their loss without building the equivalence classes.

use kanon_validator::errors::*;

use std::fmt::Debug;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::config::{AggregateFunction, MetricConfiguration, MetricDefinition};

use crate::base::DataManager;
use crate::groupify::HashGroupify;

pub mod aecs;
pub mod discernibility;
pub mod entropy;
pub mod height;
pub mod information_loss;
pub mod loss;
pub mod precision;
pub mod publisher_payout;
pub mod static_losses;

pub use self::information_loss::InformationLoss;

/// Loss of a node, with a lower bound for the node and its generalizations.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub loss: InformationLoss,
    pub bound: InformationLoss,
}

pub trait Metric: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Loss never decreases with generalization, when nothing is suppressed.
    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    /// Loss never decreases with generalization, with suppression.
    fn is_monotonic_with_suppression(&self) -> bool;

    /// Loss only depends on the transformation.
    fn is_independent(&self) -> bool {
        false
    }

    /// Compute the loss of a node from its classes, after the privacy criteria flagged the outliers.
    fn evaluate(&self, transformation: &Transformation, groupify: &HashGroupify) -> Evaluation;

    /// Lower bound which does not require the classes of the node, if the metric has one.
    fn lower_bound(&self, _transformation: &Transformation) -> Option<InformationLoss> {
        None
    }

    fn is_monotonic(&self, suppression: bool) -> bool {
        if suppression {
            self.is_monotonic_with_suppression()
        } else {
            self.is_monotonic_with_generalization()
        }
    }
}

/// Parameters shared by the metrics.
#[derive(Clone, Debug, PartialEq)]
pub struct Weighting {
    /// Weight of each quasi-identifier, in the order of the data manager.
    pub weights: Vec<f64>,
    pub aggregate: AggregateFunction,
    /// Factor of generalization losses.
    pub generalization: f64,
    /// Factor of suppression losses.
    pub suppression: f64,
    /// Rows of the research subset. At least one, to keep normalizations defined.
    pub rows: f64,
}

impl Weighting {
    pub fn new(config: &MetricConfiguration, dataset: &EncodedDataset, manager: &DataManager) -> Result<Weighting> {
        let weights = manager.quasi_identifiers.iter()
            .map(|column| match &config.attribute_weights {
                Some(weights) => weights.get(&dataset.header[*column]).cloned()
                    .ok_or_else(|| Error::from(ErrorKind::Configuration(
                        format!("no weight for quasi-identifier {}", dataset.header[*column])))),
                None => Ok(1.)
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Weighting {
            weights,
            aggregate: config.aggregate,
            generalization: config.generalization_factor(),
            suppression: config.suppression_factor(),
            rows: manager.subset_size().max(1) as f64,
        })
    }

    /// Weight each component, and wrap them as a multi-dimensional loss.
    pub fn loss(&self, metric: &'static str, values: Vec<f64>) -> InformationLoss {
        InformationLoss::multi_dimensional(metric, self.aggregate, values.into_iter()
            .zip(self.weights.iter())
            .map(|(value, weight)| value * weight)
            .collect())
    }
}

/// Initialize the metric of a configuration.
pub fn build_metric(
    definition: &MetricDefinition,
    config: &MetricConfiguration,
    dataset: &EncodedDataset,
    manager: &DataManager,
) -> Result<Box<dyn Metric>> {
    let weighting = Weighting::new(config, dataset, manager)?;

    Ok(match definition {
        MetricDefinition::Discernibility { monotonic } =>
            Box::new(discernibility::Discernibility::new(*monotonic, weighting)),
        MetricDefinition::Entropy { monotonic } =>
            Box::new(entropy::NonUniformEntropy::new(*monotonic, weighting, manager)),
        MetricDefinition::Precision { monotonic } =>
            Box::new(precision::Precision::new(*monotonic, weighting, manager)),
        MetricDefinition::Loss =>
            Box::new(loss::GeneralizationLoss::new(weighting, manager)),
        MetricDefinition::Height =>
            Box::new(height::Height::new()),
        MetricDefinition::Aecs =>
            Box::new(aecs::AverageClassSize::new(weighting)),
        MetricDefinition::Static { losses } =>
            Box::new(static_losses::StaticLosses::new(losses, weighting, dataset, manager)?),
        MetricDefinition::PublisherPayout { cost_benefit, journalist } =>
            Box::new(publisher_payout::PublisherPayout::new(cost_benefit.clone(), *journalist, weighting, manager)),
    })
}
