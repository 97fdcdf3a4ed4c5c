//! Configuration of an anonymization request.
//!
//! Every structure deserializes from JSON, with defaults for each optional knob.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::components::PrivacyModel;
use crate::components::profitability::CostBenefitConfiguration;
use crate::RowIndex;

/// How the per-attribute components of a multi-dimensional information loss are combined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Sum,
    Maximum,
    ArithmeticMean,
    /// `exp(mean(ln(v + 1))) - 1`, defined for zero components.
    GeometricMean,
    /// Components sorted in descending order and compared lexicographically.
    Rank,
}

impl Default for AggregateFunction {
    fn default() -> Self {
        AggregateFunction::Sum
    }
}

impl AggregateFunction {
    /// Scalar summary of a vector of components.
    ///
    /// Rank has no scalar semantics of its own; its summary is the sum of the components.
    pub fn aggregate(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.;
        }
        match self {
            AggregateFunction::Sum | AggregateFunction::Rank =>
                values.iter().sum(),
            AggregateFunction::Maximum =>
                values.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max),
            AggregateFunction::ArithmeticMean =>
                values.iter().sum::<f64>() / values.len() as f64,
            AggregateFunction::GeometricMean =>
                (values.iter().map(|v| (v + 1.).ln()).sum::<f64>() / values.len() as f64).exp() - 1.,
        }
    }
}


/// Maximal number of suppressed rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionLimit {
    /// Fraction of the rows in the research subset (or of all rows).
    Fraction(f64),
    Absolute(usize),
}

impl Default for SuppressionLimit {
    fn default() -> Self {
        SuppressionLimit::Fraction(0.)
    }
}

impl SuppressionLimit {
    /// Limit in rows for a dataset of `num_records` rows.
    pub fn absolute(&self, num_records: usize) -> usize {
        match self {
            SuppressionLimit::Fraction(fraction) =>
                (num::clamp(*fraction, 0., 1.) * num_records as f64).floor() as usize,
            SuppressionLimit::Absolute(rows) => (*rows).min(num_records),
        }
    }
}


/// Information-loss metric and its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricDefinition {
    /// Sum of squared class sizes. The non-monotonic variant charges suppressed classes `count * rows`.
    Discernibility {
        #[serde(default)]
        monotonic: bool
    },
    /// Non-uniform entropy.
    Entropy {
        #[serde(default)]
        monotonic: bool
    },
    /// Generalization level relative to the height of each hierarchy.
    Precision {
        #[serde(default)]
        monotonic: bool
    },
    /// Fraction of the domain covered by generalized values.
    Loss,
    /// Sum of generalization levels.
    Height,
    /// Average equivalence class size.
    Aecs,
    /// User-defined loss per attribute and level.
    Static {
        losses: IndexMap<String, Vec<f64>>
    },
    /// Loss of payout of a publisher under a cost/benefit model.
    PublisherPayout {
        cost_benefit: CostBenefitConfiguration,
        #[serde(default)]
        journalist: bool,
    },
}

impl Default for MetricDefinition {
    fn default() -> Self {
        MetricDefinition::Loss
    }
}

impl MetricDefinition {
    pub fn name(&self) -> &'static str {
        match self {
            MetricDefinition::Discernibility { .. } => "discernibility",
            MetricDefinition::Entropy { .. } => "entropy",
            MetricDefinition::Precision { .. } => "precision",
            MetricDefinition::Loss => "loss",
            MetricDefinition::Height => "height",
            MetricDefinition::Aecs => "aecs",
            MetricDefinition::Static { .. } => "static",
            MetricDefinition::PublisherPayout { .. } => "publisher_payout",
        }
    }
}

/// Parameters shared by all metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfiguration {
    /// Trade-off between generalization (1) and suppression (0).
    pub gs_factor: f64,
    pub aggregate: AggregateFunction,
    /// Weight per quasi-identifier. When present, every quasi-identifier must be weighted.
    pub attribute_weights: Option<IndexMap<String, f64>>,
}

impl Default for MetricConfiguration {
    fn default() -> Self {
        MetricConfiguration {
            gs_factor: 0.5,
            aggregate: AggregateFunction::default(),
            attribute_weights: None,
        }
    }
}

impl MetricConfiguration {
    pub fn generalization_factor(&self) -> f64 {
        (2. * self.gs_factor).min(1.)
    }

    pub fn suppression_factor(&self) -> f64 {
        (2. - 2. * self.gs_factor).min(1.)
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Exhaustive for small lattices, bottom-up heuristic otherwise.
    Auto,
    Exhaustive,
    HeuristicBottomUp,
    HeuristicTopDown,
    Genetic,
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Auto
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub iterations: usize,
    pub elite_fraction: f64,
    pub crossover_fraction: f64,
    pub mutation_probability: f64,
    pub immigration_fraction: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 100,
            iterations: 50,
            elite_fraction: 0.2,
            crossover_fraction: 0.4,
            mutation_probability: 0.05,
            immigration_fraction: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// Maximal number of node checks.
    pub step_limit: Option<usize>,
    pub time_limit_ms: Option<u64>,
    /// Largest lattice searched exhaustively by the automatic strategy.
    pub exhaustive_threshold: u64,
    pub genetic: GeneticConfig,
    pub seed: u64,
    /// Check independent nodes on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            strategy: SearchStrategy::default(),
            step_limit: None,
            time_limit_ms: None,
            exhaustive_threshold: 100_000,
            genetic: GeneticConfig::default(),
            seed: 0x5eed,
            parallel: true,
        }
    }
}

/// Bounded cache of equivalence classes of already checked nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximal number of snapshots.
    pub size: usize,
    /// Snapshots with more classes than `ratio * rows` are not stored.
    pub snapshot_ratio: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig { size: 200, snapshot_ratio: 0.2 }
    }
}


/// Complete configuration of an anonymization request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    pub privacy_models: Vec<PrivacyModel>,
    #[serde(default)]
    pub suppression_limit: SuppressionLimit,
    #[serde(default)]
    pub metric: MetricDefinition,
    #[serde(default)]
    pub metric_config: MetricConfiguration,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "default_suppression_string")]
    pub suppression_string: String,
}

fn default_suppression_string() -> String {
    "*".to_string()
}

impl AnonymizationConfig {
    pub fn new(privacy_models: Vec<PrivacyModel>) -> Self {
        AnonymizationConfig {
            privacy_models,
            suppression_limit: SuppressionLimit::default(),
            metric: MetricDefinition::default(),
            metric_config: MetricConfiguration::default(),
            search: SearchConfig::default(),
            history: HistoryConfig::default(),
            suppression_string: default_suppression_string(),
        }
    }

    pub fn with_suppression_limit(mut self, suppression_limit: SuppressionLimit) -> Self {
        self.suppression_limit = suppression_limit;
        self
    }

    pub fn with_metric(mut self, metric: MetricDefinition) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search.strategy = strategy;
        self
    }

    /// The research subset shared by all subset-based privacy models, if any.
    ///
    /// Consistency of the subsets is checked by validation.
    pub fn research_subset(&self) -> Option<&[RowIndex]> {
        use crate::components::Criterion;
        self.privacy_models.iter().filter_map(|model| model.research_subset()).next()
    }
}


#[cfg(test)]
mod test_config {
    use crate::config::{AggregateFunction, MetricConfiguration, SuppressionLimit};

    #[test]
    fn test_aggregate_functions() {
        let values = [1., 0., 3.];
        assert_eq!(AggregateFunction::Sum.aggregate(&values), 4.);
        assert_eq!(AggregateFunction::Maximum.aggregate(&values), 3.);
        assert!((AggregateFunction::ArithmeticMean.aggregate(&values) - 4. / 3.).abs() < 1e-12);
        // (2 * 1 * 4)^(1/3) - 1
        assert!((AggregateFunction::GeometricMean.aggregate(&values) - (8f64.cbrt() - 1.)).abs() < 1e-12);
        assert_eq!(AggregateFunction::GeometricMean.aggregate(&[]), 0.);
    }

    #[test]
    fn test_suppression_limit() {
        assert_eq!(SuppressionLimit::Fraction(0.1).absolute(25), 2);
        assert_eq!(SuppressionLimit::Absolute(30).absolute(25), 25);
        assert_eq!(SuppressionLimit::default().absolute(25), 0);
    }

    #[test]
    fn test_gs_factor() {
        let mut config = MetricConfiguration::default();
        assert_eq!((config.generalization_factor(), config.suppression_factor()), (1., 1.));
        config.gs_factor = 0.;
        assert_eq!((config.generalization_factor(), config.suppression_factor()), (0., 1.));
        config.gs_factor = 1.;
        assert_eq!((config.generalization_factor(), config.suppression_factor()), (1., 0.));
    }
}
