use kanon_validator::errors::*;

use std::sync::Arc;

use ndarray::ArrayView2;

use kanon_validator::base::{EncodedDataset, Transformation, NO_CODE};
use kanon_validator::config::AnonymizationConfig;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::Criteria;
use crate::groupify::HashGroupify;
use crate::history::History;
use crate::metrics::{build_metric, InformationLoss, Metric};

/// Outcome of checking one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeResult {
    pub transformation: Transformation,
    /// Every privacy model holds within the suppression limit.
    pub anonymous: bool,
    pub loss: InformationLoss,
    /// Lower bound on the loss of the node and of every generalization of it.
    pub bound: InformationLoss,
    /// Suppressed rows of the research subset.
    pub suppressed: usize,
    /// Classes with rows of the research subset.
    pub classes: usize,
}

/// Checks nodes against the privacy models and the metric of one anonymization.
///
/// Shared by all search threads.
#[derive(Debug)]
pub struct NodeChecker {
    pub manager: Arc<DataManager>,
    pub criteria: Criteria,
    pub metric: Box<dyn Metric>,
    history: History,
    /// Largest number of suppressed rows.
    pub suppression_limit: usize,
}

impl NodeChecker {
    pub fn new(dataset: &EncodedDataset, config: &AnonymizationConfig, manager: Arc<DataManager>) -> Result<NodeChecker> {
        Ok(NodeChecker {
            criteria: Criteria::build(&config.privacy_models, dataset, &manager)?,
            metric: build_metric(&config.metric, &config.metric_config, dataset, &manager)
                .chain_err(|| format!("metric: {}", config.metric.name()))?,
            history: History::new(&config.history, manager.num_rows()),
            suppression_limit: config.suppression_limit.absolute(manager.subset_size()),
            manager,
        })
    }

    /// Whether a node passing the criteria implies that its generalizations pass too.
    pub fn is_criteria_monotonic(&self) -> bool {
        self.criteria.is_monotonic(self.suppression_limit > 0)
    }

    /// Whether the loss never decreases along generalization, for the suppression limit in use.
    pub fn is_metric_monotonic(&self) -> bool {
        self.metric.is_monotonic(self.suppression_limit > 0)
    }

    pub fn check(&self, transformation: &Transformation) -> NodeResult {
        let mut groupify = match self.history.lookup(transformation) {
            Some((_, snapshot)) => HashGroupify::derive(&snapshot, transformation, &self.manager),
            None => HashGroupify::build(transformation, &self.manager),
        };
        let (anonymous, suppressed) = self.assess(transformation, &mut groupify);
        let evaluation = self.metric.evaluate(transformation, &groupify);
        self.history.store(transformation, &groupify);

        tracing::debug!(node = %transformation, anonymous, suppressed, loss = %evaluation.loss, "checked");
        NodeResult {
            transformation: transformation.clone(),
            anonymous,
            loss: evaluation.loss,
            bound: evaluation.bound,
            suppressed,
            classes: groupify.num_classes(),
        }
    }

    /// Flag outliers, and decide whether the node is anonymous. Returns the number of suppressed rows.
    pub fn assess(&self, transformation: &Transformation, groupify: &mut HashGroupify) -> (bool, usize) {
        groupify.reset_outliers();
        self.criteria.flag_outliers(transformation, groupify);
        let enforced = self.criteria.enforce(groupify);
        let suppressed = groupify.num_suppressed();
        (enforced && suppressed <= self.suppression_limit, suppressed)
    }

    /// Check rows keyed by arbitrary generalized tuples, as released.
    /// Rows keyed by all [`NO_CODE`] are suppressed, and count against the suppression limit.
    /// Every other class must satisfy the privacy models without further suppression.
    ///
    /// `transformation` is the node the keys were mostly generalized by, consulted by criteria depending on levels.
    pub fn check_keys(&self, transformation: &Transformation, keys: ArrayView2<Code>) -> (bool, HashGroupify) {
        let mut groupify = HashGroupify::from_keys(keys, &self.manager);
        groupify.reset_outliers();
        self.criteria.flag_outliers(transformation, &mut groupify);
        groupify.suppress_unkeyed();
        let enforced = self.criteria.enforce(&mut groupify);

        let unkeyed = vec![NO_CODE; groupify.dimensions()];
        let released = groupify.entries().iter()
            .all(|entry| entry.is_not_outlier || entry.count == 0 || groupify.key(entry) == unkeyed.as_slice());
        let anonymous = enforced && released && groupify.num_suppressed() <= self.suppression_limit;
        (anonymous, groupify)
    }
}


#[cfg(test)]
mod test_checker {
    use std::sync::Arc;

    use kanon_validator::base::Transformation;
    use kanon_validator::components::{KAnonymity, PrivacyModel};
    use kanon_validator::config::{AnonymizationConfig, HistoryConfig, MetricDefinition, SuppressionLimit};

    use crate::base::DataManager;
    use crate::base::test_data::{letters, patients};
    use crate::checker::NodeChecker;

    #[test]
    fn test_k_anonymity_example() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        let manager = Arc::new(DataManager::new(&dataset, None).unwrap());
        let config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))])
            .with_metric(MetricDefinition::Discernibility { monotonic: false });
        let checker = NodeChecker::new(&dataset, &config, manager).unwrap();

        let bottom = checker.check(&Transformation::new(vec![0, 0]));
        assert!(!bottom.anonymous);
        assert_eq!(bottom.suppressed, 1);
        assert_eq!(bottom.classes, 2);

        // 3^2
        let top = checker.check(&Transformation::new(vec![1, 1]));
        assert!(top.anonymous);
        assert_eq!(top.loss.value(), 9.);
    }

    #[test]
    fn test_suppression_limit() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        let manager = Arc::new(DataManager::new(&dataset, None).unwrap());
        let config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))])
            .with_suppression_limit(SuppressionLimit::Absolute(1))
            .with_metric(MetricDefinition::Discernibility { monotonic: false });
        let checker = NodeChecker::new(&dataset, &config, manager).unwrap();

        // the single B row is suppressed: 2^2 + 1 * 3
        let bottom = checker.check(&Transformation::new(vec![0, 0]));
        assert!(bottom.anonymous);
        assert_eq!(bottom.suppressed, 1);
        assert_eq!(bottom.loss.value(), 7.);
        assert!(checker.is_criteria_monotonic());
        assert!(!checker.is_metric_monotonic());
    }

    #[test]
    fn test_derived_checks_agree() {
        let dataset = patients();
        let manager = Arc::new(DataManager::new(&dataset, None).unwrap());
        let mut config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))]);
        config.history = HistoryConfig { size: 20, snapshot_ratio: 1. };
        let checker = NodeChecker::new(&dataset, &config, manager.clone()).unwrap();
        config.history.size = 0;
        let fresh = NodeChecker::new(&dataset, &config, manager).unwrap();

        // checks after the first derive from stored snapshots
        let nodes = itertools::iproduct!(0..3u32, 0..4u32)
            .map(|(age, zip)| Transformation::new(vec![age, zip]))
            .collect::<Vec<_>>();
        for node in nodes.iter() {
            assert_eq!(checker.check(node), fresh.check(node));
        }
    }
}
