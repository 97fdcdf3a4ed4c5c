use kanon_validator::errors::*;

use indexmap::IndexMap;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::utilities::check_static_losses;

use crate::base::DataManager;
use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};

/// User-defined loss of each quasi-identifier at each level.
#[derive(Clone, Debug)]
pub struct StaticLosses {
    weighting: Weighting,
    losses: Vec<Vec<f64>>,
}

impl StaticLosses {
    pub fn new(
        losses: &IndexMap<String, Vec<f64>>,
        weighting: Weighting,
        dataset: &EncodedDataset,
        manager: &DataManager,
    ) -> Result<Self> {
        check_static_losses(dataset, losses)?;
        let losses = manager.quasi_identifiers.iter()
            .map(|column| losses.get(&dataset.header[*column]).cloned().unwrap_or_default())
            .collect();
        Ok(StaticLosses { weighting, losses })
    }

    fn values(&self, transformation: &Transformation) -> Vec<f64> {
        transformation.levels().iter().enumerate()
            .map(|(dimension, level)| self.losses[dimension][*level as usize])
            .collect()
    }
}

impl Metric for StaticLosses {
    fn name(&self) -> &'static str {
        "static"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }

    fn evaluate(&self, transformation: &Transformation, _groupify: &HashGroupify) -> Evaluation {
        let loss = self.weighting.loss(self.name(), self.values(transformation));
        Evaluation { bound: loss.clone(), loss }
    }

    fn lower_bound(&self, transformation: &Transformation) -> Option<InformationLoss> {
        Some(self.weighting.loss(self.name(), self.values(transformation)))
    }
}


#[cfg(test)]
mod test_static_losses {
    use indexmap::IndexMap;

    use kanon_validator::base::Transformation;
    use kanon_validator::config::{AggregateFunction, MetricConfiguration};

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::groupify::HashGroupify;
    use crate::metrics::{Metric, Weighting};
    use crate::metrics::static_losses::StaticLosses;

    #[test]
    fn test_indexed_by_level() {
        let dataset = letters(&[&["A", "1"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let mut losses = IndexMap::new();
        losses.insert("digit".to_string(), vec![0.1, 0.7]);
        losses.insert("letter".to_string(), vec![0., 0.4]);

        let mut config = MetricConfiguration::default();
        config.aggregate = AggregateFunction::Maximum;
        let weighting = Weighting::new(&config, &dataset, &manager).unwrap();
        let metric = StaticLosses::new(&losses, weighting, &dataset, &manager).unwrap();

        let node = Transformation::new(vec![1, 0]);
        let evaluation = metric.evaluate(&node, &HashGroupify::build(&node, &manager));
        // components follow the quasi-identifiers, not the order of the table
        assert_eq!(evaluation.loss, metric.lower_bound(&node).unwrap());
        assert_eq!(evaluation.loss.value(), 0.4);
        let top = Transformation::new(vec![1, 1]);
        assert_eq!(metric.lower_bound(&top).unwrap().value(), 0.7);

        losses.insert("digit".to_string(), vec![0.7, 0.1]);
        let weighting = Weighting::new(&config, &dataset, &manager).unwrap();
        assert!(StaticLosses::new(&losses, weighting, &dataset, &manager).is_err());
    }
}
