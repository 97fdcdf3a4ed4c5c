use kanon_validator::base::Transformation;

use crate::base::DataManager;
use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};

/// Generalization level of each quasi-identifier, relative to the height of its hierarchy.
///
/// The non-monotonic variant charges suppressed rows the maximal loss of one per attribute.
#[derive(Clone, Debug)]
pub struct Precision {
    monotonic: bool,
    weighting: Weighting,
    heights: Vec<u32>,
}

impl Precision {
    pub fn new(monotonic: bool, weighting: Weighting, manager: &DataManager) -> Self {
        Precision { monotonic, weighting, heights: manager.heights() }
    }

    fn shares(&self, transformation: &Transformation) -> Vec<f64> {
        transformation.levels().iter().zip(self.heights.iter())
            .map(|(level, height)| if *height > 1 { *level as f64 / (*height - 1) as f64 } else { 0. })
            .collect()
    }

    fn bounds(&self, transformation: &Transformation) -> Vec<f64> {
        let Weighting { generalization, suppression, .. } = self.weighting;
        self.shares(transformation).into_iter()
            .map(|share| if self.monotonic {
                generalization * share
            } else {
                (generalization * share).min(suppression)
            })
            .collect()
    }
}

impl Metric for Precision {
    fn name(&self) -> &'static str {
        "precision"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        self.monotonic
    }

    fn is_independent(&self) -> bool {
        self.monotonic
    }

    fn evaluate(&self, transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let bound = self.bounds(transformation);
        if self.monotonic {
            return Evaluation {
                loss: self.weighting.loss(self.name(), bound.clone()),
                bound: self.weighting.loss(self.name(), bound),
            };
        }

        let Weighting { generalization, suppression, rows, .. } = self.weighting;
        let (released, suppressed) = groupify.entries().iter()
            .fold((0, 0), |(released, suppressed), entry| if entry.is_not_outlier {
                (released + entry.count, suppressed)
            } else {
                (released, suppressed + entry.count)
            });

        let loss = self.shares(transformation).into_iter()
            .map(|share| (released as f64 * generalization * share + suppressed as f64 * suppression) / rows)
            .collect();

        Evaluation {
            loss: self.weighting.loss(self.name(), loss),
            bound: self.weighting.loss(self.name(), bound),
        }
    }

    fn lower_bound(&self, transformation: &Transformation) -> Option<InformationLoss> {
        Some(self.weighting.loss(self.name(), self.bounds(transformation)))
    }
}


#[cfg(test)]
mod test_precision {
    use kanon_validator::base::Transformation;
    use kanon_validator::config::MetricConfiguration;

    use crate::base::DataManager;
    use crate::base::test_data::patients;
    use crate::groupify::HashGroupify;
    use crate::metrics::{Metric, Weighting};
    use crate::metrics::precision::Precision;

    #[test]
    fn test_relative_levels() {
        let dataset = patients();
        let manager = DataManager::new(&dataset, None).unwrap();
        let weighting = Weighting::new(&MetricConfiguration::default(), &dataset, &manager).unwrap();

        let node = Transformation::new(vec![1, 3]);
        let mut groupify = HashGroupify::build(&node, &manager);
        let monotonic = Precision::new(true, weighting.clone(), &manager);
        assert_eq!(monotonic.evaluate(&node, &groupify).loss.value(), 0.5 + 1.);

        let non_monotonic = Precision::new(false, weighting, &manager);
        assert_eq!(non_monotonic.evaluate(&node, &groupify).loss.value(), 1.5);
        groupify.entries_mut().iter_mut().for_each(|entry| entry.is_not_outlier = false);
        assert_eq!(non_monotonic.evaluate(&node, &groupify).loss.value(), 2.);
    }
}
