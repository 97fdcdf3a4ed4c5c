use indexmap::IndexMap;

use kanon_validator::base::Transformation;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};

/// Non-uniform entropy.
///
/// For each quasi-identifier, the loss is `sum_v -f(v) * log2(f(v) / f(g(v)))` over the input values `v`,
/// with `f` the relative frequency in the research subset and `g(v)` the generalization of `v`.
/// The non-monotonic variant additionally charges rows of outlier classes
/// the entropy of generalizing their values to the full domain.
#[derive(Clone, Debug)]
pub struct NonUniformEntropy {
    monotonic: bool,
    weighting: Weighting,
    /// Generalization loss per quasi-identifier and level.
    losses: Vec<Vec<f64>>,
    /// Frequency of each generalized code, per quasi-identifier and level.
    cardinalities: Vec<Vec<IndexMap<Code, usize>>>,
}

impl NonUniformEntropy {
    /// Precompute the losses of every quasi-identifier at every level, in one pass over the data.
    pub fn new(monotonic: bool, weighting: Weighting, manager: &DataManager) -> Self {
        let rows = weighting.rows;
        let mut losses = Vec::with_capacity(manager.hierarchies.len());
        let mut cardinalities = Vec::with_capacity(manager.hierarchies.len());

        for (dimension, hierarchy) in manager.hierarchies.iter().enumerate() {
            let frequencies = manager.cardinalities(dimension);

            let per_level = (0..hierarchy.height() as u32)
                .map(|level| {
                    let mut generalized = IndexMap::<Code, usize>::new();
                    frequencies.iter().for_each(|(code, frequency)|
                        *generalized.entry(hierarchy.generalize(*code, level)).or_insert(0) += frequency);
                    generalized
                })
                .collect::<Vec<_>>();

            losses.push(per_level.iter().enumerate()
                .map(|(level, generalized)| frequencies.iter()
                    .map(|(code, frequency)| {
                        let group = generalized[&hierarchy.generalize(*code, level as u32)];
                        let (frequency, group) = (*frequency as f64, group as f64);
                        -(frequency / rows) * (frequency / group).log2()
                    })
                    .sum::<f64>())
                .collect());
            cardinalities.push(per_level);
        }

        NonUniformEntropy { monotonic, weighting, losses, cardinalities }
    }

    fn generalization_losses(&self, transformation: &Transformation) -> Vec<f64> {
        transformation.levels().iter().enumerate()
            .map(|(dimension, level)| self.weighting.generalization * self.losses[dimension][*level as usize])
            .collect()
    }
}

impl Metric for NonUniformEntropy {
    fn name(&self) -> &'static str {
        "entropy"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        self.monotonic
    }

    fn is_independent(&self) -> bool {
        self.monotonic
    }

    fn evaluate(&self, transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let bound = self.generalization_losses(transformation);
        let mut loss = bound.clone();

        if !self.monotonic {
            let rows = self.weighting.rows;
            for entry in groupify.entries().iter().filter(|entry| !entry.is_not_outlier && entry.count > 0) {
                let key = groupify.key(entry);
                for (dimension, level) in transformation.levels().iter().enumerate() {
                    let group = self.cardinalities[dimension][*level as usize]
                        .get(&key[dimension]).cloned().unwrap_or(0);
                    if group > 0 {
                        loss[dimension] += self.weighting.suppression * entry.count as f64
                            * (rows / group as f64).log2() / rows;
                    }
                }
            }
        }

        Evaluation {
            loss: self.weighting.loss(self.name(), loss),
            bound: self.weighting.loss(self.name(), bound),
        }
    }

    fn lower_bound(&self, transformation: &Transformation) -> Option<InformationLoss> {
        Some(self.weighting.loss(self.name(), self.generalization_losses(transformation)))
    }
}


#[cfg(test)]
mod test_entropy {
    use kanon_validator::base::Transformation;
    use kanon_validator::config::MetricConfiguration;

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::groupify::HashGroupify;
    use crate::metrics::{InformationLoss, Metric, Weighting};
    use crate::metrics::entropy::NonUniformEntropy;

    #[test]
    fn test_merging_two_halves_costs_one_bit() {
        let dataset = letters(&[&["A", "1"], &["B", "1"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let weighting = Weighting::new(&MetricConfiguration::default(), &dataset, &manager).unwrap();
        let metric = NonUniformEntropy::new(true, weighting, &manager);

        let node = Transformation::new(vec![1, 0]);
        let evaluation = metric.evaluate(&node, &HashGroupify::build(&node, &manager));
        match &evaluation.loss {
            InformationLoss::MultiDimensional { values, .. } => assert_eq!(values, &vec![1., 0.]),
            _ => panic!("entropy is multi-dimensional")
        }
        assert_eq!(evaluation.loss.value(), 1.);
    }

    #[test]
    fn test_suppression_charge() {
        let dataset = letters(&[&["A", "1"], &["B", "1"], &["A", "2"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let weighting = Weighting::new(&MetricConfiguration::default(), &dataset, &manager).unwrap();
        let metric = NonUniformEntropy::new(false, weighting, &manager);

        let node = Transformation::new(vec![0, 0]);
        let mut groupify = HashGroupify::build(&node, &manager);
        let unsuppressed = metric.evaluate(&node, &groupify);
        assert_eq!(unsuppressed.loss.value(), 0.);

        // one row of four, both of its values are half of the data: 2 * log2(4 / 2) / 4
        groupify.entries_mut()[0].is_not_outlier = false;
        let suppressed = metric.evaluate(&node, &groupify);
        assert!((suppressed.loss.value() - 0.5).abs() < 1e-12);
        assert_eq!(suppressed.bound, unsuppressed.loss);
    }
}
