use kanon_validator::base::Transformation;

use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};

/// Discernibility metric.
///
/// Every row is charged the size of its class. In the non-monotonic variant (DM),
/// rows of outlier classes are charged the size of the research subset instead.
/// The monotonic variant (DM*) charges every class its squared size.
#[derive(Clone, Debug)]
pub struct Discernibility {
    monotonic: bool,
    weighting: Weighting,
}

impl Discernibility {
    pub fn new(monotonic: bool, weighting: Weighting) -> Self {
        Discernibility { monotonic, weighting }
    }
}

impl Metric for Discernibility {
    fn name(&self) -> &'static str {
        "discernibility"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        self.monotonic
    }

    fn evaluate(&self, _transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let Weighting { generalization, suppression, rows, .. } = self.weighting;

        let (mut loss, mut squares) = (0., 0.);
        for entry in groupify.entries().iter().filter(|entry| entry.count > 0) {
            let count = entry.count as f64;
            squares += count * count;
            loss += match (entry.is_not_outlier, self.monotonic) {
                (true, _) => generalization * count * count,
                (false, true) => suppression * count * count,
                (false, false) => suppression * count * rows,
            };
        }

        Evaluation {
            loss: InformationLoss::scalar(self.name(), loss),
            bound: InformationLoss::scalar(self.name(), generalization.min(suppression) * squares),
        }
    }
}


#[cfg(test)]
mod test_discernibility {
    use kanon_validator::base::Transformation;
    use kanon_validator::config::AggregateFunction;

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::groupify::HashGroupify;
    use crate::metrics::{Metric, Weighting};
    use crate::metrics::discernibility::Discernibility;

    fn weighting(rows: f64) -> Weighting {
        Weighting {
            weights: vec![1., 1.],
            aggregate: AggregateFunction::Sum,
            generalization: 1.,
            suppression: 1.,
            rows,
        }
    }

    #[test]
    fn test_squared_class_sizes() {
        // classes of sizes 2, 3 and 4
        let dataset = letters(&[
            &["A", "1"], &["A", "1"],
            &["B", "2"], &["B", "2"], &["B", "2"],
            &["C", "3"], &["C", "3"], &["C", "3"], &["C", "3"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let node = Transformation::new(vec![0, 0]);
        let groupify = HashGroupify::build(&node, &manager);

        for monotonic in vec![true, false] {
            let evaluation = Discernibility::new(monotonic, weighting(9.)).evaluate(&node, &groupify);
            assert_eq!(evaluation.loss.value(), 29.);
            assert_eq!(evaluation.bound.value(), 29.);
        }
    }

    #[test]
    fn test_suppressed_rows() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let node = Transformation::new(vec![0, 0]);
        let mut groupify = HashGroupify::build(&node, &manager);
        groupify.entries_mut()[1].is_not_outlier = false;

        let dm = Discernibility::new(false, weighting(3.)).evaluate(&node, &groupify);
        assert_eq!(dm.loss.value(), 4. + 3.);
        let dm_star = Discernibility::new(true, weighting(3.)).evaluate(&node, &groupify);
        assert_eq!(dm_star.loss.value(), 4. + 1.);
        assert_eq!(dm.bound, dm_star.bound);
    }
}
