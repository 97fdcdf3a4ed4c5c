use kanon_validator::base::Transformation;

use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};

/// Average equivalence class size. All suppressed rows form one class.
#[derive(Clone, Debug)]
pub struct AverageClassSize {
    weighting: Weighting,
}

impl AverageClassSize {
    pub fn new(weighting: Weighting) -> Self {
        AverageClassSize { weighting }
    }
}

impl Metric for AverageClassSize {
    fn name(&self) -> &'static str {
        "aecs"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn evaluate(&self, _transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let rows = groupify.total_count() as f64;
        let classes = groupify.num_classes();
        let released = groupify.entries().iter()
            .filter(|entry| entry.count > 0 && entry.is_not_outlier)
            .count();
        let suppressed_class = if groupify.num_suppressed() > 0 { 1 } else { 0 };

        let average = |classes: usize| if classes == 0 { 0. } else { rows / classes as f64 };
        Evaluation {
            loss: InformationLoss::scalar(self.name(), average(released + suppressed_class)),
            bound: InformationLoss::scalar(self.name(), average(classes)),
        }
    }
}
