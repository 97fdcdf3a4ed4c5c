use kanon_validator::base::Transformation;

use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric};

/// Sum of the generalization levels.
#[derive(Clone, Debug, Default)]
pub struct Height;

impl Height {
    pub fn new() -> Self {
        Height
    }
}

impl Metric for Height {
    fn name(&self) -> &'static str {
        "height"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn is_independent(&self) -> bool {
        true
    }

    fn evaluate(&self, transformation: &Transformation, _groupify: &HashGroupify) -> Evaluation {
        let loss = InformationLoss::scalar(self.name(), transformation.level() as f64);
        Evaluation { bound: loss.clone(), loss }
    }

    fn lower_bound(&self, transformation: &Transformation) -> Option<InformationLoss> {
        Some(InformationLoss::scalar(self.name(), transformation.level() as f64))
    }
}
