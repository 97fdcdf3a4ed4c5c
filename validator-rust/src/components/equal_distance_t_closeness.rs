use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column, check_range};

/// The variational distance between the class and the global distribution
/// of the sensitive attribute is at most `t`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EqualDistanceTCloseness {
    pub attribute: String,
    pub t: f64,
}

impl Criterion for EqualDistanceTCloseness {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        get_sensitive_column(dataset, &self.attribute)?;
        check_range("t", self.t, 0., 1.)
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn sensitive_attribute(&self) -> Option<&str> {
        Some(&self.attribute)
    }

    fn summarize(&self) -> String {
        format!("{}-closeness with equal ground distance for attribute {}", self.t, self.attribute)
    }
}
