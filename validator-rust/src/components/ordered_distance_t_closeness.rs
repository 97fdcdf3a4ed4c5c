use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column, check_range};

/// The earth mover's distance between the class and the global distribution is at most `t`,
/// with the ground distance given by the rank of the sensitive values in their natural order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderedDistanceTCloseness {
    pub attribute: String,
    pub t: f64,
}

impl Criterion for OrderedDistanceTCloseness {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        let column = get_sensitive_column(dataset, &self.attribute)?;
        if !dataset.orders.contains_key(&column) {
            bail!(ErrorKind::Configuration(format!("no value order for attribute {}", self.attribute)))
        }
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
        format!("{}-closeness with ordered ground distance for attribute {}", self.t, self.attribute)
    }
}
