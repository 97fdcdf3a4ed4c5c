use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column, check_range};

/// The earth mover's distance between the class and the global distribution is at most `t`,
/// with the ground distance given by the hierarchy of the sensitive attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalDistanceTCloseness {
    pub attribute: String,
    pub t: f64,
}

impl Criterion for HierarchicalDistanceTCloseness {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        let column = get_sensitive_column(dataset, &self.attribute)?;
        let hierarchy = dataset.hierarchy(column)?;
        if hierarchy.height() < 2 {
            bail!(ErrorKind::Hierarchy(self.attribute.clone(), "must have at least two levels".to_string()))
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
        format!("{}-closeness with hierarchical ground distance for attribute {}", self.t, self.attribute)
    }
}
