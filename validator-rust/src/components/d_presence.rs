use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, check_subset, check_range};
use crate::RowIndex;

/// Bounds the probability that an individual of the population is in the research subset.
///
/// Every class that contains rows of the subset satisfies `d_min <= count / pcount <= d_max`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DPresence {
    pub d_min: f64,
    pub d_max: f64,
    pub subset: Vec<RowIndex>,
}

impl Criterion for DPresence {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        check_range("d_min", self.d_min, 0., 1.)?;
        check_range("d_max", self.d_max, 0., 1.)?;
        if self.d_min > self.d_max {
            bail!(ErrorKind::Configuration("d_min must not exceed d_max".to_string()))
        }
        check_subset(dataset, &self.subset)
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        false
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn research_subset(&self) -> Option<&[RowIndex]> {
        Some(&self.subset)
    }

    fn summarize(&self) -> String {
        format!("({}, {})-presence", self.d_min, self.d_max)
    }
}
