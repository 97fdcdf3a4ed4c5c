use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, check_subset};
use crate::RowIndex;

/// Restricts the output to a research subset. Satisfied by every class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inclusion {
    pub subset: Vec<RowIndex>,
}

impl Criterion for Inclusion {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        check_subset(dataset, &self.subset)
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn research_subset(&self) -> Option<&[RowIndex]> {
        Some(&self.subset)
    }

    fn summarize(&self) -> String {
        format!("inclusion of {} rows", self.subset.len())
    }
}
