use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column};

/// Every equivalence class contains at least `l` distinct values of the sensitive attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistinctLDiversity {
    pub attribute: String,
    pub l: usize,
}

impl Criterion for DistinctLDiversity {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        get_sensitive_column(dataset, &self.attribute)?;
        if self.l < 1 {
            bail!(ErrorKind::Configuration("l must be at least 1".to_string()))
        }
        Ok(())
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn sensitive_attribute(&self) -> Option<&str> {
        Some(&self.attribute)
    }

    fn summarize(&self) -> String {
        format!("distinct-{}-diversity for attribute {}", self.l, self.attribute)
    }
}
