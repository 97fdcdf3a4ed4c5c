use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column};

/// Recursive (c,l)-diversity.
///
/// With the class frequencies of the sensitive values sorted in descending order `r1 >= r2 >= ... >= rm`,
/// every class satisfies `r1 < c * (rl + r(l+1) + ... + rm)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecursiveCLDiversity {
    pub attribute: String,
    pub c: f64,
    pub l: usize,
}

impl Criterion for RecursiveCLDiversity {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        get_sensitive_column(dataset, &self.attribute)?;
        if !(self.c > 0.) {
            bail!(ErrorKind::Configuration("c must be positive".to_string()))
        }
        if self.l < 1 {
            bail!(ErrorKind::Configuration("l must be at least 1".to_string()))
        }
        Ok(())
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
        format!("recursive-({},{})-diversity for attribute {}", self.c, self.l, self.attribute)
    }
}
