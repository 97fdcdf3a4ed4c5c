use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::Criterion;

/// Every equivalence class contains at least `k` rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KAnonymity {
    pub k: usize,
}

impl KAnonymity {
    pub fn new(k: usize) -> Self {
        KAnonymity { k }
    }
}

impl Criterion for KAnonymity {
    fn validate(&self, _dataset: &EncodedDataset) -> Result<()> {
        if self.k < 1 {
            bail!(ErrorKind::Configuration("k must be at least 1".to_string()))
        }
        Ok(())
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        true
    }

    fn summarize(&self) -> String {
        format!("{}-anonymity", self.k)
    }
}
