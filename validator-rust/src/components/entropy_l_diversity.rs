use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, get_sensitive_column};

/// Estimator for the entropy of the sensitive values within a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyEstimator {
    /// Plug-in estimate from the observed frequencies.
    Shannon,
    /// Bias-corrected estimate of Grassberger (2003).
    Grassberger,
}

impl Default for EntropyEstimator {
    fn default() -> Self {
        EntropyEstimator::Shannon
    }
}

/// The entropy of the sensitive values within every class is at least `log2(l)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntropyLDiversity {
    pub attribute: String,
    pub l: f64,
    #[serde(default)]
    pub estimator: EntropyEstimator,
}

impl Criterion for EntropyLDiversity {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        get_sensitive_column(dataset, &self.attribute)?;
        if !(self.l >= 1.) {
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
        format!("entropy-{}-diversity for attribute {}", self.l, self.attribute)
    }
}
