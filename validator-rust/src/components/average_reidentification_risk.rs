use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, check_range};

/// The average prosecutor re-identification risk, `classes / rows`, is at most `risk`.
///
/// Enforced on the whole sample by suppressing the smallest classes first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AverageReidentificationRisk {
    pub risk: f64,
}

impl Criterion for AverageReidentificationRisk {
    fn validate(&self, _dataset: &EncodedDataset) -> Result<()> {
        check_range("risk", self.risk, 0., 1.)?;
        if self.risk == 0. {
            bail!(ErrorKind::Configuration("risk must be positive".to_string()))
        }
        Ok(())
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        true
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn is_sample_based(&self) -> bool {
        true
    }

    fn summarize(&self) -> String {
        format!("average re-identification risk of at most {}", self.risk)
    }
}
