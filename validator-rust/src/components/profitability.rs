use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::EncodedDataset;
use crate::components::{Criterion, check_subset};
use crate::RowIndex;

/// Monetary parameters of the game between a data publisher and an adversary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostBenefitConfiguration {
    /// Cost of one re-identification attempt.
    pub adversary_cost: f64,
    /// Gain of one successful re-identification.
    pub adversary_gain: f64,
    /// Loss of the publisher per successful re-identification.
    pub publisher_loss: f64,
    /// Benefit of publishing one row without information loss.
    pub publisher_benefit: f64,
}

impl CostBenefitConfiguration {
    pub fn validate(&self) -> Result<()> {
        let values = [self.adversary_cost, self.adversary_gain, self.publisher_loss, self.publisher_benefit];
        if values.iter().any(|value| !value.is_finite() || *value < 0.) {
            bail!(ErrorKind::Configuration("cost/benefit parameters must be finite and non-negative".to_string()))
        }
        if self.publisher_benefit == 0. {
            bail!(ErrorKind::Configuration("publisher benefit must be positive".to_string()))
        }
        Ok(())
    }

    /// Expected payout of an attack on a row with the given success probability.
    pub fn adversary_payout(&self, success_probability: f64) -> f64 {
        self.adversary_gain * success_probability - self.adversary_cost
    }

    /// Expected payout of publishing a row, given its information loss and re-identification probability.
    ///
    /// Rational adversaries only attack when their payout is positive.
    pub fn publisher_payout(&self, information_loss: f64, success_probability: f64) -> f64 {
        let benefit = self.publisher_benefit * (1. - information_loss);
        if self.adversary_payout(success_probability) > 0. {
            benefit - self.publisher_loss * success_probability
        } else {
            benefit
        }
    }
}

/// Whether the adversary may attack at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitabilityVariant {
    /// Release classes only when no attack on them is profitable.
    NoAttack,
    /// Release classes when the payout of the publisher is positive, attacks included.
    Payout,
}

impl Default for ProfitabilityVariant {
    fn default() -> Self {
        ProfitabilityVariant::Payout
    }
}

/// Game-theoretic protection against a prosecutor, who knows that the target is in the data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityProsecutor {
    pub cost_benefit: CostBenefitConfiguration,
    #[serde(default)]
    pub variant: ProfitabilityVariant,
}

impl Criterion for ProfitabilityProsecutor {
    fn validate(&self, _dataset: &EncodedDataset) -> Result<()> {
        self.cost_benefit.validate()
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        false
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn summarize(&self) -> String {
        format!("prosecutor profitability ({:?})", self.variant)
    }
}

/// Game-theoretic protection against a journalist,
/// who targets individuals of the population the research subset is drawn from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityJournalist {
    pub cost_benefit: CostBenefitConfiguration,
    #[serde(default)]
    pub variant: ProfitabilityVariant,
    pub subset: Vec<RowIndex>,
}

impl Criterion for ProfitabilityJournalist {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        self.cost_benefit.validate()?;
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
        format!("journalist profitability ({:?})", self.variant)
    }
}
