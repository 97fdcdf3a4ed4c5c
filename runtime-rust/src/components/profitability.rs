use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::{CostBenefitConfiguration, ProfitabilityJournalist, ProfitabilityProsecutor, ProfitabilityVariant};
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::{Bind, Binding, ClassCriterion};
use crate::groupify::GroupifyEntry;
use crate::metrics::loss::DomainShares;

impl Bind for ProfitabilityProsecutor {
    fn bind(&self, _dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(Profitability::new(&self.cost_benefit, self.variant, false, manager))))
    }
}

impl Bind for ProfitabilityJournalist {
    fn bind(&self, _dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(Profitability::new(&self.cost_benefit, self.variant, true, manager))))
    }
}

/// Releases a class when the game between publisher and adversary favors the publisher.
///
/// The prosecutor knows the target is in the sample, and succeeds with probability `1 / count`.
/// The journalist only knows the target is in the population, and succeeds with probability `1 / pcount`.
#[derive(Clone, Debug)]
pub struct Profitability {
    cost_benefit: CostBenefitConfiguration,
    variant: ProfitabilityVariant,
    journalist: bool,
    shares: DomainShares,
}

impl Profitability {
    pub fn new(cost_benefit: &CostBenefitConfiguration, variant: ProfitabilityVariant, journalist: bool, manager: &DataManager) -> Self {
        Profitability {
            cost_benefit: cost_benefit.clone(),
            variant,
            journalist,
            shares: DomainShares::new(manager),
        }
    }
}

impl ClassCriterion for Profitability {
    fn is_anonymous(&self, transformation: &Transformation, key: &[Code], entry: &GroupifyEntry) -> bool {
        let size = if self.journalist { entry.pcount } else { entry.count };
        let success = 1. / size.max(1) as f64;
        match self.variant {
            ProfitabilityVariant::NoAttack => self.cost_benefit.adversary_payout(success) <= 0.,
            ProfitabilityVariant::Payout =>
                self.cost_benefit.publisher_payout(self.shares.mean(transformation, key), success) >= 0.,
        }
    }
}


#[cfg(test)]
mod test_profitability {
    use kanon_validator::base::Transformation;
    use kanon_validator::components::{CostBenefitConfiguration, ProfitabilityVariant};

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::components::ClassCriterion;
    use crate::components::profitability::Profitability;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_no_attack() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["A", "1"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        // attacks pay off below a class size of 4
        let cost_benefit = CostBenefitConfiguration {
            adversary_cost: 1., adversary_gain: 4., publisher_loss: 10., publisher_benefit: 1.
        };
        let criterion = Profitability::new(&cost_benefit, ProfitabilityVariant::NoAttack, false, &manager);

        let node = Transformation::new(vec![0, 0]);
        let groupify = HashGroupify::build(&node, &manager);
        assert!(groupify.entries().iter().all(|entry| !criterion.is_anonymous(&node, groupify.key(entry), entry)));

        let top = Transformation::new(vec![1, 1]);
        let groupify = HashGroupify::build(&top, &manager);
        let entry = &groupify.entries()[0];
        assert!(criterion.is_anonymous(&top, groupify.key(entry), entry));
    }

    #[test]
    fn test_payout() {
        let dataset = letters(&[&["A", "1"], &["B", "2"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let cost_benefit = CostBenefitConfiguration {
            adversary_cost: 1., adversary_gain: 4., publisher_loss: 10., publisher_benefit: 1.
        };
        let criterion = Profitability::new(&cost_benefit, ProfitabilityVariant::Payout, false, &manager);

        // singleton classes: benefit 1 minus an expected loss of 10
        let node = Transformation::new(vec![0, 0]);
        let groupify = HashGroupify::build(&node, &manager);
        let entry = &groupify.entries()[0];
        assert!(!criterion.is_anonymous(&node, groupify.key(entry), entry));
    }
}
