use kanon_validator::base::Transformation;
use kanon_validator::components::CostBenefitConfiguration;

use crate::base::DataManager;
use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, InformationLoss, Metric, Weighting};
use crate::metrics::loss::DomainShares;

/// Share of the maximal payout of the publisher that is lost, averaged over the rows.
///
/// A released row earns the publisher benefit reduced by its information loss,
/// minus the expected loss from a re-identification when an attack pays off for the adversary.
/// Suppressed rows earn nothing.
#[derive(Clone, Debug)]
pub struct PublisherPayout {
    cost_benefit: CostBenefitConfiguration,
    journalist: bool,
    weighting: Weighting,
    shares: DomainShares,
}

impl PublisherPayout {
    pub fn new(cost_benefit: CostBenefitConfiguration, journalist: bool, weighting: Weighting, manager: &DataManager) -> Self {
        PublisherPayout { cost_benefit, journalist, weighting, shares: DomainShares::new(manager) }
    }
}

impl Metric for PublisherPayout {
    fn name(&self) -> &'static str {
        "publisher_payout"
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        false
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn evaluate(&self, transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let Weighting { generalization, suppression, rows, .. } = self.weighting;
        let benefit = self.cost_benefit.publisher_benefit;
        let (mut loss, mut bound) = (0., 0.);

        for entry in groupify.entries().iter().filter(|entry| entry.count > 0) {
            let information_loss = self.shares.mean(transformation, groupify.key(entry));
            let count = entry.count as f64;
            bound += count * (generalization * information_loss).min(suppression);

            loss += count * if entry.is_not_outlier {
                let size = if self.journalist { entry.pcount } else { entry.count };
                let payout = self.cost_benefit.publisher_payout(information_loss, 1. / size as f64);
                generalization * num::clamp(1. - payout / benefit, 0., 1.)
            } else {
                suppression
            };
        }

        Evaluation {
            loss: InformationLoss::scalar(self.name(), loss / rows),
            bound: InformationLoss::scalar(self.name(), bound / rows),
        }
    }
}
