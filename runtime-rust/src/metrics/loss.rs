use indexmap::IndexMap;

use kanon_validator::base::Transformation;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::groupify::HashGroupify;
use crate::metrics::{Evaluation, Metric, Weighting};

/// Share of the domain covered by each generalized code, per quasi-identifier and level.
///
/// A code covering `n` of the `d` input values has the share `(n - 1) / (d - 1)`.
#[derive(Clone, Debug)]
pub struct DomainShares {
    shares: Vec<Vec<IndexMap<Code, f64>>>,
}

impl DomainShares {
    pub fn new(manager: &DataManager) -> Self {
        DomainShares {
            shares: manager.hierarchies.iter()
                .map(|hierarchy| {
                    let domain = hierarchy.domain_size();
                    (0..hierarchy.height() as u32)
                        .map(|level| hierarchy.leaf_counts(level).into_iter()
                            .map(|(code, leaves)| (code, if domain > 1 {
                                (leaves - 1) as f64 / (domain - 1) as f64
                            } else { 0. }))
                            .collect())
                        .collect()
                })
                .collect()
        }
    }

    #[inline]
    pub fn share(&self, dimension: usize, level: u32, code: Code) -> f64 {
        self.shares[dimension][level as usize].get(&code).cloned().unwrap_or(1.)
    }

    /// Mean share of the values of a class key.
    pub fn mean(&self, transformation: &Transformation, key: &[Code]) -> f64 {
        if key.is_empty() {
            return 0.;
        }
        transformation.levels().iter().zip(key.iter()).enumerate()
            .map(|(dimension, (level, code))| self.share(dimension, *level, *code))
            .sum::<f64>() / key.len() as f64
    }
}

/// Loss metric: the share of the domain each released value covers, averaged over the rows.
/// Suppressed values cover the whole domain.
#[derive(Clone, Debug)]
pub struct GeneralizationLoss {
    weighting: Weighting,
    shares: DomainShares,
}

impl GeneralizationLoss {
    pub fn new(weighting: Weighting, manager: &DataManager) -> Self {
        GeneralizationLoss { weighting, shares: DomainShares::new(manager) }
    }
}

impl Metric for GeneralizationLoss {
    fn name(&self) -> &'static str {
        "loss"
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        false
    }

    fn evaluate(&self, transformation: &Transformation, groupify: &HashGroupify) -> Evaluation {
        let Weighting { generalization, suppression, rows, .. } = self.weighting;
        let dimensions = transformation.dimensions();
        let (mut loss, mut bound) = (vec![0.; dimensions], vec![0.; dimensions]);

        for entry in groupify.entries().iter().filter(|entry| entry.count > 0) {
            let key = groupify.key(entry);
            let count = entry.count as f64;
            for (dimension, level) in transformation.levels().iter().enumerate() {
                let share = generalization * self.shares.share(dimension, *level, key[dimension]);
                loss[dimension] += count * if entry.is_not_outlier { share } else { suppression };
                bound[dimension] += count * share.min(suppression);
            }
        }

        loss.iter_mut().chain(bound.iter_mut()).for_each(|value| *value /= rows);
        Evaluation {
            loss: self.weighting.loss(self.name(), loss),
            bound: self.weighting.loss(self.name(), bound),
        }
    }
}
