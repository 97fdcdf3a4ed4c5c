use kanon_validator::errors::*;

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use noisy_float::prelude::n64;

use kanon_validator::config::AggregateFunction;

/// Information loss of one transformation under one metric.
///
/// Losses are only comparable within the same metric, and for multi-dimensional losses,
/// the same aggregate function.
#[derive(Clone, Debug, PartialEq)]
pub enum InformationLoss {
    Scalar {
        metric: &'static str,
        value: f64,
    },
    /// One component per quasi-identifier, combined by the aggregate function.
    MultiDimensional {
        metric: &'static str,
        aggregate: AggregateFunction,
        values: Vec<f64>,
    },
}

impl InformationLoss {
    pub fn scalar(metric: &'static str, value: f64) -> Self {
        InformationLoss::Scalar { metric, value }
    }

    pub fn multi_dimensional(metric: &'static str, aggregate: AggregateFunction, values: Vec<f64>) -> Self {
        InformationLoss::MultiDimensional { metric, aggregate, values }
    }

    pub fn metric(&self) -> &'static str {
        match self {
            InformationLoss::Scalar { metric, .. } => *metric,
            InformationLoss::MultiDimensional { metric, .. } => *metric,
        }
    }

    /// Scalar summary of the loss.
    pub fn value(&self) -> f64 {
        match self {
            InformationLoss::Scalar { value, .. } => *value,
            InformationLoss::MultiDimensional { aggregate, values, .. } => aggregate.aggregate(values),
        }
    }

    fn incomparable(&self, other: &InformationLoss) -> Error {
        ErrorKind::IncomparableLoss(self.describe(), other.describe()).into()
    }

    fn describe(&self) -> String {
        match self {
            InformationLoss::Scalar { metric, .. } => metric.to_string(),
            InformationLoss::MultiDimensional { metric, aggregate, values } =>
                format!("{} ({:?} of {} attributes)", metric, aggregate, values.len()),
        }
    }

    /// Strict total order of losses of the same metric.
    pub fn compare_to(&self, other: &InformationLoss) -> Result<Ordering> {
        match (self, other) {
            (InformationLoss::Scalar { metric: left, value: lhs },
                InformationLoss::Scalar { metric: right, value: rhs }) if left == right =>
                Ok(n64(*lhs).cmp(&n64(*rhs))),

            (InformationLoss::MultiDimensional { metric: left, aggregate, values: lhs },
                InformationLoss::MultiDimensional { metric: right, aggregate: other_aggregate, values: rhs })
            if left == right && aggregate == other_aggregate && lhs.len() == rhs.len() =>
                Ok(match aggregate {
                    // largest component first, then the next largest
                    AggregateFunction::Rank => {
                        let descending = |values: &[f64]| values.iter()
                            .map(|value| n64(*value))
                            .sorted_by(|l, r| r.cmp(l))
                            .collect::<Vec<_>>();
                        descending(lhs).cmp(&descending(rhs))
                    }
                    _ => n64(aggregate.aggregate(lhs)).cmp(&n64(aggregate.aggregate(rhs)))
                }),

            _ => Err(self.incomparable(other))
        }
    }

    fn combine(&self, other: &InformationLoss, pick: fn(f64, f64) -> f64) -> Result<InformationLoss> {
        match (self, other) {
            (InformationLoss::Scalar { metric: left, value: lhs },
                InformationLoss::Scalar { metric: right, value: rhs }) if left == right =>
                Ok(InformationLoss::scalar(*left, pick(*lhs, *rhs))),

            (InformationLoss::MultiDimensional { metric: left, aggregate, values: lhs },
                InformationLoss::MultiDimensional { metric: right, aggregate: other_aggregate, values: rhs })
            if left == right && aggregate == other_aggregate && lhs.len() == rhs.len() =>
                Ok(InformationLoss::multi_dimensional(*left, *aggregate, lhs.iter().zip(rhs.iter())
                    .map(|(l, r)| pick(*l, *r))
                    .collect())),

            _ => Err(self.incomparable(other))
        }
    }

    /// Componentwise minimum.
    pub fn min(&self, other: &InformationLoss) -> Result<InformationLoss> {
        self.combine(other, f64::min)
    }

    /// Componentwise maximum.
    pub fn max(&self, other: &InformationLoss) -> Result<InformationLoss> {
        self.combine(other, f64::max)
    }

    /// Position of the loss between a minimum and a maximum, in [0, 1].
    pub fn relative_to(&self, min: &InformationLoss, max: &InformationLoss) -> Result<f64> {
        // checks that all three are comparable
        self.compare_to(min)?;
        self.compare_to(max)?;

        let (value, lower, upper) = (self.value(), min.value(), max.value());
        if upper == lower {
            return Ok(0.);
        }
        Ok(num::clamp((value - lower) / (upper - lower), 0., 1.))
    }
}

impl fmt::Display for InformationLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InformationLoss::Scalar { metric, value } => write!(f, "{} {}", metric, value),
            InformationLoss::MultiDimensional { metric, aggregate, values } =>
                write!(f, "{} {} {:?}", metric, aggregate.aggregate(values), values),
        }
    }
}


#[cfg(test)]
mod test_information_loss {
    use std::cmp::Ordering;

    use kanon_validator::config::AggregateFunction;

    use crate::metrics::InformationLoss;

    #[test]
    fn test_scalar_order() {
        let low = InformationLoss::scalar("discernibility", 29.);
        let high = InformationLoss::scalar("discernibility", 81.);
        assert_eq!(low.compare_to(&high).unwrap(), Ordering::Less);
        assert_eq!(high.min(&low).unwrap(), low);
        assert_eq!(low.max(&high).unwrap(), high);
        assert!((InformationLoss::scalar("discernibility", 55.).relative_to(&low, &high).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rank_order() {
        let rank = |values: Vec<f64>| InformationLoss::multi_dimensional("precision", AggregateFunction::Rank, values);
        // equal sums, but the largest component decides
        assert_eq!(rank(vec![0.5, 0.5]).compare_to(&rank(vec![0.9, 0.1])).unwrap(), Ordering::Less);
        assert_eq!(rank(vec![0.1, 0.9]).compare_to(&rank(vec![0.9, 0.1])).unwrap(), Ordering::Equal);

        let sum = |values: Vec<f64>| InformationLoss::multi_dimensional("precision", AggregateFunction::Sum, values);
        assert_eq!(sum(vec![0.5, 0.5]).compare_to(&sum(vec![0.9, 0.1])).unwrap(), Ordering::Equal);
        assert_eq!(sum(vec![0.5, 0.2]).min(&sum(vec![0.1, 0.9])).unwrap(), sum(vec![0.1, 0.2]));
    }

    #[test]
    fn test_incomparable() {
        let entropy = InformationLoss::multi_dimensional("entropy", AggregateFunction::Sum, vec![1.]);
        let discernibility = InformationLoss::scalar("discernibility", 1.);
        assert!(entropy.compare_to(&discernibility).is_err());
        assert!(entropy.min(&discernibility).is_err());

        let maximum = InformationLoss::multi_dimensional("entropy", AggregateFunction::Maximum, vec![1.]);
        assert!(entropy.compare_to(&maximum).is_err());
    }

    #[test]
    fn test_relative_to_degenerate_range() {
        let loss = InformationLoss::scalar("height", 3.);
        assert_eq!(loss.relative_to(&loss, &loss).unwrap(), 0.);
    }
}
