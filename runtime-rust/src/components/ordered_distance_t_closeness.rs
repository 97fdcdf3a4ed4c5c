use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::OrderedDistanceTCloseness;
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::components::{Bind, Binding, ClassCriterion, probabilities, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for OrderedDistanceTCloseness {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(OrderedDistance::new(self, dataset, manager)?)))
    }
}

/// Earth mover's distance with the ground distance `|i - j| / (m - 1)` between the `i`-th and `j`-th of `m` ordered values.
#[derive(Clone, Debug)]
pub struct OrderedDistance {
    index: usize,
    t: f64,
    /// Values occurring in the research subset, in ascending order.
    codes: Vec<Code>,
    global: Vec<f64>,
}

impl OrderedDistance {
    pub fn new(model: &OrderedDistanceTCloseness, dataset: &EncodedDataset, manager: &DataManager) -> Result<Self> {
        let index = sensitive_index(dataset, manager, &model.attribute)?;
        let column = manager.sensitive_columns[index];
        let order = dataset.orders.get(&column)
            .ok_or_else(|| Error::from(format!("no order for attribute {}", model.attribute)))?;

        let (codes, global) = probabilities(&manager.distributions[index]);
        let rank = |code: &Code| order.get(*code as usize).cloned().unwrap_or(usize::MAX);
        let mut ordered = codes.into_iter().zip(global.into_iter()).collect::<Vec<_>>();
        ordered.sort_by_key(|(code, _)| rank(code));

        let (codes, global) = ordered.into_iter().unzip();
        Ok(OrderedDistance { index, t: model.t, codes, global })
    }

    pub fn distance(&self, distribution: &Distribution, count: usize) -> f64 {
        if self.codes.len() < 2 {
            return 0.;
        }
        let mut carried = 0.;
        let mut distance = 0.;
        for (code, global) in self.codes.iter().zip(self.global.iter()) {
            carried += distribution.get(code).cloned().unwrap_or(0) as f64 / count as f64 - global;
            distance += carried.abs();
        }
        distance / (self.codes.len() - 1) as f64
    }
}

impl ClassCriterion for OrderedDistance {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        self.distance(&entry.distributions[self.index], entry.count) <= self.t + 1e-12
    }
}


#[cfg(test)]
mod test_ordered_distance {
    use kanon_validator::base::Transformation;
    use kanon_validator::components::OrderedDistanceTCloseness;

    use crate::base::DataManager;
    use crate::base::test_data::salaries;
    use crate::components::ClassCriterion;
    use crate::components::ordered_distance_t_closeness::OrderedDistance;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_cumulative_distance() {
        // codes follow first occurrence, so the order comes from the values: 3000 < 4000 < 5000
        let dataset = salaries(&[&["A", "4000"], &["B", "5000"], &["A", "3000"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let node = Transformation::new(vec![0]);
        let groupify = HashGroupify::build(&node, &manager);
        let (a, b) = (&groupify.entries()[0], &groupify.entries()[1]);
        assert_eq!(a.count, 2);

        let model = |t: f64| OrderedDistanceTCloseness { attribute: "salary".to_string(), t };
        let criterion = OrderedDistance::new(&model(0.25), &dataset, &manager).unwrap();
        // {3000, 4000}: cumulative differences 1/6, 1/3, 0 over m - 1 = 2
        assert!((criterion.distance(&a.distributions[0], a.count) - 0.25).abs() < 1e-12);
        // {5000}: -1/3, -2/3, 0
        assert!((criterion.distance(&b.distributions[0], b.count) - 0.5).abs() < 1e-12);

        assert!(criterion.is_anonymous(&node, groupify.key(a), a));
        assert!(!criterion.is_anonymous(&node, groupify.key(b), b));

        let stricter = OrderedDistance::new(&model(0.24), &dataset, &manager).unwrap();
        assert!(!stricter.is_anonymous(&node, groupify.key(a), a));
    }

    #[test]
    fn test_single_value() {
        let dataset = salaries(&[&["A", "4000"], &["B", "4000"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let model = OrderedDistanceTCloseness { attribute: "salary".to_string(), t: 0. };
        let criterion = OrderedDistance::new(&model, &dataset, &manager).unwrap();

        let node = Transformation::new(vec![0]);
        let groupify = HashGroupify::build(&node, &manager);
        let entry = &groupify.entries()[0];
        assert_eq!(criterion.distance(&entry.distributions[0], entry.count), 0.);
        assert!(criterion.is_anonymous(&node, groupify.key(entry), entry));
    }
}
