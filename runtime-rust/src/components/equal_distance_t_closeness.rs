use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::EqualDistanceTCloseness;
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::components::{Bind, Binding, ClassCriterion, probabilities, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for EqualDistanceTCloseness {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(EqualDistance::new(self, dataset, manager)?)))
    }
}

/// Earth mover's distance with a ground distance of 1 between any two values.
#[derive(Clone, Debug)]
pub struct EqualDistance {
    index: usize,
    t: f64,
    codes: Vec<Code>,
    global: Vec<f64>,
}

impl EqualDistance {
    pub fn new(model: &EqualDistanceTCloseness, dataset: &EncodedDataset, manager: &DataManager) -> Result<Self> {
        let index = sensitive_index(dataset, manager, &model.attribute)?;
        let (codes, global) = probabilities(&manager.distributions[index]);
        Ok(EqualDistance { index, t: model.t, codes, global })
    }

    /// Half the total variation between the class and the global distribution.
    pub fn distance(&self, distribution: &Distribution, count: usize) -> f64 {
        self.codes.iter().zip(self.global.iter())
            .map(|(code, global)| {
                let local = distribution.get(code).cloned().unwrap_or(0) as f64 / count as f64;
                (local - global).abs()
            })
            .sum::<f64>() / 2.
    }
}

impl ClassCriterion for EqualDistance {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        self.distance(&entry.distributions[self.index], entry.count) <= self.t + 1e-12
    }
}


#[cfg(test)]
mod test_equal_distance {
    use kanon_validator::base::Transformation;
    use kanon_validator::components::EqualDistanceTCloseness;

    use crate::base::DataManager;
    use crate::base::test_data::diseases;
    use crate::components::ClassCriterion;
    use crate::components::equal_distance_t_closeness::EqualDistance;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_variational_distance() {
        // globally flu 1/2, cancer 1/4, gastritis 1/4
        let dataset = diseases(&[&["A", "flu"], &["A", "flu"], &["A", "cancer"], &["B", "gastritis"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let node = Transformation::new(vec![0]);
        let groupify = HashGroupify::build(&node, &manager);
        let (a, b) = (&groupify.entries()[0], &groupify.entries()[1]);

        let model = |t: f64| EqualDistanceTCloseness { attribute: "disease".to_string(), t };
        let criterion = EqualDistance::new(&model(0.25), &dataset, &manager).unwrap();
        // (1/6 + 1/12 + 1/4) / 2
        assert!((criterion.distance(&a.distributions[0], a.count) - 0.25).abs() < 1e-12);
        // (1/2 + 1/4 + 3/4) / 2
        assert!((criterion.distance(&b.distributions[0], b.count) - 0.75).abs() < 1e-12);

        assert!(criterion.is_anonymous(&node, groupify.key(a), a));
        assert!(!criterion.is_anonymous(&node, groupify.key(b), b));

        let stricter = EqualDistance::new(&model(0.24), &dataset, &manager).unwrap();
        assert!(!stricter.is_anonymous(&node, groupify.key(a), a));

        // the class of all rows has the global distribution
        let top = Transformation::new(vec![1]);
        let groupify = HashGroupify::build(&top, &manager);
        let all = &groupify.entries()[0];
        assert!(criterion.distance(&all.distributions[0], all.count).abs() < 1e-12);
    }
}
