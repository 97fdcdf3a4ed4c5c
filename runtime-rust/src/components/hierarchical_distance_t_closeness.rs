use kanon_validator::errors::*;

use indexmap::IndexMap;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::HierarchicalDistanceTCloseness;
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::components::{Bind, Binding, ClassCriterion, probabilities, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for HierarchicalDistanceTCloseness {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(HierarchicalDistance::new(self, dataset, manager)?)))
    }
}

/// Earth mover's distance with the height of the lowest common ancestor in the hierarchy of the attribute as ground distance.
#[derive(Clone, Debug)]
pub struct HierarchicalDistance {
    index: usize,
    t: f64,
    height: usize,
    codes: Vec<Code>,
    global: Vec<f64>,
    /// Generalization of each value at every level.
    paths: Vec<Vec<Code>>,
}

impl HierarchicalDistance {
    pub fn new(model: &HierarchicalDistanceTCloseness, dataset: &EncodedDataset, manager: &DataManager) -> Result<Self> {
        let index = sensitive_index(dataset, manager, &model.attribute)?;
        let hierarchy = dataset.hierarchy(manager.sensitive_columns[index])?;
        let (codes, global) = probabilities(&manager.distributions[index]);
        let paths = codes.iter()
            .map(|code| (0..hierarchy.height() as u32).map(|level| hierarchy.generalize(*code, level)).collect())
            .collect();

        Ok(HierarchicalDistance {
            index,
            t: model.t,
            height: hierarchy.height(),
            codes,
            global,
            paths,
        })
    }

    /// Mass moves up the hierarchy until it can be matched with missing mass below the same node.
    /// Matching below a node of level `h` costs `h / (height - 1)` per unit.
    pub fn distance(&self, distribution: &Distribution, count: usize) -> f64 {
        let extra = self.codes.iter().zip(self.global.iter())
            .map(|(code, global)| distribution.get(code).cloned().unwrap_or(0) as f64 / count as f64 - global)
            .collect::<Vec<f64>>();

        let mut cost = 0.;
        for level in 1..self.height {
            // net extra of every node of the level below
            let mut children = IndexMap::<Code, (Code, f64)>::new();
            for (path, extra) in self.paths.iter().zip(extra.iter()) {
                children.entry(path[level - 1]).or_insert((path[level], 0.)).1 += extra;
            }

            let mut parents = IndexMap::<Code, (f64, f64)>::new();
            for (parent, extra) in children.values() {
                let (positive, negative) = parents.entry(*parent).or_insert((0., 0.));
                if *extra > 0. { *positive += extra } else { *negative -= extra }
            }

            cost += level as f64 / (self.height - 1) as f64 * parents.values()
                .map(|(positive, negative)| positive.min(*negative))
                .sum::<f64>();
        }
        cost
    }
}

impl ClassCriterion for HierarchicalDistance {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        self.distance(&entry.distributions[self.index], entry.count) <= self.t + 1e-12
    }
}


#[cfg(test)]
mod test_hierarchical_distance {
    use kanon_validator::base::Transformation;
    use kanon_validator::components::HierarchicalDistanceTCloseness;

    use crate::base::DataManager;
    use crate::base::test_data::diseases;
    use crate::components::ClassCriterion;
    use crate::components::hierarchical_distance_t_closeness::HierarchicalDistance;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_tree_distance() {
        let dataset = diseases(&[&["A", "flu"], &["A", "flu"], &["A", "cancer"], &["B", "gastritis"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let node = Transformation::new(vec![0]);
        let groupify = HashGroupify::build(&node, &manager);
        let (a, b) = (&groupify.entries()[0], &groupify.entries()[1]);

        let model = |t: f64| HierarchicalDistanceTCloseness { attribute: "disease".to_string(), t };
        let criterion = HierarchicalDistance::new(&model(5. / 24.), &dataset, &manager).unwrap();
        // 1/12 moves from cancer to gastritis below "other" at cost 1/2,
        // 1/6 moves from flu to gastritis below the root at cost 1
        assert!((criterion.distance(&a.distributions[0], a.count) - 5. / 24.).abs() < 1e-12);
        // 1/4 within "other" at cost 1/2, 1/2 across the root
        assert!((criterion.distance(&b.distributions[0], b.count) - 5. / 8.).abs() < 1e-12);

        assert!(criterion.is_anonymous(&node, groupify.key(a), a));
        assert!(!criterion.is_anonymous(&node, groupify.key(b), b));

        let stricter = HierarchicalDistance::new(&model(0.2), &dataset, &manager).unwrap();
        assert!(!stricter.is_anonymous(&node, groupify.key(a), a));
    }
}
