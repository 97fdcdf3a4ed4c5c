use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::KAnonymity;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::{Bind, Binding, ClassCriterion};
use crate::groupify::GroupifyEntry;

impl Bind for KAnonymity {
    fn bind(&self, _dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(MinimalClassSize { k: self.k })))
    }
}

/// Every released class holds at least `k` rows.
#[derive(Clone, Debug)]
pub struct MinimalClassSize {
    pub k: usize,
}

impl ClassCriterion for MinimalClassSize {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        entry.count >= self.k
    }
}


#[cfg(test)]
mod test_k_anonymity {
    use kanon_validator::base::Transformation;

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::components::ClassCriterion;
    use crate::components::k_anonymity::MinimalClassSize;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_counts_subset_rows() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["A", "1"], &["B", "2"], &["B", "2"]]);
        let node = Transformation::new(vec![0, 0]);
        let three = MinimalClassSize { k: 3 };

        let manager = DataManager::new(&dataset, None).unwrap();
        let groupify = HashGroupify::build(&node, &manager);
        let flags = groupify.entries().iter()
            .map(|entry| three.is_anonymous(&node, groupify.key(entry), entry))
            .collect::<Vec<bool>>();
        assert_eq!(flags, vec![true, false]);

        // three A rows in the population, two in the subset
        let manager = DataManager::new(&dataset, Some(&[0, 1, 3, 4])).unwrap();
        let groupify = HashGroupify::build(&node, &manager);
        let a = &groupify.entries()[0];
        assert_eq!(a.pcount, 3);
        assert!(!three.is_anonymous(&node, groupify.key(a), a));
        assert!(MinimalClassSize { k: 2 }.is_anonymous(&node, groupify.key(a), a));
    }
}
