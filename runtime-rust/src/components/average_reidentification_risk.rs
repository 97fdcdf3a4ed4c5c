use kanon_validator::errors::*;

use kanon_validator::base::EncodedDataset;
use kanon_validator::components::AverageReidentificationRisk;

use crate::base::DataManager;
use crate::components::{Bind, Binding, SampleCriterion};
use crate::groupify::HashGroupify;

impl Bind for AverageReidentificationRisk {
    fn bind(&self, _dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Sample(Box::new(AverageRisk { risk: self.risk })))
    }
}

/// The average re-identification risk, released classes over released rows, is at most `risk`.
#[derive(Clone, Debug)]
pub struct AverageRisk {
    risk: f64,
}

impl SampleCriterion for AverageRisk {
    /// Suppress the smallest released classes first, as they contribute the highest risk.
    /// Ties go to the class found last, so that earlier classes are kept.
    fn enforce(&self, groupify: &mut HashGroupify) -> bool {
        let mut released = groupify.entries().iter().enumerate()
            .filter(|(_, entry)| entry.count > 0 && entry.is_not_outlier)
            .map(|(index, entry)| (entry.count, index))
            .collect::<Vec<(usize, usize)>>();
        released.sort_by(|(left, left_index), (right, right_index)|
            left.cmp(right).then(right_index.cmp(left_index)));

        let mut classes = released.len();
        let mut rows = released.iter().map(|(count, _)| count).sum::<usize>();
        for (count, index) in released {
            if rows == 0 || classes as f64 <= self.risk * rows as f64 {
                break;
            }
            groupify.entries_mut()[index].is_not_outlier = false;
            classes -= 1;
            rows -= count;
        }
        // an empty release carries no risk
        true
    }
}


#[cfg(test)]
mod test_average_reidentification_risk {
    use kanon_validator::base::Transformation;

    use crate::base::DataManager;
    use crate::base::test_data::letters;
    use crate::components::SampleCriterion;
    use crate::components::average_reidentification_risk::AverageRisk;
    use crate::groupify::HashGroupify;

    #[test]
    fn test_suppress_smallest() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["A", "1"], &["B", "2"], &["C", "3"]]);
        let manager = DataManager::new(&dataset, None).unwrap();
        let mut groupify = HashGroupify::build(&Transformation::new(vec![0, 0]), &manager);

        // three classes over five rows is 0.6. Suppressing C leaves 2 / 4, then B leaves 1 / 3
        AverageRisk { risk: 0.5 }.enforce(&mut groupify);
        assert_eq!(groupify.num_suppressed(), 1);
        assert!(!groupify.entries()[2].is_not_outlier);

        groupify.reset_outliers();
        AverageRisk { risk: 0.4 }.enforce(&mut groupify);
        assert_eq!(groupify.num_suppressed(), 2);
    }
}
