use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::DistinctLDiversity;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::{Bind, Binding, ClassCriterion, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for DistinctLDiversity {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(DistinctValues {
            index: sensitive_index(dataset, manager, &self.attribute)?,
            l: self.l,
        })))
    }
}

#[derive(Clone, Debug)]
pub struct DistinctValues {
    index: usize,
    l: usize,
}

impl ClassCriterion for DistinctValues {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        entry.distributions[self.index].len() >= self.l
    }
}
