use kanon_validator::errors::*;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::DPresence;
use kanon_validator::Code;

use crate::base::DataManager;
use crate::components::{Bind, Binding, ClassCriterion};
use crate::groupify::GroupifyEntry;

impl Bind for DPresence {
    fn bind(&self, _dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(PresenceBounds { d_min: self.d_min, d_max: self.d_max })))
    }
}

/// The probability that an individual of a class belongs to the research subset lies within `[d_min, d_max]`.
#[derive(Clone, Debug)]
pub struct PresenceBounds {
    d_min: f64,
    d_max: f64,
}

impl ClassCriterion for PresenceBounds {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        let presence = entry.count as f64 / entry.pcount as f64;
        presence >= self.d_min && presence <= self.d_max
    }
}
