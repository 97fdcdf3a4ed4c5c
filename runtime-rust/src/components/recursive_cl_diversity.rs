use kanon_validator::errors::*;

use itertools::Itertools;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::RecursiveCLDiversity;
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::components::{Bind, Binding, ClassCriterion, sensitive_index};
use crate::groupify::GroupifyEntry;

impl Bind for RecursiveCLDiversity {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Class(Box::new(RecursiveDiversity {
            index: sensitive_index(dataset, manager, &self.attribute)?,
            c: self.c,
            l: self.l,
        })))
    }
}

#[derive(Clone, Debug)]
pub struct RecursiveDiversity {
    index: usize,
    c: f64,
    l: usize,
}

/// With frequencies `r_1 >= r_2 >= ... >= r_m`, checks `r_1 < c * (r_l + ... + r_m)`.
pub fn is_recursive_diverse(distribution: &Distribution, c: f64, l: usize) -> bool {
    if distribution.len() < l || l == 0 {
        return false;
    }
    let frequencies = distribution.values().sorted_by(|left, right| right.cmp(left)).collect::<Vec<_>>();
    let tail = frequencies[l - 1..].iter().map(|frequency| **frequency).sum::<usize>();
    (*frequencies[0] as f64) < c * tail as f64
}

impl ClassCriterion for RecursiveDiversity {
    fn is_anonymous(&self, _transformation: &Transformation, _key: &[Code], entry: &GroupifyEntry) -> bool {
        is_recursive_diverse(&entry.distributions[self.index], self.c, self.l)
    }
}
