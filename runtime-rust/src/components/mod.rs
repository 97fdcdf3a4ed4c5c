//! Privacy criterion evaluation
//!
//! Each privacy model of the validator is bound to the data manager once per anonymization,
//! precomputing what its evaluation needs: global distributions, derived class sizes, domain shares.
//!
//! Most models decide class by class whether a class may be released, and implement [`ClassCriterion`].
//! Models defined on the whole sample implement [`SampleCriterion`], and suppress further classes
//! until they hold.
//!
//! Implementations of the Bind trait are distributed among the module files.

use kanon_validator::errors::*;

use std::fmt::Debug;

use kanon_validator::base::{EncodedDataset, Transformation};
use kanon_validator::components::{Criterion, PrivacyModel};
use kanon_validator::Code;

use crate::base::{DataManager, Distribution};
use crate::groupify::{GroupifyEntry, HashGroupify};

pub mod average_reidentification_risk;
pub mod d_presence;
pub mod distinct_l_diversity;
pub mod ed_differential_privacy;
pub mod entropy_l_diversity;
pub mod equal_distance_t_closeness;
pub mod hierarchical_distance_t_closeness;
pub mod inclusion;
pub mod k_anonymity;
pub mod k_map;
pub mod ordered_distance_t_closeness;
pub mod profitability;
pub mod recursive_cl_diversity;

/// Decides whether a class may be released.
pub trait ClassCriterion: Debug + Send + Sync {
    fn is_anonymous(&self, transformation: &Transformation, key: &[Code], entry: &GroupifyEntry) -> bool;
}

/// Holds on the whole set of released classes.
pub trait SampleCriterion: Debug + Send + Sync {
    /// Suppress classes until the criterion holds. Returns false if it cannot hold.
    fn enforce(&self, groupify: &mut HashGroupify) -> bool;
}

/// Evaluation state of a privacy model.
#[derive(Debug)]
pub enum Binding {
    Class(Box<dyn ClassCriterion>),
    Sample(Box<dyn SampleCriterion>),
    /// Only restricts the research subset.
    Subset,
}

/// Privacy models that can be bound to a data manager.
pub trait Bind {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding>;
}

impl Bind for PrivacyModel {
    fn bind(&self, dataset: &EncodedDataset, manager: &DataManager) -> Result<Binding> {
        macro_rules! bind {
            ($( $variant:ident ),*) => {
                {
                    $(
                       if let PrivacyModel::$variant(x) = self {
                            return x.bind(dataset, manager)
                                .chain_err(|| format!("privacy model: {}", self.summarize()))
                       }
                    )*
                }
            }
        }

        bind!(
            KAnonymity, DistinctLDiversity, EntropyLDiversity, RecursiveCLDiversity,
            EqualDistanceTCloseness, HierarchicalDistanceTCloseness, OrderedDistanceTCloseness,
            DPresence, KMap, Inclusion, AverageReidentificationRisk,
            ProfitabilityProsecutor, ProfitabilityJournalist, EdDifferentialPrivacy
        );

        Err(format!("privacy model not implemented: {:?}", self).into())
    }
}


/// All privacy models of an anonymization, bound to its data manager.
#[derive(Debug)]
pub struct Criteria {
    class: Vec<Box<dyn ClassCriterion>>,
    sample: Vec<Box<dyn SampleCriterion>>,
    monotonic_with_generalization: bool,
    monotonic_with_suppression: bool,
}

impl Criteria {
    pub fn build(models: &[PrivacyModel], dataset: &EncodedDataset, manager: &DataManager) -> Result<Criteria> {
        let mut criteria = Criteria {
            class: Vec::new(),
            sample: Vec::new(),
            monotonic_with_generalization: models.iter().all(|model| model.is_monotonic_with_generalization()),
            monotonic_with_suppression: models.iter().all(|model| model.is_monotonic_with_suppression()),
        };
        for model in models {
            match model.bind(dataset, manager)? {
                Binding::Class(criterion) => criteria.class.push(criterion),
                Binding::Sample(criterion) => criteria.sample.push(criterion),
                Binding::Subset => ()
            }
        }
        Ok(criteria)
    }

    /// If a node satisfies the criteria, so does every generalization of it.
    ///
    /// With a suppression limit of zero, only monotonicity with generalization is required.
    pub fn is_monotonic(&self, suppression: bool) -> bool {
        if suppression {
            self.monotonic_with_suppression
        } else {
            self.monotonic_with_generalization
        }
    }

    /// Flag every class with rows of the research subset which violates a class criterion.
    pub fn flag_outliers(&self, transformation: &Transformation, groupify: &mut HashGroupify) {
        let flags = groupify.entries().iter()
            .map(|entry| entry.count == 0 || self.is_anonymous(transformation, groupify.key(entry), entry))
            .collect::<Vec<bool>>();
        groupify.entries_mut().iter_mut().zip(flags)
            .for_each(|(entry, flag)| entry.is_not_outlier = flag);
    }

    /// Whether a class satisfies every class criterion.
    pub fn is_anonymous(&self, transformation: &Transformation, key: &[Code], entry: &GroupifyEntry) -> bool {
        self.class.iter().all(|criterion| criterion.is_anonymous(transformation, key, entry))
    }

    /// Enforce every sample criterion, in order.
    pub fn enforce(&self, groupify: &mut HashGroupify) -> bool {
        self.sample.iter().all(|criterion| criterion.enforce(groupify))
    }
}


/// Distribution of the sensitive attribute protected by a model, as a position among the sensitive attributes.
pub fn sensitive_index(dataset: &EncodedDataset, manager: &DataManager, attribute: &str) -> Result<usize> {
    let column = dataset.column_index(attribute)
        .ok_or_else(|| Error::from(format!("attribute {} does not exist", attribute)))?;
    manager.sensitive_index(column)
}

/// Global distribution of a sensitive attribute as codes and relative frequencies.
pub fn probabilities(distribution: &Distribution) -> (Vec<Code>, Vec<f64>) {
    let total = distribution.values().sum::<usize>().max(1) as f64;
    distribution.iter()
        .map(|(code, frequency)| (*code, *frequency as f64 / total))
        .unzip()
}
