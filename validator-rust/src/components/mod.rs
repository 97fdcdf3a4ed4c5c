//! Privacy model definitions
//!
//! Each privacy model is a small parameter struct, bound at configuration time.
//! There is a set of properties each model reports through the [`Criterion`] trait:
//! parameter validation against the encoded dataset, monotonicity, and the research subset it depends on.
//!
//! The evaluation of each model against equivalence classes lives in the runtime crate.

use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::base::{AttributeType, EncodedDataset};
use crate::RowIndex;

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

pub use self::average_reidentification_risk::AverageReidentificationRisk;
pub use self::d_presence::DPresence;
pub use self::distinct_l_diversity::DistinctLDiversity;
pub use self::ed_differential_privacy::EdDifferentialPrivacy;
pub use self::entropy_l_diversity::{EntropyEstimator, EntropyLDiversity};
pub use self::equal_distance_t_closeness::EqualDistanceTCloseness;
pub use self::hierarchical_distance_t_closeness::HierarchicalDistanceTCloseness;
pub use self::inclusion::Inclusion;
pub use self::k_anonymity::KAnonymity;
pub use self::k_map::{EstimatorModel, KMap, PopulationEstimator};
pub use self::ordered_distance_t_closeness::OrderedDistanceTCloseness;
pub use self::profitability::{CostBenefitConfiguration, ProfitabilityJournalist, ProfitabilityProsecutor, ProfitabilityVariant};
pub use self::recursive_cl_diversity::RecursiveCLDiversity;


/// Static properties of a privacy model.
pub trait Criterion {
    /// Check the parameters of the model against the dataset.
    fn validate(&self, dataset: &EncodedDataset) -> Result<()>;

    /// If every class of a transformation satisfies the model,
    /// every class of every generalization of it does too.
    fn is_monotonic_with_generalization(&self) -> bool;

    /// If a transformation satisfies the model with suppression,
    /// every generalization of it does too.
    fn is_monotonic_with_suppression(&self) -> bool;

    /// Evaluated on the whole set of classes rather than class by class.
    fn is_sample_based(&self) -> bool {
        false
    }

    /// Rows of the research subset, for models defined relative to one.
    fn research_subset(&self) -> Option<&[RowIndex]> {
        None
    }

    /// Name of the sensitive attribute protected by the model.
    fn sensitive_attribute(&self) -> Option<&str> {
        None
    }

    /// Short human readable description, used in logs and reports.
    fn summarize(&self) -> String;
}


/// All supported privacy models, tagged by `type` in serialized configurations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrivacyModel {
    KAnonymity(KAnonymity),
    DistinctLDiversity(DistinctLDiversity),
    EntropyLDiversity(EntropyLDiversity),
    #[serde(rename = "recursive_cl_diversity")]
    RecursiveCLDiversity(RecursiveCLDiversity),
    EqualDistanceTCloseness(EqualDistanceTCloseness),
    HierarchicalDistanceTCloseness(HierarchicalDistanceTCloseness),
    OrderedDistanceTCloseness(OrderedDistanceTCloseness),
    DPresence(DPresence),
    KMap(KMap),
    Inclusion(Inclusion),
    AverageReidentificationRisk(AverageReidentificationRisk),
    ProfitabilityProsecutor(ProfitabilityProsecutor),
    ProfitabilityJournalist(ProfitabilityJournalist),
    EdDifferentialPrivacy(EdDifferentialPrivacy),
}

// delegate a method to the model held by each variant
macro_rules! delegate {
    ($self:ident, $model:ident => $call:expr) => {
        match $self {
            PrivacyModel::KAnonymity($model) => $call,
            PrivacyModel::DistinctLDiversity($model) => $call,
            PrivacyModel::EntropyLDiversity($model) => $call,
            PrivacyModel::RecursiveCLDiversity($model) => $call,
            PrivacyModel::EqualDistanceTCloseness($model) => $call,
            PrivacyModel::HierarchicalDistanceTCloseness($model) => $call,
            PrivacyModel::OrderedDistanceTCloseness($model) => $call,
            PrivacyModel::DPresence($model) => $call,
            PrivacyModel::KMap($model) => $call,
            PrivacyModel::Inclusion($model) => $call,
            PrivacyModel::AverageReidentificationRisk($model) => $call,
            PrivacyModel::ProfitabilityProsecutor($model) => $call,
            PrivacyModel::ProfitabilityJournalist($model) => $call,
            PrivacyModel::EdDifferentialPrivacy($model) => $call,
        }
    }
}

impl Criterion for PrivacyModel {
    fn validate(&self, dataset: &EncodedDataset) -> Result<()> {
        delegate!(self, model => model.validate(dataset)
            .chain_err(|| format!("privacy model {}", model.summarize())))
    }

    fn is_monotonic_with_generalization(&self) -> bool {
        delegate!(self, model => model.is_monotonic_with_generalization())
    }

    fn is_monotonic_with_suppression(&self) -> bool {
        delegate!(self, model => model.is_monotonic_with_suppression())
    }

    fn is_sample_based(&self) -> bool {
        delegate!(self, model => model.is_sample_based())
    }

    fn research_subset(&self) -> Option<&[RowIndex]> {
        delegate!(self, model => model.research_subset())
    }

    fn sensitive_attribute(&self) -> Option<&str> {
        delegate!(self, model => model.sensitive_attribute())
    }

    fn summarize(&self) -> String {
        delegate!(self, model => model.summarize())
    }
}


/// Resolve the column of a sensitive attribute.
pub fn get_sensitive_column(dataset: &EncodedDataset, attribute: &str) -> Result<usize> {
    let column = dataset.column_index(attribute)
        .ok_or_else(|| Error::from(ErrorKind::Configuration(
            format!("attribute {} does not exist", attribute))))?;

    if dataset.attribute_types[column] != AttributeType::Sensitive {
        bail!(ErrorKind::Configuration(format!("attribute {} is not sensitive", attribute)))
    }
    Ok(column)
}

/// Check that a research subset is non-empty and refers to existing rows.
pub fn check_subset(dataset: &EncodedDataset, subset: &[RowIndex]) -> Result<()> {
    if subset.is_empty() {
        bail!(ErrorKind::Configuration("research subset must not be empty".to_string()))
    }
    if let Some(row) = subset.iter().find(|row| **row >= dataset.num_records()) {
        bail!(ErrorKind::Configuration(format!(
            "research subset refers to row {}, but the dataset has {} rows", row, dataset.num_records())))
    }
    Ok(())
}

/// Check that a parameter lies within a closed interval.
pub fn check_range(name: &str, value: f64, lower: f64, upper: f64) -> Result<()> {
    if !(value >= lower && value <= upper) {
        bail!(ErrorKind::Configuration(format!(
            "{}: {} must be within [{}, {}]", name, value, lower, upper)))
    }
    Ok(())
}
