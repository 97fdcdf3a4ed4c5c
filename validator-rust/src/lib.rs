//! Declarations and validation for the transformation search.
//!
//! This crate holds everything that can be decided before any equivalence class is built:
//! the string dictionaries and encoded data matrix, generalization hierarchies,
//! transformations, the privacy models and the information-loss metric definitions.
//! Every configuration error is reported here, before the runtime starts a search.

// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]
#[macro_use]
extern crate error_chain;

#[doc(hidden)]
pub mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types
    error_chain! {
        foreign_links {
            Json(::serde_json::Error);
            Shape(::ndarray::ShapeError);
        }

        errors {
            Configuration(message: String) {
                description("invalid configuration")
                display("invalid configuration: {}", message)
            }
            Hierarchy(attribute: String, message: String) {
                description("invalid generalization hierarchy")
                display("invalid hierarchy for attribute {}: {}", attribute, message)
            }
            IncomparableLoss(left: String, right: String) {
                description("information losses of different metrics are not comparable")
                display("cannot compare information loss of {} with information loss of {}", left, right)
            }
            NoResult {
                description("no anonymous transformation is available")
                display("no transformation satisfies the privacy models within the suppression limit")
            }
        }
    }
}

#[doc(hidden)]
pub use errors::*;

pub mod base;
pub mod components;
pub mod config;
pub mod utilities;

use crate::base::{DataDefinition, EncodedDataset};
use crate::config::AnonymizationConfig;

/// Index of a row in the encoded data matrix.
pub type RowIndex = usize;
/// Integer code of a value within a column dictionary.
pub type Code = u32;

/// Validate a configuration against an encoded dataset.
///
/// Checks that every privacy model refers to attributes of the right type,
/// that research subsets are consistent, that metric weights and static loss tables are complete,
/// and that numeric parameters are in range.
///
/// Useful for failing fast before a search is started.
/// The runtime calls this on every anonymization request.
pub fn validate_configuration(
    dataset: &EncodedDataset,
    config: &AnonymizationConfig,
) -> Result<()> {
    utilities::validate_configuration(dataset, config)
}

/// Encode string rows into an integer matrix, following the attribute types and hierarchies of the definition.
///
/// # Example
/// ```
/// use kanon_validator::base::{AttributeDefinition, AttributeType, DataDefinition};
/// use kanon_validator::encode_dataset;
///
/// let header = vec!["zip".to_string(), "disease".to_string()];
/// let rows = vec![
///     vec!["47677".to_string(), "flu".to_string()],
///     vec!["47602".to_string(), "cancer".to_string()],
/// ];
/// let definition = DataDefinition {
///     attributes: vec![
///         AttributeDefinition::quasi_identifying("zip", vec![
///             vec!["47677", "476**", "*"], vec!["47602", "476**", "*"]]),
///         AttributeDefinition::new("disease", AttributeType::Sensitive),
///     ]
/// };
/// let dataset = encode_dataset(&header, &rows, &definition).unwrap();
/// assert_eq!(dataset.num_records(), 2);
/// ```
pub fn encode_dataset(
    header: &[String],
    rows: &[Vec<String>],
    definition: &DataDefinition,
) -> Result<EncodedDataset> {
    utilities::encoding::encode(header, rows, definition)
}
