use crate::errors::*;

use indexmap::{IndexMap, IndexSet};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Code, RowIndex};

/// Role of an attribute during anonymization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Directly identifies an individual. Removed from the output.
    Identifying,
    /// May identify an individual in combination with others. Generalized.
    QuasiIdentifying,
    /// Protected by l-diversity, t-closeness and similar models. Kept as is.
    Sensitive,
    /// Kept as is.
    Insensitive,
}

/// Declared type, and optional hierarchy, of one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    /// Rows of `[value, level 1, level 2, ...]`.
    #[serde(default)]
    pub hierarchy: Option<Vec<Vec<String>>>,
}

impl AttributeDefinition {
    pub fn new(name: &str, attribute_type: AttributeType) -> Self {
        AttributeDefinition { name: name.to_string(), attribute_type, hierarchy: None }
    }

    pub fn quasi_identifying<S: Into<String>>(name: &str, hierarchy: Vec<Vec<S>>) -> Self {
        AttributeDefinition {
            name: name.to_string(),
            attribute_type: AttributeType::QuasiIdentifying,
            hierarchy: Some(hierarchy.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect()),
        }
    }

    pub fn with_hierarchy<S: Into<String>>(mut self, hierarchy: Vec<Vec<S>>) -> Self {
        self.hierarchy = Some(hierarchy.into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect());
        self
    }
}

/// Attribute types and hierarchies of a dataset.
///
/// Columns that are not listed are treated as insensitive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDefinition {
    pub attributes: Vec<AttributeDefinition>,
}

impl DataDefinition {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn attribute_type(&self, name: &str) -> AttributeType {
        self.attribute(name)
            .map(|attribute| attribute.attribute_type)
            .unwrap_or(AttributeType::Insensitive)
    }
}


/// Bidirectional mapping between the strings of a column and their integer codes.
///
/// The code of a value is its insertion index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    values: IndexSet<String>,
    finalized: bool,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Return the code of a value, assigning the next free code to unseen values.
    pub fn register(&mut self, value: &str) -> Result<Code> {
        if let Some(code) = self.values.get_index_of(value) {
            return Ok(code as Code);
        }
        if self.finalized {
            bail!("dictionary is finalized, cannot register value {:?}", value)
        }
        let (code, _) = self.values.insert_full(value.to_string());
        Ok(code as Code)
    }

    pub fn code(&self, value: &str) -> Option<Code> {
        self.values.get_index_of(value).map(|code| code as Code)
    }

    pub fn value(&self, code: Code) -> Option<&str> {
        self.values.get_index(code as usize).map(String::as_str)
    }

    /// Freeze the mapping. No new value may be registered afterwards.
    pub fn finalize(&mut self) {
        self.values.shrink_to_fit();
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}


/// Marks codes of a hierarchy that never occur as an input value.
pub const NO_CODE: Code = Code::MAX;

/// Generalization hierarchy of one attribute, encoded in the column's dictionary space.
///
/// `map[[input_code, level]]` is the generalized code of `input_code` at `level`.
/// Level 0 is the identity.
/// Rows of codes which only occur as generalized values are filled with [`NO_CODE`].
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
    pub map: Array2<Code>,
    /// Number of input values.
    domain_size: usize,
}

impl Hierarchy {
    pub fn new(map: Array2<Code>) -> Self {
        let domain_size = map.column(0).iter().filter(|code| **code != NO_CODE).count();
        Hierarchy { map, domain_size }
    }

    /// Number of levels, including the identity level.
    pub fn height(&self) -> usize {
        self.map.ncols()
    }

    #[inline]
    pub fn generalize(&self, code: Code, level: u32) -> Code {
        self.map[[code as usize, level as usize]]
    }

    pub fn domain_size(&self) -> usize {
        self.domain_size
    }

    /// Input codes of the hierarchy, in code order.
    pub fn leaves(&self) -> Vec<Code> {
        self.map.column(0).iter()
            .filter(|code| **code != NO_CODE)
            .cloned()
            .collect()
    }

    /// Number of input values generalized to each code at a level.
    pub fn leaf_counts(&self, level: u32) -> IndexMap<Code, usize> {
        let mut counts = IndexMap::new();
        self.leaves().into_iter().for_each(|leaf|
            *counts.entry(self.generalize(leaf, level)).or_insert(0) += 1);
        counts
    }

    /// Check that every input value is generalized to exactly one value per level,
    /// and that values merged at one level stay merged at every higher level.
    pub fn check_absorption(&self) -> std::result::Result<(), String> {
        for level in 0..self.height().saturating_sub(1) {
            let mut parents = IndexMap::<Code, Code>::new();
            for leaf in self.leaves() {
                let child = self.generalize(leaf, level as u32);
                let parent = self.generalize(leaf, level as u32 + 1);
                match parents.insert(child, parent) {
                    Some(previous) if previous != parent => return Err(format!(
                        "code {} at level {} is generalized to both {} and {} at level {}",
                        child, level, previous, parent, level + 1)),
                    _ => ()
                }
            }
        }
        Ok(())
    }
}


/// One point of the generalization lattice: a generalization level per quasi-identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transformation {
    levels: Vec<u32>,
}

impl Transformation {
    pub fn new(levels: Vec<u32>) -> Self {
        Transformation { levels }
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn dimensions(&self) -> usize {
        self.levels.len()
    }

    /// Sum of all generalization levels.
    pub fn level(&self) -> u32 {
        self.levels.iter().sum()
    }

    /// True if every coordinate is at least as generalized as the one of `other`.
    pub fn is_generalization_of(&self, other: &Transformation) -> bool {
        self.levels.len() == other.levels.len() &&
            self.levels.iter().zip(other.levels.iter()).all(|(l, r)| l >= r)
    }

    /// Deterministic preference among equally good transformations:
    /// lower total level first, then the lexicographically smaller vector.
    pub fn cmp_preference(&self, other: &Transformation) -> std::cmp::Ordering {
        self.level().cmp(&other.level()).then_with(|| self.levels.cmp(&other.levels))
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.levels.iter().map(u32::to_string).collect::<Vec<_>>().join(", "))
    }
}

impl From<Vec<u32>> for Transformation {
    fn from(levels: Vec<u32>) -> Self {
        Transformation::new(levels)
    }
}


/// Result of encoding a table of strings.
///
/// Immutable once built; shared read-only by every node check.
#[derive(Clone, Debug)]
pub struct EncodedDataset {
    pub header: Vec<String>,
    pub attribute_types: Vec<AttributeType>,
    /// One finalized dictionary per column.
    pub dictionaries: Vec<Dictionary>,
    /// `rows x columns` codes.
    pub matrix: Array2<Code>,
    /// Hierarchies by column index. Present for every quasi-identifier.
    pub hierarchies: IndexMap<usize, Hierarchy>,
    /// Rank of each code of a sensitive column in the natural order of its values.
    pub orders: IndexMap<usize, Vec<usize>>,
}

impl EncodedDataset {
    pub fn num_records(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_columns(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    pub fn columns_of_type(&self, attribute_type: AttributeType) -> Vec<usize> {
        self.attribute_types.iter().enumerate()
            .filter(|(_, column_type)| **column_type == attribute_type)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn quasi_identifiers(&self) -> Vec<usize> {
        self.columns_of_type(AttributeType::QuasiIdentifying)
    }

    pub fn sensitive_attributes(&self) -> Vec<usize> {
        self.columns_of_type(AttributeType::Sensitive)
    }

    pub fn hierarchy(&self, column: usize) -> Result<&Hierarchy> {
        self.hierarchies.get(&column)
            .ok_or_else(|| ErrorKind::Hierarchy(
                self.header.get(column).cloned().unwrap_or_default(),
                "no hierarchy is defined".to_string()).into())
    }

    /// Heights of the quasi-identifier hierarchies, in column order.
    pub fn heights(&self) -> Result<Vec<u32>> {
        self.quasi_identifiers().into_iter()
            .map(|column| Ok(self.hierarchy(column)?.height() as u32))
            .collect()
    }

    pub fn value(&self, column: usize, code: Code) -> Option<&str> {
        self.dictionaries.get(column)?.value(code)
    }

    pub fn row(&self, row: RowIndex) -> Vec<&str> {
        (0..self.num_columns())
            .map(|column| self.value(column, self.matrix[[row, column]]).unwrap_or(""))
            .collect()
    }
}


#[cfg(test)]
mod test_base {
    use crate::base::{Dictionary, Hierarchy, Transformation, NO_CODE};
    use ndarray::arr2;

    #[test]
    fn test_dictionary_codes() {
        let mut dictionary = Dictionary::new();
        assert_eq!(dictionary.register("a").unwrap(), 0);
        assert_eq!(dictionary.register("b").unwrap(), 1);
        assert_eq!(dictionary.register("a").unwrap(), 0);
        dictionary.finalize();
        assert_eq!(dictionary.value(1), Some("b"));
        assert_eq!(dictionary.code("b"), Some(1));
        assert!(dictionary.register("a").is_ok());
        assert!(dictionary.register("c").is_err());
    }

    #[test]
    fn test_hierarchy_absorption() {
        // codes 0, 1 are leaves, 2 = "1*", 3 = "*"
        let valid = Hierarchy::new(arr2(&[
            [0, 2, 3],
            [1, 2, 3],
            [NO_CODE, NO_CODE, NO_CODE],
            [NO_CODE, NO_CODE, NO_CODE]]));
        assert!(valid.check_absorption().is_ok());
        assert_eq!(valid.domain_size(), 2);
        assert_eq!(valid.leaf_counts(1).get(&2), Some(&2));

        // merged at level 1, separated again at level 2
        let invalid = Hierarchy::new(arr2(&[
            [0, 2, 3],
            [1, 2, 4],
            [NO_CODE, NO_CODE, NO_CODE],
            [NO_CODE, NO_CODE, NO_CODE],
            [NO_CODE, NO_CODE, NO_CODE]]));
        assert!(invalid.check_absorption().is_err());
    }

    #[test]
    fn test_transformation_order() {
        let lower = Transformation::new(vec![0, 1]);
        let upper = Transformation::new(vec![1, 1]);
        assert!(upper.is_generalization_of(&lower));
        assert!(!lower.is_generalization_of(&upper));
        assert_eq!(upper.level(), 2);
        assert_eq!(lower.cmp_preference(&upper), std::cmp::Ordering::Less);
        assert_eq!(Transformation::new(vec![1, 0]).cmp_preference(&lower), std::cmp::Ordering::Greater);
    }
}
