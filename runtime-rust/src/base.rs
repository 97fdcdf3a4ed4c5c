use kanon_validator::errors::*;

use indexmap::IndexMap;
use ndarray::{Array2, Axis};

use kanon_validator::base::{EncodedDataset, Hierarchy};
use kanon_validator::{Code, RowIndex};

/// Frequencies of the values of one sensitive attribute.
pub type Distribution = IndexMap<Code, usize>;

/// Read-only view of an encoded dataset, split the way node checks consume it.
///
/// Shared by every node check of a search.
#[derive(Clone, Debug)]
pub struct DataManager {
    /// `rows x quasi-identifiers` input codes.
    pub data: Array2<Code>,
    /// Hierarchy of each quasi-identifier, in column order.
    pub hierarchies: Vec<Hierarchy>,
    /// Column index of each quasi-identifier in the dataset.
    pub quasi_identifiers: Vec<usize>,
    /// `rows x sensitive attributes` codes.
    pub sensitive: Array2<Code>,
    /// Column index of each sensitive attribute in the dataset.
    pub sensitive_columns: Vec<usize>,
    /// Distribution of each sensitive attribute over the research subset.
    pub distributions: Vec<Distribution>,
    /// Membership of each row in the research subset. `None` if every row belongs to it.
    subset: Option<Vec<bool>>,
    subset_size: usize,
    /// Index of each row in the encoded dataset.
    pub rows: Vec<RowIndex>,
}

impl DataManager {
    pub fn new(dataset: &EncodedDataset, subset: Option<&[RowIndex]>) -> Result<DataManager> {
        let quasi_identifiers = dataset.quasi_identifiers();
        let sensitive_columns = dataset.sensitive_attributes();

        let hierarchies = quasi_identifiers.iter()
            .map(|column| dataset.hierarchy(*column).map(Clone::clone))
            .collect::<Result<Vec<Hierarchy>>>()?;

        let membership = match subset {
            Some(subset) => {
                let mut membership = vec![false; dataset.num_records()];
                for row in subset {
                    *membership.get_mut(*row)
                        .ok_or_else(|| Error::from(format!("research subset refers to missing row {}", row)))? = true;
                }
                Some(membership)
            }
            None => None
        };

        let mut manager = DataManager {
            data: dataset.matrix.select(Axis(1), &quasi_identifiers),
            hierarchies,
            quasi_identifiers,
            sensitive: dataset.matrix.select(Axis(1), &sensitive_columns),
            sensitive_columns,
            distributions: Vec::new(),
            subset_size: membership.as_ref()
                .map(|membership| membership.iter().filter(|member| **member).count())
                .unwrap_or_else(|| dataset.num_records()),
            subset: membership,
            rows: (0..dataset.num_records()).collect(),
        };
        manager.distributions = manager.compute_distributions();
        Ok(manager)
    }

    fn compute_distributions(&self) -> Vec<Distribution> {
        (0..self.sensitive_columns.len())
            .map(|attribute| {
                let mut distribution = Distribution::new();
                (0..self.num_rows())
                    .filter(|row| self.is_in_subset(*row))
                    .for_each(|row| *distribution.entry(self.sensitive[[row, attribute]]).or_insert(0) += 1);
                distribution.sort_keys();
                distribution
            })
            .collect()
    }

    /// Manager over some of the rows, keeping the global distributions of the sensitive attributes.
    ///
    /// `rows` are indices into this manager.
    pub fn restrict(&self, rows: &[usize]) -> DataManager {
        let subset = self.subset.as_ref()
            .map(|membership| rows.iter().map(|row| membership[*row]).collect::<Vec<bool>>());
        DataManager {
            data: self.data.select(Axis(0), rows),
            hierarchies: self.hierarchies.clone(),
            quasi_identifiers: self.quasi_identifiers.clone(),
            sensitive: self.sensitive.select(Axis(0), rows),
            sensitive_columns: self.sensitive_columns.clone(),
            distributions: self.distributions.clone(),
            subset_size: subset.as_ref()
                .map(|membership| membership.iter().filter(|member| **member).count())
                .unwrap_or_else(|| rows.len()),
            subset,
            rows: rows.iter().map(|row| self.rows[*row]).collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_quasi_identifiers(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows in the research subset.
    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    pub fn has_subset(&self) -> bool {
        self.subset.is_some()
    }

    #[inline]
    pub fn is_in_subset(&self, row: usize) -> bool {
        self.subset.as_ref().map(|membership| membership[row]).unwrap_or(true)
    }

    pub fn heights(&self) -> Vec<u32> {
        self.hierarchies.iter().map(|hierarchy| hierarchy.height() as u32).collect()
    }

    /// Position of a sensitive column among the sensitive attributes.
    pub fn sensitive_index(&self, column: usize) -> Result<usize> {
        self.sensitive_columns.iter().position(|candidate| *candidate == column)
            .ok_or_else(|| format!("column {} is not sensitive", column).into())
    }

    /// Number of rows of the research subset holding each input code of a quasi-identifier.
    pub fn cardinalities(&self, dimension: usize) -> IndexMap<Code, usize> {
        let mut cardinalities = IndexMap::new();
        self.data.column(dimension).iter().enumerate()
            .filter(|(row, _)| self.is_in_subset(*row))
            .for_each(|(_, code)| *cardinalities.entry(*code).or_insert(0) += 1);
        cardinalities
    }
}
