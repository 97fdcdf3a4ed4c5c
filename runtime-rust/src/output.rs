//! Released data of a transformation
//!
//! Quasi-identifiers are replaced by their generalized values, suppressed rows show the suppression string
//! in every quasi-identifier, and identifying attributes are removed. When privacy models define a
//! research subset, only its rows are released.

use kanon_validator::errors::*;

use std::sync::Arc;

use ndarray::Array2;

use kanon_validator::base::{AttributeType, EncodedDataset, Transformation, NO_CODE};
use kanon_validator::config::AnonymizationConfig;
use kanon_validator::{Code, RowIndex};

use crate::algorithms::search;
use crate::checker::NodeChecker;
use crate::lattice::SolutionSpace;

#[derive(Clone, Debug)]
pub struct DataOutput<'a> {
    dataset: &'a EncodedDataset,
    transformation: Transformation,
    quasi_identifiers: Vec<usize>,
    /// Generalized quasi-identifier tuple of every row of the dataset.
    keys: Array2<Code>,
    suppressed: Vec<bool>,
    /// Released rows.
    rows: Vec<RowIndex>,
    suppression_string: String,
}

impl<'a> DataOutput<'a> {
    /// Generalize the rows checked by a checker over the whole dataset.
    pub fn new(
        dataset: &'a EncodedDataset,
        checker: &NodeChecker,
        transformation: &Transformation,
        suppression_string: &str,
    ) -> Result<DataOutput<'a>> {
        let manager = &checker.manager;
        if manager.num_rows() != dataset.num_records() {
            return Err("output requires a manager over every row".into());
        }

        let mut groupify = crate::groupify::HashGroupify::build(transformation, manager);
        checker.assess(transformation, &mut groupify);

        let mut keys = Array2::<Code>::zeros((manager.num_rows(), manager.num_quasi_identifiers()));
        let mut suppressed = vec![false; manager.num_rows()];
        for row in 0..manager.num_rows() {
            for (dimension, level) in transformation.levels().iter().enumerate() {
                keys[[row, dimension]] = manager.hierarchies[dimension].generalize(manager.data[[row, dimension]], *level);
            }
            let class = groupify.find(keys.row(row).as_slice().unwrap_or(&[]))
                .ok_or_else(|| Error::from(format!("row {} has no class", row)))?;
            suppressed[row] = !groupify.entries()[class].is_not_outlier;
        }

        Ok(DataOutput {
            dataset,
            transformation: transformation.clone(),
            quasi_identifiers: manager.quasi_identifiers.clone(),
            keys,
            suppressed,
            rows: (0..manager.num_rows()).filter(|row| manager.is_in_subset(*row)).collect(),
            suppression_string: suppression_string.to_string(),
        })
    }

    pub fn transformation(&self) -> &Transformation {
        &self.transformation
    }

    pub fn header(&self) -> &[String] {
        &self.dataset.header
    }

    /// Number of released rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Released rows whose quasi-identifiers are suppressed.
    pub fn num_suppressed(&self) -> usize {
        self.rows.iter().filter(|row| self.suppressed[**row]).count()
    }

    /// Whether the `row`-th released row is suppressed.
    pub fn is_suppressed(&self, row: usize) -> bool {
        self.rows.get(row).map(|row| self.suppressed[*row]).unwrap_or(false)
    }

    /// Value of a column in the `row`-th released row.
    pub fn value(&self, row: usize, column: usize) -> Result<&str> {
        let index = *self.rows.get(row)
            .ok_or_else(|| Error::from(format!("row {} is not released", row)))?;
        let attribute_type = *self.dataset.attribute_types.get(column)
            .ok_or_else(|| Error::from(format!("column {} does not exist", column)))?;

        let code = match attribute_type {
            AttributeType::Identifying => return Ok(&self.suppression_string),
            AttributeType::QuasiIdentifying => {
                if self.suppressed[index] {
                    return Ok(&self.suppression_string);
                }
                let dimension = self.quasi_identifiers.iter().position(|candidate| *candidate == column)
                    .ok_or_else(|| Error::from(format!("column {} is not a quasi-identifier", column)))?;
                self.keys[[index, dimension]]
            }
            AttributeType::Sensitive | AttributeType::Insensitive => self.dataset.matrix[[index, column]],
        };
        self.dataset.value(column, code)
            .ok_or_else(|| format!("no value for code {} of column {}", code, column).into())
    }

    pub fn row(&self, row: usize) -> Result<Vec<&str>> {
        (0..self.dataset.num_columns()).map(|column| self.value(row, column)).collect()
    }

    /// All released rows as strings.
    pub fn to_rows(&self) -> Result<Vec<Vec<String>>> {
        (0..self.num_rows())
            .map(|row| Ok(self.row(row)?.into_iter().map(str::to_string).collect()))
            .collect()
    }

    /// Keys as checked for privacy: suppressed rows share the all-[`NO_CODE`] key.
    fn released_keys(&self) -> Array2<Code> {
        let mut keys = self.keys.clone();
        for (row, suppressed) in self.suppressed.iter().enumerate() {
            if *suppressed {
                keys.row_mut(row).fill(NO_CODE);
            }
        }
        keys
    }

    /// Recode suppressed rows by searching a transformation for them alone.
    ///
    /// The combined output is checked against the privacy models, and rolled back if it violates any.
    /// Returns the number of rows no longer suppressed.
    pub fn optimize(&mut self, checker: &NodeChecker, config: &AnonymizationConfig) -> Result<usize> {
        let rows = (0..self.suppressed.len()).filter(|row| self.suppressed[*row]).collect::<Vec<usize>>();
        if rows.is_empty() {
            return Ok(0);
        }

        let manager = Arc::new(checker.manager.restrict(&rows));
        let space = SolutionSpace::new(manager.heights())?;
        let local = NodeChecker::new(self.dataset, config, manager.clone())
            .chain_err(|| "local recoding")?;
        let optimum = match search(&local, space, &config.search)?.optimum {
            Some(optimum) => optimum.transformation,
            None => return Ok(0)
        };

        let mut groupify = crate::groupify::HashGroupify::build(&optimum, &manager);
        local.assess(&optimum, &mut groupify);

        let previous = (self.keys.clone(), self.suppressed.clone());
        let mut recoded = 0;
        for (position, row) in rows.iter().enumerate() {
            let key = optimum.levels().iter().enumerate()
                .map(|(dimension, level)| manager.hierarchies[dimension].generalize(manager.data[[position, dimension]], *level))
                .collect::<Vec<Code>>();
            let released = groupify.find(&key)
                .map(|class| groupify.entries()[class].is_not_outlier)
                .unwrap_or(false);
            if released {
                self.keys.row_mut(*row).iter_mut().zip(key.iter()).for_each(|(cell, code)| *cell = *code);
                self.suppressed[*row] = false;
                recoded += 1;
            }
        }

        let (anonymous, _) = checker.check_keys(&self.transformation, self.released_keys().view());
        if !anonymous {
            tracing::warn!(recoded, node = %optimum, "local recoding violates the privacy models, rolled back");
            self.keys = previous.0;
            self.suppressed = previous.1;
            return Ok(0);
        }
        tracing::info!(recoded, node = %optimum, "suppressed rows recoded");
        Ok(recoded)
    }
}


#[cfg(test)]
mod test_output {
    use std::sync::Arc;

    use kanon_validator::base::Transformation;
    use kanon_validator::components::{Inclusion, KAnonymity, PrivacyModel};
    use kanon_validator::config::{AnonymizationConfig, SuppressionLimit};

    use crate::base::DataManager;
    use crate::base::test_data::{letters, patients};
    use crate::checker::NodeChecker;
    use crate::output::DataOutput;

    #[test]
    fn test_generalized_values() {
        let dataset = patients();
        let config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))]);
        let checker = NodeChecker::new(&dataset, &config, Arc::new(DataManager::new(&dataset, None).unwrap())).unwrap();
        let output = DataOutput::new(&dataset, &checker, &Transformation::new(vec![2, 1]), "*").unwrap();

        assert_eq!(output.num_rows(), 10);
        assert_eq!(output.num_suppressed(), 0);
        assert_eq!(output.row(0).unwrap(), vec!["*", "*", "4767*", "flu"]);
        assert!(output.value(10, 0).is_err());
    }

    #[test]
    fn test_suppression_and_subset() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"], &["A", "1"]]);
        let config = AnonymizationConfig::new(vec![
            PrivacyModel::KAnonymity(KAnonymity::new(2)),
            PrivacyModel::Inclusion(Inclusion { subset: vec![0, 1, 2] }),
        ]).with_suppression_limit(SuppressionLimit::Absolute(1));
        let manager = DataManager::new(&dataset, Some(&[0, 1, 2])).unwrap();
        let checker = NodeChecker::new(&dataset, &config, Arc::new(manager)).unwrap();
        let output = DataOutput::new(&dataset, &checker, &Transformation::new(vec![0, 0]), "#").unwrap();

        assert_eq!(output.num_rows(), 3);
        assert_eq!(output.to_rows().unwrap(), vec![
            vec!["A".to_string(), "1".to_string()],
            vec!["A".to_string(), "1".to_string()],
            vec!["#".to_string(), "#".to_string()],
        ]);
        assert!(output.is_suppressed(2));
    }

    #[test]
    fn test_local_recoding() {
        // B and C are suppressed at the bottom, and share the top together
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["B", "2"], &["C", "3"]]);
        let mut config = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(2))])
            .with_suppression_limit(SuppressionLimit::Absolute(2));
        // generalizing costs less than suppressing
        config.metric_config.gs_factor = 0.25;
        let checker = NodeChecker::new(&dataset, &config, Arc::new(DataManager::new(&dataset, None).unwrap())).unwrap();
        let mut output = DataOutput::new(&dataset, &checker, &Transformation::new(vec![0, 0]), "*").unwrap();
        assert_eq!(output.num_suppressed(), 2);

        assert_eq!(output.optimize(&checker, &config).unwrap(), 2);
        assert_eq!(output.num_suppressed(), 0);
        assert_eq!(output.row(2).unwrap(), vec!["*", "*"]);
        assert_eq!(output.row(0).unwrap(), vec!["A", "1"]);
    }

    #[test]
    fn test_rollback() {
        let dataset = letters(&[&["A", "1"], &["A", "1"], &["A", "1"], &["B", "2"], &["C", "3"]]);
        let mut strict = AnonymizationConfig::new(vec![PrivacyModel::KAnonymity(KAnonymity::new(3))])
            .with_suppression_limit(SuppressionLimit::Absolute(2));
        strict.metric_config.gs_factor = 0.25;
        let checker = NodeChecker::new(&dataset, &strict, Arc::new(DataManager::new(&dataset, None).unwrap())).unwrap();
        let mut output = DataOutput::new(&dataset, &checker, &Transformation::new(vec![0, 0]), "*").unwrap();
        assert_eq!(output.num_suppressed(), 2);

        // recoding B and C under 2-anonymity releases a class of two, which the release cannot accept
        let mut weak = strict.clone();
        weak.privacy_models = vec![PrivacyModel::KAnonymity(KAnonymity::new(2))];
        assert_eq!(output.optimize(&checker, &weak).unwrap(), 0);
        assert_eq!(output.num_suppressed(), 2);
        assert_eq!(output.row(3).unwrap(), vec!["*", "*"]);
    }
}
