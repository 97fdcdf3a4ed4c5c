use crate::errors::*;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use ndarray::Array2;
use noisy_float::prelude::n64;

use crate::base::{AttributeType, DataDefinition, Dictionary, EncodedDataset, Hierarchy, NO_CODE};
use crate::utilities::prepend;
use crate::Code;

/// Encode a table of strings, and the hierarchies of its definition, into integer codes.
///
/// Data values of a column receive the lowest codes, in order of first occurrence.
/// Values which only occur in a hierarchy are appended to the same dictionary.
pub fn encode(
    header: &[String],
    rows: &[Vec<String>],
    definition: &DataDefinition,
) -> Result<EncodedDataset> {
    if header.iter().unique().count() != header.len() {
        bail!(ErrorKind::Configuration("column names must be unique".to_string()))
    }
    if let Some(attribute) = definition.attributes.iter().find(|attribute| !header.contains(&attribute.name)) {
        bail!(ErrorKind::Configuration(format!("attribute {} is not a column of the dataset", attribute.name)))
    }
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != header.len()) {
        bail!(ErrorKind::Configuration(format!(
            "row {} has {} values, but the header has {} columns", index, row.len(), header.len())))
    }

    let attribute_types = header.iter()
        .map(|name| definition.attribute_type(name))
        .collect::<Vec<AttributeType>>();

    let mut dictionaries = vec![Dictionary::new(); header.len()];
    let mut matrix = Array2::<Code>::zeros((rows.len(), header.len()));
    for (index, row) in rows.iter().enumerate() {
        for (column, value) in row.iter().enumerate() {
            matrix[[index, column]] = dictionaries[column].register(value)?;
        }
    }

    let mut hierarchies = IndexMap::new();
    for (column, name) in header.iter().enumerate() {
        let cells = match attribute_types[column] {
            AttributeType::QuasiIdentifying | AttributeType::Sensitive =>
                definition.attribute(name).and_then(|attribute| attribute.hierarchy.as_ref()),
            _ => continue
        };
        match cells {
            Some(cells) => {
                let hierarchy = encode_hierarchy(name, cells, &mut dictionaries[column])?;
                hierarchies.insert(column, hierarchy);
            }
            None if attribute_types[column] == AttributeType::QuasiIdentifying =>
                bail!(ErrorKind::Hierarchy(name.clone(), "quasi-identifiers require a hierarchy".to_string())),
            None => ()
        }
    }

    dictionaries.iter_mut().for_each(Dictionary::finalize);

    let orders = attribute_types.iter().enumerate()
        .filter(|(_, attribute_type)| **attribute_type == AttributeType::Sensitive)
        .map(|(column, _)| (column, natural_order(&dictionaries[column])))
        .collect();

    Ok(EncodedDataset {
        header: header.to_vec(),
        attribute_types,
        dictionaries,
        matrix,
        hierarchies,
        orders,
    })
}

/// Encode the rows `[value, level 1, level 2, ...]` of a string hierarchy into the dictionary space of a column.
pub fn encode_hierarchy(
    name: &str,
    cells: &[Vec<String>],
    dictionary: &mut Dictionary,
) -> Result<Hierarchy> {
    let invalid = |message: String| Error::from(ErrorKind::Hierarchy(name.to_string(), message));

    let height = cells.first().map(Vec::len)
        .ok_or_else(|| invalid("hierarchy is empty".to_string()))?;
    if height == 0 {
        return Err(invalid("hierarchy has no levels".to_string()))
    }
    if let Some(row) = cells.iter().find(|row| row.len() != height) {
        return Err(invalid(format!("row [{}] must have {} levels", row.join(", "), height)))
    }

    let mut leaves = IndexSet::new();
    for row in cells {
        if !leaves.insert(row[0].as_str()) {
            return Err(invalid(format!("value {} is defined more than once", row[0])))
        }
    }
    // every data value must be generalizable
    let data_values = (0..dictionary.len() as Code)
        .filter_map(|code| dictionary.value(code).map(String::from))
        .collect::<Vec<String>>();
    if let Some(missing) = data_values.iter().find(|value| !leaves.contains(value.as_str())) {
        return Err(invalid(format!("value {} of the dataset is missing from the hierarchy", missing)))
    }

    let codes = cells.iter()
        .map(|row| row.iter()
            .map(|value| dictionary.register(value))
            .collect::<Result<Vec<Code>>>())
        .collect::<Result<Vec<Vec<Code>>>>()
        .map_err(prepend(&format!("hierarchy of {}:", name)))?;

    let mut map = Array2::from_elem((dictionary.len(), height), NO_CODE);
    for row in codes {
        map.row_mut(row[0] as usize).iter_mut().zip(row.iter())
            .for_each(|(cell, code)| *cell = *code);
    }

    let hierarchy = Hierarchy::new(map);
    hierarchy.check_absorption().map_err(invalid)?;
    Ok(hierarchy)
}

/// Rank of each code in the natural order of the values:
/// numeric if every value is a number, lexicographic otherwise.
pub fn natural_order(dictionary: &Dictionary) -> Vec<usize> {
    let values = (0..dictionary.len() as Code)
        .map(|code| dictionary.value(code).unwrap_or(""))
        .collect::<Vec<&str>>();

    let numbers = values.iter()
        .map(|value| value.trim().parse::<f64>().ok().filter(|number| number.is_finite()))
        .collect::<Option<Vec<f64>>>();

    let sorted = match numbers {
        Some(numbers) => (0..values.len()).sorted_by_key(|code| n64(numbers[*code])).collect::<Vec<_>>(),
        None => (0..values.len()).sorted_by_key(|code| values[*code]).collect::<Vec<_>>(),
    };

    let mut ranks = vec![0; values.len()];
    sorted.into_iter().enumerate().for_each(|(rank, code)| ranks[code] = rank);
    ranks
}


#[cfg(test)]
mod test_encoding {
    use crate::base::{AttributeDefinition, AttributeType, DataDefinition, Dictionary, NO_CODE};
    use crate::utilities::encoding::{encode, natural_order};
    use crate::utilities::test_data::patients;

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|row| row.iter().map(|value| value.to_string()).collect()).collect()
    }

    #[test]
    fn test_encode_patients() {
        let dataset = patients();
        assert_eq!(dataset.num_records(), 10);
        assert_eq!(dataset.quasi_identifiers(), vec![1, 2]);
        assert_eq!(dataset.sensitive_attributes(), vec![3]);
        assert_eq!(dataset.heights().unwrap(), vec![3, 4]);

        let zip = dataset.hierarchy(2).unwrap();
        let code = dataset.matrix[[0, 2]];
        assert_eq!(dataset.value(2, zip.generalize(code, 2)), Some("476**"));
        assert_eq!(dataset.row(1), vec!["bob", "35", "47602", "flu"]);
        assert!(dataset.dictionaries.iter().all(Dictionary::is_finalized));
    }

    #[test]
    fn test_hierarchy_codes() {
        let header = vec!["age".to_string()];
        let rows = table(&[&["2"], &["1"]]);
        let definition = DataDefinition {
            attributes: vec![AttributeDefinition::quasi_identifying("age", vec![
                vec!["1", "1-2", "*"], vec!["2", "1-2", "*"], vec!["3", "3-4", "*"]])]
        };
        let dataset = encode(&header, &rows, &definition).unwrap();
        let hierarchy = dataset.hierarchy(0).unwrap();
        // data values first, then hierarchy values in order of appearance
        assert_eq!(dataset.dictionaries[0].code("1-2"), Some(2));
        assert_eq!(dataset.dictionaries[0].code("3"), Some(4));
        assert_eq!(hierarchy.domain_size(), 3);
        assert_eq!(hierarchy.map.row(2).to_vec(), vec![NO_CODE; 3]);
        assert_eq!(hierarchy.generalize(1, 1), 2);
    }

    #[test]
    fn test_invalid_hierarchies() {
        let header = vec!["age".to_string()];
        let rows = table(&[&["1"], &["2"]]);

        let missing = DataDefinition {
            attributes: vec![AttributeDefinition::quasi_identifying("age", vec![vec!["1", "*"]])]
        };
        assert!(encode(&header, &rows, &missing).is_err());

        let ragged = DataDefinition {
            attributes: vec![AttributeDefinition::quasi_identifying("age", vec![vec!["1", "*"], vec!["2"]])]
        };
        assert!(encode(&header, &rows, &ragged).is_err());

        let split = DataDefinition {
            attributes: vec![AttributeDefinition::quasi_identifying("age", vec![
                vec!["1", "1-2", "a"], vec!["2", "1-2", "b"]])]
        };
        assert!(encode(&header, &rows, &split).is_err());

        let absent = DataDefinition {
            attributes: vec![AttributeDefinition::new("age", AttributeType::QuasiIdentifying)]
        };
        assert!(encode(&header, &rows, &absent).is_err());
    }

    #[test]
    fn test_undefined_columns_are_insensitive() {
        let header = vec!["age".to_string(), "note".to_string()];
        let rows = table(&[&["1", "x"], &["2", "y"]]);
        let definition = DataDefinition {
            attributes: vec![AttributeDefinition::quasi_identifying("age", vec![vec!["1", "*"], vec!["2", "*"]])]
        };
        let dataset = encode(&header, &rows, &definition).unwrap();
        assert_eq!(dataset.attribute_types[1], AttributeType::Insensitive);

        let unknown = DataDefinition {
            attributes: vec![AttributeDefinition::new("weight", AttributeType::Sensitive)]
        };
        assert!(encode(&header, &rows, &unknown).is_err());
    }

    #[test]
    fn test_natural_order() {
        let mut numeric = Dictionary::new();
        ["10", "9", "100"].iter().for_each(|value| { numeric.register(value).unwrap(); });
        assert_eq!(natural_order(&numeric), vec![1, 0, 2]);

        let mut text = Dictionary::new();
        ["b", "10", "a"].iter().for_each(|value| { text.register(value).unwrap(); });
        assert_eq!(natural_order(&text), vec![2, 0, 1]);
    }
}
