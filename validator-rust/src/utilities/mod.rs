pub mod encoding;
pub mod json;

use crate::errors::*;

use std::hash::Hash;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::base::EncodedDataset;
use crate::components::{Criterion, PrivacyModel, check_range};
use crate::config::{AnonymizationConfig, MetricDefinition, SuppressionLimit};
use crate::RowIndex;

/// Check every part of a configuration against an encoded dataset.
pub fn validate_configuration(
    dataset: &EncodedDataset,
    config: &AnonymizationConfig,
) -> Result<()> {
    if config.privacy_models.is_empty() {
        bail!(ErrorKind::Configuration("at least one privacy model must be specified".to_string()))
    }
    if dataset.quasi_identifiers().is_empty() {
        bail!(ErrorKind::Configuration("at least one quasi-identifier must be specified".to_string()))
    }

    validate_privacy_models(dataset, &config.privacy_models)?;
    validate_metric(dataset, config)?;

    if let SuppressionLimit::Fraction(fraction) = config.suppression_limit {
        check_range("suppression limit", fraction, 0., 1.)?;
    }
    check_range("snapshot ratio", config.history.snapshot_ratio, 0., 1.)?;

    let genetic = &config.search.genetic;
    if genetic.population_size < 2 {
        bail!(ErrorKind::Configuration("genetic population must contain at least two individuals".to_string()))
    }
    check_range("elite fraction", genetic.elite_fraction, 0., 1.)?;
    check_range("crossover fraction", genetic.crossover_fraction, 0., 1.)?;
    check_range("immigration fraction", genetic.immigration_fraction, 0., 1.)?;
    check_range("mutation probability", genetic.mutation_probability, 0., 1.)?;
    if genetic.elite_fraction + genetic.crossover_fraction + genetic.immigration_fraction > 1. {
        bail!(ErrorKind::Configuration("genetic fractions must not sum to more than 1".to_string()))
    }
    Ok(())
}

fn validate_privacy_models(dataset: &EncodedDataset, models: &[PrivacyModel]) -> Result<()> {
    for model in models {
        model.validate(dataset)?;
    }

    let presence = models.iter()
        .filter(|model| match model {
            PrivacyModel::DPresence(_) => true,
            _ => false
        })
        .count();
    if presence > 1 {
        bail!(ErrorKind::Configuration("at most one d-presence model may be specified".to_string()))
    }

    let subsets = models.iter()
        .filter_map(|model| model.research_subset())
        .map(|subset| deduplicate(subset.to_vec()).into_iter().sorted().collect::<Vec<RowIndex>>())
        .collect::<Vec<_>>();
    if !subsets.iter().all_equal() {
        bail!(ErrorKind::Configuration("privacy models refer to different research subsets".to_string()))
    }

    let differential = models.iter().any(|model| match model {
        PrivacyModel::EdDifferentialPrivacy(_) => true,
        _ => false
    });
    if differential && !subsets.is_empty() {
        bail!(ErrorKind::Configuration(
            "differential privacy cannot be combined with models based on a research subset".to_string()))
    }
    Ok(())
}

fn validate_metric(dataset: &EncodedDataset, config: &AnonymizationConfig) -> Result<()> {
    check_range("gs_factor", config.metric_config.gs_factor, 0., 1.)?;

    let quasi_identifiers = dataset.quasi_identifiers().into_iter()
        .map(|column| dataset.header[column].as_str())
        .collect::<Vec<&str>>();

    if let Some(weights) = &config.metric_config.attribute_weights {
        for name in &quasi_identifiers {
            let weight = weights.get(*name).ok_or_else(|| Error::from(ErrorKind::Configuration(
                format!("no weight for quasi-identifier {}", name))))?;
            if !weight.is_finite() || *weight < 0. {
                bail!(ErrorKind::Configuration(format!("weight of {} must be finite and non-negative", name)))
            }
        }
        if let Some(name) = weights.keys().find(|name| !quasi_identifiers.contains(&name.as_str())) {
            bail!(ErrorKind::Configuration(format!("weight for {}, which is not a quasi-identifier", name)))
        }
    }

    match &config.metric {
        MetricDefinition::Static { losses } => check_static_losses(dataset, losses)?,
        MetricDefinition::PublisherPayout { cost_benefit, .. } => cost_benefit.validate()?,
        _ => ()
    }
    Ok(())
}

/// Static losses need one non-decreasing, non-negative entry per level of every quasi-identifier.
pub fn check_static_losses(dataset: &EncodedDataset, losses: &IndexMap<String, Vec<f64>>) -> Result<()> {
    for column in dataset.quasi_identifiers() {
        let name = &dataset.header[column];
        let table = losses.get(name).ok_or_else(|| Error::from(ErrorKind::Configuration(
            format!("no static losses for quasi-identifier {}", name))))?;
        let height = dataset.hierarchy(column)?.height();
        if table.len() != height {
            bail!(ErrorKind::Configuration(format!(
                "static losses of {} must have one entry per level ({}), found {}", name, height, table.len())))
        }
        if table.iter().any(|loss| !loss.is_finite() || *loss < 0.) {
            bail!(ErrorKind::Configuration(format!("static losses of {} must be finite and non-negative", name)))
        }
        if table.iter().tuple_windows().any(|(lower, upper)| lower > upper) {
            bail!(ErrorKind::Configuration(format!("static losses of {} must not decrease with the level", name)))
        }
    }
    Ok(())
}

pub fn deduplicate<T: Eq + Hash + Ord + Clone>(values: Vec<T>) -> Vec<T> {
    values.into_iter().unique().collect()
}

#[doc(hidden)]
pub fn prepend(text: &str) -> impl Fn(Error) -> Error + '_ {
    move |e| format!("{} {}", text, e).into()
}


#[cfg(test)]
pub mod test_data {
    use crate::base::{AttributeDefinition, AttributeType, DataDefinition, EncodedDataset};
    use crate::encode_dataset;

    /// Ten patients with an age, a zip code and a disease.
    pub fn patients() -> EncodedDataset {
        let header = vec!["name".to_string(), "age".to_string(), "zip".to_string(), "disease".to_string()];
        let rows = [
            ("ann", "34", "47677", "flu"),
            ("bob", "35", "47602", "flu"),
            ("cal", "36", "47678", "cancer"),
            ("dan", "45", "47905", "flu"),
            ("eve", "47", "47909", "gastritis"),
            ("fay", "48", "47906", "cancer"),
            ("gus", "34", "47605", "gastritis"),
            ("hal", "46", "47673", "flu"),
            ("ivy", "47", "47607", "cancer"),
            ("jon", "36", "47907", "gastritis"),
        ].iter()
            .map(|(name, age, zip, disease)| vec![name.to_string(), age.to_string(), zip.to_string(), disease.to_string()])
            .collect::<Vec<_>>();

        let ages = ["34", "35", "36", "45", "46", "47", "48"].iter()
            .map(|age| vec![age.to_string(), if age.starts_with('3') { "30-39" } else { "40-49" }.to_string(), "*".to_string()])
            .collect::<Vec<_>>();
        let zips = ["47677", "47602", "47678", "47905", "47909", "47906", "47605", "47673", "47607", "47907"].iter()
            .map(|zip| vec![zip.to_string(), format!("{}*", &zip[..4]), format!("{}**", &zip[..3]), "*".to_string()])
            .collect::<Vec<_>>();

        let definition = DataDefinition {
            attributes: vec![
                AttributeDefinition::new("name", AttributeType::Identifying),
                AttributeDefinition::quasi_identifying("age", ages),
                AttributeDefinition::quasi_identifying("zip", zips),
                AttributeDefinition::new("disease", AttributeType::Sensitive)
                    .with_hierarchy(vec![
                        vec!["flu", "respiratory", "*"],
                        vec!["cancer", "other", "*"],
                        vec!["gastritis", "other", "*"]]),
            ]
        };
        encode_dataset(&header, &rows, &definition).unwrap()
    }
}
