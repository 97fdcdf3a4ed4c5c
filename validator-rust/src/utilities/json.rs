//! JSON entry points for configurations and data definitions.

use crate::errors::*;

use crate::base::DataDefinition;
use crate::config::AnonymizationConfig;

pub fn parse_config(text: &str) -> Result<AnonymizationConfig> {
    serde_json::from_str(text).chain_err(|| "unable to parse anonymization configuration")
}

pub fn parse_definition(text: &str) -> Result<DataDefinition> {
    serde_json::from_str(text).chain_err(|| "unable to parse data definition")
}


#[cfg(test)]
mod test_json {
    use crate::base::AttributeType;
    use crate::components::PrivacyModel;
    use crate::config::{AggregateFunction, MetricDefinition, SearchStrategy, SuppressionLimit};
    use crate::utilities::json::{parse_config, parse_definition};

    #[test]
    fn test_parse_config() {
        let config = parse_config(r#"{
            "privacy_models": [
                {"type": "k_anonymity", "k": 3},
                {"type": "entropy_l_diversity", "attribute": "disease", "l": 2.0, "estimator": "grassberger"}
            ],
            "suppression_limit": {"fraction": 0.05},
            "metric": {"type": "entropy", "monotonic": false},
            "metric_config": {"gs_factor": 0.3, "aggregate": "geometric_mean"},
            "search": {"strategy": "heuristic_top_down", "step_limit": 500}
        }"#).unwrap();

        assert_eq!(config.privacy_models.len(), 2);
        assert!(match &config.privacy_models[1] {
            PrivacyModel::EntropyLDiversity(model) => model.l == 2.,
            _ => false
        });
        assert_eq!(config.suppression_limit, SuppressionLimit::Fraction(0.05));
        assert_eq!(config.metric, MetricDefinition::Entropy { monotonic: false });
        assert_eq!(config.metric_config.aggregate, AggregateFunction::GeometricMean);
        assert_eq!(config.search.strategy, SearchStrategy::HeuristicTopDown);
        assert_eq!(config.search.step_limit, Some(500));
        // untouched knobs keep their defaults
        assert_eq!(config.search.exhaustive_threshold, 100_000);
        assert_eq!(config.history.size, 200);
        assert_eq!(config.suppression_string, "*");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_config(r#"{"privacy_models": [{"type": "k_anonymity"}]}"#).is_err());
        assert!(parse_config(r#"{"privacy_models": [{"type": "unknown", "k": 2}]}"#).is_err());
        assert!(parse_definition("[]").is_err());
    }

    #[test]
    fn test_parse_definition() {
        let definition = parse_definition(r#"{"attributes": [
            {"name": "zip", "type": "quasi_identifying", "hierarchy": [["47677", "*"], ["47602", "*"]]},
            {"name": "disease", "type": "sensitive"}
        ]}"#).unwrap();
        assert_eq!(definition.attribute_type("zip"), AttributeType::QuasiIdentifying);
        assert_eq!(definition.attribute_type("disease"), AttributeType::Sensitive);
        assert_eq!(definition.attribute_type("name"), AttributeType::Insensitive);
        assert_eq!(definition.attribute("zip").and_then(|zip| zip.hierarchy.as_ref()).map(Vec::len), Some(2));
    }
}
