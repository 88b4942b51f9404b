use approx::assert_relative_eq;

use super::common::*;
use crate::config::{EngineConfig, FeatureConfig, ToleranceDefaults};
use crate::error::EngineError;
use crate::recommend::domain::ParameterOverride;
use crate::recommend::params::{
    compile_catalog_rules, compile_species_rules, OverrideIndex, ScoreMethod,
};
use crate::recommend::values::FieldValue;

fn override_rows() -> Vec<ParameterOverride> {
    vec![
        ParameterOverride {
            species_id: 1,
            feature: "ph".to_string(),
            score_method: Some("num_range".to_string()),
            weight: Some(0.3),
            trap_left_tol: Some(0.0),
            trap_right_tol: Some(0.5),
        },
        ParameterOverride {
            species_id: 1,
            feature: "soil_texture".to_string(),
            score_method: Some("cat_exact".to_string()),
            weight: Some(0.7),
            trap_left_tol: None,
            trap_right_tol: None,
        },
        ParameterOverride {
            species_id: 2,
            feature: "ph".to_string(),
            score_method: Some("num_range".to_string()),
            weight: Some(0.0),
            trap_left_tol: None,
            trap_right_tol: Some(0.5),
        },
        ParameterOverride {
            species_id: 2,
            feature: "soil_texture".to_string(),
            score_method: None,
            weight: Some(0.8),
            trap_left_tol: None,
            trap_right_tol: None,
        },
    ]
}

fn ph_feature() -> FeatureConfig {
    let mut ph = FeatureConfig::numeric("ph", "ph", "trapezoid", 0.5);
    ph.tolerance = ToleranceDefaults {
        left: 0.25,
        right: 0.6,
    };
    ph
}

#[test]
fn full_override_wins_over_defaults() {
    let index = OverrideIndex::from_rows(&override_rows());
    let resolved = index.resolve(&ph_feature(), 1);

    assert_eq!(resolved.score_method, "num_range");
    assert_relative_eq!(resolved.weight, 0.3);
    assert_relative_eq!(resolved.trap_left_tol, 0.0);
    assert_relative_eq!(resolved.trap_right_tol, 0.5);
}

#[test]
fn unknown_species_resolves_to_pure_defaults() {
    let index = OverrideIndex::from_rows(&override_rows());
    let resolved = index.resolve(&ph_feature(), 999);

    assert_eq!(resolved.score_method, "trapezoid");
    assert_relative_eq!(resolved.weight, 0.5);
    assert_relative_eq!(resolved.trap_left_tol, 0.25);
    assert_relative_eq!(resolved.trap_right_tol, 0.6);
}

#[test]
fn absent_fields_fall_back_per_field() {
    let index = OverrideIndex::from_rows(&override_rows());

    // Species 2 overrides the soil weight but not the method.
    let soil = FeatureConfig::categorical("soil_texture", "soil", "cat_exact", 0.5);
    let resolved = index.resolve(&soil, 2);
    assert_relative_eq!(resolved.weight, 0.8);
    assert_eq!(resolved.score_method, "cat_exact");

    // Species 2 overrides the right tolerance but not the left.
    let resolved = index.resolve(&ph_feature(), 2);
    assert_relative_eq!(resolved.trap_right_tol, 0.5);
    assert_relative_eq!(resolved.trap_left_tol, 0.25);
}

#[test]
fn explicit_zero_weight_is_not_replaced_by_default() {
    let index = OverrideIndex::from_rows(&override_rows());
    let resolved = index.resolve(&ph_feature(), 2);

    assert_relative_eq!(resolved.weight, 0.0);
    assert_ne!(resolved.weight, 0.5);
}

#[test]
fn later_rows_replace_earlier_rows_for_same_feature() {
    let rows = vec![
        ParameterOverride {
            species_id: 7,
            feature: "ph".to_string(),
            score_method: None,
            weight: Some(0.2),
            trap_left_tol: None,
            trap_right_tol: None,
        },
        ParameterOverride {
            species_id: 7,
            feature: "ph".to_string(),
            score_method: None,
            weight: Some(0.9),
            trap_left_tol: None,
            trap_right_tol: None,
        },
    ];
    let index = OverrideIndex::from_rows(&rows);
    assert_relative_eq!(index.resolve(&ph_feature(), 7).weight, 0.9);
}

#[test]
fn rules_compile_in_config_feature_order() {
    let index = OverrideIndex::from_rows(&[]);
    let rules =
        compile_species_rules(&tree_a(), &index, &scoring_config()).expect("rules compile");

    let order: Vec<&str> = rules.iter().map(|rule| rule.feature.as_str()).collect();
    assert_eq!(order, vec!["ph", "soil_texture"]);
    assert!(matches!(rules[0].method, ScoreMethod::NumRange { .. }));
    assert!(matches!(rules[1].method, ScoreMethod::CatExact { .. }));
}

#[test]
fn unknown_numeric_method_is_fatal() {
    let mut config = scoring_config();
    config.features[0].score_method = "magic".to_string();
    let index = OverrideIndex::from_rows(&[]);

    let err = compile_species_rules(&tree_a(), &index, &config).expect_err("must fail");
    assert_eq!(
        err,
        EngineError::UnknownNumericMethod {
            feature: "ph".to_string(),
            method: "magic".to_string(),
        }
    );
}

#[test]
fn unknown_categorical_method_is_fatal() {
    let mut config = scoring_config();
    config.features[1].score_method = "magic".to_string();
    let index = OverrideIndex::from_rows(&[]);

    let err = compile_species_rules(&tree_a(), &index, &config).expect_err("must fail");
    assert_eq!(
        err,
        EngineError::UnknownCategoricalMethod {
            feature: "soil_texture".to_string(),
            method: "magic".to_string(),
        }
    );
}

#[test]
fn unknown_feature_type_is_fatal() {
    let mut config = scoring_config();
    config.features[0].kind = "number".to_string();
    let index = OverrideIndex::from_rows(&[]);

    let err = compile_species_rules(&tree_a(), &index, &config).expect_err("must fail");
    assert_eq!(
        err,
        EngineError::UnknownFeatureType {
            feature: "ph".to_string(),
            kind: "number".to_string(),
        }
    );
}

#[test]
fn override_can_introduce_fatal_method_per_species() {
    let config = scoring_config();
    let index = OverrideIndex::from_rows(&[ph_override(1, None, Some("magic"))]);

    assert!(compile_species_rules(&tree_a(), &index, &config).is_err());
    assert!(compile_species_rules(&tree_b(), &index, &config).is_ok());
}

#[test]
fn inverted_trapezoid_range_is_fatal() {
    let mut config = scoring_config();
    config.features[0].score_method = "trapezoid".to_string();
    let species = named_species(5, "Inverted")
        .with_attribute("ph_min", FieldValue::Number(7.0))
        .with_attribute("ph_max", FieldValue::Number(6.0));
    let index = OverrideIndex::from_rows(&[]);

    let err = compile_species_rules(&species, &index, &config).expect_err("must fail");
    assert!(matches!(err, EngineError::InvalidRange { species_id: 5, .. }));
}

#[test]
fn catalog_compilation_ignores_overrides_for_unknown_species() {
    let config = scoring_config();
    let index = OverrideIndex::from_rows(&[ph_override(999, Some(0.9), None)]);

    let compiled = compile_catalog_rules(&[tree_a(), tree_b()], &index, &config)
        .expect("unknown species overrides are ignored");
    assert_eq!(compiled.len(), 2);
    assert!(!compiled.contains_key(&999));
}

#[test]
fn trapezoid_rule_carries_resolved_tolerances() {
    let config = EngineConfig {
        features: vec![ph_feature()],
        rules: Vec::new(),
        ..EngineConfig::standard()
    };
    let index = OverrideIndex::from_rows(&[]);

    let rules = compile_species_rules(&tree_a(), &index, &config).expect("rules compile");
    match &rules[0].method {
        ScoreMethod::Trapezoid {
            left_tol,
            right_tol,
            ..
        } => {
            assert_relative_eq!(*left_tol, 0.25);
            assert_relative_eq!(*right_tol, 0.6);
        }
        other => panic!("expected trapezoid rule, got {other:?}"),
    }
}
