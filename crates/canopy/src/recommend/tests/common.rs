use crate::config::{EngineConfig, FeatureConfig, RuleSpec, ToleranceDefaults};
use crate::recommend::domain::{DependencyRow, FarmProfile, ParameterOverride, SpeciesProfile};
use crate::recommend::engine::RecommendationEngine;
use crate::recommend::values::FieldValue;

/// Minimal two-feature scoring configuration: numeric pH plus categorical
/// soil texture, equally weighted, no exclusion rules.
pub(super) fn scoring_config() -> EngineConfig {
    let mut ph = FeatureConfig::numeric("ph", "ph", "num_range", 0.5);
    ph.tolerance = ToleranceDefaults {
        left: 0.25,
        right: 0.6,
    };
    let soil = FeatureConfig::categorical("soil_texture", "soil", "cat_exact", 0.5);

    EngineConfig {
        features: vec![ph, soil],
        rules: Vec::new(),
        ..EngineConfig::standard()
    }
}

/// Exclusion-focused configuration: the standard rule set, scoring reduced
/// to the same two features as [`scoring_config`].
pub(super) fn exclusion_config() -> EngineConfig {
    EngineConfig {
        features: scoring_config().features,
        ..EngineConfig::standard()
    }
}

pub(super) fn dependency_config(rules: Vec<RuleSpec>) -> EngineConfig {
    let mut config = exclusion_config();
    config.rules = rules;
    config.dependency.enabled = true;
    config
}

pub(super) fn neutral_farm() -> FarmProfile {
    FarmProfile::new(1)
        .with_value("rainfall_mm", FieldValue::Number(700.0))
        .with_value("temperature_celsius", FieldValue::Number(20.0))
        .with_value("elevation_m", FieldValue::Number(100.0))
        .with_value("ph", FieldValue::Number(6.5))
        .with_value("soil_texture", FieldValue::Text("loam".into()))
}

pub(super) fn clay_farm() -> FarmProfile {
    FarmProfile::new(101)
        .with_value("ph", FieldValue::Number(6.5))
        .with_value("soil_texture", FieldValue::Text("clay".into()))
}

pub(super) fn sand_farm() -> FarmProfile {
    FarmProfile::new(102)
        .with_value("ph", FieldValue::Number(4.0))
        .with_value("soil_texture", FieldValue::Text("sand".into()))
}

pub(super) fn tree_a() -> SpeciesProfile {
    SpeciesProfile::new(1, "Tree A", "Common A")
        .with_attribute("ph_min", FieldValue::Number(6.0))
        .with_attribute("ph_max", FieldValue::Number(7.0))
        .with_attribute("preferred_soil_texture", FieldValue::Text("clay".into()))
}

pub(super) fn tree_b() -> SpeciesProfile {
    SpeciesProfile::new(2, "Tree B", "Common B")
        .with_attribute("ph_min", FieldValue::Number(4.5))
        .with_attribute("ph_max", FieldValue::Number(5.0))
        .with_attribute("preferred_soil_texture", FieldValue::Text("sand".into()))
}

pub(super) fn named_species(id: i64, name: &str) -> SpeciesProfile {
    SpeciesProfile::new(id, name, name)
}

pub(super) fn dependency_row(focal: &str, partners: &str) -> DependencyRow {
    // Trailing space in the partners header mirrors the messy source export.
    DependencyRow::new()
        .with_value("Focal_species", focal)
        .with_value("Good_tree_partners ", partners)
}

pub(super) fn engine_with(
    catalog: Vec<SpeciesProfile>,
    config: EngineConfig,
) -> RecommendationEngine {
    RecommendationEngine::new(catalog, config, &[], &[]).expect("engine compiles")
}

pub(super) fn engine_with_dependencies(
    catalog: Vec<SpeciesProfile>,
    config: EngineConfig,
    rows: Vec<DependencyRow>,
) -> RecommendationEngine {
    RecommendationEngine::new(catalog, config, &[], &rows).expect("engine compiles")
}

pub(super) fn ph_override(
    species_id: i64,
    weight: Option<f64>,
    score_method: Option<&str>,
) -> ParameterOverride {
    ParameterOverride {
        species_id,
        feature: "ph".to_string(),
        score_method: score_method.map(str::to_string),
        weight,
        trap_left_tol: None,
        trap_right_tol: None,
    }
}
