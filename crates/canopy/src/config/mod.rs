//! Engine configuration document.
//!
//! The configuration declares the scored feature list (in presentation
//! order), per-feature defaults, the exclusion rule specs, and the engine
//! toggles. It is deployment data, not farm data: unknown method or type
//! strings surface as fatal errors when the engine compiles its rules.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Column names carrying primary keys in farm and species records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdColumns {
    pub farm: String,
    pub species: String,
}

impl Default for IdColumns {
    fn default() -> Self {
        Self {
            farm: "id".to_string(),
            species: "id".to_string(),
        }
    }
}

/// Column names carrying species display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameColumns {
    pub species_name: String,
    pub species_common_name: String,
}

impl Default for NameColumns {
    fn default() -> Self {
        Self {
            species_name: "name".to_string(),
            species_common_name: "common_name".to_string(),
        }
    }
}

/// Trapezoid shoulder widths applied when a species row has no override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceDefaults {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub right: f64,
}

/// Categorical scoring knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDefaults {
    pub exact_match: f64,
}

impl Default for CategoricalDefaults {
    fn default() -> Self {
        Self { exact_match: 1.0 }
    }
}

/// One scored feature: its type, short code, scoring defaults, and the
/// species-side columns its arguments are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub name: String,
    pub short: String,
    /// Feature family, `numeric` or `categorical`. Kept as raw text so an
    /// unknown value aborts rule compilation rather than deserialization.
    #[serde(rename = "type")]
    pub kind: String,
    pub score_method: String,
    #[serde(default)]
    pub default_weight: f64,
    #[serde(default)]
    pub tolerance: ToleranceDefaults,
    #[serde(default)]
    pub categorical: CategoricalDefaults,
    #[serde(default)]
    pub species_min_column: Option<String>,
    #[serde(default)]
    pub species_max_column: Option<String>,
    #[serde(default)]
    pub species_preferred_column: Option<String>,
}

impl FeatureConfig {
    pub fn numeric(name: &str, short: &str, score_method: &str, default_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            short: short.to_string(),
            kind: "numeric".to_string(),
            score_method: score_method.to_string(),
            default_weight,
            tolerance: ToleranceDefaults::default(),
            categorical: CategoricalDefaults::default(),
            species_min_column: None,
            species_max_column: None,
            species_preferred_column: None,
        }
    }

    pub fn categorical(name: &str, short: &str, score_method: &str, default_weight: f64) -> Self {
        Self {
            kind: "categorical".to_string(),
            ..Self::numeric(name, short, score_method, default_weight)
        }
    }

    /// Species column holding the lower preference bound.
    pub fn min_column(&self) -> String {
        self.species_min_column
            .clone()
            .unwrap_or_else(|| format!("{}_min", self.name))
    }

    /// Species column holding the upper preference bound.
    pub fn max_column(&self) -> String {
        self.species_max_column
            .clone()
            .unwrap_or_else(|| format!("{}_max", self.name))
    }

    /// Species column holding the categorical preference list.
    pub fn preferred_column(&self) -> String {
        self.species_preferred_column
            .clone()
            .unwrap_or_else(|| format!("preferred_{}", self.name))
    }
}

/// Companion-species filtering controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyConfig {
    pub enabled: bool,
    pub focal_key: String,
    pub partners_key: String,
    pub reason: String,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            focal_key: "Focal_species".to_string(),
            partners_key: "Good_tree_partners".to_string(),
            reason: "excluded: no suitable host plant".to_string(),
        }
    }
}

/// Exclusion reason formatting controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    #[serde(default)]
    pub include_values: bool,
}

/// One declared exclusion rule.
///
/// Either side may name a column directly (`*_column`) or through a symbolic
/// key resolved via the farm/species column maps. The indirection is
/// resolved once when rules are compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    #[serde(default)]
    pub farm: Option<String>,
    #[serde(default)]
    pub farm_column: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub species_column: Option<String>,
    pub op: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_template: Option<String>,
}

impl RuleSpec {
    pub fn symbolic(id: &str, farm: &str, op: &str, species: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            farm: Some(farm.to_string()),
            op: op.to_string(),
            species: Some(species.to_string()),
            reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn direct(id: &str, farm_column: &str, op: &str, species_column: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            farm_column: Some(farm_column.to_string()),
            op: op.to_string(),
            species_column: Some(species_column.to_string()),
            reason: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

/// Top-level configuration consumed by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ids: IdColumns,
    #[serde(default)]
    pub names: NameColumns,
    /// Scored features in declared order; the order drives trace and
    /// key-reason ordering.
    pub features: Vec<FeatureConfig>,
    #[serde(default = "default_enable_exclusions")]
    pub enable_exclusions: bool,
    #[serde(default)]
    pub dependency: DependencyConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    /// Symbolic farm-side key -> concrete column.
    #[serde(default)]
    pub farm_columns: BTreeMap<String, String>,
    /// Symbolic species-side key -> concrete column.
    #[serde(default)]
    pub species_columns: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_enable_exclusions() -> bool {
    true
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureConfig> {
        self.features.iter().find(|feature| feature.name == name)
    }

    /// The stock agroforestry configuration: rainfall, temperature,
    /// elevation, pH, and soil texture scoring plus the matching min/max,
    /// soil, and habitat exclusion rules.
    pub fn standard() -> Self {
        let farm_columns: BTreeMap<String, String> = [
            ("rainfall", "rainfall_mm"),
            ("temperature", "temperature_celsius"),
            ("elevation", "elevation_m"),
            ("ph", "ph"),
            ("soil", "soil_texture"),
            ("coastal_flag", "coastal"),
            ("riparian_flag", "riparian"),
        ]
        .into_iter()
        .map(|(key, column)| (key.to_string(), column.to_string()))
        .collect();

        let species_columns: BTreeMap<String, String> = [
            ("rain_min", "rainfall_mm_min"),
            ("rain_max", "rainfall_mm_max"),
            ("temp_min", "temperature_celsius_min"),
            ("temp_max", "temperature_celsius_max"),
            ("elev_min", "elevation_m_min"),
            ("elev_max", "elevation_m_max"),
            ("ph_min", "ph_min"),
            ("ph_max", "ph_max"),
            ("soil_pref", "soil_textures"),
            ("coastal_ok", "coastal"),
            ("riparian_ok", "riparian"),
        ]
        .into_iter()
        .map(|(key, column)| (key.to_string(), column.to_string()))
        .collect();

        let rules = vec![
            RuleSpec::symbolic(
                "rain_min",
                "rainfall",
                ">=",
                "rain_min",
                "excluded: rainfall below minimum",
            ),
            RuleSpec::symbolic(
                "rain_max",
                "rainfall",
                "<=",
                "rain_max",
                "excluded: rainfall above maximum",
            ),
            RuleSpec::symbolic(
                "temp_min",
                "temperature",
                ">=",
                "temp_min",
                "excluded: temperature below minimum",
            ),
            RuleSpec::symbolic(
                "temp_max",
                "temperature",
                "<=",
                "temp_max",
                "excluded: temperature above maximum",
            ),
            RuleSpec::symbolic(
                "elev_min",
                "elevation",
                ">=",
                "elev_min",
                "excluded: elevation below minimum",
            ),
            RuleSpec::symbolic(
                "elev_max",
                "elevation",
                "<=",
                "elev_max",
                "excluded: elevation above maximum",
            ),
            RuleSpec::symbolic(
                "ph_min",
                "ph",
                ">=",
                "ph_min",
                "excluded: pH below minimum",
            ),
            RuleSpec::symbolic(
                "ph_max",
                "ph",
                "<=",
                "ph_max",
                "excluded: pH above maximum",
            ),
            RuleSpec::symbolic(
                "soil_texture",
                "soil",
                "in_set",
                "soil_pref",
                "excluded: soil texture not supported",
            ),
            RuleSpec::symbolic(
                "coastal_habitat",
                "coastal_flag",
                "requires_true",
                "coastal_ok",
                "excluded: not suitable for coastal habitat",
            ),
            RuleSpec::symbolic(
                "riparian_habitat",
                "riparian_flag",
                "requires_true",
                "riparian_ok",
                "excluded: not suitable for riparian habitat",
            ),
        ];

        let mut rainfall = FeatureConfig::numeric("rainfall_mm", "rain", "num_range", 0.25);
        rainfall.species_min_column = Some("rainfall_mm_min".to_string());
        rainfall.species_max_column = Some("rainfall_mm_max".to_string());

        let mut temperature =
            FeatureConfig::numeric("temperature_celsius", "temp", "trapezoid", 0.25);
        temperature.species_min_column = Some("temperature_celsius_min".to_string());
        temperature.species_max_column = Some("temperature_celsius_max".to_string());
        temperature.tolerance = ToleranceDefaults {
            left: 1.0,
            right: 1.0,
        };

        let mut elevation = FeatureConfig::numeric("elevation_m", "elev", "num_range", 0.15);
        elevation.species_min_column = Some("elevation_m_min".to_string());
        elevation.species_max_column = Some("elevation_m_max".to_string());

        let mut ph = FeatureConfig::numeric("ph", "ph", "trapezoid", 0.15);
        ph.tolerance = ToleranceDefaults {
            left: 0.25,
            right: 0.25,
        };

        let mut soil = FeatureConfig::categorical("soil_texture", "soil", "cat_exact", 0.2);
        soil.species_preferred_column = Some("soil_textures".to_string());

        Self {
            ids: IdColumns::default(),
            names: NameColumns::default(),
            features: vec![rainfall, temperature, elevation, ph, soil],
            enable_exclusions: true,
            dependency: DependencyConfig::default(),
            annotation: AnnotationConfig::default(),
            farm_columns,
            species_columns,
            rules,
        }
    }
}

/// Error raised while loading a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),
    #[error("configuration document is not valid JSON")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_declares_features_in_order() {
        let config = EngineConfig::standard();
        let names: Vec<&str> = config
            .features
            .iter()
            .map(|feature| feature.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "rainfall_mm",
                "temperature_celsius",
                "elevation_m",
                "ph",
                "soil_texture"
            ]
        );
        assert!(config.enable_exclusions);
        assert!(!config.dependency.enabled);
    }

    #[test]
    fn species_columns_default_to_naming_convention() {
        let feature = FeatureConfig::numeric("ph", "ph", "num_range", 0.5);
        assert_eq!(feature.min_column(), "ph_min");
        assert_eq!(feature.max_column(), "ph_max");

        let soil = FeatureConfig::categorical("soil_texture", "soil", "cat_exact", 0.5);
        assert_eq!(soil.preferred_column(), "preferred_soil_texture");
    }

    #[test]
    fn json_round_trip_preserves_feature_order() {
        let config = EngineConfig::standard();
        let raw = serde_json::to_string(&config).expect("serializes");
        let reloaded = EngineConfig::from_json_str(&raw).expect("parses");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn sparse_document_fills_defaults() {
        let raw = r#"{
            "features": [
                {"name": "ph", "short": "ph", "type": "numeric", "score_method": "num_range"}
            ]
        }"#;
        let config = EngineConfig::from_json_str(raw).expect("parses");
        assert!(config.enable_exclusions);
        assert_eq!(config.ids.farm, "id");
        assert_eq!(config.features[0].default_weight, 0.0);
        assert_eq!(config.features[0].tolerance.left, 0.0);
        assert_eq!(config.features[0].categorical.exact_match, 1.0);
    }
}
