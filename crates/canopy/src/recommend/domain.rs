//! Domain records exchanged with the persistence and API collaborators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::params::ResolvedParams;
use super::values::FieldValue;

/// Environmental profile of one farm plot, keyed by column name.
///
/// Values are classified at ingestion; a missing attribute is simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmProfile {
    pub id: i64,
    pub values: BTreeMap<String, FieldValue>,
}

impl FarmProfile {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, column: &str, value: FieldValue) -> Self {
        self.values.insert(column.to_string(), value);
        self
    }

    pub fn value(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }
}

/// One catalog species with its preference bounds and habitat flags.
///
/// Shared read-only across every farm in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub id: i64,
    pub name: String,
    pub common_name: String,
    pub attributes: BTreeMap<String, FieldValue>,
}

impl SpeciesProfile {
    pub fn new(id: i64, name: &str, common_name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            common_name: common_name.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, column: &str, value: FieldValue) -> Self {
        self.attributes.insert(column.to_string(), value);
        self
    }

    pub fn attribute(&self, column: &str) -> Option<&FieldValue> {
        self.attributes.get(column)
    }
}

/// Sparse per-(species, feature) parameter override row.
///
/// Each field is independently optional; an explicit 0.0 weight is a real
/// value, not a gap to be filled from defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterOverride {
    pub species_id: i64,
    pub feature: String,
    pub score_method: Option<String>,
    pub weight: Option<f64>,
    pub trap_left_tol: Option<f64>,
    pub trap_right_tol: Option<f64>,
}

/// Raw companion-planting row as supplied by upstream imports.
///
/// Keys may carry stray whitespace; normalization happens when the rows are
/// parsed into dependency rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub values: BTreeMap<String, String>,
}

impl DependencyRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

/// A species removed from contention, with every reason that applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedSpecies {
    pub id: i64,
    pub species_name: String,
    pub species_common_name: String,
    pub reasons: Vec<String>,
}

/// Output of the exclusion engine for one farm.
///
/// After the rule phase, candidates and excluded species partition the
/// catalog; the dependency phase only ever moves ids out of the candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionResult {
    pub candidate_ids: Vec<i64>,
    pub excluded_species: Vec<ExcludedSpecies>,
}

/// Whether a feature was scored on its numeric or categorical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Numerical,
    Categorical,
}

/// Reproducible record of how one feature contributed to a species score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTrace {
    pub feature: String,
    pub short: String,
    pub kind: TraceKind,
    pub farm_value: Option<FieldValue>,
    pub score: Option<f64>,
    pub reason: String,
    pub params: ResolvedParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<Vec<String>>,
}

/// One candidate species with its aggregate score and explanation traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSpecies {
    pub species_id: i64,
    pub species_name: String,
    pub species_common_name: String,
    pub mcda_score: f64,
    pub features: Vec<FeatureTrace>,
}

/// Presentation-ready recommendation row.
///
/// Excluded species use the `-1` rank and score sentinels so the persistence
/// layer can store every species in one uniform shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub species_id: i64,
    pub species_name: String,
    pub species_common_name: String,
    pub score_mcda: f64,
    pub rank_overall: i32,
    pub key_reasons: Vec<String>,
}

/// Full evaluation payload for one farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub farm_id: i64,
    pub timestamp_utc: String,
    pub recommendations: Vec<RecommendationEntry>,
    pub excluded_species: Vec<ExcludedSpecies>,
}

impl BatchResult {
    /// Uniform rows for persistence: ranked recommendations followed by
    /// excluded species carrying the sentinel rank and score.
    pub fn flattened_rows(&self) -> Vec<RecommendationEntry> {
        let mut rows = self.recommendations.clone();
        rows.extend(self.excluded_species.iter().map(|excluded| {
            RecommendationEntry {
                species_id: excluded.id,
                species_name: excluded.species_name.clone(),
                species_common_name: excluded.species_common_name.clone(),
                score_mcda: -1.0,
                rank_overall: -1,
                key_reasons: excluded.reasons.clone(),
            }
        }));
        rows
    }
}
