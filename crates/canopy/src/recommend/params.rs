//! Parameter resolution and scoring-rule compilation.
//!
//! Sparse per-species overrides are merged with configuration defaults once
//! per batch; the result is one compiled [`ScoringRule`] list per species,
//! reused read-only across every farm.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{EngineConfig, FeatureConfig};
use crate::error::EngineError;

use super::domain::{ParameterOverride, SpeciesProfile, TraceKind};
use super::values::FieldValue;

/// Field-level override values for one (species, feature).
#[derive(Debug, Clone, Default, PartialEq)]
struct OverrideParams {
    score_method: Option<String>,
    weight: Option<f64>,
    trap_left_tol: Option<f64>,
    trap_right_tol: Option<f64>,
}

/// Override rows indexed for O(1) lookup during rule compilation.
///
/// Later rows for the same (species, feature) replace earlier ones, matching
/// the upstream import semantics.
#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    by_species: BTreeMap<i64, BTreeMap<String, OverrideParams>>,
}

impl OverrideIndex {
    pub fn from_rows(rows: &[ParameterOverride]) -> Self {
        let mut by_species: BTreeMap<i64, BTreeMap<String, OverrideParams>> = BTreeMap::new();
        for row in rows {
            by_species.entry(row.species_id).or_default().insert(
                row.feature.clone(),
                OverrideParams {
                    score_method: row.score_method.clone(),
                    weight: row.weight,
                    trap_left_tol: row.trap_left_tol,
                    trap_right_tol: row.trap_right_tol,
                },
            );
        }
        Self { by_species }
    }

    pub fn species_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.by_species.keys().copied()
    }

    fn get(&self, species_id: i64, feature: &str) -> Option<&OverrideParams> {
        self.by_species
            .get(&species_id)
            .and_then(|features| features.get(feature))
    }

    /// Merge overrides with the feature's configuration defaults.
    ///
    /// Resolution is per field: an explicit value wins even when it is 0.0;
    /// only absent fields fall back to the defaults.
    pub fn resolve(
        &self,
        feature: &FeatureConfig,
        species_id: i64,
    ) -> ResolvedParams {
        let overrides = self.get(species_id, &feature.name);
        ResolvedParams {
            score_method: overrides
                .and_then(|o| o.score_method.clone())
                .unwrap_or_else(|| feature.score_method.clone()),
            weight: overrides
                .and_then(|o| o.weight)
                .unwrap_or(feature.default_weight),
            trap_left_tol: overrides
                .and_then(|o| o.trap_left_tol)
                .unwrap_or(feature.tolerance.left),
            trap_right_tol: overrides
                .and_then(|o| o.trap_right_tol)
                .unwrap_or(feature.tolerance.right),
        }
    }
}

/// Fully resolved rule parameters for one (species, feature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParams {
    pub score_method: String,
    pub weight: f64,
    pub trap_left_tol: f64,
    pub trap_right_tol: f64,
}

/// The three scoring shapes, resolved against one species profile.
///
/// Bounds and preferences keep their raw typed values so scoring can still
/// distinguish "absent" from "present but not numeric".
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreMethod {
    NumRange {
        min: Option<FieldValue>,
        max: Option<FieldValue>,
    },
    Trapezoid {
        min: Option<FieldValue>,
        max: Option<FieldValue>,
        left_tol: f64,
        right_tol: f64,
    },
    CatExact {
        preferred: Option<Vec<String>>,
        exact_score: f64,
    },
}

/// One precompiled scoring rule for a (species, feature) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRule {
    pub feature: String,
    pub short: String,
    pub kind: TraceKind,
    pub weight: f64,
    pub method: ScoreMethod,
    pub params: ResolvedParams,
}

/// Compile the scoring rule list for one species, in config feature order.
///
/// Unknown score methods and feature types are fatal: they are deployment
/// bugs, and surfacing them here aborts the batch before any farm runs.
pub fn compile_species_rules(
    species: &SpeciesProfile,
    overrides: &OverrideIndex,
    config: &EngineConfig,
) -> Result<Vec<ScoringRule>, EngineError> {
    let mut rules = Vec::with_capacity(config.features.len());
    for feature in &config.features {
        let params = overrides.resolve(feature, species.id);
        let method = match feature.kind.as_str() {
            "numeric" => compile_numeric(species, feature, &params)?,
            "categorical" => compile_categorical(species, feature, &params)?,
            other => {
                return Err(EngineError::UnknownFeatureType {
                    feature: feature.name.clone(),
                    kind: other.to_string(),
                })
            }
        };
        let kind = match method {
            ScoreMethod::CatExact { .. } => TraceKind::Categorical,
            _ => TraceKind::Numerical,
        };
        rules.push(ScoringRule {
            feature: feature.name.clone(),
            short: feature.short.clone(),
            kind,
            weight: params.weight,
            method,
            params,
        });
    }
    Ok(rules)
}

fn compile_numeric(
    species: &SpeciesProfile,
    feature: &FeatureConfig,
    params: &ResolvedParams,
) -> Result<ScoreMethod, EngineError> {
    let min = species.attribute(&feature.min_column()).cloned();
    let max = species.attribute(&feature.max_column()).cloned();
    match params.score_method.as_str() {
        "num_range" => Ok(ScoreMethod::NumRange { min, max }),
        "trapezoid" => {
            if let (Some(lo), Some(hi)) = (
                min.as_ref().and_then(FieldValue::as_f64),
                max.as_ref().and_then(FieldValue::as_f64),
            ) {
                if hi < lo {
                    return Err(EngineError::InvalidRange {
                        feature: feature.name.clone(),
                        species_id: species.id,
                        min: lo,
                        max: hi,
                    });
                }
            }
            Ok(ScoreMethod::Trapezoid {
                min,
                max,
                left_tol: params.trap_left_tol,
                right_tol: params.trap_right_tol,
            })
        }
        other => Err(EngineError::UnknownNumericMethod {
            feature: feature.name.clone(),
            method: other.to_string(),
        }),
    }
}

fn compile_categorical(
    species: &SpeciesProfile,
    feature: &FeatureConfig,
    params: &ResolvedParams,
) -> Result<ScoreMethod, EngineError> {
    match params.score_method.as_str() {
        "cat_exact" => Ok(ScoreMethod::CatExact {
            preferred: species
                .attribute(&feature.preferred_column())
                .and_then(FieldValue::as_list),
            exact_score: feature.categorical.exact_match,
        }),
        other => Err(EngineError::UnknownCategoricalMethod {
            feature: feature.name.clone(),
            method: other.to_string(),
        }),
    }
}

/// Compile rule lists for a whole catalog, keyed by species id.
///
/// Overrides pointing at species ids outside the catalog are ignored; they
/// indicate stale import data, not a broken deployment.
pub fn compile_catalog_rules(
    catalog: &[SpeciesProfile],
    overrides: &OverrideIndex,
    config: &EngineConfig,
) -> Result<BTreeMap<i64, Vec<ScoringRule>>, EngineError> {
    let mut compiled = BTreeMap::new();
    for species in catalog {
        compiled.insert(
            species.id,
            compile_species_rules(species, overrides, config)?,
        );
    }
    for species_id in overrides.species_ids() {
        if !compiled.contains_key(&species_id) {
            warn!(species_id, "ignoring parameter overrides for unknown species");
        }
    }
    Ok(compiled)
}
