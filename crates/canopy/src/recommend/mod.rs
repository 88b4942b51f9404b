//! Suitability scoring and exclusion rules engine.
//!
//! The pipeline per farm is exclusion -> scoring -> ranking, orchestrated by
//! [`RecommendationEngine`]. All catalog-wide state (resolved parameters,
//! compiled rules, name index) is built once per batch and shared read-only.

pub mod domain;
pub mod engine;
pub mod exclusion;
pub mod params;
pub mod ranking;
pub mod repository;
pub mod scoring;
pub mod values;

#[cfg(test)]
mod tests;

pub use domain::{
    BatchResult, DependencyRow, ExcludedSpecies, ExclusionResult, FarmProfile, FeatureTrace,
    ParameterOverride, RecommendationEntry, ScoredSpecies, SpeciesProfile, TraceKind,
};
pub use engine::RecommendationEngine;
pub use exclusion::dependency::DependencyRule;
pub use exclusion::rules::{CompiledRule, RuleOp, RuleOutcome};
pub use params::{OverrideIndex, ResolvedParams, ScoreMethod, ScoringRule};
pub use repository::RepositoryError;
pub use values::FieldValue;
