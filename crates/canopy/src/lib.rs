//! Canopy: tree species recommendation core.
//!
//! A pure, in-process library that shrinks a species catalog to viable
//! candidates for a farm plot, scores each candidate against the farm's
//! environmental profile, and produces a deterministic, explained ranking.
//! Persistence, HTTP, and geospatial attribute derivation live in separate
//! collaborators; this crate only computes.

pub mod config;
pub mod error;
pub mod recommend;
pub mod telemetry;

pub use config::EngineConfig;
pub use error::EngineError;
pub use recommend::{
    BatchResult, DependencyRow, ExcludedSpecies, ExclusionResult, FarmProfile, FieldValue,
    ParameterOverride, RecommendationEngine, RecommendationEntry, ScoredSpecies, SpeciesProfile,
};
