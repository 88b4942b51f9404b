//! Recommendation orchestration.
//!
//! The engine is built once per batch: scoring rules, exclusion rules, the
//! species name index, and dependency rules are all compiled up front and
//! then shared read-only across farms. Per-farm evaluation is pure, so a
//! batch can run sequentially or on the rayon pool with identical output.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;

use super::domain::{
    BatchResult, DependencyRow, ExclusionResult, FarmProfile, ParameterOverride, ScoredSpecies,
    SpeciesProfile,
};
use super::exclusion::dependency::{parse_dependency_rows, DependencyRule};
use super::exclusion::rules::{compile_rules, CompiledRule};
use super::exclusion::run_exclusion;
use super::params::{compile_catalog_rules, OverrideIndex, ScoringRule};
use super::ranking::build_recommendations;
use super::scoring::score_species;

/// Immutable evaluation context shared by every farm in a batch.
pub struct RecommendationEngine {
    config: EngineConfig,
    catalog: Vec<SpeciesProfile>,
    scoring_rules: BTreeMap<i64, Vec<ScoringRule>>,
    exclusion_rules: Vec<CompiledRule>,
    dependency_rules: Vec<DependencyRule>,
    name_index: HashMap<String, i64>,
}

impl RecommendationEngine {
    /// Compile the full rule set for a catalog.
    ///
    /// Fails fast on configuration errors so a broken deployment aborts the
    /// batch before any farm is evaluated.
    pub fn new(
        catalog: Vec<SpeciesProfile>,
        config: EngineConfig,
        overrides: &[ParameterOverride],
        dependency_rows: &[DependencyRow],
    ) -> Result<Self, EngineError> {
        let override_index = OverrideIndex::from_rows(overrides);
        let scoring_rules = compile_catalog_rules(&catalog, &override_index, &config)?;
        let exclusion_rules = compile_rules(&config);
        let dependency_rules = parse_dependency_rows(dependency_rows, &config.dependency);

        let name_index = catalog
            .iter()
            .map(|species| (species.name.trim().to_lowercase(), species.id))
            .collect();

        debug!(
            species = catalog.len(),
            exclusion_rules = exclusion_rules.len(),
            dependency_rules = dependency_rules.len(),
            "recommendation engine compiled"
        );

        Ok(Self {
            config,
            catalog,
            scoring_rules,
            exclusion_rules,
            dependency_rules,
            name_index,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &[SpeciesProfile] {
        &self.catalog
    }

    fn lookup_species_id(&self, name: &str) -> Option<i64> {
        self.name_index.get(&name.trim().to_lowercase()).copied()
    }

    /// Partition the catalog into candidates and excluded species for one
    /// farm. With exclusions disabled every species is a candidate.
    pub fn run_exclusion(&self, farm: &FarmProfile) -> ExclusionResult {
        if !self.config.enable_exclusions {
            return ExclusionResult {
                candidate_ids: self.catalog.iter().map(|species| species.id).collect(),
                excluded_species: Vec::new(),
            };
        }
        run_exclusion(
            farm,
            &self.catalog,
            &self.exclusion_rules,
            &self.dependency_rules,
            &self.config,
            |name| self.lookup_species_id(name),
        )
    }

    /// Score the given candidate ids against one farm, in catalog order.
    pub fn score_candidates(&self, farm: &FarmProfile, candidate_ids: &[i64]) -> Vec<ScoredSpecies> {
        self.catalog
            .iter()
            .filter(|species| candidate_ids.contains(&species.id))
            .filter_map(|species| {
                self.scoring_rules
                    .get(&species.id)
                    .map(|rules| score_species(farm, species, rules))
            })
            .collect()
    }

    fn evaluate_at(&self, farm: &FarmProfile, timestamp_utc: &str) -> BatchResult {
        let exclusions = self.run_exclusion(farm);
        let scored = self.score_candidates(farm, &exclusions.candidate_ids);
        let recommendations = build_recommendations(scored);

        BatchResult {
            farm_id: farm.id,
            timestamp_utc: timestamp_utc.to_string(),
            recommendations,
            excluded_species: exclusions.excluded_species,
        }
    }

    /// Evaluate one farm, stamped with the current time.
    pub fn recommend(&self, farm: &FarmProfile) -> BatchResult {
        self.evaluate_at(farm, &format_timestamp(Utc::now()))
    }

    /// Evaluate a batch of farms in input order with one shared timestamp.
    pub fn run_batch(&self, farms: &[FarmProfile]) -> Vec<BatchResult> {
        let timestamp = format_timestamp(Utc::now());
        self.run_batch_at(farms, &timestamp)
    }

    /// Evaluate a batch on the rayon pool. Results stay in input farm order
    /// and are identical to the sequential path.
    pub fn run_batch_parallel(&self, farms: &[FarmProfile]) -> Vec<BatchResult> {
        let timestamp = format_timestamp(Utc::now());
        farms
            .par_iter()
            .map(|farm| self.evaluate_at(farm, &timestamp))
            .collect()
    }

    pub(crate) fn run_batch_at(&self, farms: &[FarmProfile], timestamp_utc: &str) -> Vec<BatchResult> {
        farms
            .iter()
            .map(|farm| self.evaluate_at(farm, timestamp_utc))
            .collect()
    }
}

/// ISO-8601 UTC timestamp at second precision with the `Z` suffix.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
