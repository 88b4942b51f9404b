//! Exclusion engine: hard rule evaluation followed by dependency filtering.

pub mod dependency;
pub mod rules;

use std::collections::BTreeSet;

use crate::config::EngineConfig;

use self::dependency::DependencyRule;
use self::rules::{CompiledRule, RuleOutcome};
use super::domain::{ExcludedSpecies, ExclusionResult, FarmProfile, SpeciesProfile};

/// Run both exclusion phases for one farm.
///
/// Phase A partitions the catalog into candidates and excluded species;
/// Phase B (when enabled) can only move further candidates into the excluded
/// list. Candidate ids come back sorted for deterministic output.
pub fn run_exclusion(
    farm: &FarmProfile,
    catalog: &[SpeciesProfile],
    compiled_rules: &[CompiledRule],
    dependency_rules: &[DependencyRule],
    config: &EngineConfig,
    name_lookup: impl Fn(&str) -> Option<i64>,
) -> ExclusionResult {
    let mut candidates: BTreeSet<i64> = BTreeSet::new();
    let mut excluded: Vec<ExcludedSpecies> = Vec::new();

    for species in catalog {
        let mut reasons = Vec::new();
        for rule in compiled_rules {
            let farm_value = farm.value(&rule.farm_column);
            let species_value = species.attribute(&rule.species_column);
            match rule.evaluate(farm_value, species_value) {
                RuleOutcome::Pass | RuleOutcome::Skip => {}
                RuleOutcome::Fail => reasons.push(rule.format_reason(
                    farm_value,
                    species_value,
                    config.annotation.include_values,
                )),
            }
        }
        if reasons.is_empty() {
            candidates.insert(species.id);
        } else {
            excluded.push(ExcludedSpecies {
                id: species.id,
                species_name: species.name.clone(),
                species_common_name: species.common_name.clone(),
                reasons,
            });
        }
    }

    if config.dependency.enabled && !dependency_rules.is_empty() {
        let removed = dependency::filter_candidates(dependency_rules, &mut candidates, name_lookup);
        for (species_id, reason) in removed {
            if let Some(record) = excluded.iter_mut().find(|record| record.id == species_id) {
                record.reasons.push(reason);
            } else if let Some(species) = catalog.iter().find(|species| species.id == species_id) {
                excluded.push(ExcludedSpecies {
                    id: species.id,
                    species_name: species.name.clone(),
                    species_common_name: species.common_name.clone(),
                    reasons: vec![reason],
                });
            }
        }
    }

    ExclusionResult {
        candidate_ids: candidates.into_iter().collect(),
        excluded_species: excluded,
    }
}
