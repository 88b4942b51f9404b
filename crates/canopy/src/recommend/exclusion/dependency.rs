//! Companion-species dependency rules.
//!
//! Raw dependency rows come from spreadsheet exports whose headers carry
//! stray whitespace; keys and values are trimmed here, once, at parse time.
//! Filtering is deliberately single pass in row order: chains resolve only
//! as far as row ordering allows, and cycles terminate because each focal
//! species is visited exactly once.

use std::collections::BTreeSet;

use crate::config::DependencyConfig;

use super::super::values;
use super::super::domain::DependencyRow;

/// A focal species and the partners that keep it viable.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRule {
    pub focal_species_name: String,
    pub good_partners: Vec<String>,
    pub reason: String,
}

/// Normalize raw rows into dependency rules.
///
/// Rows without a usable focal species or partner list carry no constraint
/// and are dropped.
pub fn parse_dependency_rows(
    rows: &[DependencyRow],
    config: &DependencyConfig,
) -> Vec<DependencyRule> {
    let mut rules = Vec::new();
    for row in rows {
        let mut focal = None;
        let mut partners: Vec<String> = Vec::new();
        for (key, value) in &row.values {
            let key = key.trim();
            if key == config.focal_key {
                if !values::is_missing_text(value) {
                    focal = Some(value.trim().to_string());
                }
            } else if key == config.partners_key {
                partners = values::FieldValue::Text(value.clone())
                    .as_list()
                    .unwrap_or_default();
            }
        }
        if let Some(focal) = focal {
            if !partners.is_empty() {
                rules.push(DependencyRule {
                    focal_species_name: focal,
                    good_partners: partners,
                    reason: config.reason.clone(),
                });
            }
        }
    }
    rules
}

/// Apply dependency rules to the current candidate set, single pass.
///
/// Returns the ids removed, in rule order. A focal species is removed only
/// when none of its partners are currently candidates; mutually dependent
/// candidates therefore keep each other alive.
pub fn filter_candidates(
    rules: &[DependencyRule],
    candidates: &mut BTreeSet<i64>,
    lookup: impl Fn(&str) -> Option<i64>,
) -> Vec<(i64, String)> {
    let mut removed = Vec::new();
    for rule in rules {
        let focal_id = match lookup(&rule.focal_species_name) {
            Some(id) if candidates.contains(&id) => id,
            _ => continue,
        };
        let partner_present = rule
            .good_partners
            .iter()
            .filter_map(|partner| lookup(partner))
            .any(|partner_id| candidates.contains(&partner_id));
        if !partner_present {
            candidates.remove(&focal_id);
            removed.push((focal_id, rule.reason.clone()));
        }
    }
    removed
}
