//! Hard exclusion rule compilation and evaluation.
//!
//! Rule specs name columns directly or through symbolic keys; both forms are
//! resolved into concrete columns once at compile time. Evaluation is
//! tri-state: a rule that cannot be evaluated is skipped and can never
//! exclude a species.

use tracing::warn;

use crate::config::EngineConfig;

use super::super::values::FieldValue;

/// Exclusion operators as a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    InSet,
    RequiresTrue,
}

impl RuleOp {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            ">=" => Some(RuleOp::Ge),
            "<=" => Some(RuleOp::Le),
            ">" => Some(RuleOp::Gt),
            "<" => Some(RuleOp::Lt),
            "=" | "==" => Some(RuleOp::Eq),
            "in_set" => Some(RuleOp::InSet),
            "requires_true" => Some(RuleOp::RequiresTrue),
            _ => None,
        }
    }

    fn is_comparison(self) -> bool {
        matches!(
            self,
            RuleOp::Ge | RuleOp::Le | RuleOp::Gt | RuleOp::Lt | RuleOp::Eq
        )
    }
}

/// Outcome of evaluating one rule against one species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail,
    /// Required inputs were missing or unparsable; the rule does not apply.
    Skip,
}

/// A rule with its column indirection fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: String,
    pub farm_column: String,
    pub species_column: String,
    pub op: RuleOp,
    pub reason: String,
    pub reason_template: Option<String>,
}

fn resolve_column(
    direct: Option<&String>,
    symbolic: Option<&String>,
    map: &std::collections::BTreeMap<String, String>,
) -> Option<String> {
    if let Some(column) = direct {
        let trimmed = column.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    symbolic.and_then(|key| map.get(key.trim()).cloned())
}

/// Resolve every rule spec into a compiled rule.
///
/// Specs with an unknown operator or an unresolvable column can never apply,
/// so they are dropped here instead of being re-skipped on every evaluation.
pub fn compile_rules(config: &EngineConfig) -> Vec<CompiledRule> {
    let mut compiled = Vec::with_capacity(config.rules.len());
    for spec in &config.rules {
        let op = match RuleOp::parse(&spec.op) {
            Some(op) => op,
            None => {
                warn!(rule = %spec.id, op = %spec.op, "dropping rule with unknown operator");
                continue;
            }
        };
        let farm_column = resolve_column(
            spec.farm_column.as_ref(),
            spec.farm.as_ref(),
            &config.farm_columns,
        );
        let species_column = resolve_column(
            spec.species_column.as_ref(),
            spec.species.as_ref(),
            &config.species_columns,
        );
        let (farm_column, species_column) = match (farm_column, species_column) {
            (Some(farm), Some(species)) => (farm, species),
            _ => {
                warn!(rule = %spec.id, "dropping rule with unresolvable column");
                continue;
            }
        };
        compiled.push(CompiledRule {
            id: spec.id.clone(),
            farm_column,
            species_column,
            op,
            reason: spec
                .reason
                .clone()
                .unwrap_or_else(|| "excluded: rule failed".to_string()),
            reason_template: spec.reason_template.clone(),
        });
    }
    compiled
}

impl CompiledRule {
    /// Evaluate this rule for one species. Pass means the species survives
    /// the rule; Fail contributes an exclusion reason; Skip contributes
    /// nothing.
    pub fn evaluate(
        &self,
        farm_value: Option<&FieldValue>,
        species_value: Option<&FieldValue>,
    ) -> RuleOutcome {
        if self.op.is_comparison() {
            let farm = farm_value.and_then(FieldValue::as_f64);
            let species = species_value.and_then(FieldValue::as_f64);
            return match (farm, species) {
                (Some(farm), Some(species)) => {
                    let holds = match self.op {
                        RuleOp::Ge => farm >= species,
                        RuleOp::Le => farm <= species,
                        RuleOp::Gt => farm > species,
                        RuleOp::Lt => farm < species,
                        RuleOp::Eq => farm == species,
                        RuleOp::InSet | RuleOp::RequiresTrue => unreachable!(),
                    };
                    if holds {
                        RuleOutcome::Pass
                    } else {
                        RuleOutcome::Fail
                    }
                }
                _ => RuleOutcome::Skip,
            };
        }

        match self.op {
            RuleOp::InSet => {
                let farm = farm_value.and_then(FieldValue::as_text);
                let allowed = species_value.and_then(FieldValue::as_list);
                match (farm, allowed) {
                    (Some(farm), Some(allowed)) => {
                        let farm = farm.to_lowercase();
                        if allowed
                            .iter()
                            .any(|candidate| candidate.to_lowercase() == farm)
                        {
                            RuleOutcome::Pass
                        } else {
                            RuleOutcome::Fail
                        }
                    }
                    _ => RuleOutcome::Skip,
                }
            }
            RuleOp::RequiresTrue => {
                match farm_value.and_then(FieldValue::as_bool) {
                    // Habitat constraint not applicable to this farm.
                    None | Some(false) => RuleOutcome::Pass,
                    Some(true) => match species_value.and_then(FieldValue::as_bool) {
                        Some(true) => RuleOutcome::Pass,
                        Some(false) => RuleOutcome::Fail,
                        None => RuleOutcome::Skip,
                    },
                }
            }
            _ => RuleOutcome::Skip,
        }
    }

    /// Render the exclusion reason for a failed evaluation.
    pub fn format_reason(
        &self,
        farm_value: Option<&FieldValue>,
        species_value: Option<&FieldValue>,
        include_values: bool,
    ) -> String {
        let farm_text = display_value(farm_value);
        let species_text = display_value(species_value);

        let base = match &self.reason_template {
            Some(template) if !template.trim().is_empty() => template
                .trim()
                .replace("{farm_val}", &farm_text)
                .replace("{species_val}", &species_text),
            _ => self.reason.clone(),
        };

        if !include_values {
            return base;
        }

        if self.op.is_comparison() {
            format!("{base} (farm={farm_text}, threshold={species_text})")
        } else if self.op == RuleOp::InSet {
            format!("{base} (farm={farm_text}, allowed={species_text})")
        } else {
            format!("{base} (farm_flag={farm_text}, species_flag={species_text})")
        }
    }
}

fn display_value(value: Option<&FieldValue>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "missing".to_string(),
    }
}
