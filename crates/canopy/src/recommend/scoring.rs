//! Per-feature scoring and weighted aggregation.
//!
//! Every candidate species is scored feature by feature using its
//! precompiled rules. A feature that cannot be evaluated scores `None` and
//! drops out of the aggregate; it never raises and never counts as zero.

use super::domain::{FarmProfile, FeatureTrace, ScoredSpecies, SpeciesProfile};
use super::params::{ScoreMethod, ScoringRule};
use super::values::FieldValue;

const REASON_MISSING_FARM: &str = "missing farm data";
const REASON_MISSING_SPECIES: &str = "missing species data";
const REASON_MISSING: &str = "missing data";

/// Derive trapezoid corners from a preference range and shoulder widths.
///
/// Corners satisfy a <= b <= c <= d: when the shoulders overlap (b > c) both
/// collapse to the midpoint of [a, d], preserving the plateau invariant.
pub fn derive_trapezoid(min: f64, max: f64, left_tol: f64, right_tol: f64) -> (f64, f64, f64, f64) {
    let a = min;
    let d = max;
    let mut b = a + left_tol;
    let mut c = d - right_tol;
    if b > c {
        let midpoint = (a + d) / 2.0;
        b = midpoint;
        c = midpoint;
    }
    (a, b, c, d)
}

fn trapezoid_score(value: f64, a: f64, b: f64, c: f64, d: f64) -> (f64, String) {
    if value < a {
        (0.0, "below minimum".to_string())
    } else if value < b {
        // Half-open ramp: a zero-width shoulder leaves this interval empty,
        // so the division is always well defined.
        (
            (value - a) / (b - a),
            format!("within left shoulder [{a}, {b}]"),
        )
    } else if value <= c {
        (1.0, format!("within plateau [{b}, {c}]"))
    } else if value <= d {
        (
            (d - value) / (d - c),
            format!("within right shoulder [{c}, {d}]"),
        )
    } else {
        (0.0, "above maximum".to_string())
    }
}

fn score_num_range(
    farm_value: Option<&FieldValue>,
    min: Option<&FieldValue>,
    max: Option<&FieldValue>,
) -> (Option<f64>, String) {
    let farm_value = match farm_value {
        Some(value) => value,
        None => return (None, REASON_MISSING_FARM.to_string()),
    };
    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min, max),
        _ => return (None, REASON_MISSING_SPECIES.to_string()),
    };
    match (farm_value.as_f64(), min.as_f64(), max.as_f64()) {
        (Some(value), Some(lo), Some(hi)) => {
            if value < lo {
                (Some(0.0), "below minimum".to_string())
            } else if value > hi {
                (Some(0.0), "above maximum".to_string())
            } else {
                (Some(1.0), "inside preferred range".to_string())
            }
        }
        _ => (None, REASON_MISSING.to_string()),
    }
}

fn score_trapezoid(
    farm_value: Option<&FieldValue>,
    min: Option<&FieldValue>,
    max: Option<&FieldValue>,
    left_tol: f64,
    right_tol: f64,
) -> (Option<f64>, String) {
    let farm_value = match farm_value {
        Some(value) => value,
        None => return (None, REASON_MISSING_FARM.to_string()),
    };
    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min, max),
        _ => return (None, REASON_MISSING_SPECIES.to_string()),
    };
    match (farm_value.as_f64(), min.as_f64(), max.as_f64()) {
        (Some(value), Some(lo), Some(hi)) => {
            let (a, b, c, d) = derive_trapezoid(lo, hi, left_tol, right_tol);
            let (score, reason) = trapezoid_score(value, a, b, c, d);
            (Some(score), reason)
        }
        _ => (None, REASON_MISSING.to_string()),
    }
}

fn score_cat_exact(
    farm_value: Option<&FieldValue>,
    preferred: Option<&Vec<String>>,
    exact_score: f64,
) -> (Option<f64>, String) {
    let preferred = match preferred {
        Some(preferred) if !preferred.is_empty() => preferred,
        _ => return (None, "missing or no preference".to_string()),
    };
    let farm_value = match farm_value.and_then(FieldValue::as_text) {
        Some(value) => value,
        None => return (None, "missing or no preference".to_string()),
    };
    if preferred.iter().any(|candidate| candidate == &farm_value) {
        (Some(exact_score), "exact match".to_string())
    } else {
        (Some(0.0), "no match".to_string())
    }
}

fn score_rule(rule: &ScoringRule, farm_value: Option<&FieldValue>) -> FeatureTrace {
    let (score, reason, preferred) = match &rule.method {
        ScoreMethod::NumRange { min, max } => {
            let (score, reason) = score_num_range(farm_value, min.as_ref(), max.as_ref());
            (score, reason, None)
        }
        ScoreMethod::Trapezoid {
            min,
            max,
            left_tol,
            right_tol,
        } => {
            let (score, reason) =
                score_trapezoid(farm_value, min.as_ref(), max.as_ref(), *left_tol, *right_tol);
            (score, reason, None)
        }
        ScoreMethod::CatExact {
            preferred,
            exact_score,
        } => {
            let (score, reason) = score_cat_exact(farm_value, preferred.as_ref(), *exact_score);
            (score, reason, preferred.clone())
        }
    };

    FeatureTrace {
        feature: rule.feature.clone(),
        short: rule.short.clone(),
        kind: rule.kind,
        farm_value: farm_value.cloned(),
        score,
        reason,
        params: rule.params.clone(),
        preferred,
    }
}

/// Score one candidate species against one farm.
///
/// The aggregate is a weighted arithmetic mean over features that produced a
/// score and carry positive weight; when nothing contributes the score is
/// exactly 0.0.
pub fn score_species(
    farm: &FarmProfile,
    species: &SpeciesProfile,
    rules: &[ScoringRule],
) -> ScoredSpecies {
    let mut features = Vec::with_capacity(rules.len());
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for rule in rules {
        let trace = score_rule(rule, farm.value(&rule.feature));
        if let Some(score) = trace.score {
            if rule.weight > 0.0 {
                numerator += rule.weight * score;
                denominator += rule.weight;
            }
        }
        features.push(trace);
    }

    let mcda_score = if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    ScoredSpecies {
        species_id: species.id,
        species_name: species.name.clone(),
        species_common_name: species.common_name.clone(),
        mcda_score,
        features,
    }
}
