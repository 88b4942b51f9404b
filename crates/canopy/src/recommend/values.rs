//! Value classification and coercion.
//!
//! Every raw cell entering the engine passes through [`classify`] exactly once.
//! Missing data is represented as an absent map entry, never as a sentinel
//! string, so downstream rule evaluation only ever deals with typed values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed farm or species attribute value.
///
/// `false` and `0` are ordinary values; only truly absent data is missing,
/// and missing data is modeled as the absence of a `FieldValue` altogether.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Numeric view of the value. Textual numbers parse; anything else is
    /// not evaluable.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Flag(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            FieldValue::Text(raw) => raw.trim().parse::<f64>().ok(),
            FieldValue::List(_) => None,
        }
    }

    /// Boolean view accepting flags, 0/1 numerics, and yes/no style text.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Number(n) => {
                if *n == 1.0 {
                    Some(true)
                } else if *n == 0.0 {
                    Some(false)
                } else {
                    None
                }
            }
            FieldValue::Text(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            FieldValue::List(_) => None,
        }
    }

    /// Trimmed string view used for categorical comparisons.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(raw) => Some(raw.trim().to_string()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Flag(flag) => Some(flag.to_string()),
            FieldValue::List(_) => None,
        }
    }

    /// Preference-set view: native lists pass through, delimited strings are
    /// split on comma/semicolon/slash/pipe. Empty results are not a set.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            FieldValue::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts)
                }
            }
            FieldValue::Text(raw) => split_delimited(raw),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(flag) => write!(f, "{flag}"),
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Text(raw) => write!(f, "{}", raw.trim()),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// The single missing-value predicate for raw text cells.
///
/// Blank strings and NA-style markers are missing. The check is applied at
/// ingestion only; typed values are never re-inspected.
pub fn is_missing_text(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || matches!(
            trimmed.to_ascii_lowercase().as_str(),
            "nan" | "none" | "na" | "n/a" | "null"
        )
}

/// Classify one raw text cell into a typed value, or `None` when missing.
///
/// Numeric-looking text becomes a number so comparisons never re-parse.
pub fn classify(raw: &str) -> Option<FieldValue> {
    if is_missing_text(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return Some(FieldValue::Number(n));
    }
    Some(FieldValue::Text(trimmed.to_string()))
}

/// Parse an optional raw numeric cell, treating unparsable text as missing.
pub fn classify_f64(raw: &str) -> Option<f64> {
    if is_missing_text(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok()
}

fn split_delimited(raw: &str) -> Option<Vec<String>> {
    if is_missing_text(raw) {
        return None;
    }
    let mut normalized = raw.to_string();
    for sep in [';', '/', '|'] {
        normalized = normalized.replace(sep, ",");
    }
    let parts: Vec<String> = normalized
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}
