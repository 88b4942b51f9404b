//! Fatal engine errors.
//!
//! Missing or unparsable data is never an error: it skips a rule or voids a
//! feature score. These variants all indicate a broken deployment
//! configuration or species dataset and abort the batch before any farm is
//! evaluated.

/// Raised while compiling the scoring rule set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown numeric scoring method '{method}' for feature '{feature}'")]
    UnknownNumericMethod { feature: String, method: String },
    #[error("unknown categorical scoring method '{method}' for feature '{feature}'")]
    UnknownCategoricalMethod { feature: String, method: String },
    #[error("unknown feature type '{kind}' for feature '{feature}'")]
    UnknownFeatureType { feature: String, kind: String },
    #[error(
        "invalid preference range for feature '{feature}' on species {species_id}: max ({max}) < min ({min})"
    )]
    InvalidRange {
        feature: String,
        species_id: i64,
        min: f64,
        max: f64,
    },
}
