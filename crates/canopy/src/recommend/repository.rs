//! Flat-file ingestion for farms, species, overrides, and dependency rows.
//!
//! These loaders exist for the CLI and for test fixtures; the engine itself
//! never reads the filesystem. All missing-value classification happens
//! here, so records enter the engine fully typed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::warn;

use crate::config::EngineConfig;

use super::domain::{DependencyRow, FarmProfile, ParameterOverride, SpeciesProfile};
use super::values;

/// Error raised while loading engine inputs from disk.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to read input file")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV input")]
    Csv(#[from] csv::Error),
    #[error("required column '{column}' not found in {input}")]
    MissingColumn { input: String, column: String },
}

fn reader_for<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn column_index(
    headers: &StringRecord,
    column: &str,
    input: &str,
) -> Result<usize, RepositoryError> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| RepositoryError::MissingColumn {
            input: input.to_string(),
            column: column.to_string(),
        })
}

fn parse_id(record: &StringRecord, index: usize) -> Option<i64> {
    record
        .get(index)
        .and_then(values::classify_f64)
        .map(|id| id as i64)
}

/// Load farm profiles, classifying every cell once.
pub fn load_farms<R: Read>(
    source: R,
    config: &EngineConfig,
) -> Result<Vec<FarmProfile>, RepositoryError> {
    let mut reader = reader_for(source);
    let headers = reader.headers()?.clone();
    let id_index = column_index(&headers, &config.ids.farm, "farms")?;

    let mut farms = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = match parse_id(&record, id_index) {
            Some(id) => id,
            None => {
                warn!("skipping farm row without a usable id");
                continue;
            }
        };
        let mut farm = FarmProfile::new(id);
        for (index, header) in headers.iter().enumerate() {
            if index == id_index {
                continue;
            }
            if let Some(value) = record.get(index).and_then(values::classify) {
                farm.values.insert(header.trim().to_string(), value);
            }
        }
        farms.push(farm);
    }
    Ok(farms)
}

pub fn load_farms_from_path(
    path: impl AsRef<Path>,
    config: &EngineConfig,
) -> Result<Vec<FarmProfile>, RepositoryError> {
    load_farms(File::open(path)?, config)
}

/// Load the species catalog.
pub fn load_species<R: Read>(
    source: R,
    config: &EngineConfig,
) -> Result<Vec<SpeciesProfile>, RepositoryError> {
    let mut reader = reader_for(source);
    let headers = reader.headers()?.clone();
    let id_index = column_index(&headers, &config.ids.species, "species")?;
    let name_index = column_index(&headers, &config.names.species_name, "species")?;
    let common_index = column_index(&headers, &config.names.species_common_name, "species")?;

    let mut catalog = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = match parse_id(&record, id_index) {
            Some(id) => id,
            None => {
                warn!("skipping species row without a usable id");
                continue;
            }
        };
        let name = record.get(name_index).unwrap_or_default().trim();
        let common_name = record.get(common_index).unwrap_or_default().trim();
        let mut species = SpeciesProfile::new(id, name, common_name);
        for (index, header) in headers.iter().enumerate() {
            if index == id_index || index == name_index || index == common_index {
                continue;
            }
            if let Some(value) = record.get(index).and_then(values::classify) {
                species.attributes.insert(header.trim().to_string(), value);
            }
        }
        catalog.push(species);
    }
    Ok(catalog)
}

pub fn load_species_from_path(
    path: impl AsRef<Path>,
    config: &EngineConfig,
) -> Result<Vec<SpeciesProfile>, RepositoryError> {
    load_species(File::open(path)?, config)
}

/// Load parameter override rows.
///
/// Cells are classified with the canonical missing predicate: blank and
/// NA-style markers, and non-numeric weights or tolerances, all become
/// absent fields rather than errors.
pub fn load_overrides<R: Read>(
    source: R,
    config: &EngineConfig,
) -> Result<Vec<ParameterOverride>, RepositoryError> {
    let mut reader = reader_for(source);
    let headers = reader.headers()?.clone();
    let id_index = column_index(&headers, &config.ids.species, "species parameters")?;
    let feature_index = column_index(&headers, "feature", "species parameters")?;
    let method_index = headers.iter().position(|h| h.trim() == "score_method");
    let weight_index = headers.iter().position(|h| h.trim() == "weight");
    let left_index = headers.iter().position(|h| h.trim() == "trap_left_tol");
    let right_index = headers.iter().position(|h| h.trim() == "trap_right_tol");

    let text_at = |record: &StringRecord, index: Option<usize>| -> Option<String> {
        index
            .and_then(|index| record.get(index))
            .filter(|raw| !values::is_missing_text(raw))
            .map(|raw| raw.trim().to_string())
    };
    let number_at = |record: &StringRecord, index: Option<usize>| -> Option<f64> {
        index
            .and_then(|index| record.get(index))
            .and_then(values::classify_f64)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let species_id = match parse_id(&record, id_index) {
            Some(id) => id,
            None => {
                warn!("skipping override row without a usable species id");
                continue;
            }
        };
        let feature = match record.get(feature_index) {
            Some(feature) if !values::is_missing_text(feature) => feature.trim().to_string(),
            _ => {
                warn!(species_id, "skipping override row without a feature name");
                continue;
            }
        };
        rows.push(ParameterOverride {
            species_id,
            feature,
            score_method: text_at(&record, method_index),
            weight: number_at(&record, weight_index),
            trap_left_tol: number_at(&record, left_index),
            trap_right_tol: number_at(&record, right_index),
        });
    }
    Ok(rows)
}

pub fn load_overrides_from_path(
    path: impl AsRef<Path>,
    config: &EngineConfig,
) -> Result<Vec<ParameterOverride>, RepositoryError> {
    load_overrides(File::open(path)?, config)
}

/// Load raw dependency rows, headers kept verbatim.
///
/// Header whitespace is preserved here on purpose: normalization is the
/// dependency parser's contract, and these rows exercise it.
pub fn load_dependency_rows<R: Read>(source: R) -> Result<Vec<DependencyRow>, RepositoryError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(source);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = DependencyRow::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(value) = record.get(index) {
                row.values.insert(header.to_string(), value.to_string());
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_dependency_rows_from_path(
    path: impl AsRef<Path>,
) -> Result<Vec<DependencyRow>, RepositoryError> {
    load_dependency_rows(File::open(path)?)
}
