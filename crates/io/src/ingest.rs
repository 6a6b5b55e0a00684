//! File bytes to validated, unit-canonical rows.
//!
//! Schema problems (unsupported file, missing columns, unit conflicts, row
//! ceiling) are fatal and produce no rows. Range problems are per-row and end
//! up in [`IngestResult::errors`].

use std::path::Path;

use serde::Serialize;

use pcinn_config::{Settings, ValidationBounds};
use pcinn_core::{CanonicalField, ParsedRow, RowError};

use crate::codec::{codec, Cell, FileKind};
use crate::error::IngestError;
use crate::headers::canonicalize;
use crate::units::{resolve, Thresholds, UnitResolution};
use crate::validate::validate_rows;

/// Limits and thresholds for one ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub max_rows: usize,
    pub thresholds: Thresholds,
    pub bounds: ValidationBounds,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            thresholds: Thresholds::default(),
            bounds: ValidationBounds::default(),
        }
    }
}

impl IngestOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_rows: settings.ingest.max_rows,
            thresholds: Thresholds {
                temperature_crossover: settings.ingest.temperature_crossover,
                time_crossover: settings.ingest.time_crossover,
            },
            bounds: settings.bounds.clone(),
        }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResult {
    /// Every complete row, in file order.
    pub rows: Vec<ParsedRow>,
    /// Range violations, one per field per row.
    pub errors: Vec<RowError>,
    /// Rows with no violations.
    pub valid: Vec<ParsedRow>,
    pub resolution: UnitResolution,
    /// Rows dropped because a field was missing or not numeric.
    pub skipped_incomplete: usize,
}

/// Ingest an uploaded file. `file_name` only decides the format.
pub fn ingest(file_name: &str, bytes: &[u8], opts: &IngestOptions) -> Result<IngestResult, IngestError> {
    let kind = FileKind::from_name(file_name)?;
    let table = codec().decode(kind, bytes)?;

    let Some((header_row, data_rows)) = table.rows.split_first() else {
        return Err(IngestError::EmptyFile);
    };
    if data_rows.is_empty() {
        return Err(IngestError::NoDataRows);
    }

    let headers = canonicalize(header_row)?;
    let missing = headers.missing();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    if data_rows.len() > opts.max_rows {
        return Err(IngestError::TooManyRows {
            count: data_rows.len(),
            max: opts.max_rows,
        });
    }

    // Column index per field; coverage was checked above.
    let columns: Vec<usize> = CanonicalField::ALL
        .iter()
        .filter_map(|f| headers.column_for(*f))
        .collect();

    let numeric: Vec<[Option<f64>; 5]> = data_rows
        .iter()
        .map(|row| {
            let mut values = [None; 5];
            for (slot, &col) in values.iter_mut().zip(&columns) {
                *slot = row.get(col).and_then(Cell::as_number);
            }
            values
        })
        .collect();

    let column_values = |field: CanonicalField| -> Vec<f64> {
        numeric.iter().filter_map(|v| v[field.index()]).collect()
    };
    let resolution = resolve(
        &headers.hints,
        &column_values(CanonicalField::TemperatureK),
        &column_values(CanonicalField::TimeS),
        &opts.thresholds,
    )?;

    let mut rows = Vec::with_capacity(numeric.len());
    let mut skipped_incomplete = 0;
    for (i, values) in numeric.iter().enumerate() {
        let row_index = table.first_row + 1 + i;
        if values.iter().all(Option::is_none) {
            continue;
        }
        let [Some(m), Some(s), Some(init), Some(temp), Some(time)] = *values else {
            log::debug!("row {row_index}: dropping incomplete row");
            skipped_incomplete += 1;
            continue;
        };
        rows.push(ParsedRow::from_values(
            row_index,
            [m, s, init, resolution.to_kelvin(temp), resolution.to_seconds(time)],
        ));
    }

    if rows.is_empty() {
        return Err(IngestError::NoCompleteRows);
    }

    let (valid, errors) = validate_rows(&rows, &opts.bounds);
    log::debug!(
        "ingested {}: {} rows, {} valid, {} errors",
        file_name,
        rows.len(),
        valid.len(),
        errors.len()
    );

    Ok(IngestResult {
        rows,
        errors,
        valid,
        resolution,
        skipped_incomplete,
    })
}

/// Read a file from disk and ingest it.
pub fn ingest_path(path: &Path, opts: &IngestOptions) -> Result<IngestResult, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io(format!("{}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ingest(&name, &bytes, opts)
}
