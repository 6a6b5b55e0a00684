// Per-row range checks against the configured bounds

use pcinn_config::ValidationBounds;
use pcinn_core::{CanonicalField, ParsedRow, RowError};

/// Whole numbers keep one decimal ("5.0 mol/L"), others print as-is.
fn format_limit(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Check one row. Empty when every field is inside its bound.
pub fn validate_row(row: &ParsedRow, bounds: &ValidationBounds) -> Vec<RowError> {
    CanonicalField::ALL
        .into_iter()
        .filter_map(|field| {
            let bound = bounds.for_field(field);
            let value = row.get(field);
            let message = if value < bound.min {
                format!("Min {} {}", format_limit(bound.min), field.unit())
            } else if value > bound.max {
                format!("Max {} {}", format_limit(bound.max), field.unit())
            } else {
                return None;
            };
            Some(RowError { row_index: row.row_index, field, message })
        })
        .collect()
}

/// Split rows into those that pass and the errors of those that don't.
pub fn validate_rows(rows: &[ParsedRow], bounds: &ValidationBounds) -> (Vec<ParsedRow>, Vec<RowError>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for row in rows {
        let row_errors = validate_row(row, bounds);
        if row_errors.is_empty() {
            valid.push(*row);
        } else {
            errors.extend(row_errors);
        }
    }

    (valid, errors)
}
