//! Header canonicalization.
//!
//! Maps free-form column headers onto the five canonical fields and records
//! which headers assert a unit. Concentration synonyms carry no unit; the
//! temperature and time spellings below are either explicit (one unit only)
//! or generic (no assertion).

use serde::Serialize;

use pcinn_core::CanonicalField;

use crate::codec::Cell;
use crate::error::IngestError;

/// Unit asserted by a header spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitHint {
    None,
    Celsius,
    Kelvin,
    Seconds,
    Minutes,
}

const HEADER_TABLE: &[(&str, CanonicalField, UnitHint)] = &[
    ("m_molar", CanonicalField::MMolar, UnitHint::None),
    ("[m]", CanonicalField::MMolar, UnitHint::None),
    ("m", CanonicalField::MMolar, UnitHint::None),
    ("monomer", CanonicalField::MMolar, UnitHint::None),
    ("s_molar", CanonicalField::SMolar, UnitHint::None),
    ("[s]", CanonicalField::SMolar, UnitHint::None),
    ("s", CanonicalField::SMolar, UnitHint::None),
    ("solvent", CanonicalField::SMolar, UnitHint::None),
    ("i_molar", CanonicalField::IMolar, UnitHint::None),
    ("[i]", CanonicalField::IMolar, UnitHint::None),
    ("i", CanonicalField::IMolar, UnitHint::None),
    ("initiator", CanonicalField::IMolar, UnitHint::None),
    ("temperature_k", CanonicalField::TemperatureK, UnitHint::Kelvin),
    ("temp_k", CanonicalField::TemperatureK, UnitHint::Kelvin),
    ("temp (k)", CanonicalField::TemperatureK, UnitHint::Kelvin),
    ("temperature (k)", CanonicalField::TemperatureK, UnitHint::Kelvin),
    ("temperature_c", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temp_c", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temp (°c)", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temperature (°c)", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temp (c)", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temperature (c)", CanonicalField::TemperatureK, UnitHint::Celsius),
    ("temperature", CanonicalField::TemperatureK, UnitHint::None),
    ("temp", CanonicalField::TemperatureK, UnitHint::None),
    ("time_s", CanonicalField::TimeS, UnitHint::Seconds),
    ("time (s)", CanonicalField::TimeS, UnitHint::Seconds),
    ("time (sec)", CanonicalField::TimeS, UnitHint::Seconds),
    ("time (seconds)", CanonicalField::TimeS, UnitHint::Seconds),
    ("time_min", CanonicalField::TimeS, UnitHint::Minutes),
    ("time (min)", CanonicalField::TimeS, UnitHint::Minutes),
    ("time (minutes)", CanonicalField::TimeS, UnitHint::Minutes),
    ("time", CanonicalField::TimeS, UnitHint::None),
];

/// Look up one header spelling.
pub fn canonical_field(header: &str) -> Option<(CanonicalField, UnitHint)> {
    let normalized = header.trim().to_lowercase();
    HEADER_TABLE
        .iter()
        .find(|(spelling, _, _)| *spelling == normalized)
        .map(|&(_, field, hint)| (field, hint))
}

/// Unit assertions found in the header row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitHints {
    pub explicit_celsius: bool,
    pub explicit_kelvin: bool,
    pub explicit_seconds: bool,
    pub explicit_minutes: bool,
}

/// Canonicalized header row.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    pub hints: UnitHints,
    /// Column chosen for each field, indexed by `CanonicalField::index`.
    selected: [Option<usize>; 5],
}

impl HeaderMap {
    /// Column feeding `field`. The first matching column wins, except that a
    /// unit-explicit header replaces an earlier generic one.
    pub fn column_for(&self, field: CanonicalField) -> Option<usize> {
        self.selected[field.index()]
    }

    /// Required fields with no column, in schema order.
    pub fn missing(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| self.column_for(*f).is_none())
            .collect()
    }
}

/// Canonicalize a raw header row.
///
/// Fails when one header asserts Celsius and another Kelvin, or one asserts
/// seconds and another minutes.
pub fn canonicalize(header_row: &[Cell]) -> Result<HeaderMap, IngestError> {
    let mut selected: [Option<(usize, UnitHint)>; 5] = [None; 5];
    let mut hints = UnitHints::default();
    let mut temperature_spelling: Option<(UnitHint, String)> = None;
    let mut time_spelling: Option<(UnitHint, String)> = None;

    for (col, cell) in header_row.iter().enumerate() {
        let text = cell.as_text();
        let Some((field, hint)) = canonical_field(&text) else {
            continue;
        };

        match selected[field.index()] {
            None => selected[field.index()] = Some((col, hint)),
            Some((_, UnitHint::None)) if hint != UnitHint::None => {
                log::debug!("column '{}' states its unit; preferring it for {}", text.trim(), field);
                selected[field.index()] = Some((col, hint));
            }
            Some(_) => {
                log::warn!("duplicate column '{}' for {}; using the first one", text.trim(), field);
            }
        }

        let slot = match hint {
            UnitHint::Celsius => {
                hints.explicit_celsius = true;
                Some(&mut temperature_spelling)
            }
            UnitHint::Kelvin => {
                hints.explicit_kelvin = true;
                Some(&mut temperature_spelling)
            }
            UnitHint::Seconds => {
                hints.explicit_seconds = true;
                Some(&mut time_spelling)
            }
            UnitHint::Minutes => {
                hints.explicit_minutes = true;
                Some(&mut time_spelling)
            }
            UnitHint::None => None,
        };

        if let Some(slot) = slot {
            match slot {
                Some((seen, first)) if *seen != hint => {
                    return Err(IngestError::UnitConflict {
                        field,
                        first: first.clone(),
                        second: text.trim().to_string(),
                    });
                }
                Some(_) => {}
                None => *slot = Some((hint, text.trim().to_string())),
            }
        }
    }

    Ok(HeaderMap {
        hints,
        selected: selected.map(|s| s.map(|(col, _)| col)),
    })
}
