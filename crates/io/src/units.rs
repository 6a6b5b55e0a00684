//! Unit resolution for the temperature and time columns.
//!
//! Header hints are authoritative. Without one, the column's value range
//! decides; when it cannot, ingestion fails rather than guessing.

use serde::Serialize;

use pcinn_core::CanonicalField;

use crate::error::IngestError;
use crate::headers::UnitHints;

const KELVIN_OFFSET: f64 = pcinn_core::api::KELVIN_OFFSET;
const SECONDS_PER_MINUTE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius,
    Kelvin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

/// Where a resolved unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Header,
    Heuristic,
    /// Column had no numeric values; treated as canonical.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolved<U> {
    pub unit: U,
    pub basis: Basis,
}

/// What the resolver decided for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitResolution {
    pub temperature: Resolved<TemperatureUnit>,
    pub time: Resolved<TimeUnit>,
}

impl UnitResolution {
    pub fn to_kelvin(&self, value: f64) -> f64 {
        match self.temperature.unit {
            TemperatureUnit::Celsius => value + KELVIN_OFFSET,
            TemperatureUnit::Kelvin => value,
        }
    }

    pub fn to_seconds(&self, value: f64) -> f64 {
        match self.time.unit {
            TimeUnit::Minutes => value * SECONDS_PER_MINUTE,
            TimeUnit::Seconds => value,
        }
    }

    /// True when any column is rewritten on the way in.
    pub fn converts(&self) -> bool {
        self.temperature.unit == TemperatureUnit::Celsius || self.time.unit == TimeUnit::Minutes
    }
}

/// Range crossovers used when a header does not name the unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Temperatures entirely below this are Celsius, entirely at or above are Kelvin.
    pub temperature_crossover: f64,
    /// A time column whose maximum exceeds this is already in seconds.
    pub time_crossover: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_crossover: 200.0,
            time_crossover: 598.0,
        }
    }
}

fn resolve_temperature(
    hints: &UnitHints,
    values: &[f64],
    crossover: f64,
) -> Option<Resolved<TemperatureUnit>> {
    if hints.explicit_celsius {
        return Some(Resolved { unit: TemperatureUnit::Celsius, basis: Basis::Header });
    }
    if hints.explicit_kelvin {
        return Some(Resolved { unit: TemperatureUnit::Kelvin, basis: Basis::Header });
    }
    if values.is_empty() {
        return Some(Resolved { unit: TemperatureUnit::Kelvin, basis: Basis::Empty });
    }

    if values.iter().all(|&v| v < crossover) {
        Some(Resolved { unit: TemperatureUnit::Celsius, basis: Basis::Heuristic })
    } else if values.iter().all(|&v| v >= crossover) {
        Some(Resolved { unit: TemperatureUnit::Kelvin, basis: Basis::Heuristic })
    } else {
        None
    }
}

fn resolve_time(hints: &UnitHints, values: &[f64], crossover: f64) -> Option<Resolved<TimeUnit>> {
    if hints.explicit_minutes {
        return Some(Resolved { unit: TimeUnit::Minutes, basis: Basis::Header });
    }
    if hints.explicit_seconds {
        return Some(Resolved { unit: TimeUnit::Seconds, basis: Basis::Header });
    }
    if values.is_empty() {
        return Some(Resolved { unit: TimeUnit::Seconds, basis: Basis::Empty });
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (max > crossover).then_some(Resolved { unit: TimeUnit::Seconds, basis: Basis::Heuristic })
}

/// Decide the units of the temperature and time columns.
///
/// `temperatures` and `times` hold the parsed values of each column with
/// missing cells already left out.
pub fn resolve(
    hints: &UnitHints,
    temperatures: &[f64],
    times: &[f64],
    thresholds: &Thresholds,
) -> Result<UnitResolution, IngestError> {
    let temperature = resolve_temperature(hints, temperatures, thresholds.temperature_crossover);
    let time = resolve_time(hints, times, thresholds.time_crossover);

    match (temperature, time) {
        (Some(temperature), Some(time)) => {
            let resolution = UnitResolution { temperature, time };
            if resolution.converts() {
                log::debug!(
                    "converting units: temperature {:?} ({:?}), time {:?} ({:?})",
                    temperature.unit,
                    temperature.basis,
                    time.unit,
                    time.basis
                );
            }
            Ok(resolution)
        }
        (temperature, time) => {
            let mut unresolved = Vec::new();
            if temperature.is_none() {
                unresolved.push(CanonicalField::TemperatureK);
            }
            if time.is_none() {
                unresolved.push(CanonicalField::TimeS);
            }
            Err(IngestError::AmbiguousUnits(unresolved))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> UnitHints {
        UnitHints::default()
    }

    #[test]
    fn test_explicit_celsius_converts() {
        let h = UnitHints { explicit_celsius: true, explicit_seconds: true, ..hints() };
        let r = resolve(&h, &[60.0], &[7200.0], &Thresholds::default()).unwrap();
        assert_eq!(r.temperature, Resolved { unit: TemperatureUnit::Celsius, basis: Basis::Header });
        assert!((r.to_kelvin(60.0) - 333.15).abs() < 1e-9);
        assert_eq!(r.to_seconds(7200.0), 7200.0);
    }

    #[test]
    fn test_explicit_kelvin_never_runs_heuristic() {
        // Values look like Celsius, but the header says Kelvin.
        let h = UnitHints { explicit_kelvin: true, explicit_seconds: true, ..hints() };
        let r = resolve(&h, &[60.0, 70.0], &[10.0], &Thresholds::default()).unwrap();
        assert_eq!(r.temperature.unit, TemperatureUnit::Kelvin);
        assert_eq!(r.to_kelvin(333.15), 333.15);
        assert!(!r.converts());
    }

    #[test]
    fn test_explicit_minutes_converts() {
        let h = UnitHints { explicit_kelvin: true, explicit_minutes: true, ..hints() };
        let r = resolve(&h, &[333.15], &[120.0], &Thresholds::default()).unwrap();
        assert_eq!(r.to_seconds(120.0), 7200.0);
        assert!(r.converts());
    }

    #[test]
    fn test_temperature_heuristic() {
        let h = UnitHints { explicit_seconds: true, ..hints() };
        let t = Thresholds::default();

        let r = resolve(&h, &[50.0, 60.0, 90.0], &[100.0], &t).unwrap();
        assert_eq!(r.temperature, Resolved { unit: TemperatureUnit::Celsius, basis: Basis::Heuristic });

        let r = resolve(&h, &[323.0, 350.0], &[100.0], &t).unwrap();
        assert_eq!(r.temperature, Resolved { unit: TemperatureUnit::Kelvin, basis: Basis::Heuristic });

        let err = resolve(&h, &[60.0, 340.0], &[100.0], &t).unwrap_err();
        assert_eq!(err, IngestError::AmbiguousUnits(vec![CanonicalField::TemperatureK]));
    }

    #[test]
    fn test_time_heuristic_only_confirms_seconds() {
        let h = UnitHints { explicit_kelvin: true, ..hints() };
        let t = Thresholds::default();

        let r = resolve(&h, &[333.0], &[60.0, 7200.0], &t).unwrap();
        assert_eq!(r.time, Resolved { unit: TimeUnit::Seconds, basis: Basis::Heuristic });

        let err = resolve(&h, &[333.0], &[30.0, 120.0], &t).unwrap_err();
        assert_eq!(err, IngestError::AmbiguousUnits(vec![CanonicalField::TimeS]));
    }

    #[test]
    fn test_both_ambiguous_listed_together() {
        let err = resolve(&hints(), &[60.0, 340.0], &[120.0], &Thresholds::default()).unwrap_err();
        assert_eq!(
            err,
            IngestError::AmbiguousUnits(vec![CanonicalField::TemperatureK, CanonicalField::TimeS])
        );
    }

    #[test]
    fn test_empty_columns_resolve_canonical() {
        let r = resolve(&hints(), &[], &[], &Thresholds::default()).unwrap();
        assert_eq!(r.temperature.basis, Basis::Empty);
        assert_eq!(r.time.basis, Basis::Empty);
        assert!(!r.converts());
    }

    #[test]
    fn test_custom_crossover() {
        let h = UnitHints { explicit_kelvin: true, ..hints() };
        let t = Thresholds { time_crossover: 100.0, ..Thresholds::default() };
        let r = resolve(&h, &[333.0], &[150.0], &t).unwrap();
        assert_eq!(r.time.unit, TimeUnit::Seconds);
    }
}
