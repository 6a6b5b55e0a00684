// Per-field validation ranges, in canonical units.

use pcinn_core::CanonicalField;
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Domain ranges the models were trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBounds {
    pub m_molar: Bound,
    pub s_molar: Bound,
    pub i_molar: Bound,
    pub temperature_k: Bound,
    pub time_s: Bound,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            m_molar: Bound::new(0.5, 5.0),
            s_molar: Bound::new(5.0, 9.5),
            i_molar: Bound::new(0.005, 0.1),
            temperature_k: Bound::new(323.0, 363.0),
            time_s: Bound::new(1.2, 35854.0),
        }
    }
}

impl ValidationBounds {
    pub fn for_field(&self, field: CanonicalField) -> Bound {
        match field {
            CanonicalField::MMolar => self.m_molar,
            CanonicalField::SMolar => self.s_molar,
            CanonicalField::IMolar => self.i_molar,
            CanonicalField::TemperatureK => self.temperature_k,
            CanonicalField::TimeS => self.time_s,
        }
    }

    /// Every bound must be finite with `min <= max`.
    pub fn check(&self) -> Result<(), String> {
        for field in CanonicalField::ALL {
            let b = self.for_field(field);
            if !b.min.is_finite() || !b.max.is_finite() || b.min > b.max {
                return Err(format!("invalid bounds for {}: [{}, {}]", field, b.min, b.max));
            }
        }
        Ok(())
    }
}
