use serde::{Deserialize, Serialize};

/// The fixed schema of a reaction-condition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    MMolar,
    SMolar,
    IMolar,
    TemperatureK,
    TimeS,
}

impl CanonicalField {
    /// All fields in schema order.
    pub const ALL: [CanonicalField; 5] = [
        Self::MMolar,
        Self::SMolar,
        Self::IMolar,
        Self::TemperatureK,
        Self::TimeS,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MMolar => "m_molar",
            Self::SMolar => "s_molar",
            Self::IMolar => "i_molar",
            Self::TemperatureK => "temperature_k",
            Self::TimeS => "time_s",
        }
    }

    /// Canonical unit label.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::MMolar | Self::SMolar | Self::IMolar => "mol/L",
            Self::TemperatureK => "K",
            Self::TimeS => "s",
        }
    }

    /// Position in [`CanonicalField::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::MMolar => 0,
            Self::SMolar => 1,
            Self::IMolar => 2,
            Self::TemperatureK => 3,
            Self::TimeS => 4,
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One data row of an uploaded file, in canonical units.
///
/// `row_index` is the 1-based row number in the source file, counting the
/// header as row 1, so the first data row is 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub row_index: usize,
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_k: f64,
    pub time_s: f64,
}

impl ParsedRow {
    pub fn get(&self, field: CanonicalField) -> f64 {
        match field {
            CanonicalField::MMolar => self.m_molar,
            CanonicalField::SMolar => self.s_molar,
            CanonicalField::IMolar => self.i_molar,
            CanonicalField::TemperatureK => self.temperature_k,
            CanonicalField::TimeS => self.time_s,
        }
    }

    /// Build a row from values in schema order.
    pub fn from_values(row_index: usize, values: [f64; 5]) -> Self {
        Self {
            row_index,
            m_molar: values[0],
            s_molar: values[1],
            i_molar: values[2],
            temperature_k: values[3],
            time_s: values[4],
        }
    }
}

/// A validation failure tied to one field of one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize,
    pub field: CanonicalField,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}: {}", self.row_index, self.field, self.message)
    }
}
