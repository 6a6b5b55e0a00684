//! Request and response bodies of the prediction service.

use serde::{Deserialize, Serialize};

use crate::fields::ParsedRow;
use crate::model::ModelName;

/// Offset added to a Celsius reading to get kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Canonical single-point input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_k: f64,
    pub time_s: f64,
}

impl From<&ParsedRow> for PredictionInput {
    fn from(row: &ParsedRow) -> Self {
        Self {
            m_molar: row.m_molar,
            s_molar: row.s_molar,
            i_molar: row.i_molar,
            temperature_k: row.temperature_k,
            time_s: row.time_s,
        }
    }
}

/// Interactive form values, entered in °C and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormValues {
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_c: f64,
    pub time_min: f64,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            m_molar: 3.326,
            s_molar: 6.674,
            i_molar: 0.0246,
            temperature_c: 60.0,
            time_min: 120.0,
        }
    }
}

impl FormValues {
    /// Convert to the canonical units the service expects.
    pub fn to_input(&self) -> PredictionInput {
        PredictionInput {
            m_molar: self.m_molar,
            s_molar: self.s_molar,
            i_molar: self.i_molar,
            temperature_k: self.temperature_c + KELVIN_OFFSET,
            time_s: self.time_min * 60.0,
        }
    }
}

/// Point prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub conversion: f64,
    pub mn: f64,
    pub mw: f64,
    pub mz: f64,
    pub mz_plus_1: f64,
    pub mv: f64,
    pub dispersity: f64,
    #[serde(default)]
    pub raw_outputs: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesInput {
    pub m_molar: f64,
    pub s_molar: f64,
    pub i_molar: f64,
    pub temperature_k: f64,
    pub time_start_s: f64,
    pub time_end_s: f64,
    pub time_steps: u32,
}

impl TimeSeriesInput {
    pub const DEFAULT_START_S: f64 = 60.0;
    pub const DEFAULT_STEPS: u32 = 100;

    /// Time grid requested next to a point prediction: from one minute up to
    /// the point's own time.
    pub fn for_point(input: &PredictionInput) -> Self {
        Self {
            m_molar: input.m_molar,
            s_molar: input.s_molar,
            i_molar: input.i_molar,
            temperature_k: input.temperature_k,
            time_start_s: Self::DEFAULT_START_S,
            time_end_s: input.time_s,
            time_steps: Self::DEFAULT_STEPS,
        }
    }
}

/// Output series over a time grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeriesData {
    pub conversion: Vec<f64>,
    pub mn: Vec<f64>,
    pub mw: Vec<f64>,
    pub mz: Vec<f64>,
    pub mz_plus_1: Vec<f64>,
    pub mv: Vec<f64>,
    pub dispersity: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeriesResult {
    pub times: Vec<f64>,
    #[serde(flatten)]
    pub series: TimeSeriesData,
}

/// One series per model over a shared time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    pub times: Vec<f64>,
    pub baseline_nn: TimeSeriesData,
    pub pcinn: TimeSeriesData,
    pub sa_pcinn: TimeSeriesData,
}

impl CompareResult {
    pub fn series(&self, model: ModelName) -> &TimeSeriesData {
        match model {
            ModelName::BaselineNn => &self.baseline_nn,
            ModelName::Pcinn => &self.pcinn,
            ModelName::SaPcinn => &self.sa_pcinn,
        }
    }
}
