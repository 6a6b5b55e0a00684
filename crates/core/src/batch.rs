use serde::{Deserialize, Serialize};

use crate::api::{CompareResult, PredictionResult};
use crate::fields::ParsedRow;
use crate::model::ModelName;

/// An input row combined with one model's outputs for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub input: ParsedRow,
    pub conversion: f64,
    pub mn: f64,
    pub mw: f64,
    pub mz: f64,
    pub mz_plus_1: f64,
    pub mv: f64,
    pub dispersity: f64,
}

impl EnrichedRow {
    pub fn new(input: ParsedRow, prediction: &PredictionResult) -> Self {
        Self {
            input,
            conversion: prediction.conversion,
            mn: prediction.mn,
            mw: prediction.mw,
            mz: prediction.mz,
            mz_plus_1: prediction.mz_plus_1,
            mv: prediction.mv,
            dispersity: prediction.dispersity,
        }
    }

    pub fn output(&self, field: OutputField) -> f64 {
        match field {
            OutputField::Conversion => self.conversion,
            OutputField::Mn => self.mn,
            OutputField::Mw => self.mw,
            OutputField::Mz => self.mz,
            OutputField::MzPlus1 => self.mz_plus_1,
            OutputField::Mv => self.mv,
            OutputField::Dispersity => self.dispersity,
        }
    }
}

/// Rows predicted by one model, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBatchResult {
    pub model: ModelName,
    pub rows: Vec<EnrichedRow>,
}

/// The seven outputs the service predicts per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    Conversion,
    Mn,
    Mw,
    Mz,
    MzPlus1,
    Mv,
    Dispersity,
}

impl OutputField {
    pub const ALL: [OutputField; 7] = [
        Self::Conversion,
        Self::Mn,
        Self::Mw,
        Self::Mz,
        Self::MzPlus1,
        Self::Mv,
        Self::Dispersity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conversion => "conversion",
            Self::Mn => "mn",
            Self::Mw => "mw",
            Self::Mz => "mz",
            Self::MzPlus1 => "mz_plus_1",
            Self::Mv => "mv",
            Self::Dispersity => "dispersity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min / max / mean of every output over one model's batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub model: ModelName,
    pub count: usize,
    pub fields: Vec<(OutputField, FieldStats)>,
}

impl BatchStats {
    /// Returns `None` for an empty batch.
    pub fn compute(result: &ModelBatchResult) -> Option<Self> {
        if result.rows.is_empty() {
            return None;
        }
        let count = result.rows.len();
        let fields = OutputField::ALL
            .iter()
            .map(|&field| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                let mut sum = 0.0;
                for row in &result.rows {
                    let v = row.output(field);
                    min = min.min(v);
                    max = max.max(v);
                    sum += v;
                }
                (field, FieldStats { min, max, mean: sum / count as f64 })
            })
            .collect();

        Some(Self { model: result.model, count, fields })
    }

    pub fn get(&self, field: OutputField) -> Option<&FieldStats> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, s)| s)
    }
}

/// Final (end-of-grid) values per model from a compare run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareSummary {
    pub model: ModelName,
    pub conversion: f64,
    pub mn: f64,
    pub mw: f64,
    pub dispersity: f64,
}

impl CompareSummary {
    /// One entry per model that has at least one point on the grid.
    pub fn from_result(result: &CompareResult) -> Vec<Self> {
        ModelName::ALL
            .iter()
            .filter_map(|&model| {
                let series = result.series(model);
                Some(Self {
                    model,
                    conversion: *series.conversion.last()?,
                    mn: *series.mn.last()?,
                    mw: *series.mw.last()?,
                    dispersity: *series.dispersity.last()?,
                })
            })
            .collect()
    }
}
