//! Core types shared by ingestion, the API client and the CLI.
//!
//! Everything here is expressed in canonical units: mol/L for the three
//! concentrations, kelvin for temperature, seconds for elapsed time.

pub mod api;
pub mod batch;
pub mod fields;
pub mod model;

pub use api::{
    CompareResult, FormValues, PredictionInput, PredictionResult, TimeSeriesData,
    TimeSeriesInput, TimeSeriesResult,
};
pub use batch::{BatchStats, CompareSummary, EnrichedRow, FieldStats, ModelBatchResult, OutputField};
pub use fields::{CanonicalField, ParsedRow, RowError};
pub use model::{HealthStatus, ModelInfo, ModelName, ModelsResponse};
