//! Prediction service client, shared by the CLI and any front end.
//!
//! Owns the wire contract with the service and the request discipline around
//! it: single-flight surfaces, cooperative cancellation and all-or-nothing
//! multi-model batches.

mod batch;
mod cancel;
mod client;
mod error;
mod orchestrator;
mod session;

pub use batch::{BatchError, BatchRunner};
pub use cancel::CancelToken;
pub use client::ApiClient;
pub use error::{read_error_message, ApiError};
pub use orchestrator::{
    fingerprint, CompareSurface, InFlightRequest, PredictOutcome, PredictSurface, RequestSurface,
    Submission,
};
pub use session::{Phase, RunMode, UploadSession};
