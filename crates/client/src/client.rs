//! Prediction service HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Every call takes a
//! [`CancelToken`]; the request runs on a helper thread and the caller stops
//! waiting as soon as the token flips.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pcinn_config::ApiSettings;
use pcinn_core::{
    CompareResult, HealthStatus, ModelInfo, ModelName, ModelsResponse, PredictionInput,
    PredictionResult, TimeSeriesInput, TimeSeriesResult,
};

use crate::cancel::CancelToken;
use crate::error::ApiError;

/// How often a waiting caller re-checks its cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

#[derive(Serialize)]
struct BatchRequest<'a> {
    inputs: &'a [PredictionInput],
}

#[derive(Deserialize)]
struct BatchResponse {
    predictions: Vec<PredictionResult>,
}

/// Prediction service client (blocking). Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    api_root: String,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("pcinn/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_root: settings.api_root(),
        })
    }

    /// Versioned endpoint root, e.g. `http://localhost:8000/api/v1`.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn predict(
        &self,
        input: &PredictionInput,
        model: ModelName,
        cancel: &CancelToken,
    ) -> Result<PredictionResult, ApiError> {
        let url = format!("{}/predict?model={}", self.api_root, model.as_str());
        let request = self.http.post(url).json(input);
        execute(request, cancel)
    }

    pub fn predict_timeseries(
        &self,
        input: &TimeSeriesInput,
        model: ModelName,
        cancel: &CancelToken,
    ) -> Result<TimeSeriesResult, ApiError> {
        let url = format!("{}/predict/timeseries?model={}", self.api_root, model.as_str());
        let request = self.http.post(url).json(input);
        execute(request, cancel)
    }

    /// All models over one time grid.
    pub fn predict_compare(
        &self,
        input: &TimeSeriesInput,
        cancel: &CancelToken,
    ) -> Result<CompareResult, ApiError> {
        let url = format!("{}/predict/compare", self.api_root);
        execute(self.http.post(url).json(input), cancel)
    }

    /// One prediction per input, in input order.
    pub fn predict_batch(
        &self,
        inputs: &[PredictionInput],
        model: ModelName,
        cancel: &CancelToken,
    ) -> Result<Vec<PredictionResult>, ApiError> {
        let url = format!("{}/predict/batch?model={}", self.api_root, model.as_str());
        let request = self.http.post(url).json(&BatchRequest { inputs });
        let response: BatchResponse = execute(request, cancel)?;

        if response.predictions.len() != inputs.len() {
            return Err(ApiError::Parse(format!(
                "{} returned {} predictions for {} inputs",
                model,
                response.predictions.len(),
                inputs.len()
            )));
        }
        Ok(response.predictions)
    }

    pub fn models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        let url = format!("{}/models", self.api_root);
        let response: ModelsResponse = execute(self.http.get(url), &CancelToken::new())?;
        Ok(response.models)
    }

    pub fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/health", self.api_root);
        execute(self.http.get(url), &CancelToken::new())
    }
}

/// Send on a helper thread and wait for the response or cancellation,
/// whichever comes first. An abandoned response is dropped unread.
fn execute<T>(request: reqwest::blocking::RequestBuilder, cancel: &CancelToken) -> Result<T, ApiError>
where
    T: DeserializeOwned + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(ApiError::Cancelled);
    }

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(send_and_decode::<T>(request));
    });

    loop {
        match rx.recv_timeout(CANCEL_POLL) {
            Ok(result) => {
                if cancel.is_cancelled() {
                    return Err(ApiError::Cancelled);
                }
                return result;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    log::debug!("request abandoned after cancellation");
                    return Err(ApiError::Cancelled);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ApiError::Network("request worker exited without a response".into()));
            }
        }
    }
}

fn send_and_decode<T: DeserializeOwned>(request: reqwest::blocking::RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().map_err(|e| ApiError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ApiError::from_response(status.as_u16(), body));
    }

    response.json::<T>().map_err(|e| ApiError::Parse(e.to_string()))
}
