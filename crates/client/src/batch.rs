//! Multi-model batch prediction.
//!
//! One request per model, all in flight at once. The batch succeeds only if
//! every model succeeds; there are no partial results.

use std::fmt;
use std::thread;

use pcinn_core::{EnrichedRow, ModelBatchResult, ModelName, ParsedRow, PredictionInput};

use crate::cancel::CancelToken;
use crate::client::ApiClient;
use crate::error::ApiError;

/// The first model (in request order) whose request failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub model: ModelName,
    pub source: ApiError,
}

impl BatchError {
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} batch failed: {}", self.model.display_name(), self.source.user_message())
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<BatchError> for ApiError {
    fn from(e: BatchError) -> Self {
        e.source
    }
}

#[derive(Clone)]
pub struct BatchRunner {
    client: ApiClient,
}

impl BatchRunner {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Predict `rows` with every model in `models`.
    ///
    /// Results come back in `models` order, each with rows in input order.
    pub fn run(
        &self,
        rows: &[ParsedRow],
        models: &[ModelName],
        cancel: &CancelToken,
    ) -> Result<Vec<ModelBatchResult>, BatchError> {
        let inputs: Vec<PredictionInput> = rows.iter().map(PredictionInput::from).collect();

        let responses: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = models
                .iter()
                .map(|&model| {
                    let inputs = &inputs;
                    s.spawn(move || self.client.predict_batch(inputs, model, cancel))
                })
                .collect();

            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .unwrap_or_else(|_| Err(ApiError::Network("batch worker panicked".into())))
                })
                .collect()
        });

        let mut results = Vec::with_capacity(models.len());
        for (&model, response) in models.iter().zip(responses) {
            let predictions = response.map_err(|source| BatchError { model, source })?;
            let enriched = rows
                .iter()
                .zip(&predictions)
                .map(|(row, prediction)| EnrichedRow::new(*row, prediction))
                .collect();
            results.push(ModelBatchResult { model, rows: enriched });
        }

        log::debug!("batch of {} rows completed for {} models", rows.len(), models.len());
        Ok(results)
    }
}
