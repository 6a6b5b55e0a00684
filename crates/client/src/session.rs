//! Upload page state: ingest once, then run one or all models over the valid rows.

use std::time::Duration;

use pcinn_core::{ModelBatchResult, ModelName, ParsedRow, PredictionInput, RowError};
use pcinn_io::IngestResult;

use crate::batch::BatchRunner;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::orchestrator::{fingerprint, RequestSurface, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded.
    Idle,
    /// Rows loaded, no results yet (or the last run failed).
    Parsed,
    Running,
    Done,
}

/// Which models a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single(ModelName),
    CompareAll,
}

impl RunMode {
    pub fn models(&self) -> Vec<ModelName> {
        match self {
            RunMode::Single(model) => vec![*model],
            RunMode::CompareAll => ModelName::ALL.to_vec(),
        }
    }
}

pub struct UploadSession {
    runner: BatchRunner,
    surface: RequestSurface<Vec<ModelBatchResult>>,
    ingest: Option<IngestResult>,
}

impl UploadSession {
    pub fn new(client: ApiClient) -> Self {
        Self {
            runner: BatchRunner::new(client),
            surface: RequestSurface::new("upload"),
            ingest: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.ingest.is_none() {
            Phase::Idle
        } else if self.surface.is_loading() {
            Phase::Running
        } else if self.surface.has_result() {
            Phase::Done
        } else {
            Phase::Parsed
        }
    }

    /// Replace the loaded file. Any run in progress is cancelled.
    pub fn load(&mut self, result: IngestResult) {
        self.surface.teardown();
        self.surface.clear_result();
        self.surface.take_error();
        self.ingest = Some(result);
    }

    pub fn rows(&self) -> &[ParsedRow] {
        self.ingest.as_ref().map_or(&[], |r| r.rows.as_slice())
    }

    pub fn valid_rows(&self) -> &[ParsedRow] {
        self.ingest.as_ref().map_or(&[], |r| r.valid.as_slice())
    }

    pub fn row_errors(&self) -> &[RowError] {
        self.ingest.as_ref().map_or(&[], |r| r.errors.as_slice())
    }

    /// Start a batch over the valid rows. `None` when there is nothing to run.
    pub fn run(&self, mode: RunMode) -> Option<Submission> {
        let rows = self.valid_rows().to_vec();
        if rows.is_empty() {
            return None;
        }

        let models = mode.models();
        let inputs: Vec<PredictionInput> = rows.iter().map(PredictionInput::from).collect();
        let key = fingerprint("batch", None, &(&models, &inputs));
        let runner = self.runner.clone();

        Some(self.surface.submit(key, move |cancel| {
            runner.run(&rows, &models, cancel).map_err(Into::into)
        }))
    }

    /// Results of the last successful run.
    pub fn results(&self) -> Option<Vec<ModelBatchResult>> {
        self.surface.result()
    }

    /// Failure of the last run, reported once.
    pub fn take_error(&self) -> Option<ApiError> {
        self.surface.take_error()
    }

    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.surface.wait_idle(timeout)
    }

    /// Cancel any run and discard rows and results.
    pub fn reset(&mut self) {
        self.surface.teardown();
        self.surface.clear_result();
        self.surface.take_error();
        self.ingest = None;
    }
}
