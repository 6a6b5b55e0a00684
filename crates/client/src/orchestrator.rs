//! Single-flight request surfaces.
//!
//! A surface owns at most one outstanding request. Submitting the same
//! fingerprint again while it is pending is a no-op; submitting a different
//! one cancels the pending request. A completion is applied only if its token
//! was not cancelled and its generation is still the newest, so a slow
//! superseded response can never overwrite a newer one.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use pcinn_core::{
    CompareResult, ModelName, PredictionInput, PredictionResult, TimeSeriesInput,
    TimeSeriesResult,
};

use crate::cancel::CancelToken;
use crate::client::ApiClient;
use crate::error::ApiError;

/// Deterministic key for a request's logical inputs.
pub fn fingerprint<I: Serialize>(endpoint: &str, model: Option<ModelName>, input: &I) -> String {
    #[derive(Serialize)]
    struct Key<'a, I> {
        endpoint: &'a str,
        model: Option<ModelName>,
        input: &'a I,
    }

    let bytes = serde_json::to_vec(&Key { endpoint, model, input }).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// The request currently outstanding on a surface.
#[derive(Debug, Clone)]
pub struct InFlightRequest {
    pub key: String,
    pub generation: u64,
    pub cancel: CancelToken,
}

/// What `submit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A new request was issued with this generation.
    Started(u64),
    /// The same request is already pending.
    Duplicate,
}

struct SurfaceState<T> {
    in_flight: Option<InFlightRequest>,
    generation: u64,
    loading: bool,
    result: Option<T>,
    error: Option<ApiError>,
}

struct Shared<T> {
    name: &'static str,
    state: Mutex<SurfaceState<T>>,
    idle: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, SurfaceState<T>> {
        // State stays consistent across a panicking worker; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete(&self, generation: u64, cancel: &CancelToken, outcome: Result<T, ApiError>) {
        let mut state = self.lock();
        let current = state.generation == generation;

        if cancel.is_cancelled() || !current {
            log::debug!("{}: discarding stale completion (generation {})", self.name, generation);
        } else {
            match outcome {
                Ok(value) => {
                    state.result = Some(value);
                    state.error = None;
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    log::warn!("{}: request failed: {}", self.name, e);
                    state.error = Some(e);
                }
            }
        }

        if current {
            state.loading = false;
        }
        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            state.in_flight = None;
        }
        drop(state);
        self.idle.notify_all();
    }
}

/// One independently-submitting context (a form, a page, a CLI command).
pub struct RequestSurface<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> RequestSurface<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                state: Mutex::new(SurfaceState {
                    in_flight: None,
                    generation: 0,
                    loading: false,
                    result: None,
                    error: None,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    /// Issue `job` under `key` on a worker thread.
    ///
    /// The job receives the request's cancel token and should hand it to
    /// every [`ApiClient`] call it makes.
    pub fn submit<F>(&self, key: String, job: F) -> Submission
    where
        F: FnOnce(&CancelToken) -> Result<T, ApiError> + Send + 'static,
    {
        let mut state = self.shared.lock();

        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.key == key && !f.cancel.is_cancelled())
        {
            log::debug!("{}: duplicate submission ignored", self.shared.name);
            return Submission::Duplicate;
        }

        if let Some(previous) = state.in_flight.take() {
            log::debug!(
                "{}: cancelling generation {} for a new request",
                self.shared.name,
                previous.generation
            );
            previous.cancel.cancel();
        }

        state.generation += 1;
        let generation = state.generation;
        let cancel = CancelToken::new();
        state.in_flight = Some(InFlightRequest {
            key,
            generation,
            cancel: cancel.clone(),
        });
        state.loading = true;
        state.result = None;
        drop(state);

        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            let outcome = job(&cancel);
            shared.complete(generation, &cancel, outcome);
        });

        Submission::Started(generation)
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().loading
    }

    /// Generation of the most recent submission (0 before the first).
    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    pub fn in_flight(&self) -> Option<InFlightRequest> {
        self.shared.lock().in_flight.clone()
    }

    /// Take the last failure. Each failure is reported once; show it with
    /// [`ApiError::user_message`].
    pub fn take_error(&self) -> Option<ApiError> {
        self.shared.lock().error.take()
    }

    /// Drop the applied result, e.g. when it no longer matches the inputs.
    pub fn clear_result(&self) {
        self.shared.lock().result = None;
    }

    pub fn has_result(&self) -> bool {
        self.shared.lock().result.is_some()
    }

    pub fn take_result(&self) -> Option<T> {
        self.shared.lock().result.take()
    }

    /// Block until nothing is outstanding. False on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .idle
            .wait_timeout_while(state, timeout, |s| s.in_flight.is_some())
            .unwrap_or_else(|e| e.into_inner());
        state.in_flight.is_none()
    }

    /// Cancel whatever is outstanding. Its completion will be discarded, so
    /// the surface stops loading right away.
    pub fn teardown(&self) {
        let mut state = self.shared.lock();
        if let Some(f) = state.in_flight.as_ref() {
            f.cancel.cancel();
        }
        state.loading = false;
    }
}

impl<T: Clone + Send + 'static> RequestSurface<T> {
    pub fn result(&self) -> Option<T> {
        self.shared.lock().result.clone()
    }
}

impl<T> Drop for RequestSurface<T> {
    fn drop(&mut self) {
        if let Some(f) = self.shared.lock().in_flight.as_ref() {
            f.cancel.cancel();
        }
    }
}

/// Point prediction plus the curve leading up to it, from one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictOutcome {
    pub point: PredictionResult,
    pub timeseries: TimeSeriesResult,
}

/// The single-model prediction form.
pub struct PredictSurface {
    client: ApiClient,
    model: ModelName,
    surface: RequestSurface<PredictOutcome>,
}

impl PredictSurface {
    pub fn new(client: ApiClient, model: ModelName) -> Self {
        Self {
            client,
            model,
            surface: RequestSurface::new("predict"),
        }
    }

    pub fn model(&self) -> ModelName {
        self.model
    }

    /// Switch models. A result from the previous model is cleared.
    pub fn set_model(&mut self, model: ModelName) {
        if model != self.model {
            self.model = model;
            self.surface.clear_result();
        }
    }

    /// Fetch the point prediction and its time series concurrently.
    pub fn submit(&self, input: PredictionInput) -> Submission {
        let model = self.model;
        let key = fingerprint("predict", Some(model), &input);
        let client = self.client.clone();

        self.surface.submit(key, move |cancel| {
            let ts_input = TimeSeriesInput::for_point(&input);
            thread::scope(|s| -> Result<PredictOutcome, ApiError> {
                let series = s.spawn(|| client.predict_timeseries(&ts_input, model, cancel));
                let point = client.predict(&input, model, cancel);
                let timeseries = series
                    .join()
                    .unwrap_or_else(|_| Err(ApiError::Network("time series worker panicked".into())));
                Ok(PredictOutcome {
                    point: point?,
                    timeseries: timeseries?,
                })
            })
        })
    }

    pub fn surface(&self) -> &RequestSurface<PredictOutcome> {
        &self.surface
    }
}

/// The three-model comparison form.
pub struct CompareSurface {
    client: ApiClient,
    surface: RequestSurface<CompareResult>,
}

impl CompareSurface {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            surface: RequestSurface::new("compare"),
        }
    }

    pub fn submit(&self, input: TimeSeriesInput) -> Submission {
        let key = fingerprint("compare", None, &input);
        let client = self.client.clone();
        self.surface
            .submit(key, move |cancel| client.predict_compare(&input, cancel))
    }

    pub fn surface(&self) -> &RequestSurface<CompareResult> {
        &self.surface
    }
}
