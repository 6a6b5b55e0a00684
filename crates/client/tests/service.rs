//! Client, batch runner and surfaces against a mock prediction service.

use std::time::{Duration, Instant};

use httpmock::prelude::*;
use serde_json::json;

use pcinn_client::{
    ApiClient, ApiError, BatchRunner, CancelToken, CompareSurface, Phase, PredictSurface, RunMode,
    Submission, UploadSession,
};
use pcinn_config::ApiSettings;
use pcinn_core::{FormValues, ModelName, ParsedRow, TimeSeriesInput};
use pcinn_io::{ingest, IngestOptions};

const WAIT: Duration = Duration::from_secs(10);

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiSettings {
        base_url: server.base_url(),
        timeout_secs: 10,
    })
    .unwrap()
}

fn prediction(conversion: f64) -> serde_json::Value {
    json!({
        "conversion": conversion,
        "mn": 50000.0,
        "mw": 120000.0,
        "mz": 200000.0,
        "mz_plus_1": 280000.0,
        "mv": 110000.0,
        "dispersity": 2.4,
        "raw_outputs": [conversion, 4.7, 5.1, 5.3, 5.4, 5.0]
    })
}

fn series(len: usize) -> serde_json::Value {
    let v = vec![0.5; len];
    json!({
        "conversion": v, "mn": v, "mw": v, "mz": v,
        "mz_plus_1": v, "mv": v, "dispersity": v
    })
}

fn rows(n: usize) -> Vec<ParsedRow> {
    (0..n)
        .map(|i| ParsedRow::from_values(i + 2, [3.0, 7.0, 0.02, 333.15, 600.0 * (i + 1) as f64]))
        .collect()
}

fn mock_batch<'a>(server: &'a MockServer, model: &str, count: usize, conversion: f64) -> httpmock::Mock<'a> {
    let predictions: Vec<_> = (0..count).map(|i| prediction(conversion + i as f64 * 0.01)).collect();
    let model = model.to_string();
    server.mock(move |when, then| {
        when.method(POST)
            .path("/api/v1/predict/batch")
            .query_param("model", model.as_str())
            .body_includes("\"inputs\"");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "predictions": predictions }));
    })
}

#[test]
fn predict_sends_model_and_canonical_units() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict")
            .query_param("model", "pcinn")
            .body_includes("\"m_molar\":3.326")
            .body_includes("\"time_s\":7200.0");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(prediction(0.42));
    });

    let result = client(&server)
        .predict(&FormValues::default().to_input(), ModelName::Pcinn, &CancelToken::new())
        .unwrap();

    mock.assert();
    assert_eq!(result.conversion, 0.42);
    assert_eq!(result.raw_outputs.len(), 6);
}

#[test]
fn http_error_uses_detail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/predict");
        then.status(503)
            .header("content-type", "application/json")
            .json_body(json!({ "detail": "Model sa_pcinn is not loaded" }));
    });

    let err = client(&server)
        .predict(&FormValues::default().to_input(), ModelName::SaPcinn, &CancelToken::new())
        .unwrap_err();

    match err {
        ApiError::Http { status, ref message, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Model sa_pcinn is not loaded");
            assert!(body.contains("detail"));
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[test]
fn malformed_body_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/models");
        then.status(200).body("not json");
    });

    let err = client(&server).models().unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[test]
fn models_and_health() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/models");
        then.status(200).json_body(json!({
            "models": [{
                "name": "sa_pcinn",
                "display_name": "SA-PCINN",
                "description": "Soft-anchored",
                "is_default": true,
                "final_test_loss": 0.0123
            }]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/health");
        then.status(200).json_body(json!({ "status": "healthy", "models_loaded": 3 }));
    });

    let client = client(&server);
    let models = client.models().unwrap();
    assert_eq!(models.len(), 1);
    assert!(models[0].is_default);

    let health = client.health().unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.models_loaded, 3);
}

#[test]
fn cancellation_returns_without_waiting_for_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/predict");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(prediction(0.1));
    });

    let client = client(&server);
    let token = CancelToken::new();
    let canceller = token.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        canceller.cancel();
    });

    let start = Instant::now();
    let err = client
        .predict(&FormValues::default().to_input(), ModelName::Pcinn, &token)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn batch_across_all_models_keeps_input_order() {
    let server = MockServer::start();
    let mocks = [
        mock_batch(&server, "baseline_nn", 4, 0.1),
        mock_batch(&server, "pcinn", 4, 0.2),
        mock_batch(&server, "sa_pcinn", 4, 0.3),
    ];

    let input = rows(4);
    let results = BatchRunner::new(client(&server))
        .run(&input, &ModelName::ALL, &CancelToken::new())
        .unwrap();

    for mock in &mocks {
        mock.assert();
    }
    assert_eq!(results.len(), 3);
    for (result, model) in results.iter().zip(ModelName::ALL) {
        assert_eq!(result.model, model);
        assert_eq!(result.rows.len(), 4);
        let indices: Vec<_> = result.rows.iter().map(|r| r.input.row_index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5]);
    }
    assert!((results[1].rows[2].conversion - 0.22).abs() < 1e-9);
    assert_eq!(results[2].rows[3].input.time_s, 2400.0);
}

#[test]
fn batch_count_mismatch_is_parse_error() {
    let server = MockServer::start();
    mock_batch(&server, "pcinn", 2, 0.2);

    let err = BatchRunner::new(client(&server))
        .run(&rows(3), &[ModelName::Pcinn], &CancelToken::new())
        .unwrap_err();
    assert_eq!(err.model, ModelName::Pcinn);
    assert!(matches!(err.source, ApiError::Parse(_)));
}

#[test]
fn one_failing_model_fails_whole_batch() {
    let server = MockServer::start();
    mock_batch(&server, "baseline_nn", 2, 0.1);
    mock_batch(&server, "sa_pcinn", 2, 0.3);
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict/batch")
            .query_param("model", "pcinn");
        then.status(500).json_body(json!({ "message": "pcinn weights missing" }));
    });

    let err = BatchRunner::new(client(&server))
        .run(&rows(2), &ModelName::ALL, &CancelToken::new())
        .unwrap_err();
    assert_eq!(err.model, ModelName::Pcinn);
    assert_eq!(err.source.user_message(), "pcinn weights missing");
    assert!(err.to_string().contains("PCINN"));
}

fn loaded_session(server: &MockServer) -> UploadSession {
    let csv = "m_molar,s_molar,i_molar,temperature_k,time_s\n\
               3,7,0.02,333.15,7200\n\
               3,7,0.2,333.15,7200\n\
               2,6,0.01,343.15,3600\n";
    let ingested = ingest("runs.csv", csv.as_bytes(), &IngestOptions::default()).unwrap();
    let mut session = UploadSession::new(client(server));
    session.load(ingested);
    session
}

#[test]
fn upload_session_compare_run_succeeds() {
    let server = MockServer::start();
    mock_batch(&server, "baseline_nn", 2, 0.1);
    mock_batch(&server, "pcinn", 2, 0.2);
    mock_batch(&server, "sa_pcinn", 2, 0.3);

    let session = loaded_session(&server);
    assert_eq!(session.phase(), Phase::Parsed);
    assert_eq!(session.row_errors().len(), 1);

    assert!(matches!(session.run(RunMode::CompareAll), Some(Submission::Started(_))));
    assert!(session.wait_idle(WAIT));

    assert_eq!(session.phase(), Phase::Done);
    let results = session.results().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.rows.len() == 2));
}

#[test]
fn upload_session_failure_keeps_rows_for_retry() {
    let server = MockServer::start();
    mock_batch(&server, "baseline_nn", 2, 0.1);
    mock_batch(&server, "sa_pcinn", 2, 0.3);
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict/batch")
            .query_param("model", "pcinn");
        then.status(500).body("");
    });

    let mut session = loaded_session(&server);
    session.run(RunMode::CompareAll);
    assert!(session.wait_idle(WAIT));

    assert_eq!(session.phase(), Phase::Parsed);
    assert!(session.results().is_none());
    assert_eq!(session.valid_rows().len(), 2);
    let err = session.take_error().unwrap();
    assert_eq!(err.user_message(), "Request failed with status 500");
    assert!(session.take_error().is_none());

    session.reset();
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.valid_rows().is_empty());
}

#[test]
fn predict_surface_duplicate_submission_hits_once() {
    let server = MockServer::start();
    let point = server.mock(|when, then| {
        when.method(POST).path("/api/v1/predict");
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(prediction(0.5));
    });
    let timeseries = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict/timeseries")
            .body_includes("\"time_start_s\":60.0")
            .body_includes("\"time_steps\":100");
        let mut body = series(100);
        body["times"] = json!(vec![60.0; 100]);
        then.status(200)
            .delay(Duration::from_millis(300))
            .json_body(body);
    });

    let surface = PredictSurface::new(client(&server), ModelName::SaPcinn);
    let input = FormValues::default().to_input();
    assert_eq!(surface.submit(input), Submission::Started(1));
    assert_eq!(surface.submit(input), Submission::Duplicate);
    assert!(surface.surface().wait_idle(WAIT));

    point.assert_hits(1);
    timeseries.assert_hits(1);
    let outcome = surface.surface().result().unwrap();
    assert_eq!(outcome.point.conversion, 0.5);
    assert_eq!(outcome.timeseries.times.len(), 100);
}

#[test]
fn predict_surface_model_change_clears_result() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/predict");
        then.status(200).json_body(prediction(0.5));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/predict/timeseries");
        let mut body = series(2);
        body["times"] = json!([60.0, 120.0]);
        then.status(200).json_body(body);
    });

    let mut surface = PredictSurface::new(client(&server), ModelName::Pcinn);
    surface.submit(FormValues::default().to_input());
    assert!(surface.surface().wait_idle(WAIT));
    assert!(surface.surface().result().is_some());

    surface.set_model(ModelName::Pcinn);
    assert!(surface.surface().result().is_some());
    surface.set_model(ModelName::BaselineNn);
    assert!(surface.surface().result().is_none());
}

#[test]
fn compare_surface_superseded_request_is_not_applied() {
    let server = MockServer::start();
    let mut slow = FormValues::default().to_input();
    slow.time_s = 3600.0;
    let fast = FormValues::default().to_input();

    server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict/compare")
            .body_includes("\"time_end_s\":3600.0");
        then.status(200)
            .delay(Duration::from_millis(800))
            .json_body(json!({
                "times": [1.0],
                "baseline_nn": series(1), "pcinn": series(1), "sa_pcinn": series(1)
            }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/predict/compare")
            .body_includes("\"time_end_s\":7200.0");
        then.status(200).json_body(json!({
            "times": [2.0],
            "baseline_nn": series(1), "pcinn": series(1), "sa_pcinn": series(1)
        }));
    });

    let surface = CompareSurface::new(client(&server));
    surface.submit(TimeSeriesInput::for_point(&slow));
    surface.submit(TimeSeriesInput::for_point(&fast));
    assert!(surface.surface().wait_idle(WAIT));
    std::thread::sleep(Duration::from_millis(1000));

    assert_eq!(surface.surface().result().unwrap().times, vec![2.0]);
    assert_eq!(surface.surface().take_error(), None);
}
