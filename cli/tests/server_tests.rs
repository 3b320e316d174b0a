use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use iqsynth_cli::server::{router, AppState};
use iqsynth_core::device::SimulatedDevice;
use iqsynth_core::{Session, SignalDescriptor};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_state() -> Arc<AppState> {
    let session = Session::new();
    session
        .add_signal(SignalDescriptor::cw(1e6, -10.0))
        .expect("Failed to add signal");
    Arc::new(AppState::new(
        session,
        SimulatedDevice::open().expect("Failed to open device"),
    ))
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .oneshot(builder.body(body).expect("Failed to build request"))
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, value)
}

#[tokio::test]
async fn test_list_and_add_signals() {
    let state = test_state();

    let (status, body) = call(router(state.clone()), Method::GET, "/api/signals", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signals"].as_array().unwrap().len(), 1);
    assert_eq!(body["signals"][0]["descriptor"]["type"], "cw");

    let psk = json!({
        "type": "psk", "freq_offset_hz": -2e6, "gain_dbm": -6.0,
        "modulation": "qpsk", "rolloff": 0.35, "symbol_rate_hz": 1e6
    });
    let (status, body) = call(router(state.clone()), Method::POST, "/api/signals", Some(psk)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["index"], 1);
    assert_eq!(state.session.signals().len(), 2);
}

#[tokio::test]
async fn test_invalid_signal_is_bad_request() {
    let state = test_state();
    let out_of_band = json!({"type": "cw", "freq_offset_hz": 8e6, "gain_dbm": 0.0});
    let (status, body) = call(router(state.clone()), Method::POST, "/api/signals", Some(out_of_band)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(state.session.signals().len(), 1);
}

#[tokio::test]
async fn test_unshapeable_symbol_rate_is_bad_request() {
    let state = test_state();
    let psk = json!({
        "type": "psk", "freq_offset_hz": 0.0, "gain_dbm": 0.0,
        "modulation": "qpsk", "rolloff": 0.35, "symbol_rate_hz": 1e-3
    });
    let (status, _) = call(router(state.clone()), Method::POST, "/api/signals", Some(psk)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let tdma = json!({
        "type": "tdma", "freq_offset_hz": 0.0, "gain_dbm": 0.0, "num_slots": 2,
        "slot_bandwidth_hz": 2e5, "min_pulse_rate_hz": 1e3, "max_pulse_rate_hz": 4e3,
        "burst_symbol_rate_hz": 1e-3
    });
    let (status, _) = call(router(state.clone()), Method::POST, "/api/signals", Some(tdma)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(state.session.signals().len(), 1);
    let (status, _) = call(router(state), Method::GET, "/api/preview?seed=1&duration=0.0001", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_edit_toggle_remove() {
    let state = test_state();

    let edited = json!({"type": "cw", "freq_offset_hz": 2e6, "gain_dbm": -20.0});
    let (status, _) = call(router(state.clone()), Method::PUT, "/api/signals/0", Some(edited)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.session.signals().get(0).unwrap().freq_offset_hz(), 2e6);

    let (status, body) = call(router(state.clone()), Method::POST, "/api/signals/0/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);

    let (status, _) = call(router(state.clone()), Method::DELETE, "/api/signals/4", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(router(state.clone()), Method::DELETE, "/api/signals/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.session.signals().is_empty());
}

#[tokio::test]
async fn test_settings_round_trip() {
    let state = test_state();
    let update = json!({"center_frequency_hz": 2.4e9, "level_dbm": -30.0});
    let (status, body) = call(router(state.clone()), Method::PUT, "/api/settings", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["center_frequency_hz"], 2.4e9);

    let (_, body) = call(router(state.clone()), Method::GET, "/api/settings", None).await;
    assert_eq!(body["level_dbm"], -30.0);
    assert_eq!(body["sample_rate"], 10e6);

    let (status, _) = call(router(state.clone()), Method::PUT, "/api/settings", Some(json!({"sample_rate": -5.0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A rejected field leaves the valid ones in the same request unapplied
    let mixed = json!({"center_frequency_hz": 900e6, "level_dbm": -10.0, "sample_rate": 0.0});
    let (status, _) = call(router(state.clone()), Method::PUT, "/api/settings", Some(mixed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = call(router(state), Method::GET, "/api/settings", None).await;
    assert_eq!(body["center_frequency_hz"], 2.4e9);
    assert_eq!(body["level_dbm"], -30.0);
}

#[tokio::test]
async fn test_preview_and_purity() {
    let state = test_state();
    let (status, body) = call(router(state.clone()), Method::GET, "/api/preview?seed=1&duration=0.0001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_samples"], 1000);
    assert_eq!(body["i"].as_array().unwrap().len(), 1000);
    assert_eq!(body["q"].as_array().unwrap().len(), 1000);

    let (status, body) = call(router(state), Method::GET, "/api/purity?duration=0.0001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["image_rejection_db"].as_f64().unwrap() > 20.0);
}

#[tokio::test]
async fn test_spectrum_on_demand() {
    let state = test_state();
    let (status, body) = call(router(state), Method::GET, "/api/spectrum", None).await;
    assert_eq!(status, StatusCode::OK);
    let peak = body["peak_offset_hz"].as_f64().unwrap();
    // 65536-point FFT at 10 MS/s: bins are about 153 Hz apart
    assert!((peak - 1e6).abs() < 200.0, "peak at {}", peak);
    assert!(body["power_db"].as_array().unwrap().len() <= 1024);
}

#[tokio::test]
async fn test_transmit_and_abort() {
    let state = test_state();
    let (status, body) = call(router(state.clone()), Method::POST, "/api/transmit?duration=0.001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_samples"], 10_000);
    assert!(state.is_transmitting());

    let (status, _) = call(router(state.clone()), Method::POST, "/api/abort", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!state.is_transmitting());
}

#[tokio::test]
async fn test_out_of_range_level_reports_warning() {
    let state = test_state();
    state.session.set_level(30.0).expect("Failed to set level");
    let (status, body) = call(router(state), Method::POST, "/api/transmit?duration=0.0001", None).await;
    assert_eq!(status, StatusCode::OK);
    let device: Vec<String> = serde_json::from_value(body["device"].clone()).unwrap();
    assert!(device.contains(&"warning 2".to_string()), "{:?}", device);
}
