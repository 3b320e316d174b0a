//! HTTP control surface for a running synthesizer session
//!
//! Handlers never synthesize on the async executor: they clone a snapshot of
//! the session and render it with `spawn_blocking`. A background task
//! re-renders the current snapshot on a fixed interval and publishes a
//! decimated spectrum for `GET /api/spectrum`, optionally forwarding each
//! composite to an external spectrum display.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use iqsynth_core::device::{DeviceStatus, SimulatedDevice, Transmitter, VsgDevice};
use iqsynth_core::sink::SpectrumFrame;
use iqsynth_core::spectrum::{power_spectrum, purity_check, PurityReport, Window};
use iqsynth_core::{CompositeBuffer, Session, SignalDescriptor, Snapshot, SynthError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::BufWriter;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Longest stretch of a composite fed to the display FFT
pub const SPECTRUM_FFT_MAX: usize = 1 << 16;
/// Points kept in a published spectrum
pub const DISPLAY_POINTS: usize = 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Synth(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Synth(SynthError::SignalIndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Synth(e) if e.is_device() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = Json(json!({ "status": "error", "message": self.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Spectrum of one composite, ready for plotting
#[derive(Debug, Clone, Serialize)]
pub struct SpectrumView {
    pub center_frequency_hz: f64,
    pub sample_rate: f64,
    pub num_samples: usize,
    pub peak_offset_hz: Option<f64>,
    pub peak_db: Option<f64>,
    /// Offsets from the center frequency
    pub frequencies_hz: Vec<f64>,
    pub power_db: Vec<f64>,
}

impl SpectrumView {
    pub fn from_buffer(buffer: &CompositeBuffer, center_frequency_hz: f64) -> Self {
        let head = &buffer.samples()[..buffer.len().min(SPECTRUM_FFT_MAX)];
        let spectrum = power_spectrum(head, buffer.sample_rate, Window::Hann);
        let peak = spectrum.peak();
        let display = spectrum.decimate(DISPLAY_POINTS);
        Self {
            center_frequency_hz,
            sample_rate: buffer.sample_rate,
            num_samples: buffer.len(),
            peak_offset_hz: peak.map(|p| p.0),
            peak_db: peak.map(|p| p.1),
            frequencies_hz: display.frequencies_hz,
            power_db: display.power_db,
        }
    }
}

pub struct AppState {
    pub session: Session,
    transmitter: Mutex<Transmitter<SimulatedDevice>>,
    spectrum: watch::Sender<Option<SpectrumView>>,
    spectrum_sink: Option<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(session: Session, device: SimulatedDevice) -> Self {
        let (spectrum, _) = watch::channel(None);
        Self {
            session,
            transmitter: Mutex::new(Transmitter::new(device)),
            spectrum,
            spectrum_sink: None,
        }
    }

    /// Forward every refreshed composite to a spectrum display at `addr`
    pub fn with_spectrum_sink(mut self, addr: String) -> Self {
        self.spectrum_sink = Some(addr);
        self
    }

    pub fn latest_spectrum(&self) -> Option<SpectrumView> {
        self.spectrum.borrow().clone()
    }

    pub fn is_transmitting(&self) -> bool {
        self.lock_transmitter().device().is_playing()
    }

    fn lock_transmitter(&self) -> std::sync::MutexGuard<'_, Transmitter<SimulatedDevice>> {
        self.transmitter.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/signals", get(list_signals).post(add_signal))
        .route("/api/signals/{index}", put(edit_signal).delete(remove_signal))
        .route("/api/signals/{index}/toggle", post(toggle_signal))
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/preview", get(preview))
        .route("/api/spectrum", get(spectrum))
        .route("/api/purity", get(purity))
        .route("/api/transmit", post(transmit))
        .route("/api/abort", post(abort))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn render_snapshot(
    snapshot: Snapshot,
    seed: Option<u64>,
    duration_s: Option<f64>,
) -> Result<CompositeBuffer, ApiError> {
    let buffer = tokio::task::spawn_blocking(move || snapshot.render(seed, duration_s)).await??;
    Ok(buffer)
}

#[derive(Debug, Serialize)]
struct SignalEntry {
    index: usize,
    summary: String,
    descriptor: SignalDescriptor,
}

async fn list_signals(State(state): State<SharedState>) -> Json<Value> {
    let entries: Vec<SignalEntry> = state
        .session
        .signals()
        .iter()
        .enumerate()
        .map(|(index, descriptor)| SignalEntry {
            index,
            summary: descriptor.to_string(),
            descriptor: descriptor.clone(),
        })
        .collect();
    Json(json!({ "status": "ok", "signals": entries }))
}

async fn add_signal(
    State(state): State<SharedState>,
    Json(descriptor): Json<SignalDescriptor>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let index = state.session.add_signal(descriptor)?;
    info!("Added signal {}", index);
    Ok((StatusCode::CREATED, Json(json!({ "status": "ok", "index": index }))))
}

async fn edit_signal(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Json(descriptor): Json<SignalDescriptor>,
) -> ApiResult<Value> {
    state.session.edit_signal(index, descriptor)?;
    info!("Edited signal {}", index);
    Ok(Json(json!({ "status": "ok", "index": index })))
}

async fn remove_signal(State(state): State<SharedState>, Path(index): Path<usize>) -> ApiResult<Value> {
    let removed = state.session.remove_signal(index)?;
    info!("Removed signal {}: {}", index, removed);
    Ok(Json(json!({ "status": "ok", "removed": removed })))
}

async fn toggle_signal(State(state): State<SharedState>, Path(index): Path<usize>) -> ApiResult<Value> {
    let enabled = state.session.toggle_signal(index)?;
    Ok(Json(json!({ "status": "ok", "index": index, "enabled": enabled })))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub center_frequency_hz: f64,
    pub level_dbm: f64,
    pub sample_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub center_frequency_hz: Option<f64>,
    pub level_dbm: Option<f64>,
    pub sample_rate: Option<f64>,
}

fn settings_of(snapshot: &Snapshot) -> Settings {
    Settings {
        center_frequency_hz: snapshot.center_frequency_hz,
        level_dbm: snapshot.level_dbm,
        sample_rate: snapshot.sample_rate,
    }
}

async fn get_settings(State(state): State<SharedState>) -> Json<Settings> {
    Json(settings_of(&state.session.snapshot()))
}

async fn update_settings(
    State(state): State<SharedState>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Settings> {
    let snapshot = state.session.update_settings(
        update.center_frequency_hz,
        update.level_dbm,
        update.sample_rate,
    )?;
    Ok(Json(settings_of(&snapshot)))
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    pub seed: Option<u64>,
    pub duration: Option<f64>,
}

async fn preview(State(state): State<SharedState>, Query(query): Query<RenderQuery>) -> ApiResult<Value> {
    let snapshot = state.session.snapshot();
    let center = snapshot.center_frequency_hz;
    let buffer = render_snapshot(snapshot, query.seed, query.duration).await?;

    let i: Vec<f32> = buffer.samples().iter().map(|s| s.re).collect();
    let q: Vec<f32> = buffer.samples().iter().map(|s| s.im).collect();
    Ok(Json(json!({
        "status": "ok",
        "i": i,
        "q": q,
        "sample_rate": buffer.sample_rate,
        "num_samples": buffer.len(),
        "center_freq": center,
    })))
}

/// Latest background spectrum, or a fresh one if the refresh task has not run yet
async fn spectrum(State(state): State<SharedState>) -> ApiResult<SpectrumView> {
    if let Some(view) = state.latest_spectrum() {
        return Ok(Json(view));
    }
    let snapshot = state.session.snapshot();
    let center = snapshot.center_frequency_hz;
    let buffer = render_snapshot(snapshot, None, None).await?;
    Ok(Json(SpectrumView::from_buffer(&buffer, center)))
}

async fn purity(State(state): State<SharedState>, Query(query): Query<RenderQuery>) -> ApiResult<Value> {
    let buffer = render_snapshot(state.session.snapshot(), query.seed, query.duration).await?;
    let report: PurityReport = purity_check(buffer.samples());
    Ok(Json(json!({
        "status": "ok",
        "image_rejection_db": report.image_rejection_db,
        "dc_magnitude": report.dc_magnitude,
        "orthogonality": report.orthogonality,
    })))
}

fn describe_statuses(statuses: &[DeviceStatus]) -> Vec<String> {
    statuses
        .iter()
        .map(|s| match s {
            DeviceStatus::Ok => "ok".to_string(),
            DeviceStatus::Warning(code) => format!("warning {}", code),
        })
        .collect()
}

async fn transmit(State(state): State<SharedState>, Query(query): Query<RenderQuery>) -> ApiResult<Value> {
    let snapshot = state.session.snapshot();
    let (center, level) = (snapshot.center_frequency_hz, snapshot.level_dbm);
    let buffer = render_snapshot(snapshot, query.seed, query.duration).await?;

    let mut statuses = Vec::new();
    {
        let mut tx = state.lock_transmitter();
        statuses.extend(tx.configure(center, level)?);
        statuses.extend(tx.transmit(&buffer)?);
    }
    info!(
        "Transmitting {} samples at {} Hz, {} dBm",
        buffer.len(),
        center,
        level
    );

    Ok(Json(json!({
        "status": "ok",
        "num_samples": buffer.len(),
        "sample_rate": buffer.sample_rate,
        "device": describe_statuses(&statuses),
    })))
}

async fn abort(State(state): State<SharedState>) -> ApiResult<Value> {
    let status = state.lock_transmitter().abort()?;
    info!("Transmission aborted");
    Ok(Json(json!({ "status": "ok", "device": describe_statuses(&[status]) })))
}

/// Push one frame to the spectrum display, reusing `stream` when connected
///
/// Returns the stream to keep for the next frame, or `None` after a failure
/// so the next refresh reconnects.
fn forward_to_sink(stream: Option<TcpStream>, addr: &str, frame: &SpectrumFrame) -> Option<TcpStream> {
    let stream = match stream {
        Some(stream) => stream,
        None => match TcpStream::connect(addr) {
            Ok(stream) => {
                info!("Connected to spectrum sink at {}", addr);
                stream
            }
            Err(e) => {
                debug!("Spectrum sink {} unavailable: {}", addr, e);
                return None;
            }
        },
    };

    let mut writer = BufWriter::new(stream);
    if let Err(e) = frame.write_to(&mut writer) {
        warn!("Lost spectrum sink at {}: {}", addr, e);
        return None;
    }
    writer.into_inner().ok()
}

/// Re-render the session every `interval` until `shutdown` flips to true
pub fn spawn_refresh(
    state: SharedState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sink: Option<TcpStream> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = state.session.snapshot();
                    let center = snapshot.center_frequency_hz;
                    let sink_addr = state.spectrum_sink.clone();
                    let stream = sink.take();

                    let result = tokio::task::spawn_blocking(move || {
                        let buffer = snapshot.render(None, None)?;
                        let view = SpectrumView::from_buffer(&buffer, center);
                        let stream = sink_addr.as_deref().and_then(|addr| {
                            let frame = SpectrumFrame::Samples {
                                sample_rate: buffer.sample_rate,
                                samples: buffer.into_samples(),
                            };
                            forward_to_sink(stream, addr, &frame)
                        });
                        Ok::<_, SynthError>((view, stream))
                    })
                    .await;

                    match result {
                        Ok(Ok((view, stream))) => {
                            state.spectrum.send_replace(Some(view));
                            sink = stream;
                        }
                        Ok(Err(e)) => warn!("Spectrum refresh skipped: {}", e),
                        Err(e) => error!("Spectrum refresh task failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let (Some(stream), Some(addr)) = (sink, state.spectrum_sink.as_deref()) {
            let _ = tokio::task::spawn_blocking({
                let addr = addr.to_string();
                move || forward_to_sink(Some(stream), &addr, &SpectrumFrame::Shutdown)
            })
            .await;
        }
        info!("Spectrum refresh stopped");
    })
}

/// Serve the API on `listener` until Ctrl-C, then stop the refresh task
pub async fn run(
    listener: tokio::net::TcpListener,
    state: SharedState,
    refresh_interval: Duration,
) -> std::io::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh = spawn_refresh(Arc::clone(&state), refresh_interval, shutdown_rx);

    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = refresh.await {
        error!("Refresh task ended abnormally: {}", e);
    }

    release_device(&state);
    Ok(())
}

/// Stop playback and close the generator, logging failures
fn release_device(state: &AppState) {
    let mut tx = state.lock_transmitter();
    if tx.device().is_playing() {
        if let Err(e) = tx.abort() {
            warn!("Failed to stop playback on shutdown: {}", e);
        }
    }
    if let Err(e) = tx.device_mut().close() {
        warn!("Failed to close generator: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let bad = ApiError::Synth(SynthError::InvalidRolloff(0.5));
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let missing = ApiError::Synth(SynthError::SignalIndexOutOfRange { index: 3, len: 1 });
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

        let device = ApiError::Synth(SynthError::Device {
            operation: "set_level",
            status: -4,
        });
        assert_eq!(device.status_code(), StatusCode::BAD_GATEWAY);

        let io = ApiError::Synth(SynthError::Io(std::io::Error::other("disk")));
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_release_device_stops_and_closes() {
        let state = AppState::new(
            Session::new(),
            SimulatedDevice::open().expect("Failed to open device"),
        );
        let buffer = CompositeBuffer {
            sample_rate: 10e6,
            samples: vec![iqsynth_core::Complex32::new(0.5, 0.0); 1000],
        };
        state
            .lock_transmitter()
            .transmit(&buffer)
            .expect("Failed to transmit");
        assert!(state.is_transmitting());

        release_device(&state);
        let tx = state.lock_transmitter();
        assert!(!tx.device().is_playing());
        assert!(!tx.device().is_open());
        drop(tx);

        // Releasing an already closed device is harmless
        release_device(&state);
    }

    #[test]
    fn test_spectrum_view_is_decimated() {
        let buffer = CompositeBuffer {
            sample_rate: 10e6,
            samples: vec![iqsynth_core::Complex32::new(1.0, 0.0); 4096],
        };
        let view = SpectrumView::from_buffer(&buffer, 1.23e9);
        assert_eq!(view.power_db.len(), DISPLAY_POINTS);
        assert_eq!(view.num_samples, 4096);
        assert_eq!(view.peak_offset_hz, Some(0.0));
    }
}
