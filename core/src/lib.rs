//! Composite I/Q waveform synthesis for vector signal generators
//!
//! Builds one baseband buffer out of independently configured CW, PSK,
//! sweeping, frequency-hopping and TDMA sub-signals, normalized so the
//! result can be looped by the instrument without clipping.

pub mod error;
pub mod units;
pub mod descriptor;
pub mod signal_set;
pub mod validate;
pub mod rrc;
pub mod envelope;
pub mod cw;
pub mod psk;
pub mod sweep;
pub mod hopping;
pub mod tdma;
pub mod compositor;
pub mod formatter;
pub mod iqfile;
pub mod sink;
pub mod spectrum;
pub mod device;
pub mod session;

pub use compositor::{CompositeBuffer, Compositor};
pub use descriptor::{PskModulation, PulseGate, SignalDescriptor};
pub use error::{Result, SynthError};
pub use session::{Session, Snapshot};
pub use signal_set::SignalSet;

/// Complex sample type handed to the device and sinks (two f32, "complex64")
pub type Complex32 = rustfft::num_complex::Complex<f32>;

/// Complex sample type used internally by the generators
pub type Complex64 = rustfft::num_complex::Complex<f64>;

// Session defaults
pub const DEFAULT_SAMPLE_RATE: f64 = 10e6; // Hz
pub const DEFAULT_DURATION_S: f64 = 0.01; // 10 ms
pub const DEFAULT_CENTER_FREQUENCY_HZ: f64 = 1.23e9;
pub const DEFAULT_LEVEL_DBM: f64 = -60.0;

// Pulse shaping
pub const MIN_SAMPLES_PER_SYMBOL: usize = 8;
pub const RRC_TAPS_PER_SPS: usize = 41;
pub const ROLLOFF_MENU: [f64; 4] = [0.20, 0.25, 0.30, 0.35];

// TDMA burst defaults
pub const TDMA_BURST_ROLLOFF: f64 = 0.35;
pub const DEFAULT_TDMA_SYMBOL_RATE_HZ: f64 = 1e6;
pub const DEFAULT_TDMA_PULSE_WIDTH_S: f64 = 200e-6;

/// Upper bound on a rendered buffer (32 Mi complex samples, 256 MiB as f32 pairs)
pub const MAX_BUFFER_SAMPLES: usize = 1 << 25;

// Spectrum display
pub const DEFAULT_SPECTRUM_SINK_ADDR: &str = "127.0.0.1:56789";
pub const DEFAULT_REFRESH_INTERVAL_S: f64 = 0.5;
