use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Frequency offset {offset_hz} Hz exceeds +/-{nyquist_hz} Hz (half the sample rate)")]
    FrequencyOutOfRange { offset_hz: f64, nyquist_hz: f64 },

    #[error("Unsupported modulation: {0} (expected bpsk, qpsk or 8psk)")]
    UnsupportedModulation(String),

    #[error("Invalid RRC roll-off {0} (expected one of 0.2, 0.25, 0.3, 0.35)")]
    InvalidRolloff(f64),

    #[error("{name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    #[error("{name} must be a finite number, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("Invalid slot count {count} (minimum {min})")]
    InvalidSlotCount { count: usize, min: usize },

    #[error("Invalid pulse rate range: min {min_hz} Hz > max {max_hz} Hz")]
    InvalidPulseRange { min_hz: f64, max_hz: f64 },

    #[error("{name} {rate_hz} Hz needs a {taps}-tap shaping filter (limit {limit})")]
    SymbolRateTooLow {
        name: &'static str,
        rate_hz: f64,
        taps: f64,
        limit: usize,
    },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid duration: {0} s")]
    InvalidDuration(f64),

    #[error("Buffer of {requested} samples exceeds the limit of {limit}")]
    BufferTooLarge { requested: usize, limit: usize },

    #[error("Signal {index}: {source}")]
    InvalidSignal {
        index: usize,
        #[source]
        source: Box<SynthError>,
    },

    #[error("Signal index {index} out of range ({len} signals)")]
    SignalIndexOutOfRange { index: usize, len: usize },

    #[error("Interleaved IQ data must have an even number of values, got {0}")]
    InvalidIqLength(usize),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Device error during {operation}: status {status}")]
    Device { operation: &'static str, status: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    /// True for errors raised by input validation, before any synthesis runs
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SynthError::FrequencyOutOfRange { .. }
                | SynthError::UnsupportedModulation(_)
                | SynthError::InvalidRolloff(_)
                | SynthError::NonPositiveParameter { .. }
                | SynthError::NonFiniteParameter { .. }
                | SynthError::InvalidSlotCount { .. }
                | SynthError::InvalidPulseRange { .. }
                | SynthError::SymbolRateTooLow { .. }
                | SynthError::InvalidSampleRate(_)
                | SynthError::InvalidDuration(_)
                | SynthError::BufferTooLarge { .. }
                | SynthError::InvalidSignal { .. }
                | SynthError::InvalidFrequency(_)
        )
    }

    pub fn is_device(&self) -> bool {
        matches!(self, SynthError::Device { .. })
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = SynthError::InvalidRolloff(0.5);
        assert!(err.is_validation());
        assert!(!err.is_device());

        let err = SynthError::Device { operation: "abort", status: -3 };
        assert!(err.is_device());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_invalid_signal_message_includes_index() {
        let err = SynthError::InvalidSignal {
            index: 2,
            source: Box::new(SynthError::InvalidRolloff(0.5)),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Signal 2:"), "unexpected message: {}", msg);
        assert!(msg.contains("0.5"));
    }
}
