use crate::descriptor::{PulseGate, SignalDescriptor};
use crate::error::{Result, SynthError};
use crate::signal_set::SignalSet;
use crate::{MAX_BUFFER_SAMPLES, RRC_TAPS_PER_SPS, ROLLOFF_MENU};

/// Tolerance used when matching a roll-off against the menu
const ROLLOFF_TOLERANCE: f64 = 1e-9;

pub fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(SynthError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

/// Number of samples for a render of `duration_s` at `sample_rate`
pub fn buffer_len(sample_rate: f64, duration_s: f64) -> Result<usize> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(SynthError::InvalidDuration(duration_s));
    }

    let samples = (sample_rate * duration_s).round();
    if samples < 1.0 {
        return Err(SynthError::InvalidDuration(duration_s));
    }
    if samples > MAX_BUFFER_SAMPLES as f64 {
        return Err(SynthError::BufferTooLarge {
            requested: samples.min(usize::MAX as f64) as usize,
            limit: MAX_BUFFER_SAMPLES,
        });
    }

    Ok(samples as usize)
}

pub fn validate_rolloff(rolloff: f64) -> Result<()> {
    if ROLLOFF_MENU
        .iter()
        .any(|&r| (r - rolloff).abs() < ROLLOFF_TOLERANCE)
    {
        Ok(())
    } else {
        Err(SynthError::InvalidRolloff(rolloff))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SynthError::NonPositiveParameter { name, value });
    }
    Ok(())
}

/// A symbol rate is usable if its RRC kernel (`RRC_TAPS_PER_SPS` taps per
/// sample-per-symbol) fits within `MAX_BUFFER_SAMPLES`
fn validate_symbol_rate(name: &'static str, rate_hz: f64, sample_rate: f64) -> Result<()> {
    positive(name, rate_hz)?;
    let taps = (sample_rate / rate_hz).floor() * RRC_TAPS_PER_SPS as f64;
    if !taps.is_finite() || taps > MAX_BUFFER_SAMPLES as f64 {
        return Err(SynthError::SymbolRateTooLow {
            name,
            rate_hz,
            taps,
            limit: MAX_BUFFER_SAMPLES,
        });
    }
    Ok(())
}

fn validate_pulse(gate: &PulseGate) -> Result<()> {
    positive("pulse width", gate.width_s)?;
    positive("pulse frequency", gate.freq_hz)
}

/// Check one descriptor against the sample rate it will be rendered at
pub fn validate_descriptor(descriptor: &SignalDescriptor, sample_rate: f64) -> Result<()> {
    validate_sample_rate(sample_rate)?;

    let nyquist_hz = sample_rate / 2.0;
    let offset_hz = descriptor.freq_offset_hz();
    if !offset_hz.is_finite() || offset_hz.abs() > nyquist_hz {
        return Err(SynthError::FrequencyOutOfRange {
            offset_hz,
            nyquist_hz,
        });
    }

    if !descriptor.gain_dbm().is_finite() {
        return Err(SynthError::NonFiniteParameter {
            name: "gain",
            value: descriptor.gain_dbm(),
        });
    }

    match descriptor {
        SignalDescriptor::Cw { pulse, .. } => {
            if let Some(gate) = pulse {
                validate_pulse(gate)?;
            }
        }
        SignalDescriptor::Psk {
            rolloff,
            symbol_rate_hz,
            pulse,
            ..
        } => {
            validate_rolloff(*rolloff)?;
            validate_symbol_rate("symbol rate", *symbol_rate_hz, sample_rate)?;
            if let Some(gate) = pulse {
                validate_pulse(gate)?;
            }
        }
        SignalDescriptor::SweepingCw {
            sweep_bandwidth_hz,
            sweep_speed,
            ..
        } => {
            positive("sweep bandwidth", *sweep_bandwidth_hz)?;
            positive("sweep speed", *sweep_speed)?;
        }
        SignalDescriptor::FrequencyHopping {
            hop_bandwidth_hz,
            num_slots,
            hop_rate_hz,
            ..
        } => {
            positive("hop bandwidth", *hop_bandwidth_hz)?;
            if *num_slots < 2 {
                return Err(SynthError::InvalidSlotCount {
                    count: *num_slots,
                    min: 2,
                });
            }
            positive("hop rate", *hop_rate_hz)?;
        }
        SignalDescriptor::Tdma {
            num_slots,
            slot_bandwidth_hz,
            min_pulse_rate_hz,
            max_pulse_rate_hz,
            burst_symbol_rate_hz,
            burst_pulse_width_s,
            ..
        } => {
            if *num_slots < 1 {
                return Err(SynthError::InvalidSlotCount {
                    count: *num_slots,
                    min: 1,
                });
            }
            positive("slot bandwidth", *slot_bandwidth_hz)?;
            positive("minimum pulse rate", *min_pulse_rate_hz)?;
            positive("maximum pulse rate", *max_pulse_rate_hz)?;
            if min_pulse_rate_hz > max_pulse_rate_hz {
                return Err(SynthError::InvalidPulseRange {
                    min_hz: *min_pulse_rate_hz,
                    max_hz: *max_pulse_rate_hz,
                });
            }
            validate_symbol_rate("burst symbol rate", *burst_symbol_rate_hz, sample_rate)?;
            positive("burst pulse width", *burst_pulse_width_s)?;
        }
    }

    Ok(())
}

fn validate_indexed<'a>(
    descriptors: impl Iterator<Item = (usize, &'a SignalDescriptor)>,
    sample_rate: f64,
) -> Result<()> {
    validate_sample_rate(sample_rate)?;
    for (index, descriptor) in descriptors {
        validate_descriptor(descriptor, sample_rate).map_err(|e| SynthError::InvalidSignal {
            index,
            source: Box::new(e),
        })?;
    }
    Ok(())
}

/// Validate every descriptor, enabled or not, reporting the first failure with its index
pub fn validate_signal_set(signals: &SignalSet, sample_rate: f64) -> Result<()> {
    validate_indexed(signals.iter().enumerate(), sample_rate)
}

/// Validate only the enabled descriptors; indices refer to positions in the full set
pub fn validate_enabled(signals: &SignalSet, sample_rate: f64) -> Result<()> {
    validate_indexed(
        signals.iter().enumerate().filter(|(_, d)| d.is_enabled()),
        sample_rate,
    )
}
