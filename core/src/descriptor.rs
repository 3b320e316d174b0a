use crate::error::SynthError;
use crate::{DEFAULT_TDMA_PULSE_WIDTH_S, DEFAULT_TDMA_SYMBOL_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Periodic on/off envelope: on for `width_s` at the start of every `1/freq_hz` period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseGate {
    pub width_s: f64,
    pub freq_hz: f64,
}

impl PulseGate {
    pub fn new(width_s: f64, freq_hz: f64) -> Self {
        Self { width_s, freq_hz }
    }

    pub fn period_s(&self) -> f64 {
        1.0 / self.freq_hz
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PskModulation {
    #[serde(rename = "bpsk")]
    Bpsk,
    #[serde(rename = "qpsk")]
    Qpsk,
    #[serde(rename = "8psk")]
    Psk8,
}

impl PskModulation {
    /// Number of constellation points (M)
    pub fn order(&self) -> usize {
        match self {
            PskModulation::Bpsk => 2,
            PskModulation::Qpsk => 4,
            PskModulation::Psk8 => 8,
        }
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.order().trailing_zeros() as usize
    }

    pub fn from_order(order: usize) -> Result<Self, SynthError> {
        match order {
            2 => Ok(PskModulation::Bpsk),
            4 => Ok(PskModulation::Qpsk),
            8 => Ok(PskModulation::Psk8),
            other => Err(SynthError::UnsupportedModulation(format!("{}-PSK", other))),
        }
    }
}

impl FromStr for PskModulation {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bpsk" => Ok(PskModulation::Bpsk),
            "qpsk" => Ok(PskModulation::Qpsk),
            "8psk" => Ok(PskModulation::Psk8),
            _ => Err(SynthError::UnsupportedModulation(s.to_string())),
        }
    }
}

impl fmt::Display for PskModulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PskModulation::Bpsk => "BPSK",
            PskModulation::Qpsk => "QPSK",
            PskModulation::Psk8 => "8PSK",
        };
        f.write_str(name)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_tdma_symbol_rate() -> f64 {
    DEFAULT_TDMA_SYMBOL_RATE_HZ
}

fn default_tdma_pulse_width() -> f64 {
    DEFAULT_TDMA_PULSE_WIDTH_S
}

/// Configuration of one sub-signal of the composite
///
/// Serialized with a `"type"` tag so signal sets can be stored as JSON:
/// `{"type": "cw", "freq_offset_hz": 1e6, "gain_dbm": -10.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalDescriptor {
    Cw {
        freq_offset_hz: f64,
        gain_dbm: f64,
        #[serde(default = "default_enabled")]
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pulse: Option<PulseGate>,
    },
    Psk {
        freq_offset_hz: f64,
        gain_dbm: f64,
        #[serde(default = "default_enabled")]
        enabled: bool,
        modulation: PskModulation,
        rolloff: f64,
        symbol_rate_hz: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pulse: Option<PulseGate>,
    },
    SweepingCw {
        freq_offset_hz: f64,
        gain_dbm: f64,
        #[serde(default = "default_enabled")]
        enabled: bool,
        sweep_bandwidth_hz: f64,
        /// Sweep rate in Hz per second
        sweep_speed: f64,
    },
    #[serde(rename = "freq_hopping")]
    FrequencyHopping {
        freq_offset_hz: f64,
        gain_dbm: f64,
        #[serde(default = "default_enabled")]
        enabled: bool,
        hop_bandwidth_hz: f64,
        num_slots: usize,
        hop_rate_hz: f64,
    },
    Tdma {
        /// Center of the slot plan
        freq_offset_hz: f64,
        gain_dbm: f64,
        #[serde(default = "default_enabled")]
        enabled: bool,
        num_slots: usize,
        slot_bandwidth_hz: f64,
        min_pulse_rate_hz: f64,
        max_pulse_rate_hz: f64,
        #[serde(default = "default_tdma_symbol_rate")]
        burst_symbol_rate_hz: f64,
        #[serde(default = "default_tdma_pulse_width")]
        burst_pulse_width_s: f64,
    },
}

impl SignalDescriptor {
    pub fn cw(freq_offset_hz: f64, gain_dbm: f64) -> Self {
        SignalDescriptor::Cw {
            freq_offset_hz,
            gain_dbm,
            enabled: true,
            pulse: None,
        }
    }

    pub fn psk(
        freq_offset_hz: f64,
        gain_dbm: f64,
        modulation: PskModulation,
        rolloff: f64,
        symbol_rate_hz: f64,
    ) -> Self {
        SignalDescriptor::Psk {
            freq_offset_hz,
            gain_dbm,
            enabled: true,
            modulation,
            rolloff,
            symbol_rate_hz,
            pulse: None,
        }
    }

    pub fn sweeping_cw(
        freq_offset_hz: f64,
        gain_dbm: f64,
        sweep_bandwidth_hz: f64,
        sweep_speed: f64,
    ) -> Self {
        SignalDescriptor::SweepingCw {
            freq_offset_hz,
            gain_dbm,
            enabled: true,
            sweep_bandwidth_hz,
            sweep_speed,
        }
    }

    pub fn frequency_hopping(
        freq_offset_hz: f64,
        gain_dbm: f64,
        hop_bandwidth_hz: f64,
        num_slots: usize,
        hop_rate_hz: f64,
    ) -> Self {
        SignalDescriptor::FrequencyHopping {
            freq_offset_hz,
            gain_dbm,
            enabled: true,
            hop_bandwidth_hz,
            num_slots,
            hop_rate_hz,
        }
    }

    pub fn tdma(
        center_hz: f64,
        gain_dbm: f64,
        num_slots: usize,
        slot_bandwidth_hz: f64,
        min_pulse_rate_hz: f64,
        max_pulse_rate_hz: f64,
    ) -> Self {
        SignalDescriptor::Tdma {
            freq_offset_hz: center_hz,
            gain_dbm,
            enabled: true,
            num_slots,
            slot_bandwidth_hz,
            min_pulse_rate_hz,
            max_pulse_rate_hz,
            burst_symbol_rate_hz: DEFAULT_TDMA_SYMBOL_RATE_HZ,
            burst_pulse_width_s: DEFAULT_TDMA_PULSE_WIDTH_S,
        }
    }

    /// Attach a pulse gate. Only CW and PSK descriptors carry one; other kinds are returned unchanged.
    pub fn with_pulse(mut self, gate: PulseGate) -> Self {
        match &mut self {
            SignalDescriptor::Cw { pulse, .. } | SignalDescriptor::Psk { pulse, .. } => {
                *pulse = Some(gate);
            }
            _ => {}
        }
        self
    }

    pub fn disabled(mut self) -> Self {
        self.set_enabled(false);
        self
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalDescriptor::Cw { .. } => "cw",
            SignalDescriptor::Psk { .. } => "psk",
            SignalDescriptor::SweepingCw { .. } => "sweeping_cw",
            SignalDescriptor::FrequencyHopping { .. } => "freq_hopping",
            SignalDescriptor::Tdma { .. } => "tdma",
        }
    }

    pub fn freq_offset_hz(&self) -> f64 {
        match self {
            SignalDescriptor::Cw { freq_offset_hz, .. }
            | SignalDescriptor::Psk { freq_offset_hz, .. }
            | SignalDescriptor::SweepingCw { freq_offset_hz, .. }
            | SignalDescriptor::FrequencyHopping { freq_offset_hz, .. }
            | SignalDescriptor::Tdma { freq_offset_hz, .. } => *freq_offset_hz,
        }
    }

    pub fn gain_dbm(&self) -> f64 {
        match self {
            SignalDescriptor::Cw { gain_dbm, .. }
            | SignalDescriptor::Psk { gain_dbm, .. }
            | SignalDescriptor::SweepingCw { gain_dbm, .. }
            | SignalDescriptor::FrequencyHopping { gain_dbm, .. }
            | SignalDescriptor::Tdma { gain_dbm, .. } => *gain_dbm,
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            SignalDescriptor::Cw { enabled, .. }
            | SignalDescriptor::Psk { enabled, .. }
            | SignalDescriptor::SweepingCw { enabled, .. }
            | SignalDescriptor::FrequencyHopping { enabled, .. }
            | SignalDescriptor::Tdma { enabled, .. } => *enabled,
        }
    }

    pub fn set_enabled(&mut self, value: bool) {
        match self {
            SignalDescriptor::Cw { enabled, .. }
            | SignalDescriptor::Psk { enabled, .. }
            | SignalDescriptor::SweepingCw { enabled, .. }
            | SignalDescriptor::FrequencyHopping { enabled, .. }
            | SignalDescriptor::Tdma { enabled, .. } => *enabled = value,
        }
    }

    /// Optional gating envelope (CW and PSK only)
    pub fn pulse(&self) -> Option<&PulseGate> {
        match self {
            SignalDescriptor::Cw { pulse, .. } | SignalDescriptor::Psk { pulse, .. } => {
                pulse.as_ref()
            }
            _ => None,
        }
    }

    /// Length of one sweep period in seconds, for sweeping descriptors
    pub fn sweep_period_s(&self) -> Option<f64> {
        match self {
            SignalDescriptor::SweepingCw {
                sweep_bandwidth_hz,
                sweep_speed,
                ..
            } => Some(sweep_bandwidth_hz / sweep_speed),
            _ => None,
        }
    }
}

impl fmt::Display for SignalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_enabled() { "ENABLED" } else { "DISABLED" };
        let offset_mhz = self.freq_offset_hz() / 1e6;
        let gain = self.gain_dbm();

        match self {
            SignalDescriptor::Cw { .. } => {
                write!(f, "CW: Offset: {:.3} MHz, Gain: {:.1} dBm", offset_mhz, gain)?;
            }
            SignalDescriptor::Psk {
                modulation,
                rolloff,
                symbol_rate_hz,
                ..
            } => {
                write!(
                    f,
                    "{}: Offset: {:.3} MHz, Gain: {:.1} dBm, RRC: {}, SymRate: {}",
                    modulation, offset_mhz, gain, rolloff, symbol_rate_hz
                )?;
            }
            SignalDescriptor::SweepingCw {
                sweep_bandwidth_hz,
                sweep_speed,
                ..
            } => {
                write!(
                    f,
                    "Sweeping CW: Offset: {:.3} MHz, Gain: {:.1} dBm, BW: {:.3} MHz, Speed: {} Hz/s",
                    offset_mhz,
                    gain,
                    sweep_bandwidth_hz / 1e6,
                    sweep_speed
                )?;
            }
            SignalDescriptor::FrequencyHopping {
                hop_bandwidth_hz,
                num_slots,
                hop_rate_hz,
                ..
            } => {
                write!(
                    f,
                    "Freq Hopping CW: Offset: {:.3} MHz, Gain: {:.1} dBm, BW: {:.3} MHz, Slots: {}, Rate: {} hops/s",
                    offset_mhz,
                    gain,
                    hop_bandwidth_hz / 1e6,
                    num_slots,
                    hop_rate_hz
                )?;
            }
            SignalDescriptor::Tdma {
                num_slots,
                slot_bandwidth_hz,
                min_pulse_rate_hz,
                max_pulse_rate_hz,
                ..
            } => {
                write!(
                    f,
                    "TDMA: Center: {:.3} MHz, Gain: {:.1} dBm, Slots: {}, Slot BW: {:.3} MHz, Pulse: {}-{} Hz",
                    offset_mhz,
                    gain,
                    num_slots,
                    slot_bandwidth_hz / 1e6,
                    min_pulse_rate_hz,
                    max_pulse_rate_hz
                )?;
            }
        }

        if let Some(gate) = self.pulse() {
            write!(f, ", Pulse: {} s @ {} Hz", gate.width_s, gate.freq_hz)?;
        }

        write!(f, ", {}", status)
    }
}
