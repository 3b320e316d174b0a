use crate::descriptor::{PskModulation, PulseGate};
use crate::envelope::apply_gate;
use crate::psk::{generate_psk, PskParams};
use crate::{Complex64, TDMA_BURST_ROLLOFF};
use log::debug;
use rand::Rng;

/// Slot plan and burst parameters of a TDMA simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdmaParams {
    pub center_hz: f64,
    pub gain_dbm: f64,
    pub num_slots: usize,
    pub slot_bandwidth_hz: f64,
    pub min_pulse_rate_hz: f64,
    pub max_pulse_rate_hz: f64,
    pub burst_symbol_rate_hz: f64,
    pub burst_pulse_width_s: f64,
}

/// Carrier offset of every slot, spaced `slot_bandwidth` apart and centred on `center_hz`
pub fn slot_offsets(center_hz: f64, num_slots: usize, slot_bandwidth_hz: f64) -> Vec<f64> {
    let mid = (num_slots as f64 - 1.0) / 2.0;
    (0..num_slots)
        .map(|slot| center_hz + (slot as f64 - mid) * slot_bandwidth_hz)
        .collect()
}

/// Simulate pulsed QPSK bursts, one per slot, summed into a single buffer
///
/// Each slot draws its own pulse repetition rate uniformly from
/// `[min_pulse_rate, max_pulse_rate]`. The sum is not normalized here; the
/// compositor normalizes the final buffer.
pub fn generate_tdma<R: Rng + ?Sized>(
    params: &TdmaParams,
    sample_rate: f64,
    num_samples: usize,
    rng: &mut R,
) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); num_samples];

    for (slot, offset) in slot_offsets(params.center_hz, params.num_slots, params.slot_bandwidth_hz)
        .into_iter()
        .enumerate()
    {
        let burst_params = PskParams {
            modulation: PskModulation::Qpsk,
            rolloff: TDMA_BURST_ROLLOFF,
            symbol_rate_hz: params.burst_symbol_rate_hz,
            freq_offset_hz: offset,
            gain_dbm: params.gain_dbm,
        };
        let mut burst = generate_psk(&burst_params, num_samples, sample_rate, rng).samples;
        burst.resize(num_samples, Complex64::new(0.0, 0.0));

        let pulse_rate = if params.max_pulse_rate_hz > params.min_pulse_rate_hz {
            rng.gen_range(params.min_pulse_rate_hz..=params.max_pulse_rate_hz)
        } else {
            params.min_pulse_rate_hz
        };
        let gate = PulseGate::new(params.burst_pulse_width_s, pulse_rate);
        apply_gate(&mut burst, sample_rate, &gate);

        debug!(
            "TDMA slot {}: offset {:.0} Hz, pulse rate {:.1} Hz",
            slot, offset, pulse_rate
        );

        for (acc, s) in out.iter_mut().zip(burst) {
            *acc += s;
        }
    }

    out
}
