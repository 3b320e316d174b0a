use crate::descriptor::PulseGate;
use crate::Complex64;

/// Binary on/off envelope for a pulse gate
///
/// Sample `i` is on (1.0) when `(i / fs) mod (1 / freq) < width`, off (0.0) otherwise.
pub fn gate_envelope(num_samples: usize, sample_rate: f64, gate: &PulseGate) -> Vec<f64> {
    let period = gate.period_s();
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            if t.rem_euclid(period) < gate.width_s {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Multiply a carrier by its gate envelope in place
pub fn apply_gate(samples: &mut [Complex64], sample_rate: f64, gate: &PulseGate) {
    let envelope = gate_envelope(samples.len(), sample_rate, gate);
    for (sample, on) in samples.iter_mut().zip(envelope) {
        *sample *= on;
    }
}

/// Fraction of the period the gate is open, clamped to [0, 1]
pub fn duty_cycle(gate: &PulseGate) -> f64 {
    (gate.width_s * gate.freq_hz).clamp(0.0, 1.0)
}
