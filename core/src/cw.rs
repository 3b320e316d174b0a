use crate::units::db_to_amplitude;
use crate::Complex64;
use std::f64::consts::PI;

/// Generate a continuous tone at `freq_offset_hz` from the carrier
///
/// `A * exp(j 2π f n / fs)` with `A = 10^(gain_dbm / 20)`. The magnitude is
/// constant so the tone can be gated or summed without further scaling.
pub fn generate_cw(
    freq_offset_hz: f64,
    gain_dbm: f64,
    sample_rate: f64,
    num_samples: usize,
) -> Vec<Complex64> {
    let amplitude = db_to_amplitude(gain_dbm);
    (0..num_samples)
        .map(|n| {
            let t = n as f64 / sample_rate;
            Complex64::from_polar(amplitude, 2.0 * PI * freq_offset_hz * t)
        })
        .collect()
}

/// Multiply `samples` by `exp(j 2π f n / fs)`, shifting them by `freq_offset_hz`
pub fn mix(samples: &mut [Complex64], freq_offset_hz: f64, sample_rate: f64) {
    if freq_offset_hz == 0.0 {
        return;
    }
    for (n, sample) in samples.iter_mut().enumerate() {
        let t = n as f64 / sample_rate;
        *sample *= Complex64::from_polar(1.0, 2.0 * PI * freq_offset_hz * t);
    }
}
