use crate::units::db_to_amplitude;
use crate::Complex64;
use std::f64::consts::PI;

/// Turn an instantaneous-frequency track into a constant-envelope signal
///
/// Phase is the running sum `2π Σ f[k] / fs` (inclusive of the current
/// sample), so frequency steps never produce phase jumps.
pub fn integrate_frequency<I>(inst_freq_hz: I, sample_rate: f64, amplitude: f64) -> Vec<Complex64>
where
    I: IntoIterator<Item = f64>,
{
    let two_pi = 2.0 * PI;
    let mut phase = 0.0f64;
    inst_freq_hz
        .into_iter()
        .map(|f| {
            phase = (phase + two_pi * f / sample_rate).rem_euclid(two_pi);
            Complex64::from_polar(amplitude, phase)
        })
        .collect()
}

/// Rising sawtooth in [-1, 1): -1 at the start of each unit period, ramping up to +1
pub fn sawtooth(x: f64) -> f64 {
    2.0 * (x - x.floor()) - 1.0
}

/// Instantaneous frequency of the sweep at time `t`
pub fn sweep_frequency(t: f64, freq_offset_hz: f64, sweep_bandwidth_hz: f64, sweep_period_s: f64) -> f64 {
    freq_offset_hz + sweep_bandwidth_hz / 2.0 * sawtooth(t / sweep_period_s)
}

/// Generate a sawtooth frequency sweep
///
/// The instantaneous frequency ramps linearly from `f0 - bw/2` to `f0 + bw/2`
/// at `sweep_speed` Hz/s, then retraces; one period lasts `bw / sweep_speed`
/// seconds. The sweep is periodic, so any `num_samples` is filled.
pub fn generate_sweeping_cw(
    freq_offset_hz: f64,
    gain_dbm: f64,
    sample_rate: f64,
    num_samples: usize,
    sweep_bandwidth_hz: f64,
    sweep_speed: f64,
) -> Vec<Complex64> {
    let period = sweep_bandwidth_hz / sweep_speed;
    let track = (0..num_samples).map(|n| {
        let t = n as f64 / sample_rate;
        sweep_frequency(t, freq_offset_hz, sweep_bandwidth_hz, period)
    });
    integrate_frequency(track, sample_rate, db_to_amplitude(gain_dbm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sawtooth_shape() {
        assert_eq!(sawtooth(0.0), -1.0);
        assert!((sawtooth(0.5) - 0.0).abs() < 1e-12);
        assert!((sawtooth(0.75) - 0.5).abs() < 1e-12);
        assert_eq!(sawtooth(1.0), -1.0);
        assert!((sawtooth(2.25) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_spans_band() {
        let period = 1e-3;
        assert_eq!(sweep_frequency(0.0, 1e6, 2e6, period), 0.0);
        assert!((sweep_frequency(period / 2.0, 1e6, 2e6, period) - 1e6).abs() < 1e-3);
        assert!(sweep_frequency(period * 0.999, 1e6, 2e6, period) < 2e6);
    }

    #[test]
    fn test_integrate_constant_frequency_matches_tone() {
        // Constant fs/8 track: each sample advances the phase by π/4
        let out = integrate_frequency(std::iter::repeat(1.25e6).take(8), 10e6, 1.0);
        for (n, s) in out.iter().enumerate() {
            let expected = Complex64::from_polar(1.0, (n + 1) as f64 * PI / 4.0);
            assert!((s - expected).norm() < 1e-9);
        }
    }

    #[test]
    fn test_sweep_is_phase_continuous() {
        // 1 MHz sweep over 100 us at 10 MS/s: max step is 2π * 1.5 MHz / fs
        let sig = generate_sweeping_cw(1e6, 0.0, 10e6, 5000, 1e6, 1e10);
        let max_step = 2.0 * PI * 1.5e6 / 10e6 + 1e-9;
        for pair in sig.windows(2) {
            let step = (pair[1] * pair[0].conj()).arg().abs();
            assert!(step <= max_step, "phase step {} exceeds {}", step, max_step);
        }
    }

    #[test]
    fn test_sweep_constant_envelope() {
        let sig = generate_sweeping_cw(0.0, -6.0, 10e6, 1000, 2e6, 1e9);
        let amp = db_to_amplitude(-6.0);
        assert!(sig.iter().all(|s| (s.norm() - amp).abs() < 1e-12));
    }
}
