//! M-ary PSK burst generation with RRC pulse shaping
//!
//! Pipeline: random symbol indices → constellation points → zero-stuffed
//! impulse train → RRC filter ("same" length) → peak normalization →
//! carrier offset → gain.

use crate::cw::mix;
use crate::descriptor::PskModulation;
use crate::rrc::RootRaisedCosine;
use crate::units::db_to_amplitude;
use crate::{Complex64, MIN_SAMPLES_PER_SYMBOL, RRC_TAPS_PER_SPS};
use log::debug;
use rand::Rng;
use std::f64::consts::PI;

/// Parameters of one PSK carrier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PskParams {
    pub modulation: PskModulation,
    pub rolloff: f64,
    pub symbol_rate_hz: f64,
    pub freq_offset_hz: f64,
    pub gain_dbm: f64,
}

/// A rendered PSK burst together with the symbols it carries
#[derive(Debug, Clone)]
pub struct PskBurst {
    pub samples: Vec<Complex64>,
    /// Constellation index of each symbol; symbol `k` peaks at sample `k * samples_per_symbol`
    pub symbols: Vec<usize>,
    pub samples_per_symbol: usize,
}

/// Samples per symbol for a symbol rate, floored to `MIN_SAMPLES_PER_SYMBOL`
///
/// Requests below the floor are overridden rather than rejected, which bounds
/// the image energy left by zero-stuffing.
pub fn samples_per_symbol(sample_rate: f64, symbol_rate_hz: f64) -> usize {
    let requested = (sample_rate / symbol_rate_hz).floor();
    let requested = if requested.is_finite() && requested > 0.0 {
        requested as usize
    } else {
        0
    };

    if requested < MIN_SAMPLES_PER_SYMBOL {
        debug!(
            "sps {} below minimum for symbol rate {} Hz, using {}",
            requested, symbol_rate_hz, MIN_SAMPLES_PER_SYMBOL
        );
        MIN_SAMPLES_PER_SYMBOL
    } else {
        requested
    }
}

/// Map a constellation index to its complex symbol
///
/// BPSK uses {+1, -1}; QPSK and 8PSK use `exp(j(π/M + 2πk/M))`.
pub fn constellation_point(modulation: PskModulation, index: usize) -> Complex64 {
    let m = modulation.order();
    match modulation {
        PskModulation::Bpsk => {
            if index % 2 == 0 {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(-1.0, 0.0)
            }
        }
        _ => {
            let phase = PI / m as f64 + 2.0 * PI * (index % m) as f64 / m as f64;
            Complex64::from_polar(1.0, phase)
        }
    }
}

/// Filter a zero-stuffed symbol train with `taps`, keeping the input length
///
/// Equivalent to upsampling by `sps` with zeros and a centred ("same")
/// convolution, but only visits the nonzero impulses.
pub fn pulse_shape(symbols: &[Complex64], sps: usize, taps: &[f64]) -> Vec<Complex64> {
    let len = symbols.len() * sps;
    let mut shaped = vec![Complex64::new(0.0, 0.0); len];
    if taps.is_empty() {
        return shaped;
    }

    let center = (taps.len() / 2) as isize;
    for (k, &symbol) in symbols.iter().enumerate() {
        let start = (k * sps) as isize - center;
        for (j, &tap) in taps.iter().enumerate() {
            let n = start + j as isize;
            if n < 0 {
                continue;
            }
            let n = n as usize;
            if n >= len {
                break;
            }
            shaped[n] += symbol * tap;
        }
    }

    shaped
}

/// Scale so the largest magnitude is exactly 1 (no-op for an all-zero signal)
pub fn normalize_peak(samples: &mut [Complex64]) {
    let peak = samples.iter().map(|s| s.norm()).fold(0.0f64, f64::max);
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// Render a random PSK burst filling as many whole symbols as fit in `num_samples`
pub fn generate_psk<R: Rng + ?Sized>(
    params: &PskParams,
    num_samples: usize,
    sample_rate: f64,
    rng: &mut R,
) -> PskBurst {
    let sps = samples_per_symbol(sample_rate, params.symbol_rate_hz);
    let num_symbols = num_samples / sps;
    if num_symbols == 0 {
        debug!(
            "{} burst: {} samples hold no symbol at sps={}",
            params.modulation, num_samples, sps
        );
        return PskBurst {
            samples: Vec::new(),
            symbols: Vec::new(),
            samples_per_symbol: sps,
        };
    }
    let order = params.modulation.order();

    let indices: Vec<usize> = (0..num_symbols).map(|_| rng.gen_range(0..order)).collect();
    let points: Vec<Complex64> = indices
        .iter()
        .map(|&k| constellation_point(params.modulation, k))
        .collect();

    let rrc = RootRaisedCosine::new(sps, params.rolloff, RRC_TAPS_PER_SPS);
    let mut samples = pulse_shape(&points, sps, rrc.coefficients());

    normalize_peak(&mut samples);
    mix(&mut samples, params.freq_offset_hz, sample_rate);

    let amplitude = db_to_amplitude(params.gain_dbm);
    for s in samples.iter_mut() {
        *s *= amplitude;
    }

    debug!(
        "{} burst: {} symbols, sps={}, {} taps",
        params.modulation,
        num_symbols,
        sps,
        rrc.len()
    );

    PskBurst {
        samples,
        symbols: indices,
        samples_per_symbol: sps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(modulation: PskModulation) -> PskParams {
        PskParams {
            modulation,
            rolloff: 0.35,
            symbol_rate_hz: 1e6,
            freq_offset_hz: 0.0,
            gain_dbm: 0.0,
        }
    }

    #[test]
    fn test_samples_per_symbol_floor() {
        assert_eq!(samples_per_symbol(10e6, 1e6), 10);
        assert_eq!(samples_per_symbol(10e6, 3e6), MIN_SAMPLES_PER_SYMBOL);
        assert_eq!(samples_per_symbol(10e6, 20e6), MIN_SAMPLES_PER_SYMBOL);
        assert_eq!(samples_per_symbol(10e6, 1e5), 100);
    }

    #[test]
    fn test_constellation_points() {
        assert_eq!(constellation_point(PskModulation::Bpsk, 0), Complex64::new(1.0, 0.0));
        assert_eq!(constellation_point(PskModulation::Bpsk, 1), Complex64::new(-1.0, 0.0));

        for k in 0..4 {
            let p = constellation_point(PskModulation::Qpsk, k);
            let expected = PI / 4.0 + k as f64 * PI / 2.0;
            assert!((p.norm() - 1.0).abs() < 1e-12);
            assert!((p - Complex64::from_polar(1.0, expected)).norm() < 1e-12);
        }

        let p = constellation_point(PskModulation::Psk8, 0);
        assert!((p.arg() - PI / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_pulse_shape_centres_symbols() {
        // A single impulse reproduces the (truncated) kernel centred on sample 0
        let taps = vec![0.25, 0.5, 1.0, 0.5, 0.25];
        let shaped = pulse_shape(&[Complex64::new(1.0, 0.0)], 4, &taps);
        assert_eq!(shaped.len(), 4);
        assert_eq!(shaped[0].re, 1.0);
        assert_eq!(shaped[1].re, 0.5);
        assert_eq!(shaped[2].re, 0.25);
        assert_eq!(shaped[3].re, 0.0);
    }

    #[test]
    fn test_peak_is_unity_before_gain() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for modulation in [PskModulation::Bpsk, PskModulation::Qpsk, PskModulation::Psk8] {
            let burst = generate_psk(&params(modulation), 5000, 10e6, &mut rng);
            let peak = burst.samples.iter().map(|s| s.norm()).fold(0.0, f64::max);
            assert!((peak - 1.0).abs() < 1e-12, "{} peak {}", modulation, peak);
        }
    }

    #[test]
    fn test_gain_scales_peak() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut p = params(PskModulation::Qpsk);
        p.gain_dbm = -20.0;
        p.freq_offset_hz = 2e6;
        let burst = generate_psk(&p, 4000, 10e6, &mut rng);
        let peak = burst.samples.iter().map(|s| s.norm()).fold(0.0, f64::max);
        assert!((peak - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_burst_length_is_whole_symbols() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let burst = generate_psk(&params(PskModulation::Bpsk), 1005, 10e6, &mut rng);
        assert_eq!(burst.samples_per_symbol, 10);
        assert_eq!(burst.symbols.len(), 100);
        assert_eq!(burst.samples.len(), 1000);
        assert!(burst.symbols.iter().all(|&k| k < 2));
    }

    #[test]
    fn test_short_buffer_yields_empty_burst() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let burst = generate_psk(&params(PskModulation::Qpsk), 5, 10e6, &mut rng);
        assert!(burst.samples.is_empty());
        assert!(burst.symbols.is_empty());
    }

    #[test]
    fn test_short_buffer_skips_filter_design() {
        // 1e-3 Hz at 10 MHz would need a kernel of billions of taps
        let mut p = params(PskModulation::Qpsk);
        p.symbol_rate_hz = 1e-3;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let burst = generate_psk(&p, 1000, 10e6, &mut rng);
        assert!(burst.samples.is_empty());
        assert_eq!(burst.samples_per_symbol, 10_000_000_000);
    }

    #[test]
    fn test_same_seed_same_burst() {
        let p = params(PskModulation::Psk8);
        let a = generate_psk(&p, 2000, 10e6, &mut ChaCha8Rng::seed_from_u64(99));
        let b = generate_psk(&p, 2000, 10e6, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a.symbols, b.symbols);
        assert_eq!(a.samples, b.samples);
    }
}
