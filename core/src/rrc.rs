//! Root raised cosine (RRC) pulse shaping filter design
//!
//! The kernel is evaluated on a symmetric grid of `2 * (num_taps / 2) + 1`
//! points spaced `1/sps` symbol periods apart and normalized to unit energy,
//! so filtering preserves symbol energy.

use std::f64::consts::PI;

/// Distance in symbol periods below which a grid point counts as a singularity
const SINGULARITY_EPSILON: f64 = 1e-9;

/// A designed RRC kernel
#[derive(Debug, Clone)]
pub struct RootRaisedCosine {
    coeffs: Vec<f64>,
    rolloff: f64,
    samples_per_symbol: usize,
}

impl RootRaisedCosine {
    /// Design a kernel spanning `taps_per_sps * sps` taps
    pub fn new(samples_per_symbol: usize, rolloff: f64, taps_per_sps: usize) -> Self {
        let num_taps = taps_per_sps * samples_per_symbol;
        Self {
            coeffs: rrc_taps(num_taps, rolloff, samples_per_symbol),
            rolloff,
            samples_per_symbol,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn rolloff(&self) -> f64 {
        self.rolloff
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    /// Index of the center tap
    pub fn delay(&self) -> usize {
        self.coeffs.len() / 2
    }
}

/// RRC impulse response at `t` symbol periods, with the two removable singularities resolved
pub fn rrc_impulse(t: f64, beta: f64) -> f64 {
    if t.abs() < SINGULARITY_EPSILON {
        // t = 0
        return 1.0 - beta + 4.0 * beta / PI;
    }

    if beta > 0.0 && (t.abs() - 1.0 / (4.0 * beta)).abs() < SINGULARITY_EPSILON {
        // t = ±1/(4β)
        let arg = PI / (4.0 * beta);
        return (beta / 2f64.sqrt())
            * ((1.0 + 2.0 / PI) * arg.sin() + (1.0 - 2.0 / PI) * arg.cos());
    }

    let num = (PI * t * (1.0 - beta)).sin() + 4.0 * beta * t * (PI * t * (1.0 + beta)).cos();
    let den = PI * t * (1.0 - (4.0 * beta * t).powi(2));
    num / den
}

/// Design a unit-energy RRC kernel
///
/// # Arguments
/// * `num_taps` - Nominal length; the grid runs from `-num_taps/2` to `num_taps/2` inclusive
/// * `beta` - Roll-off factor in (0, 1)
/// * `sps` - Samples per symbol
pub fn rrc_taps(num_taps: usize, beta: f64, sps: usize) -> Vec<f64> {
    let half = (num_taps / 2) as i64;
    let sps = sps.max(1) as f64;

    let mut h: Vec<f64> = (-half..=half)
        .map(|n| rrc_impulse(n as f64 / sps, beta))
        .collect();

    let energy: f64 = h.iter().map(|x| x * x).sum();
    if energy > 0.0 {
        let norm = energy.sqrt();
        for c in &mut h {
            *c /= norm;
        }
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RRC_TAPS_PER_SPS, ROLLOFF_MENU};

    #[test]
    fn test_rrc_unit_energy() {
        for &beta in ROLLOFF_MENU.iter() {
            for sps in [8usize, 10, 16, 25] {
                let h = rrc_taps(RRC_TAPS_PER_SPS * sps, beta, sps);
                let energy: f64 = h.iter().map(|x| x * x).sum();
                assert!(
                    (energy - 1.0).abs() < 1e-12,
                    "energy {} for beta={} sps={}",
                    energy,
                    beta,
                    sps
                );
            }
        }
    }

    #[test]
    fn test_rrc_length_is_odd() {
        assert_eq!(rrc_taps(410, 0.35, 10).len(), 411);
        assert_eq!(rrc_taps(11 * 9, 0.35, 9).len(), 99);
        assert_eq!(RootRaisedCosine::new(8, 0.25, RRC_TAPS_PER_SPS).len(), 329);
    }

    #[test]
    fn test_rrc_symmetry_and_peak() {
        let rrc = RootRaisedCosine::new(10, 0.35, RRC_TAPS_PER_SPS);
        let coeffs = rrc.coefficients();
        let len = coeffs.len();
        for i in 0..len / 2 {
            assert!((coeffs[i] - coeffs[len - 1 - i]).abs() < 1e-12);
        }
        let center = coeffs[rrc.delay()];
        assert!(coeffs.iter().all(|&c| c <= center));
    }

    #[test]
    fn test_singularities_are_finite() {
        // beta = 0.25 puts the singularity at t = ±1 symbol, which lands on the grid for any sps
        let h = rrc_taps(RRC_TAPS_PER_SPS * 8, 0.25, 8);
        assert!(h.iter().all(|x| x.is_finite()));

        // beta = 0.2 gives t = ±1.25, on the grid for sps = 8 (n = ±10)
        let h = rrc_taps(RRC_TAPS_PER_SPS * 8, 0.2, 8);
        assert!(h.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_singularity_limit_matches_neighbourhood() {
        let beta = 0.25;
        let t0 = 1.0 / (4.0 * beta);
        let at = rrc_impulse(t0, beta);
        let near = rrc_impulse(t0 + 1e-6, beta);
        assert!((at - near).abs() < 1e-4, "limit {} vs neighbour {}", at, near);
    }

    #[test]
    fn test_center_value() {
        let beta = 0.35;
        assert!((rrc_impulse(0.0, beta) - (1.0 - beta + 4.0 * beta / PI)).abs() < 1e-15);
    }
}
