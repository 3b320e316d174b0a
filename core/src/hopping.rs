use crate::sweep::integrate_frequency;
use crate::units::db_to_amplitude;
use crate::Complex64;
use rand::Rng;

/// Center frequencies of `num_slots` equal sub-bands covering `center ± bw/2`
pub fn slot_frequencies(center_hz: f64, hop_bandwidth_hz: f64, num_slots: usize) -> Vec<f64> {
    let slot_width = hop_bandwidth_hz / num_slots as f64;
    (0..num_slots)
        .map(|i| center_hz - hop_bandwidth_hz / 2.0 + slot_width / 2.0 + i as f64 * slot_width)
        .collect()
}

/// Active slot for every sample
///
/// A slot is drawn for the first dwell, then a new one each time the sample
/// clock passes the next multiple of `1 / hop_rate`.
pub fn hop_schedule<R: Rng + ?Sized>(
    num_samples: usize,
    sample_rate: f64,
    num_slots: usize,
    hop_rate_hz: f64,
    rng: &mut R,
) -> Vec<usize> {
    let hop_period = 1.0 / hop_rate_hz;
    let mut schedule = Vec::with_capacity(num_samples);
    let mut current = rng.gen_range(0..num_slots);
    let mut next_hop_time = hop_period;

    for i in 0..num_samples {
        if i as f64 / sample_rate >= next_hop_time {
            current = rng.gen_range(0..num_slots);
            next_hop_time += hop_period;
        }
        schedule.push(current);
    }

    schedule
}

/// Continuous-phase frequency-hopped CW
pub fn generate_frequency_hopping<R: Rng + ?Sized>(
    center_hz: f64,
    gain_dbm: f64,
    sample_rate: f64,
    num_samples: usize,
    hop_bandwidth_hz: f64,
    num_slots: usize,
    hop_rate_hz: f64,
    rng: &mut R,
) -> Vec<Complex64> {
    let slots = slot_frequencies(center_hz, hop_bandwidth_hz, num_slots);
    let schedule = hop_schedule(num_samples, sample_rate, num_slots, hop_rate_hz, rng);
    let track = schedule.into_iter().map(|slot| slots[slot]);
    integrate_frequency(track, sample_rate, db_to_amplitude(gain_dbm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    #[test]
    fn test_slot_frequencies_cover_band() {
        let slots = slot_frequencies(0.0, 1e6, 4);
        assert_eq!(slots, vec![-375e3, -125e3, 125e3, 375e3]);

        let slots = slot_frequencies(2e6, 1e6, 2);
        assert_eq!(slots, vec![1.75e6, 2.25e6]);
    }

    #[test]
    fn test_schedule_is_piecewise_constant() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // 1 kHz hops at 1 MS/s: dwell of 1000 samples
        let schedule = hop_schedule(10_000, 1e6, 8, 1e3, &mut rng);
        assert_eq!(schedule.len(), 10_000);
        for dwell in schedule.chunks(1000) {
            assert!(dwell.iter().all(|&s| s == dwell[0]));
            assert!(dwell[0] < 8);
        }
    }

    #[test]
    fn test_hopping_phase_continuous() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let sig = generate_frequency_hopping(0.0, 0.0, 10e6, 20_000, 2e6, 8, 5e3, &mut rng);
        // Largest slot frequency is 875 kHz
        let max_step = 2.0 * PI * 0.875e6 / 10e6 + 1e-9;
        for pair in sig.windows(2) {
            let step = (pair[1] * pair[0].conj()).arg().abs();
            assert!(step <= max_step);
        }
        assert!(sig.iter().all(|s| (s.norm() - 1.0).abs() < 1e-12));
    }
}
