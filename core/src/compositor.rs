use crate::cw::generate_cw;
use crate::descriptor::SignalDescriptor;
use crate::envelope::apply_gate;
use crate::error::Result;
use crate::formatter::interleave;
use crate::hopping::generate_frequency_hopping;
use crate::psk::{generate_psk, PskParams};
use crate::signal_set::SignalSet;
use crate::sweep::generate_sweeping_cw;
use crate::tdma::{generate_tdma, TdmaParams};
use crate::validate::{buffer_len, validate_enabled, validate_sample_rate};
use crate::{Complex32, Complex64, DEFAULT_DURATION_S};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One rendered composite, peak-normalized to at most unit magnitude
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBuffer {
    pub sample_rate: f64,
    pub samples: Vec<Complex32>,
}

impl CompositeBuffer {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    pub fn peak_magnitude(&self) -> f32 {
        self.samples.iter().map(|s| s.norm()).fold(0.0f32, f32::max)
    }

    pub fn samples(&self) -> &[Complex32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Complex32> {
        self.samples
    }

    /// `[I0, Q0, I1, Q1, ...]` as the device expects
    pub fn to_interleaved(&self) -> Vec<f32> {
        interleave(&self.samples)
    }
}

/// Renders signal sets into composite buffers at a fixed sample rate
///
/// Rendering is pure: every call validates, synthesizes into a fresh buffer
/// and keeps no state between calls. With a seed the output is reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compositor {
    sample_rate: f64,
    seed: Option<u64>,
}

impl Compositor {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Duration used when the caller does not give one: one period of the
    /// first enabled sweep, or `DEFAULT_DURATION_S`
    pub fn default_duration(signals: &SignalSet) -> f64 {
        signals
            .enabled()
            .find_map(SignalDescriptor::sweep_period_s)
            .unwrap_or(DEFAULT_DURATION_S)
    }

    /// Synthesize every enabled descriptor of `signals` and sum them
    ///
    /// Enabled descriptors are validated first and nothing is generated if
    /// any is invalid. Disabled entries are never inspected. An empty or
    /// fully disabled set yields a zero buffer of the requested length.
    pub fn render(&self, signals: &SignalSet, duration_s: Option<f64>) -> Result<CompositeBuffer> {
        validate_sample_rate(self.sample_rate)?;
        validate_enabled(signals, self.sample_rate)?;

        let duration = duration_s.unwrap_or_else(|| Self::default_duration(signals));
        let num_samples = buffer_len(self.sample_rate, duration)?;

        let seed = match self.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::thread_rng().gen();
                debug!("No seed given, using {}", seed);
                seed
            }
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut composite = vec![Complex64::new(0.0, 0.0); num_samples];
        let mut rendered = 0usize;
        for descriptor in signals.enabled() {
            let mut component = self.synthesize(descriptor, num_samples, &mut rng);
            component.resize(num_samples, Complex64::new(0.0, 0.0));

            if let Some(gate) = descriptor.pulse() {
                apply_gate(&mut component, self.sample_rate, gate);
            }

            for (acc, s) in composite.iter_mut().zip(component) {
                *acc += s;
            }
            rendered += 1;
        }

        let peak = composite.iter().map(|s| s.norm()).fold(0.0f64, f64::max);
        if peak > 0.0 {
            for s in composite.iter_mut() {
                *s /= peak;
            }
        }

        debug!(
            "Rendered {} of {} signals: {} samples ({:.6} s) at {} Hz, pre-normalization peak {:.4}",
            rendered,
            signals.len(),
            num_samples,
            duration,
            self.sample_rate,
            peak
        );

        let samples = composite
            .into_iter()
            .map(|s| Complex32::new(s.re as f32, s.im as f32))
            .collect();

        Ok(CompositeBuffer {
            sample_rate: self.sample_rate,
            samples,
        })
    }

    fn synthesize(
        &self,
        descriptor: &SignalDescriptor,
        num_samples: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Complex64> {
        let fs = self.sample_rate;
        match *descriptor {
            SignalDescriptor::Cw {
                freq_offset_hz,
                gain_dbm,
                ..
            } => generate_cw(freq_offset_hz, gain_dbm, fs, num_samples),
            SignalDescriptor::Psk {
                freq_offset_hz,
                gain_dbm,
                modulation,
                rolloff,
                symbol_rate_hz,
                ..
            } => {
                let params = PskParams {
                    modulation,
                    rolloff,
                    symbol_rate_hz,
                    freq_offset_hz,
                    gain_dbm,
                };
                generate_psk(&params, num_samples, fs, rng).samples
            }
            SignalDescriptor::SweepingCw {
                freq_offset_hz,
                gain_dbm,
                sweep_bandwidth_hz,
                sweep_speed,
                ..
            } => generate_sweeping_cw(
                freq_offset_hz,
                gain_dbm,
                fs,
                num_samples,
                sweep_bandwidth_hz,
                sweep_speed,
            ),
            SignalDescriptor::FrequencyHopping {
                freq_offset_hz,
                gain_dbm,
                hop_bandwidth_hz,
                num_slots,
                hop_rate_hz,
                ..
            } => generate_frequency_hopping(
                freq_offset_hz,
                gain_dbm,
                fs,
                num_samples,
                hop_bandwidth_hz,
                num_slots,
                hop_rate_hz,
                rng,
            ),
            SignalDescriptor::Tdma {
                freq_offset_hz,
                gain_dbm,
                num_slots,
                slot_bandwidth_hz,
                min_pulse_rate_hz,
                max_pulse_rate_hz,
                burst_symbol_rate_hz,
                burst_pulse_width_s,
                ..
            } => {
                let params = TdmaParams {
                    center_hz: freq_offset_hz,
                    gain_dbm,
                    num_slots,
                    slot_bandwidth_hz,
                    min_pulse_rate_hz,
                    max_pulse_rate_hz,
                    burst_symbol_rate_hz,
                    burst_pulse_width_s,
                };
                generate_tdma(&params, fs, num_samples, rng)
            }
        }
    }
}
