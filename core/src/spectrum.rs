//! Spectrum views of a composite for display and quick sanity checks

use crate::Complex32;
use rustfft::FftPlanner;
use serde::Serialize;
use std::f64::consts::PI;

/// Floor added before taking logarithms so silent bins stay finite
const POWER_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hann,
}

impl Window {
    pub fn coefficients(&self, len: usize) -> Vec<f32> {
        match self {
            Window::Rectangular => vec![1.0; len],
            Window::Hann => {
                if len == 1 {
                    return vec![1.0];
                }
                (0..len)
                    .map(|n| (0.5 - 0.5 * (2.0 * PI * n as f64 / (len - 1) as f64).cos()) as f32)
                    .collect()
            }
        }
    }
}

/// Power per frequency bin, ordered from `-fs/2` to just below `+fs/2`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    pub frequencies_hz: Vec<f64>,
    pub power_db: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }

    /// Frequency and power of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.power_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &p)| (self.frequencies_hz[i], p))
    }

    /// Reduce to at most `max_points` bins, keeping the strongest bin of each group
    pub fn decimate(&self, max_points: usize) -> Spectrum {
        if max_points == 0 || self.len() <= max_points {
            return self.clone();
        }

        let group = self.len().div_ceil(max_points);
        let mut frequencies_hz = Vec::with_capacity(max_points);
        let mut power_db = Vec::with_capacity(max_points);
        for (g, chunk) in self.power_db.chunks(group).enumerate() {
            let (offset, &power) = chunk
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .unwrap_or((0, &f64::NEG_INFINITY));
            frequencies_hz.push(self.frequencies_hz[g * group + offset]);
            power_db.push(power);
        }

        Spectrum {
            frequencies_hz,
            power_db,
        }
    }
}

pub struct SpectrumAnalyzer {
    fft_planner: FftPlanner<f32>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            fft_planner: FftPlanner::new(),
        }
    }

    /// Windowed, fft-shifted power spectrum in dB
    ///
    /// Power is scaled by the window's coherent gain, so a unit-magnitude tone
    /// centred on a bin reads 0 dB regardless of length or window.
    pub fn power_spectrum(&mut self, samples: &[Complex32], sample_rate: f64, window: Window) -> Spectrum {
        let n = samples.len();
        if n == 0 {
            return Spectrum {
                frequencies_hz: Vec::new(),
                power_db: Vec::new(),
            };
        }

        let coeffs = window.coefficients(n);
        let gain: f64 = coeffs.iter().map(|&w| w as f64).sum();
        let mut buffer: Vec<Complex32> = samples
            .iter()
            .zip(&coeffs)
            .map(|(s, &w)| *s * w)
            .collect();

        let fft = self.fft_planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let half = n / 2;
        let shift = n.div_ceil(2);
        let mut frequencies_hz = Vec::with_capacity(n);
        let mut power_db = Vec::with_capacity(n);
        for i in 0..n {
            let bin = buffer[(i + shift) % n];
            let magnitude = bin.norm() as f64 / gain;
            frequencies_hz.push((i as f64 - half as f64) * sample_rate / n as f64);
            power_db.push(20.0 * (magnitude + POWER_FLOOR).log10());
        }

        Spectrum {
            frequencies_hz,
            power_db,
        }
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot convenience around [`SpectrumAnalyzer::power_spectrum`]
pub fn power_spectrum(samples: &[Complex32], sample_rate: f64, window: Window) -> Spectrum {
    SpectrumAnalyzer::new().power_spectrum(samples, sample_rate, window)
}

/// Quadrature quality figures of a baseband buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurityReport {
    /// Positive-frequency magnitude over negative-frequency magnitude, in dB
    pub image_rejection_db: f64,
    /// Magnitude of the mean sample
    pub dc_magnitude: f64,
    /// Mean of I·Q; near zero when I and Q are uncorrelated
    pub orthogonality: f64,
}

pub fn purity_check(samples: &[Complex32]) -> PurityReport {
    let n = samples.len();
    if n == 0 {
        return PurityReport {
            image_rejection_db: 0.0,
            dc_magnitude: 0.0,
            orthogonality: 0.0,
        };
    }

    let mut buffer = samples.to_vec();
    FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut buffer);

    // Bins 1..=(n-1)/2 are positive, the mirrored ones above n/2 negative; DC and Nyquist excluded
    let (mut pos, mut neg) = (0.0f64, 0.0f64);
    for k in 1..=(n - 1) / 2 {
        pos += buffer[k].norm() as f64;
        neg += buffer[n - k].norm() as f64;
    }
    let image_rejection_db = 10.0 * ((pos + POWER_FLOOR) / (neg + POWER_FLOOR)).log10();

    let (sum_i, sum_q, sum_iq) = samples.iter().fold((0.0f64, 0.0f64, 0.0f64), |acc, s| {
        (
            acc.0 + s.re as f64,
            acc.1 + s.im as f64,
            acc.2 + s.re as f64 * s.im as f64,
        )
    });
    let count = n as f64;

    PurityReport {
        image_rejection_db,
        dc_magnitude: (sum_i / count).hypot(sum_q / count),
        orthogonality: sum_iq / count,
    }
}
