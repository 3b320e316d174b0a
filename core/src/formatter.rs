use crate::error::{Result, SynthError};
use crate::Complex32;

/// Flatten complex samples into `[I0, Q0, I1, Q1, ...]`
pub fn interleave(samples: &[Complex32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        out.push(s.re);
        out.push(s.im);
    }
    out
}

/// Inverse of [`interleave`]; the input must hold whole I/Q pairs
pub fn deinterleave(values: &[f32]) -> Result<Vec<Complex32>> {
    if values.len() % 2 != 0 {
        return Err(SynthError::InvalidIqLength(values.len()));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Complex32::new(pair[0], pair[1]))
        .collect())
}
