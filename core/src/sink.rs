//! Framing for streaming composites to an external spectrum display
//!
//! Each frame is `f64 LE sample rate`, `u32 LE count`, then `count` pairs of
//! `f32 LE` I and Q. A frame with sample rate 0 and count 0 asks the display
//! to shut down.

use crate::error::{Result, SynthError};
use crate::{Complex32, MAX_BUFFER_SAMPLES};
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumFrame {
    Samples {
        sample_rate: f64,
        samples: Vec<Complex32>,
    },
    Shutdown,
}

impl SpectrumFrame {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SpectrumFrame::Samples {
                sample_rate,
                samples,
            } => {
                let count = u32::try_from(samples.len()).map_err(|_| SynthError::BufferTooLarge {
                    requested: samples.len(),
                    limit: MAX_BUFFER_SAMPLES,
                })?;
                let mut frame = Vec::with_capacity(12 + samples.len() * 8);
                frame.extend_from_slice(&sample_rate.to_le_bytes());
                frame.extend_from_slice(&count.to_le_bytes());
                for s in samples {
                    frame.extend_from_slice(&s.re.to_le_bytes());
                    frame.extend_from_slice(&s.im.to_le_bytes());
                }
                writer.write_all(&frame)?;
            }
            SpectrumFrame::Shutdown => {
                writer.write_all(&0.0f64.to_le_bytes())?;
                writer.write_all(&0u32.to_le_bytes())?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;

        let mut rate_bytes = [0u8; 8];
        rate_bytes.copy_from_slice(&header[..8]);
        let sample_rate = f64::from_le_bytes(rate_bytes);
        let count = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;

        if sample_rate == 0.0 && count == 0 {
            return Ok(SpectrumFrame::Shutdown);
        }
        if count > MAX_BUFFER_SAMPLES {
            return Err(SynthError::BufferTooLarge {
                requested: count,
                limit: MAX_BUFFER_SAMPLES,
            });
        }

        let mut payload = vec![0u8; count * 8];
        reader.read_exact(&mut payload)?;
        let samples = payload
            .chunks_exact(8)
            .map(|b| {
                Complex32::new(
                    f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
                    f32::from_le_bytes([b[4], b[5], b[6], b[7]]),
                )
            })
            .collect();

        Ok(SpectrumFrame::Samples {
            sample_rate,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_shutdown_sentinel_bytes() {
        let mut buf = Vec::new();
        SpectrumFrame::Shutdown.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![0u8; 12]);
        assert_eq!(
            SpectrumFrame::read_from(&mut Cursor::new(buf)).unwrap(),
            SpectrumFrame::Shutdown
        );
    }

    #[test]
    fn test_frames_in_sequence() {
        let first = SpectrumFrame::Samples {
            sample_rate: 10e6,
            samples: vec![Complex32::new(1.0, 0.0), Complex32::new(0.0, -1.0)],
        };
        let mut buf = Vec::new();
        first.write_to(&mut buf).unwrap();
        SpectrumFrame::Shutdown.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 12 + 16 + 12);

        let mut cursor = Cursor::new(buf);
        assert_eq!(SpectrumFrame::read_from(&mut cursor).unwrap(), first);
        assert_eq!(SpectrumFrame::read_from(&mut cursor).unwrap(), SpectrumFrame::Shutdown);
    }

    #[test]
    fn test_truncated_frame_is_io_error() {
        let frame = SpectrumFrame::Samples {
            sample_rate: 1e6,
            samples: vec![Complex32::new(0.5, 0.5); 4],
        };
        let mut buf = Vec::new();
        frame.write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            SpectrumFrame::read_from(&mut Cursor::new(buf)),
            Err(SynthError::Io(_))
        ));
    }

    #[test]
    fn test_oversized_count_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1e6f64.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            SpectrumFrame::read_from(&mut Cursor::new(buf)),
            Err(SynthError::BufferTooLarge { .. })
        ));
    }
}
