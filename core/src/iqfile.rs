//! Raw interleaved IQ files: little-endian f32 pairs with no header

use crate::error::{Result, SynthError};
use crate::formatter::deinterleave;
use crate::Complex32;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub fn write_iq<W: Write>(writer: &mut W, samples: &[Complex32]) -> Result<()> {
    for s in samples {
        writer.write_all(&s.re.to_le_bytes())?;
        writer.write_all(&s.im.to_le_bytes())?;
    }
    Ok(())
}

/// Read every sample until EOF; a trailing partial sample is an error
pub fn read_iq<R: Read>(reader: &mut R) -> Result<Vec<Complex32>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() % 8 != 0 {
        return Err(SynthError::InvalidIqLength(bytes.len() / 4));
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    deinterleave(&values)
}

pub fn save_iq<P: AsRef<Path>>(path: P, samples: &[Complex32]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_iq(&mut writer, samples)?;
    writer.flush()?;
    Ok(())
}

pub fn load_iq<P: AsRef<Path>>(path: P) -> Result<Vec<Complex32>> {
    let mut reader = BufReader::new(File::open(path)?);
    read_iq(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_layout_is_little_endian_pairs() {
        let mut buf = Vec::new();
        write_iq(&mut buf, &[Complex32::new(1.0, -2.0)]).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[..4], &1.0f32.to_le_bytes());
        assert_eq!(&buf[4..], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn test_read_back() {
        let samples = vec![Complex32::new(0.25, 0.5), Complex32::new(-0.75, 1.0)];
        let mut buf = Vec::new();
        write_iq(&mut buf, &samples).unwrap();
        assert_eq!(read_iq(&mut Cursor::new(buf)).unwrap(), samples);
    }

    #[test]
    fn test_partial_sample_rejected() {
        let mut bytes = Vec::new();
        write_iq(&mut bytes, &[Complex32::new(1.0, 1.0)]).unwrap();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        assert!(matches!(
            read_iq(&mut Cursor::new(bytes)),
            Err(SynthError::InvalidIqLength(3))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("iqsynth_iqfile_{}.iq", std::process::id()));
        let samples = vec![Complex32::new(0.1, -0.1); 32];
        save_iq(&path, &samples).unwrap();
        let loaded = load_iq(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, samples);
    }
}
