use crate::error::{Result, SynthError};

/// Convert a dBm gain into a linear amplitude factor
pub fn db_to_amplitude(gain_dbm: f64) -> f64 {
    10f64.powf(gain_dbm / 20.0)
}

/// Parse a frequency with an optional unit suffix
///
/// Accepts `GHz`, `MHz`, `kHz` and `Hz` suffixes (case-insensitive) as well as
/// bare numbers in scientific notation, e.g. `1.23GHz`, `1230 MHz`, `5e6`.
pub fn parse_frequency(input: &str) -> Result<f64> {
    let s = input.trim().to_ascii_lowercase();

    let (number, multiplier) = if let Some(rest) = s.strip_suffix("ghz") {
        (rest, 1e9)
    } else if let Some(rest) = s.strip_suffix("mhz") {
        (rest, 1e6)
    } else if let Some(rest) = s.strip_suffix("khz") {
        (rest, 1e3)
    } else if let Some(rest) = s.strip_suffix("hz") {
        (rest, 1.0)
    } else {
        (s.as_str(), 1.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SynthError::InvalidFrequency(input.to_string()))?;

    if !value.is_finite() {
        return Err(SynthError::InvalidFrequency(input.to_string()));
    }

    Ok(value * multiplier)
}

/// Format a frequency in MHz the way instrument menus show it
pub fn format_frequency(hz: f64) -> String {
    format!("{:.6} MHz", hz / 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frequency_suffixes() {
        assert_eq!(parse_frequency("1.23GHz").unwrap(), 1.23e9);
        assert_eq!(parse_frequency("1230MHz").unwrap(), 1230e6);
        assert_eq!(parse_frequency("10 kHz").unwrap(), 10e3);
        assert_eq!(parse_frequency("1230000000Hz").unwrap(), 1.23e9);
        assert_eq!(parse_frequency("  5e6 ").unwrap(), 5e6);
    }

    #[test]
    fn test_parse_frequency_rejects_garbage() {
        assert!(matches!(
            parse_frequency("fast"),
            Err(SynthError::InvalidFrequency(_))
        ));
        assert!(parse_frequency("MHz").is_err());
        assert!(parse_frequency("inf").is_err());
    }

    #[test]
    fn test_db_to_amplitude() {
        assert!((db_to_amplitude(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_amplitude(-20.0) - 0.1).abs() < 1e-12);
        assert!((db_to_amplitude(-10.0) - 0.316_227_766).abs() < 1e-9);
    }

    #[test]
    fn test_format_frequency() {
        assert_eq!(format_frequency(1.23e9), "1230.000000 MHz");
    }
}
