//! Command-line and HTTP front ends for the composite I/Q synthesizer

pub mod server;

use iqsynth_core::units::parse_frequency;
use iqsynth_core::SignalSet;
use std::path::Path;

/// Load a signal set from a JSON file holding an array of descriptors
pub fn load_signal_set(path: &Path) -> Result<SignalSet, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let signals: SignalSet = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid signal set in {}: {}", path.display(), e))?;
    Ok(signals)
}

/// clap value parser for frequencies and rates with optional unit suffix
pub fn parse_hz(input: &str) -> Result<f64, String> {
    parse_frequency(input).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hz() {
        assert_eq!(parse_hz("10MHz").unwrap(), 10e6);
        assert_eq!(parse_hz("1.23 GHz").unwrap(), 1.23e9);
        assert!(parse_hz("fast").is_err());
    }

    #[test]
    fn test_load_signal_set() {
        let path = std::env::temp_dir().join(format!("iqsynth_cli_set_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"type": "cw", "freq_offset_hz": 1000000.0, "gain_dbm": -10.0},
                {"type": "sweeping_cw", "freq_offset_hz": 0.0, "gain_dbm": -6.0,
                 "sweep_bandwidth_hz": 2000000.0, "sweep_speed": 1e9, "enabled": false}]"#,
        )
        .unwrap();
        let set = load_signal_set(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(set.len(), 2);
        assert!(!set.get(1).unwrap().is_enabled());
    }
}
