//! Signal generator control
//!
//! Instruments report a raw status for every call: zero on success, positive
//! for warnings (the call took effect, possibly adjusted) and negative for
//! errors. [`check_status`] turns that into a `Result`.

use crate::compositor::CompositeBuffer;
use crate::error::{Result, SynthError};
use log::{debug, info, warn};

pub const STATUS_NO_ERROR: i32 = 0;
pub const STATUS_SETTING_CLAMPED: i32 = 2;
pub const STATUS_INVALID_PARAMETER: i32 = -4;
pub const STATUS_INVALID_DEVICE: i32 = -2;

pub const MIN_FREQUENCY_HZ: f64 = 30.0e6;
pub const MAX_FREQUENCY_HZ: f64 = 6.0e9;
pub const MIN_SAMPLE_RATE: f64 = 12.5e3;
pub const MAX_SAMPLE_RATE: f64 = 54.0e6;
pub const MIN_LEVEL_DBM: f64 = -120.0;
pub const MAX_LEVEL_DBM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    Warning(i32),
}

/// Map a raw instrument status for `operation` onto a `Result`
pub fn check_status(operation: &'static str, status: i32) -> Result<DeviceStatus> {
    match status {
        0 => Ok(DeviceStatus::Ok),
        s if s > 0 => {
            warn!("{} returned warning status {}", operation, s);
            Ok(DeviceStatus::Warning(s))
        }
        s => Err(SynthError::Device {
            operation,
            status: s,
        }),
    }
}

/// Operations the synthesizer needs from a vector signal generator
pub trait VsgDevice {
    fn set_frequency(&mut self, hz: f64) -> Result<DeviceStatus>;
    fn set_level(&mut self, dbm: f64) -> Result<DeviceStatus>;
    fn set_sample_rate(&mut self, hz: f64) -> Result<DeviceStatus>;
    /// Loop `complex_count` interleaved samples until aborted
    fn submit_repeating_waveform(&mut self, interleaved: &[f32], complex_count: usize) -> Result<DeviceStatus>;
    fn abort(&mut self) -> Result<DeviceStatus>;
    fn close(&mut self) -> Result<DeviceStatus>;
}

/// In-memory generator with the limits of the real instrument
///
/// Out-of-range settings are clamped and reported with a warning status;
/// non-finite values and malformed waveforms are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDevice {
    frequency_hz: f64,
    level_dbm: f64,
    sample_rate: f64,
    waveform: Option<Vec<f32>>,
    open: bool,
}

impl SimulatedDevice {
    pub fn open() -> Result<Self> {
        info!("Opened simulated signal generator");
        Ok(Self {
            frequency_hz: 1.0e9,
            level_dbm: -30.0,
            sample_rate: 10e6,
            waveform: None,
            open: true,
        })
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn level_dbm(&self) -> f64 {
        self.level_dbm
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Interleaved samples currently being looped
    pub fn waveform(&self) -> Option<&[f32]> {
        self.waveform.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.waveform.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn clamp_setting(
        &self,
        operation: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(f64, i32)> {
        if !self.open {
            check_status(operation, STATUS_INVALID_DEVICE)?;
        }
        if !value.is_finite() {
            check_status(operation, STATUS_INVALID_PARAMETER)?;
        }
        let clamped = value.clamp(min, max);
        let status = if clamped != value {
            STATUS_SETTING_CLAMPED
        } else {
            STATUS_NO_ERROR
        };
        Ok((clamped, status))
    }
}

impl VsgDevice for SimulatedDevice {
    fn set_frequency(&mut self, hz: f64) -> Result<DeviceStatus> {
        let (value, status) =
            self.clamp_setting("set_frequency", hz, MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ)?;
        self.frequency_hz = value;
        check_status("set_frequency", status)
    }

    fn set_level(&mut self, dbm: f64) -> Result<DeviceStatus> {
        let (value, status) = self.clamp_setting("set_level", dbm, MIN_LEVEL_DBM, MAX_LEVEL_DBM)?;
        self.level_dbm = value;
        check_status("set_level", status)
    }

    fn set_sample_rate(&mut self, hz: f64) -> Result<DeviceStatus> {
        let (value, status) =
            self.clamp_setting("set_sample_rate", hz, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)?;
        self.sample_rate = value;
        check_status("set_sample_rate", status)
    }

    fn submit_repeating_waveform(&mut self, interleaved: &[f32], complex_count: usize) -> Result<DeviceStatus> {
        if !self.open {
            return check_status("submit_repeating_waveform", STATUS_INVALID_DEVICE);
        }
        if complex_count == 0 || interleaved.len() != 2 * complex_count {
            return check_status("submit_repeating_waveform", STATUS_INVALID_PARAMETER);
        }
        self.waveform = Some(interleaved.to_vec());
        debug!("Looping {} samples", complex_count);
        Ok(DeviceStatus::Ok)
    }

    fn abort(&mut self) -> Result<DeviceStatus> {
        if !self.open {
            return check_status("abort", STATUS_INVALID_DEVICE);
        }
        self.waveform = None;
        Ok(DeviceStatus::Ok)
    }

    fn close(&mut self) -> Result<DeviceStatus> {
        self.waveform = None;
        self.open = false;
        info!("Closed simulated signal generator");
        Ok(DeviceStatus::Ok)
    }
}

/// Pushes rendered composites to a generator
pub struct Transmitter<D: VsgDevice> {
    device: D,
}

impl<D: VsgDevice> Transmitter<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Tune the RF side: center frequency and output level
    pub fn configure(&mut self, center_frequency_hz: f64, level_dbm: f64) -> Result<Vec<DeviceStatus>> {
        Ok(vec![
            self.device.set_frequency(center_frequency_hz)?,
            self.device.set_level(level_dbm)?,
        ])
    }

    /// Program the buffer's sample rate, then loop the buffer
    pub fn transmit(&mut self, buffer: &CompositeBuffer) -> Result<Vec<DeviceStatus>> {
        let interleaved = buffer.to_interleaved();
        let count = buffer.len();
        if interleaved.len() != 2 * count {
            return Err(SynthError::InvalidIqLength(interleaved.len()));
        }

        let rate_status = self.device.set_sample_rate(buffer.sample_rate)?;
        let wave_status = self.device.submit_repeating_waveform(&interleaved, count)?;
        info!(
            "Transmitting {} samples ({:.3} ms) at {} Hz",
            count,
            buffer.duration_s() * 1e3,
            buffer.sample_rate
        );
        Ok(vec![rate_status, wave_status])
    }

    pub fn abort(&mut self) -> Result<DeviceStatus> {
        self.device.abort()
    }
}
