//! Shared synthesizer state
//!
//! A [`Session`] owns the signal set and generator settings behind a
//! reader-writer lock. Rendering clones a [`Snapshot`] under the read lock and
//! synthesizes outside it, so a slow render never blocks edits and an edit
//! never tears a render in progress.

use crate::compositor::{CompositeBuffer, Compositor};
use crate::descriptor::SignalDescriptor;
use crate::error::{Result, SynthError};
use crate::signal_set::SignalSet;
use crate::validate::{validate_descriptor, validate_sample_rate, validate_signal_set};
use crate::{DEFAULT_CENTER_FREQUENCY_HZ, DEFAULT_LEVEL_DBM, DEFAULT_SAMPLE_RATE};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Point-in-time copy of the session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub center_frequency_hz: f64,
    pub level_dbm: f64,
    pub sample_rate: f64,
    pub signals: SignalSet,
}

impl Snapshot {
    pub fn compositor(&self, seed: Option<u64>) -> Compositor {
        let compositor = Compositor::new(self.sample_rate);
        match seed {
            Some(seed) => compositor.with_seed(seed),
            None => compositor,
        }
    }

    pub fn render(&self, seed: Option<u64>, duration_s: Option<f64>) -> Result<CompositeBuffer> {
        self.compositor(seed).render(&self.signals, duration_s)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            center_frequency_hz: DEFAULT_CENTER_FREQUENCY_HZ,
            level_dbm: DEFAULT_LEVEL_DBM,
            sample_rate: DEFAULT_SAMPLE_RATE,
            signals: SignalSet::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<Snapshot>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, validating its signals against its sample rate
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        validate_signal_set(&snapshot.signals, snapshot.sample_rate)?;
        Ok(Self {
            state: RwLock::new(snapshot),
        })
    }

    // The state is plain data, so a panic while holding the lock cannot leave
    // it half-updated in a way later readers care about.
    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    pub fn signals(&self) -> SignalSet {
        self.read().signals.clone()
    }

    pub fn sample_rate(&self) -> f64 {
        self.read().sample_rate
    }

    /// Append a descriptor after validating it; returns its index
    pub fn add_signal(&self, descriptor: SignalDescriptor) -> Result<usize> {
        let mut state = self.write();
        validate_descriptor(&descriptor, state.sample_rate)?;
        debug!("Adding signal {}", descriptor);
        state.signals.push(descriptor);
        Ok(state.signals.len() - 1)
    }

    /// Replace the descriptor at `index`, returning the previous one
    pub fn edit_signal(&self, index: usize, descriptor: SignalDescriptor) -> Result<SignalDescriptor> {
        let mut state = self.write();
        validate_descriptor(&descriptor, state.sample_rate)?;
        state.signals.replace(index, descriptor)
    }

    pub fn remove_signal(&self, index: usize) -> Result<SignalDescriptor> {
        self.write().signals.remove(index)
    }

    /// Flip a signal on or off, returning the new state
    pub fn toggle_signal(&self, index: usize) -> Result<bool> {
        self.write().signals.toggle(index)
    }

    /// Swap in a whole signal set, validated against the current sample rate
    pub fn replace_signals(&self, signals: SignalSet) -> Result<()> {
        let mut state = self.write();
        validate_signal_set(&signals, state.sample_rate)?;
        state.signals = signals;
        Ok(())
    }

    pub fn clear_signals(&self) {
        self.write().signals.clear();
    }

    /// Change the sample rate
    ///
    /// Existing descriptors are kept even if they no longer fit the new
    /// Nyquist band; they are reported here and rejected at render time.
    pub fn set_sample_rate(&self, sample_rate: f64) -> Result<()> {
        self.update_settings(None, None, Some(sample_rate)).map(|_| ())
    }

    pub fn set_center_frequency(&self, hz: f64) -> Result<()> {
        self.update_settings(Some(hz), None, None).map(|_| ())
    }

    pub fn set_level(&self, dbm: f64) -> Result<()> {
        self.update_settings(None, Some(dbm), None).map(|_| ())
    }

    /// Apply any of the generator settings at once
    ///
    /// Every given value is checked before the state changes, so a rejected
    /// update leaves all settings as they were. Returns the updated state.
    pub fn update_settings(
        &self,
        center_frequency_hz: Option<f64>,
        level_dbm: Option<f64>,
        sample_rate: Option<f64>,
    ) -> Result<Snapshot> {
        if let Some(hz) = center_frequency_hz {
            if !hz.is_finite() || hz <= 0.0 {
                return Err(SynthError::InvalidFrequency(hz.to_string()));
            }
        }
        if let Some(dbm) = level_dbm {
            if !dbm.is_finite() {
                return Err(SynthError::NonFiniteParameter {
                    name: "level",
                    value: dbm,
                });
            }
        }
        if let Some(fs) = sample_rate {
            validate_sample_rate(fs)?;
        }

        let mut state = self.write();
        if let Some(hz) = center_frequency_hz {
            state.center_frequency_hz = hz;
        }
        if let Some(dbm) = level_dbm {
            state.level_dbm = dbm;
        }
        if let Some(fs) = sample_rate {
            state.sample_rate = fs;
            for (index, descriptor) in state.signals.iter().enumerate() {
                if let Err(e) = validate_descriptor(descriptor, fs) {
                    warn!("Signal {} is invalid at {} Hz: {}", index, fs, e);
                }
            }
        }
        Ok((*state).clone())
    }

    /// Render the current signal set; synthesis runs without holding the lock
    pub fn render(&self, seed: Option<u64>, duration_s: Option<f64>) -> Result<CompositeBuffer> {
        let snapshot = self.snapshot();
        snapshot.render(seed, duration_s)
    }
}
