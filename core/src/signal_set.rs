use crate::descriptor::SignalDescriptor;
use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};

/// Ordered list of sub-signals making up one composite
///
/// Insertion order is preserved and is also the order in which the
/// compositor draws random numbers, so edits never reshuffle other signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalSet {
    signals: Vec<SignalDescriptor>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn push(&mut self, descriptor: SignalDescriptor) {
        self.signals.push(descriptor);
    }

    pub fn get(&self, index: usize) -> Option<&SignalDescriptor> {
        self.signals.get(index)
    }

    /// Replace the descriptor at `index`, returning the previous one
    pub fn replace(&mut self, index: usize, descriptor: SignalDescriptor) -> Result<SignalDescriptor> {
        let len = self.signals.len();
        let slot = self
            .signals
            .get_mut(index)
            .ok_or(SynthError::SignalIndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, descriptor))
    }

    pub fn remove(&mut self, index: usize) -> Result<SignalDescriptor> {
        self.check_index(index)?;
        Ok(self.signals.remove(index))
    }

    /// Flip the enabled flag, returning the new state
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let len = self.signals.len();
        let sig = self
            .signals
            .get_mut(index)
            .ok_or(SynthError::SignalIndexOutOfRange { index, len })?;
        let enabled = !sig.is_enabled();
        sig.set_enabled(enabled);
        Ok(enabled)
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignalDescriptor> {
        self.signals.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SignalDescriptor> {
        self.signals.iter().filter(|s| s.is_enabled())
    }

    pub fn as_slice(&self) -> &[SignalDescriptor] {
        &self.signals
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.signals.len() {
            return Err(SynthError::SignalIndexOutOfRange {
                index,
                len: self.signals.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<SignalDescriptor>> for SignalSet {
    fn from(signals: Vec<SignalDescriptor>) -> Self {
        Self { signals }
    }
}

impl FromIterator<SignalDescriptor> for SignalSet {
    fn from_iter<I: IntoIterator<Item = SignalDescriptor>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SignalSet {
    type Item = &'a SignalDescriptor;
    type IntoIter = std::slice::Iter<'a, SignalDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.signals.iter()
    }
}
