//! Flat storage for every signal of every component instance.

use crate::field::FieldElement;

/// One slot per signal of the whole circuit. Slot 0 holds the constant one, the main component's
/// block starts right after it.
///
/// Indices are computed by the compiled circuit and are trusted: out of range accesses are caught
/// by debug assertions and otherwise panic on slice indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalArena {
  values: Vec<FieldElement>,
}

impl SignalArena {
  pub fn new(signal_count: usize) -> Self {
    Self { values: vec![FieldElement::ZERO; signal_count] }
  }

  pub fn len(&self) -> usize { self.values.len() }

  pub fn is_empty(&self) -> bool { self.values.is_empty() }

  #[inline]
  pub fn read(&self, index: usize) -> FieldElement {
    debug_assert!(index < self.values.len(), "signal {index} out of range {}", self.values.len());
    self.values[index]
  }

  #[inline]
  pub fn write(&mut self, index: usize, value: FieldElement) {
    debug_assert!(index < self.values.len(), "signal {index} out of range {}", self.values.len());
    self.values[index] = value;
  }

  /// Copies `width` consecutive slots starting at `from` to `to`. Ranges may overlap.
  pub fn copy_within(&mut self, from: usize, to: usize, width: usize) {
    debug_assert!(from + width <= self.values.len() && to + width <= self.values.len());
    self.values.copy_within(from..from + width, to);
  }

  pub fn as_slice(&self) -> &[FieldElement] { &self.values }

  pub fn into_values(self) -> Vec<FieldElement> { self.values }
}
