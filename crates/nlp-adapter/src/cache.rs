//! Single-slot cache between the value and gradient entry points.

use crate::evaluation::Gradients;

/// The most recent design vector and the gradients computed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub x: Vec<f64>,
    pub gradients: Gradients,
}

/// Holds at most one [`CacheEntry`].
///
/// The value entry point overwrites the slot on every call; the gradient
/// entry point empties it on every call, hit or miss, so an entry is
/// consumed at most once.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    slot: Option<CacheEntry>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with a fresh entry.
    pub fn store(&mut self, x: &[f64], gradients: Gradients) {
        self.slot = Some(CacheEntry {
            x: x.to_vec(),
            gradients,
        });
    }

    /// Take the cached gradients if they were computed at exactly `x`.
    ///
    /// Matching is exact elementwise equality. The slot is emptied either way.
    pub fn take(&mut self, x: &[f64]) -> Option<Gradients> {
        match self.slot.take() {
            Some(entry) if entry.x.as_slice() == x => Some(entry.gradients),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Drop any cached entry.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}
