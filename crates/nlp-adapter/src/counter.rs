//! Per-solve count of evaluation-function invocations.

/// Counts calls into the user's evaluation function.
///
/// Owned by the bridge of one solve, so independent solves never share a
/// count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounter {
    calls: usize,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation and return the new total.
    pub fn increment(&mut self) -> usize {
        self.calls += 1;
        self.calls
    }

    pub fn get(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero() {
        assert_eq!(CallCounter::new().get(), 0);
    }

    #[test]
    fn test_counter_increments() {
        let mut counter = CallCounter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }
}
