use overlay_core::{OverlayError, Result};
use std::collections::VecDeque;

/// Rolling window of timing samples (milliseconds) with a running sum.
///
/// The sum is updated on every push and eviction, so [`mean`](Self::mean)
/// is O(1) regardless of capacity.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples:  VecDeque<f64>,
    capacity: usize,
    sum:      f64,
}

impl SampleWindow {
    /// A window holding at most `capacity` samples; zero is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(OverlayError::InvalidWindow(capacity));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        })
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.sum -= evicted;
            }
        }
        self.samples.push_back(value);
        self.sum += value;

        // Cancellation can leave a tiny negative residue once large values
        // have been evicted; every retained sample is non-negative.
        if self.sum < 0.0 {
            self.sum = 0.0;
        }
    }

    /// Mean over the samples currently held, `None` while empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.sum / self.samples.len() as f64)
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SampleWindow::new(0).unwrap_err();
        assert!(matches!(err, OverlayError::InvalidWindow(0)));
    }

    #[test]
    fn occupancy_never_exceeds_capacity() {
        let mut w = SampleWindow::new(1).unwrap();
        for v in [1.0, 2.0, 3.0] {
            w.push(v);
            assert_eq!(w.len(), 1);
        }
        assert_eq!(w.mean(), Some(3.0));
    }

    #[test]
    fn empty_window_has_no_mean() {
        let w = SampleWindow::new(4).unwrap();
        assert_eq!(w.mean(), None);
        assert!(w.is_empty());
    }

    #[test]
    fn warm_up_mean_uses_occupancy() {
        let mut w = SampleWindow::new(120).unwrap();
        w.push(10.0);
        w.push(20.0);
        assert_eq!(w.mean(), Some(15.0));
    }

    #[test]
    fn evicts_oldest_first() {
        let mut w = SampleWindow::new(2).unwrap();
        for v in [10.0, 20.0, 30.0] {
            w.push(v);
        }
        assert_eq!(w.iter().collect::<Vec<_>>(), vec![20.0, 30.0]);
        assert_eq!(w.mean(), Some(25.0));
    }

    #[test]
    fn running_sum_tracks_retained_samples() {
        let mut w = SampleWindow::new(7).unwrap();
        for i in 0..1_000u32 {
            // Irregular magnitudes to exercise cancellation.
            let v = f64::from(i % 13) * 3.7 + f64::from(i % 5) * 1e3;
            w.push(v);
            assert!(w.len() <= w.capacity());
            let literal: f64 = w.iter().sum();
            assert!((w.sum() - literal).abs() < 1e-6, "drift at {i}: {} vs {literal}", w.sum());
        }
        assert_eq!(w.len(), 7);
    }

    #[test]
    fn clear_resets_sum() {
        let mut w = SampleWindow::new(3).unwrap();
        w.push(5.0);
        w.clear();
        assert_eq!(w.sum(), 0.0);
        assert_eq!(w.mean(), None);
    }
}
