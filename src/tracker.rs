//! Running maximum of raw sample magnitudes (diagnostics)

use crate::types::RawSample;

/// Largest absolute raw value seen on any axis of one sensor
///
/// Never decreases. Magnitudes are kept unsigned so `i32::MIN` is representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxTracker {
    max: u32,
}

impl MaxTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one sample in, returning true if the maximum grew
    pub fn record(&mut self, sample: RawSample) -> bool {
        let peak = sample
            .iter()
            .map(|counts| counts.unsigned_abs())
            .max()
            .unwrap_or(0);

        if peak > self.max {
            self.max = peak;
            true
        } else {
            false
        }
    }

    /// Maximum magnitude in raw counts
    pub fn max(&self) -> u32 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_tracks_largest_magnitude_across_axes() {
        let mut tracker = MaxTracker::new();
        assert_eq!(tracker.max(), 0);

        assert!(tracker.record(Vector3::new(3, -40, 12)));
        assert_eq!(tracker.max(), 40);

        assert!(!tracker.record(Vector3::new(39, 0, -1)));
        assert_eq!(tracker.max(), 40);

        assert!(tracker.record(Vector3::new(0, 0, i32::MIN)));
        assert_eq!(tracker.max(), 2_147_483_648);
    }
}
