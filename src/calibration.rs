//! Raw-count to physical-unit calibration

use nalgebra::Vector3;

use crate::types::RawSample;

/// Offset and sensitivity converting raw counts into physical units
///
/// Matches the usual MEMS datasheet form: `physical = (raw - offset) / sensitivity`,
/// with the sensitivity given in counts per unit (LSB/(deg/s) or LSB/g).
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use quad_imu::Calibration;
///
/// let gyro = Calibration {
///     offset: Vector3::new(-12, 7, 3),
///     sensitivity: 65.5, // LSB per deg/s at +-500 deg/s
/// };
/// let rate = gyro.apply(Vector3::new(-12, 72, 3));
/// assert!(rate.x.abs() < 1e-6);
/// assert!((rate.y - 65.0 / 65.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Per-axis zero offset in raw counts
    pub offset: Vector3<i32>,
    /// Raw counts per physical unit, shared by all three axes
    pub sensitivity: f32,
}

impl Calibration {
    /// Creates a calibration with zero offsets
    pub fn with_sensitivity(sensitivity: f32) -> Self {
        Self {
            offset: Vector3::zeros(),
            sensitivity,
        }
    }

    /// Converts a raw sample into physical units
    ///
    /// The offset is removed in integer space before the float conversion.
    /// Subtraction wraps instead of overflowing on pathological counts.
    pub fn apply(&self, raw: RawSample) -> Vector3<f32> {
        raw.zip_map(&self.offset, |counts, offset| {
            counts.wrapping_sub(offset) as f32 / self.sensitivity
        })
    }

    /// Converts a single unsigned magnitude (no offset) into physical units
    pub fn to_physical(&self, counts: u32) -> f32 {
        counts as f32 / self.sensitivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inertial_calibration() {
        let calibration = Calibration {
            offset: Vector3::new(10, -20, 0),
            sensitivity: 2.0,
        };

        // (30-10, -20+20, -8-0) / 2
        let calibrated = calibration.apply(Vector3::new(30, -20, -8));
        let expected = Vector3::new(10.0, 0.0, -4.0);

        assert!((calibrated - expected).norm() < 1e-6);
    }

    #[test]
    fn test_magnitude_conversion() {
        let accel = Calibration::with_sensitivity(4096.0);
        assert!((accel.to_physical(8192) - 2.0).abs() < 1e-6);
        assert_eq!(accel.to_physical(0), 0.0);
    }
}
