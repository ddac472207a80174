//! Sensor driver seam
//!
//! Bus wiring and register protocols live behind this trait. The pipeline
//! only pulls finished samples and asks whether a fresh one exists.

use crate::types::RawSample;

/// A six-axis inertial sensor
///
/// Reads are treated as authoritative; retry and bus error handling belong
/// to the implementation.
pub trait ImuDriver {
    /// One-time hardware bring-up
    fn init(&mut self);

    /// Latest angular-rate sample in raw counts
    fn read_gyro(&mut self) -> RawSample;

    /// Latest specific-force sample in raw counts
    fn read_accel(&mut self) -> RawSample;

    /// Whether a sample newer than the last read is available
    fn new_data_available(&mut self) -> bool;
}

impl<D: ImuDriver + ?Sized> ImuDriver for &mut D {
    fn init(&mut self) {
        (**self).init()
    }

    fn read_gyro(&mut self) -> RawSample {
        (**self).read_gyro()
    }

    fn read_accel(&mut self) -> RawSample {
        (**self).read_accel()
    }

    fn new_data_available(&mut self) -> bool {
        (**self).new_data_available()
    }
}
