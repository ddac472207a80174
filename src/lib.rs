#![no_std]

//! Attitude estimation core for multirotor flight controllers
//!
//! Turns raw six-axis IMU samples into filtered angular rates and a fused
//! orientation, once per control-loop iteration:
//!
//! raw sample -> max tracking -> noise filtering -> quaternion fusion -> published state
//!
//! - Accelerometer axes go through an 11-sample sliding median, rejecting
//!   single-sample spikes without the phase lag of a low-pass filter.
//! - Gyroscope axes go through a single-pole low-pass filter whose
//!   coefficient adapts to the measured loop period.
//! - A Madgwick-style gradient-descent filter fuses both into a unit
//!   quaternion, with Euler angles derived for consumers.
//! - Degenerate inputs (stale data, zero `dt`, zero-length accelerometer
//!   vector) skip the affected step for one iteration and never reach the
//!   persistent state.
//!
//! The sensor driver and monotonic clock are supplied through the
//! [`ImuDriver`] and [`Clock`] traits. The crate is `#![no_std]`.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use quad_imu::{Ahrs, LowPassFilter, MedianFilter};
//!
//! let mut median = MedianFilter::<11>::new(0);
//! let mut gyro_filter = LowPassFilter::new(80.0);
//! let mut ahrs = Ahrs::new(0.033);
//!
//! median.insert(4096);
//! let rates = gyro_filter.update(Vector3::new(0.0, 0.0, 10.0), 0.001); // deg/s
//! let accel = Vector3::new(0.0, 0.0, 1.0); // g
//!
//! ahrs.update(rates.map(f32::to_radians), accel, 0.001);
//! let angles = ahrs.euler_degrees(); // roll, pitch, yaw
//! # assert!(angles.x.abs() < 1.0);
//! ```
//!
//! For the full loop, see [`Imu`].

#[cfg(test)]
extern crate std;

mod ahrs;
pub mod calibration;
mod driver;
mod imu;
mod low_pass;
mod math;
mod median;
pub mod timing;
mod tracker;
mod types;

// Re-export all public types and functions
pub use ahrs::{Ahrs, FusionStep};
pub use calibration::Calibration;
pub use driver::ImuDriver;
pub use imu::{Imu, ImuState, Update};
pub use low_pass::LowPassFilter;
pub use math::{DEG_TO_RAD, NORM_EPSILON, QuaternionExt, RAD_TO_DEG, Vector3Ext};
pub use median::{AxisMedian, MedianFilter};
pub use timing::{Benchmark, Clock, Throttle, Timer};
pub use tracker::MaxTracker;
pub use types::*;
