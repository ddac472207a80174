//! Core types and configuration for the IMU attitude pipeline

use nalgebra::Vector3;
use thiserror::Error;

use crate::calibration::Calibration;

/// Three scalar components (x, y, z)
///
/// Integer triples carry sensor-native counts, float triples carry physical
/// units (deg/s, g, degrees).
pub type AxisTriple<T> = Vector3<T>;

/// One raw reading for a sensor group, in sensor-native counts
pub type RawSample = Vector3<i32>;

/// Number of samples in each accelerometer median window
pub const MEDIAN_WINDOW: usize = 11;

/// Sensor groups handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Gyroscope,
    Accelerometer,
}

impl core::fmt::Display for Sensor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Sensor::Gyroscope => f.write_str("gyroscope"),
            Sensor::Accelerometer => f.write_str("accelerometer"),
        }
    }
}

/// Rejected configuration values
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("{sensor} sensitivity must be finite and non-zero, got {value}")]
    InvalidSensitivity { sensor: Sensor, value: f32 },
    #[error("gyro cutoff frequency must be finite and positive, got {0} Hz")]
    InvalidCutoff(f32),
    #[error("fusion gain must be finite and non-negative, got {0}")]
    InvalidGain(f32),
}

/// Pipeline settings
///
/// Fixed at build or calibration time and handed to [`Imu::new`](crate::Imu::new).
/// Nothing in here is mutated while the loop runs.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use quad_imu::{Calibration, ImuSettings};
///
/// let settings = ImuSettings {
///     gyro: Calibration {
///         offset: Vector3::new(-41, 18, -6),
///         sensitivity: 65.5,
///     },
///     gyro_cutoff_hz: 60.0,
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSettings {
    /// Gyroscope calibration (counts per deg/s)
    pub gyro: Calibration,
    /// Accelerometer calibration (counts per g)
    pub accel: Calibration,
    /// Cutoff frequency of the gyro low-pass filter in Hz
    pub gyro_cutoff_hz: f32,
    /// Value the accelerometer median windows are pre-filled with
    pub median_seed: i32,
    /// Madgwick gradient-descent gain (beta)
    ///
    /// Larger values pull harder toward the accelerometer's down direction
    /// at the cost of more accelerometer noise in the estimate.
    pub beta: f32,
    /// Delay in milliseconds before and after driver bring-up
    pub warmup_delay_ms: u32,
    /// Milliseconds after start before the loop benchmark begins recording
    pub benchmark_grace_ms: u32,
    /// Minimum milliseconds between status log lines, 0 disables them
    pub status_period_ms: u32,
}

impl ImuSettings {
    /// Checks every value the filters divide by or scale with
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sensitivity(&self.gyro, Sensor::Gyroscope)?;
        validate_sensitivity(&self.accel, Sensor::Accelerometer)?;

        if !self.gyro_cutoff_hz.is_finite() || self.gyro_cutoff_hz <= 0.0 {
            return Err(ConfigError::InvalidCutoff(self.gyro_cutoff_hz));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(ConfigError::InvalidGain(self.beta));
        }
        Ok(())
    }
}

fn validate_sensitivity(calibration: &Calibration, sensor: Sensor) -> Result<(), ConfigError> {
    let value = calibration.sensitivity;
    if !value.is_finite() || value == 0.0 {
        return Err(ConfigError::InvalidSensitivity { sensor, value });
    }
    Ok(())
}

impl Default for ImuSettings {
    fn default() -> Self {
        Self {
            gyro: Calibration::with_sensitivity(65.5),
            accel: Calibration::with_sensitivity(4096.0),
            gyro_cutoff_hz: 80.0,
            median_seed: 0,
            beta: 0.033,
            warmup_delay_ms: 300,
            benchmark_grace_ms: 2000,
            status_period_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert_eq!(ImuSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_sensitivity_rejected() {
        let settings = ImuSettings {
            accel: Calibration::with_sensitivity(0.0),
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidSensitivity {
                sensor: Sensor::Accelerometer,
                value: 0.0
            })
        );
    }

    #[test]
    fn test_bad_cutoff_and_gain_rejected() {
        let settings = ImuSettings {
            gyro_cutoff_hz: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::InvalidCutoff(0.0)));

        let settings = ImuSettings {
            beta: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidGain(_))));
    }
}
