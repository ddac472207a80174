//! Madgwick gradient-descent orientation filter (gyroscope + accelerometer)

use nalgebra::{Matrix3x4, Quaternion, UnitQuaternion, Vector3};

use crate::math::{NORM_EPSILON, QuaternionExt, Vector3Ext};

/// What a fusion update did with its inputs
///
/// Anything other than [`FusionStep::Corrected`] is a recognised degradation,
/// not a failure: the estimate keeps running on whatever was usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionStep {
    /// Gyroscope integrated and nudged toward the accelerometer's down direction
    Corrected,
    /// Accelerometer vector was degenerate, gyroscope integrated alone
    GyroOnly,
    /// `dt` was zero or the step would have produced a non-finite quaternion;
    /// orientation left unchanged
    Skipped,
}

/// Quaternion complementary filter
///
/// Integrates the quaternion kinematic equation `q' = 0.5 q * (0, w)` and
/// subtracts `beta` times the normalised gradient of the error between the
/// estimated and measured gravity directions. Without a magnetometer the
/// yaw angle is unobservable and will drift with gyro bias.
#[derive(Debug, Clone, Copy)]
pub struct Ahrs {
    /// Gradient-descent gain
    beta: f32,
    /// Current orientation, sensor to earth
    quaternion: UnitQuaternion<f32>,
}

impl Ahrs {
    /// Create a filter at identity orientation with the given gain
    pub fn new(beta: f32) -> Self {
        Self {
            beta,
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Reset orientation to identity
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
    }

    /// Gradient-descent gain
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// Advance the estimate by `delta_time`
    ///
    /// # Arguments
    /// * `gyroscope` - Angular rate in radians per second
    /// * `accelerometer` - Specific force in any unit (only the direction is used)
    /// * `delta_time` - Seconds since the previous update
    pub fn update(
        &mut self,
        gyroscope: Vector3<f32>,
        accelerometer: Vector3<f32>,
        delta_time: f32,
    ) -> FusionStep {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return FusionStep::Skipped;
        }

        let q = *self.quaternion.as_ref();

        // Rate of change from the gyroscope alone
        let mut q_dot = q * Quaternion::from_parts(0.0, gyroscope) * 0.5;

        let step = match accelerometer.try_unit() {
            Some(measured) => {
                if let Some(gradient) = self.gradient(measured) {
                    q_dot -= gradient * self.beta;
                }
                FusionStep::Corrected
            }
            None => FusionStep::GyroOnly,
        };

        // Euler step, then back onto the unit sphere
        let integrated = q + q_dot * delta_time;
        if !integrated.coords.iter().all(|c| c.is_finite()) {
            return FusionStep::Skipped;
        }
        match UnitQuaternion::try_new(integrated, NORM_EPSILON) {
            Some(quaternion) => {
                self.quaternion = quaternion;
                step
            }
            None => FusionStep::Skipped,
        }
    }

    /// Current orientation quaternion
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Set orientation quaternion directly
    pub fn set_quaternion(&mut self, quaternion: UnitQuaternion<f32>) {
        self.quaternion = quaternion;
    }

    /// Roll, pitch and yaw in degrees
    pub fn euler_degrees(&self) -> Vector3<f32> {
        self.quaternion.to_euler_degrees()
    }

    /// Estimated direction of the accelerometer's gravity reading in the sensor frame
    pub fn gravity(&self) -> Vector3<f32> {
        let q = self.quaternion.as_ref();
        let (qw, qx, qy, qz) = (q.w, q.i, q.j, q.k);

        Vector3::new(
            2.0 * (qx * qz - qw * qy),
            2.0 * (qy * qz + qw * qx),
            1.0 - 2.0 * (qx * qx + qy * qy),
        )
    }

    /// Normalised gradient of `|gravity(q) - measured|^2 / 2` with respect to q
    ///
    /// `None` when the gradient vanishes (estimate already agrees with the
    /// measurement).
    fn gradient(&self, measured: Vector3<f32>) -> Option<Quaternion<f32>> {
        let q = self.quaternion.as_ref();
        let (qw, qx, qy, qz) = (q.w, q.i, q.j, q.k);

        let error = self.gravity() - measured;

        // Jacobian of gravity(q), columns ordered w, x, y, z
        #[rustfmt::skip]
        let jacobian = Matrix3x4::new(
            -2.0 * qy,  2.0 * qz, -2.0 * qw, 2.0 * qx,
             2.0 * qx,  2.0 * qw,  2.0 * qz, 2.0 * qy,
             0.0,      -4.0 * qx, -4.0 * qy, 0.0,
        );

        let gradient = jacobian.transpose() * error;
        let magnitude = gradient.norm();
        if !(magnitude.is_finite() && magnitude > NORM_EPSILON) {
            return None;
        }
        let gradient = gradient / magnitude;

        Some(Quaternion::new(gradient[0], gradient[1], gradient[2], gradient[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEG_TO_RAD;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_new_ahrs() {
        let ahrs = Ahrs::new(0.1);
        assert_eq!(ahrs.quaternion(), UnitQuaternion::identity());
        assert_eq!(ahrs.beta(), 0.1);
    }

    #[test]
    fn test_gravity_calculation() {
        let ahrs = Ahrs::new(0.1);
        let gravity = ahrs.gravity();

        // Level sensor reads +1 g on z
        assert!((gravity.norm() - 1.0).abs() < 1e-6);
        assert!((gravity.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gravity_follows_roll() {
        let mut ahrs = Ahrs::new(0.1);
        ahrs.set_quaternion(UnitQuaternion::from_euler_degrees(30.0, 0.0, 0.0));
        let gravity = ahrs.gravity();

        assert!(gravity.x.abs() < 1e-6);
        assert!((gravity.y - (30.0 * DEG_TO_RAD).sin()).abs() < 1e-5);
        assert!((gravity.z - (30.0 * DEG_TO_RAD).cos()).abs() < 1e-5);
    }

    #[test]
    fn test_zero_delta_time_is_skipped() {
        let mut ahrs = Ahrs::new(0.5);
        ahrs.set_quaternion(UnitQuaternion::from_euler_degrees(10.0, -5.0, 3.0));
        let before = ahrs.quaternion();

        let step = ahrs.update(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0), 0.0);

        assert_eq!(step, FusionStep::Skipped);
        assert_eq!(ahrs.quaternion(), before);
        assert!(ahrs.quaternion().coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_zero_accelerometer_falls_back_to_gyro() {
        let mut ahrs = Ahrs::new(0.5);
        let step = ahrs.update(Vector3::new(0.5, 0.0, 0.0), Vector3::zeros(), 0.01);

        assert_eq!(step, FusionStep::GyroOnly);
        let (roll, _, _) = ahrs.quaternion().euler_angles();
        assert!((roll - 0.005).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_input_never_reaches_state() {
        let mut ahrs = Ahrs::new(0.1);
        let before = ahrs.quaternion();

        let step = ahrs.update(Vector3::new(f32::NAN, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0), 0.01);

        assert_eq!(step, FusionStep::Skipped);
        assert_eq!(ahrs.quaternion(), before);
    }

    #[test]
    fn test_norm_stays_unit() {
        let mut ahrs = Ahrs::new(0.2);
        for i in 0..2000 {
            let t = i as f32 * 0.002;
            let gyro = Vector3::new(3.0 * t.sin(), -2.0 * t.cos(), 1.5);
            let accel = Vector3::new(0.2 * t.cos(), 0.1, 0.97);
            ahrs.update(gyro, accel, 0.002);
            assert!((ahrs.quaternion().as_ref().norm() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_correction_pulls_toward_accelerometer() {
        let mut ahrs = Ahrs::new(0.5);
        ahrs.set_quaternion(UnitQuaternion::from_euler_degrees(20.0, 0.0, 0.0));

        // Level accelerometer, no rotation: roll should decay toward zero
        for _ in 0..2000 {
            assert_eq!(
                ahrs.update(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0), 0.001),
                FusionStep::Corrected
            );
        }
        let euler = ahrs.euler_degrees();
        assert!(euler.x.abs() < 1.0, "roll did not converge: {}", euler.x);
        assert!(euler.y.abs() < 1.0);
    }
}
