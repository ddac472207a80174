//! Single-pole low-pass filter with a dt-adaptive coefficient

use core::f32::consts::PI;

use nalgebra::Vector3;

/// First-order RC low-pass filter over three axes
///
/// The smoothing coefficient `alpha = dt / (rc + dt)` is recomputed from
/// the measured `dt` on every update, so the cutoff stays put when the
/// loop period jitters.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use quad_imu::LowPassFilter;
///
/// let mut filter = LowPassFilter::new(80.0);
/// let target = Vector3::new(100.0, 0.0, -50.0);
/// for _ in 0..100 {
///     filter.update(target, 0.001);
/// }
/// assert!((filter.output() - target).norm() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    /// Time constant `1 / (2 pi f_cut)` in seconds
    rc: f32,
    state: Vector3<f32>,
}

impl LowPassFilter {
    /// Creates a filter for the given cutoff frequency in Hz
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            rc: 1.0 / (2.0 * PI * cutoff_hz),
            state: Vector3::zeros(),
        }
    }

    /// Blends `input` into the state and returns the new output
    ///
    /// A non-positive or non-finite `dt` leaves the state untouched.
    pub fn update(&mut self, input: Vector3<f32>, dt: f32) -> Vector3<f32> {
        if dt.is_finite() && dt > 0.0 {
            let alpha = dt / (self.rc + dt);
            self.state += (input - self.state) * alpha;
        }
        self.state
    }

    /// Current filtered value
    pub fn output(&self) -> Vector3<f32> {
        self.state
    }

    /// Time constant in seconds
    pub fn rc(&self) -> f32 {
        self.rc
    }

    pub fn reset(&mut self) {
        self.state = Vector3::zeros();
    }
}
