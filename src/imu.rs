//! The per-loop attitude pipeline: acquire, filter, fuse, publish

use embedded_hal::blocking::delay::DelayMs;
use log::{debug, info, warn};
use nalgebra::{UnitQuaternion, Vector3};

use crate::ahrs::{Ahrs, FusionStep};
use crate::driver::ImuDriver;
use crate::low_pass::LowPassFilter;
use crate::math::Vector3Ext;
use crate::median::AxisMedian;
use crate::timing::{Benchmark, Clock, Throttle, Timer};
use crate::tracker::MaxTracker;
use crate::types::{AxisTriple, ConfigError, ImuSettings, RawSample};

/// Outcome of one [`Imu::update`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// The driver had nothing new; no state was touched
    Stale,
    /// A fresh sample went through the whole pipeline
    Processed(FusionStep),
}

/// Published pipeline output
///
/// A plain value copied out of the pipeline once per processing pass, so a
/// reader always sees one complete pass and never a half-updated mix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuState {
    /// Filtered angular rate in deg/s
    pub rates: AxisTriple<f32>,
    /// Fused roll, pitch, yaw in degrees
    pub angles: AxisTriple<f32>,
    /// Gyro-only integrated angles in degrees (debugging aid, drifts)
    pub gyro_angles: AxisTriple<f32>,
    pub gyro_raw: RawSample,
    pub accel_raw: RawSample,
    /// Median-filtered specific force in g
    pub accel_filtered: AxisTriple<f32>,
    /// Fused orientation
    pub quaternion: UnitQuaternion<f32>,
    /// Largest gyro magnitude seen, deg/s
    pub gyro_max: f32,
    /// Largest accelerometer magnitude seen, g
    pub accel_max: f32,
    /// Last interval between processing passes, microseconds
    pub loop_time_us: u32,
    /// Longest interval between processing passes, microseconds
    pub max_loop_time_us: u32,
}

impl Default for ImuState {
    fn default() -> Self {
        Self {
            rates: Vector3::zeros(),
            angles: Vector3::zeros(),
            gyro_angles: Vector3::zeros(),
            gyro_raw: Vector3::zeros(),
            accel_raw: Vector3::zeros(),
            accel_filtered: Vector3::zeros(),
            quaternion: UnitQuaternion::identity(),
            gyro_max: 0.0,
            accel_max: 0.0,
            loop_time_us: 0,
            max_loop_time_us: 0,
        }
    }
}

/// Attitude estimation pipeline for one IMU
///
/// Owns the driver, the clock and every piece of filter and fusion state.
/// Call [`update`](Self::update) (or the three lower-level steps) exactly
/// once per control-loop iteration.
///
/// # Example
/// ```
/// use core::cell::Cell;
/// use nalgebra::Vector3;
/// use quad_imu::{Clock, Imu, ImuDriver, ImuSettings, RawSample, Update};
///
/// struct Level;
/// impl ImuDriver for Level {
///     fn init(&mut self) {}
///     fn read_gyro(&mut self) -> RawSample { Vector3::zeros() }
///     fn read_accel(&mut self) -> RawSample { Vector3::new(0, 0, 4096) }
///     fn new_data_available(&mut self) -> bool { true }
/// }
///
/// struct Ticks(Cell<u32>);
/// impl Clock for Ticks {
///     fn micros(&self) -> u32 { self.0.get() }
///     fn millis(&self) -> u32 { self.0.get() / 1000 }
/// }
///
/// let mut imu = Imu::new(Level, Ticks(Cell::new(0)), ImuSettings::default()).unwrap();
/// imu.start();
/// for _ in 0..20 {
///     imu.clock().0.set(imu.clock().0.get() + 1000);
///     assert!(matches!(imu.update(), Update::Processed(_)));
/// }
/// assert!(imu.angles().x.abs() < 0.5);
/// ```
pub struct Imu<D, C> {
    driver: D,
    clock: C,
    settings: ImuSettings,

    gyro_raw: RawSample,
    accel_raw: RawSample,
    gyro_max: MaxTracker,
    accel_max: MaxTracker,

    accel_median: AxisMedian,
    accel_filtered: Vector3<f32>,
    gyro_filter: LowPassFilter,
    gyro_angles: Vector3<f32>,
    ahrs: Ahrs,
    accelerometer_degenerate: bool,

    gyro_timer: Timer,
    fusion_timer: Timer,
    benchmark: Benchmark,
    status: Throttle,

    published: ImuState,
}

impl<D: ImuDriver, C: Clock> Imu<D, C> {
    /// Builds the pipeline; fails if the settings would make a filter divide by zero
    pub fn new(driver: D, clock: C, settings: ImuSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let now_us = clock.micros();
        let now_ms = clock.millis();

        Ok(Self {
            driver,
            clock,
            settings,
            gyro_raw: Vector3::zeros(),
            accel_raw: Vector3::zeros(),
            gyro_max: MaxTracker::new(),
            accel_max: MaxTracker::new(),
            accel_median: AxisMedian::new(settings.median_seed),
            accel_filtered: Vector3::zeros(),
            gyro_filter: LowPassFilter::new(settings.gyro_cutoff_hz),
            gyro_angles: Vector3::zeros(),
            ahrs: Ahrs::new(settings.beta),
            accelerometer_degenerate: false,
            gyro_timer: Timer::new(now_us),
            fusion_timer: Timer::new(now_us),
            benchmark: Benchmark::new(now_ms, settings.benchmark_grace_ms),
            status: Throttle::new(now_ms, settings.status_period_ms),
            published: ImuState::default(),
        })
    }

    /// Brings the sensor up, waiting out its settle time on both sides
    pub fn init<T: DelayMs<u32>>(&mut self, delay: &mut T) {
        delay.delay_ms(self.settings.warmup_delay_ms);
        self.driver.init();
        delay.delay_ms(self.settings.warmup_delay_ms);

        self.start();
        info!(
            "imu ready: gyro cutoff {} Hz, beta {}",
            self.settings.gyro_cutoff_hz, self.settings.beta
        );
    }

    /// Stamps every timer with the current clock
    ///
    /// Called by [`init`](Self::init); call it directly when the driver was
    /// brought up elsewhere, so the first `dt` does not span the bring-up.
    pub fn start(&mut self) {
        let now_us = self.clock.micros();
        let now_ms = self.clock.millis();

        self.gyro_timer.restart(now_us);
        self.fusion_timer.restart(now_us);
        self.benchmark = Benchmark::new(now_ms, self.settings.benchmark_grace_ms);
        self.status = Throttle::new(now_ms, self.settings.status_period_ms);
    }

    /// One full loop iteration: skips everything if the driver has no fresh sample
    pub fn update(&mut self) -> Update {
        if !self.driver.new_data_available() {
            debug!("imu: no new sample, skipping filter and fusion");
            return Update::Stale;
        }

        self.read_gyro_raws();
        self.read_accel_raws();
        Update::Processed(self.process_values())
    }

    /// Pulls a gyro sample and updates its max tracker
    pub fn read_gyro_raws(&mut self) {
        self.gyro_raw = self.driver.read_gyro();
        self.gyro_max.record(self.gyro_raw);
    }

    /// Pulls an accelerometer sample, updates its max tracker and median windows
    pub fn read_accel_raws(&mut self) {
        self.accel_raw = self.driver.read_accel();
        self.accel_max.record(self.accel_raw);
        self.accel_median.insert(self.accel_raw);
    }

    /// Runs filters and fusion on the latest raw samples, then publishes
    pub fn process_values(&mut self) -> FusionStep {
        self.benchmark.record(self.clock.millis(), self.clock.micros());

        self.process_gyro();
        self.process_accel();
        let step = self.combine();

        self.publish();
        self.log_status();
        step
    }

    fn process_gyro(&mut self) {
        let dt = self.gyro_timer.lap(self.clock.micros());
        let rate = self.settings.gyro.apply(self.gyro_raw);
        let rates = self.gyro_filter.update(rate, dt);

        self.gyro_angles += rates * dt;
    }

    fn process_accel(&mut self) {
        self.accel_filtered = self.settings.accel.apply(self.accel_median.median());
    }

    fn combine(&mut self) -> FusionStep {
        let dt = self.fusion_timer.lap(self.clock.micros());
        let step = self.ahrs.update(
            self.gyro_filter.output().deg_to_rad(),
            self.accel_filtered,
            dt,
        );

        match step {
            FusionStep::Corrected => self.accelerometer_degenerate = false,
            FusionStep::GyroOnly => {
                if !self.accelerometer_degenerate {
                    warn!("imu: degenerate accelerometer vector, integrating gyro only");
                }
                self.accelerometer_degenerate = true;
            }
            FusionStep::Skipped => debug!("imu: fusion step skipped (dt = {} s)", dt),
        }
        step
    }

    fn publish(&mut self) {
        self.published = ImuState {
            rates: self.gyro_filter.output(),
            angles: self.ahrs.euler_degrees(),
            gyro_angles: self.gyro_angles,
            gyro_raw: self.gyro_raw,
            accel_raw: self.accel_raw,
            accel_filtered: self.accel_filtered,
            quaternion: self.ahrs.quaternion(),
            gyro_max: self.settings.gyro.to_physical(self.gyro_max.max()),
            accel_max: self.settings.accel.to_physical(self.accel_max.max()),
            loop_time_us: self.benchmark.current_us(),
            max_loop_time_us: self.benchmark.max_us(),
        };
    }

    /// Emits one status line if the status period has elapsed
    pub fn log_status(&mut self) {
        if !self.status.ready(self.clock.millis()) {
            return;
        }
        let state = &self.published;
        debug!(
            "imu: rates [{:.1} {:.1} {:.1}] deg/s, angles [{:.1} {:.1} {:.1}] deg, loop {} us (max {} us)",
            state.rates.x,
            state.rates.y,
            state.rates.z,
            state.angles.x,
            state.angles.y,
            state.angles.z,
            state.loop_time_us,
            state.max_loop_time_us,
        );
    }

    /// Passthrough of the driver's fresh-sample flag
    pub fn new_data_available(&mut self) -> bool {
        self.driver.new_data_available()
    }

    /// Copy of everything published by the last processing pass
    pub fn snapshot(&self) -> ImuState {
        self.published
    }

    pub fn rates(&self) -> AxisTriple<f32> {
        self.published.rates
    }

    pub fn angles(&self) -> AxisTriple<f32> {
        self.published.angles
    }

    pub fn gyro_angles(&self) -> AxisTriple<f32> {
        self.published.gyro_angles
    }

    pub fn gyro_raw(&self) -> RawSample {
        self.published.gyro_raw
    }

    pub fn accel_raw(&self) -> RawSample {
        self.published.accel_raw
    }

    pub fn accel_filtered(&self) -> AxisTriple<f32> {
        self.published.accel_filtered
    }

    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.published.quaternion
    }

    pub fn gyro_max(&self) -> f32 {
        self.published.gyro_max
    }

    pub fn accel_max(&self) -> f32 {
        self.published.accel_max
    }

    pub fn loop_time_us(&self) -> u32 {
        self.published.loop_time_us
    }

    pub fn max_loop_time_us(&self) -> u32 {
        self.published.max_loop_time_us
    }

    pub fn settings(&self) -> &ImuSettings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Gives the driver and clock back
    pub fn release(self) -> (D, C) {
        (self.driver, self.clock)
    }
}
