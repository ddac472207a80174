//! Replays a log of raw IMU samples through the attitude pipeline
//!
//! Each CSV row holds a microsecond timestamp and the six raw sensor
//! registers. The replay clock follows the logged timestamps, so loop
//! jitter in the log reaches the filters exactly as it did on the vehicle.
//!
//! Without an argument a synthetic roll sweep (with sensor noise and the odd
//! accelerometer glitch) is generated, written to `replay_input.csv` and
//! replayed. The fused and gyro-only angles are plotted to `replay.png`.
//!
//! Run with: `cargo run --example replay [-- path/to/log.csv]`

use std::cell::Cell;
use std::error::Error;
use std::f32::consts::PI;
use std::rc::Rc;

use nalgebra::Vector3;
use plotters::prelude::*;
use quad_imu::{Clock, FusionStep, Imu, ImuDriver, ImuSettings, RawSample, Update};
use rand::prelude::*;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RawRecord {
    #[serde(rename = "Time (us)")]
    time_us: u32,
    #[serde(rename = "Gyroscope X (LSB)")]
    gyro_x: i32,
    #[serde(rename = "Gyroscope Y (LSB)")]
    gyro_y: i32,
    #[serde(rename = "Gyroscope Z (LSB)")]
    gyro_z: i32,
    #[serde(rename = "Accelerometer X (LSB)")]
    accel_x: i32,
    #[serde(rename = "Accelerometer Y (LSB)")]
    accel_y: i32,
    #[serde(rename = "Accelerometer Z (LSB)")]
    accel_z: i32,
}

/// Clock whose time is whatever the current log row says
#[derive(Clone, Default)]
struct ReplayClock(Rc<Cell<u32>>);

impl Clock for ReplayClock {
    fn micros(&self) -> u32 {
        self.0.get()
    }

    fn millis(&self) -> u32 {
        self.0.get() / 1000
    }
}

/// Driver serving one log row per loop iteration
#[derive(Default)]
struct ReplayDriver {
    row: RawRecord,
}

impl ImuDriver for ReplayDriver {
    fn init(&mut self) {}

    fn read_gyro(&mut self) -> RawSample {
        Vector3::new(self.row.gyro_x, self.row.gyro_y, self.row.gyro_z)
    }

    fn read_accel(&mut self) -> RawSample {
        Vector3::new(self.row.accel_x, self.row.accel_y, self.row.accel_z)
    }

    fn new_data_available(&mut self) -> bool {
        true
    }
}

const SYNTHETIC_PATH: &str = "replay_input.csv";
const GYRO_SENS: f32 = 65.5;
const ACCEL_SENS: f32 = 4096.0;

/// 10 s of +/-30 deg roll at 0.5 Hz, sampled near 1 kHz with jitter
fn synthesize(path: &str) -> Result<(), Box<dyn Error>> {
    let mut rng = Pcg64::seed_from_u64(1);
    let mut writer = csv::Writer::from_path(path)?;
    let mut time_us = 0u32;

    while time_us < 10_000_000 {
        let t = time_us as f32 / 1_000_000.0;
        let roll = (30.0 * (PI * t).sin()).to_radians();
        let roll_rate = 30.0 * PI * (PI * t).cos(); // deg/s

        let mut accel_y = (roll.sin() * ACCEL_SENS) as i32 + rng.random_range(-30..=30);
        if rng.random_range(0..200) == 0 {
            accel_y = 32_767; // ADC glitch
        }

        writer.serialize(RawRecord {
            time_us,
            gyro_x: (roll_rate * GYRO_SENS) as i32 + rng.random_range(-15..=15),
            gyro_y: rng.random_range(-15..=15),
            gyro_z: rng.random_range(-15..=15),
            accel_x: rng.random_range(-30..=30),
            accel_y,
            accel_z: (roll.cos() * ACCEL_SENS) as i32 + rng.random_range(-30..=30),
        })?;

        time_us += rng.random_range(900..=1100);
    }

    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            println!("No log given, writing a synthetic roll sweep to {SYNTHETIC_PATH}");
            synthesize(SYNTHETIC_PATH)?;
            SYNTHETIC_PATH.to_string()
        }
    };

    let mut reader = csv::Reader::from_path(&path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: RawRecord = result?;
        records.push(record);
    }
    let Some(first) = records.first() else {
        return Err(format!("{path} holds no samples").into());
    };

    let clock = ReplayClock::default();
    clock.0.set(first.time_us);
    let mut imu = Imu::new(ReplayDriver::default(), clock.clone(), ImuSettings::default())?;
    imu.start();

    println!("Replaying {} samples from {path}", records.len());

    let mut times = Vec::with_capacity(records.len());
    let mut angles = Vec::with_capacity(records.len());
    let mut gyro_angles = Vec::with_capacity(records.len());
    let mut gyro_only = 0usize;
    let mut skipped = 0usize;

    for (i, record) in records.iter().enumerate() {
        clock.0.set(record.time_us);
        imu.driver_mut().row = *record;

        match imu.update() {
            Update::Processed(FusionStep::GyroOnly) => gyro_only += 1,
            Update::Processed(FusionStep::Skipped) => skipped += 1,
            _ => {}
        }

        let state = imu.snapshot();
        times.push(record.time_us.wrapping_sub(first.time_us) as f32 / 1_000_000.0);
        angles.push(state.angles);
        gyro_angles.push(state.gyro_angles);

        if i % 1000 == 0 {
            println!(
                "Sample {}: angles=({:.1}°,{:.1}°,{:.1}°) rates=({:.1},{:.1},{:.1}) deg/s",
                i,
                state.angles.x,
                state.angles.y,
                state.angles.z,
                state.rates.x,
                state.rates.y,
                state.rates.z
            );
        }
    }

    let state = imu.snapshot();
    println!(
        "Done: {} gyro-only steps, {} skipped steps, max gyro {:.1} deg/s, max accel {:.2} g, max loop {} us",
        gyro_only, skipped, state.gyro_max, state.accel_max, state.max_loop_time_us
    );

    plot(&times, &angles, &gyro_angles)?;
    println!("✓ Plot saved to replay.png");
    Ok(())
}

/// Fused Euler angles on top, fused roll against the gyro-only roll below
fn plot(
    times: &[f32],
    angles: &[Vector3<f32>],
    gyro_angles: &[Vector3<f32>],
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new("replay.png", (1000, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(480);

    let end = times.last().copied().unwrap_or(1.0);

    let mut euler_chart = ChartBuilder::on(&upper)
        .caption("Fused Euler Angles", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..end, -180f32..180f32)?;
    euler_chart.configure_mesh().y_desc("Degrees").draw()?;

    for (axis, label, color) in [(0, "Roll", RED), (1, "Pitch", GREEN), (2, "Yaw", BLUE)] {
        euler_chart
            .draw_series(LineSeries::new(
                times.iter().zip(angles).map(|(t, a)| (*t, a[axis])),
                &color,
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
    }
    euler_chart.configure_series_labels().draw()?;

    let mut roll_chart = ChartBuilder::on(&lower)
        .caption("Roll: fused vs gyro-only", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..end, -90f32..90f32)?;
    roll_chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Degrees")
        .draw()?;

    roll_chart
        .draw_series(LineSeries::new(
            times.iter().zip(angles).map(|(t, a)| (*t, a.x)),
            &RED,
        ))?
        .label("Fused")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], RED));
    roll_chart
        .draw_series(LineSeries::new(
            times.iter().zip(gyro_angles).map(|(t, a)| (*t, a.x)),
            &BLACK,
        ))?
        .label("Gyro only")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLACK));
    roll_chart.configure_series_labels().draw()?;

    root.present()?;
    Ok(())
}
