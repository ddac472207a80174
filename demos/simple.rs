use std::cell::Cell;
use std::time::Duration;

use embedded_hal::blocking::delay::DelayMs;
use nalgebra::Vector3;
use quad_imu::{Clock, Imu, ImuDriver, ImuSettings, RawSample};

const LOOP_US: u32 = 1000; // 1 kHz control loop
const YAW_RATE_LSB: i32 = 655; // 10 deg/s at 65.5 LSB per deg/s

/// Stand-in for a real sensor: level, turning slowly about z
struct Turntable;

impl ImuDriver for Turntable {
    fn init(&mut self) {}

    fn read_gyro(&mut self) -> RawSample {
        Vector3::new(0, 0, YAW_RATE_LSB) // replace this with the gyroscope registers
    }

    fn read_accel(&mut self) -> RawSample {
        Vector3::new(0, 0, 4096) // replace this with the accelerometer registers
    }

    fn new_data_available(&mut self) -> bool {
        true
    }
}

/// Clock stepped by the loop instead of wall time
struct LoopClock(Cell<u32>);

impl Clock for LoopClock {
    fn micros(&self) -> u32 {
        self.0.get()
    }

    fn millis(&self) -> u32 {
        self.0.get() / 1000
    }
}

struct Sleep;

impl DelayMs<u32> for Sleep {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}

fn main() {
    let clock = LoopClock(Cell::new(0));
    let Ok(mut imu) = Imu::new(Turntable, clock, ImuSettings::default()) else {
        eprintln!("default settings rejected");
        return;
    };
    imu.init(&mut Sleep);

    for i in 1..=2000 {
        // this loop should repeat once per control-loop iteration
        let now = imu.clock().micros();
        imu.clock().0.set(now + LOOP_US);
        imu.update();

        if i % 250 == 0 {
            let angles = imu.angles();
            println!(
                "t = {:.2} s  Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}",
                i as f32 / 1000.0,
                angles.x,
                angles.y,
                angles.z
            );
        }
    }
}
