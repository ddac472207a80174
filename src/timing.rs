//! Monotonic clock seam, `dt` timers and loop benchmarking

/// Free-running monotonic counters
///
/// Both counters are 32-bit and expected to wrap (about every 71 minutes
/// for microseconds); every difference taken from them uses wrapping
/// subtraction.
pub trait Clock {
    /// Microseconds since an arbitrary epoch
    fn micros(&self) -> u32;

    /// Milliseconds since an arbitrary epoch
    fn millis(&self) -> u32;
}

/// Ticks elapsed from `earlier` to `now` on a wrapping counter
#[inline]
pub fn elapsed(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

/// "Time of last update" for one consumer of `dt`
///
/// Each stage that needs a `dt` owns its own timer so their intervals never
/// interfere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    last_us: u32,
}

impl Timer {
    pub fn new(now_us: u32) -> Self {
        Self { last_us: now_us }
    }

    /// Seconds since the previous lap (or start), then restarts at `now_us`
    pub fn lap(&mut self, now_us: u32) -> f32 {
        let dt = elapsed(now_us, self.last_us);
        self.last_us = now_us;
        dt as f32 / 1_000_000.0
    }

    pub fn restart(&mut self, now_us: u32) {
        self.last_us = now_us;
    }

    /// Timestamp of the last update in microseconds
    pub fn last_us(&self) -> u32 {
        self.last_us
    }
}

/// Interval between successive processing passes, for performance monitoring
///
/// The first few loops after start are slow, so nothing is recorded until
/// a grace period has passed. The first call after the grace period only
/// arms the benchmark.
#[derive(Debug, Clone, Copy)]
pub struct Benchmark {
    started_ms: u32,
    grace_ms: u32,
    last_us: Option<u32>,
    current_us: u32,
    max_us: u32,
}

impl Benchmark {
    pub fn new(now_ms: u32, grace_ms: u32) -> Self {
        Self {
            started_ms: now_ms,
            grace_ms,
            last_us: None,
            current_us: 0,
            max_us: 0,
        }
    }

    /// Records one pass; returns true when a new maximum was set
    pub fn record(&mut self, now_ms: u32, now_us: u32) -> bool {
        if self.last_us.is_none() && elapsed(now_ms, self.started_ms) <= self.grace_ms {
            return false;
        }

        let last = self.last_us.replace(now_us).unwrap_or(now_us);
        self.current_us = elapsed(now_us, last);
        if self.current_us > self.max_us {
            self.max_us = self.current_us;
            true
        } else {
            false
        }
    }

    /// Most recent interval in microseconds
    pub fn current_us(&self) -> u32 {
        self.current_us
    }

    /// Longest interval observed in microseconds
    pub fn max_us(&self) -> u32 {
        self.max_us
    }
}

/// Millisecond rate limiter
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    period_ms: u32,
    last_ms: u32,
}

impl Throttle {
    /// A zero period disables the throttle entirely (never ready)
    pub fn new(now_ms: u32, period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
        }
    }

    /// True at most once per period; restarts the period when it fires
    pub fn ready(&mut self, now_ms: u32) -> bool {
        if self.period_ms == 0 || elapsed(now_ms, self.last_ms) < self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}
