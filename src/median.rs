//! Sliding-window median filter for outlier rejection

use nalgebra::Vector3;

use crate::types::{MEDIAN_WINDOW, RawSample};

/// Fixed-size sliding-window median over integer samples
///
/// Keeps the window twice: in arrival order (a ring, to know which sample
/// leaves) and sorted (to read the median in O(1)). Both positions touched
/// by an insert are found by binary search.
///
/// The window starts filled with a seed value, so [`median`](Self::median)
/// is defined from the first call.
///
/// # Example
/// ```
/// use quad_imu::MedianFilter;
///
/// let mut filter = MedianFilter::<5>::new(0);
/// for sample in [10, 12, 9000, 11, 13] {
///     filter.insert(sample);
/// }
/// assert_eq!(filter.median(), 12); // the 9000 spike is rejected
/// ```
#[derive(Debug, Clone)]
pub struct MedianFilter<const N: usize> {
    ring: [i32; N],
    sorted: [i32; N],
    head: usize,
}

impl<const N: usize> MedianFilter<N> {
    const ODD_WINDOW: () = assert!(N % 2 == 1, "median window size must be odd");

    /// Creates a filter whose window is filled with `seed`
    pub fn new(seed: i32) -> Self {
        let () = Self::ODD_WINDOW;

        Self {
            ring: [seed; N],
            sorted: [seed; N],
            head: 0,
        }
    }

    /// Pushes a sample, evicting the oldest one
    pub fn insert(&mut self, sample: i32) {
        let evicted = core::mem::replace(&mut self.ring[self.head], sample);
        self.head = (self.head + 1) % N;

        // Any index holding the evicted value will do, equal values are interchangeable
        let (Ok(mut slot) | Err(mut slot)) = self.sorted.binary_search(&evicted);

        // Slide the gap left to right until `sample` fits
        while slot > 0 && self.sorted[slot - 1] > sample {
            self.sorted[slot] = self.sorted[slot - 1];
            slot -= 1;
        }
        while slot + 1 < N && self.sorted[slot + 1] < sample {
            self.sorted[slot] = self.sorted[slot + 1];
            slot += 1;
        }
        self.sorted[slot] = sample;
    }

    /// Middle value of the current window
    pub fn median(&self) -> i32 {
        self.sorted[N / 2]
    }

    /// Current window in arrival order, oldest first
    pub fn window(&self) -> impl Iterator<Item = i32> + '_ {
        self.ring[self.head..]
            .iter()
            .chain(self.ring[..self.head].iter())
            .copied()
    }

    /// Refills the window with `seed`
    pub fn reset(&mut self, seed: i32) {
        self.ring = [seed; N];
        self.sorted = [seed; N];
        self.head = 0;
    }
}

/// One median filter per accelerometer axis, sharing the window size
#[derive(Debug, Clone)]
pub struct AxisMedian {
    x: MedianFilter<MEDIAN_WINDOW>,
    y: MedianFilter<MEDIAN_WINDOW>,
    z: MedianFilter<MEDIAN_WINDOW>,
}

impl AxisMedian {
    pub fn new(seed: i32) -> Self {
        Self {
            x: MedianFilter::new(seed),
            y: MedianFilter::new(seed),
            z: MedianFilter::new(seed),
        }
    }

    pub fn insert(&mut self, sample: RawSample) {
        self.x.insert(sample.x);
        self.y.insert(sample.y);
        self.z.insert(sample.z);
    }

    pub fn median(&self) -> RawSample {
        Vector3::new(self.x.median(), self.y.median(), self.z.median())
    }

    pub fn reset(&mut self, seed: i32) {
        self.x.reset(seed);
        self.y.reset(seed);
        self.z.reset(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_median<const N: usize>(filter: &MedianFilter<N>) -> i32 {
        let mut window = [0; N];
        for (slot, value) in window.iter_mut().zip(filter.window()) {
            *slot = value;
        }
        window.sort_unstable();
        window[N / 2]
    }

    #[test]
    fn test_seeded_window() {
        let filter = MedianFilter::<11>::new(-7);
        assert_eq!(filter.median(), -7);
        assert!(filter.window().all(|v| v == -7));
    }

    #[test]
    fn test_spike_rejection() {
        let mut filter = MedianFilter::<11>::new(0);
        for _ in 0..11 {
            filter.insert(4096);
        }
        filter.insert(i32::MAX);
        filter.insert(i32::MIN);
        assert_eq!(filter.median(), 4096);
    }

    #[test]
    fn test_matches_sorted_reference() {
        let mut filter = MedianFilter::<11>::new(0);
        // deterministic scramble with duplicates and sign changes
        let mut value: i32 = 17;
        for _ in 0..500 {
            value = value.wrapping_mul(1103515245).wrapping_add(12345) % 97 - 48;
            filter.insert(value);
            assert_eq!(filter.median(), reference_median(&filter));
        }
    }

    #[test]
    fn test_window_order_and_eviction() {
        let mut filter = MedianFilter::<3>::new(0);
        filter.insert(1);
        filter.insert(2);
        filter.insert(3);
        filter.insert(4);
        let mut window = filter.window();
        assert_eq!(window.next(), Some(2));
        assert_eq!(window.next(), Some(3));
        assert_eq!(window.next(), Some(4));
        assert_eq!(window.next(), None);
        assert_eq!(filter.median(), 3);
    }

    #[test]
    fn test_axis_median_is_independent_per_axis() {
        let mut median = AxisMedian::new(0);
        for i in 0..MEDIAN_WINDOW as i32 {
            median.insert(Vector3::new(i, -i, 100));
        }
        assert_eq!(median.median(), Vector3::new(5, -5, 100));

        median.reset(1);
        assert_eq!(median.median(), Vector3::new(1, 1, 1));
    }
}
