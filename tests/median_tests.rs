use quad_imu::{LowPassFilter, MEDIAN_WINDOW, MedianFilter};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_pcg::Pcg64;

fn sorted_median(window: &[i32]) -> i32 {
    let mut sorted = window.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

/// For any sequence, the filter output equals the median of the last 11 samples
#[test]
fn test_median_matches_sort_reference() {
    for seed in 0..20 {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut filter = MedianFilter::<MEDIAN_WINDOW>::new(0);
        let mut history = vec![0; MEDIAN_WINDOW];

        // narrow ranges force duplicates, wide ranges force reordering
        let span = if seed % 2 == 0 { 5 } else { 40_000 };
        for _ in 0..2_000 {
            let sample = rng.random_range(-span..=span);
            filter.insert(sample);
            history.push(sample);

            let window = &history[history.len() - MEDIAN_WINDOW..];
            assert_eq!(filter.median(), sorted_median(window));
            assert!(filter.window().eq(window.iter().copied()));
        }
    }
}

/// Extreme values never corrupt the ordering
#[test]
fn test_median_with_extreme_values() {
    let mut rng = Pcg64::seed_from_u64(99);
    let mut filter = MedianFilter::<MEDIAN_WINDOW>::new(0);
    let mut history = vec![0; MEDIAN_WINDOW];

    for _ in 0..1_000 {
        let sample = match rng.random_range(0..4) {
            0 => i32::MIN,
            1 => i32::MAX,
            _ => rng.random(),
        };
        filter.insert(sample);
        history.push(sample);
        assert_eq!(
            filter.median(),
            sorted_median(&history[history.len() - MEDIAN_WINDOW..])
        );
    }
}

/// A single spike in a steady signal never reaches the output
#[test]
fn test_single_spike_rejected() {
    let mut filter = MedianFilter::<MEDIAN_WINDOW>::new(4096);
    for i in 0..100 {
        let sample = if i == 50 { 32_767 } else { 4096 };
        filter.insert(sample);
        assert_eq!(filter.median(), 4096);
    }
}

/// Constant input converges within a number of steps proportional to rc
#[test]
fn test_low_pass_converges_for_jittery_dt() {
    let mut rng = Pcg64::seed_from_u64(3);
    let mut filter = LowPassFilter::new(80.0);
    let target = Vector3::new(-120.0, 45.0, 300.0);

    let mut elapsed = 0.0;
    while elapsed < 30.0 * filter.rc() {
        let dt = rng.random_range(0.0008..0.0012);
        filter.update(target, dt);
        elapsed += dt;
    }

    assert!((filter.output() - target).norm() < 1e-2);
}
