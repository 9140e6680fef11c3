//! Tests for stats module

use critmass::stats::{median, scaled_mad, MAD_SCALE};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_median_odd_and_even() {
    assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    assert_eq!(median(&[7.0]), Some(7.0));
    assert_eq!(median(&[]), None);
}

#[test]
fn test_median_does_not_reorder_input() {
    let values = vec![5.0, 1.0, 4.0];
    let _ = median(&values);
    assert_eq!(values, vec![5.0, 1.0, 4.0]);
}

#[test]
fn test_scaled_mad() {
    // Deviations from 3: 2, 1, 0, 1, 2 -> median 1
    let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    let mad = scaled_mad(&values, 3.0).unwrap();
    assert!(approx_eq(mad, MAD_SCALE, 1e-12));
}

#[test]
fn test_scaled_mad_resists_outliers() {
    let values = [10.0, 10.0, 10.0, 10.0, 5000.0];
    assert_eq!(scaled_mad(&values, 10.0), Some(0.0));
    assert_eq!(scaled_mad(&[], 0.0), None);
}
