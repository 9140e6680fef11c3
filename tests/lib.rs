//! Tests for core types

use critmass::{BoundingBox, TrackerFix};

#[test]
fn test_tracker_fix_validity() {
    assert!(TrackerFix::new("a", 53.55, 9.99).is_valid());
    assert!(TrackerFix::new("edge", -90.0, 180.0).is_valid());
    assert!(!TrackerFix::new("lat", 90.5, 9.99).is_valid());
    assert!(!TrackerFix::new("lon", 53.55, -180.5).is_valid());
    assert!(!TrackerFix::new("nan", f64::NAN, 9.99).is_valid());
    assert!(!TrackerFix::new("inf", 53.55, f64::INFINITY).is_valid());
}

#[test]
fn test_tracker_fix_timestamp() {
    let fix = TrackerFix::new("a", 53.55, 9.99);
    assert_eq!(fix.timestamp, None);
    assert_eq!(fix.with_timestamp(42).timestamp, Some(42));
}

#[test]
fn test_tracker_fix_serde() {
    let fix = TrackerFix::new("a", 53.55, 9.99);
    let json = serde_json::to_string(&fix).unwrap();
    assert!(!json.contains("timestamp"));

    let back: TrackerFix = serde_json::from_str(&json).unwrap();
    assert_eq!(back, fix);
}

#[test]
fn test_bounding_box_from_fixes() {
    let fixes = vec![
        TrackerFix::new("a", 53.50, 9.95),
        TrackerFix::new("b", 53.60, 10.05),
        TrackerFix::new("c", 53.55, 9.90),
    ];
    let bounds = BoundingBox::from_fixes(&fixes).unwrap();
    assert_eq!(bounds, BoundingBox::new(53.50, 53.60, 9.90, 10.05));
    assert!(BoundingBox::from_fixes(&[]).is_none());
}

#[test]
fn test_bounding_box_contains_inclusive() {
    let bounds = BoundingBox::new(53.0, 54.0, 9.0, 10.0);
    assert!(bounds.contains(53.0, 9.0));
    assert!(bounds.contains(54.0, 10.0));
    assert!(!bounds.contains(54.0001, 9.5));
}

#[test]
fn test_bounding_box_degenerate() {
    let inverted = BoundingBox::new(54.0, 53.0, 9.0, 10.0);
    assert!(inverted.is_empty());
    assert!(!inverted.contains(53.5, 9.5));

    let point = BoundingBox::new(53.5, 53.5, 9.5, 9.5);
    assert!(!point.is_empty());
    assert!(point.contains(53.5, 9.5));
    assert_eq!(point.center(), (53.5, 9.5));
}
