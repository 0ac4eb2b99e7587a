#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

#[test]
fn point_new() {
    let p = Point::new(3.0, 4.0);
    assert_eq!(p.x, 3.0);
    assert_eq!(p.y, 4.0);
}

#[test]
fn finiteness_checks_both_coordinates() {
    assert!(Point::new(3.0, 4.0).is_finite());
    assert!(!Point::new(f64::INFINITY, 4.0).is_finite());
    assert!(!Point::new(3.0, f64::NEG_INFINITY).is_finite());
    assert!(!Point::new(f64::NAN, 4.0).is_finite());
}

#[test]
fn distance_along_axes() {
    let a = Point::new(0.0, 0.0);
    assert!(approx_eq(a.distance_to(Point::new(5.0, 0.0)), 5.0));
    assert!(approx_eq(a.distance_to(Point::new(0.0, -5.0)), 5.0));
}

#[test]
fn distance_diagonal() {
    let a = Point::new(1.0, 1.0);
    let b = Point::new(4.0, 5.0);
    assert!(approx_eq(a.distance_to(b), 5.0));
}

#[test]
fn lerp_endpoints() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(10.0, 20.0);
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
}

#[test]
fn lerp_midpoint() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(10.0, 20.0);
    let mid = a.lerp(b, 0.5);
    assert!(approx_eq(mid.x, 5.0));
    assert!(approx_eq(mid.y, 10.0));
}

#[test]
fn lerp_clamps_out_of_range() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(10.0, 0.0);
    assert_eq!(a.lerp(b, -1.0), a);
    assert_eq!(a.lerp(b, 2.0), b);
}
