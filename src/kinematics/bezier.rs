//! Planar Bezier curves for foot trajectories.
//!
//! Curves live in the body (x, z) plane of one leg: `x` is the forward axis and the
//! curve's second coordinate is the foot height. At most three control points are
//! kept, which covers the straight stance line and the quadratic swing arc.
use core::fmt::{self, Write};

use heapless::Vec;
use log::warn;
use micromath::F32Ext;

use crate::error::CurveError;

pub const MAX_CONTROL_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(&self, other: &Point2, t: f32) -> Point2 {
        Point2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn distance(&self, other: &Point2) -> f32 {
        let (dx, dy) = (other.x - self.x, other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BezierCurve {
    points: Vec<Point2, MAX_CONTROL_POINTS>,
}

impl BezierCurve {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: &[Point2]) -> Result<Self, CurveError> {
        let mut curve = Self::new();
        for p in points {
            curve.add_control_point(p.x, p.y)?;
        }
        Ok(curve)
    }

    /// Quadratic swing arc: lifts the foot by `height` at mid-stride and lands
    /// `stride` ahead of `start`.
    pub fn swing(start: Point2, stride: f32, height: f32) -> Self {
        let mut points = Vec::new();
        // capacity is exactly three points
        let _ = points.push(start);
        let _ = points.push(Point2::new(start.x + stride / 2.0, start.y + 2.0 * height));
        let _ = points.push(Point2::new(start.x + stride, start.y));
        Self { points }
    }

    /// Straight ground line moving the foot back by `distance`.
    pub fn stance(start: Point2, distance: f32) -> Self {
        let mut points = Vec::new();
        let _ = points.push(start);
        let _ = points.push(Point2::new(start.x - distance, start.y));
        Self { points }
    }

    pub fn add_control_point(&mut self, x: f32, y: f32) -> Result<(), CurveError> {
        self.points
            .push(Point2::new(x, y))
            .map_err(|_| CurveError::Full(MAX_CONTROL_POINTS))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn first(&self) -> Option<Point2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point2> {
        self.points.last().copied()
    }

    /// Point at `t` in [0, 1] (clamped) by repeated linear interpolation.
    pub fn try_evaluate(&self, t: f32) -> Result<Point2, CurveError> {
        if self.points.is_empty() {
            return Err(CurveError::Degenerate);
        }
        let t = t.clamp(0.0, 1.0);
        let mut work: Vec<Point2, MAX_CONTROL_POINTS> = self.points.clone();
        for level in (1..work.len()).rev() {
            for i in 0..level {
                work[i] = work[i].lerp(&work[i + 1], t);
            }
        }
        Ok(work[0])
    }

    /// Like [`BezierCurve::try_evaluate`], but an empty curve yields the origin.
    pub fn evaluate(&self, t: f32) -> Point2 {
        self.try_evaluate(t).unwrap_or_else(|_| {
            warn!("[BEZIER] evaluating a curve without control points");
            Point2::default()
        })
    }

    /// Polyline length through `samples + 1` evenly spaced points.
    pub fn arc_length(&self, samples: u16) -> f32 {
        if self.points.is_empty() || samples == 0 {
            return 0.0;
        }
        let mut length = 0.0;
        let mut prev = self.evaluate(0.0);
        for i in 1..=samples {
            let next = self.evaluate(i as f32 / samples as f32);
            length += prev.distance(&next);
            prev = next;
        }
        length
    }
}

/// Writes `samples + 1` lines of `x z` (two decimals) sampled along `curve`.
pub fn export_trajectory<W: Write>(
    curve: &BezierCurve,
    samples: u16,
    out: &mut W,
) -> Result<(), CurveError> {
    if curve.is_empty() {
        return Err(CurveError::Degenerate);
    }
    let samples = samples.max(1);
    for i in 0..=samples {
        let p = curve.evaluate(i as f32 / samples as f32);
        // a failing writer only truncates the dump
        if writeln!(out, "{:.2} {:.2}", p.x, p.y).is_err() {
            warn!("[BEZIER] trajectory export truncated at sample {i}");
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    fn close(a: Point2, b: Point2) -> bool {
        a.distance(&b) < 1e-4
    }

    #[test]
    fn empty_curve_defaults_to_origin() {
        let curve = BezierCurve::new();
        assert_eq!(curve.evaluate(0.3), Point2::new(0.0, 0.0));
        assert_eq!(curve.try_evaluate(0.3), Err(CurveError::Degenerate));
        assert_eq!(curve.arc_length(10), 0.0);
    }

    #[test]
    fn single_point_is_constant() {
        let curve = BezierCurve::from_points(&[Point2::new(4.0, -2.0)]).unwrap();
        assert_eq!(curve.evaluate(0.0), Point2::new(4.0, -2.0));
        assert_eq!(curve.evaluate(0.7), Point2::new(4.0, -2.0));
    }

    #[test]
    fn endpoints_are_interpolated() {
        let curve = BezierCurve::swing(Point2::new(70.0, -70.0), 40.0, 15.0);
        assert!(close(curve.evaluate(0.0), Point2::new(70.0, -70.0)));
        assert!(close(curve.evaluate(1.0), Point2::new(110.0, -70.0)));
        // quadratic peak reaches half of the control point lift
        assert!(close(curve.evaluate(0.5), Point2::new(90.0, -55.0)));
    }

    #[test]
    fn fourth_point_is_rejected() {
        let mut curve = BezierCurve::new();
        for i in 0..3 {
            curve.add_control_point(i as f32, 0.0).unwrap();
        }
        assert_eq!(curve.add_control_point(3.0, 0.0), Err(CurveError::Full(3)));
        assert_eq!(curve.len(), 3);
    }

    #[test]
    fn parameter_is_clamped() {
        let curve = BezierCurve::stance(Point2::new(10.0, -5.0), 10.0);
        assert!(close(curve.evaluate(-1.0), Point2::new(10.0, -5.0)));
        assert!(close(curve.evaluate(2.0), Point2::new(0.0, -5.0)));
    }

    #[test]
    fn straight_line_length() {
        let curve = BezierCurve::stance(Point2::new(0.0, 0.0), 40.0);
        assert!((curve.arc_length(8) - 40.0).abs() < 1e-3);
        let arc = BezierCurve::swing(Point2::new(0.0, 0.0), 40.0, 15.0);
        assert!(arc.arc_length(20) > 40.0);
    }

    #[test]
    fn export_writes_one_line_per_sample() {
        let curve = BezierCurve::stance(Point2::new(1.0, 2.0), 1.0);
        let mut out = String::new();
        export_trajectory(&curve, 4, &mut out).unwrap();
        let lines: std::vec::Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "1.00 2.00");
        assert_eq!(lines[2], "0.50 2.00");
        assert_eq!(lines[4], "0.00 2.00");

        assert_eq!(
            export_trajectory(&BezierCurve::new(), 4, &mut String::new()),
            Err(CurveError::Degenerate)
        );
    }
}
