//! Cubic Bézier geometry for shockwave effects
//!
//! A curve is held as its four control points. Flattening works by
//! divide-and-conquer: if the control polygon is nearly as short as the
//! chord, the chord is emitted; otherwise the curve is split at t = 0.5
//! (de Casteljau) and both halves are flattened.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{CURVE_TOLERANCE, MAX_SUBDIVISION_DEPTH};

/// A line segment produced by flattening
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

/// A cubic Bézier curve defined by four control points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub points: [Vec2; 4],
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self {
            points: [p0, p1, p2, p3],
        }
    }

    /// Length around the control polygon
    pub fn polygon_length(&self) -> f32 {
        let q = &self.points;
        q[0].distance(q[1]) + q[1].distance(q[2]) + q[2].distance(q[3])
    }

    /// Direct distance between the first and last control point
    pub fn chord_length(&self) -> f32 {
        self.points[0].distance(self.points[3])
    }

    /// Whether the control polygon is within `tolerance` of its chord
    ///
    /// The tolerance is absolute, so large curves need more subdivision
    /// than small ones to pass.
    pub fn is_straight_enough(&self, tolerance: f32) -> bool {
        (self.polygon_length() - self.chord_length()).abs() <= tolerance
    }

    /// Split at t = 0.5 into halves covering [0, 0.5] and [0.5, 1]
    pub fn subdivide(&self) -> (Self, Self) {
        let q = &self.points;

        let r1 = (q[0] + q[1]) / 2.0;
        let mid = (q[1] + q[2]) / 4.0;
        let r2 = r1 / 2.0 + mid;
        let s2 = (q[2] + q[3]) / 2.0;
        let s1 = mid + s2 / 2.0;
        let split = (r2 + s1) / 2.0;

        (
            Self::new(q[0], r1, r2, split),
            Self::new(split, s1, s2, q[3]),
        )
    }

    /// Evaluate the curve at parameter `t` in [0, 1]
    pub fn evaluate(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        let q = &self.points;
        q[0] * (u * u * u) + q[1] * (3.0 * u * u * t) + q[2] * (3.0 * u * t * t) + q[3] * (t * t * t)
    }

    /// Flatten with the default tolerance and depth cap
    pub fn flatten(&self) -> Vec<Segment> {
        self.flatten_with(CURVE_TOLERANCE, MAX_SUBDIVISION_DEPTH)
    }

    /// Flatten into line segments
    ///
    /// Recursion stops at `max_depth` even if the piece is not yet straight;
    /// the piece is then emitted as its chord.
    pub fn flatten_with(&self, tolerance: f32, max_depth: u32) -> Vec<Segment> {
        let mut out = Vec::new();
        self.flatten_into(tolerance, max_depth, 0, &mut out);
        out
    }

    fn flatten_into(&self, tolerance: f32, max_depth: u32, depth: u32, out: &mut Vec<Segment>) {
        if depth >= max_depth || self.is_straight_enough(tolerance) {
            out.push(Segment {
                start: self.points[0],
                end: self.points[3],
            });
            return;
        }

        let (left, right) = self.subdivide();
        left.flatten_into(tolerance, max_depth, depth + 1, out);
        right.flatten_into(tolerance, max_depth, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Vec2, b: Vec2, eps: f32) -> bool {
        a.distance(b) <= eps
    }

    #[test]
    fn test_collinear_curve_is_one_segment() {
        let curve = CubicBezier::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(3.0, 3.0),
        );
        assert!(curve.is_straight_enough(CURVE_TOLERANCE));

        let segments = curve.flatten();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, Vec2::new(0.0, 0.0));
        assert_eq!(segments[0].end, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_subdivide_shares_midpoint() {
        let curve = CubicBezier::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 40.0),
            Vec2::new(40.0, 40.0),
            Vec2::new(40.0, 0.0),
        );
        let (r, s) = curve.subdivide();
        assert_eq!(r.points[0], curve.points[0]);
        assert_eq!(s.points[3], curve.points[3]);
        assert_eq!(r.points[3], s.points[0]);
        assert!(approx(r.points[3], curve.evaluate(0.5), 1e-4));
    }

    #[test]
    fn test_curved_flatten_is_connected() {
        let curve = CubicBezier::new(
            Vec2::new(-80.0, -20.0),
            Vec2::new(-30.0, 90.0),
            Vec2::new(60.0, -70.0),
            Vec2::new(90.0, 10.0),
        );
        let segments = curve.flatten();
        assert!(segments.len() > 1);
        assert_eq!(segments.first().map(|s| s.start), Some(curve.points[0]));
        assert_eq!(segments.last().map(|s| s.end), Some(curve.points[3]));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_depth_cap_limits_segments() {
        let curve = CubicBezier::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
        );
        // Zero tolerance can never be met by a curved piece
        let segments = curve.flatten_with(0.0, 4);
        assert_eq!(segments.len(), 16);
    }

    proptest! {
        #[test]
        fn prop_halves_reproduce_curve(
            coords in proptest::collection::vec(-100.0f32..100.0, 8),
            t in 0.0f32..=1.0,
        ) {
            let curve = CubicBezier::new(
                Vec2::new(coords[0], coords[1]),
                Vec2::new(coords[2], coords[3]),
                Vec2::new(coords[4], coords[5]),
                Vec2::new(coords[6], coords[7]),
            );
            let (r, s) = curve.subdivide();
            prop_assert!(approx(r.evaluate(t), curve.evaluate(t / 2.0), 1e-2));
            prop_assert!(approx(s.evaluate(t), curve.evaluate(0.5 + t / 2.0), 1e-2));
        }
    }
}
