//! Bezier evaluation and control-point derivation

use crate::defaults::{CUBIC_STEPS, QUADRATIC_STEPS, STRAIGHT_AXIS_EPSILON};
use crate::types::Point;

/// Point on a cubic bezier at parameter `t`
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

/// Point on a quadratic bezier at parameter `t`
pub fn quadratic_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// True if all control polygon points line up on one axis closely enough
/// that subdivision would only produce a straight line
pub fn is_straight(points: &[Point]) -> bool {
    let spread = |axis: fn(&Point) -> f64| {
        let (lo, hi) = points
            .iter()
            .map(axis)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    };
    spread(|p| p.x) < STRAIGHT_AXIS_EPSILON || spread(|p| p.y) < STRAIGHT_AXIS_EPSILON
}

/// Append the cubic segment `p0`..`p3`, excluding `p0`
pub fn push_cubic(out: &mut Vec<Point>, p0: Point, p1: Point, p2: Point, p3: Point) {
    if is_straight(&[p0, p1, p2, p3]) {
        out.push(p3);
        return;
    }
    for k in 1..=CUBIC_STEPS {
        out.push(cubic_point(p0, p1, p2, p3, k as f64 / CUBIC_STEPS as f64));
    }
}

/// Append the quadratic segment `p0`..`p2`, excluding `p0`
pub fn push_quadratic(out: &mut Vec<Point>, p0: Point, p1: Point, p2: Point) {
    if is_straight(&[p0, p1, p2]) {
        out.push(p2);
        return;
    }
    for k in 1..=QUADRATIC_STEPS {
        out.push(quadratic_point(p0, p1, p2, k as f64 / QUADRATIC_STEPS as f64));
    }
}

/// Flatten a chain of cubic segments into a point list.
///
/// Segment `i` runs from `points[i]` through `cp_to[i]` and `cp_from[i + 1]`
/// to `points[i + 1]`; closed chains add a wrapping segment back to the
/// first point. Missing control points default to their vertex.
pub fn interpolate_curve(points: &[Point], cp_to: &[Point], cp_from: &[Point], closed: bool) -> Vec<Point> {
    let n = points.len();
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let segments = if closed && n > 1 { n } else { n - 1 };
    let mut out = Vec::with_capacity(1 + segments * CUBIC_STEPS);
    out.push(first);
    for i in 0..segments {
        let j = (i + 1) % n;
        let c1 = cp_to.get(i).copied().unwrap_or(points[i]);
        let c2 = cp_from.get(j).copied().unwrap_or(points[j]);
        push_cubic(&mut out, points[i], c1, c2, points[j]);
    }
    out
}

/// Smoothed control pair for vertex `i`: `P +/- factor * (next - prev)`.
///
/// Open chains clamp the missing neighbour at either end to the vertex itself.
pub fn smooth_control_points(points: &[Point], i: usize, closed: bool, factor: f64) -> (Point, Point) {
    let n = points.len();
    let p = points[i];
    let prev = match i {
        0 if closed => points[n - 1],
        0 => p,
        _ => points[i - 1],
    };
    let next = if i + 1 < n {
        points[i + 1]
    } else if closed {
        points[0]
    } else {
        p
    };
    let d = (next - prev) * factor;
    (p + d, p - d)
}

/// Fill in control points for every vertex beyond the ones already supplied
pub fn init_control_points(
    points: &[Point],
    cp_to: &mut Vec<Point>,
    cp_from: &mut Vec<Point>,
    closed: bool,
    factor: f64,
) {
    for i in cp_to.len()..points.len() {
        cp_to.push(smooth_control_points(points, i, closed, factor).0);
    }
    for i in cp_from.len()..points.len() {
        cp_from.push(smooth_control_points(points, i, closed, factor).1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::SMOOTHING_FACTOR;
    use crate::types::pt;

    #[test]
    fn single_cubic_segment_subdivides() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.0)];
        let cp_to = [pt(0.0, 50.0), pt(100.0, 0.0)];
        let cp_from = [pt(0.0, 0.0), pt(100.0, 50.0)];
        let out = interpolate_curve(&points, &cp_to, &cp_from, false);
        assert_eq!(out.len(), 11);
        assert_eq!(out[0], pt(0.0, 0.0));
        assert_eq!(out[5], pt(50.0, 37.5));
        assert_eq!(out[10], pt(100.0, 0.0));
    }

    #[test]
    fn straight_segments_emit_endpoint_only() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.5)];
        let out = interpolate_curve(&points, &[pt(30.0, 0.0)], &[pt(0.0, 0.0), pt(70.0, 0.2)], false);
        assert_eq!(out, vec![pt(0.0, 0.0), pt(100.0, 0.5)]);
    }

    #[test]
    fn closed_curve_wraps() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
        let (mut cp_to, mut cp_from) = (Vec::new(), Vec::new());
        init_control_points(&points, &mut cp_to, &mut cp_from, true, SMOOTHING_FACTOR);
        let out = interpolate_curve(&points, &cp_to, &cp_from, true);
        assert_eq!(out.first(), out.last());
        assert_eq!(out.len(), 1 + 3 * CUBIC_STEPS);
    }

    #[test]
    fn smoothing_uses_neighbour_chord() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
        let (cp_to, cp_from) = smooth_control_points(&points, 1, true, SMOOTHING_FACTOR);
        assert_eq!(cp_to, pt(120.0, 20.0));
        assert_eq!(cp_from, pt(80.0, -20.0));
    }

    #[test]
    fn open_chain_clamps_ends() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.0)];
        let (cp_to, cp_from) = smooth_control_points(&points, 0, false, SMOOTHING_FACTOR);
        assert_eq!(cp_to, pt(20.0, 0.0));
        assert_eq!(cp_from, pt(-20.0, 0.0));
    }

    #[test]
    fn init_keeps_supplied_control_points() {
        let points = [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)];
        let mut cp_to = vec![pt(1.0, 1.0)];
        let mut cp_from = Vec::new();
        init_control_points(&points, &mut cp_to, &mut cp_from, false, SMOOTHING_FACTOR);
        assert_eq!(cp_to.len(), 3);
        assert_eq!(cp_to[0], pt(1.0, 1.0));
        assert_eq!(cp_from.len(), 3);
    }

    #[test]
    fn quadratic_midpoint() {
        assert_eq!(quadratic_point(pt(0.0, 0.0), pt(50.0, 100.0), pt(100.0, 0.0), 0.5), pt(50.0, 50.0));
    }
}
