//! Port candidate locations

use std::ops::{BitOr, BitOrAssign};

use crate::types::{Point, pt};

/// Which kinds of locations a port may snap to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortMode(u32);

impl PortMode {
    pub const NONE: PortMode = PortMode(0);
    pub const CENTER: PortMode = PortMode(1);
    /// The shape's own vertices
    pub const SHAPE: PortMode = PortMode(2);
    /// Midpoints of the edges between vertices
    pub const LINE_MIDDLE: PortMode = PortMode(4);
    pub const SIDE_CENTER: PortMode = PortMode(8);
    pub const SIDE_QUARTER: PortMode = PortMode(16);
    pub const CORNER: PortMode = PortMode(32);
    /// Anywhere on the outline, used when no candidate is close enough
    pub const SHAPE_BORDER: PortMode = PortMode(64);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        PortMode(bits & 127)
    }

    pub const fn contains(self, other: PortMode) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for PortMode {
    type Output = PortMode;

    fn bitor(self, rhs: PortMode) -> PortMode {
        PortMode(self.0 | rhs.0)
    }
}

impl BitOrAssign for PortMode {
    fn bitor_assign(&mut self, rhs: PortMode) {
        self.0 |= rhs.0;
    }
}

/// Candidate locations for `mode`.
///
/// `frame` is (origin, size) of the unit square the relative candidates
/// (center, sides, corners) are scaled into.
pub fn candidates(mode: PortMode, vertices: &[Point], closed: bool, frame: (Point, Point)) -> Vec<Point> {
    let (origin, size) = frame;
    let at = |fx: f64, fy: f64| origin + pt(fx * size.x, fy * size.y);
    let mut out = Vec::new();

    if mode.contains(PortMode::CENTER) {
        out.push(at(0.5, 0.5));
    }
    if mode.contains(PortMode::SHAPE) {
        out.extend_from_slice(vertices);
    }
    if mode.contains(PortMode::LINE_MIDDLE) && vertices.len() > 1 {
        for w in vertices.windows(2) {
            out.push((w[0] + w[1]) * 0.5);
        }
        if closed && vertices.len() > 2 {
            out.push((vertices[vertices.len() - 1] + vertices[0]) * 0.5);
        }
    }
    if mode.contains(PortMode::SIDE_CENTER) {
        out.extend([at(0.5, 0.0), at(1.0, 0.5), at(0.5, 1.0), at(0.0, 0.5)]);
    }
    if mode.contains(PortMode::SIDE_QUARTER) {
        out.extend([
            at(0.25, 0.0),
            at(0.75, 0.0),
            at(1.0, 0.25),
            at(1.0, 0.75),
            at(0.75, 1.0),
            at(0.25, 1.0),
            at(0.0, 0.75),
            at(0.0, 0.25),
        ]);
    }
    if mode.contains(PortMode::CORNER) {
        out.extend([at(0.0, 0.0), at(1.0, 0.0), at(1.0, 1.0), at(0.0, 1.0)]);
    }
    out
}

/// Closest candidate within `tolerance`
pub fn nearest(point: Point, candidates: &[Point], tolerance: f64) -> Option<Point> {
    candidates
        .iter()
        .map(|c| (*c, c.distance(point)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

/// Projection of `point` onto the closest outline segment, if within `tolerance`
pub fn nearest_on_outline(point: Point, outline: &[Point], closed: bool, tolerance: f64) -> Option<Point> {
    let n = outline.len();
    if n == 0 {
        return None;
    }
    let mut segments: Vec<(Point, Point)> = outline.windows(2).map(|w| (w[0], w[1])).collect();
    if closed && n > 2 {
        segments.push((outline[n - 1], outline[0]));
    }
    if segments.is_empty() {
        return nearest(point, outline, tolerance);
    }
    let projections: Vec<Point> = segments
        .into_iter()
        .map(|(a, b)| {
            let ab = b - a;
            let len_sq = ab.length_squared();
            if len_sq == 0.0 {
                a
            } else {
                a + ab * ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0)
            }
        })
        .collect();
    nearest(point, &projections, tolerance)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::defaults::PORT_SNAP_RADIUS;
    use crate::graph::ItemFrame;
    use crate::shape::{RectangleShape, Shape};

    fn attached_rectangle() -> RectangleShape {
        let mut r = RectangleShape::new();
        r.set_item(Rc::new(ItemFrame::new(3000.0, 2000.0)));
        r.evaluate();
        r
    }

    #[test]
    fn mode_flags_combine() {
        let mode = PortMode::CENTER | PortMode::CORNER;
        assert!(mode.contains(PortMode::CENTER));
        assert!(!mode.contains(PortMode::SHAPE));
        assert!(!mode.contains(PortMode::NONE));
        assert_eq!(PortMode::from_bits(mode.bits()), mode);
    }

    #[test]
    fn candidates_scale_to_item_size() {
        let r = attached_rectangle();
        let locations = r.valid_port_locations(PortMode::CENTER | PortMode::SIDE_CENTER);
        assert_eq!(
            locations,
            vec![
                pt(1500.0, 1000.0),
                pt(1500.0, 0.0),
                pt(3000.0, 1000.0),
                pt(1500.0, 2000.0),
                pt(0.0, 1000.0)
            ]
        );
        assert_eq!(r.valid_port_locations(PortMode::SIDE_QUARTER).len(), 8);
        assert_eq!(r.valid_port_locations(PortMode::LINE_MIDDLE).len(), 4);
    }

    #[test]
    fn snaps_to_nearest_candidate() {
        let r = attached_rectangle();
        let mode = PortMode::CORNER | PortMode::CENTER;
        assert_eq!(
            r.valid_port_location(pt(2950.0, 60.0), mode, PORT_SNAP_RADIUS),
            Some(pt(3000.0, 0.0))
        );
        assert_eq!(r.valid_port_location(pt(2000.0, 50.0), mode, PORT_SNAP_RADIUS), None);
    }

    #[test]
    fn falls_back_to_outline() {
        let r = attached_rectangle();
        let mode = PortMode::CORNER | PortMode::SHAPE_BORDER;
        assert_eq!(
            r.valid_port_location(pt(2000.0, 50.0), mode, PORT_SNAP_RADIUS),
            Some(pt(2000.0, 0.0))
        );
    }
}
