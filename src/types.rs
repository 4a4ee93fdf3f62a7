//! Geometric primitives shared by coordinates and shapes.
//!
//! Points are glam `DVec2`s in the owning item's local frame (1/100 mm).

use glam::DVec2;

/// A 2D point or displacement in an item's local frame
pub type Point = DVec2;

/// Shorthand constructor used throughout the geometry code
#[inline]
pub fn pt(x: f64, y: f64) -> Point {
    DVec2::new(x, y)
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: pt(f64::MAX, f64::MAX),
            max: pt(f64::MIN, f64::MIN),
        }
    }

    /// Bounding box of a point slice; empty for an empty slice
    pub fn from_points(points: &[Point]) -> Self {
        let mut bbox = BBox::new();
        for p in points {
            bbox.expand_point(*p);
        }
        bbox
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: Point) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment test, widened by `tolerance` on every side
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        !self.is_empty()
            && p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Even-odd point-in-polygon test over an implicitly closed ring
pub fn point_in_polygon(p: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Smallest distance from `p` to a polyline, optionally closing the ring
pub fn distance_to_polyline(p: Point, points: &[Point], closed: bool) -> f64 {
    match points.len() {
        0 => f64::INFINITY,
        1 => p.distance(points[0]),
        n => {
            let mut best = f64::INFINITY;
            for w in points.windows(2) {
                best = best.min(distance_to_segment(p, w[0], w[1]));
            }
            if closed {
                best = best.min(distance_to_segment(p, points[n - 1], points[0]));
            }
            best
        }
    }
}
