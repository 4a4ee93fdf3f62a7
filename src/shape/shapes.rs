//! Straight-edged shapes and the ellipse

use super::curve::{interpolate_curve, smooth_control_points};
use super::{Shape, ShapeCore};
use crate::coord::{Coord, Coordinate, PointSource};
use crate::defaults::KAPPA;
use crate::persist::Writer;
use crate::types::Point;

fn literal_coords(points: &[Point]) -> Vec<Coord> {
    points.iter().map(|p| Coord::from_point(*p)).collect()
}

/// Four corners tracking the item size
#[derive(Debug, Clone)]
pub struct RectangleShape {
    core: ShapeCore,
}

impl Default for RectangleShape {
    fn default() -> Self {
        Self::new()
    }
}

impl RectangleShape {
    pub fn new() -> Self {
        Self::from_coordinates(
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
                .into_iter()
                .map(|(fx, fy)| Coordinate::from_relative(fx, fy).into())
                .collect(),
        )
    }

    pub fn from_coordinates(coords: Vec<Coord>) -> Self {
        let mut shape = RectangleShape {
            core: ShapeCore::new(coords),
        };
        shape.refresh();
        shape
    }
}

impl Shape for RectangleShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "rectangle"
    }
}

/// Polyline or polygon through its coordinates
#[derive(Debug, Clone)]
pub struct PolygonShape {
    core: ShapeCore,
    closed: bool,
}

impl PolygonShape {
    pub fn from_coordinates(coords: Vec<Coord>, closed: bool) -> Self {
        let mut shape = PolygonShape {
            core: ShapeCore::new(coords),
            closed,
        };
        shape.refresh();
        shape
    }

    pub fn from_points(points: &[Point], closed: bool) -> Self {
        Self::from_coordinates(literal_coords(points), closed)
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.refresh();
        }
    }
}

impl Shape for PolygonShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "polygon"
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn min_coordinates(&self) -> usize {
        2
    }

    fn save_extra(&self, writer: &mut dyn Writer) {
        writer.write_attribute_string("closed", if self.closed { "1" } else { "0" });
    }
}

/// Open polyline, used for edges
#[derive(Debug, Clone)]
pub struct LineShape {
    core: ShapeCore,
}

impl LineShape {
    pub fn new(start: Point, end: Point) -> Self {
        Self::from_coordinates(literal_coords(&[start, end]))
    }

    pub fn from_coordinates(coords: Vec<Coord>) -> Self {
        let mut shape = LineShape {
            core: ShapeCore::new(coords),
        };
        shape.refresh();
        shape
    }

    /// Replace every vertex as a single edit: one event pair, one refresh
    pub fn set_points(&mut self, points: &[Point]) -> bool {
        self.set_coordinates(literal_coords(points))
    }

    pub fn start(&self) -> Option<Point> {
        self.point_list().first().copied()
    }

    pub fn end(&self) -> Option<Point> {
        self.point_list().last().copied()
    }
}

impl Shape for LineShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "line"
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn min_coordinates(&self) -> usize {
        2
    }
}

/// Ellipse through four cardinal points (top, right, bottom, left)
#[derive(Debug, Clone)]
pub struct EllipseShape {
    core: ShapeCore,
}

impl Default for EllipseShape {
    fn default() -> Self {
        Self::new()
    }
}

impl EllipseShape {
    /// Ellipse inscribed in the owning item
    pub fn new() -> Self {
        Self::from_coordinates(
            [(0.5, 0.0), (1.0, 0.5), (0.5, 1.0), (0.0, 0.5)]
                .into_iter()
                .map(|(fx, fy)| Coordinate::from_relative(fx, fy).into())
                .collect(),
        )
    }

    pub fn from_coordinates(coords: Vec<Coord>) -> Self {
        let mut shape = EllipseShape {
            core: ShapeCore::new(coords),
        };
        shape.refresh();
        shape
    }
}

impl Shape for EllipseShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "ellipse"
    }

    fn min_coordinates(&self) -> usize {
        2
    }

    fn build_point_list(&self) -> Vec<Point> {
        let points: Vec<Point> = self.core.coordinates.iter().map(|c| c.to_point()).collect();
        if points.len() < 2 {
            return points;
        }
        // handles of length KAPPA * radius along the tangent through each cardinal point
        let (cp_to, cp_from): (Vec<Point>, Vec<Point>) = (0..points.len())
            .map(|i| smooth_control_points(&points, i, true, KAPPA / 2.0))
            .unzip();
        interpolate_curve(&points, &cp_to, &cp_from, true)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::graph::ItemFrame;
    use crate::shape::curve::cubic_point;
    use crate::shape::{ShapeEvent, ShapeEventKind, ShapeObserver, Verdict};
    use crate::types::pt;

    #[test]
    fn polygon_open_and_closed_hit_rings() {
        let mut p = PolygonShape::from_points(&[pt(0.0, 0.0), pt(1000.0, 0.0), pt(1000.0, 1000.0)], false);
        assert!(!p.is_closed());
        p.set_closed(true);
        assert!(p.is_closed());
        assert_eq!(p.point_list().len(), 3);
    }

    #[test]
    fn line_set_points_replaces_vertices() {
        let mut line = LineShape::new(pt(0.0, 0.0), pt(10.0, 0.0));
        assert!(line.set_points(&[pt(0.0, 0.0), pt(5.0, 5.0), pt(10.0, 0.0)]));
        assert_eq!(line.point_list().len(), 3);
        assert_eq!(line.end(), Some(pt(10.0, 0.0)));
        assert!(!line.set_points(&[pt(1.0, 1.0)]));
    }

    #[test]
    fn line_set_points_is_one_vetoable_edit() {
        struct Refuse;
        impl ShapeObserver for Refuse {
            fn before_change(&self, event: &ShapeEvent) -> Verdict {
                assert_eq!(event.kind, ShapeEventKind::CoordinatesSet);
                Verdict::Cancel
            }
        }

        let mut line = LineShape::new(pt(0.0, 0.0), pt(10.0, 0.0));
        line.add_observer(Rc::new(Refuse));
        assert!(!line.set_points(&[pt(0.0, 0.0), pt(5.0, 5.0), pt(10.0, 0.0)]));
        assert_eq!(line.point_list(), &[pt(0.0, 0.0), pt(10.0, 0.0)]);
    }

    #[test]
    fn ellipse_passes_through_quarter_point() {
        let item = Rc::new(ItemFrame::new(200.0, 100.0));
        let mut e = EllipseShape::new();
        e.set_item(item);
        e.evaluate();

        let points = e.point_list();
        assert_eq!(points.len(), 1 + 4 * 10);
        assert_eq!(points[0], pt(100.0, 0.0));
        assert_eq!(points[10], pt(200.0, 50.0));

        // the quarter arc midpoint lies on the ellipse to within the cubic approximation error
        let mid = points[5];
        let n = pt((mid.x - 100.0) / 100.0, (mid.y - 50.0) / 50.0);
        assert!((n.length() - 1.0).abs() < 1e-3);

        let expected = cubic_point(
            pt(100.0, 0.0),
            pt(100.0 + KAPPA * 100.0, 0.0),
            pt(200.0, 50.0 - KAPPA * 50.0),
            pt(200.0, 50.0),
            0.5,
        );
        assert!((mid - expected).length() < 1e-9);
    }

    #[test]
    fn rectangle_tracks_item_size() {
        let item = Rc::new(ItemFrame::new(3000.0, 2000.0));
        let mut r = RectangleShape::new();
        r.set_item(item);
        r.evaluate();
        let bbox = r.bounding_box();
        assert_eq!((bbox.width(), bbox.height()), (3000.0, 2000.0));
    }
}
