//! Curved shapes: smoothed bezier polygons and bezier polylines

use super::curve::{interpolate_curve, smooth_control_points};
use super::{Shape, ShapeCore, ShapeEvent, ShapeEventKind};
use crate::coord::{BezierCoordinate, Coord, Coordinate, PointSource};
use crate::defaults::SMOOTHING_FACTOR;
use crate::graph::ItemContext;
use crate::log::debug;
use crate::persist::{Reader, Writer};
use crate::types::Point;

/// Closed or open curve with control points held beside the coordinates.
///
/// `cp_to[i]` and `cp_from[i]` always exist for every coordinate `i`;
/// control points not supplied explicitly are derived by smoothing.
#[derive(Debug, Clone)]
pub struct BezierShape {
    core: ShapeCore,
    cp_to: Vec<Coordinate>,
    cp_from: Vec<Coordinate>,
    closed: bool,
}

impl BezierShape {
    pub fn from_points(points: &[Point], closed: bool) -> Self {
        let coords = points.iter().map(|p| Coord::from_point(*p)).collect();
        Self::with_control_points(coords, Vec::new(), Vec::new(), closed)
    }

    /// Build from explicit control points; missing trailing ones are derived
    pub fn with_control_points(
        coords: Vec<Coord>,
        cp_to: Vec<Coordinate>,
        cp_from: Vec<Coordinate>,
        closed: bool,
    ) -> Self {
        let mut shape = BezierShape {
            core: ShapeCore::new(coords),
            cp_to,
            cp_from,
            closed,
        };
        shape.fill_control_points();
        shape.refresh();
        shape
    }

    pub fn set_closed(&mut self, closed: bool) {
        if self.closed != closed {
            self.closed = closed;
            self.refresh();
        }
    }

    pub fn cp_to_at(&self, index: usize) -> Option<&Coordinate> {
        self.cp_to.get(index)
    }

    pub fn cp_from_at(&self, index: usize) -> Option<&Coordinate> {
        self.cp_from.get(index)
    }

    pub fn set_cp_to_at(&mut self, index: usize, cp: Coordinate) -> bool {
        let Some(slot) = self.cp_to.get_mut(index) else {
            return false;
        };
        *slot = cp;
        self.refresh();
        true
    }

    pub fn set_cp_from_at(&mut self, index: usize, cp: Coordinate) -> bool {
        let Some(slot) = self.cp_from.get_mut(index) else {
            return false;
        };
        *slot = cp;
        self.refresh();
        true
    }

    /// Replace coordinates and control points together
    pub fn set_coordinates_with_control_points(
        &mut self,
        coords: Vec<Coord>,
        cp_to: Vec<Coordinate>,
        cp_from: Vec<Coordinate>,
    ) -> bool {
        let closed = self.closed;
        self.set_outline(coords, cp_to, cp_from, closed)
    }

    /// Replace coordinates, control points and the closed flag as one
    /// vetoable edit; observers see the rebuilt point list afterwards
    pub fn set_outline(
        &mut self,
        coords: Vec<Coord>,
        cp_to: Vec<Coordinate>,
        cp_from: Vec<Coordinate>,
        closed: bool,
    ) -> bool {
        if coords.len() < self.min_coordinates() {
            debug!(count = coords.len(), "too few coordinates for shape");
            return false;
        }
        let event = ShapeEvent::new(ShapeEventKind::CoordinatesSet, 0, coords.len());
        if !self.core.before_change(&event) {
            return false;
        }
        let count = coords.len();
        self.core.coordinates = coords;
        self.core.evaluate_range(0..count);
        self.cp_to = cp_to;
        self.cp_from = cp_from;
        self.closed = closed;
        self.fill_control_points();
        if let Some(item) = self.item() {
            self.evaluate_extra(item.as_ref());
        }
        self.refresh();
        self.core.after_change(&event);
        true
    }

    /// Discard every control point and derive them all again
    pub fn init_control_points(&mut self) {
        self.cp_to.clear();
        self.cp_from.clear();
        self.fill_control_points();
        self.refresh();
    }

    fn vertices(&self) -> Vec<Point> {
        self.core.coordinates.iter().map(|c| c.to_point()).collect()
    }

    fn derived(&self, points: &[Point], index: usize) -> (Coordinate, Coordinate) {
        let (to, from) = smooth_control_points(points, index, self.closed, SMOOTHING_FACTOR);
        (Coordinate::from_point(to), Coordinate::from_point(from))
    }

    fn fill_control_points(&mut self) {
        let points = self.vertices();
        let n = points.len();
        self.cp_to.truncate(n);
        self.cp_from.truncate(n);
        for i in self.cp_to.len()..n {
            let (to, _) = self.derived(&points, i);
            self.cp_to.push(to);
        }
        for i in self.cp_from.len()..n {
            let (_, from) = self.derived(&points, i);
            self.cp_from.push(from);
        }
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node, coords: Vec<Coord>) -> Self {
        let list = |tag: &str| -> Vec<Coordinate> {
            reader
                .child(node, tag)
                .map(|wrapper| {
                    reader
                        .children(wrapper)
                        .into_iter()
                        .map(|c| Coordinate::read(reader, c))
                        .collect()
                })
                .unwrap_or_default()
        };
        let closed = reader.attribute(node, "closed") != Some("0");
        Self::with_control_points(coords, list("cpto"), list("cpfrom"), closed)
    }
}

impl Shape for BezierShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "bezier"
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn min_coordinates(&self) -> usize {
        2
    }

    fn build_point_list(&self) -> Vec<Point> {
        let cp_to: Vec<Point> = self.cp_to.iter().map(|c| c.to_point()).collect();
        let cp_from: Vec<Point> = self.cp_from.iter().map(|c| c.to_point()).collect();
        interpolate_curve(&self.vertices(), &cp_to, &cp_from, self.closed)
    }

    fn coordinates_inserted(&mut self, index: usize, count: usize) {
        let points = self.vertices();
        for k in index..index + count {
            let (to, from) = self.derived(&points, k);
            let at = k.min(self.cp_to.len());
            self.cp_to.insert(at, to);
            let at = k.min(self.cp_from.len());
            self.cp_from.insert(at, from);
        }
    }

    fn coordinates_removed(&mut self, index: usize, count: usize) {
        let end = (index + count).min(self.cp_to.len());
        self.cp_to.drain(index.min(end)..end);
        let end = (index + count).min(self.cp_from.len());
        self.cp_from.drain(index.min(end)..end);
    }

    fn coordinates_replaced(&mut self) {
        self.cp_to.clear();
        self.cp_from.clear();
        self.fill_control_points();
    }

    fn evaluate_extra(&mut self, item: &dyn ItemContext) -> bool {
        let mut changed = false;
        for cp in self.cp_to.iter_mut().chain(self.cp_from.iter_mut()) {
            changed |= cp.evaluate(item);
        }
        changed
    }

    fn save_extra(&self, writer: &mut dyn Writer) {
        writer.write_attribute_string("closed", if self.closed { "1" } else { "0" });
        for (tag, list) in [("cpto", &self.cp_to), ("cpfrom", &self.cp_from)] {
            writer.write_start_element(tag);
            for cp in list {
                cp.save("c", writer);
            }
            writer.write_end_element();
        }
    }
}

/// Bezier flavour of `coord`. Plain coordinates get both control points on
/// the vertex itself, which leaves the adjoining segments straight.
fn bezier_at_rest(coord: Coord) -> Coord {
    let converted = !matches!(coord, Coord::Bezier(_) | Coord::BezierProxy(_) | Coord::Proxy(_) | Coord::Port(_));
    let vertex = coord.to_point();
    let mut coord = BezierCoordinate::from_coordinate(coord);
    if converted {
        if let Some(b) = coord.as_bezier_mut() {
            b.set_cp_to_point(vertex);
            b.set_cp_from_point(vertex);
        }
    }
    coord
}

/// Open curve whose coordinates carry their own control points
#[derive(Debug, Clone)]
pub struct BezierLineShape {
    core: ShapeCore,
}

impl BezierLineShape {
    /// Coordinates are converted to bezier flavours; control points are kept
    /// if present, otherwise they sit on their vertex
    pub fn from_coordinates(coords: Vec<Coord>) -> Self {
        let coords = coords.into_iter().map(bezier_at_rest).collect();
        let mut shape = BezierLineShape {
            core: ShapeCore::new(coords),
        };
        shape.refresh();
        shape
    }

    /// Smoothed curve through `points`
    pub fn from_points(points: &[Point]) -> Self {
        let mut shape = Self::from_coordinates(points.iter().map(|p| Coord::from_point(*p)).collect());
        shape.init_control_points();
        shape
    }

    /// Derive every control point from the neighbouring vertices
    pub fn init_control_points(&mut self) {
        let points: Vec<Point> = self.core.coordinates.iter().map(|c| c.to_point()).collect();
        for (i, coord) in self.core.coordinates.iter_mut().enumerate() {
            let (to, from) = smooth_control_points(&points, i, false, SMOOTHING_FACTOR);
            if let Some(b) = coord.as_bezier_mut() {
                b.set_cp_to_point(to);
                b.set_cp_from_point(from);
            }
        }
        self.refresh();
    }

    pub fn set_cp_to_coord_at_to(&mut self, index: usize, coord: &impl PointSource) -> bool {
        let point = coord.to_point();
        let changed = self
            .core
            .coordinates
            .get_mut(index)
            .and_then(Coord::as_bezier_mut)
            .is_some_and(|b| b.set_cp_to_point(point));
        self.refresh();
        changed
    }

    pub fn set_cp_from_coord_at_to(&mut self, index: usize, coord: &impl PointSource) -> bool {
        let point = coord.to_point();
        let changed = self
            .core
            .coordinates
            .get_mut(index)
            .and_then(Coord::as_bezier_mut)
            .is_some_and(|b| b.set_cp_from_point(point));
        self.refresh();
        changed
    }
}

impl Shape for BezierLineShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn type_name(&self) -> &'static str {
        "bezierline"
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn min_coordinates(&self) -> usize {
        2
    }

    fn prepare_coordinate(&self, coord: Coord) -> Coord {
        bezier_at_rest(coord)
    }

    fn build_point_list(&self) -> Vec<Point> {
        let coords = &self.core.coordinates;
        let points: Vec<Point> = coords.iter().map(|c| c.to_point()).collect();
        let control = |c: &Coord, p: Point| {
            c.as_bezier()
                .map(|b| (b.cp_to_point(), b.cp_from_point()))
                .unwrap_or((p, p))
        };
        let (cp_to, cp_from): (Vec<Point>, Vec<Point>) =
            coords.iter().zip(&points).map(|(c, p)| control(c, *p)).unzip();
        interpolate_curve(&points, &cp_to, &cp_from, false)
    }
}
