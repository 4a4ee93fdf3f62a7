use super::{Coord, Coordinate, PointSource, SharedCoord};
use crate::formula::Expression;
use crate::graph::ItemContext;
use crate::persist::{Reader, Writer};
use crate::types::{Point, pt};

/// Access to the two control points attached to a bezier vertex.
///
/// `cp_to` shapes the segment leaving the vertex, `cp_from` the segment
/// arriving at it.
pub trait BezierPoint {
    fn cp_to_point(&self) -> Point;
    fn cp_from_point(&self) -> Point;
    fn set_cp_to_point(&mut self, point: Point) -> bool;
    fn set_cp_from_point(&mut self, point: Point) -> bool;
}

/// A vertex with two absolute control points.
///
/// Moving the vertex moves both control points by the same delta, so the
/// handles keep their offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BezierCoordinate {
    main: Coordinate,
    cp_to: Coordinate,
    cp_from: Coordinate,
}

impl BezierCoordinate {
    /// Vertex with both control points at the origin
    pub fn new(main: Coordinate) -> Self {
        BezierCoordinate {
            main,
            cp_to: Coordinate::default(),
            cp_from: Coordinate::default(),
        }
    }

    pub fn with_control_points(main: Coordinate, cp_to: Coordinate, cp_from: Coordinate) -> Self {
        BezierCoordinate { main, cp_to, cp_from }
    }

    /// Convert any coordinate into a bezier flavour.
    ///
    /// Bezier coordinates and bezier proxies pass through. Proxies become
    /// bezier proxies over the same shared coordinate. Anything else becomes
    /// a bezier coordinate over copies of its axis expressions.
    pub fn from_coordinate(coord: Coord) -> Coord {
        match coord {
            Coord::Bezier(_) | Coord::BezierProxy(_) => coord,
            Coord::Proxy(proxy) => Coord::BezierProxy(BezierCoordinateProxy::new(proxy.shared().clone())),
            Coord::Port(port) => Coord::BezierProxy(BezierCoordinateProxy::new(super::shared(port))),
            other => {
                let (x, y) = other.expressions();
                Coord::Bezier(BezierCoordinate::new(Coordinate::new(x, y)))
            }
        }
    }

    pub fn main(&self) -> &Coordinate {
        &self.main
    }

    pub fn cp_to(&self) -> &Coordinate {
        &self.cp_to
    }

    pub fn cp_from(&self) -> &Coordinate {
        &self.cp_from
    }

    /// Replace the outgoing control point, formulas included
    pub fn set_cp_to(&mut self, cp: Coordinate) -> bool {
        let changed = self.cp_to != cp;
        self.cp_to = cp;
        changed
    }

    pub fn set_cp_from(&mut self, cp: Coordinate) -> bool {
        let changed = self.cp_from != cp;
        self.cp_from = cp;
        changed
    }

    fn shift_control_points(&mut self, delta: Point) {
        if delta != Point::ZERO {
            self.cp_to.translate(delta.x, delta.y);
            self.cp_from.translate(delta.x, delta.y);
        }
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        let cp = |tag: &str| {
            reader
                .child(node, tag)
                .map(|n| Coordinate::read(reader, n))
                .unwrap_or_default()
        };
        BezierCoordinate {
            main: Coordinate::read(reader, node),
            cp_to: cp("cpto"),
            cp_from: cp("cpfrom"),
        }
    }
}

impl PointSource for BezierCoordinate {
    fn to_point(&self) -> Point {
        self.main.to_point()
    }

    fn set_to_point(&mut self, point: Point) -> bool {
        let delta = point - self.main.to_point();
        let changed = self.main.set_to_point(point);
        self.shift_control_points(delta);
        changed
    }

    fn set_x(&mut self, x: Expression) -> bool {
        let before = self.main.to_point();
        let changed = self.main.set_x(x);
        self.shift_control_points(self.main.to_point() - before);
        changed
    }

    fn set_y(&mut self, y: Expression) -> bool {
        let before = self.main.to_point();
        let changed = self.main.set_y(y);
        self.shift_control_points(self.main.to_point() - before);
        changed
    }

    fn translate(&mut self, dx: f64, dy: f64) -> bool {
        let changed = self.main.translate(dx, dy);
        self.shift_control_points(pt(dx, dy));
        changed
    }

    fn expressions(&self) -> (Expression, Expression) {
        self.main.expressions()
    }

    fn copy(&self) -> Coord {
        Coord::Bezier(self.clone())
    }

    fn evaluate(&mut self, item: &dyn ItemContext) -> bool {
        let main = self.main.evaluate(item);
        let cp_to = self.cp_to.evaluate(item);
        let cp_from = self.cp_from.evaluate(item);
        main || cp_to || cp_from
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        writer.write_start_element(name);
        self.main.write_body(writer);
        self.cp_to.save("cpto", writer);
        self.cp_from.save("cpfrom", writer);
        writer.write_end_element();
    }
}

impl BezierPoint for BezierCoordinate {
    fn cp_to_point(&self) -> Point {
        self.cp_to.to_point()
    }

    fn cp_from_point(&self) -> Point {
        self.cp_from.to_point()
    }

    fn set_cp_to_point(&mut self, point: Point) -> bool {
        self.cp_to.set_to_point(point)
    }

    fn set_cp_from_point(&mut self, point: Point) -> bool {
        self.cp_from.set_to_point(point)
    }
}

/// A control point stored as an offset from a shared origin, so it follows
/// the origin wherever it moves
#[derive(Debug, Clone)]
pub struct CpCoord {
    origin: SharedCoord,
    offset: Point,
}

impl CpCoord {
    pub fn new(origin: SharedCoord) -> Self {
        CpCoord {
            origin,
            offset: Point::ZERO,
        }
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    fn origin_point(&self) -> Point {
        self.origin.borrow().to_point()
    }
}

impl PointSource for CpCoord {
    fn to_point(&self) -> Point {
        self.origin_point() + self.offset
    }

    fn set_to_point(&mut self, point: Point) -> bool {
        let offset = point - self.origin_point();
        let changed = offset != self.offset;
        self.offset = offset;
        changed
    }

    fn set_x(&mut self, x: Expression) -> bool {
        let target = pt(x.to_number(), self.to_point().y);
        self.set_to_point(target)
    }

    fn set_y(&mut self, y: Expression) -> bool {
        let target = pt(self.to_point().x, y.to_number());
        self.set_to_point(target)
    }

    fn translate(&mut self, dx: f64, dy: f64) -> bool {
        self.offset += pt(dx, dy);
        dx != 0.0 || dy != 0.0
    }

    fn expressions(&self) -> (Expression, Expression) {
        let p = self.to_point();
        (Expression::number(p.x), Expression::number(p.y))
    }

    fn copy(&self) -> Coord {
        Coord::from_point(self.to_point())
    }

    fn evaluate(&mut self, _item: &dyn ItemContext) -> bool {
        false
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        Coordinate::from_point(self.to_point()).save(name, writer);
    }
}

/// Bezier view over a shared coordinate; control points ride along as offsets
#[derive(Debug, Clone)]
pub struct BezierCoordinateProxy {
    coordinate: SharedCoord,
    cp_to: CpCoord,
    cp_from: CpCoord,
}

impl BezierCoordinateProxy {
    pub fn new(coordinate: SharedCoord) -> Self {
        BezierCoordinateProxy {
            cp_to: CpCoord::new(coordinate.clone()),
            cp_from: CpCoord::new(coordinate.clone()),
            coordinate,
        }
    }

    pub fn shared(&self) -> &SharedCoord {
        &self.coordinate
    }

    pub fn cp_to(&self) -> &CpCoord {
        &self.cp_to
    }

    pub fn cp_from(&self) -> &CpCoord {
        &self.cp_from
    }

    fn snapshot(&self) -> BezierCoordinate {
        BezierCoordinate::with_control_points(
            Coordinate::from_point(self.to_point()),
            Coordinate::from_point(self.cp_to.to_point()),
            Coordinate::from_point(self.cp_from.to_point()),
        )
    }
}

impl PointSource for BezierCoordinateProxy {
    fn to_point(&self) -> Point {
        self.coordinate.borrow().to_point()
    }

    fn set_to_point(&mut self, point: Point) -> bool {
        self.coordinate.borrow_mut().set_to_point(point)
    }

    fn set_x(&mut self, x: Expression) -> bool {
        self.coordinate.borrow_mut().set_x(x)
    }

    fn set_y(&mut self, y: Expression) -> bool {
        self.coordinate.borrow_mut().set_y(y)
    }

    fn translate(&mut self, dx: f64, dy: f64) -> bool {
        self.coordinate.borrow_mut().translate(dx, dy)
    }

    fn expressions(&self) -> (Expression, Expression) {
        self.coordinate.borrow().expressions()
    }

    fn copy(&self) -> Coord {
        Coord::Bezier(self.snapshot())
    }

    fn evaluate(&mut self, _item: &dyn ItemContext) -> bool {
        false
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        self.snapshot().save(name, writer);
    }
}

impl BezierPoint for BezierCoordinateProxy {
    fn cp_to_point(&self) -> Point {
        self.cp_to.to_point()
    }

    fn cp_from_point(&self) -> Point {
        self.cp_from.to_point()
    }

    fn set_cp_to_point(&mut self, point: Point) -> bool {
        self.cp_to.set_to_point(point)
    }

    fn set_cp_from_point(&mut self, point: Point) -> bool {
        self.cp_from.set_to_point(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{CoordinateProxy, shared};
    use crate::persist::{ElementReader, ElementWriter};

    fn bezier(main: (f64, f64), cp_to: (f64, f64), cp_from: (f64, f64)) -> BezierCoordinate {
        BezierCoordinate::with_control_points(
            Coordinate::from_xy(main.0, main.1),
            Coordinate::from_xy(cp_to.0, cp_to.1),
            Coordinate::from_xy(cp_from.0, cp_from.1),
        )
    }

    #[test]
    fn moving_vertex_moves_control_points_rigidly() {
        let mut b = bezier((10.0, 10.0), (20.0, 10.0), (0.0, 10.0));
        b.set_x(Expression::number(15.0));
        assert_eq!(b.cp_to_point(), pt(25.0, 10.0));
        assert_eq!(b.cp_from_point(), pt(5.0, 10.0));

        b.translate(0.0, 5.0);
        assert_eq!(b.to_point(), pt(15.0, 15.0));
        assert_eq!(b.cp_to_point(), pt(25.0, 15.0));

        b.set_to_point(pt(0.0, 0.0));
        assert_eq!(b.cp_from_point(), pt(-10.0, 0.0));
    }

    #[test]
    fn setting_control_point_leaves_vertex() {
        let mut b = bezier((10.0, 10.0), (20.0, 10.0), (0.0, 10.0));
        b.set_cp_to_point(pt(30.0, 30.0));
        assert_eq!(b.to_point(), pt(10.0, 10.0));
        assert_eq!(b.cp_from_point(), pt(0.0, 10.0));
    }

    #[test]
    fn from_coordinate_picks_flavour() {
        let plain = BezierCoordinate::from_coordinate(Coord::from_point(pt(3.0, 4.0)));
        match &plain {
            Coord::Bezier(b) => {
                assert_eq!(b.to_point(), pt(3.0, 4.0));
                assert_eq!(b.cp_to_point(), Point::ZERO);
            }
            other => panic!("expected bezier, got {other:?}"),
        }

        let origin = shared(Coordinate::from_xy(1.0, 1.0));
        let proxied = BezierCoordinate::from_coordinate(CoordinateProxy::new(origin.clone()).into());
        assert!(matches!(proxied, Coord::BezierProxy(_)));

        let again = BezierCoordinate::from_coordinate(plain.clone());
        assert_eq!(again.as_bezier().map(|b| b.cp_to_point()), Some(Point::ZERO));
    }

    #[test]
    fn proxy_control_points_follow_origin() {
        let origin = shared(Coordinate::from_xy(10.0, 10.0));
        let mut proxy = BezierCoordinateProxy::new(origin.clone());
        proxy.set_cp_to_point(pt(15.0, 10.0));
        proxy.set_cp_from_point(pt(5.0, 10.0));

        origin.borrow_mut().translate(100.0, 0.0);
        assert_eq!(proxy.to_point(), pt(110.0, 10.0));
        assert_eq!(proxy.cp_to_point(), pt(115.0, 10.0));
        assert_eq!(proxy.cp_from().offset(), pt(-5.0, 0.0));
    }

    #[test]
    fn save_and_read_control_points() {
        let mut w = ElementWriter::new();
        bezier((10.0, 10.0), (20.0, 10.0), (0.0, 10.0)).save("c", &mut w);
        let root = w.into_element().unwrap();
        insta::assert_snapshot!(
            root.to_xml(),
            @r#"<c x="10" y="10"><cpto x="20" y="10"/><cpfrom x="0" y="10"/></c>"#
        );

        let back = Coord::read(&ElementReader, &root);
        let b = back.as_bezier().unwrap();
        assert_eq!(b.cp_to_point(), pt(20.0, 10.0));
        assert_eq!(b.cp_from_point(), pt(0.0, 10.0));
    }
}
