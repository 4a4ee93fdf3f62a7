use super::{Coord, Coordinate, PointSource, SharedCoord};
use crate::formula::Expression;
use crate::graph::{FramePath, ItemContext};
use crate::log::debug;
use crate::persist::Writer;
use crate::types::Point;

/// Forwards every read and write to a shared coordinate
#[derive(Debug, Clone)]
pub struct CoordinateProxy {
    coordinate: SharedCoord,
}

impl CoordinateProxy {
    pub fn new(coordinate: SharedCoord) -> Self {
        CoordinateProxy { coordinate }
    }

    pub fn shared(&self) -> &SharedCoord {
        &self.coordinate
    }
}

impl PointSource for CoordinateProxy {
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
        Coord::Plain(Coordinate::from_point(self.to_point()))
    }

    // the wrapped coordinate belongs to another item, which evaluates it
    fn evaluate(&mut self, _item: &dyn ItemContext) -> bool {
        false
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        Coordinate::from_point(self.to_point()).save(name, writer);
    }
}

/// Reads a port's coordinate from another item's frame.
///
/// The wrapped coordinate lives in the port parent's frame; every read maps
/// it through `path` into the frame of the item holding the proxy. Axis
/// writes and translation are ignored because the port owns its position.
#[derive(Debug, Clone)]
pub struct PortCoordinateProxy {
    coordinate: SharedCoord,
    path: FramePath,
}

impl PortCoordinateProxy {
    pub fn new(coordinate: SharedCoord, path: FramePath) -> Self {
        PortCoordinateProxy { coordinate, path }
    }

    pub fn shared(&self) -> &SharedCoord {
        &self.coordinate
    }

    pub fn path(&self) -> &FramePath {
        &self.path
    }

    /// Re-target after either endpoint item moved in the hierarchy
    pub fn set_path(&mut self, path: FramePath) {
        self.path = path;
    }
}

impl PointSource for PortCoordinateProxy {
    fn to_point(&self) -> Point {
        self.path.apply(self.coordinate.borrow().to_point())
    }

    /// Moves the port itself, mapping `point` back into the port parent's frame
    fn set_to_point(&mut self, point: Point) -> bool {
        self.coordinate.borrow_mut().set_to_point(self.path.invert(point))
    }

    fn set_x(&mut self, _x: Expression) -> bool {
        debug!("ignoring set_x on port coordinate");
        false
    }

    fn set_y(&mut self, _y: Expression) -> bool {
        debug!("ignoring set_y on port coordinate");
        false
    }

    fn translate(&mut self, _dx: f64, _dy: f64) -> bool {
        false
    }

    fn expressions(&self) -> (Expression, Expression) {
        let p = self.to_point();
        (Expression::number(p.x), Expression::number(p.y))
    }

    fn copy(&self) -> Coord {
        Coord::Plain(Coordinate::from_point(self.to_point()))
    }

    fn evaluate(&mut self, _item: &dyn ItemContext) -> bool {
        false
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        Coordinate::from_point(self.to_point()).save(name, writer);
    }

    fn set_to(&mut self, other: &dyn PointSource) -> bool {
        self.set_to_point(other.to_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::shared;
    use crate::types::pt;

    #[test]
    fn proxy_reads_and_writes_through() {
        let origin = shared(Coordinate::from_xy(1.0, 2.0));
        let mut proxy = CoordinateProxy::new(origin.clone());
        proxy.translate(1.0, 1.0);
        assert_eq!(origin.borrow().to_point(), pt(2.0, 3.0));

        origin.borrow_mut().set_to_point(pt(7.0, 7.0));
        assert_eq!(proxy.to_point(), pt(7.0, 7.0));
    }

    #[test]
    fn proxy_copy_is_a_detached_snapshot() {
        let origin = shared(Coordinate::from_xy(1.0, 2.0));
        let proxy = CoordinateProxy::new(origin.clone());
        let snapshot = proxy.copy();
        origin.borrow_mut().set_to_point(pt(9.0, 9.0));
        assert!(matches!(snapshot, Coord::Plain(_)));
        assert_eq!(snapshot.to_point(), pt(1.0, 2.0));
    }

    #[test]
    fn port_proxy_maps_between_frames() {
        let port = shared(Coordinate::from_xy(10.0, 10.0));
        let node_origin = shared(Coordinate::from_xy(100.0, 50.0));
        let path = FramePath::new(vec![node_origin.clone()], vec![]);
        let mut proxy = PortCoordinateProxy::new(port.clone(), path);

        assert_eq!(proxy.to_point(), pt(110.0, 60.0));

        // moving the node moves the mapped port
        node_origin.borrow_mut().translate(5.0, 0.0);
        assert_eq!(proxy.to_point(), pt(115.0, 60.0));

        assert!(!proxy.set_x(Expression::number(0.0)));
        assert!(!proxy.translate(3.0, 3.0));
        assert_eq!(proxy.to_point(), pt(115.0, 60.0));

        assert!(proxy.set_to_point(pt(120.0, 70.0)));
        assert_eq!(port.borrow().to_point(), pt(15.0, 20.0));
    }
}
