//! Coordinates: points whose axes are formula-backed expressions.
//!
//! Every coordinate flavour implements [`PointSource`]; [`Coord`] dispatches
//! over all of them so shapes can hold a homogeneous `Vec<Coord>`.
//!
//! Proxies share the coordinate they forward to through [`SharedCoord`]
//! (single-threaded `Rc<RefCell<_>>`), so moving the original moves every
//! proxy that reads it.

mod bezier;
mod plain;
mod proxy;
mod reshape;

use std::cell::RefCell;
use std::rc::Rc;

use enum_dispatch::enum_dispatch;

pub use bezier::{BezierCoordinate, BezierCoordinateProxy, BezierPoint, CpCoord};
pub use plain::Coordinate;
pub use proxy::{CoordinateProxy, PortCoordinateProxy};
pub use reshape::{ReshapeCoordinate, ReshapeType};

use crate::formula::Expression;
use crate::graph::ItemContext;
use crate::persist::{Reader, Writer};
use crate::types::Point;

/// A coordinate shared between its owner and any proxies reading it
pub type SharedCoord = Rc<RefCell<Coord>>;

/// Wrap a coordinate for sharing with proxies
pub fn shared(coord: impl Into<Coord>) -> SharedCoord {
    Rc::new(RefCell::new(coord.into()))
}

/// Common behaviour of every coordinate flavour
#[enum_dispatch]
pub trait PointSource {
    /// Current position
    fn to_point(&self) -> Point;

    /// Move to `point`, replacing formulas with literals. Returns true if anything changed.
    fn set_to_point(&mut self, point: Point) -> bool;

    fn set_x(&mut self, x: Expression) -> bool;
    fn set_y(&mut self, y: Expression) -> bool;

    /// Shift by a delta; formulas on moved axes become literals
    fn translate(&mut self, dx: f64, dy: f64) -> bool;

    /// The axis expressions this coordinate would hand to a copy
    fn expressions(&self) -> (Expression, Expression);

    /// Independent copy; proxies copy into a plain snapshot
    fn copy(&self) -> Coord;

    /// Re-evaluate formulas against `item`. Returns true if the position changed.
    fn evaluate(&mut self, item: &dyn ItemContext) -> bool;

    /// Write as an element named `name`
    fn save(&self, name: &str, writer: &mut dyn Writer);

    /// Take over the axis expressions (formulas included) of `other`
    fn set_to(&mut self, other: &dyn PointSource) -> bool {
        let (x, y) = other.expressions();
        let changed_x = self.set_x(x);
        let changed_y = self.set_y(y);
        changed_x || changed_y
    }

    fn is_equal_to(&self, other: &dyn PointSource) -> bool {
        self.to_point() == other.to_point()
    }

    fn is_at(&self, x: f64, y: f64) -> bool {
        self.to_point() == Point::new(x, y)
    }
}

/// Any coordinate
#[enum_dispatch(PointSource)]
#[derive(Debug, Clone)]
pub enum Coord {
    Plain(Coordinate),
    Proxy(CoordinateProxy),
    Port(PortCoordinateProxy),
    Bezier(BezierCoordinate),
    BezierProxy(BezierCoordinateProxy),
    Reshape(ReshapeCoordinate),
}

impl Default for Coord {
    fn default() -> Self {
        Coord::Plain(Coordinate::default())
    }
}

impl Coord {
    /// Plain literal coordinate at `point`
    pub fn from_point(point: Point) -> Self {
        Coord::Plain(Coordinate::from_point(point))
    }

    /// Control-point view for bezier flavours
    pub fn as_bezier(&self) -> Option<&dyn BezierPoint> {
        match self {
            Coord::Bezier(b) => Some(b as &dyn BezierPoint),
            Coord::BezierProxy(b) => Some(b as &dyn BezierPoint),
            _ => None,
        }
    }

    pub fn as_bezier_mut(&mut self) -> Option<&mut dyn BezierPoint> {
        match self {
            Coord::Bezier(b) => Some(b as &mut dyn BezierPoint),
            Coord::BezierProxy(b) => Some(b as &mut dyn BezierPoint),
            _ => None,
        }
    }

    /// Read a persisted coordinate; elements carrying control points become bezier coordinates
    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        if reader.child(node, "cpto").is_some() || reader.child(node, "cpfrom").is_some() {
            Coord::Bezier(BezierCoordinate::read(reader, node))
        } else {
            Coord::Plain(Coordinate::read(reader, node))
        }
    }
}
