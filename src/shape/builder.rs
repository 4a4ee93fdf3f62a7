//! Shape builders: outlines generated from reshape parameters.
//!
//! A builder reads the parameter pair of each reshape coordinate of an item
//! and emits a coordinate list whose axes are formulas over `WIDTH` and
//! `HEIGHT`. The generated outline therefore follows later resizes without
//! being rebuilt; only a parameter change needs a new build.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use super::{BezierShape, PolygonShape, Shape, ShapeEnum};
use crate::coord::{Coord, Coordinate, ReshapeCoordinate};
use crate::defaults::FORMULA_PRECISION;
use crate::errors::ModelError;
use crate::formula::Expression;
use crate::formula::ast::{BinaryOp, Term};
use crate::log::debug;
use crate::types::{Point, pt};

/// Registered outline generators, persisted by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeBuilder {
    /// Open elliptic arc between two angle parameters
    Arc,
    /// Arc closed by its chord
    ArcClosed,
    /// Arc closed through the centre
    Pie,
    /// Diagonal cross; the parameter is the arm width
    Multiply,
    /// Rectangle with a notch pointing at the tip parameter
    Callout,
    CalloutLine,
    CalloutRoundRect,
    CalloutRoundRectLine,
    /// Ellipse with a notch pointing at the tip parameter
    CalloutRound,
    CalloutRoundLine,
}

const ALL_BUILDERS: [ShapeBuilder; 10] = [
    ShapeBuilder::Arc,
    ShapeBuilder::ArcClosed,
    ShapeBuilder::Pie,
    ShapeBuilder::Multiply,
    ShapeBuilder::Callout,
    ShapeBuilder::CalloutLine,
    ShapeBuilder::CalloutRoundRect,
    ShapeBuilder::CalloutRoundRectLine,
    ShapeBuilder::CalloutRound,
    ShapeBuilder::CalloutRoundLine,
];

impl ShapeBuilder {
    pub fn all() -> &'static [ShapeBuilder] {
        &ALL_BUILDERS
    }

    /// Persisted name
    pub fn name(self) -> &'static str {
        match self {
            ShapeBuilder::Arc => "ARC",
            ShapeBuilder::ArcClosed => "ARCCLOSED",
            ShapeBuilder::Pie => "PIE",
            ShapeBuilder::Multiply => "MULTIPLY",
            ShapeBuilder::Callout => "CALLOUT",
            ShapeBuilder::CalloutLine => "CALLOUTLINE",
            ShapeBuilder::CalloutRoundRect => "CALLOUTROUNDRECT",
            ShapeBuilder::CalloutRoundRectLine => "CALLOUTROUNDRECTLINE",
            ShapeBuilder::CalloutRound => "CALLOUTROUND",
            ShapeBuilder::CalloutRoundLine => "CALLOUTROUNDLINE",
        }
    }

    fn narrow_notch(self) -> bool {
        matches!(
            self,
            ShapeBuilder::CalloutLine | ShapeBuilder::CalloutRoundRectLine | ShapeBuilder::CalloutRoundLine
        )
    }

    /// Generate the outline for `params`, one pair per reshape coordinate in
    /// order. Missing parameters fall back to the builder's defaults.
    pub fn generate(self, params: &[Point]) -> BuiltShape {
        let param = |i: usize, default: Point| params.get(i).copied().unwrap_or(default);
        match self {
            ShapeBuilder::Arc | ShapeBuilder::ArcClosed | ShapeBuilder::Pie => {
                let start = param(0, pt(0.0, 0.0)).x * TAU;
                let end = param(1, pt(0.75, 0.0)).x * TAU;
                let mut vertices = arc_vertices(start, end);
                if self == ShapeBuilder::Pie {
                    vertices.push(Vertex::straight(Spot::fraction(pt(0.5, 0.5))));
                }
                BuiltShape::curved(vertices, self != ShapeBuilder::Arc)
            }
            ShapeBuilder::Multiply => multiply(param(0, pt(0.2, 0.0)).x.clamp(0.0, 0.5)),
            ShapeBuilder::Callout | ShapeBuilder::CalloutLine => {
                callout_rect(param(0, DEFAULT_TIP), self.narrow_notch())
            }
            ShapeBuilder::CalloutRoundRect | ShapeBuilder::CalloutRoundRectLine => {
                callout_round_rect(param(0, DEFAULT_TIP), self.narrow_notch())
            }
            ShapeBuilder::CalloutRound | ShapeBuilder::CalloutRoundLine => {
                callout_round(param(0, DEFAULT_TIP), self.narrow_notch())
            }
        }
    }

    /// Regenerate the host's shape from its reshape parameters
    pub fn build(self, host: &mut dyn BuilderHost) -> bool {
        let params: Vec<Point> = host
            .reshape_coordinates()
            .iter()
            .map(ReshapeCoordinate::parameters)
            .collect();
        debug!(builder = self.name(), params = params.len(), "building shape");
        self.generate(&params).apply(host.shape_mut())
    }
}

impl fmt::Display for ShapeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeBuilder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_BUILDERS
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownBuilder { name: s.to_string() })
    }
}

/// Owner of a built shape and the reshape coordinates driving it
pub trait BuilderHost {
    fn shape_mut(&mut self) -> &mut ShapeEnum;
    fn reshape_coordinates(&self) -> &[ReshapeCoordinate];
}

/// Rebuild with the first builder named by the host's reshape coordinates
pub fn rebuild(host: &mut dyn BuilderHost) -> bool {
    let builder = host.reshape_coordinates().iter().find_map(ReshapeCoordinate::builder);
    match builder {
        Some(builder) => builder.build(host),
        None => false,
    }
}

/// Cubic handle factor for an elliptic arc spanning `theta` radians
/// (L. Maisonobe, "Drawing an elliptical arc using polylines, quadratic or
/// cubic Bezier curves").
pub fn arc_alpha(theta: f64) -> f64 {
    let t = (theta / 2.0).tan();
    theta.sin() * ((4.0 + 3.0 * t * t).sqrt() - 1.0) / 3.0
}

/// Generated outline, ready to replace a shape's coordinates.
///
/// `cp_to` and `cp_from` are empty for straight-edged outlines.
#[derive(Debug, Clone)]
pub struct BuiltShape {
    pub coordinates: Vec<Coordinate>,
    pub cp_to: Vec<Coordinate>,
    pub cp_from: Vec<Coordinate>,
    pub closed: bool,
}

impl BuiltShape {
    fn straight(spots: Vec<Spot>, closed: bool) -> Self {
        BuiltShape {
            coordinates: spots.into_iter().map(Spot::to_coordinate).collect(),
            cp_to: Vec::new(),
            cp_from: Vec::new(),
            closed,
        }
    }

    fn curved(vertices: Vec<Vertex>, closed: bool) -> Self {
        let mut built = BuiltShape {
            coordinates: Vec::with_capacity(vertices.len()),
            cp_to: Vec::with_capacity(vertices.len()),
            cp_from: Vec::with_capacity(vertices.len()),
            closed,
        };
        for v in vertices {
            built.coordinates.push(v.at.to_coordinate());
            built.cp_to.push(v.to.to_coordinate());
            built.cp_from.push(v.from.to_coordinate());
        }
        built
    }

    pub fn is_curved(&self) -> bool {
        !self.cp_to.is_empty()
    }

    /// Install into `shape`. A shape of the wrong kind is replaced by a
    /// bezier or polygon shape that takes over its item and observers.
    pub fn apply(self, shape: &mut ShapeEnum) -> bool {
        let curved = self.is_curved();
        let closed = self.closed;
        let coords: Vec<Coord> = self.coordinates.into_iter().map(Coord::from).collect();

        match shape {
            ShapeEnum::Bezier(bezier) if curved => {
                return bezier.set_outline(coords, self.cp_to, self.cp_from, closed);
            }
            ShapeEnum::Polygon(polygon) if !curved => {
                let applied = polygon.set_coordinates(coords);
                if applied {
                    polygon.set_closed(closed);
                }
                return applied;
            }
            _ => {}
        }

        debug!(from = shape.type_name(), curved, "replacing shape kind for builder output");
        let mut fresh: ShapeEnum = if curved {
            BezierShape::with_control_points(coords, self.cp_to, self.cp_from, closed).into()
        } else {
            PolygonShape::from_coordinates(coords, closed).into()
        };
        fresh.core_mut().adopt_attachments(shape.core_mut());
        fresh.evaluate();
        *shape = fresh;
        true
    }
}

const DEFAULT_TIP: Point = Point::new(0.2, 1.4);
/// Corner radius of round-rect callouts, as a fraction of the shorter side
const CORNER_RADIUS: f64 = 0.1;

fn round_constant(v: f64) -> f64 {
    let scale = 10f64.powi(FORMULA_PRECISION as i32);
    let r = (v * scale).round() / scale;
    if r == 0.0 { 0.0 } else { r }
}

/// Length along one axis: `scale` times the item extent plus `radius` times
/// the item's shorter side
#[derive(Debug, Clone, Copy, PartialEq)]
struct Measure {
    scale: f64,
    radius: f64,
}

impl Measure {
    fn scale(scale: f64) -> Self {
        Measure { scale, radius: 0.0 }
    }

    fn radius(scale: f64, radius: f64) -> Self {
        Measure { scale, radius }
    }

    fn to_expression(self, axis: &str) -> Expression {
        let scale = round_constant(self.scale);
        let radius = round_constant(self.radius);
        let scaled = Term::Binary(
            Box::new(Term::Ident(axis.to_string())),
            BinaryOp::Mul,
            Box::new(Term::Number(scale)),
        );
        if radius == 0.0 {
            return Expression::from_term(scaled);
        }
        let min_side = Term::Call(
            "MIN".to_string(),
            vec![Term::Ident("WIDTH".to_string()), Term::Ident("HEIGHT".to_string())],
        );
        let rounded = Term::Binary(Box::new(min_side), BinaryOp::Mul, Box::new(Term::Number(radius.abs())));
        let term = match (scale == 0.0, radius < 0.0) {
            (true, false) => rounded,
            (true, true) => Term::Neg(Box::new(rounded)),
            (false, negative) => Term::Binary(
                Box::new(scaled),
                if negative { BinaryOp::Sub } else { BinaryOp::Add },
                Box::new(rounded),
            ),
        };
        Expression::from_term(term)
    }
}

/// A generated position in item-relative measures
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spot {
    x: Measure,
    y: Measure,
}

impl Spot {
    fn fraction(p: Point) -> Self {
        Spot {
            x: Measure::scale(p.x),
            y: Measure::scale(p.y),
        }
    }

    fn to_coordinate(self) -> Coordinate {
        Coordinate::new(self.x.to_expression("WIDTH"), self.y.to_expression("HEIGHT"))
    }
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    at: Spot,
    to: Spot,
    from: Spot,
}

impl Vertex {
    fn straight(at: Spot) -> Self {
        Vertex { at, to: at, from: at }
    }
}

/// Vertices of the arc of the inscribed ellipse from `start` to `end`
/// (radians, clockwise on screen), split into segments of at most a quarter
/// turn. An end at or before the start wraps a full turn.
fn arc_vertices(start: f64, end: f64) -> Vec<Vertex> {
    let mut sweep = end - start;
    if sweep <= 0.0 {
        sweep += TAU;
    }
    let segments = (sweep / FRAC_PI_2 - 1e-9).ceil().max(1.0) as usize;
    let step = sweep / segments as f64;
    let alpha = arc_alpha(step);

    let mut vertices: Vec<Vertex> = (0..=segments)
        .map(|k| {
            let a = start + step * k as f64;
            let at = pt(0.5 + 0.5 * a.cos(), 0.5 + 0.5 * a.sin());
            let handle = pt(-0.5 * a.sin(), 0.5 * a.cos()) * alpha;
            Vertex {
                at: Spot::fraction(at),
                to: Spot::fraction(at + handle),
                from: Spot::fraction(at - handle),
            }
        })
        .collect();
    if let Some(first) = vertices.first_mut() {
        first.from = first.at;
    }
    if let Some(last) = vertices.last_mut() {
        last.to = last.at;
    }
    vertices
}

fn multiply(arm: f64) -> BuiltShape {
    let spots = [
        (0.0, arm),
        (arm, 0.0),
        (0.5, 0.5 - arm),
        (1.0 - arm, 0.0),
        (1.0, arm),
        (0.5 + arm, 0.5),
        (1.0, 1.0 - arm),
        (1.0 - arm, 1.0),
        (0.5, 0.5 + arm),
        (arm, 1.0),
        (0.0, 1.0 - arm),
        (0.5 - arm, 0.5),
    ]
    .into_iter()
    .map(|(x, y)| Spot::fraction(pt(x, y)))
    .collect();
    BuiltShape::straight(spots, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Side facing the tip, judged from the centre
    fn facing(tip: Point) -> Side {
        let d = tip - pt(0.5, 0.5);
        if d.x.abs() > d.y.abs() {
            if d.x > 0.0 { Side::Right } else { Side::Left }
        } else if d.y > 0.0 {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    /// Position of `tip` along this side, 0..1 in the side's own axis
    fn along(self, tip: Point) -> f64 {
        match self {
            Side::Top | Side::Bottom => tip.x,
            Side::Left | Side::Right => tip.y,
        }
    }

    /// Point at fraction `f` along the side
    fn at(self, f: f64) -> Point {
        match self {
            Side::Top => pt(f, 0.0),
            Side::Right => pt(1.0, f),
            Side::Bottom => pt(f, 1.0),
            Side::Left => pt(0.0, f),
        }
    }
}

/// Notch anchors (lower, upper) along `side`, on the half nearest the tip
fn notch_anchors(side: Side, tip: Point, narrow: bool) -> (f64, f64) {
    let (near, far) = if narrow {
        ((0.25, 0.35), (0.65, 0.75))
    } else {
        ((0.15, 0.35), (0.65, 0.85))
    };
    if side.along(tip) < 0.5 { near } else { far }
}

/// Notch spots in clockwise outline order
fn notch(side: Side, tip: Point, narrow: bool) -> [Spot; 3] {
    let (lo, hi) = notch_anchors(side, tip, narrow);
    let (first, last) = match side {
        Side::Top | Side::Right => (lo, hi),
        Side::Bottom | Side::Left => (hi, lo),
    };
    [
        Spot::fraction(side.at(first)),
        Spot::fraction(tip),
        Spot::fraction(side.at(last)),
    ]
}

fn callout_rect(tip: Point, narrow: bool) -> BuiltShape {
    let side = Side::facing(tip);
    let mut spots: Vec<Spot> = [pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)]
        .into_iter()
        .map(Spot::fraction)
        .collect();
    let at = side.index() + 1;
    spots.splice(at..at, notch(side, tip, narrow));
    BuiltShape::straight(spots, true)
}

fn callout_round_rect(tip: Point, narrow: bool) -> BuiltShape {
    let r = CORNER_RADIUS;
    // corner handles pull back from the tangent points towards the corner
    let c = (1.0 - arc_alpha(FRAC_PI_2)) * r;
    let m = Measure::radius;
    let spot = |x: Measure, y: Measure| Spot { x, y };
    let corner = |at: Spot, to: Option<Spot>, from: Option<Spot>| Vertex {
        at,
        to: to.unwrap_or(at),
        from: from.unwrap_or(at),
    };

    let mut vertices = vec![
        corner(spot(m(0.0, r), m(0.0, 0.0)), None, Some(spot(m(0.0, c), m(0.0, 0.0)))),
        corner(spot(m(1.0, -r), m(0.0, 0.0)), Some(spot(m(1.0, -c), m(0.0, 0.0))), None),
        corner(spot(m(1.0, 0.0), m(0.0, r)), None, Some(spot(m(1.0, 0.0), m(0.0, c)))),
        corner(spot(m(1.0, 0.0), m(1.0, -r)), Some(spot(m(1.0, 0.0), m(1.0, -c))), None),
        corner(spot(m(1.0, -r), m(1.0, 0.0)), None, Some(spot(m(1.0, -c), m(1.0, 0.0)))),
        corner(spot(m(0.0, r), m(1.0, 0.0)), Some(spot(m(0.0, c), m(1.0, 0.0))), None),
        corner(spot(m(0.0, 0.0), m(1.0, -r)), None, Some(spot(m(0.0, 0.0), m(1.0, -c)))),
        corner(spot(m(0.0, 0.0), m(0.0, r)), Some(spot(m(0.0, 0.0), m(0.0, c))), None),
    ];
    let side = Side::facing(tip);
    let at = side.index() * 2 + 1;
    vertices.splice(at..at, notch(side, tip, narrow).map(Vertex::straight));
    BuiltShape::curved(vertices, true)
}

/// Angle on the inscribed ellipse of the point at fraction `f` along `side`
fn ellipse_angle(side: Side, f: f64) -> f64 {
    let t = (2.0 * f - 1.0).clamp(-1.0, 1.0);
    match side {
        Side::Top => -t.acos(),
        Side::Bottom => t.acos(),
        Side::Right => t.asin(),
        Side::Left => PI - t.asin(),
    }
}

fn callout_round(tip: Point, narrow: bool) -> BuiltShape {
    let side = Side::facing(tip);
    let (lo, hi) = notch_anchors(side, tip, narrow);
    let a = ellipse_angle(side, lo);
    let b = ellipse_angle(side, hi);
    // the long way round, leaving the gap between the anchors for the notch
    let mut vertices = arc_vertices(a.max(b), a.min(b));
    vertices.push(Vertex::straight(Spot::fraction(tip)));
    BuiltShape::curved(vertices, true)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::coord::{PointSource, ReshapeType};
    use crate::graph::ItemFrame;
    use crate::shape::{FindFlag, RectangleShape, ShapeEvent, ShapeObserver, Verdict};

    struct Host {
        shape: ShapeEnum,
        reshape: Vec<ReshapeCoordinate>,
    }

    impl BuilderHost for Host {
        fn shape_mut(&mut self) -> &mut ShapeEnum {
            &mut self.shape
        }

        fn reshape_coordinates(&self) -> &[ReshapeCoordinate] {
            &self.reshape
        }
    }

    fn host(params: &[(f64, f64)], builder: ShapeBuilder) -> (Host, Rc<ItemFrame>) {
        let item = Rc::new(ItemFrame::new(3000.0, 2000.0));
        let mut shape: ShapeEnum = RectangleShape::new().into();
        shape.set_item(item.clone());
        shape.evaluate();
        let reshape = params
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                ReshapeCoordinate::new(
                    format!("p{i}"),
                    Coordinate::from_xy(*x, *y),
                    ReshapeType::Extent,
                    ReshapeType::Extent,
                )
                .with_builder(builder)
            })
            .collect();
        (Host { shape, reshape }, item)
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn alpha_for_quarter_turn() {
        assert!((arc_alpha(FRAC_PI_2) - (7f64.sqrt() - 1.0) / 3.0).abs() < 1e-12);
        assert!(arc_alpha(0.0).abs() < 1e-12);
    }

    #[test]
    fn names_round_trip() {
        for b in ShapeBuilder::all() {
            assert_eq!(b.name().parse::<ShapeBuilder>(), Ok(*b));
        }
        assert_eq!("calloutround".parse::<ShapeBuilder>(), Ok(ShapeBuilder::CalloutRound));
        assert_eq!(
            "STAR".parse::<ShapeBuilder>(),
            Err(ModelError::UnknownBuilder { name: "STAR".into() })
        );
    }

    #[test]
    fn arc_emits_item_relative_formulas() {
        let built = ShapeBuilder::Arc.generate(&[pt(0.0, 0.0), pt(0.75, 0.0)]);
        assert!(built.is_curved());
        assert!(!built.closed);
        assert_eq!(built.coordinates.len(), 4);
        assert_eq!(built.coordinates[0].x().formula_source(), Some("WIDTH * 1"));
        assert_eq!(built.coordinates[0].y().formula_source(), Some("HEIGHT * 0.5"));
        // open ends carry no handle
        assert_eq!(built.cp_from[0], built.coordinates[0]);
        assert_eq!(built.cp_to[3], built.coordinates[3]);
    }

    #[test]
    fn arc_wraps_when_end_precedes_start() {
        let built = ShapeBuilder::Arc.generate(&[pt(0.75, 0.0), pt(0.25, 0.0)]);
        // half a turn, two quarter segments
        assert_eq!(built.coordinates.len(), 3);
    }

    #[test]
    fn build_replaces_shape_kind_and_keeps_item() {
        let (mut host, item) = host(&[(0.0, 0.0), (0.5, 0.0)], ShapeBuilder::Pie);
        assert!(rebuild(&mut host));
        let ShapeEnum::Bezier(pie) = &host.shape else {
            panic!("expected a bezier shape, got {:?}", host.shape);
        };
        assert!(pie.is_closed());
        assert_eq!(pie.coordinate_count(), 4);
        assert!(close(pie.coordinates()[0].to_point(), pt(3000.0, 1000.0)));
        assert!(close(pie.coordinates()[2].to_point(), pt(0.0, 1000.0)));
        assert!(close(pie.coordinates()[3].to_point(), pt(1500.0, 1000.0)));

        // formulas follow a resize without rebuilding
        item.set_size(1000.0, 500.0);
        host.shape.evaluate();
        assert!(close(host.shape.coordinates()[3].to_point(), pt(500.0, 250.0)));
    }

    #[test]
    fn arc_midpoint_lies_near_the_ellipse() {
        let (mut host, _) = host(&[(0.0, 0.0), (0.25, 0.0)], ShapeBuilder::Arc);
        assert!(rebuild(&mut host));
        let points = host.shape.point_list();
        assert_eq!(points.len(), 11);
        let mid = points[5];
        let n = pt((mid.x - 1500.0) / 1500.0, (mid.y - 1000.0) / 1000.0);
        // radial error of the quarter-turn cubic is about 0.2%
        assert!((n.length() - 1.0).abs() < 5e-3);
    }

    #[test]
    fn multiply_is_a_closed_cross() {
        let (mut host, _) = host(&[(0.2, 0.0)], ShapeBuilder::Multiply);
        assert!(rebuild(&mut host));
        assert!(matches!(host.shape, ShapeEnum::Polygon(_)));
        assert_eq!(host.shape.coordinate_count(), 12);
        assert!(host.shape.contains_point(pt(1500.0, 1000.0), FindFlag::Default));
        assert!(!host.shape.contains_point(pt(1500.0, 100.0), FindFlag::Default));
    }

    #[test]
    fn callout_notch_faces_the_tip() {
        let built = ShapeBuilder::Callout.generate(&[pt(0.2, 1.4)]);
        assert!(!built.is_curved());
        let x: Vec<Option<&str>> = built.coordinates.iter().map(|c| c.x().formula_source()).collect();
        assert_eq!(
            x,
            vec![
                Some("WIDTH * 0"),
                Some("WIDTH * 1"),
                Some("WIDTH * 1"),
                Some("WIDTH * 0.35"),
                Some("WIDTH * 0.2"),
                Some("WIDTH * 0.15"),
                Some("WIDTH * 0"),
            ]
        );
        assert_eq!(built.coordinates[4].y().formula_source(), Some("HEIGHT * 1.4"));

        let right = ShapeBuilder::CalloutLine.generate(&[pt(1.5, 0.8)]);
        let y: Vec<Option<&str>> = right.coordinates[2..5].iter().map(|c| c.y().formula_source()).collect();
        assert_eq!(y, vec![Some("HEIGHT * 0.65"), Some("HEIGHT * 0.8"), Some("HEIGHT * 0.75")]);
    }

    #[test]
    fn round_rect_corners_use_the_shorter_side() {
        let built = ShapeBuilder::CalloutRoundRect.generate(&[pt(0.5, -0.5)]);
        assert!(built.is_curved());
        assert_eq!(built.coordinates.len(), 11);
        assert_eq!(built.coordinates[0].x().formula_source(), Some("MIN(WIDTH, HEIGHT) * 0.1"));
        assert_eq!(
            built.coordinates[4].x().formula_source(),
            Some("WIDTH * 1 - MIN(WIDTH, HEIGHT) * 0.1")
        );
        // tip sits between the first corner pair
        assert_eq!(built.coordinates[2].y().formula_source(), Some("HEIGHT * -0.5"));
    }

    #[test]
    fn round_callout_ends_at_the_tip() {
        let (mut host, _) = host(&[(0.2, 1.4)], ShapeBuilder::CalloutRound);
        assert!(rebuild(&mut host));
        let coords = host.shape.coordinates();
        assert!(close(coords[coords.len() - 1].to_point(), pt(600.0, 2800.0)));
        assert!(host.shape.is_closed());
        // the arc starts and ends on the bottom of the ellipse
        assert!(coords[0].to_point().y > 1000.0);
        assert!(coords[coords.len() - 2].to_point().y > 1000.0);
    }

    struct Veto {
        asked: Cell<usize>,
    }

    impl ShapeObserver for Veto {
        fn before_change(&self, _event: &ShapeEvent) -> Verdict {
            self.asked.set(self.asked.get() + 1);
            Verdict::Cancel
        }
    }

    #[test]
    fn rebuild_onto_bezier_asks_observers() {
        let (mut host, _) = host(&[(0.0, 0.0), (0.5, 0.0)], ShapeBuilder::Pie);
        assert!(rebuild(&mut host));
        assert!(matches!(host.shape, ShapeEnum::Bezier(_)));
        let before = host.shape.point_list().to_vec();

        let veto = Rc::new(Veto { asked: Cell::new(0) });
        host.shape.add_observer(veto.clone());
        host.reshape[1].set_to_point(pt(0.25, 0.0));
        assert!(!rebuild(&mut host));
        assert_eq!(veto.asked.get(), 1);
        assert_eq!(host.shape.point_list(), before.as_slice());
        assert!(host.shape.is_closed());
    }

    #[test]
    fn rebuild_without_builder_does_nothing() {
        let (mut host, _) = host(&[], ShapeBuilder::Arc);
        assert!(!rebuild(&mut host));
        assert!(matches!(host.shape, ShapeEnum::Rectangle(_)));
    }
}
