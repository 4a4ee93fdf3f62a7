//! End-to-end scenarios across coordinates, shapes and attribute lists

use std::cell::Cell;
use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use shapegraph::attr::{Attribute, AttributeList, FillStyle, Parent, RangeConstraint};
use shapegraph::coord::{BezierCoordinate, BezierPoint, CpCoord, ReshapeCoordinate, ReshapeType, shared};
use shapegraph::defaults::{CUBIC_STEPS, KAPPA};
use shapegraph::persist::{Element, ElementReader};
use shapegraph::shape::{
    BezierLineShape, BezierShape, PolygonShape, ShapeEvent, ShapeObserver, Verdict, arc_alpha,
};
use shapegraph::types::pt;
use shapegraph::{Coord, Coordinate, Expression, PointSource, Shape, Value};

fn bezier(main: (f64, f64), cp_to: (f64, f64), cp_from: (f64, f64)) -> BezierCoordinate {
    BezierCoordinate::with_control_points(
        Coordinate::from_xy(main.0, main.1),
        Coordinate::from_xy(cp_to.0, cp_to.1),
        Coordinate::from_xy(cp_from.0, cp_from.1),
    )
}

#[test]
fn bezier_control_points_move_rigidly() {
    let mut c = bezier((10.0, 10.0), (30.0, 5.0), (-10.0, 15.0));

    for (dx, dy) in [(5.0, -3.0), (-100.0, 0.0), (0.25, 0.75)] {
        let (to, from) = (c.cp_to_point(), c.cp_from_point());
        c.translate(dx, dy);
        assert_eq!(c.cp_to_point() - to, pt(dx, dy));
        assert_eq!(c.cp_from_point() - from, pt(dx, dy));
    }

    let (to, from) = (c.cp_to_point(), c.cp_from_point());
    let old = c.to_point();
    c.set_x(Expression::number(old.x + 7.0));
    c.set_y(Expression::number(old.y - 2.0));
    assert_eq!(c.cp_to_point() - to, pt(7.0, -2.0));
    assert_eq!(c.cp_from_point() - from, pt(7.0, -2.0));
}

#[test]
fn control_point_follows_live_origin() {
    let origin = shared(Coordinate::from_xy(100.0, 100.0));
    let mut cp = CpCoord::new(origin.clone());
    cp.set_to_point(pt(120.0, 90.0));
    assert_eq!(cp.offset(), pt(20.0, -10.0));

    for target in [pt(0.0, 0.0), pt(-50.0, 300.0)] {
        origin.borrow_mut().set_to_point(target);
        assert_eq!(cp.to_point(), target + pt(20.0, -10.0));
    }
    origin.borrow_mut().translate(1.0, 1.0);
    assert_eq!(cp.to_point(), pt(-29.0, 291.0));
}

#[test]
fn attribute_copy_on_write_and_reset() {
    let mut defaults = AttributeList::new("format");
    defaults.add_attribute(Attribute::new("A", 1.0));
    let template = defaults.into_template("ScenarioFormat");
    let mut list = AttributeList::new("format").with_parent(Parent::template(template.clone()));

    assert!(list.set_attribute("A", 2.0));
    assert_eq!(template.list().get_value("A"), Some(Value::Number(1.0)));
    assert_eq!(list.get_value("A"), Some(Value::Number(2.0)));

    list.reset();
    assert_eq!(list.get_value("A"), Some(Value::Number(1.0)));
    assert!(!list.has_local("A"));
}

#[test]
fn unknown_attribute_is_a_no_op() {
    let mut defaults = AttributeList::new("format");
    defaults.add_attribute(Attribute::new("A", 1.0));
    let mut list = AttributeList::new("format").with_parent(Parent::template(defaults.into_template("Scenario")));

    assert!(!list.set_attribute("doesNotExist", 5.0));
    assert!(!list.has_local("doesNotExist"));
    assert!(list.get_attribute("doesNotExist").is_none());
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
fn vetoed_add_leaves_shape_untouched() {
    let mut shape = PolygonShape::from_points(&[pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0)], true);
    let veto = Rc::new(Veto { asked: Cell::new(0) });
    shape.add_observer(veto.clone());

    let before_points = shape.point_list().to_vec();
    let before_coords: Vec<_> = shape.coordinates().iter().map(|c| c.to_point()).collect();
    assert!(!shape.add_coordinate(Coord::from_point(pt(0.0, 100.0))));

    assert_eq!(veto.asked.get(), 1);
    assert_eq!(shape.point_list(), before_points.as_slice());
    let after_coords: Vec<_> = shape.coordinates().iter().map(|c| c.to_point()).collect();
    assert_eq!(after_coords, before_coords);
}

#[test]
fn polygon_keeps_two_coordinates() {
    let mut shape = PolygonShape::from_points(&[pt(0.0, 0.0), pt(10.0, 10.0)], false);
    assert!(shape.remove_coordinate_at(0).is_none());
    assert_eq!(shape.coordinate_count(), 2);

    assert!(!shape.set_coordinates(vec![Coord::from_point(pt(5.0, 5.0))]));
    assert_eq!(shape.coordinate_count(), 2);
}

#[test]
fn interpolation_hits_the_end_points() {
    let points = [pt(0.0, 0.0), pt(100.0, 0.0), pt(50.0, 100.0)];

    let open = BezierShape::from_points(&points, false);
    let list = open.point_list();
    assert_eq!(list.first(), Some(&points[0]));
    assert_eq!(list.last(), Some(&points[2]));

    let closed = BezierShape::from_points(&points, true);
    let list = closed.point_list();
    assert_eq!(list.first(), Some(&points[0]));
    assert_eq!(list.last(), Some(&points[0]));
    // one curved segment per vertex
    assert_eq!(list.len(), 1 + points.len() * CUBIC_STEPS);
}

#[test]
fn quarter_turn_arc_alpha() {
    let alpha = arc_alpha(FRAC_PI_2);
    assert!((alpha - (7f64.sqrt() - 1.0) / 3.0).abs() < 1e-12);
    // close to the circle constant, not equal to it
    assert!((alpha - KAPPA).abs() < 5e-3);
}

#[test]
fn range_constraint_falls_back() {
    let range = RangeConstraint::from_properties_of(&[("A", 0.0), ("B", 1.0)], 0.0);
    assert_eq!(range.get_value(&Value::Number(99.0)), Value::Number(0.0));
    assert_eq!(range.get_value(&Value::Number(1.0)), Value::Number(1.0));

    let fill = RangeConstraint::from_properties_of(FillStyle::PROPERTIES, FillStyle::SOLID);
    assert_eq!(fill.get_value(&Value::Number(FillStyle::PATTERN)), Value::Number(FillStyle::PATTERN));
}

#[test]
fn straight_bezier_line_emits_end_points_only() {
    let mut line = BezierLineShape::from_coordinates(vec![
        Coord::Bezier(BezierCoordinate::new(Coordinate::from_xy(0.0, 0.0))),
        Coord::Bezier(BezierCoordinate::new(Coordinate::from_xy(100.0, 0.0))),
    ]);
    line.set_cp_to_coord_at_to(0, &Coordinate::from_point(pt(20.0, 0.0)));
    line.set_cp_from_coord_at_to(1, &Coordinate::from_point(pt(80.0, 0.0)));

    let points = line.point_list();
    assert!(points.iter().all(|p| p.y == 0.0));
    assert_eq!(points.len(), 2);
}

#[test]
fn legacy_and_current_reshape_forms_agree() {
    let mut legacy = Element::new("rc");
    legacy.attributes = vec![
        ("n".into(), "tip".into()),
        ("type".into(), "3".into()),
        ("x".into(), "0".into()),
        ("y".into(), "0.5".into()),
    ];

    let mut current = Element::new("rc");
    current.attributes = vec![
        ("n".into(), "tip".into()),
        ("xtype".into(), ReshapeType::Fixed.code().to_string()),
        ("ytype".into(), ReshapeType::ExtentFromEnd.code().to_string()),
        ("x".into(), "0".into()),
        ("y".into(), "0.5".into()),
    ];

    let a = ReshapeCoordinate::read(&ElementReader, &legacy);
    let b = ReshapeCoordinate::read(&ElementReader, &current);
    assert_eq!(a, b);
    assert_eq!(a.parameters(), pt(0.0, 0.5));
}
