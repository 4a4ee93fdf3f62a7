//! Reshape handles: coordinates that store shape parameters rather than
//! positions, plus the rules mapping a drag position to those parameters.

use std::f64::consts::TAU;

use super::{Coord, Coordinate, PointSource};
use crate::formula::Expression;
use crate::graph::ItemContext;
use crate::log::debug;
use crate::persist::{Reader, Writer};
use crate::shape::ShapeBuilder;
use crate::types::{Point, pt};

/// How one axis of a reshape handle maps between position and parameter.
///
/// `extent` is the item size along the axis; `min`/`max` side are the
/// smaller/larger of width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReshapeType {
    /// Not draggable; the stored value is used as a position
    #[default]
    Fixed,
    Absolute,
    AbsoluteFromEnd,
    AbsoluteFromCenter,
    Extent,
    ExtentFromEnd,
    ExtentFromCenter,
    MinSide,
    MinSideFromEnd,
    MinSideFromCenter,
    MaxSide,
    MaxSideFromEnd,
    MaxSideFromCenter,
    /// Fraction of the item width on either axis
    Width,
    /// Fraction of the item height on either axis
    Height,
    /// Angle around the item center as a fraction of a full turn
    Angle,
    /// Distance from the item center relative to the half extents
    Radial,
    /// Raw position, interpreted by the shape builder
    Custom,
}

const ALL_TYPES: [ReshapeType; 18] = [
    ReshapeType::Fixed,
    ReshapeType::Absolute,
    ReshapeType::AbsoluteFromEnd,
    ReshapeType::AbsoluteFromCenter,
    ReshapeType::Extent,
    ReshapeType::ExtentFromEnd,
    ReshapeType::ExtentFromCenter,
    ReshapeType::MinSide,
    ReshapeType::MinSideFromEnd,
    ReshapeType::MinSideFromCenter,
    ReshapeType::MaxSide,
    ReshapeType::MaxSideFromEnd,
    ReshapeType::MaxSideFromCenter,
    ReshapeType::Width,
    ReshapeType::Height,
    ReshapeType::Angle,
    ReshapeType::Radial,
    ReshapeType::Custom,
];

/// Item extents seen by one axis
#[derive(Debug, Clone, Copy)]
struct AxisFrame {
    extent: f64,
    width: f64,
    height: f64,
}

impl AxisFrame {
    fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    fn max_side(&self) -> f64 {
        self.width.max(self.height)
    }
}

fn ratio(value: f64, unit: f64) -> f64 {
    if unit == 0.0 { 0.0 } else { value / unit }
}

impl ReshapeType {
    /// Persisted numeric code
    pub fn code(self) -> u8 {
        // ALL_TYPES lists every variant once, in code order
        ALL_TYPES.iter().position(|t| *t == self).unwrap_or(0) as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        ALL_TYPES.get(code as usize).copied()
    }

    /// Types that need both axes at once
    pub fn is_polar(self) -> bool {
        matches!(self, ReshapeType::Angle | ReshapeType::Radial)
    }

    /// Parameter for a single-axis drag position; None for fixed and polar types
    fn to_parameter(self, pos: f64, frame: AxisFrame) -> Option<f64> {
        let e = frame.extent;
        let v = match self {
            ReshapeType::Fixed | ReshapeType::Angle => return None,
            ReshapeType::Radial => ratio((pos - e / 2.0).abs(), e / 2.0),
            ReshapeType::Absolute | ReshapeType::Custom => pos,
            ReshapeType::AbsoluteFromEnd => e - pos,
            ReshapeType::AbsoluteFromCenter => pos - e / 2.0,
            ReshapeType::Extent => ratio(pos, e),
            ReshapeType::ExtentFromEnd => ratio(e - pos, e),
            ReshapeType::ExtentFromCenter => ratio(pos - e / 2.0, e),
            ReshapeType::MinSide => ratio(pos, frame.min_side()),
            ReshapeType::MinSideFromEnd => ratio(e - pos, frame.min_side()),
            ReshapeType::MinSideFromCenter => ratio(pos - e / 2.0, frame.min_side()),
            ReshapeType::MaxSide => ratio(pos, frame.max_side()),
            ReshapeType::MaxSideFromEnd => ratio(e - pos, frame.max_side()),
            ReshapeType::MaxSideFromCenter => ratio(pos - e / 2.0, frame.max_side()),
            ReshapeType::Width => ratio(pos, frame.width),
            ReshapeType::Height => ratio(pos, frame.height),
        };
        Some(v)
    }

    /// Position along the axis for a stored parameter
    fn to_position(self, v: f64, frame: AxisFrame) -> f64 {
        let e = frame.extent;
        match self {
            ReshapeType::Fixed | ReshapeType::Absolute | ReshapeType::Custom | ReshapeType::Angle => v,
            ReshapeType::Radial => e / 2.0 + v * e / 2.0,
            ReshapeType::AbsoluteFromEnd => e - v,
            ReshapeType::AbsoluteFromCenter => e / 2.0 + v,
            ReshapeType::Extent => v * e,
            ReshapeType::ExtentFromEnd => e - v * e,
            ReshapeType::ExtentFromCenter => e / 2.0 + v * e,
            ReshapeType::MinSide => v * frame.min_side(),
            ReshapeType::MinSideFromEnd => e - v * frame.min_side(),
            ReshapeType::MinSideFromCenter => e / 2.0 + v * frame.min_side(),
            ReshapeType::MaxSide => v * frame.max_side(),
            ReshapeType::MaxSideFromEnd => e - v * frame.max_side(),
            ReshapeType::MaxSideFromCenter => e / 2.0 + v * frame.max_side(),
            ReshapeType::Width => v * frame.width,
            ReshapeType::Height => v * frame.height,
        }
    }
}

/// Map a legacy single `type` code onto an (x, y) type pair
pub fn legacy_types(code: u8) -> Option<(ReshapeType, ReshapeType)> {
    use ReshapeType::*;
    let pair = match code {
        0 => (Extent, Fixed),
        1 => (ExtentFromEnd, Fixed),
        2 => (Fixed, Extent),
        3 => (Fixed, ExtentFromEnd),
        4 => (MinSide, Fixed),
        5 => (Fixed, MinSide),
        6 => (Extent, Extent),
        7 => (Angle, Radial),
        _ => return None,
    };
    Some(pair)
}

/// A named, draggable shape parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ReshapeCoordinate {
    coordinate: Coordinate,
    name: String,
    x_type: ReshapeType,
    y_type: ReshapeType,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    builder: Option<ShapeBuilder>,
}

impl Default for ReshapeCoordinate {
    fn default() -> Self {
        ReshapeCoordinate {
            coordinate: Coordinate::default(),
            name: String::new(),
            x_type: ReshapeType::Fixed,
            y_type: ReshapeType::Fixed,
            x_min: f64::NEG_INFINITY,
            x_max: f64::INFINITY,
            y_min: f64::NEG_INFINITY,
            y_max: f64::INFINITY,
            builder: None,
        }
    }
}

impl ReshapeCoordinate {
    pub fn new(name: impl Into<String>, coordinate: Coordinate, x_type: ReshapeType, y_type: ReshapeType) -> Self {
        ReshapeCoordinate {
            coordinate,
            name: name.into(),
            x_type,
            y_type,
            ..Default::default()
        }
    }

    pub fn with_x_range(mut self, min: f64, max: f64) -> Self {
        self.x_min = min;
        self.x_max = max;
        self
    }

    pub fn with_y_range(mut self, min: f64, max: f64) -> Self {
        self.y_min = min;
        self.y_max = max;
        self
    }

    pub fn with_builder(mut self, builder: ShapeBuilder) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn x_type(&self) -> ReshapeType {
        self.x_type
    }

    pub fn y_type(&self) -> ReshapeType {
        self.y_type
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    pub fn builder(&self) -> Option<ShapeBuilder> {
        self.builder
    }

    /// Deep copy of every field of `other`
    pub fn set_to_reshape(&mut self, other: &ReshapeCoordinate) -> bool {
        if self == other {
            return false;
        }
        *self = other.clone();
        true
    }

    /// Current parameter pair, one value per axis
    pub fn parameters(&self) -> Point {
        self.coordinate.to_point()
    }

    /// Update the parameters from a drag to `local` inside a `width` x `height` item.
    ///
    /// Fixed axes keep their value and results are clamped to the axis
    /// ranges. Returns true if a parameter changed.
    pub fn map_drag(&mut self, local: Point, width: f64, height: f64) -> bool {
        let mut x = None;
        let mut y = None;

        if self.x_type == ReshapeType::Angle || self.y_type == ReshapeType::Angle {
            let n = pt(
                ratio(local.x - width / 2.0, width / 2.0),
                ratio(local.y - height / 2.0, height / 2.0),
            );
            let angle = n.y.atan2(n.x).rem_euclid(TAU) / TAU;
            let radius = n.length();
            if self.x_type == ReshapeType::Angle {
                x = Some(angle);
                if self.y_type == ReshapeType::Radial {
                    y = Some(radius);
                }
            } else {
                y = Some(angle);
                if self.x_type == ReshapeType::Radial {
                    x = Some(radius);
                }
            }
        }

        let frame_x = AxisFrame { extent: width, width, height };
        let frame_y = AxisFrame { extent: height, width, height };
        let x = x.or_else(|| self.x_type.to_parameter(local.x, frame_x));
        let y = y.or_else(|| self.y_type.to_parameter(local.y, frame_y));

        let mut changed = false;
        if let Some(x) = x {
            changed |= self.coordinate.set_x(Expression::number(x.max(self.x_min).min(self.x_max)));
        }
        if let Some(y) = y {
            changed |= self.coordinate.set_y(Expression::number(y.max(self.y_min).min(self.y_max)));
        }
        debug!(name = %self.name, changed, "reshape drag mapped");
        changed
    }

    /// Where the handle sits inside a `width` x `height` item
    pub fn handle_position(&self, width: f64, height: f64) -> Point {
        let v = self.parameters();
        let polar = match (self.x_type, self.y_type) {
            (ReshapeType::Angle, ReshapeType::Radial) => Some((v.x, v.y)),
            (ReshapeType::Angle, _) => Some((v.x, 1.0)),
            (ReshapeType::Radial, ReshapeType::Angle) => Some((v.y, v.x)),
            (_, ReshapeType::Angle) => Some((v.y, 1.0)),
            _ => None,
        };
        if let Some((angle, radius)) = polar {
            let a = angle * TAU;
            return pt(
                width / 2.0 + width / 2.0 * radius * a.cos(),
                height / 2.0 + height / 2.0 * radius * a.sin(),
            );
        }
        pt(
            self.x_type.to_position(v.x, AxisFrame { extent: width, width, height }),
            self.y_type.to_position(v.y, AxisFrame { extent: height, width, height }),
        )
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        let code = |name: &str| reader.number(node, name).map(|v| v as u8);
        let (x_type, y_type) = match code("type").and_then(legacy_types) {
            Some(pair) => pair,
            None => (
                code("xtype").and_then(ReshapeType::from_code).unwrap_or_default(),
                code("ytype").and_then(ReshapeType::from_code).unwrap_or_default(),
            ),
        };
        let builder = reader.attribute(node, "b").and_then(|name| match name.parse() {
            Ok(b) => Some(b),
            Err(_) => {
                debug!(name, "unknown shape builder");
                None
            }
        });
        ReshapeCoordinate {
            coordinate: Coordinate::read(reader, node),
            name: reader.attribute(node, "n").unwrap_or_default().to_string(),
            x_type,
            y_type,
            x_min: reader.number(node, "xmin").unwrap_or(f64::NEG_INFINITY),
            x_max: reader.number(node, "xmax").unwrap_or(f64::INFINITY),
            y_min: reader.number(node, "ymin").unwrap_or(f64::NEG_INFINITY),
            y_max: reader.number(node, "ymax").unwrap_or(f64::INFINITY),
            builder,
        }
    }
}

impl PointSource for ReshapeCoordinate {
    fn to_point(&self) -> Point {
        self.coordinate.to_point()
    }

    fn set_to_point(&mut self, point: Point) -> bool {
        self.coordinate.set_to_point(point)
    }

    fn set_x(&mut self, x: Expression) -> bool {
        self.coordinate.set_x(x)
    }

    fn set_y(&mut self, y: Expression) -> bool {
        self.coordinate.set_y(y)
    }

    fn translate(&mut self, dx: f64, dy: f64) -> bool {
        self.coordinate.translate(dx, dy)
    }

    fn expressions(&self) -> (Expression, Expression) {
        self.coordinate.expressions()
    }

    fn copy(&self) -> Coord {
        Coord::Reshape(self.clone())
    }

    fn evaluate(&mut self, item: &dyn ItemContext) -> bool {
        self.coordinate.evaluate(item)
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        writer.write_start_element(name);
        writer.write_attribute_string("n", &self.name);
        writer.write_attribute_number("xtype", self.x_type.code() as f64);
        writer.write_attribute_number("ytype", self.y_type.code() as f64);
        for (key, value) in [
            ("xmin", self.x_min),
            ("xmax", self.x_max),
            ("ymin", self.y_min),
            ("ymax", self.y_max),
        ] {
            if value.is_finite() {
                writer.write_attribute_number(key, value);
            }
        }
        if let Some(builder) = self.builder {
            writer.write_attribute_string("b", builder.name());
        }
        self.coordinate.write_body(writer);
        writer.write_end_element();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{Element, ElementReader, ElementWriter};

    #[test]
    fn type_codes_round_trip() {
        for t in ALL_TYPES {
            assert_eq!(ReshapeType::from_code(t.code()), Some(t));
        }
        assert_eq!(ReshapeType::from_code(18), None);
    }

    #[test]
    fn drag_maps_to_clamped_fraction() {
        let start = Coordinate::from_xy(0.25, 0.0);
        let mut rc = ReshapeCoordinate::new("start", start, ReshapeType::Extent, ReshapeType::Fixed)
            .with_x_range(0.0, 1.0);
        assert!(rc.map_drag(pt(1500.0, 700.0), 3000.0, 2000.0));
        assert_eq!(rc.parameters(), pt(0.5, 0.0));

        rc.map_drag(pt(4500.0, 0.0), 3000.0, 2000.0);
        assert_eq!(rc.parameters().x, 1.0);
        assert_eq!(rc.handle_position(3000.0, 2000.0), pt(3000.0, 0.0));
    }

    #[test]
    fn polar_drag() {
        let mut rc = ReshapeCoordinate::new("angle", Coordinate::default(), ReshapeType::Angle, ReshapeType::Radial);
        // straight below the center, on the ellipse
        rc.map_drag(pt(50.0, 100.0), 100.0, 100.0);
        let p = rc.parameters();
        assert!((p.x - 0.25).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
        let h = rc.handle_position(100.0, 100.0);
        assert!((h - pt(50.0, 100.0)).length() < 1e-9);
    }

    #[test]
    fn reads_legacy_type() {
        let mut node = Element::new("rc");
        node.attributes.push(("n".into(), "tip".into()));
        node.attributes.push(("type".into(), "3".into()));
        node.attributes.push(("x".into(), "0".into()));
        node.attributes.push(("y".into(), "0.5".into()));
        let rc = ReshapeCoordinate::read(&ElementReader, &node);
        assert_eq!((rc.x_type(), rc.y_type()), (ReshapeType::Fixed, ReshapeType::ExtentFromEnd));
        assert_eq!(rc.name(), "tip");
    }

    #[test]
    fn save_writes_current_form() {
        let start = Coordinate::from_xy(0.25, 0.0);
        let rc = ReshapeCoordinate::new("start", start, ReshapeType::Extent, ReshapeType::Fixed)
            .with_x_range(0.0, 1.0)
            .with_builder(ShapeBuilder::Arc);
        let mut w = ElementWriter::new();
        rc.save("rc", &mut w);
        let root = w.into_element().unwrap();
        insta::assert_snapshot!(
            root.to_xml(),
            @r#"<rc n="start" xtype="4" ytype="0" xmin="0" xmax="1" b="ARC" x="0.25" y="0"/>"#
        );
        assert_eq!(ReshapeCoordinate::read(&ElementReader, &root), rc);
    }
}
