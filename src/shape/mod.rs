//! Shapes: coordinate lists flattened into point lists for hit testing,
//! port lookup and outline generation.
//!
//! Every shape implements [`Shape`]; [`ShapeEnum`] dispatches over the
//! concrete kinds. Structural edits go through the provided mutators, which
//! raise a vetoable pre-event, apply the edit, refresh the point list and
//! raise a post-event.

mod bezier;
pub mod builder;
pub mod curve;
mod path;
pub mod ports;
mod shapes;

use std::fmt;
use std::rc::Rc;

use enum_dispatch::enum_dispatch;

pub use bezier::{BezierLineShape, BezierShape};
pub use builder::{BuilderHost, BuiltShape, ShapeBuilder, arc_alpha, rebuild};
pub use path::{PathCommand, PathShape};
pub use ports::PortMode;
pub use shapes::{EllipseShape, LineShape, PolygonShape, RectangleShape};

use crate::coord::{Coord, PointSource};
use crate::graph::{ItemContext, SelectionMode};
use crate::log::debug;
use crate::persist::{Reader, Writer};
use crate::theme::Theme;
use crate::types::{BBox, Point, distance_to_polyline, point_in_polygon};

/// Kind of structural edit announced to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeEventKind {
    CoordinateAdd,
    CoordinatesInsert,
    CoordinateRemove,
    CoordinatesRemove,
    CoordinateSet,
    CoordinatesSet,
}

/// A structural edit covering `count` coordinates starting at `index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeEvent {
    pub kind: ShapeEventKind,
    pub index: usize,
    pub count: usize,
}

impl ShapeEvent {
    pub fn new(kind: ShapeEventKind, index: usize, count: usize) -> Self {
        ShapeEvent { kind, index, count }
    }
}

/// Observer answer to a pre-event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Proceed,
    Cancel,
}

/// Listener for structural shape edits. Any `Cancel` vetoes the edit.
pub trait ShapeObserver {
    fn before_change(&self, _event: &ShapeEvent) -> Verdict {
        Verdict::Proceed
    }

    fn after_change(&self, _event: &ShapeEvent) {}
}

/// How [`Shape::contains_point`] decides between area and border hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindFlag {
    /// Follow the owning item's selection mode
    #[default]
    Default,
    /// Inside the area or near the border
    AreaWithFrame,
}

/// State shared by every shape kind
#[derive(Clone, Default)]
pub struct ShapeCore {
    coordinates: Vec<Coord>,
    point_list: Vec<Point>,
    refresh_suspended: u32,
    notification_suspended: u32,
    observers: Vec<Rc<dyn ShapeObserver>>,
    item: Option<Rc<dyn ItemContext>>,
}

impl fmt::Debug for ShapeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeCore")
            .field("coordinates", &self.coordinates)
            .field("point_list", &self.point_list.len())
            .field("refresh_suspended", &self.refresh_suspended)
            .field("observers", &self.observers.len())
            .field("attached", &self.item.is_some())
            .finish()
    }
}

impl ShapeCore {
    pub fn new(coordinates: Vec<Coord>) -> Self {
        ShapeCore {
            coordinates,
            ..Default::default()
        }
    }

    fn before_change(&self, event: &ShapeEvent) -> bool {
        if self.notification_suspended > 0 {
            return true;
        }
        let vetoed = self
            .observers
            .iter()
            .any(|o| o.before_change(event) == Verdict::Cancel);
        if vetoed {
            debug!(?event, "shape edit vetoed");
        }
        !vetoed
    }

    fn after_change(&self, event: &ShapeEvent) {
        if self.notification_suspended > 0 {
            return;
        }
        for o in &self.observers {
            o.after_change(event);
        }
    }

    /// Evaluate `range` against the owning item unless it is still loading
    fn evaluate_range(&mut self, range: std::ops::Range<usize>) {
        let Some(item) = self.item.clone() else {
            return;
        };
        if item.is_loading() {
            return;
        }
        for c in &mut self.coordinates[range] {
            c.evaluate(item.as_ref());
        }
    }

    /// Move item attachment and observers from `other`, leaving geometry alone
    pub fn adopt_attachments(&mut self, other: &mut ShapeCore) {
        self.item = other.item.take();
        self.observers = std::mem::take(&mut other.observers);
    }
}

/// Behaviour shared by every shape kind
#[enum_dispatch]
pub trait Shape {
    fn core(&self) -> &ShapeCore;
    fn core_mut(&mut self) -> &mut ShapeCore;

    /// Persisted type name
    fn type_name(&self) -> &'static str;

    fn is_closed(&self) -> bool {
        true
    }

    /// Fewest coordinates the shape may be left with
    fn min_coordinates(&self) -> usize {
        0
    }

    /// Flatten the coordinates into the outline point list
    fn build_point_list(&self) -> Vec<Point> {
        self.core().coordinates.iter().map(|c| c.to_point()).collect()
    }

    /// Convert a coordinate before it joins the shape
    fn prepare_coordinate(&self, coord: Coord) -> Coord {
        coord
    }

    /// Keep parallel per-coordinate data in step with an insert
    fn coordinates_inserted(&mut self, _index: usize, _count: usize) {}

    fn coordinates_removed(&mut self, _index: usize, _count: usize) {}

    /// Called after the whole coordinate list was replaced
    fn coordinates_replaced(&mut self) {}

    /// Evaluate any extra coordinates the shape owns beyond its main list
    fn evaluate_extra(&mut self, _item: &dyn ItemContext) -> bool {
        false
    }

    /// Write kind-specific attributes and children
    fn save_extra(&self, _writer: &mut dyn Writer) {}

    fn coordinates(&self) -> &[Coord] {
        &self.core().coordinates
    }

    fn coordinate_count(&self) -> usize {
        self.core().coordinates.len()
    }

    fn coordinate_at(&self, index: usize) -> Option<&Coord> {
        self.core().coordinates.get(index)
    }

    fn point_list(&self) -> &[Point] {
        &self.core().point_list
    }

    fn bounding_box(&self) -> BBox {
        BBox::from_points(self.point_list())
    }

    fn item(&self) -> Option<Rc<dyn ItemContext>> {
        self.core().item.clone()
    }

    /// Attach to the item whose size the formulas read
    fn set_item(&mut self, item: Rc<dyn ItemContext>) {
        self.core_mut().item = Some(item);
    }

    fn add_observer(&mut self, observer: Rc<dyn ShapeObserver>) {
        self.core_mut().observers.push(observer);
    }

    /// Nestable: every `false` needs a matching `true`. The point list is
    /// rebuilt once the last suspension is lifted.
    fn enable_refresh(&mut self, enable: bool) {
        let core = self.core_mut();
        if enable {
            core.refresh_suspended = core.refresh_suspended.saturating_sub(1);
            if core.refresh_suspended == 0 {
                self.refresh();
            }
        } else {
            core.refresh_suspended += 1;
        }
    }

    /// Nestable like [`Shape::enable_refresh`]
    fn enable_notification(&mut self, enable: bool) {
        let core = self.core_mut();
        if enable {
            core.notification_suspended = core.notification_suspended.saturating_sub(1);
        } else {
            core.notification_suspended += 1;
        }
    }

    fn is_refresh_enabled(&self) -> bool {
        self.core().refresh_suspended == 0
    }

    /// Rebuild the point list unless refresh is suspended
    fn refresh(&mut self) {
        if !self.is_refresh_enabled() {
            return;
        }
        let points = self.build_point_list();
        self.core_mut().point_list = points;
    }

    /// Re-evaluate every coordinate against the owning item, then refresh
    fn evaluate(&mut self) -> bool {
        let mut changed = false;
        if let Some(item) = self.item() {
            for c in &mut self.core_mut().coordinates {
                changed |= c.evaluate(item.as_ref());
            }
            changed |= self.evaluate_extra(item.as_ref());
        }
        self.refresh();
        changed
    }

    fn add_coordinate(&mut self, coord: Coord) -> bool {
        let index = self.coordinate_count();
        insert_coordinates(self, ShapeEventKind::CoordinateAdd, index, vec![coord])
    }

    fn insert_coordinates_at(&mut self, index: usize, coords: Vec<Coord>) -> bool {
        if index > self.coordinate_count() || coords.is_empty() {
            return false;
        }
        insert_coordinates(self, ShapeEventKind::CoordinatesInsert, index, coords)
    }

    /// Remove one coordinate; refused when it would drop below the minimum
    fn remove_coordinate_at(&mut self, index: usize) -> Option<Coord> {
        remove_coordinates(self, ShapeEventKind::CoordinateRemove, index, 1).and_then(|mut v| v.pop())
    }

    fn remove_coordinates_at(&mut self, index: usize, count: usize) -> bool {
        remove_coordinates(self, ShapeEventKind::CoordinatesRemove, index, count).is_some()
    }

    fn set_coordinate_at(&mut self, index: usize, coord: Coord) -> bool {
        if index >= self.coordinate_count() {
            return false;
        }
        let event = ShapeEvent::new(ShapeEventKind::CoordinateSet, index, 1);
        if !self.core().before_change(&event) {
            return false;
        }
        let coord = self.prepare_coordinate(coord);
        let core = self.core_mut();
        core.coordinates[index] = coord;
        core.evaluate_range(index..index + 1);
        self.refresh();
        self.core().after_change(&event);
        true
    }

    /// Move the coordinate at `index` to a literal position
    fn set_coordinate_at_to(&mut self, index: usize, point: Point) -> bool {
        if index >= self.coordinate_count() {
            return false;
        }
        let event = ShapeEvent::new(ShapeEventKind::CoordinateSet, index, 1);
        if !self.core().before_change(&event) {
            return false;
        }
        let changed = self.core_mut().coordinates[index].set_to_point(point);
        self.refresh();
        self.core().after_change(&event);
        changed
    }

    /// Replace the whole coordinate list
    fn set_coordinates(&mut self, coords: Vec<Coord>) -> bool {
        if coords.len() < self.min_coordinates() {
            debug!(count = coords.len(), "too few coordinates for shape");
            return false;
        }
        let event = ShapeEvent::new(ShapeEventKind::CoordinatesSet, 0, coords.len());
        if !self.core().before_change(&event) {
            return false;
        }
        let coords: Vec<Coord> = coords.into_iter().map(|c| self.prepare_coordinate(c)).collect();
        let count = coords.len();
        let core = self.core_mut();
        core.coordinates = coords;
        core.evaluate_range(0..count);
        self.coordinates_replaced();
        self.refresh();
        self.core().after_change(&event);
        true
    }

    /// Hit test against the flattened outline
    fn contains_point(&self, point: Point, flag: FindFlag) -> bool {
        let points = self.point_list();
        let closed = self.is_closed();
        let inside = || closed && point_in_polygon(point, points);
        let radius = Theme::current().find_radius;
        let near_border = || distance_to_polyline(point, points, closed) <= radius;

        match flag {
            FindFlag::AreaWithFrame => inside() || near_border(),
            FindFlag::Default => {
                let use_area = match self.item() {
                    Some(item) => {
                        let mode = item.selection_mode();
                        if mode.contains(SelectionMode::AREA) {
                            true
                        } else if mode.contains(SelectionMode::BORDER) {
                            false
                        } else {
                            item.has_children() || item.has_fill()
                        }
                    }
                    None => true,
                };
                if use_area && closed { inside() } else { near_border() }
            }
        }
    }

    /// Every port candidate the mode allows, in the item's frame
    fn valid_port_locations(&self, mode: PortMode) -> Vec<Point> {
        let vertices: Vec<Point> = self.coordinates().iter().map(|c| c.to_point()).collect();
        ports::candidates(mode, &vertices, self.is_closed(), port_frame(self))
    }

    /// Nearest allowed port location within `tolerance` of `point`
    fn valid_port_location(&self, point: Point, mode: PortMode, tolerance: f64) -> Option<Point> {
        let candidates = self.valid_port_locations(mode);
        ports::nearest(point, &candidates, tolerance).or_else(|| {
            if mode.contains(PortMode::SHAPE_BORDER) {
                ports::nearest_on_outline(point, self.point_list(), self.is_closed(), tolerance)
            } else {
                None
            }
        })
    }

    fn save(&self, writer: &mut dyn Writer) {
        writer.write_start_element("shape");
        writer.write_attribute_string("type", self.type_name());
        self.save_extra(writer);
        for c in self.coordinates() {
            c.save("c", writer);
        }
        writer.write_end_element();
    }
}

/// Local frame used for relative port locations: the item's size when
/// attached, the outline's bounds otherwise
fn port_frame<S: Shape + ?Sized>(shape: &S) -> (Point, Point) {
    match shape.item() {
        Some(item) => (Point::ZERO, Point::new(item.width(), item.height())),
        None => {
            let bbox = shape.bounding_box();
            if bbox.is_empty() {
                (Point::ZERO, Point::ZERO)
            } else {
                (bbox.min, Point::new(bbox.width(), bbox.height()))
            }
        }
    }
}

fn insert_coordinates<S: Shape + ?Sized>(
    shape: &mut S,
    kind: ShapeEventKind,
    index: usize,
    coords: Vec<Coord>,
) -> bool {
    let count = coords.len();
    let event = ShapeEvent::new(kind, index, count);
    if !shape.core().before_change(&event) {
        return false;
    }
    let coords: Vec<Coord> = coords.into_iter().map(|c| shape.prepare_coordinate(c)).collect();
    let core = shape.core_mut();
    core.coordinates.splice(index..index, coords);
    core.evaluate_range(index..index + count);
    shape.coordinates_inserted(index, count);
    shape.refresh();
    shape.core().after_change(&event);
    true
}

fn remove_coordinates<S: Shape + ?Sized>(
    shape: &mut S,
    kind: ShapeEventKind,
    index: usize,
    count: usize,
) -> Option<Vec<Coord>> {
    let len = shape.coordinate_count();
    if count == 0 || index >= len {
        return None;
    }
    let count = count.min(len - index);
    if len - count < shape.min_coordinates() {
        debug!(len, count, "refusing to remove below minimum coordinate count");
        return None;
    }
    let event = ShapeEvent::new(kind, index, count);
    if !shape.core().before_change(&event) {
        return None;
    }
    let removed: Vec<Coord> = shape.core_mut().coordinates.drain(index..index + count).collect();
    shape.coordinates_removed(index, count);
    shape.refresh();
    shape.core().after_change(&event);
    Some(removed)
}

/// Run `edit` with refresh and notifications suspended, then refresh once
pub fn batch<S: Shape + ?Sized, R>(shape: &mut S, edit: impl FnOnce(&mut S) -> R) -> R {
    shape.enable_notification(false);
    shape.enable_refresh(false);
    let result = edit(shape);
    shape.enable_refresh(true);
    shape.enable_notification(true);
    result
}

/// Any shape
#[enum_dispatch(Shape)]
#[derive(Debug, Clone)]
pub enum ShapeEnum {
    Rectangle(RectangleShape),
    Polygon(PolygonShape),
    Line(LineShape),
    Bezier(BezierShape),
    BezierLine(BezierLineShape),
    Path(PathShape),
    Ellipse(EllipseShape),
}

impl ShapeEnum {
    /// Read a persisted shape; unknown types yield None
    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Option<ShapeEnum> {
        let coords = read_coordinates(reader, node);
        let mut shape: ShapeEnum = match reader.attribute(node, "type")? {
            "rectangle" => RectangleShape::from_coordinates(coords).into(),
            "polygon" => {
                let closed = reader.attribute(node, "closed") != Some("0");
                PolygonShape::from_coordinates(coords, closed).into()
            }
            "line" => LineShape::from_coordinates(coords).into(),
            "bezier" => BezierShape::read(reader, node, coords).into(),
            "bezierline" => BezierLineShape::from_coordinates(coords).into(),
            "path" => PathShape::read(reader, node, coords).into(),
            "ellipse" => EllipseShape::from_coordinates(coords).into(),
            other => {
                debug!(shape_type = other, "skipping unknown shape type");
                return None;
            }
        };
        shape.refresh();
        Some(shape)
    }
}

fn read_coordinates<R: Reader>(reader: &R, node: &R::Node) -> Vec<Coord> {
    reader
        .children(node)
        .into_iter()
        .filter(|c| reader.tag(c) == "c")
        .map(|c| Coord::read(reader, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::coord::Coordinate;
    use crate::graph::ItemFrame;
    use crate::persist::{ElementReader, ElementWriter};
    use crate::types::pt;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(ShapeEventKind, bool)>>,
        veto: Option<ShapeEventKind>,
    }

    impl ShapeObserver for Recorder {
        fn before_change(&self, event: &ShapeEvent) -> Verdict {
            self.seen.borrow_mut().push((event.kind, false));
            if self.veto == Some(event.kind) { Verdict::Cancel } else { Verdict::Proceed }
        }

        fn after_change(&self, event: &ShapeEvent) {
            self.seen.borrow_mut().push((event.kind, true));
        }
    }

    fn square() -> PolygonShape {
        PolygonShape::from_points(&[pt(0.0, 0.0), pt(1000.0, 0.0), pt(1000.0, 1000.0), pt(0.0, 1000.0)], true)
    }

    #[test]
    fn mutators_raise_pre_and_post_events() {
        let recorder = Rc::new(Recorder::default());
        let mut shape = square();
        shape.add_observer(recorder.clone());

        assert!(shape.add_coordinate(Coord::from_point(pt(500.0, 1500.0))));
        assert_eq!(shape.coordinate_count(), 5);
        assert_eq!(
            *recorder.seen.borrow(),
            vec![(ShapeEventKind::CoordinateAdd, false), (ShapeEventKind::CoordinateAdd, true)]
        );
    }

    #[test]
    fn veto_leaves_shape_untouched() {
        let recorder = Rc::new(Recorder {
            veto: Some(ShapeEventKind::CoordinateRemove),
            ..Default::default()
        });
        let mut shape = square();
        shape.add_observer(recorder.clone());

        assert!(shape.remove_coordinate_at(0).is_none());
        assert_eq!(shape.coordinate_count(), 4);
        assert_eq!(recorder.seen.borrow().len(), 1);
    }

    #[test]
    fn removal_respects_minimum() {
        let mut line = LineShape::new(pt(0.0, 0.0), pt(10.0, 0.0));
        assert!(line.remove_coordinate_at(0).is_none());
        assert!(!line.remove_coordinates_at(0, 2));

        let mut shape = square();
        assert!(shape.remove_coordinates_at(1, 2));
        assert_eq!(shape.coordinate_count(), 2);
        assert!(shape.remove_coordinate_at(0).is_none());
    }

    #[test]
    fn batch_refreshes_once_without_events() {
        let recorder = Rc::new(Recorder::default());
        let mut shape = square();
        shape.add_observer(recorder.clone());

        batch(&mut shape, |s| {
            s.set_coordinate_at_to(0, pt(-100.0, 0.0));
            assert_eq!(s.point_list()[0], pt(0.0, 0.0));
            s.add_coordinate(Coord::from_point(pt(0.0, 500.0)));
        });
        assert_eq!(shape.point_list()[0], pt(-100.0, 0.0));
        assert_eq!(shape.point_list().len(), 5);
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn nested_refresh_suspension() {
        let mut shape = square();
        shape.enable_refresh(false);
        shape.enable_refresh(false);
        shape.set_coordinate_at_to(0, pt(5.0, 5.0));
        shape.enable_refresh(true);
        assert_eq!(shape.point_list()[0], pt(0.0, 0.0));
        shape.enable_refresh(true);
        assert_eq!(shape.point_list()[0], pt(5.0, 5.0));
    }

    #[test]
    fn hit_testing_follows_selection_mode() {
        let item = Rc::new(ItemFrame::new(1000.0, 1000.0));
        let mut shape = square();
        shape.set_item(item.clone());
        let center = pt(500.0, 500.0);
        let near_edge = pt(1100.0, 500.0);

        item.set_has_fill(true);
        assert!(shape.contains_point(center, FindFlag::Default));
        assert!(!shape.contains_point(near_edge, FindFlag::Default));

        item.set_has_fill(false);
        assert!(!shape.contains_point(center, FindFlag::Default));
        assert!(shape.contains_point(near_edge, FindFlag::Default));

        item.set_selection_mode(SelectionMode::AREA);
        assert!(shape.contains_point(center, FindFlag::Default));
        // area only: the find radius around the border does not count
        assert!(!shape.contains_point(near_edge, FindFlag::Default));

        assert!(shape.contains_point(near_edge, FindFlag::AreaWithFrame));
        assert!(!shape.contains_point(pt(2000.0, 500.0), FindFlag::AreaWithFrame));
    }

    #[test]
    fn coordinates_evaluate_against_item() {
        let item = Rc::new(ItemFrame::new(3000.0, 2000.0));
        let mut shape = RectangleShape::new();
        shape.set_item(item.clone());
        shape.evaluate();
        assert_eq!(shape.point_list()[2], pt(3000.0, 2000.0));

        item.set_size(100.0, 50.0);
        assert!(shape.evaluate());
        assert_eq!(shape.bounding_box().max, pt(100.0, 50.0));

        // inserted formula coordinates are evaluated on the way in
        shape.add_coordinate(Coordinate::from_relative(0.5, 0.5).into());
        assert_eq!(shape.point_list()[4], pt(50.0, 25.0));
    }

    #[test]
    fn save_and_read_round_trip() {
        let mut w = ElementWriter::new();
        LineShape::new(pt(0.0, 0.0), pt(10.0, 5.0)).save(&mut w);
        let root = w.into_element().unwrap();
        insta::assert_snapshot!(root.to_xml(), @r#"<shape type="line"><c x="0" y="0"/><c x="10" y="5"/></shape>"#);

        let back = ShapeEnum::read(&ElementReader, &root).unwrap();
        assert!(matches!(back, ShapeEnum::Line(_)));
        assert_eq!(back.point_list(), &[pt(0.0, 0.0), pt(10.0, 5.0)]);
    }

    #[test]
    fn unknown_shape_type_is_skipped() {
        let mut node = crate::persist::Element::new("shape");
        node.attributes.push(("type".into(), "hexagon".into()));
        assert!(ShapeEnum::read(&ElementReader, &node).is_none());
    }
}
