//! The owning side of shapes and coordinates: item contexts that formulas
//! read, the item tree that port proxies walk, and a graph item tying a
//! shape, its reshape handles and its attribute lists together.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attr::{FillStyle, FormatAttributes, ItemAttributes, ParentResolver, TextFormatAttributes};
use crate::coord::{Coord, Coordinate, PointSource, ReshapeCoordinate, SharedCoord, shared};
use crate::defaults::{ITEM_HEIGHT, ITEM_WIDTH};
use crate::errors::ModelError;
use crate::formula::Value;
use crate::log::debug;
use crate::persist::{Reader, Writer};
use crate::shape::{BuilderHost, RectangleShape, Shape, ShapeEnum};
use crate::types::Point;

/// Which part of a shape answers hit tests, as bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectionMode(pub u8);

impl SelectionMode {
    /// Area if filled or a container, border otherwise
    pub const DEFAULT: SelectionMode = SelectionMode(0);
    pub const BORDER: SelectionMode = SelectionMode(1);
    pub const AREA: SelectionMode = SelectionMode(2);

    pub fn contains(self, other: SelectionMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SelectionMode {
    type Output = SelectionMode;

    fn bitor(self, rhs: Self) -> Self::Output {
        SelectionMode(self.0 | rhs.0)
    }
}

/// What coordinates and formulas see of the item owning them
pub trait ItemContext {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Value of a formula identifier; `WIDTH` and `HEIGHT` in any case
    fn resolve(&self, name: &str) -> Option<Value> {
        resolve_size(name, self.width(), self.height())
    }

    /// Formulas are not evaluated while the item is being read
    fn is_loading(&self) -> bool {
        false
    }

    fn has_children(&self) -> bool {
        false
    }

    fn has_fill(&self) -> bool {
        true
    }

    fn selection_mode(&self) -> SelectionMode {
        SelectionMode::DEFAULT
    }
}

fn resolve_size(name: &str, width: f64, height: f64) -> Option<Value> {
    if name.eq_ignore_ascii_case("WIDTH") {
        Some(Value::Number(width))
    } else if name.eq_ignore_ascii_case("HEIGHT") {
        Some(Value::Number(height))
    } else {
        None
    }
}

/// Zero-sized context for constant formulas
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl ItemContext for Detached {
    fn width(&self) -> f64 {
        0.0
    }

    fn height(&self) -> f64 {
        0.0
    }
}

/// Size and flags of an item, shared between the item and its shape
#[derive(Debug)]
pub struct ItemFrame {
    width: Cell<f64>,
    height: Cell<f64>,
    loading: Cell<bool>,
    has_children: Cell<bool>,
    has_fill: Cell<bool>,
    selection_mode: Cell<SelectionMode>,
    variables: RefCell<HashMap<String, Value>>,
}

impl ItemFrame {
    pub fn new(width: f64, height: f64) -> Self {
        ItemFrame {
            width: Cell::new(width),
            height: Cell::new(height),
            loading: Cell::new(false),
            has_children: Cell::new(false),
            has_fill: Cell::new(true),
            selection_mode: Cell::new(SelectionMode::DEFAULT),
            variables: RefCell::new(HashMap::new()),
        }
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.width.set(width);
        self.height.set(height);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    pub fn set_has_children(&self, has_children: bool) {
        self.has_children.set(has_children);
    }

    pub fn set_has_fill(&self, has_fill: bool) {
        self.has_fill.set(has_fill);
    }

    pub fn set_selection_mode(&self, mode: SelectionMode) {
        self.selection_mode.set(mode);
    }

    /// Extra identifier for formulas, e.g. `Item.X`; checked before the size
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.borrow_mut().insert(name.into(), value.into());
    }
}

impl ItemContext for ItemFrame {
    fn width(&self) -> f64 {
        self.width.get()
    }

    fn height(&self) -> f64 {
        self.height.get()
    }

    fn resolve(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.variables.borrow().get(name) {
            return Some(v.clone());
        }
        resolve_size(name, self.width(), self.height())
    }

    fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn has_children(&self) -> bool {
        self.has_children.get()
    }

    fn has_fill(&self) -> bool {
        self.has_fill.get()
    }

    fn selection_mode(&self) -> SelectionMode {
        self.selection_mode.get()
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique item identifier, persisted in `(id):path` references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn next() -> Self {
        ItemId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Take over a persisted id; later [`ItemId::next`] calls never repeat it
    pub fn restore(raw: u64) -> Self {
        NEXT_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        ItemId(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct TreeNode {
    parent: Option<ItemId>,
    origin: SharedCoord,
}

/// Parent links and origins of nested items.
///
/// Each item's origin is its top-left corner in its parent's frame.
#[derive(Debug, Default)]
pub struct ItemTree {
    nodes: HashMap<ItemId, TreeNode>,
}

impl ItemTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item under `parent`, or as a root
    pub fn insert(&mut self, id: ItemId, parent: Option<ItemId>, origin: SharedCoord) {
        self.nodes.insert(id, TreeNode { parent, origin });
    }

    /// Register a fresh item
    pub fn add(&mut self, parent: Option<ItemId>, origin: Point) -> ItemId {
        let id = ItemId::next();
        self.insert(id, parent, shared(Coordinate::from_point(origin)));
        id
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn origin(&self, id: ItemId) -> Option<&SharedCoord> {
        self.nodes.get(&id).map(|n| &n.origin)
    }

    fn node(&self, id: ItemId) -> Result<&TreeNode, ModelError> {
        self.nodes.get(&id).ok_or(ModelError::UnknownItem { id: id.0 })
    }

    /// Map `point` from the frame of `id` into its parent's frame
    pub fn translate_point_up(&self, id: ItemId, point: Point) -> Result<Point, ModelError> {
        Ok(point + self.node(id)?.origin.borrow().to_point())
    }

    /// Map `point` from the parent's frame into the frame of `id`
    pub fn translate_point_down(&self, id: ItemId, point: Point) -> Result<Point, ModelError> {
        Ok(point - self.node(id)?.origin.borrow().to_point())
    }

    /// `id` followed by its ancestors up to the root
    fn chain(&self, id: ItemId) -> Result<Vec<ItemId>, ModelError> {
        let mut chain = vec![id];
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            if chain.contains(&parent) {
                debug!(%id, "cycle in item tree");
                break;
            }
            chain.push(parent);
            current = self.node(parent)?;
        }
        Ok(chain)
    }
}

/// Live mapping between the frames of two items in one tree.
///
/// Holds the origins to add on the way up to the common ancestor and the
/// ones to subtract on the way down, so moving any item on the path moves
/// mapped points with it.
#[derive(Debug, Clone, Default)]
pub struct FramePath {
    up: Vec<SharedCoord>,
    down: Vec<SharedCoord>,
}

impl FramePath {
    pub fn new(up: Vec<SharedCoord>, down: Vec<SharedCoord>) -> Self {
        FramePath { up, down }
    }

    /// Path from the frame of `from` to the frame of `to`
    pub fn between(tree: &ItemTree, from: ItemId, to: ItemId) -> Result<FramePath, ModelError> {
        let from_chain = tree.chain(from)?;
        let to_chain = tree.chain(to)?;
        let Some(common) = from_chain.iter().position(|id| to_chain.contains(id)) else {
            return Err(ModelError::NoCommonAncestor { from: from.0, to: to.0 });
        };
        let ancestor = from_chain[common];
        let origins = |ids: &[ItemId]| -> Result<Vec<SharedCoord>, ModelError> {
            ids.iter().map(|id| Ok(tree.node(*id)?.origin.clone())).collect()
        };
        let down_len = to_chain.iter().position(|id| *id == ancestor).unwrap_or(to_chain.len());
        Ok(FramePath {
            up: origins(&from_chain[..common])?,
            down: origins(&to_chain[..down_len])?,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }

    fn offset(&self) -> Point {
        let sum = |v: &[SharedCoord]| v.iter().fold(Point::ZERO, |acc, c| acc + c.borrow().to_point());
        sum(&self.up) - sum(&self.down)
    }

    pub fn apply(&self, point: Point) -> Point {
        point + self.offset()
    }

    pub fn invert(&self, point: Point) -> Point {
        point - self.offset()
    }
}

/// An item of the scene: a shape in its own frame, reshape handles driving
/// a shape builder, and the item, format and text format attribute lists
#[derive(Debug)]
pub struct GraphItem {
    id: ItemId,
    frame: Rc<ItemFrame>,
    origin: SharedCoord,
    shape: ShapeEnum,
    reshape: Vec<ReshapeCoordinate>,
    attributes: ItemAttributes,
    format: FormatAttributes,
    text_format: TextFormatAttributes,
}

impl GraphItem {
    pub fn new(shape: impl Into<ShapeEnum>) -> Self {
        Self::with_id(ItemId::next(), shape.into())
    }

    fn with_id(id: ItemId, mut shape: ShapeEnum) -> Self {
        let frame = Rc::new(ItemFrame::new(ITEM_WIDTH, ITEM_HEIGHT));
        shape.set_item(frame.clone());
        shape.evaluate();
        let item = GraphItem {
            id,
            frame,
            origin: shared(Coordinate::default()),
            shape,
            reshape: Vec::new(),
            attributes: ItemAttributes::new(),
            format: FormatAttributes::new(),
            text_format: TextFormatAttributes::new(),
        };
        item.sync_frame();
        item
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn frame(&self) -> &Rc<ItemFrame> {
        &self.frame
    }

    /// Top-left corner in the parent's frame; shared with frame paths
    pub fn origin(&self) -> &SharedCoord {
        &self.origin
    }

    pub fn set_origin(&mut self, point: Point) -> bool {
        self.origin.borrow_mut().set_to_point(point)
    }

    pub fn width(&self) -> f64 {
        self.frame.width()
    }

    pub fn height(&self) -> f64 {
        self.frame.height()
    }

    /// Resize and re-evaluate every formula reading the size
    pub fn set_size(&mut self, width: f64, height: f64) -> bool {
        self.frame.set_size(width, height);
        let frame = self.frame.clone();
        for handle in &mut self.reshape {
            handle.evaluate(frame.as_ref());
        }
        self.shape.evaluate()
    }

    pub fn shape(&self) -> &ShapeEnum {
        &self.shape
    }

    /// Replace the shape, attaching it to this item
    pub fn set_shape(&mut self, shape: impl Into<ShapeEnum>) {
        let mut shape = shape.into();
        shape.set_item(self.frame.clone());
        shape.evaluate();
        self.shape = shape;
    }

    pub fn reshape_coordinate(&self, index: usize) -> Option<&ReshapeCoordinate> {
        self.reshape.get(index)
    }

    pub fn add_reshape_coordinate(&mut self, mut handle: ReshapeCoordinate) {
        handle.evaluate(self.frame.as_ref());
        self.reshape.push(handle);
    }

    /// Apply a drag of handle `index` to `local` and rebuild the shape with
    /// the handle's builder. Returns true if the handle moved.
    pub fn set_reshape_coordinate_to(&mut self, index: usize, local: Point) -> bool {
        let (width, height) = (self.width(), self.height());
        let Some(handle) = self.reshape.get_mut(index) else {
            return false;
        };
        if !handle.map_drag(local, width, height) {
            return false;
        }
        if let Some(builder) = handle.builder() {
            builder.build(self);
        }
        true
    }

    pub fn attributes(&self) -> &ItemAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ItemAttributes {
        &mut self.attributes
    }

    pub fn format(&self) -> &FormatAttributes {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut FormatAttributes {
        &mut self.format
    }

    pub fn text_format(&self) -> &TextFormatAttributes {
        &self.text_format
    }

    pub fn text_format_mut(&mut self) -> &mut TextFormatAttributes {
        &mut self.text_format
    }

    /// Push fill style and selection mode from the lists into the frame the
    /// shape hit-tests against
    pub fn sync_frame(&self) {
        let fill = self
            .format
            .get_number(FormatAttributes::FILL_STYLE)
            .unwrap_or(FillStyle::SOLID);
        self.frame.set_has_fill(fill != FillStyle::NONE);
        let mode = self
            .attributes
            .get_number(ItemAttributes::SELECTION_MODE)
            .unwrap_or(0.0);
        self.frame.set_selection_mode(SelectionMode(mode as u8));
    }

    pub fn save(&self, writer: &mut dyn Writer) {
        writer.write_start_element("item");
        writer.write_attribute_number("id", self.id.0 as f64);
        writer.write_attribute_number("w", self.width());
        writer.write_attribute_number("h", self.height());
        self.origin.borrow().save("o", writer);
        self.shape.save(writer);
        for handle in &self.reshape {
            handle.save("rc", writer);
        }
        self.attributes.save(writer);
        self.format.save(writer);
        self.text_format.save(writer);
        writer.write_end_element();
    }

    /// Read an `item` element. Formulas are evaluated once everything is in place.
    pub fn read<R: Reader>(reader: &R, node: &R::Node, resolver: &dyn ParentResolver) -> Self {
        let id = reader
            .number(node, "id")
            .map(|id| ItemId::restore(id as u64))
            .unwrap_or_else(ItemId::next);
        let shape = reader
            .child(node, "shape")
            .and_then(|s| ShapeEnum::read(reader, s))
            .unwrap_or_else(|| RectangleShape::new().into());

        let mut item = GraphItem::with_id(id, shape);
        item.frame.set_loading(true);
        item.frame.set_size(
            reader.number(node, "w").unwrap_or(ITEM_WIDTH),
            reader.number(node, "h").unwrap_or(ITEM_HEIGHT),
        );
        for child in reader.children(node) {
            match reader.tag(child) {
                "o" => item.origin = shared(Coord::read(reader, child)),
                "rc" => item.reshape.push(ReshapeCoordinate::read(reader, child)),
                "al" => match reader.attribute(child, "n") {
                    Some(ItemAttributes::NAME) => {
                        item.attributes = ItemAttributes::read(reader, child, resolver)
                    }
                    Some(FormatAttributes::NAME) => {
                        item.format = FormatAttributes::read(reader, child, resolver)
                    }
                    Some(TextFormatAttributes::NAME) => {
                        item.text_format = TextFormatAttributes::read(reader, child, resolver)
                    }
                    other => {
                        debug!(list = ?other, "skipping unknown item list");
                    }
                },
                _ => {}
            }
        }
        item.frame.set_loading(false);
        let frame = item.frame.clone();
        for handle in &mut item.reshape {
            handle.evaluate(frame.as_ref());
        }
        item.shape.evaluate();
        item.sync_frame();
        item
    }
}

impl BuilderHost for GraphItem {
    fn shape_mut(&mut self) -> &mut ShapeEnum {
        &mut self.shape
    }

    fn reshape_coordinates(&self) -> &[ReshapeCoordinate] {
        &self.reshape
    }
}
