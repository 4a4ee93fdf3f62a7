//! Attributes and inheritable attribute lists.
//!
//! An [`AttributeList`] holds named [`Attribute`]s and nested lists and falls
//! back to a [`Parent`] for everything it does not hold itself: a shared
//! [`Template`] with schema defaults, or the list of another item. Writes to
//! inherited values copy them into the writing list, so parents are never
//! modified through a descendant.
//!
//! The concrete lists (`FormatAttributes`, `TextFormatAttributes`, ...) are
//! fixed schemas whose templates are built from the [`Theme`](crate::theme::Theme)
//! on first use.

mod attribute;
mod cell;
mod list;
mod lists;
mod parent;
mod range;
pub mod registry;
mod schema;

/// Separator of list and attribute names in paths like `format:line:width`
pub const PATH_DELIMITER: char = ':';

pub use attribute::{Attribute, AttributeRef};
pub use cell::CellFormatting;
pub use list::{AttributeList, AttributeMut, Entry};
pub use lists::{
    ArrowStyle, CellAttributes, CellFormatAttributes, CellTextFormatAttributes, EdgeAttributes, FillStyle,
    FontStyle, FormatAttributes, HorizontalAlignment, ItemAttributes, LayoutAttributes, LayoutType, LineStyle,
    TextFormatAttributes, VerticalAlignment, WorksheetAttributes,
};
pub use parent::{ListTable, Parent, ParentRef, ParentResolver, SharedList, Template, Templates};
pub use range::RangeConstraint;
