//! Single named attribute

use std::borrow::Cow;

use super::PATH_DELIMITER;
use super::range::RangeConstraint;
use crate::formula::{Expression, Value};
use crate::log::debug;
use crate::persist::{Reader, Writer};

/// A named expression inside an [`AttributeList`](super::AttributeList).
///
/// Names never contain the path delimiter `:`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    display_name: Option<String>,
    expression: Expression,
    transient: bool,
    constraint: Option<RangeConstraint>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<Expression>) -> Self {
        let name = name.into();
        debug_assert!(!name.contains(PATH_DELIMITER), "attribute name {name:?} contains ':'");
        Attribute {
            name,
            display_name: None,
            expression: value.into(),
            transient: false,
            constraint: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Transient attributes are never persisted
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Constrain the value; the current value is validated immediately
    pub fn with_constraint(mut self, constraint: RangeConstraint) -> Self {
        if !self.expression.has_formula() {
            self.expression = Expression::new(constraint.get_value(self.expression.value()));
        }
        self.constraint = Some(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn value(&self) -> &Value {
        self.expression.value()
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn constraint(&self) -> Option<&RangeConstraint> {
        self.constraint.as_ref()
    }

    /// `expression` after applying the range constraint to literal values
    pub(crate) fn constrained(&self, expression: Expression) -> Expression {
        match &self.constraint {
            Some(c) if !expression.has_formula() && !c.is_valid(expression.value()) => {
                debug!(name = %self.name, value = %expression.value(), "value outside range, using default");
                Expression::new(c.default_value().clone())
            }
            _ => expression,
        }
    }

    /// Set in place. Lists route writes through
    /// [`AttributeList::set_attribute`](super::AttributeList::set_attribute)
    /// so inherited attributes are copied first.
    pub fn set_expression_or_value(&mut self, value: impl Into<Expression>) -> bool {
        let expression = self.constrained(value.into());
        self.expression.set_expression_or_value(expression)
    }

    /// Back to the constraint default; attributes without one are left alone
    pub fn reset(&mut self) -> bool {
        match &self.constraint {
            Some(c) => {
                let default = Expression::new(c.default_value().clone());
                self.expression.set_expression_or_value(default)
            }
            None => false,
        }
    }

    /// Take the persisted state of `read`, keeping this attribute's constraint
    pub(crate) fn restore_from(&mut self, read: Attribute) {
        self.expression = self.constrained(read.expression);
        if read.display_name.is_some() {
            self.display_name = read.display_name;
        }
    }

    pub fn save(&self, writer: &mut dyn Writer) {
        if self.transient {
            return;
        }
        writer.write_start_element("at");
        writer.write_attribute_string("n", &self.name);
        if let Some(dn) = &self.display_name {
            writer.write_attribute_string("dn", dn);
        }
        self.expression.write_attributes(writer);
        writer.write_end_element();
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        Attribute {
            name: reader.attribute(node, "n").unwrap_or_default().to_string(),
            display_name: reader.attribute(node, "dn").map(str::to_string),
            expression: Expression::read(reader, node),
            transient: false,
            constraint: None,
        }
    }
}

/// Read view of an attribute as seen from the list it was looked up in.
///
/// An inherited attribute is adopted by that list: its path is built from
/// the adopting list and a write through the list copies it there rather
/// than into the template it came from.
#[derive(Debug, Clone)]
pub struct AttributeRef<'a> {
    attribute: Cow<'a, Attribute>,
    owner: Cow<'a, str>,
    inherited: bool,
}

impl<'a> AttributeRef<'a> {
    pub(crate) fn local(attribute: &'a Attribute, owner: &'a str) -> Self {
        AttributeRef {
            attribute: Cow::Borrowed(attribute),
            owner: Cow::Borrowed(owner),
            inherited: false,
        }
    }

    pub(crate) fn adopted(attribute: Attribute, owner: impl Into<Cow<'a, str>>) -> Self {
        AttributeRef {
            attribute: Cow::Owned(attribute),
            owner: owner.into(),
            inherited: true,
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    pub fn value(&self) -> &Value {
        self.attribute.value()
    }

    pub fn expression(&self) -> &Expression {
        self.attribute.expression()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.attribute.display_name()
    }

    /// True if the value comes from a parent list or template
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Path of the adopting list
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `list:...:name`
    pub fn path(&self) -> String {
        if self.owner.is_empty() {
            self.attribute.name().to_string()
        } else {
            format!("{}{}{}", self.owner, PATH_DELIMITER, self.attribute.name())
        }
    }

    pub fn into_owned(self) -> Attribute {
        self.attribute.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{ElementReader, ElementWriter};

    #[test]
    fn constraint_applies_on_set() {
        let range = RangeConstraint::from_properties_of(&[("NONE", 0.0), ("SOLID", 1.0)], 1.0);
        let mut attr = Attribute::new("fillstyle", 7.0).with_constraint(range);
        assert_eq!(attr.value(), &Value::Number(1.0));

        assert!(attr.set_expression_or_value(0.0));
        assert_eq!(attr.value(), &Value::Number(0.0));
        assert!(attr.set_expression_or_value(5.0));
        assert_eq!(attr.value(), &Value::Number(1.0));

        attr.set_expression_or_value(0.0);
        assert!(attr.reset());
        assert_eq!(attr.value(), &Value::Number(1.0));
    }

    #[test]
    fn transient_attributes_are_not_saved() {
        let mut w = ElementWriter::new();
        Attribute::new("hover", true).transient().save(&mut w);
        assert!(w.finish().is_empty());
    }

    #[test]
    fn save_and_read() {
        let attr = Attribute::new("fontname", "Verdana").with_display_name("Font");
        let mut w = ElementWriter::new();
        attr.save(&mut w);
        let node = w.into_element().unwrap();
        insta::assert_snapshot!(node.to_xml(), @r#"<at n="fontname" dn="Font" v="Verdana" t="s"/>"#);
        assert_eq!(Attribute::read(&ElementReader, &node), attr);
    }

    #[test]
    fn ref_path_uses_adopting_list() {
        let attr = Attribute::new("linewidth", 1.0);
        let r = AttributeRef::adopted(attr, "format:line");
        assert!(r.is_inherited());
        assert_eq!(r.path(), "format:line:linewidth");
    }
}
