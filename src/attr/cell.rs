//! Condensed formatting of worksheet cells.
//!
//! Worksheets hold many cells whose lists mostly equal their templates, so a
//! cell writes only its locally set values, one element attribute per value,
//! instead of full `al`/`at` trees.

use super::list::{AttributeList, Entry};
use super::lists::{CellAttributes, CellFormatAttributes, CellTextFormatAttributes};
use crate::formula::Value;
use crate::log::debug;
use crate::persist::{Reader, Writer};

/// Format, text format and flag lists of one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormatting {
    pub format: CellFormatAttributes,
    pub text_format: CellTextFormatAttributes,
    pub attributes: CellAttributes,
}

impl CellFormatting {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if every value still comes from the templates
    pub fn is_default(&self) -> bool {
        self.format.is_empty() && self.text_format.is_empty() && self.attributes.is_empty()
    }

    /// Write `f`, `t` and `a` elements for the lists holding local values
    pub fn save(&self, writer: &mut dyn Writer) {
        save_condensed("f", &self.format, writer);
        save_condensed("t", &self.text_format, writer);
        save_condensed("a", &self.attributes, writer);
    }

    /// Restore from the `f`, `t` and `a` children of `node`
    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        let mut cell = CellFormatting::new();
        for child in reader.children(node) {
            let list: &mut AttributeList = match reader.tag(child) {
                "f" => &mut *cell.format,
                "t" => &mut *cell.text_format,
                "a" => &mut *cell.attributes,
                _ => continue,
            };
            read_condensed(reader, child, list);
        }
        cell
    }
}

fn save_condensed(tag: &str, list: &AttributeList, writer: &mut dyn Writer) {
    let mut values = list.entries().filter_map(|(name, entry)| match entry {
        Entry::Attribute(a) if !a.is_transient() => Some((name, a.value())),
        _ => None,
    });
    let Some(first) = values.next() else {
        return;
    };
    writer.write_start_element(tag);
    for (name, value) in std::iter::once(first).chain(values) {
        writer.write_attribute_string(name, &value.to_string());
    }
    writer.write_end_element();
}

fn read_condensed<R: Reader>(reader: &R, node: &R::Node, list: &mut AttributeList) {
    for (name, text) in reader.attributes(node) {
        // the template decides how the text is typed
        let Some(tag) = list.get_value(name).map(|v| v.type_tag()) else {
            debug!(name, "skipping unknown cell attribute");
            continue;
        };
        list.set_attribute(name, Value::parse_tagged(text, Some(tag)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{FillStyle, FormatAttributes, TextFormatAttributes};
    use crate::persist::{Element, ElementReader, ElementWriter};

    #[test]
    fn writes_only_local_values() {
        let mut cell = CellFormatting::new();
        let mut w = ElementWriter::new();
        cell.save(&mut w);
        assert!(w.finish().is_empty());

        cell.format.set_attribute(FormatAttributes::FILL_COLOR, "#FF0000");
        cell.format.set_attribute(FormatAttributes::FILL_STYLE, FillStyle::SOLID);
        cell.text_format.set_attribute(TextFormatAttributes::FONT_NAME, "Arial");
        assert!(!cell.is_default());

        let mut w = ElementWriter::new();
        w.write_start_element("cell");
        cell.save(&mut w);
        w.write_end_element();
        let node = w.into_element().unwrap();
        insta::assert_snapshot!(
            node.to_xml(),
            @r##"<cell><f fillcolor="#FF0000" fillstyle="1"/><t fontname="Arial"/></cell>"##
        );

        let read = CellFormatting::read(&ElementReader, &node);
        assert_eq!(read, cell);
    }

    #[test]
    fn values_are_typed_by_the_template() {
        let mut node = Element::new("cell");
        let mut flags = Element::new("a");
        flags.attributes = vec![
            ("protected".into(), "false".into()),
            ("level".into(), "2".into()),
            ("bogus".into(), "1".into()),
        ];
        let mut text = Element::new("t");
        text.attributes = vec![("fontname".into(), "1234".into())];
        node.children = vec![flags, text];

        let cell = CellFormatting::read(&ElementReader, &node);
        assert_eq!(cell.attributes.get_value(CellAttributes::PROTECTED), Some(Value::Bool(false)));
        assert_eq!(cell.attributes.get_number(CellAttributes::LEVEL), Some(2.0));
        assert!(!cell.attributes.has_local("bogus"));
        assert_eq!(
            cell.text_format.get_value(TextFormatAttributes::FONT_NAME),
            Some(Value::Text("1234".into()))
        );
    }
}
