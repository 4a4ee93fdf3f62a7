//! Concrete attribute lists and the constant sets constraining them

use super::schema::{attribute_schema, constant_set};

constant_set! {
    /// Area fill
    pub struct FillStyle {
        NONE = 0.0,
        SOLID = 1.0,
        GRADIENT = 2.0,
        PATTERN = 3.0,
    }
}

constant_set! {
    /// Dash pattern of lines and borders
    pub struct LineStyle {
        NONE = 0.0,
        SOLID = 1.0,
        DOT = 2.0,
        DASH = 3.0,
        DASHDOT = 4.0,
        DASHDOTDOT = 5.0,
    }
}

constant_set! {
    /// Line end decoration
    pub struct ArrowStyle {
        NONE = 0.0,
        ARROW_FILLED = 1.0,
        ARROW_NARROW = 2.0,
        ARROW_DOUBLE = 3.0,
        CIRCLE = 4.0,
        SQUARE = 5.0,
        DIAMOND = 6.0,
    }
}

constant_set! {
    /// Font style bits; values combine, so `fontstyle` is not constrained
    pub struct FontStyle {
        NORMAL = 0.0,
        BOLD = 1.0,
        ITALIC = 2.0,
        UNDERLINE = 4.0,
    }
}

constant_set! {
    pub struct HorizontalAlignment {
        LEFT = 0.0,
        CENTER = 1.0,
        RIGHT = 2.0,
        DEFAULT = 3.0,
    }
}

constant_set! {
    pub struct VerticalAlignment {
        TOP = 0.0,
        CENTER = 1.0,
        BOTTOM = 2.0,
    }
}

constant_set! {
    /// Automatic layout applied to an item's children
    pub struct LayoutType {
        NONE = 0.0,
        TREE = 1.0,
        FLOW = 2.0,
        ORG_CHART = 3.0,
    }
}

attribute_schema! {
    /// Behavior flags of a graph item
    pub struct ItemAttributes("attributes", "ItemAttributes") {
        VISIBLE = "visible" => |_| true,
        SELECTION_MODE = "selectionmode" => |_| 0.0,
        CONTAINER = "container" => |_| true,
        CLIP_CHILDREN = "clipchildren" => |_| false,
        MOVEABLE = "moveable" => |_| true,
        SIZEABLE = "sizeable" => |_| true,
        DELETEABLE = "deleteable" => |_| true,
        /// Free-form layer name
        LAYER = "layer" => |_| "",
    }
}

attribute_schema! {
    /// Fill, line and shadow of a graph item
    pub struct FormatAttributes("format", "FormatAttributes") {
        FILL_COLOR = "fillcolor" => |t| t.fill_color.as_str(),
        FILL_STYLE = "fillstyle" => |_| FillStyle::SOLID; one_of FillStyle,
        GRADIENT_COLOR = "gradientcolor" => |_| "#EEEEEE",
        LINE_COLOR = "linecolor" => |t| t.line_color.as_str(),
        LINE_WIDTH = "linewidth" => |t| t.line_width,
        LINE_STYLE = "linestyle" => |_| LineStyle::SOLID; one_of LineStyle,
        LINE_ARROW_START = "linearrowstart" => |_| ArrowStyle::NONE; one_of ArrowStyle,
        LINE_ARROW_END = "linearrowend" => |_| ArrowStyle::NONE; one_of ArrowStyle,
        /// Opacity in percent
        TRANSPARENCY = "transparency" => |_| 100.0,
        SHADOW_COLOR = "shadowcolor" => |_| "#999999",
        SHADOW_OFFSET = "shadowoffset" => |_| 0.0,
    }
}

attribute_schema! {
    /// Font and alignment of an item's text
    pub struct TextFormatAttributes("textformat", "TextFormatAttributes") {
        FONT_NAME = "fontname" => |t| t.font_name.as_str(),
        FONT_SIZE = "fontsize" => |t| t.font_size,
        FONT_STYLE = "fontstyle" => |_| FontStyle::NORMAL,
        FONT_COLOR = "fontcolor" => |t| t.font_color.as_str(),
        HORIZONTAL_ALIGN = "halign" => |_| HorizontalAlignment::CENTER; one_of HorizontalAlignment,
        VERTICAL_ALIGN = "valign" => |_| VerticalAlignment::CENTER; one_of VerticalAlignment,
        RICH_TEXT = "richtext" => |_| false,
        NUMBER_FORMAT = "numberformat" => |_| "General",
    }
}

attribute_schema! {
    /// Cell flags of a worksheet cell
    pub struct CellAttributes("attributes", "CellAttributes") {
        KEY = "key" => |_| false,
        PROTECTED = "protected" => |_| true,
        VISIBLE = "visible" => |_| true,
        LEVEL = "level" => |_| 0.0,
    }
}

attribute_schema! {
    /// Routing of an edge between two ports
    pub struct EdgeAttributes("attributes", "EdgeAttributes") {
        ORTHOGONAL = "orthogonal" => |_| false,
        /// Corner radius of orthogonal bends
        LINE_CORNER = "linecorner" => |_| 0.0,
        AUTO_ROUTE = "autoroute" => |_| true,
    }
}

attribute_schema! {
    /// Automatic layout of an item's children
    pub struct LayoutAttributes("layout", "LayoutAttributes") {
        TYPE = "type" => |_| LayoutType::NONE; one_of LayoutType,
        AUTO = "auto" => |_| false,
        MARGIN = "margin" => |_| 500.0,
        SPACING = "spacing" => |_| 1000.0,
    }
}

attribute_schema! {
    /// Grid and header display of a worksheet
    pub struct WorksheetAttributes("worksheet", "WorksheetAttributes") {
        GRID_VISIBLE = "gridvisible" => |_| true,
        GRID_COLOR = "gridcolor" => |t| t.grid_color.as_str(),
        HEADER_VISIBLE = "headervisible" => |_| true,
        SHOW_FORMULAS = "showformulas" => |_| false,
        ROWS = "rows" => |_| 100.0,
        COLUMNS = "columns" => |_| 52.0,
    }
}

attribute_schema! {
    /// Cell defaults for fill and border, overriding [`FormatAttributes`]
    pub struct CellFormatAttributes("format", "CellFormatAttributes"): FormatAttributes {
        FILL_STYLE = "fillstyle" => |_| FillStyle::NONE; one_of FillStyle,
        LINE_COLOR = "linecolor" => |t| t.cell_line_color.as_str(),
    }
}

attribute_schema! {
    /// Cell defaults for text, overriding [`TextFormatAttributes`]
    pub struct CellTextFormatAttributes("textformat", "CellTextFormatAttributes"): TextFormatAttributes {
        FONT_SIZE = "fontsize" => |t| t.cell_font_size,
        HORIZONTAL_ALIGN = "halign" => |_| HorizontalAlignment::DEFAULT; one_of HorizontalAlignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Value;
    use crate::theme::Theme;

    #[test]
    fn templates_follow_the_theme() {
        let theme = Theme::current();
        let format = FormatAttributes::new();
        assert_eq!(format.get_value(FormatAttributes::FILL_COLOR), Some(Value::from(theme.fill_color.as_str())));
        assert_eq!(format.get_number(FormatAttributes::LINE_WIDTH), Some(theme.line_width));
        assert!(format.is_empty());
        assert_eq!(format.class(), Some("FormatAttributes"));
        assert_eq!(format.parent().and_then(|p| p.template_name()), Some("FormatAttributes"));
    }

    #[test]
    fn templates_are_shared_per_thread() {
        assert!(TextFormatAttributes::template().ptr_eq(&TextFormatAttributes::template()));
    }

    #[test]
    fn constrained_entries_fall_back_to_default() {
        let mut format = FormatAttributes::new();
        assert!(format.set_attribute(FormatAttributes::FILL_STYLE, FillStyle::GRADIENT));
        assert_eq!(format.get_number(FormatAttributes::FILL_STYLE), Some(FillStyle::GRADIENT));

        assert!(format.set_attribute(FormatAttributes::FILL_STYLE, 42.0));
        assert_eq!(format.get_number(FormatAttributes::FILL_STYLE), Some(FillStyle::SOLID));
        assert_eq!(FillStyle::name_of(2.0), Some("GRADIENT"));
    }

    #[test]
    fn derived_templates_chain_to_their_base() {
        let cell = CellFormatAttributes::new();
        assert_eq!(cell.get_number(FormatAttributes::FILL_STYLE), Some(FillStyle::NONE));
        assert_eq!(
            cell.get_value(FormatAttributes::LINE_COLOR),
            Some(Value::from(Theme::current().cell_line_color.as_str()))
        );
        // inherited through the base template
        assert_eq!(cell.get_value(FormatAttributes::SHADOW_COLOR), Some(Value::from("#999999")));

        let text = CellTextFormatAttributes::new();
        assert_eq!(text.get_number(TextFormatAttributes::FONT_SIZE), Some(Theme::current().cell_font_size));
        assert_eq!(text.get_value(TextFormatAttributes::FONT_NAME), Some(Value::from("Verdana")));
    }

    #[test]
    fn unknown_schema_names_do_nothing() {
        let mut layout = LayoutAttributes::new();
        assert!(!layout.set_attribute("doesNotExist", 1.0));
        assert!(layout.is_empty());
    }
}
