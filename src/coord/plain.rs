use super::{Coord, PointSource};
use crate::errors::FormulaError;
use crate::formula::Expression;
use crate::graph::ItemContext;
use crate::persist::{Reader, Writer};
use crate::types::{Point, pt};

/// A point with an expression per axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinate {
    x: Expression,
    y: Expression,
}

impl Coordinate {
    pub fn new(x: Expression, y: Expression) -> Self {
        Coordinate { x, y }
    }

    pub fn from_xy(x: f64, y: f64) -> Self {
        Coordinate::new(Expression::number(x), Expression::number(y))
    }

    pub fn from_point(p: Point) -> Self {
        Coordinate::from_xy(p.x, p.y)
    }

    pub fn from_formulas(x: &str, y: &str) -> Result<Self, FormulaError> {
        Ok(Coordinate::new(Expression::formula(x)?, Expression::formula(y)?))
    }

    /// Coordinate tracking fixed fractions of the owning item's size
    pub fn from_relative(fx: f64, fy: f64) -> Self {
        Coordinate::new(Expression::scaled("WIDTH", fx), Expression::scaled("HEIGHT", fy))
    }

    pub fn x(&self) -> &Expression {
        &self.x
    }

    pub fn y(&self) -> &Expression {
        &self.y
    }

    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        let axis = |name: &str| {
            reader
                .child(node, name)
                .map(|n| Expression::read(reader, n))
                .unwrap_or_default()
        };
        // compact form: numeric x/y attributes; full form: x/y child elements with formulas
        match (reader.number(node, "x"), reader.number(node, "y")) {
            (Some(x), Some(y)) => Coordinate::from_xy(x, y),
            _ => Coordinate::new(axis("x"), axis("y")),
        }
    }

    pub(crate) fn write_body(&self, writer: &mut dyn Writer) {
        if self.x.has_formula() || self.y.has_formula() {
            self.x.save("x", writer);
            self.y.save("y", writer);
        } else {
            writer.write_attribute_number("x", self.x.to_number());
            writer.write_attribute_number("y", self.y.to_number());
        }
    }
}

impl PointSource for Coordinate {
    fn to_point(&self) -> Point {
        pt(self.x.to_number(), self.y.to_number())
    }

    fn set_to_point(&mut self, point: Point) -> bool {
        let changed_x = self.x.set_value(point.x);
        let changed_y = self.y.set_value(point.y);
        changed_x || changed_y
    }

    fn set_x(&mut self, x: Expression) -> bool {
        self.x.set_expression_or_value(x)
    }

    fn set_y(&mut self, y: Expression) -> bool {
        self.y.set_expression_or_value(y)
    }

    fn translate(&mut self, dx: f64, dy: f64) -> bool {
        let mut changed = false;
        if dx != 0.0 {
            changed |= self.x.set_value(self.x.to_number() + dx);
        }
        if dy != 0.0 {
            changed |= self.y.set_value(self.y.to_number() + dy);
        }
        changed
    }

    fn expressions(&self) -> (Expression, Expression) {
        (self.x.clone(), self.y.clone())
    }

    fn copy(&self) -> Coord {
        Coord::Plain(self.clone())
    }

    fn evaluate(&mut self, item: &dyn ItemContext) -> bool {
        let changed_x = self.x.evaluate(item);
        let changed_y = self.y.evaluate(item);
        changed_x || changed_y
    }

    fn save(&self, name: &str, writer: &mut dyn Writer) {
        writer.write_start_element(name);
        self.write_body(writer);
        writer.write_end_element();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ItemFrame;
    use crate::persist::{ElementReader, ElementWriter};

    #[test]
    fn translate_drops_formula() {
        let item = ItemFrame::new(100.0, 50.0);
        let mut c = Coordinate::from_formulas("WIDTH", "HEIGHT").unwrap();
        c.evaluate(&item);
        assert_eq!(c.to_point(), pt(100.0, 50.0));

        assert!(c.translate(5.0, 0.0));
        assert_eq!(c.to_point(), pt(105.0, 50.0));
        assert!(!c.x().has_formula());
        assert!(c.y().has_formula());
    }

    #[test]
    fn translate_by_zero_is_not_a_change() {
        let mut c = Coordinate::from_xy(1.0, 2.0);
        assert!(!c.translate(0.0, 0.0));
    }

    #[test]
    fn set_to_copies_formulas() {
        let src = Coordinate::from_relative(0.5, 1.0);
        let mut dst = Coordinate::default();
        assert!(dst.set_to(&src));
        assert_eq!(dst.x().formula_source(), Some("WIDTH * 0.5"));
        assert_eq!(dst.y().formula_source(), Some("HEIGHT * 1"));
    }

    #[test]
    fn save_compact_and_full_forms() {
        let mut w = ElementWriter::new();
        Coordinate::from_xy(10.0, 20.5).save("c", &mut w);
        Coordinate::from_relative(0.5, 0.0).save("c", &mut w);
        let roots = w.finish();
        insta::assert_snapshot!(roots[0].to_xml(), @r#"<c x="10" y="20.5"/>"#);
        insta::assert_snapshot!(
            roots[1].to_xml(),
            @r#"<c><x v="0" f="WIDTH * 0.5"/><y v="0" f="HEIGHT * 0"/></c>"#
        );

        let back = Coordinate::read(&ElementReader, &roots[1]);
        assert_eq!(back.x().formula_source(), Some("WIDTH * 0.5"));
        assert_eq!(Coordinate::read(&ElementReader, &roots[0]).to_point(), pt(10.0, 20.5));
    }
}
