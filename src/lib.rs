//! Formula-driven shape geometry and inheritable attribute lists.
//!
//! Coordinates hold two [`Expression`]s that may read the owning item's size
//! (`WIDTH`, `HEIGHT`); shapes flatten their coordinates into point lists for
//! hit testing, port lookup and outline generation; attribute lists fall
//! back to shared templates and copy values only when they are changed.

pub mod attr;
pub mod coord;
pub mod defaults;
pub mod errors;
pub mod formula;
pub mod graph;
mod log;
pub mod persist;
pub mod shape;
pub mod theme;
pub mod types;

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "formula.pest"]
pub struct FormulaParser;

pub use attr::{Attribute, AttributeList, Template};
pub use coord::{Coord, Coordinate, PointSource};
pub use errors::{EvalError, FormulaError, ModelError};
pub use formula::{Expression, Value};
pub use graph::{GraphItem, ItemContext, ItemFrame};
pub use shape::{Shape, ShapeBuilder, ShapeEnum};
pub use types::Point;

/// Parse and evaluate `source` against `item` in one step.
///
/// Returns the value on success, or an error with diagnostics.
pub fn evaluate(source: &str, item: &dyn ItemContext) -> Result<Value, miette::Report> {
    let term = formula::parse::parse(source)?;
    let value = formula::eval::eval_term(&term, item)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use pest::Parser;

    use super::*;

    #[test]
    fn parse_size_formula() {
        let result = FormulaParser::parse(Rule::formula, "WIDTH * 0.5");
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[test]
    fn evaluate_reports_diagnostics() {
        let item = ItemFrame::new(200.0, 100.0);
        assert_eq!(evaluate("MAX(WIDTH, HEIGHT) / 4", &item).unwrap(), Value::Number(50.0));

        let err = evaluate("WIDTH *", &item).unwrap_err();
        assert!(err.downcast_ref::<FormulaError>().is_some());
        let err = evaluate("DEPTH", &item).unwrap_err();
        assert!(err.downcast_ref::<EvalError>().is_some());
    }
}
