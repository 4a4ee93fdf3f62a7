//! Value-plus-formula pairs

use super::ast::{BinaryOp, Term};
use super::eval::eval_term;
use super::parse::parse;
use super::value::Value;
use crate::errors::FormulaError;
use crate::graph::{Detached, ItemContext};
use crate::log::warn;
use crate::persist::{Reader, Writer};

/// A parsed formula together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    term: Term,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        Ok(Formula {
            source: source.trim().to_string(),
            term: parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn term(&self) -> &Term {
        &self.term
    }
}

/// A cached value with an optional formula that recomputes it.
///
/// Without a formula the value is a literal. With one, [`Expression::evaluate`]
/// refreshes the cached value from the owning item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    value: Value,
    formula: Option<Formula>,
}

impl Expression {
    pub fn new(value: impl Into<Value>) -> Self {
        Expression {
            value: value.into(),
            formula: None,
        }
    }

    pub fn number(value: f64) -> Self {
        Self::new(value)
    }

    /// Parse `source` as a formula. Constant formulas are evaluated right
    /// away; others hold 0 until evaluated against an item.
    pub fn formula(source: &str) -> Result<Self, FormulaError> {
        let formula = Formula::parse(source)?;
        let value = if formula.term.is_constant() {
            eval_term(&formula.term, &Detached).unwrap_or_default()
        } else {
            Value::default()
        };
        Ok(Expression {
            value,
            formula: Some(formula),
        })
    }

    /// Expression over an already-built term; the source text is derived from it
    pub fn from_term(term: Term) -> Self {
        let value = if term.is_constant() {
            eval_term(&term, &Detached).unwrap_or_default()
        } else {
            Value::default()
        };
        Expression {
            value,
            formula: Some(Formula {
                source: term.to_string(),
                term,
            }),
        }
    }

    /// `name * factor`, e.g. `WIDTH * 0.5`
    pub fn scaled(name: &str, factor: f64) -> Self {
        Expression::from_term(Term::Binary(
            Box::new(Term::Ident(name.to_string())),
            BinaryOp::Mul,
            Box::new(Term::Number(factor)),
        ))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Numeric view of the cached value
    pub fn to_number(&self) -> f64 {
        self.value.number()
    }

    pub fn formula_source(&self) -> Option<&str> {
        self.formula.as_ref().map(Formula::source)
    }

    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Replace with a literal value, dropping any formula. Returns true if anything changed.
    pub fn set_value(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let changed = self.value != value || self.formula.is_some();
        self.value = value;
        self.formula = None;
        changed
    }

    /// Adopt both value and formula of `other`. Returns true if anything changed.
    pub fn set_expression_or_value(&mut self, other: Expression) -> bool {
        if *self == other {
            return false;
        }
        *self = other;
        true
    }

    /// Recompute the cached value from the formula.
    ///
    /// On failure the previous value is kept and a warning is logged.
    /// Returns true if the value changed.
    pub fn evaluate(&mut self, item: &dyn ItemContext) -> bool {
        let Some(formula) = &self.formula else {
            return false;
        };
        match eval_term(&formula.term, item) {
            Ok(value) if value != self.value => {
                self.value = value;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(formula = formula.source(), error = %e, "formula evaluation failed");
                false
            }
        }
    }

    /// Write `v`, `f` and `t` attributes onto the current element
    pub fn write_attributes(&self, writer: &mut dyn Writer) {
        writer.write_attribute_string("v", &self.value.to_string());
        if let Some(formula) = &self.formula {
            writer.write_attribute_string("f", formula.source());
        }
        match self.value {
            Value::Number(_) => {}
            _ => writer.write_attribute_string("t", self.value.type_tag()),
        }
    }

    /// Write as a standalone element holding only this expression
    pub fn save(&self, name: &str, writer: &mut dyn Writer) {
        writer.write_start_element(name);
        self.write_attributes(writer);
        writer.write_end_element();
    }

    /// Read from the `v`/`f`/`t` attributes of `node`. An unparsable
    /// formula is dropped and the stored value kept.
    pub fn read<R: Reader>(reader: &R, node: &R::Node) -> Self {
        let value = reader
            .attribute(node, "v")
            .map(|v| Value::parse_tagged(v, Some(reader.attribute(node, "t").unwrap_or("n"))))
            .unwrap_or_default();
        let formula = reader.attribute(node, "f").and_then(|src| match Formula::parse(src) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(formula = src, error = %e, "dropping unparsable formula");
                None
            }
        });
        Expression { value, formula }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::new(value)
    }
}

impl From<f64> for Expression {
    fn from(v: f64) -> Self {
        Expression::new(v)
    }
}

impl From<i32> for Expression {
    fn from(v: i32) -> Self {
        Expression::new(v)
    }
}

impl From<bool> for Expression {
    fn from(v: bool) -> Self {
        Expression::new(v)
    }
}

/// Text literal; use [`Expression::formula`] to parse text as a formula
impl From<&str> for Expression {
    fn from(v: &str) -> Self {
        Expression::new(v)
    }
}

impl From<String> for Expression {
    fn from(v: String) -> Self {
        Expression::new(v)
    }
}
