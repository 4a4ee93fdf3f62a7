//! Formulas: parsing, evaluation and the value/formula pair used by
//! coordinates and attributes.

pub mod ast;
pub mod eval;
mod expression;
pub mod parse;
mod value;

pub use expression::{Expression, Formula};
pub use value::Value;
