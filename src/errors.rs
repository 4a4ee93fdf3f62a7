//! Error types with rich diagnostics using miette
//!
//! Formula errors carry the formula text as their source so a bad
//! expression can be reported with a label at the failing offset.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Formula Errors
// ============================================================================

/// Errors that occur while parsing a formula
#[derive(Error, Diagnostic, Debug)]
pub enum FormulaError {
    #[error("invalid formula: {message}")]
    #[diagnostic(code(shapegraph::formula::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("invalid number: {text}")]
    #[diagnostic(code(shapegraph::formula::invalid_number))]
    InvalidNumber {
        text: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a number")]
        span: SourceSpan,
    },
}

impl FormulaError {
    pub(crate) fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            message: message.into(),
            src: NamedSource::new("<formula>", source.to_string()),
            span: offset.min(source.len()).into(),
        }
    }
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Errors that occur while evaluating a parsed formula
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown identifier: {name}")]
    #[diagnostic(
        code(shapegraph::eval::unknown_identifier),
        help("the owning item does not define this name")
    )]
    UnknownIdentifier { name: String },

    #[error("unknown function: {name}")]
    #[diagnostic(code(shapegraph::eval::unknown_function))]
    UnknownFunction { name: String },

    #[error("{name} expects {expected} argument(s), got {got}")]
    #[diagnostic(code(shapegraph::eval::arity))]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("division by zero")]
    #[diagnostic(code(shapegraph::eval::division_by_zero))]
    DivisionByZero,

    #[error("expected a number, got {got}")]
    #[diagnostic(code(shapegraph::eval::not_a_number))]
    NotANumber { got: String },
}

// ============================================================================
// Model Errors
// ============================================================================

/// Errors raised by the scene and attribute model
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("unknown attribute: {path}")]
    #[diagnostic(
        code(shapegraph::model::unknown_attribute),
        help("only names defined by the list or its template can be set")
    )]
    UnknownAttribute { path: String },

    #[error("items {from} and {to} share no common ancestor")]
    #[diagnostic(code(shapegraph::model::no_common_ancestor))]
    NoCommonAncestor { from: u64, to: u64 },

    #[error("unknown item: {id}")]
    #[diagnostic(code(shapegraph::model::unknown_item))]
    UnknownItem { id: u64 },

    #[error("unknown template: {name}")]
    #[diagnostic(code(shapegraph::model::unknown_template))]
    UnknownTemplate { name: String },

    #[error("unknown shape builder: {name}")]
    #[diagnostic(code(shapegraph::model::unknown_builder))]
    UnknownBuilder { name: String },

    #[error("invalid parent reference: {text}")]
    #[diagnostic(
        code(shapegraph::model::invalid_parent_ref),
        help("expected `tl:<template>` or `(<item id>):<path>`")
    )]
    InvalidParentRef { text: String },

    #[error("theme already installed")]
    #[diagnostic(
        code(shapegraph::model::theme_installed),
        help("install the theme before the first template is built")
    )]
    ThemeInstalled,
}
