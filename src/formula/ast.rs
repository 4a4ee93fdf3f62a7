//! AST for parsed formulas

use std::fmt;

/// A parsed formula term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Number(f64),
    Text(String),
    Bool(bool),
    /// A name resolved against the owning item (`WIDTH`, `HEIGHT`, `Item.X`)
    Ident(String),
    Neg(Box<Term>),
    Binary(Box<Term>, BinaryOp, Box<Term>),
    Call(String, Vec<Term>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

impl Term {
    /// True if the term references no identifiers, so it evaluates the same everywhere
    pub fn is_constant(&self) -> bool {
        match self {
            Term::Number(_) | Term::Text(_) | Term::Bool(_) => true,
            Term::Ident(_) => false,
            Term::Neg(inner) => inner.is_constant(),
            Term::Binary(lhs, _, rhs) => lhs.is_constant() && rhs.is_constant(),
            Term::Call(_, args) => args.iter().all(Term::is_constant),
        }
    }
}

/// Canonical formula text; parses back to an equal term
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Number(n) => write!(f, "{n}"),
            Term::Text(s) => write!(f, "\"{s}\""),
            Term::Bool(b) => write!(f, "{b}"),
            Term::Ident(name) => f.write_str(name),
            Term::Neg(inner) => match **inner {
                Term::Binary(..) => write!(f, "-({inner})"),
                _ => write!(f, "-{inner}"),
            },
            Term::Binary(lhs, op, rhs) => {
                let wrap = |term: &Term, right: bool| match term {
                    Term::Binary(_, child, _) => {
                        child.precedence() < op.precedence()
                            || (right
                                && child.precedence() == op.precedence()
                                && matches!(op, BinaryOp::Sub | BinaryOp::Div))
                    }
                    _ => false,
                };
                if wrap(lhs, false) {
                    write!(f, "({lhs})")?;
                } else {
                    write!(f, "{lhs}")?;
                }
                write!(f, " {} ", op.symbol())?;
                if wrap(rhs, true) { write!(f, "({rhs})") } else { write!(f, "{rhs}") }
            }
            Term::Call(name, args) => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
