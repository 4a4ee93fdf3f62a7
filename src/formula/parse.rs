//! Parse pest pairs into formula terms

use pest::Parser;
use pest::iterators::Pair;

use super::ast::{BinaryOp, Term};
use crate::errors::FormulaError;
use crate::{FormulaParser, Rule};

/// Parse formula source into a term
pub fn parse(source: &str) -> Result<Term, FormulaError> {
    let mut pairs = FormulaParser::parse(Rule::formula, source).map_err(|e| {
        let offset = match e.location {
            pest::error::InputLocation::Pos(p) => p,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        FormulaError::syntax(source, offset, e.variant.message().to_string())
    })?;

    let formula = pairs
        .next()
        .ok_or_else(|| FormulaError::syntax(source, 0, "empty formula"))?;
    for inner in formula.into_inner() {
        if inner.as_rule() == Rule::expr {
            return parse_expr(source, inner);
        }
    }
    Err(FormulaError::syntax(source, 0, "empty formula"))
}

fn parse_expr(source: &str, pair: Pair<Rule>) -> Result<Term, FormulaError> {
    // expr and product share the shape: operand (op operand)*
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| FormulaError::syntax(source, 0, "missing operand"))?;
    let mut lhs = parse_operand(source, first)?;

    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            other => {
                return Err(FormulaError::syntax(
                    source,
                    op.as_span().start(),
                    format!("unexpected operator {other}"),
                ));
            }
        };
        let rhs_pair = inner
            .next()
            .ok_or_else(|| FormulaError::syntax(source, source.len(), "missing operand"))?;
        let rhs = parse_operand(source, rhs_pair)?;
        lhs = Term::Binary(Box::new(lhs), op, Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_operand(source: &str, pair: Pair<Rule>) -> Result<Term, FormulaError> {
    match pair.as_rule() {
        Rule::expr | Rule::product => parse_expr(source, pair),
        Rule::unary => parse_unary(source, pair),
        _ => parse_primary(source, pair),
    }
}

fn parse_unary(source: &str, pair: Pair<Rule>) -> Result<Term, FormulaError> {
    let mut negations = 0;
    let mut operand = None;
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::neg {
            negations += 1;
        } else {
            operand = Some(parse_primary(source, inner)?);
        }
    }
    let mut term = operand.ok_or_else(|| FormulaError::syntax(source, 0, "missing operand"))?;
    for _ in 0..negations {
        term = Term::Neg(Box::new(term));
    }
    Ok(term)
}

fn parse_primary(source: &str, pair: Pair<Rule>) -> Result<Term, FormulaError> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::number => {
            let text = pair.as_str();
            text.parse::<f64>()
                .map(Term::Number)
                .map_err(|_| FormulaError::InvalidNumber {
                    text: text.to_string(),
                    src: miette::NamedSource::new("<formula>", source.to_string()),
                    span: (span.start(), span.end() - span.start()).into(),
                })
        }
        Rule::string => {
            let text = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Term::Text(text.to_string()))
        }
        Rule::boolean => Ok(Term::Bool(pair.as_str() == "true")),
        Rule::ident => Ok(Term::Ident(pair.as_str().to_string())),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .map(|p| p.as_str().to_string())
                .ok_or_else(|| FormulaError::syntax(source, span.start(), "missing function name"))?;
            let args = inner
                .map(|arg| parse_expr(source, arg))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Term::Call(name, args))
        }
        Rule::expr => parse_expr(source, pair),
        other => Err(FormulaError::syntax(
            source,
            span.start(),
            format!("unexpected rule {other:?}"),
        )),
    }
}
