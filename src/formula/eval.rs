//! Evaluate formula terms against an item

use super::ast::{BinaryOp, Term};
use super::value::Value;
use crate::errors::EvalError;
use crate::graph::ItemContext;

/// Evaluate a term, resolving identifiers through `item`
pub fn eval_term(term: &Term, item: &dyn ItemContext) -> Result<Value, EvalError> {
    match term {
        Term::Number(n) => Ok(Value::Number(*n)),
        Term::Text(s) => Ok(Value::Text(s.clone())),
        Term::Bool(b) => Ok(Value::Bool(*b)),
        Term::Ident(name) => item
            .resolve(name)
            .ok_or_else(|| EvalError::UnknownIdentifier { name: name.clone() }),
        Term::Neg(inner) => Ok(Value::Number(-eval_term(inner, item)?.as_number()?)),
        Term::Binary(lhs, op, rhs) => {
            let lhs = eval_term(lhs, item)?;
            let rhs = eval_term(rhs, item)?;
            eval_binary(lhs, *op, rhs)
        }
        Term::Call(name, args) => {
            let args = args
                .iter()
                .map(|a| eval_term(a, item).and_then(|v| v.as_number()))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, &args).map(Value::Number)
        }
    }
}

fn eval_binary(lhs: Value, op: BinaryOp, rhs: Value) -> Result<Value, EvalError> {
    // `+` concatenates as soon as either side is text
    let has_text = matches!(lhs, Value::Text(_)) || matches!(rhs, Value::Text(_));
    if op == BinaryOp::Add && has_text && (lhs.as_number().is_err() || rhs.as_number().is_err()) {
        return Ok(Value::Text(format!("{lhs}{rhs}")));
    }

    let (a, b) = (lhs.as_number()?, rhs.as_number()?);
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    };
    Ok(Value::Number(result))
}

fn call_function(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let arity = |expected: usize| -> Result<(), EvalError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };

    match name.to_ascii_uppercase().as_str() {
        "PI" => {
            arity(0)?;
            Ok(std::f64::consts::PI)
        }
        "SIN" => {
            arity(1)?;
            Ok(args[0].sin())
        }
        "COS" => {
            arity(1)?;
            Ok(args[0].cos())
        }
        "TAN" => {
            arity(1)?;
            Ok(args[0].tan())
        }
        "SQRT" => {
            arity(1)?;
            Ok(args[0].sqrt())
        }
        "ABS" => {
            arity(1)?;
            Ok(args[0].abs())
        }
        "MIN" | "MAX" if args.is_empty() => Err(EvalError::Arity {
            name: name.to_string(),
            expected: 1,
            got: 0,
        }),
        "MIN" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
        "MAX" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        _ => Err(EvalError::UnknownFunction { name: name.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse::parse;
    use crate::graph::ItemFrame;

    fn eval(src: &str, item: &dyn ItemContext) -> Result<Value, EvalError> {
        eval_term(&parse(src).unwrap(), item)
    }

    #[test]
    fn evaluates_against_item_size() {
        let item = ItemFrame::new(3000.0, 2000.0);
        assert_eq!(eval("WIDTH * 0.5", &item), Ok(Value::Number(1500.0)));
        assert_eq!(eval("MIN(WIDTH, HEIGHT) * 0.1", &item), Ok(Value::Number(200.0)));
        assert_eq!(eval("-HEIGHT / 4", &item), Ok(Value::Number(-500.0)));
    }

    #[test]
    fn functions() {
        let item = ItemFrame::new(0.0, 0.0);
        assert_eq!(eval("ABS(-3)", &item), Ok(Value::Number(3.0)));
        assert_eq!(eval("SQRT(16)", &item), Ok(Value::Number(4.0)));
        assert_eq!(eval("max(1, 7, 3)", &item), Ok(Value::Number(7.0)));
        assert_eq!(eval("COS(0)", &item), Ok(Value::Number(1.0)));
    }

    #[test]
    fn text_concatenation() {
        let item = ItemFrame::new(0.0, 0.0);
        assert_eq!(eval("\"w=\" + 3", &item), Ok(Value::Text("w=3".to_string())));
        assert_eq!(eval("\"2\" + 3", &item), Ok(Value::Number(5.0)));
    }

    #[test]
    fn errors() {
        let item = ItemFrame::new(10.0, 10.0);
        assert_eq!(eval("1 / 0", &item), Err(EvalError::DivisionByZero));
        assert_eq!(
            eval("DEPTH", &item),
            Err(EvalError::UnknownIdentifier { name: "DEPTH".to_string() })
        );
        assert_eq!(
            eval("SIN(1, 2)", &item),
            Err(EvalError::Arity { name: "SIN".to_string(), expected: 1, got: 2 })
        );
        assert_eq!(
            eval("FOO(1)", &item),
            Err(EvalError::UnknownFunction { name: "FOO".to_string() })
        );
    }
}
