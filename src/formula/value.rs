//! Runtime values produced by formulas and stored in attributes

use std::fmt;

use crate::errors::EvalError;

/// A formula or attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl Value {
    /// Numeric view of the value; text that parses as a number is accepted
    pub fn as_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse().map_err(|_| EvalError::NotANumber { got: s.clone() }),
        }
    }

    /// Numeric view, falling back to 0 for non-numeric text
    pub fn number(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Text(s) => s == "true",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Persistence type tag: `n` number, `b` boolean, `s` string
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Number(_) => "n",
            Value::Bool(_) => "b",
            Value::Text(_) => "s",
        }
    }

    /// Parse persisted text using an optional type tag.
    ///
    /// Without a tag, `true`/`false` become booleans and numeric text becomes
    /// a number; everything else stays text.
    pub fn parse_tagged(text: &str, tag: Option<&str>) -> Value {
        match tag {
            Some("s") => Value::Text(text.to_string()),
            Some("b") => Value::Bool(text == "true" || text == "1"),
            Some("n") => Value::Number(text.trim().parse().unwrap_or(0.0)),
            _ => match text {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => text
                    .trim()
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or_else(|_| Value::Text(text.to_string())),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_views() {
        assert_eq!(Value::from(3).number(), 3.0);
        assert_eq!(Value::from(true).number(), 1.0);
        assert_eq!(Value::from(" 2.5 ").number(), 2.5);
        assert_eq!(
            Value::from("red").as_number(),
            Err(EvalError::NotANumber { got: "red".to_string() })
        );
    }

    #[test]
    fn parse_tagged_values() {
        assert_eq!(Value::parse_tagged("12", None), Value::Number(12.0));
        assert_eq!(Value::parse_tagged("12", Some("s")), Value::Text("12".to_string()));
        assert_eq!(Value::parse_tagged("true", None), Value::Bool(true));
        assert_eq!(Value::parse_tagged("#00FF00", None), Value::Text("#00FF00".to_string()));
    }

    #[test]
    fn display_drops_trailing_zero() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(0.25).to_string(), "0.25");
    }
}
