//! Allowed-value constraints for attributes

use crate::formula::Value;

/// Restricts an attribute to an explicit set of values.
///
/// Invalid values are not rejected; [`RangeConstraint::get_value`] replaces
/// them with the configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint {
    allowed: Vec<Value>,
    default: Value,
}

impl RangeConstraint {
    pub fn new(allowed: Vec<Value>, default: impl Into<Value>) -> Self {
        RangeConstraint {
            allowed,
            default: default.into(),
        }
    }

    /// Allow every value of a constant set, e.g. `FillStyle::PROPERTIES`
    pub fn from_properties_of(properties: &[(&str, f64)], default: impl Into<Value>) -> Self {
        Self::new(properties.iter().map(|(_, v)| Value::Number(*v)).collect(), default)
    }

    pub fn allowed(&self) -> &[Value] {
        &self.allowed
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.allowed.iter().any(|a| matches_value(a, value))
    }

    /// `value` if allowed, the default otherwise
    pub fn get_value(&self, value: &Value) -> Value {
        if self.is_valid(value) { value.clone() } else { self.default.clone() }
    }
}

/// Numbers compare by value so `1` matches `true` and `"1"`
fn matches_value(allowed: &Value, value: &Value) -> bool {
    match (allowed, value) {
        (Value::Number(a), v) => v.as_number().is_ok_and(|n| n == *a),
        (a, v) => a == v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_fall_back_to_default() {
        let range = RangeConstraint::from_properties_of(&[("A", 0.0), ("B", 1.0)], 0.0);
        assert_eq!(range.get_value(&Value::Number(99.0)), Value::Number(0.0));
        assert_eq!(range.get_value(&Value::Number(1.0)), Value::Number(1.0));
        assert!(range.is_valid(&Value::Text("1".into())));
        assert!(!range.is_valid(&Value::Text("B".into())));
    }

    #[test]
    fn text_sets() {
        let range = RangeConstraint::new(vec!["left".into(), "right".into()], "left");
        assert_eq!(range.get_value(&"right".into()), Value::from("right"));
        assert_eq!(range.get_value(&"middle".into()), Value::from("left"));
    }
}
