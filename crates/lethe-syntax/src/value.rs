//! Literal value and type model.
//!
//! Expressions that consist purely of literals fold into a [`Value`];
//! schemas describe expected shapes with [`ValueType`]. Both are
//! structural: two values compare equal when their shapes and leaves
//! do, regardless of where they were parsed.

use std::collections::BTreeMap;
use std::fmt;

/// The type of a literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    String,
    Number,
    Bool,
    /// Stands in for "any single type" where the schema does not care.
    Dynamic,
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>),
    Tuple(Vec<ValueType>),
    /// An object with a fixed set of typed fields, in key order.
    Object(BTreeMap<String, ValueType>),
}

impl ValueType {
    /// Human-readable name used in completion details and hover text,
    /// e.g. `"string"`, `"set of any single type"`, `"object"`.
    pub fn friendly_name(&self) -> String {
        match self {
            ValueType::String => "string".to_string(),
            ValueType::Number => "number".to_string(),
            ValueType::Bool => "bool".to_string(),
            ValueType::Dynamic => "dynamic".to_string(),
            ValueType::List(elem) => format!("list of {}", elem.element_name()),
            ValueType::Set(elem) => format!("set of {}", elem.element_name()),
            ValueType::Map(elem) => format!("map of {}", elem.element_name()),
            ValueType::Tuple(_) => "tuple".to_string(),
            ValueType::Object(_) => "object".to_string(),
        }
    }

    /// Friendly name in element position, where the dynamic
    /// pseudo-type reads as "any single type".
    fn element_name(&self) -> String {
        match self {
            ValueType::Dynamic => "any single type".to_string(),
            other => other.friendly_name(),
        }
    }

    /// Whether a value of type `self` satisfies an expectation of
    /// `other`. Dynamic accepts (and is accepted by) anything.
    pub fn assignable_to(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Dynamic, _) | (_, ValueType::Dynamic) => true,
            (ValueType::List(a), ValueType::List(b))
            | (ValueType::Set(a), ValueType::Set(b))
            | (ValueType::Map(a), ValueType::Map(b)) => a.assignable_to(b),
            (ValueType::Tuple(a), ValueType::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.assignable_to(y))
            }
            (ValueType::Object(a), ValueType::Object(b)) => b
                .iter()
                .all(|(k, bt)| a.get(k).is_some_and(|at| at.assignable_to(bt))),
            (a, b) => a == b,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Tuple(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// The type of this value. Collections derive their element type
    /// from the first element and fall back to dynamic when empty or
    /// mixed.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Bool,
            Value::Tuple(items) => {
                ValueType::Tuple(items.iter().map(Value::value_type).collect())
            }
            Value::Object(fields) => ValueType::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.value_type()))
                    .collect(),
            ),
        }
    }

    /// Render this value the way it would be typed in a Lethe file.
    pub fn to_source(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_source).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Object(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v.to_source()))
                    .collect();
                format!("{{ {} }}", inner.join(", "))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// Format a number without a trailing `.0` for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_names() {
        assert_eq!(ValueType::String.friendly_name(), "string");
        assert_eq!(
            ValueType::Set(Box::new(ValueType::Dynamic)).friendly_name(),
            "set of any single type"
        );
        assert_eq!(
            ValueType::List(Box::new(ValueType::String)).friendly_name(),
            "list of string"
        );
        assert_eq!(
            ValueType::Object(BTreeMap::new()).friendly_name(),
            "object"
        );
    }

    #[test]
    fn dynamic_assignability() {
        assert!(ValueType::Dynamic.assignable_to(&ValueType::Number));
        assert!(ValueType::Number.assignable_to(&ValueType::Dynamic));
        assert!(!ValueType::Number.assignable_to(&ValueType::String));
        assert!(
            ValueType::List(Box::new(ValueType::String))
                .assignable_to(&ValueType::List(Box::new(ValueType::Dynamic)))
        );
    }

    #[test]
    fn value_rendering() {
        assert_eq!(Value::Number(3.0).to_source(), "3");
        assert_eq!(Value::Number(0.5).to_source(), "0.5");
        assert_eq!(Value::Bool(false).to_source(), "false");
        assert_eq!(Value::String("a \"b\"".into()).to_source(), "\"a \\\"b\\\"\"");
        assert_eq!(
            Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0)]).to_source(),
            "[1, 2]"
        );
    }
}
