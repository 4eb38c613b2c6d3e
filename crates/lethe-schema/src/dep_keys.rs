//! Dependency keys: the conditions under which a dependent body
//! schema applies to a block.
//!
//! A key is a set of label conditions (label at index N has value V)
//! and attribute conditions (attribute named A currently holds value
//! V). Keys are stored in canonical encoded form, the JSON rendering
//! of the normalized condition set, so that two encodings of the same
//! semantic condition compare equal, and so that maps keyed by
//! [`SchemaKey`] iterate in a stable, lexicographic order.

use serde::{Deserialize, Serialize};

use lethe_syntax::Value;

use crate::address::Address;

/// The conditions of one dependency key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyKeys {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelDependent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDependent>,
}

impl DependencyKeys {
    /// A key matching a single label value.
    pub fn for_label(index: usize, value: impl Into<String>) -> Self {
        DependencyKeys {
            labels: vec![LabelDependent {
                index,
                value: value.into(),
            }],
            attributes: Vec::new(),
        }
    }

    /// Number of individual conditions; more conditions means a more
    /// specific key.
    pub fn condition_count(&self) -> usize {
        self.labels.len() + self.attributes.len()
    }
}

/// A label condition: the block's label at `index` must equal `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDependent {
    pub index: usize,
    pub value: String,
}

/// An attribute condition: the block body must contain `name` with an
/// expression equal to `value`. Absence disqualifies the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDependent {
    pub name: String,
    pub value: DependentValue,
}

/// The value an attribute condition requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DependentValue {
    /// A literal, compared structurally.
    Literal(Value),
    /// A reference expression, compared by address.
    Reference(Address),
}

/// The canonical encoding of a [`DependencyKeys`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaKey(String);

impl SchemaKey {
    /// Encode a condition set. Labels are normalized by index and
    /// attributes by name first, so semantically equal condition sets
    /// always produce the same key.
    pub fn new(mut keys: DependencyKeys) -> Self {
        keys.labels.sort_by_key(|l| l.index);
        keys.attributes.sort_by(|a, b| a.name.cmp(&b.name));
        let encoded =
            serde_json::to_string(&keys).expect("dependency keys are JSON-serializable");
        SchemaKey(encoded)
    }

    /// Decode back into the condition set. Returns `None` for keys
    /// that did not come from [`SchemaKey::new`].
    pub fn decode(&self) -> Option<DependencyKeys> {
        serde_json::from_str(&self.0).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_conditions_encode_equally() {
        let a = SchemaKey::new(DependencyKeys {
            labels: vec![
                LabelDependent {
                    index: 1,
                    value: "b".into(),
                },
                LabelDependent {
                    index: 0,
                    value: "a".into(),
                },
            ],
            attributes: Vec::new(),
        });
        let b = SchemaKey::new(DependencyKeys {
            labels: vec![
                LabelDependent {
                    index: 0,
                    value: "a".into(),
                },
                LabelDependent {
                    index: 1,
                    value: "b".into(),
                },
            ],
            attributes: Vec::new(),
        });
        assert_eq!(a, b);
    }

    #[test]
    fn attribute_order_is_normalized() {
        let mk = |names: [&str; 2]| {
            SchemaKey::new(DependencyKeys {
                labels: Vec::new(),
                attributes: names
                    .iter()
                    .map(|n| AttributeDependent {
                        name: n.to_string(),
                        value: DependentValue::Literal(Value::Bool(true)),
                    })
                    .collect(),
            })
        };
        assert_eq!(mk(["x", "y"]), mk(["y", "x"]));
    }

    #[test]
    fn roundtrips_through_decode() {
        let keys = DependencyKeys {
            labels: vec![LabelDependent {
                index: 0,
                value: "postgres_database".into(),
            }],
            attributes: vec![AttributeDependent {
                name: "engine".into(),
                value: DependentValue::Reference(Address::root("engines").attr("postgres")),
            }],
        };
        let key = SchemaKey::new(keys.clone());
        assert_eq!(key.decode(), Some(keys));
    }

    #[test]
    fn distinct_conditions_encode_distinctly() {
        let a = SchemaKey::new(DependencyKeys::for_label(0, "postgres_database"));
        let b = SchemaKey::new(DependencyKeys::for_label(0, "redis_cache"));
        assert_ne!(a, b);
    }
}
