//! Schema type definitions.
//!
//! A [`BodySchema`] describes one body (the file root or a block
//! interior); [`Constraint`] describes the expected shape of a single
//! expression. Constraints form a small closed language, so the engine
//! dispatches over them with one central match.

use std::collections::BTreeMap;

use lethe_syntax::{Value, ValueType};

use crate::address::AddressTemplate;
use crate::dep_keys::SchemaKey;

/// Schema for a body: the file root, or the interior of a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodySchema {
    /// Named attributes. Lookup is by name; candidates present them
    /// alphabetically, which the map's ordering gives for free.
    pub attributes: BTreeMap<String, AttributeSchema>,
    /// Fallback for bodies that accept arbitrary user-chosen attribute
    /// names, all sharing one schema.
    pub any_attribute: Option<Box<AttributeSchema>>,
    /// Nested blocks by type.
    pub blocks: BTreeMap<String, BlockSchema>,
    /// Feature flags for this body.
    pub extensions: BodyExtensions,
    pub detail: Option<String>,
    pub description: Option<String>,
}

impl BodySchema {
    /// Whether this schema admits nothing at all.
    pub fn is_vacant(&self) -> bool {
        self.attributes.is_empty()
            && self.any_attribute.is_none()
            && self.blocks.is_empty()
            && !self.extensions.count
    }
}

/// Feature flags a body schema can enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyExtensions {
    /// The body accepts the builtin `count` meta-attribute (a number
    /// controlling how many instances the enclosing block declares).
    pub count: bool,
}

/// Schema for a single attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSchema {
    /// Expected shape of the attribute's expression.
    pub constraint: Constraint,
    /// At most one of `required`/`optional` is set; an attribute with
    /// neither still completes, just without the usage hint.
    pub required: bool,
    pub optional: bool,
    pub sensitive: bool,
    pub deprecated: bool,
    pub description: Option<String>,
    /// When set, declarations of this attribute are reference targets.
    pub address: Option<AddressTemplate>,
}

impl AttributeSchema {
    pub fn new(constraint: Constraint) -> Self {
        AttributeSchema {
            constraint,
            ..Default::default()
        }
    }

    /// The usage hint shown next to a candidate or in hover text:
    /// `required`/`optional`, then `sensitive`, then `deprecated`,
    /// then the constraint's type name, comma-joined.
    pub fn detail(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.required {
            parts.push("required".to_string());
        } else if self.optional {
            parts.push("optional".to_string());
        }
        if self.sensitive {
            parts.push("sensitive".to_string());
        }
        if self.deprecated {
            parts.push("deprecated".to_string());
        }
        let type_name = self.constraint.friendly_name();
        if !type_name.is_empty() {
            parts.push(type_name);
        }
        parts.join(", ")
    }
}

/// Schema for a block type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSchema {
    /// Positional labels, in order.
    pub labels: Vec<LabelSchema>,
    /// The static body schema; may be absent for blocks whose entire
    /// interior depends on their labels.
    pub body: Option<BodySchema>,
    /// Extra body schemas merged into the static body when the block
    /// matches the dependency key. `BTreeMap` keeps iteration (and so
    /// specificity tiebreaks) deterministic.
    pub dependent_body: BTreeMap<SchemaKey, BodySchema>,
    pub detail: Option<String>,
    pub description: Option<String>,
    /// When set, blocks of this type are reference targets.
    pub address: Option<AddressTemplate>,
}

/// Schema for one block label position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSchema {
    pub name: String,
    /// Participates in dependency-key matching.
    pub is_dep_key: bool,
    /// Offers value candidates drawn from dependent-body keys.
    pub completable: bool,
}

impl LabelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        LabelSchema {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn dep_key(name: impl Into<String>) -> Self {
        LabelSchema {
            name: name.into(),
            is_dep_key: true,
            completable: true,
        }
    }
}

/// Expected shape of an attribute's expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// A literal of the given type.
    LiteralType(ValueType),
    /// An exact value.
    LiteralValue(Value),
    /// A bare keyword identifier.
    Keyword {
        keyword: String,
        /// Friendly name for details; defaults to "keyword".
        name: Option<String>,
    },
    /// Any of the listed constraints; order defines candidate priority.
    OneOf(Vec<Constraint>),
    /// A traversal referring to a known reference target.
    Reference(ReferenceConstraint),
    /// `[a, b, c]` where every element matches the inner constraint.
    List(Box<Constraint>),
    /// Like `List` but order- and duplicate-insensitive semantics.
    Set(Box<Constraint>),
    /// `[a, b]` with one constraint per position.
    Tuple(Vec<Constraint>),
    /// `{ "k" = v }` where every value matches the inner constraint.
    Map(Box<Constraint>),
    /// An object literal with a fixed shape.
    Object(ObjectConstraint),
    /// An expression denoting a type, e.g. `list(string)`.
    TypeDeclaration,
    /// Any expression producing a value of the given type.
    AnyExpression { of_type: ValueType },
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint::AnyExpression {
            of_type: ValueType::Dynamic,
        }
    }
}

/// Constraint on a reference expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceConstraint {
    /// Only targets in this scope match.
    pub of_scope_id: Option<String>,
    /// Only targets of this type match.
    pub of_type: Option<ValueType>,
    /// Friendly name for details, e.g. "service reference".
    pub name: Option<String>,
}

/// Shape of an object-literal constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectConstraint {
    pub attributes: BTreeMap<String, ObjectAttribute>,
    /// Whether the whole object may instead be produced by template
    /// interpolation.
    pub allow_interpolated: bool,
}

/// One attribute inside an object constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttribute {
    pub constraint: Constraint,
    pub required: bool,
}

impl Constraint {
    /// Human-readable name of the expected shape, used as the type
    /// part of candidate details.
    pub fn friendly_name(&self) -> String {
        match self {
            Constraint::LiteralType(t) => t.friendly_name(),
            Constraint::LiteralValue(v) => v.value_type().friendly_name(),
            Constraint::Keyword { name, .. } => {
                name.clone().unwrap_or_else(|| "keyword".to_string())
            }
            Constraint::OneOf(cons) => {
                let names: Vec<String> = cons
                    .iter()
                    .map(Constraint::friendly_name)
                    .filter(|n| !n.is_empty())
                    .collect();
                names.join(" or ")
            }
            Constraint::Reference(r) => r
                .name
                .clone()
                .or_else(|| r.of_type.as_ref().map(ValueType::friendly_name))
                .unwrap_or_else(|| "reference".to_string()),
            Constraint::List(elem) => format!("list of {}", elem.friendly_name()),
            Constraint::Set(elem) => format!("set of {}", elem.friendly_name()),
            Constraint::Tuple(_) => "tuple".to_string(),
            Constraint::Map(elem) => format!("map of {}", elem.friendly_name()),
            Constraint::Object(_) => "object".to_string(),
            Constraint::TypeDeclaration => "type".to_string(),
            Constraint::AnyExpression { of_type } => of_type.friendly_name(),
        }
    }
}
