//! Completion candidates and snippet generation.

use lethe_schema::{AttributeSchema, BlockSchema, Constraint, ObjectConstraint};
use lethe_syntax::{Range, ValueType};

/// What a candidate completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Attribute,
    Block,
    Label,
    Value,
    Keyword,
    Traversal,
}

/// The edit an editor applies when a candidate is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub range: Range,
    /// Plain replacement text.
    pub new_text: String,
    /// Structured snippet with `${n:placeholder}` tab stops.
    pub snippet: String,
}

/// One completion item offered to an editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Human-visible name.
    pub label: String,
    /// Usage hint, e.g. `required, string` or `Block`. Empty when
    /// there is nothing useful to say.
    pub detail: String,
    pub description: Option<String>,
    pub text_edit: TextEdit,
    pub kind: CandidateKind,
    /// Ask the editor to reopen completion after acceptance (used when
    /// the snippet leaves the cursor in a completable position).
    pub trigger_suggest: bool,
}

/// An ordered candidate list.
///
/// `is_complete = true` means the engine believes the list exhaustive
/// at this position; `false` invites the editor to re-query as input
/// evolves.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    pub list: Vec<Candidate>,
    pub is_complete: bool,
}

impl Candidates {
    /// A complete list: deduplicated by label (first occurrence wins)
    /// and sorted by label, case-sensitive ascending.
    pub fn complete(mut list: Vec<Candidate>) -> Self {
        let mut seen = std::collections::BTreeSet::new();
        list.retain(|c| seen.insert(c.label.clone()));
        list.sort_by(|a, b| a.label.cmp(&b.label));
        Candidates {
            list,
            is_complete: true,
        }
    }

    /// No candidates because no schema applies at this position.
    ///
    /// Representationally identical to `complete(vec![])`; kept as its
    /// own constructor because call sites mean different things by it.
    pub fn none() -> Self {
        Candidates {
            list: Vec::new(),
            is_complete: true,
        }
    }
}

impl Candidate {
    /// A candidate inserting `name = <snippet>` for an attribute.
    pub(crate) fn attribute(
        name: &str,
        schema: &AttributeSchema,
        edit_range: Range,
        prefill: bool,
    ) -> Self {
        let mut counter = 1;
        let snippet = format!(
            "{} = {}",
            name,
            constraint_snippet(&schema.constraint, &mut counter, prefill)
        );
        Candidate {
            label: name.to_string(),
            detail: schema.detail(),
            description: schema.description.clone(),
            text_edit: TextEdit {
                range: edit_range,
                new_text: name.to_string(),
                snippet,
            },
            kind: CandidateKind::Attribute,
            trigger_suggest: false,
        }
    }

    /// A candidate inserting a whole block header.
    pub(crate) fn block(block_type: &str, schema: &BlockSchema, edit_range: Range) -> Self {
        let (snippet, trigger_suggest) = block_snippet(block_type, schema);
        Candidate {
            label: block_type.to_string(),
            detail: schema.detail.clone().unwrap_or_else(|| "Block".to_string()),
            description: schema.description.clone(),
            text_edit: TextEdit {
                range: edit_range,
                new_text: block_type.to_string(),
                snippet,
            },
            kind: CandidateKind::Block,
            trigger_suggest,
        }
    }

    /// A candidate replacing a block label's value.
    pub(crate) fn label_value(value: &str, edit_range: Range) -> Self {
        Candidate {
            label: value.to_string(),
            detail: String::new(),
            description: None,
            text_edit: TextEdit {
                range: edit_range,
                new_text: value.to_string(),
                snippet: value.to_string(),
            },
            kind: CandidateKind::Label,
            trigger_suggest: false,
        }
    }

    /// A candidate inserting a plain spelling (keyword, literal value).
    pub(crate) fn spelled(text: &str, detail: String, kind: CandidateKind, edit_range: Range) -> Self {
        Candidate {
            label: text.to_string(),
            detail,
            description: None,
            text_edit: TextEdit {
                range: edit_range,
                new_text: text.to_string(),
                snippet: text.to_string(),
            },
            kind,
            trigger_suggest: false,
        }
    }
}

/// Snippet for the block header of `block_type`: labels become tab
/// stops, then one final stop inside the body. Completable dep-key
/// labels become bare placeholders and flip `trigger_suggest` so the
/// editor immediately offers label values.
pub(crate) fn block_snippet(block_type: &str, schema: &BlockSchema) -> (String, bool) {
    let mut parts = vec![block_type.to_string()];
    let mut trigger_suggest = false;
    let mut n = 1;
    for label in &schema.labels {
        if label.is_dep_key && label.completable {
            parts.push(format!("\"${{{n}}}\""));
            trigger_suggest = true;
        } else {
            parts.push(format!("\"${{{n}:{}}}\"", label.name));
        }
        n += 1;
    }
    let snippet = format!("{} {{\n  ${{{n}}}\n}}", parts.join(" "));
    (snippet, trigger_suggest)
}

/// Snippet for an expression matching `constraint`, consuming
/// placeholder numbers from `counter`.
pub(crate) fn constraint_snippet(
    constraint: &Constraint,
    counter: &mut u32,
    prefill: bool,
) -> String {
    match constraint {
        Constraint::LiteralType(t) => type_snippet(t, counter, prefill),
        Constraint::LiteralValue(v) => v.to_source(),
        Constraint::Keyword { keyword, .. } => keyword.clone(),
        Constraint::OneOf(cons) => match cons.first() {
            Some(first) => constraint_snippet(first, counter, prefill),
            None => placeholder(counter),
        },
        Constraint::List(_) | Constraint::Set(_) | Constraint::Tuple(_) => {
            format!("[ {} ]", placeholder(counter))
        }
        Constraint::Map(_) => map_snippet(counter),
        Constraint::Object(obj) => object_constraint_snippet(obj, counter, prefill),
        Constraint::Reference(_)
        | Constraint::TypeDeclaration
        | Constraint::AnyExpression { .. } => placeholder(counter),
    }
}

fn type_snippet(t: &ValueType, counter: &mut u32, prefill: bool) -> String {
    match t {
        ValueType::String => {
            let n = next(counter);
            format!("\"${{{n}:value}}\"")
        }
        ValueType::Number => {
            let n = next(counter);
            format!("${{{n}:0}}")
        }
        ValueType::Bool => {
            let n = next(counter);
            format!("${{{n}:false}}")
        }
        ValueType::List(_) | ValueType::Set(_) | ValueType::Tuple(_) => {
            format!("[ {} ]", placeholder(counter))
        }
        ValueType::Map(_) => map_snippet(counter),
        ValueType::Object(fields) => {
            if !prefill {
                return format!("{{\n  {}\n}}", placeholder(counter));
            }
            let mut lines = vec!["{".to_string()];
            for (name, field_type) in fields {
                lines.push(format!(
                    "  {} = {}",
                    name,
                    type_snippet(field_type, counter, prefill)
                ));
            }
            lines.push("}".to_string());
            lines.join("\n")
        }
        ValueType::Dynamic => placeholder(counter),
    }
}

fn object_constraint_snippet(obj: &ObjectConstraint, counter: &mut u32, prefill: bool) -> String {
    if !prefill {
        return format!("{{\n  {}\n}}", placeholder(counter));
    }
    let mut lines = vec!["{".to_string()];
    for (name, attr) in obj.attributes.iter().filter(|(_, a)| a.required) {
        lines.push(format!(
            "  {} = {}",
            name,
            constraint_snippet(&attr.constraint, counter, prefill)
        ));
    }
    if lines.len() == 1 {
        // No required fields to instantiate.
        lines.push(format!("  {}", placeholder(counter)));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

fn map_snippet(counter: &mut u32) -> String {
    let key = next(counter);
    let value = next(counter);
    format!("{{\n  \"${{{key}:key}}\" = ${{{value}}}\n}}")
}

fn placeholder(counter: &mut u32) -> String {
    let n = next(counter);
    format!("${{{n}}}")
}

fn next(counter: &mut u32) -> u32 {
    let n = *counter;
    *counter += 1;
    n
}
