//! Reference addresses.
//!
//! An [`Address`] names a referenceable thing: `net.subnets[0].id`.
//! Addresses come in two flavors here: concrete ones (carried by
//! reference origins and targets, and compared structurally) and
//! templates (carried by schemas, instantiated against a concrete
//! attribute or block to produce the concrete address).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete reference address: an ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub Vec<AddressStep>);

/// One step of a concrete address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressStep {
    /// The leading name.
    Root(String),
    /// `.name`
    Attr(String),
    /// `[0]`
    IndexInt(u64),
    /// `["key"]`
    IndexStr(String),
}

impl Address {
    pub fn root(name: impl Into<String>) -> Self {
        Address(vec![AddressStep::Root(name.into())])
    }

    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.0.push(AddressStep::Attr(name.into()));
        self
    }

    pub fn steps(&self) -> &[AddressStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `other` starts with all of `self`'s steps.
    pub fn is_prefix_of(&self, other: &Address) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            match step {
                AddressStep::Root(name) => write!(f, "{name}")?,
                AddressStep::Attr(name) => write!(f, ".{name}")?,
                AddressStep::IndexInt(i) => write!(f, "[{i}]")?,
                AddressStep::IndexStr(s) => write!(f, "[\"{s}\"]")?,
            }
        }
        Ok(())
    }
}

/// An address template attached to a schema node. Instantiated against
/// the concrete attribute or block it describes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTemplate {
    pub steps: Vec<TemplateStep>,
    /// Scope the produced target belongs to (e.g. `"service"`).
    pub scope_id: Option<String>,
}

/// One step of an address template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateStep {
    /// A fixed name.
    Static(String),
    /// The attribute's own name (attribute schemas only).
    AttrName,
    /// The value of the block label at this index (block schemas only).
    LabelIndex(usize),
}
