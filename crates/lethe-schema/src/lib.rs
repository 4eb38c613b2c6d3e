//! Schema model for the Lethe configuration language.
//!
//! A schema describes what is legal at each structural position of a
//! Lethe file: which attributes and blocks a body accepts, what shape
//! each attribute's expression must have, and which extra ("dependent")
//! body applies once a block's labels or attribute values match a
//! dependency key. Schemas are plain in-memory values; how they are
//! authored or loaded is someone else's problem.

mod address;
mod dep_keys;
mod types;

pub use address::{Address, AddressStep, AddressTemplate, TemplateStep};
pub use dep_keys::{
    AttributeDependent, DependencyKeys, DependentValue, LabelDependent, SchemaKey,
};
pub use types::{
    AttributeSchema, BlockSchema, BodyExtensions, BodySchema, Constraint, LabelSchema,
    ObjectAttribute, ObjectConstraint, ReferenceConstraint,
};
