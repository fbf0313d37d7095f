//! # Entity Model
//!
//! The runtime description of entities that predicates, ordering keys, keyset
//! cursors and bulk updates are resolved against.
//!
//! - [`Value`] / [`ValueKind`] - scalar values and their declared kinds
//! - [`FieldType`] - Rust types that back entity properties
//! - [`Entity`] - property lookup by name, generated by [`impl_entity!`](crate::impl_entity)

pub mod entity;
pub mod value;

pub use entity::{Entity, FieldDef, FieldType};
pub use value::{Value, ValueKind};
