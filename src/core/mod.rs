//! Core data model.
//!
//! - [`ObjectName`] - hashed identifiers with a global interning table
//! - [`Value`] / [`ValueKind`] - tagged property values and their encodings
//! - [`XmlNode`] - element/attribute tree used by every XML descriptor
//! - [`Reflect`] / [`Serializable`] - reflective properties and generic I/O
//! - [`ObjectManager`] - owning registries keyed by name

mod manager;
mod name;
mod serializable;
mod value;
mod xml;

pub use manager::*;
pub use name::*;
pub use serializable::*;
pub use value::*;
pub use xml::*;
