//! Standard member tables for the built-in value kinds.
//!
//! These descriptors give `String` and `List` values a small set of methods
//! through the default resolver, the same way host types are described.

pub mod list;
pub mod string;

use crate::runner::plugin::registry::TypeRegistry;

/// Register every core type with the registry.
pub fn register_core_types(registry: &mut TypeRegistry) {
    string::register(registry);
    list::register(registry);
}
