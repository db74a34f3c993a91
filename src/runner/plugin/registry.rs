//! Type registry backing the default member resolver.

use std::collections::{HashMap, HashSet};

use super::types::{MethodDef, PropertyDef, TypeDescriptor};
use crate::runner::std_lib::register_core_types;

/// Member tables for every runtime type the default resolver understands.
///
/// Lookups walk from a type to its parent, so members declared on a parent
/// type are visible on its subtypes unless the subtype declares its own.
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TypeRegistry {
            types: HashMap::new(),
        }
    }

    /// Create a registry with the core types (String, List).
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_types(&mut registry);
        registry
    }

    /// Register a type, replacing any previous descriptor of the same name.
    pub fn register_type(&mut self, desc: TypeDescriptor) {
        self.types.insert(desc.name.clone(), desc);
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    pub fn get_type_mut(&mut self, name: &str) -> Option<&mut TypeDescriptor> {
        self.types.get_mut(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// `type_name` followed by its ancestors, nearest first. Unregistered
    /// parents end the walk; a parent cycle is walked once.
    pub fn lineage(&self, type_name: &str) -> Vec<&TypeDescriptor> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(type_name);
        while let Some(name) = next {
            if !seen.insert(name) {
                break;
            }
            match self.types.get(name) {
                Some(desc) => {
                    out.push(desc);
                    next = desc.parent.as_deref();
                }
                None => break,
            }
        }
        out
    }

    pub fn find_property(&self, type_name: &str, property: &str) -> Option<&PropertyDef> {
        self.lineage(type_name)
            .into_iter()
            .find_map(|desc| desc.properties.get(property))
    }

    /// Every overload of `method` visible on `type_name`, nearest type first.
    ///
    /// An overload is hidden when a nearer type declares one with the same
    /// signature.
    pub fn find_methods(&self, type_name: &str, method: &str) -> Vec<&MethodDef> {
        let mut out: Vec<&MethodDef> = Vec::new();
        for desc in self.lineage(type_name) {
            if let Some(overloads) = desc.methods.get(method) {
                for def in overloads {
                    if !out.iter().any(|seen| seen.signature == def.signature) {
                        out.push(def);
                    }
                }
            }
        }
        out
    }

    /// Whether `sub` is `sup` or declares it as an ancestor.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.lineage(sub).iter().any(|desc| desc.name == sup)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::{Value, ValueType};
    use crate::runner::plugin::resolver::MethodSignature;

    fn constant(v: i32) -> impl Fn(&Value) -> Result<Value, crate::runner::ds::error::AccessError> {
        move |_| Ok(Value::Int(v))
    }

    fn family() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_type(
            TypeDescriptor::new("Person")
                .add_property("age", ValueType::Int, constant(40))
                .add_property("rank", ValueType::Int, constant(1))
                .add_method("greet", MethodSignature::new(vec![]), |_, _, _| Ok(Value::from("person")))
                .add_method(
                    "greet",
                    MethodSignature::new(vec![ValueType::String]),
                    |_, _, _| Ok(Value::from("person/1")),
                ),
        );
        registry.register_type(
            TypeDescriptor::new("Manager")
                .with_parent("Person")
                .add_property("rank", ValueType::Int, constant(5))
                .add_method("greet", MethodSignature::new(vec![]), |_, _, _| Ok(Value::from("manager"))),
        );
        registry
    }

    #[test]
    fn test_property_lookup_walks_parents() {
        let registry = family();
        let age = registry.find_property("Manager", "age").unwrap();
        assert_eq!((age.getter)(&Value::Null).unwrap(), Value::Int(40));
        let rank = registry.find_property("Manager", "rank").unwrap();
        assert_eq!((rank.getter)(&Value::Null).unwrap(), Value::Int(5));
        assert!(registry.find_property("Manager", "salary").is_none());
        assert!(registry.find_property("Unknown", "age").is_none());
    }

    #[test]
    fn test_subtype_overload_hides_same_signature() {
        let registry = family();
        let overloads = registry.find_methods("Manager", "greet");
        assert_eq!(overloads.len(), 2);
        let out = (overloads[0].func)(&crate::runner::plugin::types::EvalContext::new(), &Value::Null, vec![]).unwrap();
        assert_eq!(out, Value::from("manager"));
        assert_eq!(overloads[1].signature.params(), &[ValueType::String]);
    }

    #[test]
    fn test_subtyping_and_cycles() {
        let mut registry = family();
        assert!(registry.is_subtype("Manager", "Person"));
        assert!(!registry.is_subtype("Person", "Manager"));

        registry.register_type(TypeDescriptor::new("A").with_parent("B"));
        registry.register_type(TypeDescriptor::new("B").with_parent("A"));
        assert_eq!(registry.lineage("A").len(), 2);
        assert!(!registry.is_subtype("A", "Person"));
    }

    #[test]
    fn test_core_registry_has_builtin_types() {
        let registry = TypeRegistry::with_core();
        assert_eq!(registry.type_names(), vec!["List", "String"]);
    }
}
