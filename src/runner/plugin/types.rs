//! Core types for the resolver architecture: the evaluation context and the
//! member descriptors the default resolver works from.

use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::AccessError;
use crate::runner::ds::operations::type_conversion::{StandardTypeConverter, TypeConverter};
use crate::runner::ds::value::{HostObject, Value, ValueType};
use crate::runner::plugin::chain::ResolverChain;
use crate::runner::plugin::config::EngineConfig;
use crate::runner::plugin::reflective_resolver::ReflectiveResolver;
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::resolver::{MethodResolver, MethodSignature, PropertyResolver};

/// Per-session evaluation environment.
///
/// Holds the root object, the variables visible as `#name`, the resolver
/// chains and the type converter. A context may be reused for many
/// evaluations; changing the root object or variables between calls is
/// expected. Evaluation only ever borrows the context immutably, so
/// registration and variable changes cannot overlap an evaluation in flight.
pub struct EvalContext {
    root: Value,
    variables: HashMap<String, Value>,
    property_resolvers: ResolverChain<dyn PropertyResolver>,
    method_resolvers: ResolverChain<dyn MethodResolver>,
    type_converter: Rc<dyn TypeConverter>,
    config: EngineConfig,
}

impl EvalContext {
    /// A context with no resolvers and a null root object.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        EvalContext {
            root: Value::Null,
            variables: HashMap::new(),
            property_resolvers: ResolverChain::new(),
            method_resolvers: ResolverChain::new(),
            type_converter: Rc::new(StandardTypeConverter::new(config.narrowing)),
            config,
        }
    }

    /// A context whose default resolver reads members from `registry`.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        let mut ctx = Self::new();
        ctx.install_type_registry(registry);
        ctx
    }

    /// Install a [`ReflectiveResolver`] over `registry` as the default
    /// (last) resolver of both the property and the method chain.
    ///
    /// The type converter is replaced by a standard one that shares the
    /// registry, so objects convert to their registered ancestor types. Call
    /// [`set_type_converter`](Self::set_type_converter) afterwards to use a
    /// different converter.
    pub fn install_type_registry(&mut self, registry: TypeRegistry) {
        let registry = Rc::new(registry);
        let resolver = Rc::new(ReflectiveResolver::shared(registry.clone()));
        self.property_resolvers.set_default(Some(resolver.clone()));
        self.method_resolvers.set_default(Some(resolver));
        self.type_converter = Rc::new(StandardTypeConverter::new(self.config.narrowing).with_registry(registry));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_root_object(&mut self, root: impl Into<Value>) {
        self.root = root.into();
    }

    pub fn root_object(&self) -> &Value {
        &self.root
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn lookup_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Register a property resolver ahead of the default resolver.
    pub fn add_property_resolver(&mut self, resolver: Rc<dyn PropertyResolver>) {
        self.property_resolvers.add(resolver);
    }

    /// Register a property resolver ahead of every other resolver.
    pub fn add_property_resolver_first(&mut self, resolver: Rc<dyn PropertyResolver>) {
        self.property_resolvers.add_first(resolver);
    }

    pub fn remove_property_resolver(&mut self, name: &str) -> Option<Rc<dyn PropertyResolver>> {
        self.property_resolvers.remove(name)
    }

    /// Register a method resolver ahead of the default resolver.
    pub fn add_method_resolver(&mut self, resolver: Rc<dyn MethodResolver>) {
        self.method_resolvers.add(resolver);
    }

    /// Register a method resolver ahead of every other resolver.
    pub fn add_method_resolver_first(&mut self, resolver: Rc<dyn MethodResolver>) {
        self.method_resolvers.add_first(resolver);
    }

    pub fn remove_method_resolver(&mut self, name: &str) -> Option<Rc<dyn MethodResolver>> {
        self.method_resolvers.remove(name)
    }

    pub fn property_resolvers(&self) -> &ResolverChain<dyn PropertyResolver> {
        &self.property_resolvers
    }

    pub fn property_resolvers_mut(&mut self) -> &mut ResolverChain<dyn PropertyResolver> {
        &mut self.property_resolvers
    }

    pub fn method_resolvers(&self) -> &ResolverChain<dyn MethodResolver> {
        &self.method_resolvers
    }

    pub fn method_resolvers_mut(&mut self) -> &mut ResolverChain<dyn MethodResolver> {
        &mut self.method_resolvers
    }

    pub fn type_converter(&self) -> &dyn TypeConverter {
        &*self.type_converter
    }

    pub fn set_type_converter(&mut self, converter: Rc<dyn TypeConverter>) {
        self.type_converter = converter;
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

pub type GetterFn = Rc<dyn Fn(&Value) -> Result<Value, AccessError>>;
pub type SetterFn = Rc<dyn Fn(&Value, Value) -> Result<(), AccessError>>;
pub type MethodFn = Rc<dyn Fn(&EvalContext, &Value, Vec<Value>) -> Result<Value, AccessError>>;

/// A readable (and optionally writable) property.
#[derive(Clone)]
pub struct PropertyDef {
    pub value_type: ValueType,
    pub getter: GetterFn,
    pub setter: Option<SetterFn>,
}

/// One overload of a method.
#[derive(Clone)]
pub struct MethodDef {
    pub signature: MethodSignature,
    pub func: MethodFn,
}

/// Member table for one runtime type.
pub struct TypeDescriptor {
    /// Name of the type, matched against `Value::type_name()`.
    pub name: String,

    /// Type whose members are inherited when not found here.
    pub parent: Option<String>,

    pub properties: HashMap<String, PropertyDef>,

    /// Overloads by method name, in registration order.
    pub methods: HashMap<String, Vec<MethodDef>>,
}

fn not_an_instance(type_name: &str, target: &Value) -> AccessError {
    AccessError::failed(format!("{} is not an instance of {}", target.type_name(), type_name))
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            parent: None,
            properties: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a read-only property computed from the target value.
    pub fn add_property<F>(mut self, name: impl Into<String>, value_type: ValueType, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, AccessError> + 'static,
    {
        self.properties.insert(
            name.into(),
            PropertyDef {
                value_type,
                getter: Rc::new(getter),
                setter: None,
            },
        );
        self
    }

    /// Add a read-only property of host objects of type `T`.
    pub fn add_field<T, F>(self, name: impl Into<String>, value_type: ValueType, getter: F) -> Self
    where
        T: HostObject,
        F: Fn(&T) -> Value + 'static,
    {
        let type_name = self.name.clone();
        self.add_property(name, value_type, move |target| {
            target
                .with_object(|obj: &T| getter(obj))
                .ok_or_else(|| not_an_instance(&type_name, target))
        })
    }

    /// Add a readable and writable property of host objects of type `T`.
    ///
    /// The setter receives the new value already coerced to `value_type`.
    pub fn add_mutable_field<T, G, S>(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        getter: G,
        setter: S,
    ) -> Self
    where
        T: HostObject,
        G: Fn(&T) -> Value + 'static,
        S: Fn(&mut T, Value) -> Result<(), AccessError> + 'static,
    {
        let get_type = self.name.clone();
        let set_type = self.name.clone();
        self.properties.insert(
            name.into(),
            PropertyDef {
                value_type,
                getter: Rc::new(move |target: &Value| {
                    target
                        .with_object(|obj: &T| getter(obj))
                        .ok_or_else(|| not_an_instance(&get_type, target))
                }),
                setter: Some(Rc::new(move |target: &Value, value: Value| {
                    target
                        .with_object_mut(|obj: &mut T| setter(obj, value))
                        .unwrap_or_else(|| Err(not_an_instance(&set_type, target)))
                })),
            },
        );
        self
    }

    /// Add a method overload operating on the target value.
    pub fn add_method<F>(mut self, name: impl Into<String>, signature: MethodSignature, func: F) -> Self
    where
        F: Fn(&EvalContext, &Value, Vec<Value>) -> Result<Value, AccessError> + 'static,
    {
        self.methods.entry(name.into()).or_insert_with(Vec::new).push(MethodDef {
            signature,
            func: Rc::new(func),
        });
        self
    }

    /// Add a method overload on host objects of type `T`.
    ///
    /// Arguments arrive coerced to `signature`, with variable-arity tails
    /// already packed into one list.
    pub fn add_object_method<T, F>(self, name: impl Into<String>, signature: MethodSignature, func: F) -> Self
    where
        T: HostObject,
        F: Fn(&T, Vec<Value>) -> Result<Value, AccessError> + 'static,
    {
        let type_name = self.name.clone();
        self.add_method(name, signature, move |_ctx, target, args| {
            target
                .with_object(|obj: &T| func(obj, args))
                .unwrap_or_else(|| Err(not_an_instance(&type_name, target)))
        })
    }
}
