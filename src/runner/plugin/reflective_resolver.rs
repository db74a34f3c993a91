//! Default member resolver over a [`TypeRegistry`].
//!
//! Implements both resolver traits, so one instance sits at the tail of the
//! property chain and of the method chain. Members are found by the target's
//! runtime type name, walking parent types.

use std::rc::Rc;

use tracing::trace;

use crate::runner::ds::error::AccessError;
use crate::runner::ds::operations::type_conversion::is_collected_sequence;
use crate::runner::ds::value::{Value, ValueType};
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::resolver::{MethodExecutor, MethodResolver, MethodSignature, PropertyResolver};
use crate::runner::plugin::types::{EvalContext, MethodDef, MethodFn};

pub struct ReflectiveResolver {
    registry: Rc<TypeRegistry>,
}

/// How well an overload fits the supplied argument types. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fit {
    Exact,
    Convertible,
    Varargs,
}

impl ReflectiveResolver {
    pub fn new(registry: TypeRegistry) -> Self {
        Self::shared(Rc::new(registry))
    }

    /// A resolver over a registry that is also used elsewhere, typically by
    /// the context's type converter.
    pub fn shared(registry: Rc<TypeRegistry>) -> Self {
        ReflectiveResolver { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// An overload only accepts what the context's converter will convert,
    /// so a selected overload never fails argument coercion on type alone.
    fn accepts(&self, ctx: &EvalContext, arg: &ValueType, param: &ValueType) -> bool {
        arg == param || ctx.type_converter().can_convert(arg, param)
    }

    fn fit(&self, ctx: &EvalContext, sig: &MethodSignature, arg_types: &[ValueType]) -> Option<Fit> {
        if !sig.accepts_arity(arg_types.len()) {
            return None;
        }
        let params = sig.params();
        let fixed = sig.required();
        let mut exact = true;
        for (arg, param) in arg_types.iter().zip(&params[..fixed]) {
            if !self.accepts(ctx, arg, param) {
                return None;
            }
            exact &= arg == param;
        }
        if !sig.is_varargs() {
            return Some(if exact { Fit::Exact } else { Fit::Convertible });
        }

        let sequence = &params[fixed];
        let element = sequence.element_type().unwrap_or(&ValueType::Any);
        let tail = &arg_types[fixed..];
        if let [single] = tail {
            if is_collected_sequence(ctx.type_converter(), single, sequence) {
                return Some(Fit::Varargs);
            }
        }
        if tail.iter().all(|arg| self.accepts(ctx, arg, element)) {
            Some(Fit::Varargs)
        } else {
            None
        }
    }

    fn select<'a>(
        &self,
        ctx: &EvalContext,
        candidates: &[&'a MethodDef],
        arg_types: &[ValueType],
    ) -> Option<&'a MethodDef> {
        let mut best: Option<(Fit, &MethodDef)> = None;
        for def in candidates {
            if let Some(fit) = self.fit(ctx, &def.signature, arg_types) {
                match best {
                    Some((current, _)) if current <= fit => {}
                    _ => best = Some((fit, *def)),
                }
            }
        }
        best.map(|(_, def)| def)
    }
}

/// Executor for a registered method overload.
struct RegisteredMethod {
    signature: MethodSignature,
    func: MethodFn,
}

impl MethodExecutor for RegisteredMethod {
    fn signature(&self) -> Option<&MethodSignature> {
        Some(&self.signature)
    }

    fn execute(&self, ctx: &EvalContext, target: &Value, args: Vec<Value>) -> Result<Value, AccessError> {
        (self.func)(ctx, target, args)
    }
}

impl PropertyResolver for ReflectiveResolver {
    fn can_read(&self, _ctx: &EvalContext, target: &Value, name: &str) -> Result<bool, AccessError> {
        if target.is_null() {
            return Ok(false);
        }
        Ok(self.registry.find_property(&target.type_name(), name).is_some())
    }

    fn read(&self, _ctx: &EvalContext, target: &Value, name: &str) -> Result<Value, AccessError> {
        let type_name = target.type_name();
        match self.registry.find_property(&type_name, name) {
            Some(prop) => (prop.getter)(target),
            None => Err(AccessError::failed(format!("{} has no property '{}'", type_name, name))),
        }
    }

    fn can_write(&self, _ctx: &EvalContext, target: &Value, name: &str) -> Result<bool, AccessError> {
        if target.is_null() {
            return Ok(false);
        }
        Ok(self
            .registry
            .find_property(&target.type_name(), name)
            .map_or(false, |prop| prop.setter.is_some()))
    }

    fn write(&self, ctx: &EvalContext, target: &Value, name: &str, value: Value) -> Result<(), AccessError> {
        let type_name = target.type_name();
        let prop = self
            .registry
            .find_property(&type_name, name)
            .ok_or_else(|| AccessError::failed(format!("{} has no property '{}'", type_name, name)))?;
        let setter = prop
            .setter
            .as_ref()
            .ok_or_else(|| AccessError::failed(format!("property '{}' is read-only", name)))?;
        let value = ctx
            .type_converter()
            .convert(value, &prop.value_type)
            .map_err(|e| AccessError::with_cause(format!("cannot assign '{}'", name), e))?;
        setter(target, value)
    }

    fn name(&self) -> &str {
        "reflective"
    }
}

impl MethodResolver for ReflectiveResolver {
    fn resolve(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
        arg_types: &[ValueType],
    ) -> Result<Option<Box<dyn MethodExecutor>>, AccessError> {
        if target.is_null() {
            return Ok(None);
        }
        let type_name = target.type_name();
        let candidates = self.registry.find_methods(&type_name, name);
        if candidates.is_empty() {
            return Ok(None);
        }
        if let Some(def) = self.select(ctx, &candidates, arg_types) {
            trace!(type_name = %type_name, method = name, "overload selected");
            return Ok(Some(Box::new(RegisteredMethod {
                signature: def.signature.clone(),
                func: def.func.clone(),
            })));
        }
        if candidates.iter().any(|def| def.signature.accepts_arity(arg_types.len())) {
            // Right arity, wrong types: let later resolvers try.
            return Ok(None);
        }
        let mut arities: Vec<String> = candidates.iter().map(|def| def.signature.describe_arity()).collect();
        arities.dedup();
        Err(AccessError::ArityMismatch {
            name: name.to_string(),
            expected: arities.join(" or "),
            supplied: arg_types.len(),
        })
    }

    fn name(&self) -> &str {
        "reflective"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::value::HostObject;
    use crate::runner::plugin::types::TypeDescriptor;

    #[derive(Debug)]
    struct Box2 {
        label: String,
    }

    impl HostObject for Box2 {
        fn type_name(&self) -> &str {
            "Box2"
        }
    }

    fn tag(t: &'static str) -> impl Fn(&EvalContext, &Value, Vec<Value>) -> Result<Value, AccessError> {
        move |_, _, _| Ok(Value::from(t))
    }

    fn resolver() -> ReflectiveResolver {
        let mut registry = TypeRegistry::new();
        registry.register_type(
            TypeDescriptor::new("Box2")
                .add_mutable_field(
                    "label",
                    ValueType::String,
                    |b: &Box2| Value::from(b.label.as_str()),
                    |b: &mut Box2, v| {
                        b.label = v.to_string();
                        Ok(())
                    },
                )
                .add_method("put", MethodSignature::new(vec![ValueType::Long]), tag("long"))
                .add_method("put", MethodSignature::new(vec![ValueType::Int]), tag("int"))
                .add_method("put", MethodSignature::varargs(vec![], ValueType::Int), tag("varargs"))
                .add_method("pair", MethodSignature::new(vec![ValueType::Int, ValueType::Int]), tag("pair")),
        );
        ReflectiveResolver::new(registry)
    }

    fn call(r: &ReflectiveResolver, name: &str, arg_types: &[ValueType]) -> Result<Option<String>, AccessError> {
        let ctx = EvalContext::new();
        let target = Value::object(Box2 { label: "a".to_string() });
        Ok(r.resolve(&ctx, &target, name, arg_types)?.map(|exec| {
            exec.execute(&ctx, &target, vec![]).unwrap().to_string()
        }))
    }

    #[test]
    fn test_overload_preference() {
        let r = resolver();
        assert_eq!(call(&r, "put", &[ValueType::Int]).unwrap().as_deref(), Some("int"));
        assert_eq!(call(&r, "put", &[ValueType::Long]).unwrap().as_deref(), Some("long"));
        assert_eq!(
            call(&r, "put", &[ValueType::Int, ValueType::Int]).unwrap().as_deref(),
            Some("varargs")
        );
        assert_eq!(call(&r, "put", &[]).unwrap().as_deref(), Some("varargs"));
    }

    #[test]
    fn test_unknown_member_declines() {
        let r = resolver();
        assert_eq!(call(&r, "missing", &[]).unwrap(), None);
        assert_eq!(call(&r, "pair", &[ValueType::Boolean, ValueType::Int]).unwrap(), None);
    }

    #[test]
    fn test_wrong_arity_is_an_error() {
        let r = resolver();
        let err = call(&r, "pair", &[ValueType::Int]).unwrap_err();
        assert!(matches!(err, AccessError::ArityMismatch { supplied: 1, .. }));
    }

    #[test]
    fn test_read_and_write_with_coercion() {
        let r = resolver();
        let ctx = EvalContext::new();
        let target = Value::object(Box2 { label: "a".to_string() });
        assert!(r.can_read(&ctx, &target, "label").unwrap());
        assert!(r.can_write(&ctx, &target, "label").unwrap());
        r.write(&ctx, &target, "label", Value::Int(7)).unwrap();
        assert_eq!(r.read(&ctx, &target, "label").unwrap(), Value::from("7"));
        assert!(!r.can_read(&ctx, &Value::Null, "label").unwrap());
    }
}
