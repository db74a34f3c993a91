//! Pluggable name resolution.
//!
//! Every property read, property write and method call in an expression is
//! answered by a chain of resolvers held in the [`EvalContext`]. Host
//! applications register their own resolvers ahead of the default one to
//! override or extend how names resolve.
//!
//! ```text
//! Property / method lookup order:
//! 1. Resolvers added with add_*_resolver_first (most recent first)
//! 2. Resolvers added with add_*_resolver (in registration order)
//! 3. The default ReflectiveResolver over the TypeRegistry
//! ```
//!
//! ### Key Components
//!
//! - **[`PropertyResolver`]** / **[`MethodResolver`]**: strategy traits
//! - **[`MethodExecutor`]**: a resolved, invocable method binding
//! - **[`ResolverChain`]**: ordered resolvers with a pinned default at the tail
//! - **[`ReflectiveResolver`]**: default resolver over registered type descriptors
//! - **[`EvalContext`]**: root object, variables, chains and the type converter
//!
//! ### Resolution Flow
//!
//! 1. **Check cache**: did a resolver accept this node for this target type before?
//! 2. **Re-check it**: the cached resolver is asked first
//! 3. **Scan**: otherwise every resolver is asked in chain order
//! 4. **Commit**: the first to accept performs the access; its failure is final
//!
//! ## Example: Custom Method Resolver
//!
//! ```
//! use std::rc::Rc;
//! use exprkit::parser::ExprParser;
//! use exprkit::runner::ds::error::AccessError;
//! use exprkit::runner::ds::value::{Value, ValueType};
//! use exprkit::runner::plugin::resolver::{FnExecutor, MethodExecutor, MethodResolver};
//! use exprkit::runner::plugin::types::EvalContext;
//!
//! struct Doubler;
//!
//! impl MethodResolver for Doubler {
//!     fn resolve(&self, _ctx: &EvalContext, _target: &Value, name: &str,
//!                arg_types: &[ValueType]) -> Result<Option<Box<dyn MethodExecutor>>, AccessError> {
//!         if name != "double" || arg_types != [ValueType::Int] {
//!             return Ok(None);
//!         }
//!         Ok(Some(Box::new(FnExecutor::new(None, |_ctx, _target, args| match args[0] {
//!             Value::Int(n) => Ok(Value::Int(n * 2)),
//!             _ => Err(AccessError::failed("expected an Int")),
//!         }))))
//!     }
//!
//!     fn name(&self) -> &str { "doubler" }
//! }
//!
//! let mut ctx = EvalContext::new();
//! ctx.add_method_resolver(Rc::new(Doubler));
//!
//! let expr = ExprParser::parse_expression("double(21)").unwrap();
//! assert_eq!(expr.get_value(&ctx).unwrap(), Value::Int(42));
//! ```

pub mod chain;
pub mod config;
pub mod reflective_resolver;
pub mod registry;
pub mod resolver;
pub mod types;

pub use chain::{ResolvedMethod, ResolverChain};
pub use config::{ConfigError, EngineConfig, NarrowingPolicy};
pub use reflective_resolver::ReflectiveResolver;
pub use registry::TypeRegistry;
pub use resolver::{FnExecutor, MethodExecutor, MethodResolver, MethodSignature, PropertyResolver};
pub use types::{EvalContext, TypeDescriptor};
