//! # exprkit - Extensible Expression Engine in Rust
//!
//! An expression language evaluated against caller-supplied objects:
//! - PEG parser producing an AST with per-node identities
//! - Tree-walking evaluator with property access, method calls, variables,
//!   boolean/relational/arithmetic operators, ternaries, inline lists and
//!   assignment
//! - Pluggable resolver chains deciding how every property and method name
//!   resolves, with a per-node resolution cache
//! - Argument coercion, including variable-arity parameter packing
//!
//! ## Quick Start
//!
//! ```
//! use exprkit::parser::ExprParser;
//! use exprkit::runner::ds::value::Value;
//! use exprkit::runner::plugin::registry::TypeRegistry;
//! use exprkit::runner::plugin::types::EvalContext;
//!
//! let expr = ExprParser::parse_expression("#name.toUpperCase() + '!'").unwrap();
//!
//! let mut ctx = EvalContext::with_registry(TypeRegistry::with_core());
//! ctx.set_variable("name", "andy");
//!
//! assert_eq!(expr.get_value(&ctx).unwrap(), Value::from("ANDY!"));
//! ```
//!
//! ## Host Objects
//!
//! Caller types implement [`runner::ds::value::HostObject`] and describe
//! their members with a [`runner::plugin::types::TypeDescriptor`]:
//!
//! ```
//! use exprkit::parser::ExprParser;
//! use exprkit::runner::ds::value::{HostObject, Value, ValueType};
//! use exprkit::runner::plugin::registry::TypeRegistry;
//! use exprkit::runner::plugin::resolver::MethodSignature;
//! use exprkit::runner::plugin::types::{EvalContext, TypeDescriptor};
//!
//! #[derive(Debug)]
//! struct User {
//!     name: String,
//!     roles: Vec<String>,
//! }
//!
//! impl HostObject for User {
//!     fn type_name(&self) -> &str {
//!         "User"
//!     }
//! }
//!
//! let mut registry = TypeRegistry::with_core();
//! registry.register_type(
//!     TypeDescriptor::new("User")
//!         .add_field("name", ValueType::String, |u: &User| Value::from(u.name.as_str()))
//!         .add_object_method(
//!             "hasAnyRole",
//!             MethodSignature::varargs(vec![], ValueType::String),
//!             |u: &User, args| {
//!                 let wanted = args[0].as_list().unwrap_or(&[]);
//!                 Ok(Value::Boolean(wanted.iter().any(|w| {
//!                     u.roles.iter().any(|r| Some(r.as_str()) == w.as_str())
//!                 })))
//!             },
//!         ),
//! );
//!
//! let mut ctx = EvalContext::with_registry(registry);
//! ctx.set_root_object(Value::object(User {
//!     name: "Andy".to_string(),
//!     roles: vec!["MANAGER".to_string()],
//! }));
//!
//! let expr = ExprParser::parse_expression("hasAnyRole('MANAGER', 'TELLER') and name == 'Andy'").unwrap();
//! assert_eq!(expr.get_value_as::<bool>(&ctx).unwrap(), true);
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG grammar and AST types
//! - **[`runner`]** - Evaluation
//!   - **[`runner::ds`]** - Values, errors, coercion and operators
//!   - **[`runner::eval`]** - Tree-walking evaluator, cache and compiled expressions
//!   - **[`runner::plugin`]** - Resolver traits, chains, context and configuration
//!   - **[`runner::std_lib`]** - Members of the built-in String and List types

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
