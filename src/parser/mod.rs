mod api;
pub mod ast;

pub use api::{ExprParser, ParseError, Rule};
