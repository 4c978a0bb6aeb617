//! JSX front end: parse component source, lower JSX into element
//! construction calls, print the lowered program.

pub mod ast;
mod codegen;
mod lower;
mod parser;

pub use codegen::{print_expr, print_program};
pub use lower::{lower_expr, lower_program};
pub use parser::{decode_entities, parse_expression, parse_program};

pub(crate) use codegen::string_literal;
