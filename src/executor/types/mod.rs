//! Type definitions shared by the parser and the resolver:
//! - AST nodes (Node and its operators)
//! - Runtime values (Value)

pub mod ast;
pub mod values;

pub use ast::{AssignOp, BinaryOp, Node, Property, TemplateElement, UnaryOp, UpdateOp};
pub use values::{Value, UNKNOWN_VALUE};
