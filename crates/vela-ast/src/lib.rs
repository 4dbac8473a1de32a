//! Syntax tree data model for the Vela compiler.
//!
//! The semantic core consumes a parsed tree; parsing itself is an
//! external collaborator. Nodes live in a `NodeArena` and are addressed
//! by `NodeIndex`. Node payloads are carried by the closed [`NodeKind`]
//! sum type so the expression/statement resolver can dispatch with an
//! exhaustive `match` and the compiler flags unhandled kinds.

pub mod arena;
pub mod builder;
pub mod node;

pub use arena::{NodeArena, NodeIndex};
pub use builder::AstBuilder;
pub use node::{BinaryOp, FunctionData, IndexKeyKind, Node, NodeKind, UnaryOp};
