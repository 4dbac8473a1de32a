//! Demand-driven type checker.
//!
//! The checker owns the session state (syntax arena, interner, decl
//! scaffold, symbol arena, type table, diagnostic sink) and implements
//! the solver's resolver seams. Checking a unit walks its statements;
//! every type is resolved on first demand through the fixpoint
//! controller, which serves the dynamic type to re-entrant requests so
//! declaration cycles terminate instead of recursing.

pub mod decl_types;
pub mod expr;
pub mod globals;
pub mod scopes;
pub mod state;
pub mod statements;
pub mod type_nodes;

pub use state::Checker;
