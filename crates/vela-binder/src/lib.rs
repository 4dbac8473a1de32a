//! Declaration scaffold and symbol binder for the Vela compiler.
//!
//! The binder runs one pass over a unit's tree and produces the "decl"
//! scaffold: a lightweight record per declaration-bearing node, plus an
//! unresolved `Symbol` per logical entity. Overload signatures and
//! merged module/interface fragments all share one symbol. The resolver
//! later mutates symbols in place as it computes their types.
//!
//! The binder can also be re-entered mid-resolution to synthesize decls
//! for function expressions, object literals, and inline object-type
//! literals the resolver discovers inside expressions.

pub mod bind;
pub mod decl;
pub mod symbol;

pub use bind::Binder;
pub use decl::{Decl, DeclFlags, DeclId, DeclKind, DeclStore};
pub use symbol::{ResolveState, Symbol, SymbolArena, SymbolFlags, SymbolId, SymbolKind};
