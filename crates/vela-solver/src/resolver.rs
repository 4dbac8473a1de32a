//! The solver↔checker seams.
//!
//! Relation checking, specialization, inference, and overload
//! resolution all need to resolve symbol types on demand, and overload
//! resolution additionally needs to (re-)resolve argument expressions
//! under trial contextual types. The checker implements these traits;
//! the engines call back through them, so the whole computation stays
//! one synchronous, re-entrant stack.

use vela_ast::NodeIndex;
use vela_binder::{SymbolArena, SymbolId};
use vela_common::{DiagnosticMessage, Interner};

use crate::context::ResolutionContext;
use crate::overload::ScratchRecord;
use crate::relate::RelationCache;
use crate::types::{TypeId, TypeTable};

/// Demand-driven access to the type/symbol graph.
pub trait TypeResolver {
    fn types(&self) -> &TypeTable;
    fn types_mut(&mut self) -> &mut TypeTable;
    fn symbols(&self) -> &SymbolArena;
    fn symbols_mut(&mut self) -> &mut SymbolArena;
    fn interner(&self) -> &Interner;
    fn interner_mut(&mut self) -> &mut Interner;
    fn context(&mut self) -> &mut ResolutionContext;
    fn relation_cache(&mut self) -> &mut RelationCache;

    /// Resolve a symbol's type, running the fixpoint controller if the
    /// symbol is still unresolved. Never fails: cycles and errors
    /// degrade to `any`/`error`.
    fn type_of_symbol(&mut self, sym: SymbolId) -> TypeId;

    /// Post a language-level diagnostic at a node.
    fn post_error(&mut self, node: NodeIndex, message: &DiagnosticMessage, args: &[&str]);
}

/// Expression resolution callbacks used by the overload and inference
/// engines.
pub trait ExprResolver: TypeResolver {
    /// Natural (context-free) type of an expression, cached per node.
    fn type_of_expr(&mut self, node: NodeIndex) -> TypeId;

    /// Resolve an expression under a contextual type. When
    /// `provisional` is set the caller is running an applicability
    /// trial and the result must not stay in the per-node cache: the
    /// caller invalidates the node right after reading the result.
    fn type_of_expr_contextual(
        &mut self,
        node: NodeIndex,
        contextual: TypeId,
        provisional: bool,
    ) -> TypeId;

    /// Evict a node's cached type (and its synthesized decl types)
    /// after a provisional trial.
    fn invalidate_node(&mut self, node: NodeIndex);

    /// Is this node a function-expression/object-literal/array-literal
    /// argument that contextual typing can re-shape?
    fn is_retypable(&self, node: NodeIndex) -> bool;

    /// Check out a scratch record for one overload-resolution call.
    fn scratch_take(&mut self) -> ScratchRecord;

    /// Return a scratch record; contents are cleared, not deallocated.
    fn scratch_put(&mut self, record: ScratchRecord);
}
