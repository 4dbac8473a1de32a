//! The resolution-session context.
//!
//! One short-lived context object is threaded through every resolution
//! call instead of ambient globals. It owns the contextual-type stack,
//! the transient flags, and the current-unit pointer. Pushes and pops
//! are strictly nested; the checker's `with_*` helpers enforce the
//! save/use/restore discipline on every exit path.

use rustc_hash::FxHashSet;
use vela_ast::NodeIndex;
use vela_common::UnitId;

use crate::types::TypeId;

/// One entry of the contextual-type stack. Provisional entries come
/// from overload applicability trials and must never leak a cached
/// node type.
#[derive(Copy, Clone, Debug)]
pub struct ContextualEntry {
    pub ty: TypeId,
    pub provisional: bool,
}

#[derive(Debug)]
pub struct ResolutionContext {
    contextual_stack: Vec<ContextualEntry>,
    /// Set while resolving an `extends`/`implements` list; class member
    /// lookups must not see the incomplete base chain.
    pub resolving_base_list: bool,
    /// Nodes currently having their type arguments inferred; blocks
    /// re-entrant inference on the same call node.
    pub inferring_nodes: FxHashSet<NodeIndex>,
    /// Set while an inference failure forces a generic to be
    /// specialized with `any` so resolution can continue.
    pub specializing_to_any: bool,
    /// Dotted-name resolution: type position instead of value position.
    pub resolving_type_reference: bool,
    /// The ambient "current compilation unit". Cross-unit lookups must
    /// save, switch, use, and restore it, including on error paths.
    pub current_unit: UnitId,
    /// Depth of in-flight generic specializations. A resolution cycle
    /// hit at depth > 0 returns the symbol unmodified instead of
    /// degrading it to `any`, so the outer specialization can finish.
    pub specialization_depth: u32,
}

impl ResolutionContext {
    pub fn new(unit: UnitId) -> Self {
        Self {
            contextual_stack: Vec::new(),
            resolving_base_list: false,
            inferring_nodes: FxHashSet::default(),
            specializing_to_any: false,
            resolving_type_reference: false,
            current_unit: unit,
            specialization_depth: 0,
        }
    }

    pub fn push_contextual(&mut self, ty: TypeId, provisional: bool) {
        self.contextual_stack.push(ContextualEntry { ty, provisional });
    }

    /// Pop must pair with the push made in the same call.
    pub fn pop_contextual(&mut self) {
        let popped = self.contextual_stack.pop();
        debug_assert!(popped.is_some(), "contextual stack underflow");
    }

    pub fn contextual_type(&self) -> Option<ContextualEntry> {
        self.contextual_stack.last().copied()
    }

    pub fn contextual_depth(&self) -> usize {
        self.contextual_stack.len()
    }
}
