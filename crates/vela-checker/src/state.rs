//! Session state and the resolver-seam implementations.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;
use vela_ast::{NodeArena, NodeIndex, NodeKind};
use vela_binder::{DeclId, DeclStore, ResolveState, SymbolArena, SymbolId};
use vela_common::{DiagnosticMessage, DiagnosticSink, Interner, UnitId};
use vela_solver::overload::{ScratchPool, ScratchRecord};
use vela_solver::{
    ExprResolver, RelationCache, ResolutionContext, SigId, TypeId, TypeResolver, TypeTable,
};

use crate::globals;

/// The checking session. Owns every arena and implements the solver's
/// callback seams, so relation checks, specialization, inference, and
/// overload resolution all run re-entrantly on one stack.
pub struct Checker {
    pub arena: NodeArena,
    pub interner: Interner,
    pub decls: DeclStore,
    pub symbols: SymbolArena,
    pub types: TypeTable,
    pub sink: DiagnosticSink,
    pub(crate) ctx: ResolutionContext,
    pub(crate) relations: RelationCache,
    pub(crate) scratch: ScratchPool,
    /// Natural expression types. Contextual trials bypass this cache;
    /// only committed results land here.
    pub(crate) node_types: FxHashMap<NodeIndex, TypeId>,
    /// Signatures already built for function-like decls.
    pub(crate) sig_of_decl: FxHashMap<DeclId, SigId>,
    /// Registered unit roots, in registration order. Top-level decls of
    /// every unit share the global scope.
    pub(crate) units: Vec<(UnitId, DeclId)>,
    /// Enclosing decl for name lookups; saved and restored whenever
    /// resolution jumps to a symbol declared elsewhere.
    pub(crate) scope: Option<DeclId>,
}

impl Checker {
    pub fn new(
        arena: NodeArena,
        mut interner: Interner,
        decls: DeclStore,
        symbols: SymbolArena,
    ) -> Self {
        let types = TypeTable::new(&mut interner);
        let mut checker = Self {
            arena,
            interner,
            decls,
            symbols,
            types,
            sink: DiagnosticSink::new(),
            ctx: ResolutionContext::new(UnitId(0)),
            relations: RelationCache::new(),
            scratch: ScratchPool::new(),
            node_types: FxHashMap::default(),
            sig_of_decl: FxHashMap::default(),
            units: Vec::new(),
            scope: None,
        };
        globals::install(&mut checker);
        checker
    }

    /// Register a bound unit. Must precede checking anything that can
    /// see the unit's top-level names.
    pub fn register_unit(&mut self, unit: UnitId, root: DeclId) {
        self.units.push((unit, root));
        if self.scope.is_none() {
            self.scope = Some(root);
            self.ctx.current_unit = unit;
        }
    }

    pub(crate) fn current_scope(&self) -> Option<DeclId> {
        self.scope
    }

    /// Run `f` with the ambient unit switched; restores on exit.
    pub(crate) fn with_unit<T>(&mut self, unit: UnitId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.ctx.current_unit;
        self.ctx.current_unit = unit;
        let out = f(self);
        self.ctx.current_unit = saved;
        out
    }

    /// Run `f` with the name-lookup scope switched; restores on exit.
    pub(crate) fn with_scope<T>(&mut self, scope: DeclId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.scope;
        self.scope = Some(scope);
        let out = f(self);
        self.scope = saved;
        out
    }

    // ----- Fixpoint controller -----

    /// Resolve a symbol's type on demand. A re-entrant request for a
    /// symbol already in resolution gets the dynamic type and flips the
    /// symbol to `CycleFallback` — unless a specialization is in
    /// flight, in which case the request returns whatever is recorded
    /// so the outer instantiation can finish with the symbol unchanged.
    pub fn resolve_symbol_type(&mut self, sym: SymbolId) -> TypeId {
        match self.symbols.get(sym).state {
            ResolveState::Resolved | ResolveState::CycleFallback => {
                self.types.symbol_type(sym).unwrap_or(TypeId::ANY)
            }
            ResolveState::InResolution => {
                if self.ctx.specialization_depth > 0 {
                    return self.types.symbol_type(sym).unwrap_or(TypeId::ANY);
                }
                trace!(?sym, "resolution cycle; serving the dynamic type");
                self.symbols.get_mut(sym).state = ResolveState::CycleFallback;
                TypeId::ANY
            }
            ResolveState::Unresolved => {
                self.symbols.get_mut(sym).state = ResolveState::InResolution;
                let ty = self.compute_symbol_type(sym);
                self.types.set_symbol_type(sym, ty);
                let symbol = self.symbols.get_mut(sym);
                if symbol.state == ResolveState::InResolution {
                    symbol.state = ResolveState::Resolved;
                }
                ty
            }
        }
    }

    // ----- Expression cache -----

    /// Natural (context-free) expression type, cached per node.
    pub fn expr_type(&mut self, node: NodeIndex) -> TypeId {
        if let Some(&ty) = self.node_types.get(&node) {
            return ty;
        }
        let ty = self.compute_expr_type(node);
        self.node_types.insert(node, ty);
        ty
    }

    /// Evict a node's cached type, every cached type beneath it, and
    /// the resolution state of any decls synthesized inside it, so the
    /// subtree can be re-typed under a different contextual type.
    pub fn invalidate_expr(&mut self, node: NodeIndex) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            self.node_types.remove(&current);
            if let Some(decl) = self.decls.decl_of_node(self.ctx.current_unit, current) {
                self.reset_decl(decl);
            }
            collect_children(self.arena.kind(current), &mut stack);
        }
    }

    fn reset_decl(&mut self, decl: DeclId) {
        self.sig_of_decl.remove(&decl);
        if let Some(sym) = self.decls.get(decl).symbol {
            self.symbols.get_mut(sym).state = ResolveState::Unresolved;
            self.types.remove_symbol_type(sym);
        }
        let children: SmallVec<[DeclId; 8]> = self.decls.children(decl).iter().copied().collect();
        for child in children {
            self.reset_decl(child);
        }
    }

    // ----- Diagnostics -----

    pub(crate) fn post_at(&mut self, node: NodeIndex, message: &DiagnosticMessage, args: &[&str]) {
        let span = self.arena.span(node);
        self.sink.post(self.ctx.current_unit, span, message, args);
    }
}

impl TypeResolver for Checker {
    fn types(&self) -> &TypeTable {
        &self.types
    }

    fn types_mut(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    fn symbols(&self) -> &SymbolArena {
        &self.symbols
    }

    fn symbols_mut(&mut self) -> &mut SymbolArena {
        &mut self.symbols
    }

    fn interner(&self) -> &Interner {
        &self.interner
    }

    fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    fn context(&mut self) -> &mut ResolutionContext {
        &mut self.ctx
    }

    fn relation_cache(&mut self) -> &mut RelationCache {
        &mut self.relations
    }

    fn type_of_symbol(&mut self, sym: SymbolId) -> TypeId {
        self.resolve_symbol_type(sym)
    }

    fn post_error(&mut self, node: NodeIndex, message: &DiagnosticMessage, args: &[&str]) {
        self.post_at(node, message, args);
    }
}

impl ExprResolver for Checker {
    fn type_of_expr(&mut self, node: NodeIndex) -> TypeId {
        self.expr_type(node)
    }

    fn type_of_expr_contextual(
        &mut self,
        node: NodeIndex,
        contextual: TypeId,
        provisional: bool,
    ) -> TypeId {
        // The natural pass may already have typed this subtree; evict
        // so the contextual type actually reshapes it.
        self.invalidate_expr(node);
        self.ctx.push_contextual(contextual, provisional);
        let ty = self.compute_expr_type(node);
        self.ctx.pop_contextual();
        if !provisional {
            self.node_types.insert(node, ty);
        }
        ty
    }

    fn invalidate_node(&mut self, node: NodeIndex) {
        self.invalidate_expr(node);
    }

    fn is_retypable(&self, node: NodeIndex) -> bool {
        self.arena.kind(node).is_contextually_retypable()
    }

    fn scratch_take(&mut self) -> ScratchRecord {
        self.scratch.take()
    }

    fn scratch_put(&mut self, record: ScratchRecord) {
        self.scratch.put(record);
    }
}

/// Push every direct child node of `kind` onto `stack`.
fn collect_children(kind: &NodeKind, stack: &mut Vec<NodeIndex>) {
    match kind {
        NodeKind::Unit { stmts } | NodeKind::Block { stmts } => stack.extend(stmts),
        NodeKind::Member { object, .. } => stack.push(*object),
        NodeKind::Index { object, index } => stack.extend([*object, *index]),
        NodeKind::ArrayLit { elements } => stack.extend(elements),
        NodeKind::ObjectLit { props } => stack.extend(props),
        NodeKind::ObjectProp { value, .. } => stack.push(*value),
        NodeKind::FunctionExpr(data) | NodeKind::FunctionDecl(data) => {
            stack.extend(&data.type_params);
            stack.extend(&data.params);
            stack.extend(data.return_ty);
            stack.extend(data.body);
        }
        NodeKind::Call {
            callee,
            type_args,
            args,
        }
        | NodeKind::New {
            callee,
            type_args,
            args,
        } => {
            stack.push(*callee);
            stack.extend(type_args);
            stack.extend(args);
        }
        NodeKind::Binary { left, right, .. } => stack.extend([*left, *right]),
        NodeKind::Prefix { operand, .. } => stack.push(*operand),
        NodeKind::Cond {
            cond,
            when_true,
            when_false,
        } => stack.extend([*cond, *when_true, *when_false]),
        NodeKind::Assign { target, value } => stack.extend([*target, *value]),
        NodeKind::Paren(inner) | NodeKind::ExprStmt(inner) => stack.push(*inner),
        NodeKind::Return { value } => stack.extend(*value),
        NodeKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            stack.extend([*cond, *then_branch]);
            stack.extend(*else_branch);
        }
        NodeKind::VarStmt { declarators } => stack.extend(declarators),
        NodeKind::VarDecl { ty, init, .. } => {
            stack.extend(*ty);
            stack.extend(*init);
        }
        NodeKind::Param { ty, .. } => stack.extend(*ty),
        NodeKind::ClassDecl {
            type_params,
            extends,
            implements,
            members,
            ..
        } => {
            stack.extend(type_params);
            stack.extend(*extends);
            stack.extend(implements);
            stack.extend(members);
        }
        NodeKind::PropertyDecl { ty, init, .. } => {
            stack.extend(*ty);
            stack.extend(*init);
        }
        NodeKind::MethodDecl {
            type_params,
            params,
            return_ty,
            body,
            ..
        } => {
            stack.extend(type_params);
            stack.extend(params);
            stack.extend(*return_ty);
            stack.extend(*body);
        }
        NodeKind::CtorDecl { params, body } => {
            stack.extend(params);
            stack.extend(*body);
        }
        NodeKind::InterfaceDecl {
            type_params,
            extends,
            members,
            ..
        } => {
            stack.extend(type_params);
            stack.extend(extends);
            stack.extend(members);
        }
        NodeKind::PropertySig { ty, .. } => stack.extend(*ty),
        NodeKind::MethodSig {
            type_params,
            params,
            return_ty,
            ..
        }
        | NodeKind::CallSig {
            type_params,
            params,
            return_ty,
        }
        | NodeKind::ConstructSig {
            type_params,
            params,
            return_ty,
        } => {
            stack.extend(type_params);
            stack.extend(params);
            stack.extend(*return_ty);
        }
        NodeKind::IndexSig { ty, .. } => stack.push(*ty),
        NodeKind::EnumDecl { members, .. } => stack.extend(members),
        NodeKind::EnumMember { init, .. } => stack.extend(*init),
        NodeKind::ModuleDecl { body, .. } => stack.extend(body),
        NodeKind::TypeParam { constraint, .. } => stack.extend(*constraint),
        NodeKind::TypeRef { type_args, .. } => stack.extend(type_args),
        NodeKind::ArrayType { element } => stack.push(*element),
        NodeKind::FunctionType { params, return_ty } => {
            stack.extend(params);
            stack.push(*return_ty);
        }
        NodeKind::ObjectType { members } => stack.extend(members),
        NodeKind::NumberLit(_)
        | NodeKind::StringLit(_)
        | NodeKind::True
        | NodeKind::False
        | NodeKind::NullLit
        | NodeKind::Ident(_) => {}
    }
}
