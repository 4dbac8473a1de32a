//! Declared-type construction.
//!
//! Workers behind the fixpoint controller: each computes the type of
//! one symbol kind. Named object types (classes, interfaces, enums,
//! modules) register their shell type and flip to `Resolved` *before*
//! filling members, so self-references met while resolving a member
//! find the shell instead of tripping the cycle fallback.

use smallvec::SmallVec;
use tracing::trace;
use vela_ast::{NodeIndex, NodeKind};
use vela_binder::{DeclFlags, DeclId, DeclKind, ResolveState, SymbolId, SymbolKind};
use vela_solver::{SigFlags, SigId, Signature, TypeData, TypeId, TypeSymbol, find_best_common_type};

use crate::state::Checker;

impl Checker {
    pub(crate) fn compute_symbol_type(&mut self, sym: SymbolId) -> TypeId {
        let Some(&decl_id) = self.symbols.get(sym).decls.first() else {
            debug_assert!(false, "symbol without declarations");
            return TypeId::ANY;
        };
        let (unit, scope) = {
            let decl = self.decls.get(decl_id);
            let scope = if Self::opens_scope(decl.kind) {
                decl_id
            } else {
                decl.parent.unwrap_or(decl_id)
            };
            (decl.unit, scope)
        };
        // Jump to the declaration's home unit and scope; restored on
        // the way out even when the worker posted errors.
        self.with_unit(unit, |c| {
            c.with_scope(scope, |c| match c.symbols.get(sym).kind {
                SymbolKind::Variable | SymbolKind::Property => c.variable_like_type(decl_id),
                SymbolKind::Parameter => c.parameter_type(decl_id),
                SymbolKind::Function | SymbolKind::Method => c.function_symbol_type(sym),
                SymbolKind::Class => c.class_type(sym, decl_id),
                SymbolKind::Interface => c.interface_type(sym),
                SymbolKind::Enum => c.enum_container_type(sym, decl_id),
                SymbolKind::EnumMember => c.enum_member_type(decl_id),
                SymbolKind::Module => c.module_type(sym),
                SymbolKind::TypeParam => c.type_param_type(sym, decl_id),
            })
        })
    }

    fn opens_scope(kind: DeclKind) -> bool {
        kind.is_function_like()
            || matches!(
                kind,
                DeclKind::Class
                    | DeclKind::Interface
                    | DeclKind::Enum
                    | DeclKind::Module
                    | DeclKind::ObjectTypeLiteral
                    | DeclKind::Unit
            )
    }

    /// Literal initializers widen when they fix a declaration's type:
    /// a string literal becomes `string`, `null`/`undefined` become the
    /// dynamic type.
    pub(crate) fn widened(&self, ty: TypeId) -> TypeId {
        if ty == TypeId::NULL || ty == TypeId::UNDEFINED {
            return TypeId::ANY;
        }
        self.widened_literal(ty)
    }

    /// Literal widening only. `null` and `undefined` stay put so a
    /// best-common-type merge can widen them toward the other
    /// candidates instead of absorbing the whole merge.
    pub(crate) fn widened_literal(&self, ty: TypeId) -> TypeId {
        match self.types.data(ty) {
            TypeData::StringLiteral(_) => TypeId::STRING,
            _ => ty,
        }
    }

    // ----- Variables, properties, parameters -----

    fn variable_like_type(&mut self, decl_id: DeclId) -> TypeId {
        let node = self.decls.get(decl_id).node;
        let (annotation, init) = match self.arena.kind(node).clone() {
            NodeKind::VarDecl { ty, init, .. } => (ty, init),
            NodeKind::PropertyDecl { ty, init, .. } => (ty, init),
            NodeKind::PropertySig { ty, .. } => (ty, None),
            NodeKind::ObjectProp { value, .. } => (None, Some(value)),
            NodeKind::EnumMember { .. } => return self.enum_member_type(decl_id),
            other => {
                debug_assert!(false, "unexpected variable-like node: {other:?}");
                (None, None)
            }
        };
        if let Some(annotation) = annotation {
            return self.type_from_node(annotation);
        }
        match init {
            Some(init) => {
                let ty = self.expr_type(init);
                self.widened(ty)
            }
            None => TypeId::ANY,
        }
    }

    fn parameter_type(&mut self, decl_id: DeclId) -> TypeId {
        let node = self.decls.get(decl_id).node;
        let NodeKind::Param { ty, rest, .. } = self.arena.kind(node).clone() else {
            return TypeId::ANY;
        };
        match ty {
            Some(annotation) => self.type_from_node(annotation),
            // An unannotated rest parameter is an array of the dynamic
            // type; contextually typed parameters were pre-seeded by
            // the function-expression path and never reach this worker.
            None if rest => {
                let name = self.array_name(TypeId::ANY);
                self.types.array_of(TypeId::ANY, name)
            }
            None => TypeId::ANY,
        }
    }

    // ----- Functions and signatures -----

    /// Type of a function, method, or signature-member symbol: an
    /// anonymous interface carrying one call signature per physical
    /// declaration.
    fn function_symbol_type(&mut self, sym: SymbolId) -> TypeId {
        let decls: SmallVec<[DeclId; 2]> = self.symbols.get(sym).decls.clone();
        let mut sigs = Vec::with_capacity(decls.len());
        for decl_id in decls {
            sigs.push(self.signature_for_decl(decl_id));
        }
        let name = self.symbols.get(sym).name;
        let mut fn_ty = TypeSymbol::new(name, TypeData::Interface);
        fn_ty.symbol = Some(sym);
        fn_ty.decl = self.symbols.get(sym).decls.first().copied();
        fn_ty.call_sigs = sigs;
        self.types.alloc(fn_ty)
    }

    /// Build (or fetch) the signature for one function-like decl.
    pub(crate) fn signature_for_decl(&mut self, decl_id: DeclId) -> SigId {
        if let Some(&sig) = self.sig_of_decl.get(&decl_id) {
            return sig;
        }
        let node = self.decls.get(decl_id).node;
        let (return_annotation, body) = match self.arena.kind(node).clone() {
            NodeKind::FunctionDecl(data) | NodeKind::FunctionExpr(data) => {
                (data.return_ty, data.body)
            }
            NodeKind::MethodDecl {
                return_ty, body, ..
            } => (return_ty, body),
            NodeKind::MethodSig { return_ty, .. }
            | NodeKind::CallSig { return_ty, .. }
            | NodeKind::ConstructSig { return_ty, .. } => (return_ty, None),
            NodeKind::CtorDecl { body, .. } => (None, body),
            other => {
                debug_assert!(false, "not a function-like node: {other:?}");
                (None, None)
            }
        };

        let type_params = self.type_params_of(decl_id);
        let params = self.params_of(decl_id);
        let mut flags = SigFlags::empty();
        if body.is_some() {
            flags |= SigFlags::DEFINITION;
        }
        if !type_params.is_empty() {
            flags |= SigFlags::HAS_GENERIC_PARAM;
        }
        if params.iter().any(|&p| {
            self.symbols
                .get(p)
                .flags
                .contains(vela_binder::SymbolFlags::REST)
        }) {
            flags |= SigFlags::HAS_VARARG;
        }

        // Allocate before typing the return so a recursive body that
        // re-enters this decl reuses the pending signature.
        let sig = self.types.alloc_sig(Signature {
            params,
            ret: TypeId::ANY,
            type_params,
            flags,
            decl: Some(decl_id),
        });
        self.sig_of_decl.insert(decl_id, sig);

        let ret = self.with_scope(decl_id, |c| match return_annotation {
            Some(annotation) => c.type_from_node(annotation),
            None => match body {
                Some(body) => c.infer_return_type(body),
                None => TypeId::ANY,
            },
        });
        self.types.sig_mut(sig).ret = ret;
        sig
    }

    pub(crate) fn type_params_of(&mut self, decl_id: DeclId) -> Vec<TypeId> {
        let children: SmallVec<[DeclId; 8]> =
            self.decls.children(decl_id).iter().copied().collect();
        let mut out = Vec::new();
        for child in children {
            if self.decls.get(child).kind != DeclKind::TypeParam {
                continue;
            }
            if let Some(sym) = self.decls.get(child).symbol {
                out.push(self.resolve_symbol_type(sym));
            }
        }
        out
    }

    fn params_of(&self, decl_id: DeclId) -> Vec<SymbolId> {
        self.decls
            .children(decl_id)
            .iter()
            .filter(|&&c| self.decls.get(c).kind == DeclKind::Parameter)
            .filter_map(|&c| self.decls.get(c).symbol)
            .collect()
    }

    /// Best common type of a body's return expressions; `void` when the
    /// body never returns a value.
    pub(crate) fn infer_return_type(&mut self, body: NodeIndex) -> TypeId {
        let returns = self.collect_returns(body);
        let mut candidates = Vec::with_capacity(returns.len());
        for value in returns {
            let ty = self.expr_type(value);
            candidates.push(self.widened_literal(ty));
        }
        if candidates.is_empty() {
            return TypeId::VOID;
        }
        find_best_common_type(self, &candidates)
    }

    /// Return-expression nodes of a body, not descending into nested
    /// functions.
    pub(crate) fn collect_returns(&self, body: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match self.arena.kind(node) {
                NodeKind::Return { value } => {
                    if let Some(value) = value {
                        out.push(*value);
                    }
                }
                NodeKind::Block { stmts } => stack.extend(stmts),
                NodeKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    stack.push(*then_branch);
                    stack.extend(*else_branch);
                }
                NodeKind::ExprStmt(_)
                | NodeKind::VarStmt { .. }
                | NodeKind::FunctionDecl(_)
                | NodeKind::FunctionExpr(_) => {}
                _ => {}
            }
        }
        out
    }

    // ----- Type parameters -----

    fn type_param_type(&mut self, sym: SymbolId, decl_id: DeclId) -> TypeId {
        let node = self.decls.get(decl_id).node;
        let NodeKind::TypeParam { constraint, .. } = self.arena.kind(node).clone() else {
            return TypeId::ERROR;
        };
        let constraint_ty = constraint.map(|c| self.type_from_node(c));
        let name = self.symbols.get(sym).name;
        let mut tp = TypeSymbol::new(
            name,
            TypeData::TypeParameter {
                constraint: constraint_ty,
            },
        );
        tp.symbol = Some(sym);
        tp.decl = Some(decl_id);
        self.types.alloc(tp)
    }

    // ----- Classes -----

    /// A class symbol's value type is its constructor type; the
    /// instance type hangs off it. Both shells register before member
    /// resolution so `C` inside the class body sees the class.
    fn class_type(&mut self, sym: SymbolId, decl_id: DeclId) -> TypeId {
        let name = self.symbols.get(sym).name;
        let mut instance = TypeSymbol::new(name, TypeData::Class);
        instance.symbol = Some(sym);
        instance.decl = Some(decl_id);
        let instance = self.types.alloc(instance);
        let mut ctor = TypeSymbol::new(name, TypeData::Constructor);
        ctor.symbol = Some(sym);
        ctor.decl = Some(decl_id);
        ctor.instance = Some(instance);
        let ctor = self.types.alloc(ctor);
        self.types.set_symbol_type(sym, ctor);
        self.symbols.get_mut(sym).state = ResolveState::Resolved;
        trace!(?sym, "class shells registered");

        let type_params = self.type_params_of(decl_id);
        self.types.get_mut(instance).type_params = type_params.clone();

        let node = self.decls.get(decl_id).node;
        let NodeKind::ClassDecl {
            extends,
            implements,
            ..
        } = self.arena.kind(node).clone()
        else {
            return ctor;
        };

        // Base lists resolve with the flag set: member lookups in here
        // must not consult the still-incomplete chain.
        let saved = self.ctx.resolving_base_list;
        self.ctx.resolving_base_list = true;
        if let Some(extends) = extends {
            let base = self.type_from_node(extends);
            if self.types.data(base).is_object_like() {
                self.types.get_mut(instance).extends.push(base);
                // Statics inherit through the base constructor.
                let base_root = self.types.root_of(base);
                if let Some(base_sym) = self.types.get(base_root).symbol {
                    if self.symbols.get(base_sym).kind == SymbolKind::Class {
                        let base_ctor = self.resolve_symbol_type(base_sym);
                        self.types.get_mut(ctor).extends.push(base_ctor);
                    }
                }
            }
        }
        for impl_node in implements {
            let iface = self.type_from_node(impl_node);
            if self.types.data(iface).is_object_like() {
                self.types.get_mut(instance).implements.push(iface);
            }
        }
        self.ctx.resolving_base_list = saved;

        let children: SmallVec<[DeclId; 8]> =
            self.decls.children(decl_id).iter().copied().collect();
        let mut ctor_sig_count = 0usize;
        for child in children {
            let (kind, child_name, flags, child_sym) = {
                let decl = self.decls.get(child);
                (decl.kind, decl.name, decl.flags, decl.symbol)
            };
            let Some(child_sym) = child_sym else { continue };
            match kind {
                DeclKind::Property | DeclKind::Method => {
                    let owner = if flags.contains(DeclFlags::STATIC) {
                        ctor
                    } else {
                        instance
                    };
                    self.types.get_mut(owner).members.insert(child_name, child_sym);
                }
                DeclKind::Constructor => {
                    let sig = self.signature_for_decl(child);
                    self.types.sig_mut(sig).ret = instance;
                    if !type_params.is_empty() {
                        let record = self.types.sig_mut(sig);
                        record.type_params = type_params.clone();
                        record.flags |= SigFlags::HAS_GENERIC_PARAM;
                    }
                    self.types.get_mut(ctor).construct_sigs.push(sig);
                    ctor_sig_count += 1;
                }
                _ => {}
            }
        }
        if ctor_sig_count == 0 {
            let mut flags = SigFlags::DEFINITION;
            if !type_params.is_empty() {
                flags |= SigFlags::HAS_GENERIC_PARAM;
            }
            let default_ctor = self.types.alloc_sig(Signature {
                params: Vec::new(),
                ret: instance,
                type_params: type_params.clone(),
                flags,
                decl: Some(decl_id),
            });
            self.types.get_mut(ctor).construct_sigs.push(default_ctor);
        }
        ctor
    }

    // ----- Interfaces and object-type literals -----

    fn interface_type(&mut self, sym: SymbolId) -> TypeId {
        let name = self.symbols.get(sym).name;
        let decls: SmallVec<[DeclId; 2]> = self.symbols.get(sym).decls.clone();
        let first = decls[0];
        let mut shell = TypeSymbol::new(name, TypeData::Interface);
        shell.symbol = Some(sym);
        shell.decl = Some(first);
        let iface = self.types.alloc(shell);
        self.types.set_symbol_type(sym, iface);
        self.symbols.get_mut(sym).state = ResolveState::Resolved;

        // Type parameters come from the first declaration; reopenings
        // share them.
        let type_params = self.type_params_of(first);
        self.types.get_mut(iface).type_params = type_params;

        for decl_id in decls {
            let node = self.decls.get(decl_id).node;
            if let NodeKind::InterfaceDecl { extends, .. } = self.arena.kind(node).clone() {
                let saved = self.ctx.resolving_base_list;
                self.ctx.resolving_base_list = true;
                for base_node in extends {
                    let base = self.type_from_node(base_node);
                    if self.types.data(base).is_object_like() {
                        self.types.get_mut(iface).extends.push(base);
                    }
                }
                self.ctx.resolving_base_list = saved;
            }
            self.fill_object_members(iface, decl_id);
        }
        iface
    }

    /// Copy one declaration's members into an interface-like type:
    /// properties and methods into the member table, `__call`/`__new`/
    /// `__index` signature members into the signature groups.
    fn fill_object_members(&mut self, owner: TypeId, decl_id: DeclId) {
        let children: SmallVec<[DeclId; 8]> =
            self.decls.children(decl_id).iter().copied().collect();
        for child in children {
            let (kind, child_name, child_sym, node) = {
                let decl = self.decls.get(child);
                (decl.kind, decl.name, decl.symbol, decl.node)
            };
            let Some(child_sym) = child_sym else { continue };
            match kind {
                DeclKind::Property | DeclKind::Method => {
                    self.types.get_mut(owner).members.insert(child_name, child_sym);
                }
                DeclKind::SignatureMember => match self.arena.kind(node).clone() {
                    NodeKind::CallSig { .. } => {
                        let sig = self.signature_for_decl(child);
                        self.types.get_mut(owner).call_sigs.push(sig);
                    }
                    NodeKind::ConstructSig { .. } => {
                        let sig = self.signature_for_decl(child);
                        self.types.get_mut(owner).construct_sigs.push(sig);
                    }
                    NodeKind::IndexSig { .. } => {
                        let sig = self.index_sig_for_decl(child);
                        self.types.get_mut(owner).index_sigs.push(sig);
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    fn index_sig_for_decl(&mut self, decl_id: DeclId) -> SigId {
        if let Some(&sig) = self.sig_of_decl.get(&decl_id) {
            return sig;
        }
        let node = self.decls.get(decl_id).node;
        let NodeKind::IndexSig {
            param_name, key, ty,
        } = self.arena.kind(node).clone()
        else {
            debug_assert!(false, "not an index signature");
            return self.types.alloc_sig(Signature {
                params: Vec::new(),
                ret: TypeId::ERROR,
                type_params: Vec::new(),
                flags: SigFlags::empty(),
                decl: Some(decl_id),
            });
        };
        let key_ty = match key {
            vela_ast::IndexKeyKind::String => TypeId::STRING,
            vela_ast::IndexKeyKind::Number => TypeId::NUMBER,
        };
        let mut key_symbol = vela_binder::Symbol::new(
            param_name,
            SymbolKind::Parameter,
            vela_binder::SymbolFlags::empty(),
        );
        key_symbol.state = ResolveState::Resolved;
        let key_symbol = self.symbols.alloc(key_symbol);
        self.types.set_symbol_type(key_symbol, key_ty);
        let ret = self.type_from_node(ty);
        let sig = self.types.alloc_sig(Signature {
            params: vec![key_symbol],
            ret,
            type_params: Vec::new(),
            flags: SigFlags::empty(),
            decl: Some(decl_id),
        });
        self.sig_of_decl.insert(decl_id, sig);
        sig
    }

    // ----- Enums and modules -----

    /// An enum name's value type is a container whose members all have
    /// the enum type; the enum type itself hangs off `instance`.
    fn enum_container_type(&mut self, sym: SymbolId, decl_id: DeclId) -> TypeId {
        let name = self.symbols.get(sym).name;
        let mut enum_ty = TypeSymbol::new(
            name,
            TypeData::Enum {
                backing: TypeId::NUMBER,
            },
        );
        enum_ty.symbol = Some(sym);
        enum_ty.decl = Some(decl_id);
        let enum_ty = self.types.alloc(enum_ty);
        let mut container = TypeSymbol::new(name, TypeData::Container);
        container.symbol = Some(sym);
        container.decl = Some(decl_id);
        container.instance = Some(enum_ty);
        let container = self.types.alloc(container);
        self.types.set_symbol_type(sym, container);
        self.symbols.get_mut(sym).state = ResolveState::Resolved;

        let decls: SmallVec<[DeclId; 2]> = self.symbols.get(sym).decls.clone();
        for enum_decl in decls {
            let children: SmallVec<[DeclId; 8]> =
                self.decls.children(enum_decl).iter().copied().collect();
            for child in children {
                let (kind, member_name, member_sym) = {
                    let decl = self.decls.get(child);
                    (decl.kind, decl.name, decl.symbol)
                };
                if kind != DeclKind::EnumMember {
                    continue;
                }
                let Some(member_sym) = member_sym else { continue };
                self.types.set_symbol_type(member_sym, enum_ty);
                self.symbols.get_mut(member_sym).state = ResolveState::Resolved;
                self.types
                    .get_mut(container)
                    .members
                    .insert(member_name, member_sym);
            }
        }
        container
    }

    fn enum_member_type(&mut self, decl_id: DeclId) -> TypeId {
        let Some(parent) = self.decls.get(decl_id).parent else {
            return TypeId::ERROR;
        };
        let Some(enum_sym) = self.decls.get(parent).symbol else {
            return TypeId::ERROR;
        };
        let container = self.resolve_symbol_type(enum_sym);
        self.types.get(container).instance.unwrap_or(TypeId::ERROR)
    }

    /// A module's value type: a container exposing its exported
    /// value members, merged across all physical declarations.
    fn module_type(&mut self, sym: SymbolId) -> TypeId {
        let name = self.symbols.get(sym).name;
        let decls: SmallVec<[DeclId; 2]> = self.symbols.get(sym).decls.clone();
        let mut shell = TypeSymbol::new(name, TypeData::Container);
        shell.symbol = Some(sym);
        shell.decl = decls.first().copied();
        let container = self.types.alloc(shell);
        self.types.set_symbol_type(sym, container);
        self.symbols.get_mut(sym).state = ResolveState::Resolved;

        for decl_id in decls {
            let children: SmallVec<[DeclId; 8]> =
                self.decls.children(decl_id).iter().copied().collect();
            for child in children {
                let (child_name, flags, child_sym) = {
                    let decl = self.decls.get(child);
                    (decl.name, decl.flags, decl.symbol)
                };
                if !flags.contains(DeclFlags::EXPORTED) {
                    continue;
                }
                let Some(child_sym) = child_sym else { continue };
                if !self.symbols.get(child_sym).kind.is_value() {
                    continue;
                }
                self.types
                    .get_mut(container)
                    .members
                    .insert(child_name, child_sym);
            }
        }
        container
    }
}
