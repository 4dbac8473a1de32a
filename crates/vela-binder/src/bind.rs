//! The declaration-collection pass.
//!
//! One walk per unit creates the decl scaffold and pending symbols.
//! Merging happens here: a second `module M` under the same parent, an
//! interface re-opening, or an overload signature reuses the symbol of
//! the first declaration and appends its decl to the symbol's decl list.

use tracing::trace;
use vela_ast::{FunctionData, NodeArena, NodeIndex, NodeKind};
use vela_common::{Atom, Interner, UnitId};

use crate::decl::{Decl, DeclFlags, DeclId, DeclKind, DeclStore};
use crate::symbol::{Symbol, SymbolArena, SymbolFlags, SymbolKind};

pub struct Binder<'a> {
    pub arena: &'a NodeArena,
    pub interner: &'a mut Interner,
    pub decls: &'a mut DeclStore,
    pub symbols: &'a mut SymbolArena,
    pub unit: UnitId,
}

impl<'a> Binder<'a> {
    pub fn new(
        arena: &'a NodeArena,
        interner: &'a mut Interner,
        decls: &'a mut DeclStore,
        symbols: &'a mut SymbolArena,
        unit: UnitId,
    ) -> Self {
        Self {
            arena,
            interner,
            decls,
            symbols,
            unit,
        }
    }

    /// Bind a unit root, returning the unit's scope decl.
    pub fn bind_unit(&mut self, root: NodeIndex, unit_name: Atom) -> DeclId {
        let unit_decl = self.decls.add(Decl {
            name: unit_name,
            kind: DeclKind::Unit,
            flags: DeclFlags::empty(),
            node: root,
            unit: self.unit,
            parent: None,
            children: Vec::new(),
            symbol: None,
        });
        let NodeKind::Unit { stmts } = self.arena.kind(root) else {
            debug_assert!(false, "bind_unit called on a non-unit node");
            return unit_decl;
        };
        for &stmt in stmts.clone().iter() {
            self.bind_stmt(unit_decl, stmt);
        }
        unit_decl
    }

    fn bind_stmt(&mut self, parent: DeclId, node: NodeIndex) {
        match self.arena.kind(node).clone() {
            NodeKind::VarStmt { declarators } => {
                for decl in declarators {
                    self.bind_stmt(parent, decl);
                }
            }
            NodeKind::VarDecl { name, exported, .. } => {
                let mut flags = DeclFlags::empty();
                if exported {
                    flags |= DeclFlags::EXPORTED;
                }
                self.declare(parent, name, DeclKind::Variable, flags, node);
            }
            NodeKind::FunctionDecl(data) => {
                let name = data.name.unwrap_or_else(|| self.interner.intern("__function"));
                let mut flags = DeclFlags::empty();
                if data.exported {
                    flags |= DeclFlags::EXPORTED;
                }
                if data.body.is_none() {
                    flags |= DeclFlags::OVERLOAD_ONLY;
                }
                let decl = self.declare(parent, name, DeclKind::Function, flags, node);
                self.bind_function_parts(decl, &data);
            }
            NodeKind::ClassDecl {
                name,
                type_params,
                members,
                exported,
                ..
            } => {
                let mut flags = DeclFlags::empty();
                if exported {
                    flags |= DeclFlags::EXPORTED;
                }
                let decl = self.declare(parent, name, DeclKind::Class, flags, node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for member in members {
                    self.bind_class_member(decl, member);
                }
            }
            NodeKind::InterfaceDecl {
                name,
                type_params,
                members,
                exported,
                ..
            } => {
                let mut flags = DeclFlags::empty();
                if exported {
                    flags |= DeclFlags::EXPORTED;
                }
                let decl = self.declare(parent, name, DeclKind::Interface, flags, node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for member in members {
                    self.bind_object_member(decl, member);
                }
            }
            NodeKind::EnumDecl {
                name,
                members,
                exported,
            } => {
                let mut flags = DeclFlags::empty();
                if exported {
                    flags |= DeclFlags::EXPORTED;
                }
                let decl = self.declare(parent, name, DeclKind::Enum, flags, node);
                for member in members {
                    if let NodeKind::EnumMember { name, .. } = self.arena.kind(member) {
                        // Enum members are implicitly exported from their enum.
                        self.declare(
                            decl,
                            *name,
                            DeclKind::EnumMember,
                            DeclFlags::EXPORTED,
                            member,
                        );
                    }
                }
            }
            NodeKind::ModuleDecl {
                name,
                body,
                exported,
            } => {
                let mut flags = DeclFlags::empty();
                if exported {
                    flags |= DeclFlags::EXPORTED;
                }
                let decl = self.declare(parent, name, DeclKind::Module, flags, node);
                for stmt in body {
                    self.bind_stmt(decl, stmt);
                }
            }
            // Statements that can enclose declarations.
            NodeKind::Block { stmts } => {
                for stmt in stmts {
                    self.bind_stmt(parent, stmt);
                }
            }
            NodeKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.bind_stmt(parent, then_branch);
                if let Some(els) = else_branch {
                    self.bind_stmt(parent, els);
                }
            }
            // Expression statements carry no declarations; function
            // expressions inside them are synthesized on demand.
            _ => {}
        }
    }

    fn bind_function_parts(&mut self, decl: DeclId, data: &FunctionData) {
        for &tp in &data.type_params {
            self.bind_type_param(decl, tp);
        }
        for &param in &data.params {
            self.bind_param(decl, param);
        }
        if let Some(body) = data.body {
            self.bind_stmt(decl, body);
        }
    }

    fn bind_class_member(&mut self, class: DeclId, node: NodeIndex) {
        match self.arena.kind(node).clone() {
            NodeKind::PropertyDecl {
                name,
                is_static,
                is_private,
                ..
            } => {
                let mut flags = DeclFlags::empty();
                if is_static {
                    flags |= DeclFlags::STATIC;
                }
                if is_private {
                    flags |= DeclFlags::PRIVATE;
                }
                self.declare(class, name, DeclKind::Property, flags, node);
            }
            NodeKind::MethodDecl {
                name,
                type_params,
                params,
                body,
                is_static,
                is_private,
                ..
            } => {
                let mut flags = DeclFlags::empty();
                if is_static {
                    flags |= DeclFlags::STATIC;
                }
                if is_private {
                    flags |= DeclFlags::PRIVATE;
                }
                if body.is_none() {
                    flags |= DeclFlags::OVERLOAD_ONLY;
                }
                let decl = self.declare(class, name, DeclKind::Method, flags, node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for param in params {
                    self.bind_param(decl, param);
                }
                if let Some(body) = body {
                    self.bind_stmt(decl, body);
                }
            }
            NodeKind::CtorDecl { params, body } => {
                let name = self.interner.intern("constructor");
                let mut flags = DeclFlags::empty();
                if body.is_none() {
                    flags |= DeclFlags::OVERLOAD_ONLY;
                }
                let decl = self.declare(class, name, DeclKind::Constructor, flags, node);
                for param in params {
                    self.bind_param(decl, param);
                }
                if let Some(body) = body {
                    self.bind_stmt(decl, body);
                }
            }
            other => debug_assert!(false, "unexpected class member shape: {other:?}"),
        }
    }

    /// Members of interfaces and object-type literals.
    fn bind_object_member(&mut self, owner: DeclId, node: NodeIndex) {
        match self.arena.kind(node).clone() {
            NodeKind::PropertySig { name, optional, .. } => {
                let mut flags = DeclFlags::empty();
                if optional {
                    flags |= DeclFlags::OPTIONAL;
                }
                self.declare(owner, name, DeclKind::Property, flags, node);
            }
            NodeKind::MethodSig {
                name,
                type_params,
                params,
                optional,
                ..
            } => {
                let mut flags = DeclFlags::OVERLOAD_ONLY;
                if optional {
                    flags |= DeclFlags::OPTIONAL;
                }
                let decl = self.declare(owner, name, DeclKind::Method, flags, node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for param in params {
                    self.bind_param(decl, param);
                }
            }
            NodeKind::CallSig {
                type_params,
                params,
                ..
            } => {
                let name = self.interner.intern("__call");
                let decl =
                    self.declare(owner, name, DeclKind::SignatureMember, DeclFlags::empty(), node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for param in params {
                    self.bind_param(decl, param);
                }
            }
            NodeKind::ConstructSig {
                type_params,
                params,
                ..
            } => {
                let name = self.interner.intern("__new");
                let decl =
                    self.declare(owner, name, DeclKind::SignatureMember, DeclFlags::empty(), node);
                for tp in type_params {
                    self.bind_type_param(decl, tp);
                }
                for param in params {
                    self.bind_param(decl, param);
                }
            }
            NodeKind::IndexSig { .. } => {
                let name = self.interner.intern("__index");
                self.declare(owner, name, DeclKind::SignatureMember, DeclFlags::empty(), node);
            }
            other => debug_assert!(false, "unexpected object member shape: {other:?}"),
        }
    }

    fn bind_param(&mut self, parent: DeclId, node: NodeIndex) {
        if let NodeKind::Param {
            name,
            optional,
            rest,
            ..
        } = self.arena.kind(node)
        {
            let mut flags = DeclFlags::empty();
            if *optional {
                flags |= DeclFlags::OPTIONAL;
            }
            if *rest {
                flags |= DeclFlags::REST;
            }
            self.declare(parent, *name, DeclKind::Parameter, flags, node);
        }
    }

    fn bind_type_param(&mut self, parent: DeclId, node: NodeIndex) {
        if let NodeKind::TypeParam { name, .. } = self.arena.kind(node) {
            self.declare(parent, *name, DeclKind::TypeParam, DeclFlags::empty(), node);
        }
    }

    // ----- On-demand synthesis (resolver re-entry) -----

    /// Synthesize a decl subtree for a function expression discovered
    /// mid-resolution and attach its symbols.
    pub fn bind_function_expression(&mut self, node: NodeIndex, parent: DeclId) -> DeclId {
        if let Some(existing) = self.decls.decl_of_node(self.unit, node) {
            return existing;
        }
        let NodeKind::FunctionExpr(data) = self.arena.kind(node).clone() else {
            debug_assert!(false, "bind_function_expression on a non-function node");
            return parent;
        };
        let name = data.name.unwrap_or_else(|| self.interner.intern("__function"));
        let decl = self.declare(parent, name, DeclKind::FunctionExpr, DeclFlags::empty(), node);
        self.bind_function_parts(decl, &data);
        decl
    }

    /// Synthesize a decl subtree for an object literal discovered
    /// mid-resolution.
    pub fn bind_object_literal(&mut self, node: NodeIndex, parent: DeclId) -> DeclId {
        if let Some(existing) = self.decls.decl_of_node(self.unit, node) {
            return existing;
        }
        let NodeKind::ObjectLit { props } = self.arena.kind(node).clone() else {
            debug_assert!(false, "bind_object_literal on a non-object node");
            return parent;
        };
        let name = self.interner.intern("__object");
        let decl = self.declare(parent, name, DeclKind::ObjectLiteral, DeclFlags::empty(), node);
        for prop in props {
            if let NodeKind::ObjectProp { name, .. } = self.arena.kind(prop) {
                self.declare(decl, *name, DeclKind::Property, DeclFlags::empty(), prop);
            }
        }
        decl
    }

    /// Synthesize a decl subtree for an inline object-type literal.
    pub fn bind_object_type_literal(&mut self, node: NodeIndex, parent: DeclId) -> DeclId {
        if let Some(existing) = self.decls.decl_of_node(self.unit, node) {
            return existing;
        }
        let NodeKind::ObjectType { members } = self.arena.kind(node).clone() else {
            debug_assert!(false, "bind_object_type_literal on a non-object-type node");
            return parent;
        };
        let name = self.interner.intern("__type");
        let decl = self.declare(
            parent,
            name,
            DeclKind::ObjectTypeLiteral,
            DeclFlags::empty(),
            node,
        );
        for member in members {
            self.bind_object_member(decl, member);
        }
        decl
    }

    // ----- Symbol allocation and merging -----

    fn declare(
        &mut self,
        parent: DeclId,
        name: Atom,
        kind: DeclKind,
        flags: DeclFlags,
        node: NodeIndex,
    ) -> DeclId {
        let decl_id = self.decls.add(Decl {
            name,
            kind,
            flags,
            node,
            unit: self.unit,
            parent: Some(parent),
            children: Vec::new(),
            symbol: None,
        });

        // Merge with an earlier same-name, same-kind sibling: overload
        // groups and re-opened containers share one symbol.
        let merged = if Self::kind_merges(kind) {
            self.decls
                .find_children_named(parent, name)
                .into_iter()
                .filter(|&c| c != decl_id)
                .find(|&c| self.decls.get(c).kind == kind)
                .and_then(|c| self.decls.get(c).symbol)
        } else {
            None
        };

        let symbol_id = match merged {
            Some(existing) => {
                trace!(?name, ?kind, "merging declaration into existing symbol");
                let symbol = self.symbols.get_mut(existing);
                symbol.decls.push(decl_id);
                if flags.contains(DeclFlags::EXPORTED) {
                    symbol.flags |= SymbolFlags::EXPORTED;
                }
                existing
            }
            None => {
                let mut symbol =
                    Symbol::new(name, Self::symbol_kind(kind), Self::symbol_flags(flags));
                symbol.decls.push(decl_id);
                self.symbols.alloc(symbol)
            }
        };
        self.decls.set_symbol(decl_id, symbol_id);
        decl_id
    }

    fn kind_merges(kind: DeclKind) -> bool {
        matches!(
            kind,
            DeclKind::Function
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::Interface
                | DeclKind::Module
                | DeclKind::Enum
                | DeclKind::SignatureMember
        )
    }

    fn symbol_kind(kind: DeclKind) -> SymbolKind {
        match kind {
            DeclKind::Variable => SymbolKind::Variable,
            DeclKind::Parameter => SymbolKind::Parameter,
            DeclKind::Function | DeclKind::FunctionExpr => SymbolKind::Function,
            DeclKind::Class => SymbolKind::Class,
            DeclKind::Interface | DeclKind::ObjectTypeLiteral => SymbolKind::Interface,
            DeclKind::Enum => SymbolKind::Enum,
            DeclKind::EnumMember => SymbolKind::EnumMember,
            DeclKind::Module => SymbolKind::Module,
            DeclKind::Property | DeclKind::ObjectLiteral => SymbolKind::Property,
            DeclKind::Method | DeclKind::Constructor | DeclKind::SignatureMember => {
                SymbolKind::Method
            }
            DeclKind::TypeParam => SymbolKind::TypeParam,
            DeclKind::Unit => SymbolKind::Module,
        }
    }

    fn symbol_flags(flags: DeclFlags) -> SymbolFlags {
        let mut out = SymbolFlags::empty();
        if flags.contains(DeclFlags::EXPORTED) {
            out |= SymbolFlags::EXPORTED;
        }
        if flags.contains(DeclFlags::STATIC) {
            out |= SymbolFlags::STATIC;
        }
        if flags.contains(DeclFlags::PRIVATE) {
            out |= SymbolFlags::PRIVATE;
        }
        if flags.contains(DeclFlags::OPTIONAL) {
            out |= SymbolFlags::OPTIONAL;
        }
        if flags.contains(DeclFlags::REST) {
            out |= SymbolFlags::REST;
        }
        out
    }
}
