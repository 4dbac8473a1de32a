//! Statement and declaration checking.
//!
//! `check_unit` drives one unit: every statement is walked, every
//! declaration's type is demanded, and the structural checks that are
//! not part of type resolution itself run here — initializer
//! assignability, redeclaration agreement, duplicate overloads,
//! return-type conformance, and index-signature consistency.

use smallvec::SmallVec;
use tracing::debug;
use vela_ast::{NodeIndex, NodeKind};
use vela_binder::{DeclFlags, DeclId, DeclKind, SymbolId};
use vela_common::{Atom, UnitId, diagnostic_messages as msg};
use vela_solver::{ExprResolver, RelationCheck, TypeId, format_type};

use crate::state::Checker;

impl Checker {
    /// Check every registered unit in registration order.
    pub fn check_all(&mut self) {
        for (unit, _) in self.units.clone() {
            self.check_unit(unit);
        }
    }

    pub fn check_unit(&mut self, unit: UnitId) {
        let Some(&(_, root)) = self.units.iter().find(|&&(u, _)| u == unit) else {
            debug_assert!(false, "unit was never registered");
            return;
        };
        debug!(?unit, "checking unit");
        self.with_unit(unit, |c| {
            c.with_scope(root, |c| {
                let root_node = c.decls.get(root).node;
                let NodeKind::Unit { stmts } = c.arena.kind(root_node).clone() else {
                    return;
                };
                for stmt in stmts {
                    c.check_stmt(stmt);
                }
            });
        });
    }

    fn check_stmt(&mut self, node: NodeIndex) {
        match self.arena.kind(node).clone() {
            NodeKind::ExprStmt(expr) => {
                self.expr_type(expr);
            }
            NodeKind::Block { stmts } => {
                for stmt in stmts {
                    self.check_stmt(stmt);
                }
            }
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr_type(cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            NodeKind::Return { value } => {
                if let Some(value) = value {
                    self.expr_type(value);
                }
            }
            NodeKind::VarStmt { declarators } => {
                for declarator in declarators {
                    self.check_stmt(declarator);
                }
            }
            NodeKind::VarDecl { .. } => self.check_var_decl(node),
            NodeKind::FunctionDecl(_) => self.check_function_decl(node),
            NodeKind::ClassDecl { .. } => self.check_class(node),
            NodeKind::InterfaceDecl { .. } => self.check_interface(node),
            NodeKind::EnumDecl { members, .. } => {
                if let Some(decl) = self.decls.decl_of_node(self.ctx.current_unit, node) {
                    if let Some(sym) = self.decls.get(decl).symbol {
                        self.resolve_symbol_type(sym);
                    }
                }
                for member in members {
                    if let NodeKind::EnumMember {
                        init: Some(init), ..
                    } = self.arena.kind(member).clone()
                    {
                        self.expr_type(init);
                    }
                }
            }
            NodeKind::ModuleDecl { body, .. } => {
                let Some(decl) = self.decls.decl_of_node(self.ctx.current_unit, node) else {
                    return;
                };
                if let Some(sym) = self.decls.get(decl).symbol {
                    self.resolve_symbol_type(sym);
                }
                self.with_scope(decl, |c| {
                    for stmt in body {
                        c.check_stmt(stmt);
                    }
                });
            }
            // Bare expressions can appear where the embedder feeds
            // single nodes.
            NodeKind::NumberLit(_)
            | NodeKind::StringLit(_)
            | NodeKind::True
            | NodeKind::False
            | NodeKind::NullLit
            | NodeKind::Ident(_)
            | NodeKind::Member { .. }
            | NodeKind::Index { .. }
            | NodeKind::ArrayLit { .. }
            | NodeKind::ObjectLit { .. }
            | NodeKind::FunctionExpr(_)
            | NodeKind::Call { .. }
            | NodeKind::New { .. }
            | NodeKind::Binary { .. }
            | NodeKind::Prefix { .. }
            | NodeKind::Cond { .. }
            | NodeKind::Assign { .. }
            | NodeKind::Paren(_) => {
                self.expr_type(node);
            }
            other @ (NodeKind::Unit { .. }
            | NodeKind::ObjectProp { .. }
            | NodeKind::Param { .. }
            | NodeKind::PropertyDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::CtorDecl { .. }
            | NodeKind::PropertySig { .. }
            | NodeKind::MethodSig { .. }
            | NodeKind::CallSig { .. }
            | NodeKind::ConstructSig { .. }
            | NodeKind::IndexSig { .. }
            | NodeKind::EnumMember { .. }
            | NodeKind::TypeParam { .. }
            | NodeKind::TypeRef { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::FunctionType { .. }
            | NodeKind::ObjectType { .. }) => {
                debug_assert!(false, "not a statement: {other:?}");
            }
        }
    }

    // ----- Variables -----

    fn check_var_decl(&mut self, node: NodeIndex) {
        let Some(decl_id) = self.decls.decl_of_node(self.ctx.current_unit, node) else {
            return;
        };
        let Some(sym) = self.decls.get(decl_id).symbol else {
            return;
        };
        let declared = self.resolve_symbol_type(sym);

        let NodeKind::VarDecl { name, ty, init, .. } = self.arena.kind(node).clone() else {
            return;
        };
        if let Some(init) = init {
            if ty.is_some() {
                let value_ty = if self.is_retypable(init) && declared != TypeId::ANY {
                    self.type_of_expr_contextual(init, declared, false)
                } else {
                    self.expr_type(init)
                };
                self.check_assignable(init, value_ty, declared);
            } else {
                self.expr_type(init);
            }
        }
        self.check_redeclaration_agreement(node, decl_id, sym, name, declared);
    }

    /// Subsequent declarations of one variable name in a scope must
    /// agree on the type the first declaration fixed.
    fn check_redeclaration_agreement(
        &mut self,
        node: NodeIndex,
        decl_id: DeclId,
        _sym: SymbolId,
        name: Atom,
        declared: TypeId,
    ) {
        let Some(parent) = self.decls.get(decl_id).parent else {
            return;
        };
        let siblings: SmallVec<[DeclId; 2]> = self
            .decls
            .find_children_named(parent, name)
            .into_iter()
            .filter(|&d| self.decls.get(d).kind == DeclKind::Variable)
            .collect();
        let Some(&first) = siblings.first() else {
            return;
        };
        if first == decl_id {
            return;
        }
        let Some(first_sym) = self.decls.get(first).symbol else {
            return;
        };
        let first_ty = self.resolve_symbol_type(first_sym);
        let identical = {
            let mut check = RelationCheck::new(self);
            check.identical(first_ty, declared)
        };
        if !identical {
            let name_text = self.interner.resolve(name).to_string();
            let first_text = format_type(self, first_ty);
            let this_text = format_type(self, declared);
            self.post_at(
                node,
                &msg::SUBSEQUENT_DECLARATIONS_SAME_TYPE,
                &[&name_text, &first_text, &this_text],
            );
        }
    }

    // ----- Functions -----

    fn check_function_decl(&mut self, node: NodeIndex) {
        let Some(decl_id) = self.decls.decl_of_node(self.ctx.current_unit, node) else {
            return;
        };
        let Some(sym) = self.decls.get(decl_id).symbol else {
            return;
        };
        self.resolve_symbol_type(sym);

        // Group-level checks run once, on the first physical decl.
        if self.symbols.get(sym).decls.first() == Some(&decl_id) {
            self.check_duplicate_overloads(sym);
        }
        self.check_function_like_body(decl_id);
    }

    /// Two overload declarations with identical parameter lists are a
    /// duplicate, whatever their return types.
    fn check_duplicate_overloads(&mut self, sym: SymbolId) {
        let decls: SmallVec<[DeclId; 2]> = self.symbols.get(sym).decls.clone();
        let overloads: SmallVec<[DeclId; 2]> = decls
            .into_iter()
            .filter(|&d| self.decls.get(d).flags.contains(DeclFlags::OVERLOAD_ONLY))
            .collect();
        if overloads.len() < 2 {
            return;
        }
        let sigs: Vec<_> = overloads
            .iter()
            .map(|&d| self.signature_for_decl(d))
            .collect();
        for i in 0..sigs.len() {
            for j in (i + 1)..sigs.len() {
                let duplicate = {
                    let mut check = RelationCheck::new(self);
                    check.signatures_identical(sigs[i], sigs[j], true)
                };
                if duplicate {
                    let name = {
                        let atom = self.symbols.get(sym).name;
                        self.interner.resolve(atom).to_string()
                    };
                    let later = self.decls.get(overloads[j]).node;
                    self.post_at(later, &msg::DUPLICATE_SIGNATURE, &[&name]);
                }
            }
        }
    }

    /// Check a function-like decl's body statements and the conformance
    /// of its returns against an annotated return type.
    fn check_function_like_body(&mut self, decl_id: DeclId) {
        let node = self.decls.get(decl_id).node;
        let (annotated, body) = match self.arena.kind(node).clone() {
            NodeKind::FunctionDecl(data) | NodeKind::FunctionExpr(data) => {
                (data.return_ty.is_some(), data.body)
            }
            NodeKind::MethodDecl {
                return_ty, body, ..
            } => (return_ty.is_some(), body),
            NodeKind::CtorDecl { body, .. } => (false, body),
            _ => (false, None),
        };
        let Some(body) = body else {
            return;
        };
        self.with_scope(decl_id, |c| {
            c.check_stmt(body);
            if !annotated {
                return;
            }
            let sig = c.signature_for_decl(decl_id);
            let declared_ret = c.types.sig(sig).ret;
            if declared_ret == TypeId::VOID || declared_ret == TypeId::ANY {
                return;
            }
            for value in c.collect_returns(body) {
                let value_ty = if c.is_retypable(value) {
                    c.type_of_expr_contextual(value, declared_ret, false)
                } else {
                    c.expr_type(value)
                };
                c.check_assignable(value, value_ty, declared_ret);
            }
        });
    }

    // ----- Classes and interfaces -----

    fn check_class(&mut self, node: NodeIndex) {
        let Some(decl_id) = self.decls.decl_of_node(self.ctx.current_unit, node) else {
            return;
        };
        let Some(sym) = self.decls.get(decl_id).symbol else {
            return;
        };
        self.resolve_symbol_type(sym);

        let children: SmallVec<[DeclId; 8]> =
            self.decls.children(decl_id).iter().copied().collect();
        for child in children {
            let (kind, child_sym, child_node) = {
                let decl = self.decls.get(child);
                (decl.kind, decl.symbol, decl.node)
            };
            match kind {
                DeclKind::Property => {
                    let Some(child_sym) = child_sym else { continue };
                    let declared = self.resolve_symbol_type(child_sym);
                    let NodeKind::PropertyDecl {
                        ty, init: Some(init), ..
                    } = self.arena.kind(child_node).clone()
                    else {
                        continue;
                    };
                    if ty.is_some() {
                        let value_ty = if self.is_retypable(init) && declared != TypeId::ANY {
                            self.type_of_expr_contextual(init, declared, false)
                        } else {
                            self.expr_type(init)
                        };
                        self.check_assignable(init, value_ty, declared);
                    } else {
                        self.expr_type(init);
                    }
                }
                DeclKind::Method | DeclKind::Constructor => {
                    let Some(child_sym) = child_sym else { continue };
                    self.resolve_symbol_type(child_sym);
                    if self.symbols.get(child_sym).decls.first() == Some(&child) {
                        self.check_duplicate_overloads(child_sym);
                    }
                    self.check_function_like_body(child);
                }
                _ => {}
            }
        }
    }

    fn check_interface(&mut self, node: NodeIndex) {
        let Some(decl_id) = self.decls.decl_of_node(self.ctx.current_unit, node) else {
            return;
        };
        let Some(sym) = self.decls.get(decl_id).symbol else {
            return;
        };
        let iface = self.resolve_symbol_type(sym);
        if self.symbols.get(sym).decls.first() == Some(&decl_id) {
            self.check_index_consistency(iface);
        }
    }

    /// Every named member's type must be assignable to the value type
    /// of a string index signature on the same type.
    fn check_index_consistency(&mut self, ty: TypeId) {
        let index_sigs = self.types.get(ty).index_sigs.clone();
        if index_sigs.is_empty() {
            return;
        }
        let members: Vec<(Atom, SymbolId)> = self
            .types
            .get(ty)
            .members
            .iter()
            .map(|(&name, &sym)| (name, sym))
            .collect();
        for sig in index_sigs {
            let key = self
                .types
                .sig(sig)
                .params
                .first()
                .and_then(|&p| self.types.symbol_type(p))
                .unwrap_or(TypeId::STRING);
            // Number-keyed signatures constrain numerically named
            // members; member names here are identifiers, so only the
            // string signature has anything to check.
            if key != TypeId::STRING {
                continue;
            }
            let value_ty = self.types.sig(sig).ret;
            for &(name, member) in &members {
                let member_ty = self.resolve_symbol_type(member);
                let ok = {
                    let mut check = RelationCheck::new(self);
                    check.assignable(member_ty, value_ty)
                };
                if !ok {
                    let name_text = self.interner.resolve(name).to_string();
                    let member_text = format_type(self, member_ty);
                    let value_text = format_type(self, value_ty);
                    let at = self
                        .symbols
                        .get(member)
                        .decls
                        .first()
                        .map(|&d| self.decls.get(d).node);
                    if let Some(at) = at {
                        self.post_at(
                            at,
                            &msg::PROPERTY_NOT_ASSIGNABLE_TO_INDEX,
                            &[&name_text, &member_text, &value_text],
                        );
                    }
                }
            }
        }
    }
}
