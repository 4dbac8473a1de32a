//! Expression typing.
//!
//! The natural type of each expression is computed once and cached;
//! contextual re-typing (object/array literals and function expressions
//! under a parameter or annotation type) bypasses the cache and is
//! committed only when the context is not provisional.

use tracing::trace;
use vela_ast::{BinaryOp, NodeIndex, NodeKind, UnaryOp};
use vela_binder::{Binder, ResolveState};
use vela_common::{Atom, RelatedInformation, diagnostic_messages as msg, format_message};
use vela_solver::{
    ExprResolver, RelationCheck, TypeData, TypeId, TypeSymbol, collect_shape, find_best_common_type,
    find_member_type, format_type, resolve_call,
};

use crate::scopes::Namespace;
use crate::state::Checker;

impl Checker {
    pub(crate) fn compute_expr_type(&mut self, node: NodeIndex) -> TypeId {
        match self.arena.kind(node).clone() {
            NodeKind::NumberLit(_) => TypeId::NUMBER,
            NodeKind::StringLit(text) => self.types.string_literal(text),
            NodeKind::True | NodeKind::False => TypeId::BOOLEAN,
            NodeKind::NullLit => TypeId::NULL,
            NodeKind::Paren(inner) => self.expr_type(inner),
            NodeKind::Ident(name) => self.ident_type(node, name),
            NodeKind::Member { object, name } => self.member_type(node, object, name),
            NodeKind::Index { object, index } => self.index_type(object, index),
            NodeKind::ArrayLit { elements } => self.array_literal_type(&elements),
            NodeKind::ObjectLit { props } => self.object_literal_type(node, &props),
            NodeKind::FunctionExpr(_) => self.function_expr_type(node),
            NodeKind::Call {
                callee,
                type_args,
                args,
            } => self.call_type(node, callee, &type_args, &args, false),
            NodeKind::New {
                callee,
                type_args,
                args,
            } => self.call_type(node, callee, &type_args, &args, true),
            NodeKind::Binary { op, left, right } => self.binary_type(op, left, right),
            NodeKind::Prefix { op, operand } => self.prefix_type(op, operand),
            NodeKind::Cond {
                cond,
                when_true,
                when_false,
            } => {
                self.expr_type(cond);
                let t = self.expr_type(when_true);
                let t = self.widened_literal(t);
                let f = self.expr_type(when_false);
                let f = self.widened_literal(f);
                find_best_common_type(self, &[t, f])
            }
            NodeKind::Assign { target, value } => self.assign_type(target, value),
            other => {
                debug_assert!(false, "not an expression: {other:?}");
                TypeId::ANY
            }
        }
    }

    fn ident_type(&mut self, node: NodeIndex, name: Atom) -> TypeId {
        match self.resolve_name(name, Namespace::Value) {
            Some(sym) => self.resolve_symbol_type(sym),
            None => {
                let text = self.interner.resolve(name).to_string();
                self.post_at(node, &msg::CANNOT_FIND_NAME, &[&text]);
                TypeId::ERROR
            }
        }
    }

    fn member_type(&mut self, node: NodeIndex, object: NodeIndex, name: Atom) -> TypeId {
        let object_ty = self.expr_type(object);
        if matches!(
            self.types.data(object_ty),
            TypeData::Any | TypeData::Error
        ) {
            return TypeId::ANY;
        }
        match find_member_type(self, object_ty, name) {
            Some(ty) => ty,
            None => {
                let member = self.interner.resolve(name).to_string();
                let object_text = format_type(self, object_ty);
                self.post_at(node, &msg::PROPERTY_DOES_NOT_EXIST, &[&member, &object_text]);
                TypeId::ERROR
            }
        }
    }

    fn index_type(&mut self, object: NodeIndex, index: NodeIndex) -> TypeId {
        let object_ty = self.expr_type(object);
        let index_ty = self.expr_type(index);
        if matches!(
            self.types.data(object_ty),
            TypeData::Any | TypeData::Error
        ) {
            return TypeId::ANY;
        }
        // `o["name"]` with a literal key is member access.
        if let NodeKind::StringLit(name) = self.arena.kind(index).clone() {
            if let Some(ty) = find_member_type(self, object_ty, name) {
                return ty;
            }
        }
        if let Some(element) = self.types.element_type(object_ty) {
            return element;
        }
        // Match an index signature by key type: numeric keys prefer the
        // number signature, anything else takes the string signature.
        let numeric_key = index_ty == TypeId::NUMBER
            || matches!(self.types.data(index_ty), TypeData::Enum { .. });
        let shape = collect_shape(self, object_ty);
        let mut string_sig = None;
        let mut number_sig = None;
        for sig in shape.indexes {
            let key = self
                .types
                .sig(sig)
                .params
                .first()
                .and_then(|&p| self.types.symbol_type(p))
                .unwrap_or(TypeId::STRING);
            if key == TypeId::NUMBER {
                number_sig.get_or_insert(sig);
            } else {
                string_sig.get_or_insert(sig);
            }
        }
        let chosen = if numeric_key {
            number_sig.or(string_sig)
        } else {
            string_sig
        };
        match chosen {
            Some(sig) => self.types.sig(sig).ret,
            None => TypeId::ANY,
        }
    }

    fn array_literal_type(&mut self, elements: &[NodeIndex]) -> TypeId {
        let contextual = self.ctx.contextual_type();
        let contextual_element = contextual.and_then(|entry| self.types.element_type(entry.ty));
        let mut candidates = Vec::with_capacity(elements.len());
        for &element in elements {
            let ty = match (contextual_element, contextual) {
                (Some(ce), Some(entry)) if self.is_retypable(element) => {
                    self.type_of_expr_contextual(element, ce, entry.provisional)
                }
                _ => self.expr_type(element),
            };
            candidates.push(self.widened_literal(ty));
        }
        if candidates.is_empty() {
            if let Some(ce) = contextual_element {
                let name = self.array_name(ce);
                return self.types.array_of(ce, name);
            }
            let name = self.array_name(TypeId::ANY);
            return self.types.array_of(TypeId::ANY, name);
        }
        let element_ty = find_best_common_type(self, &candidates);
        let name = self.array_name(element_ty);
        self.types.array_of(element_ty, name)
    }

    fn object_literal_type(&mut self, node: NodeIndex, props: &[NodeIndex]) -> TypeId {
        let Some(parent) = self.current_scope() else {
            return TypeId::ERROR;
        };
        let unit = self.ctx.current_unit;
        let decl = Binder::new(
            &self.arena,
            &mut self.interner,
            &mut self.decls,
            &mut self.symbols,
            unit,
        )
        .bind_object_literal(node, parent);

        let contextual = self.ctx.contextual_type();
        let name = self.interner.intern("__object");
        let mut shell = TypeSymbol::new(name, TypeData::Interface);
        shell.symbol = self.decls.get(decl).symbol;
        shell.decl = Some(decl);
        let obj_ty = self.types.alloc(shell);

        for &prop in props {
            let NodeKind::ObjectProp {
                name: prop_name,
                value,
            } = self.arena.kind(prop).clone()
            else {
                continue;
            };
            let contextual_member = contextual
                .and_then(|entry| find_member_type(self, entry.ty, prop_name));
            let value_ty = match (contextual_member, contextual) {
                (Some(cm), Some(entry)) => {
                    if self.is_retypable(value) {
                        self.type_of_expr_contextual(value, cm, entry.provisional)
                    } else {
                        self.expr_type(value)
                    }
                }
                _ => {
                    let ty = self.expr_type(value);
                    self.widened(ty)
                }
            };
            let Some(prop_decl) = self.decls.decl_of_node(unit, prop) else {
                continue;
            };
            let Some(prop_sym) = self.decls.get(prop_decl).symbol else {
                continue;
            };
            self.types.set_symbol_type(prop_sym, value_ty);
            self.symbols.get_mut(prop_sym).state = ResolveState::Resolved;
            self.types.get_mut(obj_ty).members.insert(prop_name, prop_sym);
        }

        if let Some(obj_sym) = self.decls.get(decl).symbol {
            self.types.set_symbol_type(obj_sym, obj_ty);
            self.symbols.get_mut(obj_sym).state = ResolveState::Resolved;
        }
        obj_ty
    }

    fn function_expr_type(&mut self, node: NodeIndex) -> TypeId {
        let Some(parent) = self.current_scope() else {
            return TypeId::ERROR;
        };
        let unit = self.ctx.current_unit;
        let decl = Binder::new(
            &self.arena,
            &mut self.interner,
            &mut self.decls,
            &mut self.symbols,
            unit,
        )
        .bind_function_expression(node, parent);

        // Seed unannotated parameters from the contextual type's first
        // call signature before the signature is built.
        if let Some(entry) = self.ctx.contextual_type() {
            self.seed_contextual_params(decl, entry.ty);
        }

        let sig = self.signature_for_decl(decl);
        let name = self.interner.intern("__function");
        let mut fn_ty = TypeSymbol::new(name, TypeData::Interface);
        fn_ty.symbol = self.decls.get(decl).symbol;
        fn_ty.decl = Some(decl);
        fn_ty.call_sigs.push(sig);
        let fn_ty = self.types.alloc(fn_ty);
        if let Some(sym) = self.decls.get(decl).symbol {
            self.types.set_symbol_type(sym, fn_ty);
            self.symbols.get_mut(sym).state = ResolveState::Resolved;
        }
        fn_ty
    }

    fn seed_contextual_params(&mut self, decl: vela_binder::DeclId, contextual: TypeId) {
        if !self.types.data(contextual).is_object_like() {
            return;
        }
        let shape = collect_shape(self, contextual);
        let Some(&contextual_sig) = shape.calls.first() else {
            return;
        };
        let contextual_params = self.types.sig(contextual_sig).params.clone();
        let own_params: Vec<vela_binder::DeclId> = self
            .decls
            .children(decl)
            .iter()
            .copied()
            .filter(|&c| self.decls.get(c).kind == vela_binder::DeclKind::Parameter)
            .collect();
        for (i, param_decl) in own_params.into_iter().enumerate() {
            let node = self.decls.get(param_decl).node;
            let NodeKind::Param { ty: None, .. } = self.arena.kind(node) else {
                continue;
            };
            let Some(&source) = contextual_params.get(i) else {
                break;
            };
            let Some(param_sym) = self.decls.get(param_decl).symbol else {
                continue;
            };
            if self.symbols.get(param_sym).state != ResolveState::Unresolved {
                continue;
            }
            let seeded = self.resolve_symbol_type(source);
            trace!(?param_sym, ?seeded, "seeding parameter from contextual signature");
            self.types.set_symbol_type(param_sym, seeded);
            self.symbols.get_mut(param_sym).state = ResolveState::Resolved;
        }
    }

    fn call_type(
        &mut self,
        node: NodeIndex,
        callee: NodeIndex,
        type_args: &[NodeIndex],
        args: &[NodeIndex],
        is_new: bool,
    ) -> TypeId {
        let callee_ty = self.expr_type(callee);
        let explicit: Vec<TypeId> = type_args.iter().map(|&t| self.type_from_node(t)).collect();
        let resolution = resolve_call(self, node, callee_ty, is_new, &explicit, args);
        if resolution.sig.is_none() {
            // Dynamic or uncallable callee: arguments still get their
            // natural types checked.
            for &arg in args {
                self.expr_type(arg);
            }
        }
        resolution.ret
    }

    fn binary_type(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> TypeId {
        let left_ty = self.expr_type(left);
        let right_ty = self.expr_type(right);
        match op {
            BinaryOp::Add => {
                if self.is_stringish(left_ty) || self.is_stringish(right_ty) {
                    return TypeId::STRING;
                }
                self.expect_arithmetic(left, left_ty);
                self.expect_arithmetic(right, right_ty);
                TypeId::NUMBER
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                self.expect_arithmetic(left, left_ty);
                self.expect_arithmetic(right, right_ty);
                TypeId::NUMBER
            }
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::EqEq
            | BinaryOp::NotEq
            | BinaryOp::InstanceOf
            | BinaryOp::In => TypeId::BOOLEAN,
            BinaryOp::AndAnd => right_ty,
            BinaryOp::OrOr => {
                let l = self.widened(left_ty);
                let r = self.widened(right_ty);
                find_best_common_type(self, &[l, r])
            }
        }
    }

    fn prefix_type(&mut self, op: UnaryOp, operand: NodeIndex) -> TypeId {
        let operand_ty = self.expr_type(operand);
        match op {
            UnaryOp::Neg | UnaryOp::Plus => {
                self.expect_arithmetic(operand, operand_ty);
                TypeId::NUMBER
            }
            UnaryOp::Not => TypeId::BOOLEAN,
            UnaryOp::Typeof => TypeId::STRING,
        }
    }

    fn assign_type(&mut self, target: NodeIndex, value: NodeIndex) -> TypeId {
        let target_ty = self.expr_type(target);
        let value_ty = if self.is_retypable(value) && target_ty != TypeId::ANY {
            self.type_of_expr_contextual(value, target_ty, false)
        } else {
            self.expr_type(value)
        };
        self.check_assignable(value, value_ty, target_ty);
        value_ty
    }

    fn is_stringish(&self, ty: TypeId) -> bool {
        ty == TypeId::STRING || matches!(self.types.data(ty), TypeData::StringLiteral(_))
    }

    fn expect_arithmetic(&mut self, node: NodeIndex, ty: TypeId) {
        let ok = matches!(
            self.types.data(ty),
            TypeData::Any | TypeData::Error | TypeData::Enum { .. }
        ) || ty == TypeId::NUMBER;
        if !ok {
            self.post_at(node, &msg::ARITHMETIC_OPERAND, &[]);
        }
    }

    // ----- Assignability with elaboration -----

    /// Check assignability and, on failure, post the primary diagnostic
    /// with a nested note naming the first incompatible property.
    pub(crate) fn check_assignable(
        &mut self,
        node: NodeIndex,
        source: TypeId,
        target: TypeId,
    ) -> bool {
        let ok = {
            let mut check = RelationCheck::new(self);
            check.assignable(source, target)
        };
        if ok {
            return true;
        }
        let source_text = format_type(self, source);
        let target_text = format_type(self, target);
        let mismatch = self.first_mismatched_member(source, target);
        let unit = self.ctx.current_unit;
        let span = self.arena.span(node);
        let diagnostic = self
            .sink
            .post(unit, span, &msg::TYPE_NOT_ASSIGNABLE, &[&source_text, &target_text]);
        if let Some(name) = mismatch {
            diagnostic.related_information.push(RelatedInformation {
                code: msg::TYPES_OF_PROPERTY_INCOMPATIBLE.code,
                unit,
                span,
                message_text: format_message(msg::TYPES_OF_PROPERTY_INCOMPATIBLE.message, &[&name]),
            });
        }
        false
    }

    /// First target member whose corresponding source member fails
    /// assignability; drives the nested elaboration note.
    fn first_mismatched_member(&mut self, source: TypeId, target: TypeId) -> Option<String> {
        if !self.types.data(source).is_object_like() || !self.types.data(target).is_object_like() {
            return None;
        }
        let target_members = collect_shape(self, target).members;
        let source_members = collect_shape(self, source).members;
        for (name, t_member) in target_members {
            let Some(&s_member) = source_members.get(&name) else {
                continue;
            };
            let s_ty = self.resolve_symbol_type(s_member);
            let t_ty = self.resolve_symbol_type(t_member);
            let ok = {
                let mut check = RelationCheck::new(self);
                check.assignable(s_ty, t_ty)
            };
            if !ok {
                return Some(self.interner.resolve(name).to_string());
            }
        }
        None
    }
}
