//! Resolution of type-annotation nodes.

use vela_ast::{NodeIndex, NodeKind};
use vela_binder::{Binder, ResolveState, Symbol, SymbolFlags, SymbolId, SymbolKind};
use vela_common::{Atom, diagnostic_messages as msg};
use vela_solver::{
    Instantiator, RelationCheck, SigFlags, Signature, TypeData, TypeId, TypeSymbol, format_type,
    specialize_type,
};

use crate::globals;
use crate::scopes::Namespace;
use crate::state::Checker;

impl Checker {
    /// Resolve a type-annotation node to a type.
    pub(crate) fn type_from_node(&mut self, node: NodeIndex) -> TypeId {
        match self.arena.kind(node).clone() {
            NodeKind::TypeRef { path, type_args } => self.type_from_ref(node, &path, &type_args),
            NodeKind::ArrayType { element } => {
                let element_ty = self.type_from_node(element);
                let name = self.array_name(element_ty);
                self.types.array_of(element_ty, name)
            }
            NodeKind::FunctionType { params, return_ty } => {
                self.function_type_literal(node, &params, return_ty)
            }
            NodeKind::ObjectType { .. } => {
                let parent = match self.current_scope() {
                    Some(scope) => scope,
                    None => return TypeId::ERROR,
                };
                let unit = self.ctx.current_unit;
                let decl = Binder::new(
                    &self.arena,
                    &mut self.interner,
                    &mut self.decls,
                    &mut self.symbols,
                    unit,
                )
                .bind_object_type_literal(node, parent);
                match self.decls.get(decl).symbol {
                    Some(sym) => self.resolve_symbol_type(sym),
                    None => TypeId::ERROR,
                }
            }
            other => {
                debug_assert!(false, "not a type annotation: {other:?}");
                TypeId::ERROR
            }
        }
    }

    fn type_from_ref(&mut self, node: NodeIndex, path: &[Atom], type_args: &[NodeIndex]) -> TypeId {
        if path.len() == 1 && type_args.is_empty() {
            if let Some(primitive) = self.primitive_keyword(path[0]) {
                return primitive;
            }
        }

        let saved = self.ctx.resolving_type_reference;
        self.ctx.resolving_type_reference = true;
        let sym = self.resolve_type_path(path);
        self.ctx.resolving_type_reference = saved;

        let base = match sym {
            Some(sym) => self.type_position_of(sym),
            None => {
                let name = self.path_text(path);
                if path.len() == 1 {
                    if let Some(builtin) = globals::builtin_type_named(self, &name) {
                        return builtin;
                    }
                }
                self.post_at(node, &msg::CANNOT_FIND_NAME, &[&name]);
                return TypeId::ERROR;
            }
        };

        let args: Vec<TypeId> = type_args.iter().map(|&a| self.type_from_node(a)).collect();
        let params = self.types.get(base).type_params.clone();
        if args.len() != params.len() {
            let name = self.path_text(path);
            self.post_at(
                node,
                &msg::WRONG_TYPE_ARGUMENT_COUNT,
                &[&name, &params.len().to_string()],
            );
            return TypeId::ERROR;
        }
        if args.is_empty() {
            return base;
        }
        self.check_type_arg_constraints(node, &params, &args);
        specialize_type(self, base, &args)
    }

    fn check_type_arg_constraints(&mut self, node: NodeIndex, params: &[TypeId], args: &[TypeId]) {
        let instantiator = Instantiator::new(params, args);
        for (&param, &arg) in params.iter().zip(args.iter()) {
            let TypeData::TypeParameter {
                constraint: Some(constraint),
            } = self.types.data(param).clone()
            else {
                continue;
            };
            let substituted = instantiator.substitute(self, constraint);
            let satisfied = {
                let mut check = RelationCheck::for_constraint_check(self);
                check.assignable(arg, substituted)
            };
            if !satisfied {
                let arg_text = format_type(self, arg);
                let constraint_text = format_type(self, substituted);
                self.post_at(
                    node,
                    &msg::TYPE_ARGUMENT_CONSTRAINT,
                    &[&arg_text, &constraint_text],
                );
            }
        }
    }

    fn resolve_type_path(&mut self, path: &[Atom]) -> Option<SymbolId> {
        if path.len() == 1 {
            return self.resolve_name(path[0], Namespace::Type);
        }
        let mut current = self.resolve_name(path[0], Namespace::Container)?;
        for &segment in &path[1..path.len() - 1] {
            current = self.find_exported(current, segment, Namespace::Container)?;
        }
        self.find_exported(current, path[path.len() - 1], Namespace::Type)
    }

    /// The type a symbol denotes in type position: a class name means
    /// its instance type, an enum name its enum type.
    pub(crate) fn type_position_of(&mut self, sym: SymbolId) -> TypeId {
        let declared = self.resolve_symbol_type(sym);
        match self.symbols.get(sym).kind {
            SymbolKind::Class | SymbolKind::Enum => self
                .types
                .get(declared)
                .instance
                .unwrap_or(TypeId::ERROR),
            _ => declared,
        }
    }

    fn primitive_keyword(&self, name: Atom) -> Option<TypeId> {
        match self.interner.resolve(name) {
            "any" => Some(TypeId::ANY),
            "number" => Some(TypeId::NUMBER),
            "string" => Some(TypeId::STRING),
            "boolean" => Some(TypeId::BOOLEAN),
            "void" => Some(TypeId::VOID),
            "null" => Some(TypeId::NULL),
            "undefined" => Some(TypeId::UNDEFINED),
            _ => None,
        }
    }

    fn path_text(&self, path: &[Atom]) -> String {
        path.iter()
            .map(|&a| self.interner.resolve(a))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn array_name(&mut self, element: TypeId) -> Atom {
        let element_name = {
            let atom = self.types.get(element).name;
            self.interner.resolve(atom).to_string()
        };
        self.interner.intern(&format!("{element_name}[]"))
    }

    /// An inline function type: one anonymous interface with a single
    /// call signature. Parameter nodes here are unbound, so symbols are
    /// allocated directly.
    fn function_type_literal(
        &mut self,
        node: NodeIndex,
        params: &[NodeIndex],
        return_ty: NodeIndex,
    ) -> TypeId {
        let mut param_symbols = Vec::with_capacity(params.len());
        let mut flags = SigFlags::empty();
        for &param in params {
            let NodeKind::Param {
                name,
                ty,
                optional,
                rest,
            } = self.arena.kind(param).clone()
            else {
                continue;
            };
            let param_ty = match ty {
                Some(annotation) => self.type_from_node(annotation),
                None => TypeId::ANY,
            };
            let mut symbol_flags = SymbolFlags::empty();
            if optional {
                symbol_flags |= SymbolFlags::OPTIONAL;
            }
            if rest {
                symbol_flags |= SymbolFlags::REST;
                flags |= SigFlags::HAS_VARARG;
            }
            let mut symbol = Symbol::new(name, SymbolKind::Parameter, symbol_flags);
            symbol.state = ResolveState::Resolved;
            let id = self.symbols.alloc(symbol);
            self.types.set_symbol_type(id, param_ty);
            param_symbols.push(id);
        }
        let ret = self.type_from_node(return_ty);
        let sig = self.types.alloc_sig(Signature {
            params: param_symbols,
            ret,
            type_params: Vec::new(),
            flags,
            decl: self.decls.decl_of_node(self.ctx.current_unit, node),
        });
        let name = self.interner.intern("__function");
        let mut fn_ty = TypeSymbol::new(name, TypeData::Interface);
        fn_ty.call_sigs.push(sig);
        self.types.alloc(fn_ty)
    }
}
