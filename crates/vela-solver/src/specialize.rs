//! Generic specialization.
//!
//! Instantiating `Root<Args...>` clones the root's shape with every
//! occurrence of a type parameter replaced by the corresponding
//! argument. The instantiation is cached on the root and — critically —
//! the cache entry is written *before* any member is substituted, so a
//! self-referential generic (`List<T>` whose members mention `List<T>`)
//! finds the in-progress instantiation and terminates.

use rustc_hash::FxHashMap;
use tracing::trace;
use vela_binder::{ResolveState, Symbol, SymbolId};

use crate::resolver::TypeResolver;
use crate::types::{SigFlags, SigId, Signature, TypeData, TypeId, TypeSymbol};

/// A substitution from type-parameter types to argument types.
pub struct Instantiator {
    map: FxHashMap<TypeId, TypeId>,
}

impl Instantiator {
    pub fn new(params: &[TypeId], args: &[TypeId]) -> Self {
        let map = params.iter().copied().zip(args.iter().copied()).collect();
        Self { map }
    }

    /// Substitution that erases every parameter to the dynamic type.
    pub fn erasing(params: &[TypeId]) -> Self {
        let map = params.iter().map(|&p| (p, TypeId::ANY)).collect();
        Self { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply the substitution to a type, recursing through arrays and
    /// instantiating object types that mention a substituted parameter.
    pub fn substitute(&self, r: &mut dyn TypeResolver, ty: TypeId) -> TypeId {
        if let Some(&replacement) = self.map.get(&ty) {
            return replacement;
        }
        match r.types().data(ty).clone() {
            TypeData::Array { element } => {
                let substituted = self.substitute(r, element);
                if substituted == element {
                    return ty;
                }
                let name = array_type_name(r, substituted);
                r.types_mut().array_of(substituted, name)
            }
            data if data.is_object_like() => {
                let record = r.types().get(ty);
                if !record.type_params.is_empty() && record.root.is_none() {
                    // A generic root mentioned bare inside its own body:
                    // instantiate it with the substituted parameters.
                    let params = record.type_params.clone();
                    let args: Vec<TypeId> =
                        params.iter().map(|&p| self.substitute_param(p)).collect();
                    return specialize_type(r, ty, &args);
                }
                if let Some(root) = record.root {
                    let args = record.type_args.clone();
                    let substituted: Vec<TypeId> =
                        args.iter().map(|&a| self.substitute(r, a)).collect();
                    if substituted == args {
                        return ty;
                    }
                    return specialize_type(r, root, &substituted);
                }
                // Anonymous object/function type: rebuild only if it
                // actually mentions a substituted parameter.
                let mut visited = Vec::new();
                if !self.mentions(r, ty, &mut visited) {
                    return ty;
                }
                self.instantiate_anonymous(r, ty)
            }
            _ => ty,
        }
    }

    fn substitute_param(&self, param: TypeId) -> TypeId {
        self.map.get(&param).copied().unwrap_or(param)
    }

    /// Does `ty` transitively reference any substituted parameter?
    fn mentions(&self, r: &dyn TypeResolver, ty: TypeId, visited: &mut Vec<TypeId>) -> bool {
        if self.map.contains_key(&ty) {
            return true;
        }
        if visited.contains(&ty) {
            return false;
        }
        visited.push(ty);
        match r.types().data(ty) {
            TypeData::Array { element } => self.mentions(r, *element, visited),
            data if data.is_object_like() => {
                let record = r.types().get(ty);
                let member_types: Vec<TypeId> = record
                    .members
                    .values()
                    .filter_map(|&m| r.types().symbol_type(m))
                    .collect();
                let sig_ids: Vec<SigId> = record
                    .call_sigs
                    .iter()
                    .chain(record.construct_sigs.iter())
                    .chain(record.index_sigs.iter())
                    .copied()
                    .collect();
                let bases: Vec<TypeId> = record
                    .extends
                    .iter()
                    .chain(record.implements.iter())
                    .chain(record.type_args.iter())
                    .copied()
                    .collect();
                for member_ty in member_types {
                    if self.mentions(r, member_ty, visited) {
                        return true;
                    }
                }
                for sig in sig_ids {
                    let (param_types, ret): (Vec<TypeId>, TypeId) = {
                        let record = r.types().sig(sig);
                        (
                            record
                                .params
                                .iter()
                                .filter_map(|&p| r.types().symbol_type(p))
                                .collect(),
                            record.ret,
                        )
                    };
                    if self.mentions(r, ret, visited) {
                        return true;
                    }
                    for param_ty in param_types {
                        if self.mentions(r, param_ty, visited) {
                            return true;
                        }
                    }
                }
                for base in bases {
                    if self.mentions(r, base, visited) {
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn instantiate_anonymous(&self, r: &mut dyn TypeResolver, ty: TypeId) -> TypeId {
        let record = r.types().get(ty);
        let mut shell = TypeSymbol::new(record.name, record.data.clone());
        shell.symbol = record.symbol;
        shell.decl = record.decl;
        shell.root = Some(ty);
        let id = r.types_mut().alloc(shell);
        self.fill_instantiation(r, ty, id);
        id
    }

    /// Copy the root's members, signatures, and bases into `target`,
    /// substituting as we go. `target` must already be reachable via the
    /// specialization cache (or be a fresh anonymous shell) so recursive
    /// references terminate.
    pub(crate) fn fill_instantiation(
        &self,
        r: &mut dyn TypeResolver,
        root: TypeId,
        target: TypeId,
    ) {
        let (members, calls, constructs, indexes, extends, implements) = {
            let record = r.types().get(root);
            (
                record
                    .members
                    .iter()
                    .map(|(&name, &sym)| (name, sym))
                    .collect::<Vec<_>>(),
                record.call_sigs.clone(),
                record.construct_sigs.clone(),
                record.index_sigs.clone(),
                record.extends.clone(),
                record.implements.clone(),
            )
        };
        for (name, member) in members {
            let member_ty = r.type_of_symbol(member);
            let substituted = self.substitute(r, member_ty);
            let clone = clone_symbol_with_type(r, member, substituted);
            r.types_mut().get_mut(target).members.insert(name, clone);
        }
        for sig in calls {
            let specialized = specialize_signature(r, sig, self);
            r.types_mut().get_mut(target).call_sigs.push(specialized);
        }
        for sig in constructs {
            let specialized = specialize_signature(r, sig, self);
            r.types_mut()
                .get_mut(target)
                .construct_sigs
                .push(specialized);
        }
        for sig in indexes {
            let specialized = specialize_signature(r, sig, self);
            r.types_mut().get_mut(target).index_sigs.push(specialized);
        }
        for base in extends {
            let substituted = self.substitute(r, base);
            r.types_mut().get_mut(target).extends.push(substituted);
        }
        for base in implements {
            let substituted = self.substitute(r, base);
            r.types_mut().get_mut(target).implements.push(substituted);
        }
    }
}

/// Instantiate `root` with `args`, reusing the cached instantiation for
/// an identical argument list.
pub fn specialize_type(r: &mut dyn TypeResolver, root: TypeId, args: &[TypeId]) -> TypeId {
    let root = r.types().root_of(root);
    let params = r.types().get(root).type_params.clone();
    if params.is_empty() || args.is_empty() {
        return root;
    }
    // Identity instantiation: Root<T> inside Root<T>'s own body.
    if params.as_slice() == args {
        return root;
    }
    let key: Vec<TypeId> = args.to_vec();
    if let Some(&cached) = r.types().get(root).specializations.get(&key) {
        return cached;
    }
    trace!(?root, ?args, "specializing");

    let (name, data, symbol, decl, instance) = {
        let record = r.types().get(root);
        (
            record.name,
            record.data.clone(),
            record.symbol,
            record.decl,
            record.instance,
        )
    };
    let mut shell = TypeSymbol::new(name, data);
    shell.symbol = symbol;
    shell.decl = decl;
    shell.root = Some(root);
    shell.type_args = key.clone();
    let id = r.types_mut().alloc(shell);
    // Cache before substituting members so self-references hit it.
    r.types_mut()
        .get_mut(root)
        .specializations
        .insert(key, id);

    r.context().specialization_depth += 1;
    let instantiator = Instantiator::new(&params, args);
    instantiator.fill_instantiation(r, root, id);
    if let Some(instance) = instance {
        let specialized = specialize_type(r, instance, args);
        r.types_mut().get_mut(id).instance = Some(specialized);
    }
    r.context().specialization_depth -= 1;
    id
}

/// Instantiate every parameter of `root` with the dynamic type. Used
/// when type-argument inference fails but resolution must continue.
pub fn specialize_to_any(r: &mut dyn TypeResolver, root: TypeId) -> TypeId {
    let params = r.types().get(root).type_params.clone();
    if params.is_empty() {
        return root;
    }
    let args = vec![TypeId::ANY; params.len()];
    let saved = r.context().specializing_to_any;
    r.context().specializing_to_any = true;
    let specialized = specialize_type(r, root, &args);
    r.context().specializing_to_any = saved;
    specialized
}

/// Apply a substitution to a signature, producing a new signature with
/// fresh parameter symbols. Type parameters covered by the substitution
/// are dropped from the result.
pub fn specialize_signature(
    r: &mut dyn TypeResolver,
    sig: SigId,
    instantiator: &Instantiator,
) -> SigId {
    let (params, ret, type_params, flags, decl) = {
        let record = r.types().sig(sig);
        (
            record.params.clone(),
            record.ret,
            record.type_params.clone(),
            record.flags,
            record.decl,
        )
    };
    let mut new_params = Vec::with_capacity(params.len());
    for param in params {
        let param_ty = r.type_of_symbol(param);
        let substituted = instantiator.substitute(r, param_ty);
        new_params.push(clone_symbol_with_type(r, param, substituted));
    }
    let new_ret = instantiator.substitute(r, ret);
    let remaining: Vec<TypeId> = type_params
        .into_iter()
        .filter(|tp| instantiator.substitute_param(*tp) == *tp)
        .collect();
    let mut new_flags = flags;
    if remaining.is_empty() {
        new_flags.remove(SigFlags::HAS_GENERIC_PARAM);
    }
    r.types_mut().alloc_sig(Signature {
        params: new_params,
        ret: new_ret,
        type_params: remaining,
        flags: new_flags,
        decl,
    })
}

/// A generic signature compared or invoked without type arguments is
/// viewed with its parameters erased to the dynamic type.
pub fn erase_signature_type_params(r: &mut dyn TypeResolver, sig: SigId) -> SigId {
    let type_params = r.types().sig(sig).type_params.clone();
    if type_params.is_empty() {
        return sig;
    }
    let instantiator = Instantiator::erasing(&type_params);
    specialize_signature(r, sig, &instantiator)
}

fn clone_symbol_with_type(r: &mut dyn TypeResolver, sym: SymbolId, ty: TypeId) -> SymbolId {
    let (name, kind, flags, decls) = {
        let original = r.symbols().get(sym);
        (
            original.name,
            original.kind,
            original.flags,
            original.decls.clone(),
        )
    };
    let mut clone = Symbol::new(name, kind, flags);
    clone.decls = decls;
    clone.state = ResolveState::Resolved;
    let id = r.symbols_mut().alloc(clone);
    r.types_mut().set_symbol_type(id, ty);
    id
}

fn array_type_name(r: &mut dyn TypeResolver, element: TypeId) -> vela_common::Atom {
    let element_name = {
        let atom = r.types().get(element).name;
        r.interner().resolve(atom).to_string()
    };
    r.interner_mut().intern(&format!("{element_name}[]"))
}
