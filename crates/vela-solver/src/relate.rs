//! Identity, subtyping, and assignability.
//!
//! All three predicates run on one recursive core with a mode switch
//! for the few asymmetric rules. Cycle safety is the pending-`true`
//! convention: before recursing on a pair we write `true` into the
//! cache at (source, target), so a cycle back to the same pair resolves
//! optimistically instead of looping. A `false` outcome evicts the
//! entry — it is re-derivable and may differ under another
//! constraint-substitution context.

use rustc_hash::FxHashMap;
use tracing::trace;
use vela_binder::{SymbolFlags, SymbolId};
use vela_common::Atom;

use crate::resolver::TypeResolver;
use crate::specialize::erase_signature_type_params;
use crate::types::{Prim, SigId, TypeData, TypeId};

/// Bound on structural recursion depth. The pair cache makes genuine
/// cycles terminate; the depth bound catches pathological non-cyclic
/// nesting and resolves it optimistically.
pub const MAX_RELATION_DEPTH: u32 = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Identity,
    Subtype,
    Assignable,
}

/// The three memo maps, keyed by ordered (source, target) id pairs.
/// Only `true` results are stored; a stored `true` may be a pending
/// entry for a pair currently on the stack.
#[derive(Debug, Default)]
pub struct RelationCache {
    identity: FxHashMap<(TypeId, TypeId), bool>,
    subtype: FxHashMap<(TypeId, TypeId), bool>,
    assignable: FxHashMap<(TypeId, TypeId), bool>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&mut self, rel: Relation) -> &mut FxHashMap<(TypeId, TypeId), bool> {
        match rel {
            Relation::Identity => &mut self.identity,
            Relation::Subtype => &mut self.subtype,
            Relation::Assignable => &mut self.assignable,
        }
    }

    pub fn get(&mut self, rel: Relation, key: (TypeId, TypeId)) -> Option<bool> {
        self.map(rel).get(&key).copied()
    }

    pub fn insert(&mut self, rel: Relation, key: (TypeId, TypeId), value: bool) {
        self.map(rel).insert(key, value);
    }

    pub fn remove(&mut self, rel: Relation, key: (TypeId, TypeId)) {
        self.map(rel).remove(&key);
    }

    pub fn clear(&mut self) {
        self.identity.clear();
        self.subtype.clear();
        self.assignable.clear();
    }
}

/// One relation query. Cheap to construct; holds no state beyond the
/// resolver seam, the constraint-substitution switch, and the depth
/// counter.
pub struct RelationCheck<'a> {
    pub r: &'a mut dyn TypeResolver,
    /// When set, a type-parameter target is replaced by its declared
    /// upper bound (the comparison is a constraint check).
    pub constraint_substitution: bool,
    depth: u32,
}

impl<'a> RelationCheck<'a> {
    pub fn new(r: &'a mut dyn TypeResolver) -> Self {
        Self {
            r,
            constraint_substitution: false,
            depth: 0,
        }
    }

    pub fn for_constraint_check(r: &'a mut dyn TypeResolver) -> Self {
        Self {
            r,
            constraint_substitution: true,
            depth: 0,
        }
    }

    pub fn identical(&mut self, a: TypeId, b: TypeId) -> bool {
        self.related(a, b, Relation::Identity)
    }

    pub fn subtype(&mut self, source: TypeId, target: TypeId) -> bool {
        self.related(source, target, Relation::Subtype)
    }

    pub fn assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        self.related(source, target, Relation::Assignable)
    }

    /// The recursive core shared by all three predicates.
    pub fn related(&mut self, source: TypeId, target: TypeId, rel: Relation) -> bool {
        if source == target {
            return true;
        }
        let key = (source, target);
        if let Some(hit) = self.r.relation_cache().get(rel, key) {
            return hit;
        }
        if self.depth >= MAX_RELATION_DEPTH {
            trace!(?source, ?target, "relation depth bound hit; assuming related");
            return true;
        }
        // Pending entry: a cycle back to this pair resolves to true.
        self.r.relation_cache().insert(rel, key, true);
        self.depth += 1;
        let result = self.related_uncached(source, target, rel);
        self.depth -= 1;
        if !result {
            self.r.relation_cache().remove(rel, key);
        }
        result
    }

    fn related_uncached(&mut self, source: TypeId, target: TypeId, rel: Relation) -> bool {
        let source_data = self.r.types().data(source).clone();
        let target_data = self.r.types().data(target).clone();

        if rel == Relation::Identity {
            return self.identical_uncached(source, target, &source_data, &target_data);
        }

        // Error containment: one bad symbol must not cascade, so the
        // error pseudo-type relates in both directions.
        if matches!(source_data, TypeData::Error) || matches!(target_data, TypeData::Error) {
            return true;
        }
        // Everything is a subtype of `any`, but `any` flows into other
        // types by assignment only. Overload preference leans on the
        // asymmetry: a concrete parameter is strictly narrower than an
        // `any` parameter.
        if matches!(target_data, TypeData::Any) {
            return true;
        }
        if matches!(source_data, TypeData::Any) {
            return rel == Relation::Assignable;
        }

        // undefined is compatible with everything.
        if source == TypeId::UNDEFINED {
            return true;
        }
        if target == TypeId::UNDEFINED {
            return false;
        }
        // null is compatible with everything except undefined/void.
        if source == TypeId::NULL {
            return target != TypeId::VOID;
        }
        // void relates only to itself (and any, handled above).
        if source == TypeId::VOID || target == TypeId::VOID {
            return false;
        }

        // Literal-string widening is an assignability-only rule;
        // subtyping enforces the exact literal.
        if let TypeData::StringLiteral(_) = source_data {
            return target == TypeId::STRING && rel == Relation::Assignable;
        }

        // Enums are nominal: an enum relates to its backing number, and
        // number initializes an enum, but enums never relate to each
        // other.
        if let TypeData::Enum { backing } = source_data {
            return target == backing;
        }
        if let TypeData::Enum { backing } = target_data {
            return source == backing && rel == Relation::Assignable;
        }

        // Constraint substitution: a type-parameter target stands for
        // its upper bound during constraint checks.
        if self.constraint_substitution {
            if let TypeData::TypeParameter {
                constraint: Some(bound),
            } = target_data
            {
                return self.related(source, bound, rel);
            }
        }
        // Distinct type parameters never relate unless substituted; the
        // same parameter was caught by the identity fast path.
        if matches!(source_data, TypeData::TypeParameter { .. })
            || matches!(target_data, TypeData::TypeParameter { .. })
        {
            return false;
        }

        // Arrays are covariant on element type.
        if let (TypeData::Array { element: se }, TypeData::Array { element: te }) =
            (&source_data, &target_data)
        {
            return self.related(*se, *te, rel);
        }

        if target_data.is_object_like() {
            return self.object_related(source, target, rel);
        }

        false
    }

    // ----- Structural object comparison -----

    fn object_related(&mut self, source: TypeId, target: TypeId, rel: Relation) -> bool {
        // Fast path: the target is on the source's transitive base list.
        if self.has_base(source, target) {
            return true;
        }
        // Every object relates to the universal object type; anything
        // with a call/construct signature relates to the function type.
        if Some(target) == self.r.types().global_object {
            return true;
        }
        if Some(target) == self.r.types().global_function {
            let shape = collect_shape(self.r, source);
            return !shape.calls.is_empty() || !shape.constructs.is_empty();
        }

        let target_shape = collect_shape(self.r, target);
        let source_shape = collect_shape(self.r, source);

        for (name, member) in target_shape.members.clone() {
            let optional = self
                .r
                .symbols()
                .get(member)
                .flags
                .contains(SymbolFlags::OPTIONAL);
            let target_member_ty = self.r.type_of_symbol(member);
            match self.source_member_type(source, &source_shape, name) {
                Some(source_member_ty) => {
                    if !self.related(source_member_ty, target_member_ty, rel) {
                        return false;
                    }
                }
                None => {
                    if !optional {
                        return false;
                    }
                }
            }
        }

        for target_sig in target_shape.calls.clone() {
            if !self.some_signature_related(&source_shape.calls, target_sig, rel) {
                return false;
            }
        }
        for target_sig in target_shape.constructs.clone() {
            if !self.some_signature_related(&source_shape.constructs, target_sig, rel) {
                return false;
            }
        }
        for target_sig in target_shape.indexes.clone() {
            if !self.some_index_related(&source_shape.indexes, target_sig, rel) {
                return false;
            }
        }

        true
    }

    /// Member lookup on the source side, including the built-in
    /// prototype fallback on the universal object/function interfaces.
    fn source_member_type(
        &mut self,
        source: TypeId,
        source_shape: &Shape,
        name: Atom,
    ) -> Option<TypeId> {
        if let TypeData::Array { .. } = self.r.types().data(source) {
            if self.r.interner().get("length") == Some(name) {
                return Some(TypeId::NUMBER);
            }
        }
        if let Some(&member) = source_shape.members.get(&name) {
            return Some(self.r.type_of_symbol(member));
        }
        // Built-in prototype members live on Object (and Function, for
        // anything callable).
        if let Some(object) = self.r.types().global_object {
            if object != source {
                let shape = collect_shape(self.r, object);
                if let Some(&member) = shape.members.get(&name) {
                    return Some(self.r.type_of_symbol(member));
                }
            }
        }
        if !source_shape.calls.is_empty() || !source_shape.constructs.is_empty() {
            if let Some(function) = self.r.types().global_function {
                if function != source {
                    let shape = collect_shape(self.r, function);
                    if let Some(&member) = shape.members.get(&name) {
                        return Some(self.r.type_of_symbol(member));
                    }
                }
            }
        }
        None
    }

    /// Does the source's root transitively record `target` as a base?
    fn has_base(&mut self, source: TypeId, target: TypeId) -> bool {
        let mut stack = vec![source];
        let mut visited = Vec::new();
        while let Some(ty) = stack.pop() {
            if visited.contains(&ty) {
                continue;
            }
            visited.push(ty);
            let record = self.r.types().get(ty);
            for &base in record.extends.iter().chain(record.implements.iter()) {
                if base == target {
                    return true;
                }
                stack.push(base);
            }
        }
        false
    }

    // ----- Signatures -----

    fn some_signature_related(&mut self, sources: &[SigId], target: SigId, rel: Relation) -> bool {
        sources
            .to_vec()
            .into_iter()
            .any(|s| self.signature_related(s, target, rel))
    }

    pub fn signature_related(&mut self, source: SigId, target: SigId, rel: Relation) -> bool {
        if source == target {
            return true;
        }
        if rel == Relation::Identity {
            return self.signatures_identical(source, target, false);
        }
        // Generic signatures compare with their type parameters erased
        // to `any`.
        let source = erase_signature_type_params(self.r, source);
        let target = erase_signature_type_params(self.r, target);

        let (s_params, s_ret, s_vararg) = self.sig_parts(source);
        let (t_params, t_ret, t_vararg) = self.sig_parts(target);

        let s_required = self.required_param_count(&s_params);
        if s_required > t_params.len() && !t_vararg {
            return false;
        }

        let positions = t_params.len().max(if s_vararg { 0 } else { s_params.len() });
        for i in 0..positions {
            let sp = match self.param_type_at(&s_params, i, s_vararg) {
                Some(ty) => ty,
                None => {
                    // Source has no parameter here; target must be
                    // optional or beyond its own list.
                    if i < self.required_param_count(&t_params) {
                        return false;
                    }
                    continue;
                }
            };
            let tp = match self.param_type_at(&t_params, i, t_vararg) {
                Some(ty) => ty,
                None => continue,
            };
            // Parameters compare bivariantly, matching the language's
            // method-argument rules.
            if !self.related(sp, tp, Relation::Assignable)
                && !self.related(tp, sp, Relation::Assignable)
            {
                return false;
            }
        }

        // A void-returning target accepts any source return.
        if t_ret == TypeId::VOID {
            return true;
        }
        self.related(s_ret, t_ret, rel)
    }

    /// Structural signature identity: same vararg-ness, same
    /// non-optional parameter count, identical parameter types, and —
    /// unless excluded — identical return types.
    pub fn signatures_identical(
        &mut self,
        source: SigId,
        target: SigId,
        ignore_return_types: bool,
    ) -> bool {
        if source == target {
            return true;
        }
        let (s_params, s_ret, s_vararg) = self.sig_parts(source);
        let (t_params, t_ret, t_vararg) = self.sig_parts(target);
        if s_vararg != t_vararg
            || s_params.len() != t_params.len()
            || self.required_param_count(&s_params) != self.required_param_count(&t_params)
        {
            return false;
        }
        for (&sp, &tp) in s_params.iter().zip(t_params.iter()) {
            let s_ty = self.r.type_of_symbol(sp);
            let t_ty = self.r.type_of_symbol(tp);
            if !self.related(s_ty, t_ty, Relation::Identity) {
                return false;
            }
        }
        if ignore_return_types {
            return true;
        }
        self.related(s_ret, t_ret, Relation::Identity)
    }

    fn some_index_related(&mut self, sources: &[SigId], target: SigId, rel: Relation) -> bool {
        let (t_params, t_ret, _) = self.sig_parts(target);
        let t_key = t_params
            .first()
            .map(|&p| self.r.type_of_symbol(p))
            .unwrap_or(TypeId::STRING);
        for source in sources.to_vec() {
            let (s_params, s_ret, _) = self.sig_parts(source);
            let s_key = s_params
                .first()
                .map(|&p| self.r.type_of_symbol(p))
                .unwrap_or(TypeId::STRING);
            if s_key == t_key && self.related(s_ret, t_ret, rel) {
                return true;
            }
        }
        false
    }

    fn sig_parts(&mut self, sig: SigId) -> (Vec<SymbolId>, TypeId, bool) {
        let record = self.r.types().sig(sig);
        let vararg = record.flags.contains(crate::types::SigFlags::HAS_VARARG);
        (record.params.clone(), record.ret, vararg)
    }

    fn required_param_count(&self, params: &[SymbolId]) -> usize {
        params
            .iter()
            .filter(|&&p| {
                let flags = self.r.symbols().get(p).flags;
                !flags.contains(SymbolFlags::OPTIONAL) && !flags.contains(SymbolFlags::REST)
            })
            .count()
    }

    /// Type of the parameter covering position `i`, unwrapping the
    /// element type of a trailing vararg array.
    fn param_type_at(&mut self, params: &[SymbolId], i: usize, vararg: bool) -> Option<TypeId> {
        if i < params.len() {
            let is_rest = self
                .r
                .symbols()
                .get(params[i])
                .flags
                .contains(SymbolFlags::REST);
            let ty = self.r.type_of_symbol(params[i]);
            if is_rest {
                return Some(self.r.types().element_type(ty).unwrap_or(TypeId::ANY));
            }
            return Some(ty);
        }
        if vararg {
            let last = *params.last()?;
            let ty = self.r.type_of_symbol(last);
            return Some(self.r.types().element_type(ty).unwrap_or(TypeId::ANY));
        }
        None
    }

    // ----- Structural identity -----

    fn identical_uncached(
        &mut self,
        source: TypeId,
        target: TypeId,
        source_data: &TypeData,
        target_data: &TypeData,
    ) -> bool {
        match (source_data, target_data) {
            // String literals compare by normalized text; interning
            // already collapsed equal texts to one id, so distinct ids
            // are distinct literals.
            (TypeData::StringLiteral(a), TypeData::StringLiteral(b)) => a == b,
            (TypeData::Array { element: a }, TypeData::Array { element: b }) => {
                self.related(*a, *b, Relation::Identity)
            }
            (a, b) if a.is_object_like() && b.is_object_like() => {
                // Class types are nominal; distinct ids were already
                // unequal unless they share a specialization root.
                if matches!(source_data, TypeData::Class) || matches!(target_data, TypeData::Class)
                {
                    return self.same_instantiation(source, target);
                }
                if self.same_instantiation(source, target) {
                    return true;
                }
                self.members_identical(source, target)
                    && self.members_identical(target, source)
                    && self.sig_groups_identical(source, target)
            }
            // Primitives, any, error, enums, and type parameters are
            // identity-only; equal ids were caught before dispatch.
            _ => false,
        }
    }

    /// Two instantiations of one root with identical argument lists are
    /// interchangeable even when pointer-sharing missed them.
    fn same_instantiation(&mut self, source: TypeId, target: TypeId) -> bool {
        let (s_root, s_args) = {
            let record = self.r.types().get(source);
            (record.root, record.type_args.clone())
        };
        let (t_root, t_args) = {
            let record = self.r.types().get(target);
            (record.root, record.type_args.clone())
        };
        let (Some(s_root), Some(t_root)) = (s_root, t_root) else {
            return false;
        };
        if s_root != t_root || s_args.len() != t_args.len() {
            return false;
        }
        s_args
            .into_iter()
            .zip(t_args)
            .all(|(a, b)| self.related(a, b, Relation::Identity))
    }

    fn members_identical(&mut self, source: TypeId, target: TypeId) -> bool {
        let target_shape = collect_shape(self.r, target);
        let source_shape = collect_shape(self.r, source);
        for (name, t_member) in target_shape.members {
            let Some(&s_member) = source_shape.members.get(&name) else {
                return false;
            };
            let t_flags = self.r.symbols().get(t_member).flags;
            let s_flags = self.r.symbols().get(s_member).flags;
            if t_flags.contains(SymbolFlags::OPTIONAL) != s_flags.contains(SymbolFlags::OPTIONAL) {
                return false;
            }
            let t_ty = self.r.type_of_symbol(t_member);
            let s_ty = self.r.type_of_symbol(s_member);
            if !self.related(s_ty, t_ty, Relation::Identity) {
                return false;
            }
        }
        true
    }

    /// Call/construct/index groups match pairwise, unordered.
    fn sig_groups_identical(&mut self, source: TypeId, target: TypeId) -> bool {
        let source_shape = collect_shape(self.r, source);
        let target_shape = collect_shape(self.r, target);
        self.sig_list_identical(&source_shape.calls, &target_shape.calls)
            && self.sig_list_identical(&source_shape.constructs, &target_shape.constructs)
            && self.sig_list_identical(&source_shape.indexes, &target_shape.indexes)
    }

    fn sig_list_identical(&mut self, source: &[SigId], target: &[SigId]) -> bool {
        if source.len() != target.len() {
            return false;
        }
        // Unordered matching; groups are small, quadratic probing is fine.
        let source = source.to_vec();
        for &t in target.to_vec().iter() {
            if !source
                .iter()
                .any(|&s| self.signatures_identical(s, t, false))
            {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Flattened shapes
// ---------------------------------------------------------------------------

/// Flattened view of a type: own members/signatures plus everything
/// inherited through `extends`/`implements`, derived entries shadowing
/// base ones.
#[derive(Debug, Default, Clone)]
pub struct Shape {
    pub members: indexmap::IndexMap<Atom, SymbolId>,
    pub calls: Vec<SigId>,
    pub constructs: Vec<SigId>,
    pub indexes: Vec<SigId>,
}

pub fn collect_shape(r: &mut dyn TypeResolver, ty: TypeId) -> Shape {
    let mut shape = Shape::default();
    let mut visited = Vec::new();
    collect_shape_into(r, ty, &mut shape, &mut visited);
    shape
}

fn collect_shape_into(
    r: &mut dyn TypeResolver,
    ty: TypeId,
    shape: &mut Shape,
    visited: &mut Vec<TypeId>,
) {
    if visited.contains(&ty) {
        return;
    }
    visited.push(ty);
    let (members, calls, constructs, indexes, bases) = {
        let record = r.types().get(ty);
        (
            record
                .members
                .iter()
                .map(|(&name, &sym)| (name, sym))
                .collect::<Vec<_>>(),
            record.call_sigs.clone(),
            record.construct_sigs.clone(),
            record.index_sigs.clone(),
            record
                .extends
                .iter()
                .chain(record.implements.iter())
                .copied()
                .collect::<Vec<_>>(),
        )
    };
    for (name, sym) in members {
        shape.members.entry(name).or_insert(sym);
    }
    shape.calls.extend(calls);
    shape.constructs.extend(constructs);
    shape.indexes.extend(indexes);
    for base in bases {
        collect_shape_into(r, base, shape, visited);
    }
}

/// Member lookup used by property access: searches the type's flattened
/// members, the synthesized `length` on arrays, the primitive wrapper
/// interfaces, and the universal object/function fallbacks.
pub fn find_member_type(r: &mut dyn TypeResolver, ty: TypeId, name: Atom) -> Option<TypeId> {
    let data = r.types().data(ty).clone();
    match data {
        TypeData::Any | TypeData::Error => Some(TypeId::ANY),
        TypeData::Array { .. } => {
            if r.interner().get("length") == Some(name) {
                return Some(TypeId::NUMBER);
            }
            lookup_on_global_object(r, name)
        }
        TypeData::Primitive(Prim::Number) | TypeData::Enum { .. } => {
            let wrapper = r.types().number_wrapper;
            lookup_on_wrapper(r, wrapper, name)
        }
        TypeData::Primitive(Prim::String) | TypeData::StringLiteral(_) => {
            let wrapper = r.types().string_wrapper;
            lookup_on_wrapper(r, wrapper, name)
        }
        TypeData::Primitive(Prim::Boolean) => {
            let wrapper = r.types().boolean_wrapper;
            lookup_on_wrapper(r, wrapper, name)
        }
        TypeData::TypeParameter { constraint } => {
            // The apparent members of a type parameter come from its
            // upper bound.
            match constraint {
                Some(bound) => find_member_type(r, bound, name),
                None => None,
            }
        }
        TypeData::Constructor if r.interner().get("prototype") == Some(name) => {
            r.types().get(ty).instance
        }
        _ if data.is_object_like() => {
            let shape = collect_shape(r, ty);
            if let Some(&member) = shape.members.get(&name) {
                return Some(r.type_of_symbol(member));
            }
            if !shape.calls.is_empty() || !shape.constructs.is_empty() {
                if let Some(function) = r.types().global_function {
                    if function != ty {
                        let function_shape = collect_shape(r, function);
                        if let Some(&member) = function_shape.members.get(&name) {
                            return Some(r.type_of_symbol(member));
                        }
                    }
                }
            }
            if r.types().global_object == Some(ty) {
                return None;
            }
            lookup_on_global_object(r, name)
        }
        _ => None,
    }
}

fn lookup_on_wrapper(
    r: &mut dyn TypeResolver,
    wrapper: Option<TypeId>,
    name: Atom,
) -> Option<TypeId> {
    if let Some(wrapper) = wrapper {
        let shape = collect_shape(r, wrapper);
        if let Some(&member) = shape.members.get(&name) {
            return Some(r.type_of_symbol(member));
        }
    }
    lookup_on_global_object(r, name)
}

fn lookup_on_global_object(r: &mut dyn TypeResolver, name: Atom) -> Option<TypeId> {
    let object = r.types().global_object?;
    let shape = collect_shape(r, object);
    let member = *shape.members.get(&name)?;
    Some(r.type_of_symbol(member))
}
