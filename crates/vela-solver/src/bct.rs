//! Best-common-type selection.
//!
//! Used for array-literal element types, conditional branches, inferred
//! return types, and fixing inference candidates: pick the candidate
//! every other candidate is a subtype of; when no candidate dominates,
//! fall back to a fresh empty object type rather than erroring.

use crate::relate::RelationCheck;
use crate::resolver::TypeResolver;
use crate::types::{TypeData, TypeId, TypeSymbol};

/// The candidate that every other candidate is a subtype of, or a fresh
/// empty object type when none dominates. An empty list yields the
/// dynamic type. The dynamic type absorbs the whole merge,
/// `null`/`undefined`/`void` candidates widen toward the other
/// operands, and all-array candidate sets merge element-wise.
pub fn find_best_common_type(r: &mut dyn TypeResolver, candidates: &[TypeId]) -> TypeId {
    let mut candidates = merge_ordered(candidates);
    if candidates.contains(&TypeId::ANY) {
        return TypeId::ANY;
    }
    if candidates.len() > 1 {
        let concrete: Vec<TypeId> = candidates
            .iter()
            .copied()
            .filter(|&t| t != TypeId::NULL && t != TypeId::UNDEFINED && t != TypeId::VOID)
            .collect();
        if !concrete.is_empty() {
            candidates = concrete;
        }
    }
    match candidates.as_slice() {
        [] => TypeId::ANY,
        [only] => *only,
        _ => {
            if candidates
                .iter()
                .all(|&t| matches!(r.types().data(t), TypeData::Array { .. }))
            {
                return merge_arrays(r, &candidates);
            }
            for &seed in &candidates {
                let mut dominates = true;
                for &other in &candidates {
                    if other == seed {
                        continue;
                    }
                    let mut check = RelationCheck::new(r);
                    if !check.subtype(other, seed) {
                        dominates = false;
                        break;
                    }
                }
                if dominates {
                    return seed;
                }
            }
            empty_object_type(r)
        }
    }
}

/// Deduplicate by identity, preserving first-occurrence order so the
/// seed preference stays deterministic.
pub fn merge_ordered(types: &[TypeId]) -> Vec<TypeId> {
    let mut merged = Vec::with_capacity(types.len());
    for &ty in types {
        if !merged.contains(&ty) {
            merged.push(ty);
        }
    }
    merged
}

fn merge_arrays(r: &mut dyn TypeResolver, arrays: &[TypeId]) -> TypeId {
    let elements: Vec<TypeId> = arrays
        .iter()
        .filter_map(|&t| r.types().element_type(t))
        .collect();
    let element = find_best_common_type(r, &elements);
    let element_name = {
        let atom = r.types().get(element).name;
        r.interner().resolve(atom).to_string()
    };
    let name = r.interner_mut().intern(&format!("{element_name}[]"));
    r.types_mut().array_of(element, name)
}

fn empty_object_type(r: &mut dyn TypeResolver) -> TypeId {
    let name = r.interner_mut().intern("{}");
    r.types_mut()
        .alloc(TypeSymbol::new(name, TypeData::Interface))
}
