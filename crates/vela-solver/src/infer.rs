//! Type-argument inference.
//!
//! Walks each argument type against the corresponding parameter type of
//! a generic signature, collecting candidates wherever a bare type
//! parameter appears in the parameter's structure. Fixing picks the best
//! common type of each parameter's candidates and validates it against
//! the (substituted) declared constraint.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;
use vela_ast::NodeIndex;
use vela_common::diagnostic_messages as msg;

use crate::bct::find_best_common_type;
use crate::format::format_type;
use crate::relate::{RelationCheck, collect_shape};
use crate::resolver::TypeResolver;
use crate::specialize::Instantiator;
use crate::types::{SigId, TypeData, TypeId};

/// Candidate accumulator for one inference pass.
pub struct InferenceState {
    params: Vec<TypeId>,
    candidates: FxHashMap<TypeId, Vec<TypeId>>,
    /// Pairs already walked; recursive types re-reach the same pair.
    visited: FxHashSet<(TypeId, TypeId)>,
}

impl InferenceState {
    pub fn new(params: &[TypeId]) -> Self {
        Self {
            params: params.to_vec(),
            candidates: FxHashMap::default(),
            visited: FxHashSet::default(),
        }
    }

    pub fn is_inferred_param(&self, ty: TypeId) -> bool {
        self.params.contains(&ty)
    }

    pub fn add_candidate(&mut self, param: TypeId, candidate: TypeId) {
        let list = self.candidates.entry(param).or_default();
        if !list.contains(&candidate) {
            list.push(candidate);
        }
    }

    /// Fix each parameter to the best common type of its candidates
    /// (the dynamic type when none were collected), then check every
    /// fixed argument against its substituted constraint. A violated
    /// constraint is a diagnostic, not an abort: resolution continues
    /// with the unconstrained inferred argument.
    pub fn fix(&mut self, r: &mut dyn TypeResolver, call_node: NodeIndex) -> Vec<TypeId> {
        let mut args = Vec::with_capacity(self.params.len());
        for &param in &self.params {
            let inferred = match self.candidates.get(&param) {
                Some(candidates) if !candidates.is_empty() => {
                    let widened: Vec<TypeId> = candidates
                        .iter()
                        .map(|&c| widen_candidate(r, c))
                        .collect();
                    find_best_common_type(r, &widened)
                }
                _ => TypeId::ANY,
            };
            args.push(inferred);
        }
        // Constraints may mention sibling parameters, so substitute the
        // full inferred list before checking.
        let instantiator = Instantiator::new(&self.params, &args);
        for (i, &param) in self.params.iter().enumerate() {
            let TypeData::TypeParameter {
                constraint: Some(constraint),
            } = r.types().data(param).clone()
            else {
                continue;
            };
            let substituted = instantiator.substitute(r, constraint);
            let satisfied = {
                let mut check = RelationCheck::for_constraint_check(r);
                check.assignable(args[i], substituted)
            };
            if !satisfied {
                trace!(?param, inferred = ?args[i], "inferred argument violates constraint");
                let arg_text = format_type(r, args[i]);
                let constraint_text = format_type(r, substituted);
                r.post_error(
                    call_node,
                    &msg::TYPE_ARGUMENT_CONSTRAINT,
                    &[&arg_text, &constraint_text],
                );
            }
        }
        args
    }
}

/// Literal and nullable candidates widen before fixing; a call site
/// never fixes a parameter to one string literal.
fn widen_candidate(r: &dyn TypeResolver, ty: TypeId) -> TypeId {
    if matches!(r.types().data(ty), TypeData::StringLiteral(_)) {
        return TypeId::STRING;
    }
    if ty == TypeId::NULL || ty == TypeId::UNDEFINED {
        return TypeId::ANY;
    }
    ty
}

/// Infer type arguments for `sig` from the given argument types.
pub fn infer_type_arguments(
    r: &mut dyn TypeResolver,
    call_node: NodeIndex,
    sig: SigId,
    arg_types: &[TypeId],
) -> Vec<TypeId> {
    let (type_params, params) = {
        let record = r.types().sig(sig);
        (record.type_params.clone(), record.params.clone())
    };
    let mut state = InferenceState::new(&type_params);
    for (i, &arg_ty) in arg_types.iter().enumerate() {
        let Some(&param) = params.get(i).or(params.last()) else {
            continue;
        };
        let mut param_ty = r.type_of_symbol(param);
        if i >= params.len() || is_rest_param(r, param) {
            param_ty = r.types().element_type(param_ty).unwrap_or(param_ty);
        }
        relate_type_to_type_parameters(r, &mut state, arg_ty, param_ty);
    }
    state.fix(r, call_node)
}

fn is_rest_param(r: &dyn TypeResolver, param: vela_binder::SymbolId) -> bool {
    r.symbols()
        .get(param)
        .flags
        .contains(vela_binder::SymbolFlags::REST)
}

/// The structural walk: descend `source` and `target` in lockstep and
/// record `source` fragments wherever `target` is a bare inferred
/// parameter.
pub fn relate_type_to_type_parameters(
    r: &mut dyn TypeResolver,
    state: &mut InferenceState,
    source: TypeId,
    target: TypeId,
) {
    if state.is_inferred_param(target) {
        if source != TypeId::ERROR {
            state.add_candidate(target, source);
        }
        return;
    }
    if source == target || !state.visited.insert((source, target)) {
        return;
    }
    match (
        r.types().data(source).clone(),
        r.types().data(target).clone(),
    ) {
        (TypeData::Array { element: se }, TypeData::Array { element: te }) => {
            relate_type_to_type_parameters(r, state, se, te);
        }
        (s, t) if s.is_object_like() && t.is_object_like() => {
            // Two instantiations of the same root infer pairwise on
            // their argument lists; anything else matches structurally.
            let (s_root, s_args) = {
                let record = r.types().get(source);
                (record.root, record.type_args.clone())
            };
            let (t_root, t_args) = {
                let record = r.types().get(target);
                (record.root, record.type_args.clone())
            };
            if let (Some(s_root), Some(t_root)) = (s_root, t_root) {
                if s_root == t_root && s_args.len() == t_args.len() {
                    for (sa, ta) in s_args.into_iter().zip(t_args) {
                        relate_type_to_type_parameters(r, state, sa, ta);
                    }
                    return;
                }
            }
            relate_members_to_type_parameters(r, state, source, target);
        }
        _ => {}
    }
}

fn relate_members_to_type_parameters(
    r: &mut dyn TypeResolver,
    state: &mut InferenceState,
    source: TypeId,
    target: TypeId,
) {
    let source_shape = collect_shape(r, source);
    let target_shape = collect_shape(r, target);

    for (name, t_member) in target_shape.members.clone() {
        let Some(&s_member) = source_shape.members.get(&name) else {
            continue;
        };
        let s_ty = r.type_of_symbol(s_member);
        let t_ty = r.type_of_symbol(t_member);
        relate_type_to_type_parameters(r, state, s_ty, t_ty);
    }

    for (s_sig, t_sig) in source_shape.calls.iter().zip(target_shape.calls.iter()) {
        relate_signature_to_type_parameters(r, state, *s_sig, *t_sig);
    }
    for (s_sig, t_sig) in source_shape
        .constructs
        .iter()
        .zip(target_shape.constructs.iter())
    {
        relate_signature_to_type_parameters(r, state, *s_sig, *t_sig);
    }
    for (s_sig, t_sig) in source_shape.indexes.iter().zip(target_shape.indexes.iter()) {
        relate_signature_to_type_parameters(r, state, *s_sig, *t_sig);
    }
}

fn relate_signature_to_type_parameters(
    r: &mut dyn TypeResolver,
    state: &mut InferenceState,
    source: SigId,
    target: SigId,
) {
    let (s_params, s_ret) = {
        let record = r.types().sig(source);
        (record.params.clone(), record.ret)
    };
    let (t_params, t_ret) = {
        let record = r.types().sig(target);
        (record.params.clone(), record.ret)
    };
    for (&s_param, &t_param) in s_params.iter().zip(t_params.iter()) {
        let s_ty = r.type_of_symbol(s_param);
        let t_ty = r.type_of_symbol(t_param);
        relate_type_to_type_parameters(r, state, s_ty, t_ty);
    }
    relate_type_to_type_parameters(r, state, s_ret, t_ret);
}
