//! Call and `new` resolution.
//!
//! Candidates are tried in declaration order and classified into two
//! buckets: exact (every natural argument type identical to its
//! parameter, literal-aware) and convertible (assignable only). An
//! exact candidate always beats a convertible one; a bucket with more
//! than one survivor goes through pairwise most-applicable reduction,
//! with declaration order breaking the remaining ties. Literal
//! arguments are re-resolved under each convertible candidate's
//! parameter types provisionally — the trial result is read, then
//! evicted, so a failed candidate leaves no trace in the per-node
//! cache. Only the winning candidate's contextual types are committed.

use tracing::debug;
use vela_ast::NodeIndex;
use vela_binder::{SymbolFlags, SymbolId};
use vela_common::diagnostic_messages as msg;

use crate::format::format_type;
use crate::infer::infer_type_arguments;
use crate::relate::{RelationCheck, collect_shape};
use crate::resolver::ExprResolver;
use crate::specialize::{Instantiator, specialize_signature};
use crate::types::{SigFlags, SigId, TypeData, TypeId};

/// Outcome of resolving one call site.
#[derive(Debug, Clone)]
pub struct CallResolution {
    /// The chosen (possibly specialized) signature, when one exists.
    pub sig: Option<SigId>,
    pub ret: TypeId,
    /// Type arguments the signature was specialized with, explicit or
    /// inferred. Empty for non-generic signatures.
    pub type_args: Vec<TypeId>,
}

impl CallResolution {
    fn dynamic() -> Self {
        Self {
            sig: None,
            ret: TypeId::ANY,
            type_args: Vec::new(),
        }
    }

    fn error() -> Self {
        Self {
            sig: None,
            ret: TypeId::ERROR,
            type_args: Vec::new(),
        }
    }
}

/// Reusable per-call working storage. Call resolution nests (an
/// argument may itself contain a call), so records are pooled and
/// checked out per call rather than kept as resolver fields.
#[derive(Debug, Default)]
pub struct ScratchRecord {
    pub candidates: Vec<SigId>,
    pub trials: Vec<Trial>,
    pub arg_types: Vec<TypeId>,
    pub exact: Vec<usize>,
    pub convertible: Vec<usize>,
}

/// A candidate with generics already applied.
#[derive(Debug, Clone)]
pub struct Trial {
    pub original: SigId,
    pub sig: SigId,
    pub type_args: Vec<TypeId>,
}

impl ScratchRecord {
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.trials.clear();
        self.arg_types.clear();
        self.exact.clear();
        self.convertible.clear();
    }
}

/// Free-list of scratch records, stack-disciplined: the record taken
/// last is returned first as nested calls unwind.
#[derive(Debug, Default)]
pub struct ScratchPool {
    free: Vec<ScratchRecord>,
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> ScratchRecord {
        self.free.pop().unwrap_or_default()
    }

    pub fn put(&mut self, mut record: ScratchRecord) {
        record.clear();
        self.free.push(record);
    }
}

/// Resolve a call or `new` expression against `callee_ty`.
pub fn resolve_call(
    r: &mut dyn ExprResolver,
    call_node: NodeIndex,
    callee_ty: TypeId,
    is_new: bool,
    explicit_type_args: &[TypeId],
    arg_nodes: &[NodeIndex],
) -> CallResolution {
    // A dynamic callee swallows the call; arguments still get checked
    // in their natural form by the caller's argument walk.
    if matches!(
        r.types().data(callee_ty),
        TypeData::Any | TypeData::Error
    ) {
        return CallResolution::dynamic();
    }

    let mut scratch = r.scratch_take();
    let resolution = resolve_call_with(r, &mut scratch, call_node, callee_ty, is_new, explicit_type_args, arg_nodes);
    r.scratch_put(scratch);
    resolution
}

fn resolve_call_with(
    r: &mut dyn ExprResolver,
    scratch: &mut ScratchRecord,
    call_node: NodeIndex,
    callee_ty: TypeId,
    is_new: bool,
    explicit_type_args: &[TypeId],
    arg_nodes: &[NodeIndex],
) -> CallResolution {
    collect_candidates(r, scratch, callee_ty, is_new);
    if scratch.candidates.is_empty() {
        let message = if is_new {
            &msg::NOT_CONSTRUCTABLE
        } else {
            &msg::NOT_CALLABLE
        };
        r.post_error(call_node, message, &[]);
        return CallResolution::error();
    }

    // Natural argument types drive inference and non-retypable checks.
    scratch.arg_types.clear();
    for &arg in arg_nodes {
        let ty = r.type_of_expr(arg);
        scratch.arg_types.push(ty);
    }

    apply_generics(r, scratch, call_node, explicit_type_args);
    if scratch.trials.is_empty() {
        // Every candidate rejected its explicit type-argument count.
        let first = scratch.candidates[0];
        let expected = r.types().sig(first).type_params.len().to_string();
        let callee_name = {
            let atom = r.types().get(callee_ty).name;
            r.interner().resolve(atom).to_string()
        };
        r.post_error(
            call_node,
            &msg::WRONG_TYPE_ARGUMENT_COUNT,
            &[&callee_name, &expected],
        );
        return CallResolution::error();
    }

    classify_candidates(r, scratch, arg_nodes);

    let bucket = if scratch.exact.is_empty() {
        scratch.convertible.clone()
    } else {
        scratch.exact.clone()
    };
    let winner = match bucket.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => {
            let (best, ambiguous) = most_applicable(r, scratch, &bucket, arg_nodes.len());
            if ambiguous {
                r.post_error(call_node, &msg::AMBIGUOUS_OVERLOAD, &[]);
            }
            Some(best)
        }
    };

    match winner {
        Some(index) => {
            let trial = scratch.trials[index].clone();
            commit_arguments(r, trial.sig, arg_nodes, &scratch.arg_types, true);
            debug!(?call_node, sig = ?trial.sig, "call resolved");
            let ret = r.types().sig(trial.sig).ret;
            CallResolution {
                sig: Some(trial.sig),
                ret,
                type_args: trial.type_args,
            }
        }
        None if scratch.trials.len() == 1 => {
            // Single candidate: commit against it and let the per-arg
            // diagnostics name the mismatch precisely. An argument-count
            // mismatch has no offending argument to point at, so it gets
            // the call-level diagnostic instead.
            let trial = scratch.trials[0].clone();
            if !arity_accepts(r, trial.sig, arg_nodes.len()) {
                r.post_error(call_node, &msg::NO_OVERLOAD_MATCHES, &[]);
            }
            commit_arguments(r, trial.sig, arg_nodes, &scratch.arg_types, true);
            let ret = r.types().sig(trial.sig).ret;
            CallResolution {
                sig: Some(trial.sig),
                ret,
                type_args: trial.type_args,
            }
        }
        None => {
            r.post_error(call_node, &msg::NO_OVERLOAD_MATCHES, &[]);
            // Commit against the first candidate without per-arg noise
            // so downstream resolution keeps a concrete shape.
            let trial = scratch.trials[0].clone();
            commit_arguments(r, trial.sig, arg_nodes, &scratch.arg_types, false);
            let ret = r.types().sig(trial.sig).ret;
            CallResolution {
                sig: Some(trial.sig),
                ret,
                type_args: trial.type_args,
            }
        }
    }
}

/// Candidate signatures in declaration order. When overload
/// declarations exist, the implementation signature is not a candidate.
fn collect_candidates(
    r: &mut dyn ExprResolver,
    scratch: &mut ScratchRecord,
    callee_ty: TypeId,
    is_new: bool,
) {
    let sigs = if is_new {
        // A type's own construct signatures shadow inherited ones;
        // otherwise a synthesized default constructor would compete
        // with the base constructor it stands in for.
        let own = r.types().get(callee_ty).construct_sigs.clone();
        if own.is_empty() {
            collect_shape(r, callee_ty).constructs
        } else {
            own
        }
    } else {
        collect_shape(r, callee_ty).calls
    };
    let has_overloads = sigs.iter().any(|&s| {
        !r.types().sig(s).flags.contains(SigFlags::DEFINITION)
    });
    scratch.candidates.clear();
    for sig in sigs {
        if has_overloads && r.types().sig(sig).flags.contains(SigFlags::DEFINITION) {
            continue;
        }
        scratch.candidates.push(sig);
    }
}

/// Specialize each generic candidate: explicit type arguments when
/// given (wrong arity rejects the candidate), otherwise inference from
/// the natural argument types.
fn apply_generics(
    r: &mut dyn ExprResolver,
    scratch: &mut ScratchRecord,
    call_node: NodeIndex,
    explicit_type_args: &[TypeId],
) {
    scratch.trials.clear();
    let candidates = scratch.candidates.clone();
    let arg_types = scratch.arg_types.clone();
    for original in candidates {
        let type_params = r.types().sig(original).type_params.clone();
        if type_params.is_empty() {
            if explicit_type_args.is_empty() {
                scratch.trials.push(Trial {
                    original,
                    sig: original,
                    type_args: Vec::new(),
                });
            }
            continue;
        }
        let type_args = if !explicit_type_args.is_empty() {
            if explicit_type_args.len() != type_params.len() {
                continue;
            }
            check_explicit_constraints(r, call_node, &type_params, explicit_type_args);
            explicit_type_args.to_vec()
        } else {
            infer_type_arguments(r, call_node, original, &arg_types)
        };
        let instantiator = Instantiator::new(&type_params, &type_args);
        let sig = specialize_signature(r, original, &instantiator);
        scratch.trials.push(Trial {
            original,
            sig,
            type_args,
        });
    }
}

fn check_explicit_constraints(
    r: &mut dyn ExprResolver,
    call_node: NodeIndex,
    type_params: &[TypeId],
    type_args: &[TypeId],
) {
    let instantiator = Instantiator::new(type_params, type_args);
    for (&param, &arg) in type_params.iter().zip(type_args.iter()) {
        let TypeData::TypeParameter {
            constraint: Some(constraint),
        } = r.types().data(param).clone()
        else {
            continue;
        };
        let substituted = instantiator.substitute(r, constraint);
        let satisfied = {
            let mut check = RelationCheck::for_constraint_check(r);
            check.assignable(arg, substituted)
        };
        if !satisfied {
            let arg_text = format_type(r, arg);
            let constraint_text = format_type(r, substituted);
            r.post_error(
                call_node,
                &msg::TYPE_ARGUMENT_CONSTRAINT,
                &[&arg_text, &constraint_text],
            );
        }
    }
}

/// Sort applicable candidates into the exact and convertible buckets.
/// Exactness is judged on the arguments as written; contextual trials
/// only run for the convertible bucket.
fn classify_candidates(r: &mut dyn ExprResolver, scratch: &mut ScratchRecord, arg_nodes: &[NodeIndex]) {
    scratch.exact.clear();
    scratch.convertible.clear();
    let trials = scratch.trials.clone();
    let natural = scratch.arg_types.clone();
    for (index, trial) in trials.iter().enumerate() {
        if !arity_accepts(r, trial.sig, arg_nodes.len()) {
            continue;
        }
        if is_exact_match(r, trial.sig, &natural) {
            scratch.exact.push(index);
        } else if is_convertible(r, trial.sig, arg_nodes, &natural) {
            scratch.convertible.push(index);
        }
    }
}

/// Literal-aware identity of every natural argument type against the
/// candidate's parameter types. A string-literal argument is not an
/// exact match for `string`, and nothing is an exact match for `any`
/// except `any` itself.
fn is_exact_match(r: &mut dyn ExprResolver, sig: SigId, natural: &[TypeId]) -> bool {
    let (params, vararg) = sig_params(r, sig);
    for (i, &arg_ty) in natural.iter().enumerate() {
        let Some(param_ty) = param_type_for_arg(r, &params, i, vararg) else {
            return false;
        };
        let identical = {
            let mut check = RelationCheck::new(r);
            check.identical(arg_ty, param_ty)
        };
        if !identical {
            return false;
        }
    }
    true
}

/// One convertibility trial. Retypable arguments are resolved
/// provisionally under the parameter type and evicted immediately
/// after.
fn is_convertible(
    r: &mut dyn ExprResolver,
    sig: SigId,
    arg_nodes: &[NodeIndex],
    natural: &[TypeId],
) -> bool {
    let (params, vararg) = sig_params(r, sig);
    for (i, &arg) in arg_nodes.iter().enumerate() {
        let Some(param_ty) = param_type_for_arg(r, &params, i, vararg) else {
            return false;
        };
        let arg_ty = if r.is_retypable(arg) && param_ty != TypeId::ANY {
            let trial_ty = r.type_of_expr_contextual(arg, param_ty, true);
            r.invalidate_node(arg);
            trial_ty
        } else {
            natural[i]
        };
        let assignable = {
            let mut check = RelationCheck::new(r);
            check.assignable(arg_ty, param_ty)
        };
        if !assignable {
            return false;
        }
    }
    true
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Preference {
    First,
    Second,
    Tie,
    Ambiguous,
}

/// Pairwise most-applicable reduction over one bucket. The running best
/// candidate is challenged by each later one; declaration order keeps
/// the earlier candidate on a tie, and a pair that cannot be separated
/// at all flags the call ambiguous.
fn most_applicable(
    r: &mut dyn ExprResolver,
    scratch: &ScratchRecord,
    bucket: &[usize],
    arg_count: usize,
) -> (usize, bool) {
    let mut best = bucket[0];
    let mut ambiguous = false;
    for &challenger in &bucket[1..] {
        match prefer(r, scratch, best, challenger, arg_count) {
            Preference::First | Preference::Tie => {}
            Preference::Second => {
                best = challenger;
                ambiguous = false;
            }
            Preference::Ambiguous => ambiguous = true,
        }
    }
    (best, ambiguous)
}

/// Which of two applicable candidates is more applicable: per argument
/// position a strictly narrower parameter type wins, then a parameter
/// identical to the argument's natural type; an otherwise tied pair is
/// separated by whichever return type merges into the other's.
fn prefer(
    r: &mut dyn ExprResolver,
    scratch: &ScratchRecord,
    a: usize,
    b: usize,
    arg_count: usize,
) -> Preference {
    let sig_a = scratch.trials[a].sig;
    let sig_b = scratch.trials[b].sig;
    let (params_a, vararg_a) = sig_params(r, sig_a);
    let (params_b, vararg_b) = sig_params(r, sig_b);
    let mut votes_a = 0usize;
    let mut votes_b = 0usize;
    for i in 0..arg_count {
        let (Some(pa), Some(pb)) = (
            param_type_for_arg(r, &params_a, i, vararg_a),
            param_type_for_arg(r, &params_b, i, vararg_b),
        ) else {
            continue;
        };
        if pa == pb {
            continue;
        }
        let a_narrower = {
            let mut check = RelationCheck::new(r);
            check.subtype(pa, pb)
        };
        let b_narrower = {
            let mut check = RelationCheck::new(r);
            check.subtype(pb, pa)
        };
        if a_narrower != b_narrower {
            if a_narrower {
                votes_a += 1;
            } else {
                votes_b += 1;
            }
            continue;
        }
        let natural = scratch.arg_types[i];
        let a_identical = {
            let mut check = RelationCheck::new(r);
            check.identical(pa, natural)
        };
        let b_identical = {
            let mut check = RelationCheck::new(r);
            check.identical(pb, natural)
        };
        if a_identical != b_identical {
            if a_identical {
                votes_a += 1;
            } else {
                votes_b += 1;
            }
        }
    }
    if votes_a > 0 && votes_b == 0 {
        return Preference::First;
    }
    if votes_b > 0 && votes_a == 0 {
        return Preference::Second;
    }
    let ret_a = r.types().sig(sig_a).ret;
    let ret_b = r.types().sig(sig_b).ret;
    let returns_identical = {
        let mut check = RelationCheck::new(r);
        check.identical(ret_a, ret_b)
    };
    if returns_identical {
        return Preference::Tie;
    }
    let a_ret_narrower = {
        let mut check = RelationCheck::new(r);
        check.subtype(ret_a, ret_b)
    };
    let b_ret_narrower = {
        let mut check = RelationCheck::new(r);
        check.subtype(ret_b, ret_a)
    };
    if a_ret_narrower != b_ret_narrower {
        if a_ret_narrower {
            return Preference::First;
        }
        return Preference::Second;
    }
    Preference::Ambiguous
}

fn sig_params(r: &dyn ExprResolver, sig: SigId) -> (Vec<SymbolId>, bool) {
    let record = r.types().sig(sig);
    (
        record.params.clone(),
        record.flags.contains(SigFlags::HAS_VARARG),
    )
}

/// Commit the winning signature: re-resolve retypable arguments under
/// their final contextual types (cached this time) and post per-arg
/// assignability errors.
fn commit_arguments(
    r: &mut dyn ExprResolver,
    sig: SigId,
    arg_nodes: &[NodeIndex],
    natural: &[TypeId],
    post_errors: bool,
) {
    let (params, vararg) = {
        let record = r.types().sig(sig);
        (
            record.params.clone(),
            record.flags.contains(SigFlags::HAS_VARARG),
        )
    };
    for (i, &arg) in arg_nodes.iter().enumerate() {
        let Some(param_ty) = param_type_for_arg(r, &params, i, vararg) else {
            continue;
        };
        let arg_ty = if r.is_retypable(arg) && param_ty != TypeId::ANY {
            r.type_of_expr_contextual(arg, param_ty, false)
        } else {
            natural[i]
        };
        let assignable = {
            let mut check = RelationCheck::new(r);
            check.assignable(arg_ty, param_ty)
        };
        if !assignable && post_errors {
            let arg_text = format_type(r, arg_ty);
            let param_text = format_type(r, param_ty);
            r.post_error(arg, &msg::ARGUMENT_NOT_ASSIGNABLE, &[&arg_text, &param_text]);
        }
    }
}

fn arity_accepts(r: &dyn ExprResolver, sig: SigId, arg_count: usize) -> bool {
    let record = r.types().sig(sig);
    let vararg = record.flags.contains(SigFlags::HAS_VARARG);
    let params = record.params.clone();
    arg_count >= required_count(r, &params) && (vararg || arg_count <= params.len())
}

fn required_count(r: &dyn ExprResolver, params: &[SymbolId]) -> usize {
    params
        .iter()
        .filter(|&&p| {
            let flags = r.symbols().get(p).flags;
            !flags.contains(SymbolFlags::OPTIONAL) && !flags.contains(SymbolFlags::REST)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_pool_recycles_cleared_records() {
        let mut pool = ScratchPool::new();
        let mut record = pool.take();
        record.arg_types.push(TypeId::ANY);
        record.exact.push(0);
        pool.put(record);
        let reused = pool.take();
        assert!(reused.arg_types.is_empty());
        assert!(reused.exact.is_empty());
    }
}

/// Parameter type covering argument position `i`, unwrapping a trailing
/// vararg's element type.
fn param_type_for_arg(
    r: &mut dyn ExprResolver,
    params: &[SymbolId],
    i: usize,
    vararg: bool,
) -> Option<TypeId> {
    if i < params.len() {
        let is_rest = r.symbols().get(params[i]).flags.contains(SymbolFlags::REST);
        let ty = r.type_of_symbol(params[i]);
        if is_rest {
            return Some(r.types().element_type(ty).unwrap_or(TypeId::ANY));
        }
        return Some(ty);
    }
    if vararg {
        let last = *params.last()?;
        let ty = r.type_of_symbol(last);
        return Some(r.types().element_type(ty).unwrap_or(TypeId::ANY));
    }
    None
}
