//! Type-relation and type-resolution engine for the Vela compiler.
//!
//! This crate is the semantic core's demand-driven half:
//!
//! - **`types`**: the arena of type symbols and signatures (`TypeId`,
//!   `SigId`, `TypeTable`), with interned array and string-literal types
//! - **`relate`**: identity, subtyping, and assignability on one
//!   recursive core, with ordered-pair caches and an optimistic
//!   pending-`true` convention so recursive types terminate
//! - **`specialize`**: generic instantiation with a per-root cache
//! - **`infer`**: type-argument inference from call-site arguments
//! - **`overload`**: candidate classification (exact beats convertible)
//!   with provisional contextual re-resolution of literal arguments
//! - **`bct`**: best-common-type merging for literals and returns
//!
//! The crate never resolves expressions itself: the checker implements
//! the [`TypeResolver`]/[`ExprResolver`] seams and the engines call back
//! through them, so re-entrant resolution stays on one stack.

pub mod bct;
pub mod context;
pub mod format;
pub mod infer;
pub mod overload;
pub mod relate;
pub mod resolver;
pub mod specialize;
pub mod types;

pub use bct::{find_best_common_type, merge_ordered};
pub use context::{ContextualEntry, ResolutionContext};
pub use format::format_type;
pub use infer::{InferenceState, infer_type_arguments, relate_type_to_type_parameters};
pub use overload::{CallResolution, ScratchPool, ScratchRecord, resolve_call};
pub use relate::{
    MAX_RELATION_DEPTH, Relation, RelationCache, RelationCheck, Shape, collect_shape,
    find_member_type,
};
pub use resolver::{ExprResolver, TypeResolver};
pub use specialize::{Instantiator, specialize_signature, specialize_to_any, specialize_type};
pub use types::{Prim, SigFlags, SigId, Signature, TypeData, TypeId, TypeSymbol, TypeTable};
