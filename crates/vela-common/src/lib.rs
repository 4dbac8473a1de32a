//! Common types and utilities for the Vela compiler.
//!
//! This crate provides foundational types used across all vela crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics (codes, message templates, `Diagnostic`, `DiagnosticSink`)

pub mod diagnostics;
pub mod interner;
pub mod span;

pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, DiagnosticSink, RelatedInformation,
    diagnostic_messages, format_message,
};
pub use interner::{Atom, Interner};
pub use span::Span;

/// Identifies one compilation unit within a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Sentinel for "no unit"; never handed out by a session.
    pub const INVALID: Self = Self(u32::MAX);
}
