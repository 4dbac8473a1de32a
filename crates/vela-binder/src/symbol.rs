//! Symbols: named, resolvable program entities.
//!
//! A symbol is created unresolved by the binder and mutated in place by
//! the resolver. Resolution state is a first-class enum rather than
//! boolean flags: the `CycleFallback` state records that a cycle was hit
//! and the dynamic type was served, which two booleans under-model.

use smallvec::SmallVec;
use vela_common::Atom;

use crate::decl::DeclId;

/// Index of a symbol within a `SymbolArena`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Property,
    Function,
    Method,
    Class,
    Interface,
    Enum,
    EnumMember,
    Module,
    TypeParam,
}

impl SymbolKind {
    /// Does the symbol participate in the value namespace?
    pub fn is_value(self) -> bool {
        matches!(
            self,
            SymbolKind::Variable
                | SymbolKind::Parameter
                | SymbolKind::Property
                | SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Class
                | SymbolKind::Enum
                | SymbolKind::EnumMember
                | SymbolKind::Module
        )
    }

    /// Does the symbol participate in the type namespace?
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::TypeParam
                | SymbolKind::Module
        )
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u32 {
        const EXPORTED = 1 << 0;
        const STATIC = 1 << 1;
        const PRIVATE = 1 << 2;
        const OPTIONAL = 1 << 3;
        const REST = 1 << 4;
    }
}

/// Per-symbol resolution lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResolveState {
    Unresolved,
    InResolution,
    /// A cycle was detected while this symbol was in resolution and the
    /// dynamic type was served to the re-entrant caller.
    CycleFallback,
    Resolved,
}

#[derive(Debug)]
pub struct Symbol {
    pub name: Atom,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    /// Physical declarations. Overload signatures and module-merge
    /// fragments all point here.
    pub decls: SmallVec<[DeclId; 2]>,
    pub state: ResolveState,
    pub has_error: bool,
}

impl Symbol {
    pub fn new(name: Atom, kind: SymbolKind, flags: SymbolFlags) -> Self {
        Self {
            name,
            kind,
            flags,
            decls: SmallVec::new(),
            state: ResolveState::Unresolved,
            has_error: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ResolveState::Resolved | ResolveState::CycleFallback)
    }
}

#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn name(&self, id: SymbolId) -> Atom {
        self.get(id).name
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }
}
