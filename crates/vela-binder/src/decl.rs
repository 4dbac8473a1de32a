//! The declaration scaffold.
//!
//! A `Decl` binds one syntax-tree position to a (possibly unresolved)
//! symbol. Decls form a tree per unit; the name resolver walks the
//! parent chain outward to global scope. The store is append-only for a
//! session so `DeclId`s stay stable.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vela_ast::NodeIndex;
use vela_common::{Atom, UnitId};

use crate::symbol::SymbolId;

/// Index of a decl within a `DeclStore`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// Root scope of one compilation unit.
    Unit,
    Variable,
    Parameter,
    Function,
    /// Synthesized for a function expression met mid-resolution.
    FunctionExpr,
    Class,
    Interface,
    Enum,
    EnumMember,
    Module,
    Property,
    Method,
    Constructor,
    TypeParam,
    /// Synthesized for an object literal met mid-resolution.
    ObjectLiteral,
    /// Synthesized for an inline object-type literal.
    ObjectTypeLiteral,
    /// Call/construct/index signature member of an interface or
    /// object-type literal.
    SignatureMember,
}

impl DeclKind {
    /// Function-like decls open a local scope searched before walking out.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            DeclKind::Function
                | DeclKind::FunctionExpr
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::SignatureMember
        )
    }

    /// Containers can merge across multiple physical declarations.
    pub fn is_container(self) -> bool {
        matches!(self, DeclKind::Module | DeclKind::Unit)
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct DeclFlags: u32 {
        const EXPORTED = 1 << 0;
        const STATIC = 1 << 1;
        const PRIVATE = 1 << 2;
        const OPTIONAL = 1 << 3;
        const REST = 1 << 4;
        /// Overload-declaration-only signature (no body).
        const OVERLOAD_ONLY = 1 << 5;
    }
}

#[derive(Debug)]
pub struct Decl {
    pub name: Atom,
    pub kind: DeclKind,
    pub flags: DeclFlags,
    pub node: NodeIndex,
    pub unit: UnitId,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Default)]
pub struct DeclStore {
    decls: Vec<Decl>,
    by_node: FxHashMap<(UnitId, NodeIndex), DeclId>,
}

impl DeclStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decl, linking it into its parent's child list.
    pub fn add(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.by_node.insert((decl.unit, decl.node), id);
        if let Some(parent) = decl.parent {
            self.decls[parent.0 as usize].children.push(id);
        }
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    pub fn decl_of_node(&self, unit: UnitId, node: NodeIndex) -> Option<DeclId> {
        self.by_node.get(&(unit, node)).copied()
    }

    pub fn set_symbol(&mut self, id: DeclId, symbol: SymbolId) {
        self.decls[id.0 as usize].symbol = Some(symbol);
    }

    pub fn children(&self, id: DeclId) -> &[DeclId] {
        &self.decls[id.0 as usize].children
    }

    /// Enclosing-declaration path from `id` outward to the unit root.
    pub fn path_to_root(&self, id: DeclId) -> SmallVec<[DeclId; 8]> {
        let mut path = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(decl_id) = cursor {
            path.push(decl_id);
            cursor = self.get(decl_id).parent;
        }
        path
    }

    /// Direct children of `parent` named `name`.
    pub fn find_children_named(&self, parent: DeclId, name: Atom) -> SmallVec<[DeclId; 2]> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| self.get(c).name == name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }
}
