//! The arena of type symbols and signatures.
//!
//! Types are records addressed by `TypeId` rather than references, so
//! the intentionally cyclic type graph (recursive generics, mutually
//! extending interfaces) needs no ownership gymnastics and the relation
//! caches can key on ordered id pairs.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use vela_binder::{DeclId, SymbolId};
use vela_common::Atom;

/// Index of a type symbol within a `TypeTable`.
///
/// The dynamic type, the error pseudo-type, and the primitives are
/// pre-seeded singletons with fixed ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The dynamic type: compatible with everything, absorbs failures.
    pub const ANY: Self = Self(0);
    /// Error pseudo-type; relations treat it like `any` so one bad
    /// symbol cannot cascade.
    pub const ERROR: Self = Self(1);
    pub const NUMBER: Self = Self(2);
    pub const STRING: Self = Self(3);
    pub const BOOLEAN: Self = Self(4);
    pub const VOID: Self = Self(5);
    pub const NULL: Self = Self(6);
    pub const UNDEFINED: Self = Self(7);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prim {
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
}

/// Closed tag over the kinds of type a type symbol can represent.
/// Relation functions pattern-match on this instead of scattering
/// reference-identity checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeData {
    Any,
    Error,
    Primitive(Prim),
    StringLiteral(Atom),
    /// Instance type of a class. Nominal brand comes from the symbol.
    Class,
    /// Interfaces, object-type literals, and function types.
    Interface,
    Array {
        element: TypeId,
    },
    Enum {
        /// The primitive the members are represented as.
        backing: TypeId,
    },
    TypeParameter {
        constraint: Option<TypeId>,
    },
    /// Constructor/static side of a class (the value of the class name).
    Constructor,
    /// Instance type of a module/namespace.
    Container,
}

impl TypeData {
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            TypeData::Class | TypeData::Interface | TypeData::Constructor | TypeData::Container
        )
    }
}

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct SigFlags: u32 {
        /// Has a body (an implementation, not an overload declaration).
        const DEFINITION = 1 << 0;
        const HAS_VARARG = 1 << 1;
        const HAS_GENERIC_PARAM = 1 << 2;
    }
}

/// Index of a signature within a `TypeTable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SigId(pub u32);

/// One call/construct/index shape.
///
/// Parameter symbols carry their optional/vararg flags; parameter types
/// live in the table's symbol-type map like every other symbol type.
#[derive(Clone, Debug)]
pub struct Signature {
    pub params: Vec<SymbolId>,
    pub ret: TypeId,
    pub type_params: Vec<TypeId>,
    pub flags: SigFlags,
    pub decl: Option<DeclId>,
}

/// A symbol specialized to represent a type.
#[derive(Debug)]
pub struct TypeSymbol {
    pub name: Atom,
    pub data: TypeData,
    /// Declaring symbol, when the type has one.
    pub symbol: Option<SymbolId>,
    /// Declaring construct; used for type-parameter identity.
    pub decl: Option<DeclId>,
    /// Member table, name to symbol. Insertion order is kept only so
    /// diagnostics stay deterministic.
    pub members: IndexMap<Atom, SymbolId>,
    pub call_sigs: Vec<SigId>,
    pub construct_sigs: Vec<SigId>,
    pub index_sigs: Vec<SigId>,
    pub extends: Vec<TypeId>,
    pub implements: Vec<TypeId>,
    pub type_params: Vec<TypeId>,
    /// For instantiations: the unspecialized root and the ordered
    /// argument list that produced this type.
    pub root: Option<TypeId>,
    pub type_args: Vec<TypeId>,
    /// Instantiations cached on the root, keyed by argument identity.
    pub specializations: FxHashMap<Vec<TypeId>, TypeId>,
    /// Constructor types link to the instance type they construct;
    /// container types link to their module's instance value type.
    pub instance: Option<TypeId>,
}

impl TypeSymbol {
    pub fn new(name: Atom, data: TypeData) -> Self {
        Self {
            name,
            data,
            symbol: None,
            decl: None,
            members: IndexMap::new(),
            call_sigs: Vec::new(),
            construct_sigs: Vec::new(),
            index_sigs: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            type_params: Vec::new(),
            root: None,
            type_args: Vec::new(),
            specializations: FxHashMap::default(),
            instance: None,
        }
    }
}

/// Arena of type symbols and signatures, plus the symbol-type map and
/// the interning caches for array and string-literal types.
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<TypeSymbol>,
    sigs: Vec<Signature>,
    symbol_types: FxHashMap<SymbolId, TypeId>,
    array_types: FxHashMap<TypeId, TypeId>,
    string_literals: FxHashMap<Atom, TypeId>,
    /// The universal object interface every object type relates to, and
    /// the function interface types with signatures relate to. Installed
    /// by the checker's global-scope setup.
    pub global_object: Option<TypeId>,
    pub global_function: Option<TypeId>,
    /// Built-in wrapper interfaces for primitive member access.
    pub number_wrapper: Option<TypeId>,
    pub string_wrapper: Option<TypeId>,
    pub boolean_wrapper: Option<TypeId>,
}

impl TypeTable {
    pub fn new(interner: &mut vela_common::Interner) -> Self {
        let mut table = Self {
            types: Vec::new(),
            sigs: Vec::new(),
            symbol_types: FxHashMap::default(),
            array_types: FxHashMap::default(),
            string_literals: FxHashMap::default(),
            global_object: None,
            global_function: None,
            number_wrapper: None,
            string_wrapper: None,
            boolean_wrapper: None,
        };
        // Seed the singletons in the order of the `TypeId` consts.
        let seeds: [(&str, TypeData); 8] = [
            ("any", TypeData::Any),
            ("error", TypeData::Error),
            ("number", TypeData::Primitive(Prim::Number)),
            ("string", TypeData::Primitive(Prim::String)),
            ("boolean", TypeData::Primitive(Prim::Boolean)),
            ("void", TypeData::Primitive(Prim::Void)),
            ("null", TypeData::Primitive(Prim::Null)),
            ("undefined", TypeData::Primitive(Prim::Undefined)),
        ];
        for (name, data) in seeds {
            let atom = interner.intern(name);
            table.alloc(TypeSymbol::new(atom, data));
        }
        debug_assert_eq!(table.types.len(), 8);
        table
    }

    pub fn alloc(&mut self, ty: TypeSymbol) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeSymbol {
        &self.types[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeSymbol {
        &mut self.types[id.0 as usize]
    }

    pub fn data(&self, id: TypeId) -> &TypeData {
        &self.get(id).data
    }

    /// The interned array type over `element`.
    pub fn array_of(&mut self, element: TypeId, name: Atom) -> TypeId {
        if let Some(&existing) = self.array_types.get(&element) {
            return existing;
        }
        let id = self.alloc(TypeSymbol::new(name, TypeData::Array { element }));
        self.array_types.insert(element, id);
        id
    }

    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        match self.data(id) {
            TypeData::Array { element } => Some(*element),
            _ => None,
        }
    }

    /// The interned string-literal type for `text` (normalized text:
    /// atoms already compare by content).
    pub fn string_literal(&mut self, text: Atom) -> TypeId {
        if let Some(&existing) = self.string_literals.get(&text) {
            return existing;
        }
        let id = self.alloc(TypeSymbol::new(text, TypeData::StringLiteral(text)));
        self.string_literals.insert(text, id);
        id
    }

    pub fn alloc_sig(&mut self, sig: Signature) -> SigId {
        let id = SigId(self.sigs.len() as u32);
        self.sigs.push(sig);
        id
    }

    pub fn sig(&self, id: SigId) -> &Signature {
        &self.sigs[id.0 as usize]
    }

    pub fn sig_mut(&mut self, id: SigId) -> &mut Signature {
        &mut self.sigs[id.0 as usize]
    }

    pub fn symbol_type(&self, sym: SymbolId) -> Option<TypeId> {
        self.symbol_types.get(&sym).copied()
    }

    pub fn set_symbol_type(&mut self, sym: SymbolId, ty: TypeId) {
        self.symbol_types.insert(sym, ty);
    }

    pub fn remove_symbol_type(&mut self, sym: SymbolId) {
        self.symbol_types.remove(&sym);
    }

    /// Root of a type: itself unless it is an instantiation.
    pub fn root_of(&self, id: TypeId) -> TypeId {
        self.get(id).root.unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_common::Interner;

    #[test]
    fn singleton_ids_match_consts() {
        let mut interner = Interner::new();
        let table = TypeTable::new(&mut interner);
        assert_eq!(table.data(TypeId::ANY), &TypeData::Any);
        assert_eq!(table.data(TypeId::ERROR), &TypeData::Error);
        assert_eq!(table.data(TypeId::NUMBER), &TypeData::Primitive(Prim::Number));
        assert_eq!(
            table.data(TypeId::UNDEFINED),
            &TypeData::Primitive(Prim::Undefined)
        );
    }

    #[test]
    fn array_and_literal_types_are_interned() {
        let mut interner = Interner::new();
        let mut table = TypeTable::new(&mut interner);
        let name = interner.intern("number[]");
        let a = table.array_of(TypeId::NUMBER, name);
        let b = table.array_of(TypeId::NUMBER, name);
        assert_eq!(a, b);

        let hello = interner.intern("hello");
        let l1 = table.string_literal(hello);
        let l2 = table.string_literal(hello);
        assert_eq!(l1, l2);
    }
}
