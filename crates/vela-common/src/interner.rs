//! String interning for identifier deduplication.
//!
//! Interning gives every distinct identifier one `Atom`, so name
//! comparisons throughout the resolver are `u32` comparisons and the
//! member tables can key on `Atom` instead of owned strings.

use rustc_hash::FxHashMap;

/// An interned string. Two atoms are equal iff their texts are equal
/// within the same `Interner`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

/// Single-threaded string interner.
///
/// The resolution engine is strictly synchronous, so the sharded
/// concurrent variant the wider compiler uses is unnecessary here.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<Box<str>, Atom>,
    strings: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.map.insert(boxed, atom);
        atom
    }

    /// Resolve an atom back to its text.
    ///
    /// Panics if the atom was produced by a different interner; that is
    /// a programmer error, not a language-level condition.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.0 as usize]
    }

    /// Look up an already-interned string without inserting.
    pub fn get(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut interner = Interner::new();
        let a = interner.intern("value");
        let b = interner.intern("value");
        let c = interner.intern("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "value");
        assert_eq!(interner.resolve(c), "other");
    }

    #[test]
    fn get_does_not_insert() {
        let mut interner = Interner::new();
        assert!(interner.get("x").is_none());
        let a = interner.intern("x");
        assert_eq!(interner.get("x"), Some(a));
        assert_eq!(interner.len(), 1);
    }
}
