//! Lexical name resolution.
//!
//! Lookup walks the enclosing-declaration chain outward: function-like
//! scopes expose their parameters and locals, class and interface
//! bodies expose only their type parameters, modules expose everything
//! declared in them plus the exports of their other merged fragments.
//! Past the unit root, the top-level declarations of every registered
//! unit form one shared global scope.

use vela_binder::{DeclFlags, DeclId, DeclKind, SymbolId, SymbolKind};
use vela_common::Atom;

use crate::state::Checker;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Namespace {
    Value,
    Type,
    /// Intermediate segment of a dotted name: containers only.
    Container,
}

impl Checker {
    pub(crate) fn resolve_name(&self, name: Atom, ns: Namespace) -> Option<SymbolId> {
        let start = self.current_scope()?;
        for decl_id in self.decls.path_to_root(start) {
            let (kind, symbol) = {
                let decl = self.decls.get(decl_id);
                (decl.kind, decl.symbol)
            };
            let type_params_only = matches!(kind, DeclKind::Class | DeclKind::Interface);
            if let Some(sym) = self.search_children(decl_id, name, ns, type_params_only) {
                return Some(sym);
            }
            // A container declared in several places is one logical
            // scope: its other fragments contribute their exported
            // children to the walk.
            if kind == DeclKind::Module {
                if let Some(container) = symbol {
                    if let Some(sym) = self.find_exported(container, name, ns) {
                        return Some(sym);
                    }
                }
            }
        }
        for &(_, root) in &self.units {
            if let Some(sym) = self.search_children(root, name, ns, false) {
                return Some(sym);
            }
        }
        None
    }

    fn search_children(
        &self,
        parent: DeclId,
        name: Atom,
        ns: Namespace,
        type_params_only: bool,
    ) -> Option<SymbolId> {
        for &child in self.decls.children(parent) {
            let decl = self.decls.get(child);
            if decl.name != name {
                continue;
            }
            if type_params_only && decl.kind != DeclKind::TypeParam {
                continue;
            }
            let Some(sym) = decl.symbol else {
                continue;
            };
            if self.matches_namespace(sym, ns) {
                return Some(sym);
            }
        }
        None
    }

    fn matches_namespace(&self, sym: SymbolId, ns: Namespace) -> bool {
        let kind = self.symbols.get(sym).kind;
        match ns {
            Namespace::Value => kind.is_value(),
            Namespace::Type => kind.is_type(),
            Namespace::Container => matches!(kind, SymbolKind::Module | SymbolKind::Enum),
        }
    }

    /// An exported member of a container symbol, searched across all of
    /// the container's merged declarations.
    pub(crate) fn find_exported(
        &self,
        container: SymbolId,
        name: Atom,
        ns: Namespace,
    ) -> Option<SymbolId> {
        let decls = self.symbols.get(container).decls.clone();
        for decl_id in decls {
            for &child in self.decls.children(decl_id) {
                let decl = self.decls.get(child);
                if decl.name != name || !decl.flags.contains(DeclFlags::EXPORTED) {
                    continue;
                }
                let Some(sym) = decl.symbol else {
                    continue;
                };
                if self.matches_namespace(sym, ns) {
                    return Some(sym);
                }
            }
        }
        None
    }
}
