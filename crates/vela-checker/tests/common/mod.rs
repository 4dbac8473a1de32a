//! Shared fixture: build a unit with the AST builder, bind it, and run
//! the checker over the result.

#![allow(dead_code)]

use vela_ast::{AstBuilder, NodeArena, NodeIndex};
use vela_binder::{Binder, DeclStore, SymbolArena};
use vela_checker::Checker;
use vela_common::{Interner, UnitId};

/// Build, bind, and check a single-unit program. The closure returns
/// the top-level statements plus any node handles the test wants to
/// query afterwards.
pub fn check_with<T>(build: impl FnOnce(&mut AstBuilder) -> (Vec<NodeIndex>, T)) -> (Checker, T) {
    let mut arena = NodeArena::new();
    let mut interner = Interner::new();
    let (root, captured) = {
        let mut b = AstBuilder::new(&mut arena, &mut interner);
        let (stmts, captured) = build(&mut b);
        (b.unit(stmts), captured)
    };
    let mut decls = DeclStore::new();
    let mut symbols = SymbolArena::new();
    let unit = UnitId(0);
    let unit_name = interner.intern("main");
    let root_decl =
        Binder::new(&arena, &mut interner, &mut decls, &mut symbols, unit).bind_unit(root, unit_name);
    let mut checker = Checker::new(arena, interner, decls, symbols);
    checker.register_unit(unit, root_decl);
    checker.check_unit(unit);
    (checker, captured)
}

pub fn check_program(build: impl FnOnce(&mut AstBuilder) -> Vec<NodeIndex>) -> Checker {
    let (checker, ()) = check_with(|b| (build(b), ()));
    checker
}

pub fn codes(checker: &Checker) -> Vec<u32> {
    checker
        .sink
        .diagnostics()
        .iter()
        .map(|d| d.code)
        .collect()
}
