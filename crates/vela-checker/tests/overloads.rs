//! Call resolution: candidate ordering, exactness buckets, and
//! contextual typing of arguments.

mod common;

use common::{check_with, codes};
use vela_ast::{AstBuilder, NodeIndex};
use vela_solver::TypeId;

/// `function name(x: <param>): <ret>;` as an overload declaration.
fn overload(b: &mut AstBuilder, name: &str, param: &str, ret: &str) -> NodeIndex {
    let p_ty = b.type_ref(param);
    let p = b.param("x", Some(p_ty));
    let r_ty = b.type_ref(ret);
    b.function(name, vec![], vec![p], Some(r_ty), None)
}

/// `function name(x: any): any { return x; }` — the implementation.
fn implementation(b: &mut AstBuilder, name: &str) -> NodeIndex {
    let p_ty = b.type_ref("any");
    let p = b.param("x", Some(p_ty));
    let r_ty = b.type_ref("any");
    let x = b.ident("x");
    let ret = b.ret(Some(x));
    let body = b.block(vec![ret]);
    b.function(name, vec![], vec![p], Some(r_ty), Some(body))
}

#[test]
fn overloads_select_in_declaration_order() {
    let (mut checker, (cn, cs)) = check_with(|b| {
        let o1 = overload(b, "f", "string", "string");
        let o2 = overload(b, "f", "number", "number");
        let imp = implementation(b, "f");
        let callee1 = b.ident("f");
        let one = b.number(1.0);
        let cn = b.call(callee1, vec![one]);
        let s1 = b.expr_stmt(cn);
        let callee2 = b.ident("f");
        let hello = b.string("hello");
        let cs = b.call(callee2, vec![hello]);
        let s2 = b.expr_stmt(cs);
        (vec![o1, o2, imp, s1, s2], (cn, cs))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(cn), TypeId::NUMBER);
    assert_eq!(checker.expr_type(cs), TypeId::STRING);
}

#[test]
fn an_exact_candidate_beats_an_earlier_convertible_one() {
    let (mut checker, call) = check_with(|b| {
        // A number argument is merely convertible to `any` but an
        // exact match for `number`, even though `any` comes first.
        let o1 = overload(b, "p", "any", "string");
        let o2 = overload(b, "p", "number", "number");
        let imp = implementation(b, "p");
        let callee = b.ident("p");
        let one = b.number(1.0);
        let call = b.call(callee, vec![one]);
        let stmt = b.expr_stmt(call);
        (vec![o1, o2, imp, stmt], call)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
}

#[test]
fn a_narrower_parameter_beats_an_any_parameter() {
    let (mut checker, call) = check_with(|b| {
        // A string literal is not an exact match for either `string`
        // or `any`; among the convertible candidates the strictly
        // narrower `string` parameter wins without a diagnostic.
        let o1 = overload(b, "f", "string", "number");
        let o2 = overload(b, "f", "any", "string");
        let imp = implementation(b, "f");
        let callee = b.ident("f");
        let lit = b.string("a");
        let call = b.call(callee, vec![lit]);
        let stmt = b.expr_stmt(call);
        (vec![o1, o2, imp, stmt], call)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
}

/// `interface <name> { <props as name: type> }`
fn shape(b: &mut AstBuilder, name: &str, props: &[(&str, &str)]) -> NodeIndex {
    let members = props
        .iter()
        .map(|&(prop, ty)| {
            let ty = b.type_ref(ty);
            b.property_sig(prop, Some(ty))
        })
        .collect();
    b.interface(name, vec![], vec![], members)
}

#[test]
fn a_narrower_shape_parameter_wins_the_reduction() {
    let (mut checker, call) = check_with(|b| {
        // The argument satisfies both candidates; R is a proper
        // subtype of P, so the later, narrower overload wins silently.
        let p_shape = shape(b, "P", &[("x", "number")]);
        let r_shape = shape(b, "R", &[("x", "number"), ("y", "number")]);
        let c_shape = shape(b, "C", &[("x", "number"), ("y", "number"), ("z", "number")]);
        let o1 = overload(b, "g", "P", "number");
        let o2 = overload(b, "g", "R", "string");
        let imp = implementation(b, "g");
        let c_ty = b.type_ref("C");
        let v = b.var("c", Some(c_ty), None);
        let callee = b.ident("g");
        let arg = b.ident("c");
        let call = b.call(callee, vec![arg]);
        let stmt = b.expr_stmt(call);
        (vec![p_shape, r_shape, c_shape, o1, o2, imp, v, stmt], call)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::STRING);
}

#[test]
fn inseparable_candidates_with_diverging_returns_are_ambiguous() {
    let (mut checker, call) = check_with(|b| {
        // Neither parameter shape is narrower than the other and the
        // returns do not merge, so the reduction cannot separate them.
        let a_shape = shape(b, "A", &[("x", "number")]);
        let b_shape = shape(b, "B", &[("y", "string")]);
        let c_shape = shape(b, "C", &[("x", "number"), ("y", "string")]);
        let o1 = overload(b, "g", "A", "number");
        let o2 = overload(b, "g", "B", "string");
        let imp = implementation(b, "g");
        let c_ty = b.type_ref("C");
        let v = b.var("c", Some(c_ty), None);
        let callee = b.ident("g");
        let arg = b.ident("c");
        let call = b.call(callee, vec![arg]);
        let stmt = b.expr_stmt(call);
        (vec![a_shape, b_shape, c_shape, o1, o2, imp, v, stmt], call)
    });
    assert_eq!(codes(&checker), vec![2787]);
    // Declaration order still picks the winner.
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
}

#[test]
fn duplicate_overload_signatures_are_reported() {
    let (checker, ()) = check_with(|b| {
        let o1 = overload(b, "d", "number", "void");
        let o2 = overload(b, "d", "number", "string");
        let imp = implementation(b, "d");
        (vec![o1, o2, imp], ())
    });
    assert_eq!(codes(&checker), vec![2393]);
}

#[test]
fn no_overload_matches() {
    let (checker, ()) = check_with(|b| {
        let o1 = overload(b, "q", "number", "void");
        let o2 = overload(b, "q", "string", "void");
        let imp = implementation(b, "q");
        let callee = b.ident("q");
        let arg = b.bool_lit(true);
        let call = b.call(callee, vec![arg]);
        let stmt = b.expr_stmt(call);
        (vec![o1, o2, imp, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2769]);
}

#[test]
fn single_candidate_mismatches_name_the_argument() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let p = b.param("x", Some(n));
        let v = b.type_ref("void");
        let body = b.block(vec![]);
        let f = b.function("k", vec![], vec![p], Some(v), Some(body));
        let callee = b.ident("k");
        let arg = b.string("a");
        let call = b.call(callee, vec![arg]);
        let stmt = b.expr_stmt(call);
        (vec![f, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2345]);
}

#[test]
fn single_candidate_arity_mismatch_is_a_call_error() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let p = b.param("x", Some(n));
        let v = b.type_ref("void");
        let body = b.block(vec![]);
        let f = b.function("k", vec![], vec![p], Some(v), Some(body));
        let callee = b.ident("k");
        let call = b.call(callee, vec![]);
        let stmt = b.expr_stmt(call);
        (vec![f, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2769]);
}

#[test]
fn calling_a_number_is_not_callable() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let one = b.number(1.0);
        let v = b.var("n", Some(n), Some(one));
        let callee = b.ident("n");
        let call = b.call(callee, vec![]);
        let stmt = b.expr_stmt(call);
        (vec![v, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2349]);
}

#[test]
fn newing_a_plain_interface_is_not_constructable() {
    let (checker, ()) = check_with(|b| {
        let iface = b.interface("I", vec![], vec![], vec![]);
        let t = b.type_ref("I");
        let v = b.var("i", Some(t), None);
        let callee = b.ident("i");
        let new_node = b.new_expr(callee, vec![]);
        let stmt = b.expr_stmt(new_node);
        (vec![iface, v, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2351]);
}

#[test]
fn optional_and_rest_parameters_relax_arity() {
    let (mut checker, (short_call, long_call)) = check_with(|b| {
        let n1 = b.type_ref("number");
        let p1 = b.param("first", Some(n1));
        let n2 = b.type_ref("number");
        let p2 = b.optional_param("second", Some(n2));
        let n3 = b.type_ref("number");
        let rest_ty = b.array_type(n3);
        let p3 = b.rest_param("more", Some(rest_ty));
        let ret_ty = b.type_ref("number");
        let zero = b.number(0.0);
        let ret = b.ret(Some(zero));
        let body = b.block(vec![ret]);
        let f = b.function("sum", vec![], vec![p1, p2, p3], Some(ret_ty), Some(body));
        let callee1 = b.ident("sum");
        let a1 = b.number(1.0);
        let short_call = b.call(callee1, vec![a1]);
        let s1 = b.expr_stmt(short_call);
        let callee2 = b.ident("sum");
        let b1 = b.number(1.0);
        let b2 = b.number(2.0);
        let b3 = b.number(3.0);
        let b4 = b.number(4.0);
        let long_call = b.call(callee2, vec![b1, b2, b3, b4]);
        let s2 = b.expr_stmt(long_call);
        (vec![f, s1, s2], (short_call, long_call))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(short_call), TypeId::NUMBER);
    assert_eq!(checker.expr_type(long_call), TypeId::NUMBER);
}

#[test]
fn contextual_typing_fills_in_lambda_parameters() {
    let (mut checker, (call, arrow)) = check_with(|b| {
        // function apply(cb: (x: number) => number): number
        let n1 = b.type_ref("number");
        let cb_param = b.param("x", Some(n1));
        let n2 = b.type_ref("number");
        let cb_ty = b.function_type(vec![cb_param], n2);
        let p = b.param("cb", Some(cb_ty));
        let n3 = b.type_ref("number");
        let zero = b.number(0.0);
        let ret = b.ret(Some(zero));
        let body = b.block(vec![ret]);
        let f = b.function("apply", vec![], vec![p], Some(n3), Some(body));
        let callee = b.ident("apply");
        let x_param = b.param("x", None);
        let x = b.ident("x");
        let arrow = b.arrow(vec![x_param], x);
        let call = b.call(callee, vec![arrow]);
        let stmt = b.expr_stmt(call);
        (vec![f, stmt], (call, arrow))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
    // The committed lambda carries the contextual parameter type.
    let arrow_ty = checker.expr_type(arrow);
    let sig = checker.types.get(arrow_ty).call_sigs[0];
    let param = checker.types.sig(sig).params[0];
    assert_eq!(checker.types.symbol_type(param), Some(TypeId::NUMBER));
}

#[test]
fn failed_trials_leave_no_contextual_residue() {
    let (mut checker, (call, arrow)) = check_with(|b| {
        // pick(cb: (x: string) => number): string
        let s1 = b.type_ref("string");
        let cb1_param = b.param("x", Some(s1));
        let n1 = b.type_ref("number");
        let cb1_ty = b.function_type(vec![cb1_param], n1);
        let p1 = b.param("cb", Some(cb1_ty));
        let s_ret = b.type_ref("string");
        let o1 = b.function("pick", vec![], vec![p1], Some(s_ret), None);
        // pick(cb: (x: number) => number): number
        let n2 = b.type_ref("number");
        let cb2_param = b.param("x", Some(n2));
        let n3 = b.type_ref("number");
        let cb2_ty = b.function_type(vec![cb2_param], n3);
        let p2 = b.param("cb", Some(cb2_ty));
        let n_ret = b.type_ref("number");
        let o2 = b.function("pick", vec![], vec![p2], Some(n_ret), None);
        let imp = implementation(b, "pick");
        let callee = b.ident("pick");
        let x_param = b.param("x", None);
        let x = b.ident("x");
        let arrow = b.arrow(vec![x_param], x);
        let call = b.call(callee, vec![arrow]);
        let stmt = b.expr_stmt(call);
        (vec![o1, o2, imp, stmt], (call, arrow))
    });
    // The first overload's trial types the lambda `(string) => string`
    // and fails on the return; the trial must not stick.
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
    let arrow_ty = checker.expr_type(arrow);
    let sig = checker.types.get(arrow_ty).call_sigs[0];
    let param = checker.types.sig(sig).params[0];
    assert_eq!(checker.types.symbol_type(param), Some(TypeId::NUMBER));
    assert_eq!(checker.types.sig(sig).ret, TypeId::NUMBER);
}
