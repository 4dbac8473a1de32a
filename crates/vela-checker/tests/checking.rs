//! Statement-level checks: widening, best common types, declaration
//! agreement, and the structural diagnostics.

mod common;

use common::{check_with, codes};
use vela_solver::{TypeId, format_type};

#[test]
fn array_literals_take_the_best_common_element_type() {
    let (mut checker, (nums, strs)) = check_with(|b| {
        let one = b.number(1.0);
        let two = b.number(2.0);
        let three = b.number(3.0);
        let nums = b.array(vec![one, two, three]);
        let v1 = b.var("xs", None, Some(nums));
        let a = b.string("a");
        let bb = b.string("b");
        let strs = b.array(vec![a, bb]);
        let v2 = b.var("ss", None, Some(strs));
        (vec![v1, v2], (nums, strs))
    });
    assert!(checker.sink.diagnostics().is_empty());
    let nums_ty = checker.expr_type(nums);
    assert_eq!(checker.types.element_type(nums_ty), Some(TypeId::NUMBER));
    // String literal elements widen before merging.
    let strs_ty = checker.expr_type(strs);
    assert_eq!(checker.types.element_type(strs_ty), Some(TypeId::STRING));
}

#[test]
fn unrelated_elements_merge_to_the_empty_shape() {
    let (mut checker, arr) = check_with(|b| {
        let one = b.number(1.0);
        let a = b.string("a");
        let arr = b.array(vec![one, a]);
        let v = b.var("mixed", None, Some(arr));
        (vec![v], arr)
    });
    assert!(checker.sink.diagnostics().is_empty());
    let arr_ty = checker.expr_type(arr);
    let element = checker.types.element_type(arr_ty).unwrap();
    assert_eq!(format_type(&mut checker, element), "{}");
}

#[test]
fn nested_array_literals_merge_element_wise() {
    let (mut checker, arr) = check_with(|b| {
        let one = b.number(1.0);
        let inner_nums = b.array(vec![one]);
        let a = b.string("a");
        let inner_strs = b.array(vec![a]);
        let arr = b.array(vec![inner_nums, inner_strs]);
        let v = b.var("grid", None, Some(arr));
        (vec![v], arr)
    });
    assert!(checker.sink.diagnostics().is_empty());
    let arr_ty = checker.expr_type(arr);
    let element = checker.types.element_type(arr_ty).unwrap();
    assert_eq!(format_type(&mut checker, element), "{}[]");
    let inner = checker.types.element_type(element).unwrap();
    assert_eq!(format_type(&mut checker, inner), "{}");
}

#[test]
fn null_returns_widen_toward_the_concrete_branch() {
    let (mut checker, call) = check_with(|b| {
        let cond = b.bool_lit(true);
        let null = b.null();
        let r1 = b.ret(Some(null));
        let one = b.number(1.0);
        let r2 = b.ret(Some(one));
        let branch = b.if_stmt(cond, r1, Some(r2));
        let body = b.block(vec![branch]);
        let f = b.function("pickOrNull", vec![], vec![], None, Some(body));
        let callee = b.ident("pickOrNull");
        let call = b.call(callee, vec![]);
        let stmt = b.expr_stmt(call);
        (vec![f, stmt], call)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::NUMBER);
}

#[test]
fn empty_array_literals_adopt_the_contextual_element() {
    let (mut checker, arr) = check_with(|b| {
        let n = b.type_ref("number");
        let annotation = b.array_type(n);
        let arr = b.array(vec![]);
        let v = b.var("xs", Some(annotation), Some(arr));
        (vec![v], arr)
    });
    assert!(checker.sink.diagnostics().is_empty());
    let arr_ty = checker.expr_type(arr);
    assert_eq!(checker.types.element_type(arr_ty), Some(TypeId::NUMBER));
}

#[test]
fn conditionals_merge_their_branches() {
    let (mut checker, cond) = check_with(|b| {
        let test = b.bool_lit(true);
        let one = b.number(1.0);
        let two = b.number(2.0);
        let cond = b.cond(test, one, two);
        let stmt = b.expr_stmt(cond);
        (vec![stmt], cond)
    });
    assert_eq!(checker.expr_type(cond), TypeId::NUMBER);
}

#[test]
fn a_dynamic_branch_absorbs_the_conditional() {
    let (mut checker, cond) = check_with(|b| {
        let v = b.var("loose", None, None);
        let test = b.bool_lit(true);
        let one = b.number(1.0);
        let loose = b.ident("loose");
        let cond = b.cond(test, one, loose);
        let stmt = b.expr_stmt(cond);
        (vec![v, stmt], cond)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(cond), TypeId::ANY);
}

#[test]
fn initializers_widen_literals_and_nulls() {
    let (mut checker, (es, en)) = check_with(|b| {
        let hello = b.string("hello");
        let v1 = b.var("s", None, Some(hello));
        let null = b.null();
        let v2 = b.var("n", None, Some(null));
        let es = b.ident("s");
        let s1 = b.expr_stmt(es);
        let en = b.ident("n");
        let s2 = b.expr_stmt(en);
        (vec![v1, v2, s1, s2], (es, en))
    });
    assert_eq!(checker.expr_type(es), TypeId::STRING);
    assert_eq!(checker.expr_type(en), TypeId::ANY);
}

#[test]
fn annotated_initializers_must_be_assignable() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let hello = b.string("hello");
        let v = b.var("x", Some(n), Some(hello));
        (vec![v], ())
    });
    assert_eq!(codes(&checker), vec![2322]);
}

#[test]
fn incompatible_members_are_named_in_the_elaboration() {
    let (checker, ()) = check_with(|b| {
        let t = b.type_ref("T");
        let value = b.property_decl("value", Some(t));
        let tp = b.type_param("T", None);
        let class = b.class("Box", vec![tp], None, vec![], vec![value]);
        let s = b.type_ref("string");
        let box_s = b.generic_type_ref("Box", vec![s]);
        let v1 = b.var("a", Some(box_s), None);
        let n = b.type_ref("number");
        let box_n = b.generic_type_ref("Box", vec![n]);
        let a = b.ident("a");
        let v2 = b.var("b", Some(box_n), Some(a));
        (vec![class, v1, v2], ())
    });
    let diagnostics = checker.sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code, 2322);
    assert!(diagnostic.message_text.contains("Box<string>"));
    assert!(diagnostic.message_text.contains("Box<number>"));
    assert_eq!(diagnostic.related_information.len(), 1);
    assert_eq!(diagnostic.related_information[0].code, 2326);
    assert!(diagnostic.related_information[0].message_text.contains("value"));
}

#[test]
fn redeclarations_must_agree_on_the_type() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let v1 = b.var("x", Some(n), None);
        let s = b.type_ref("string");
        let v2 = b.var("x", Some(s), None);
        (vec![v1, v2], ())
    });
    assert_eq!(codes(&checker), vec![2403]);
}

#[test]
fn agreeing_redeclarations_pass() {
    let (checker, ()) = check_with(|b| {
        let n1 = b.type_ref("number");
        let v1 = b.var("x", Some(n1), None);
        let n2 = b.type_ref("number");
        let v2 = b.var("x", Some(n2), None);
        (vec![v1, v2], ())
    });
    assert!(checker.sink.diagnostics().is_empty());
}

#[test]
fn arithmetic_requires_number_like_operands() {
    let (mut checker, (bad, with_enum)) = check_with(|b| {
        let one = b.number(1.0);
        let a = b.string("a");
        let bad = b.binary(vela_ast::BinaryOp::Sub, one, a);
        let s1 = b.expr_stmt(bad);
        let decl = b.enum_decl("E", vec!["A"]);
        let e = b.ident("E");
        let member = b.member(e, "A");
        let two = b.number(2.0);
        let with_enum = b.binary(vela_ast::BinaryOp::Mul, member, two);
        let s2 = b.expr_stmt(with_enum);
        (vec![s1, decl, s2], (bad, with_enum))
    });
    assert_eq!(codes(&checker), vec![2362]);
    assert_eq!(checker.expr_type(bad), TypeId::NUMBER);
    assert_eq!(checker.expr_type(with_enum), TypeId::NUMBER);
}

#[test]
fn addition_with_a_string_concatenates() {
    let (mut checker, concat) = check_with(|b| {
        let a = b.string("a");
        let one = b.number(1.0);
        let concat = b.binary(vela_ast::BinaryOp::Add, a, one);
        let stmt = b.expr_stmt(concat);
        (vec![stmt], concat)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(concat), TypeId::STRING);
}

#[test]
fn missing_properties_are_reported() {
    let (checker, ()) = check_with(|b| {
        let one = b.number(1.0);
        let obj = b.object(vec![("a", one)]);
        let v = b.var("o", None, Some(obj));
        let o = b.ident("o");
        let access = b.member(o, "b");
        let stmt = b.expr_stmt(access);
        (vec![v, stmt], ())
    });
    assert_eq!(codes(&checker), vec![2339]);
}

#[test]
fn annotated_returns_are_checked() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let a = b.string("a");
        let ret = b.ret(Some(a));
        let body = b.block(vec![ret]);
        let f = b.function("bad", vec![], vec![], Some(n), Some(body));
        (vec![f], ())
    });
    assert_eq!(codes(&checker), vec![2322]);
}

#[test]
fn inferred_returns_merge_and_default_to_void() {
    let (mut checker, (merged, empty)) = check_with(|b| {
        let cond = b.bool_lit(true);
        let one = b.number(1.0);
        let r1 = b.ret(Some(one));
        let two = b.number(2.0);
        let r2 = b.ret(Some(two));
        let branch = b.block(vec![r1]);
        let guard = b.if_stmt(cond, branch, None);
        let body = b.block(vec![guard, r2]);
        let f = b.function("pickone", vec![], vec![], None, Some(body));
        let body2 = b.block(vec![]);
        let g = b.function("noop", vec![], vec![], None, Some(body2));
        let callee1 = b.ident("pickone");
        let merged = b.call(callee1, vec![]);
        let s1 = b.expr_stmt(merged);
        let callee2 = b.ident("noop");
        let empty = b.call(callee2, vec![]);
        let s2 = b.expr_stmt(empty);
        (vec![f, g, s1, s2], (merged, empty))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(merged), TypeId::NUMBER);
    assert_eq!(checker.expr_type(empty), TypeId::VOID);
}

#[test]
fn named_members_must_satisfy_a_string_index_signature() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let index = b.index_sig("key", vela_ast::IndexKeyKind::String, n);
        let s = b.type_ref("string");
        let name = b.property_sig("name", Some(s));
        let n2 = b.type_ref("number");
        let count = b.property_sig("count", Some(n2));
        let iface = b.interface("Bag", vec![], vec![], vec![index, name, count]);
        (vec![iface], ())
    });
    assert_eq!(codes(&checker), vec![2411]);
}

#[test]
fn index_access_uses_the_matching_signature() {
    let (mut checker, (by_number, by_string)) = check_with(|b| {
        let s_val = b.type_ref("string");
        let string_sig = b.index_sig("key", vela_ast::IndexKeyKind::String, s_val);
        let n_val = b.type_ref("number");
        let number_sig = b.index_sig("at", vela_ast::IndexKeyKind::Number, n_val);
        let iface = b.interface("Mixed", vec![], vec![], vec![string_sig, number_sig]);
        let t = b.type_ref("Mixed");
        let v = b.var("m", Some(t), None);
        let m1 = b.ident("m");
        let zero = b.number(0.0);
        let by_number = b.index(m1, zero);
        let s1 = b.expr_stmt(by_number);
        let m2 = b.ident("m");
        let key = b.string("anything");
        let by_string = b.index(m2, key);
        let s2 = b.expr_stmt(by_string);
        (vec![iface, v, s1, s2], (by_number, by_string))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(by_number), TypeId::NUMBER);
    assert_eq!(checker.expr_type(by_string), TypeId::STRING);
}

#[test]
fn modules_expose_exported_values() {
    let (mut checker, access) = check_with(|b| {
        let n = b.type_ref("number");
        let d = b.var_declarator("total", Some(n), None);
        let d = b.export(d);
        let stmt = b.var_group(vec![d]);
        let module = b.module("Counters", vec![stmt]);
        let m = b.ident("Counters");
        let access = b.member(m, "total");
        let s = b.expr_stmt(access);
        (vec![module, s], access)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(access), TypeId::NUMBER);
}

#[test]
fn merged_module_fragments_see_each_others_exports() {
    let (mut checker, use_site) = check_with(|b| {
        let n = b.type_ref("number");
        let d = b.var_declarator("total", Some(n), None);
        let d = b.export(d);
        let decl = b.var_group(vec![d]);
        let first = b.module("Counters", vec![decl]);
        let use_site = b.ident("total");
        let stmt = b.expr_stmt(use_site);
        let second = b.module("Counters", vec![stmt]);
        (vec![first, second], use_site)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(use_site), TypeId::NUMBER);
}

#[test]
fn qualified_type_references_reach_into_modules() {
    let (mut checker, e) = check_with(|b| {
        let n = b.type_ref("number");
        let px = b.property_sig("x", Some(n));
        let iface = b.interface("Point", vec![], vec![], vec![px]);
        let iface = b.export(iface);
        let module = b.module("Geo", vec![iface]);
        let qualified = b.qualified_type_ref(&["Geo", "Point"], vec![]);
        let v = b.var("p", Some(qualified), None);
        let p = b.ident("p");
        let access = b.member(p, "x");
        let s = b.expr_stmt(access);
        (vec![module, v, s], access)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(e), TypeId::NUMBER);
}

#[test]
fn classes_check_end_to_end() {
    let (mut checker, (field, method_call)) = check_with(|b| {
        let n1 = b.type_ref("number");
        let x = b.property_decl("x", Some(n1));
        let n2 = b.type_ref("number");
        let y = b.property_decl("y", Some(n2));
        let n3 = b.type_ref("number");
        let px = b.param("x", Some(n3));
        let n4 = b.type_ref("number");
        let py = b.param("y", Some(n4));
        let ctor_body = b.block(vec![]);
        let ctor = b.ctor(vec![px, py], Some(ctor_body));
        let n5 = b.type_ref("number");
        let zero = b.number(0.0);
        let ret = b.ret(Some(zero));
        let method_body = b.block(vec![ret]);
        let len = b.method_decl("len", vec![], Some(n5), Some(method_body));
        let class = b.class("Point", vec![], None, vec![], vec![x, y, ctor, len]);
        let callee = b.ident("Point");
        let one = b.number(1.0);
        let two = b.number(2.0);
        let new_node = b.new_expr(callee, vec![one, two]);
        let v = b.var("p", None, Some(new_node));
        let p1 = b.ident("p");
        let field = b.member(p1, "x");
        let s1 = b.expr_stmt(field);
        let p2 = b.ident("p");
        let len_access = b.member(p2, "len");
        let method_call = b.call(len_access, vec![]);
        let s2 = b.expr_stmt(method_call);
        (vec![class, v, s1, s2], (field, method_call))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(field), TypeId::NUMBER);
    assert_eq!(checker.expr_type(method_call), TypeId::NUMBER);
}

#[test]
fn the_prototype_member_exposes_the_instance_type() {
    let (mut checker, (instance, proto)) = check_with(|b| {
        let n = b.type_ref("number");
        let x = b.property_decl("x", Some(n));
        let class = b.class("Point", vec![], None, vec![], vec![x]);
        let callee = b.ident("Point");
        let new_node = b.new_expr(callee, vec![]);
        let s1 = b.expr_stmt(new_node);
        let name = b.ident("Point");
        let proto = b.member(name, "prototype");
        let s2 = b.expr_stmt(proto);
        (vec![class, s1, s2], (new_node, proto))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(proto), checker.expr_type(instance));
}

#[test]
fn derived_instances_flow_to_base_annotations() {
    let (checker, ()) = check_with(|b| {
        let n = b.type_ref("number");
        let x = b.property_decl("x", Some(n));
        let base = b.class("Base", vec![], None, vec![], vec![x]);
        let base_ref = b.type_ref("Base");
        let s = b.type_ref("string");
        let tag = b.property_decl("tag", Some(s));
        let derived = b.class("Derived", vec![], Some(base_ref), vec![], vec![tag]);
        let callee = b.ident("Derived");
        let new_node = b.new_expr(callee, vec![]);
        let base_ty = b.type_ref("Base");
        let v = b.var("handle", Some(base_ty), Some(new_node));
        (vec![base, derived, v], ())
    });
    assert!(checker.sink.diagnostics().is_empty());
}

#[test]
fn merged_interface_declarations_pool_their_members() {
    let (mut checker, (ex, ey)) = check_with(|b| {
        let n = b.type_ref("number");
        let px = b.property_sig("x", Some(n));
        let first = b.interface("Merged", vec![], vec![], vec![px]);
        let s = b.type_ref("string");
        let py = b.property_sig("y", Some(s));
        let second = b.interface("Merged", vec![], vec![], vec![py]);
        let t = b.type_ref("Merged");
        let v = b.var("m", Some(t), None);
        let m1 = b.ident("m");
        let ex = b.member(m1, "x");
        let s1 = b.expr_stmt(ex);
        let m2 = b.ident("m");
        let ey = b.member(m2, "y");
        let s2 = b.expr_stmt(ey);
        (vec![first, second, v, s1, s2], (ex, ey))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(ex), TypeId::NUMBER);
    assert_eq!(checker.expr_type(ey), TypeId::STRING);
}

#[test]
fn mutually_recursive_initializers_fall_back_to_any() {
    let (mut checker, (ex, ey)) = check_with(|b| {
        let y_ref = b.ident("y");
        let v1 = b.var("x", None, Some(y_ref));
        let x_ref = b.ident("x");
        let v2 = b.var("y", None, Some(x_ref));
        let ex = b.ident("x");
        let s1 = b.expr_stmt(ex);
        let ey = b.ident("y");
        let s2 = b.expr_stmt(ey);
        (vec![v1, v2, s1, s2], (ex, ey))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(ex), TypeId::ANY);
    assert_eq!(checker.expr_type(ey), TypeId::ANY);
}

#[test]
fn recursive_functions_without_annotations_degrade_to_any() {
    let (mut checker, call) = check_with(|b| {
        let n = b.type_ref("number");
        let p = b.param("n", Some(n));
        let callee_inner = b.ident("again");
        let arg_inner = b.ident("n");
        let recur = b.call(callee_inner, vec![arg_inner]);
        let ret = b.ret(Some(recur));
        let body = b.block(vec![ret]);
        let f = b.function("again", vec![], vec![p], None, Some(body));
        let callee = b.ident("again");
        let one = b.number(1.0);
        let call = b.call(callee, vec![one]);
        let stmt = b.expr_stmt(call);
        (vec![f, stmt], call)
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(call), TypeId::ANY);
}

#[test]
fn builtin_members_resolve_on_primitives() {
    let (mut checker, (len, fixed)) = check_with(|b| {
        let hello = b.string("hello");
        let v = b.var("s", None, Some(hello));
        let s1 = b.ident("s");
        let len = b.member(s1, "length");
        let stmt1 = b.expr_stmt(len);
        let one = b.number(1.5);
        let fixed_access = b.member(one, "toFixed");
        let two = b.number(2.0);
        let fixed = b.call(fixed_access, vec![two]);
        let stmt2 = b.expr_stmt(fixed);
        (vec![v, stmt1, stmt2], (len, fixed))
    });
    assert!(checker.sink.diagnostics().is_empty());
    assert_eq!(checker.expr_type(len), TypeId::NUMBER);
    assert_eq!(checker.expr_type(fixed), TypeId::STRING);
}
