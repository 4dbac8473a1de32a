//! Built-in global interfaces.
//!
//! A minimal ambient library: the universal `Object` interface every
//! object type relates to, the `Function` interface for anything
//! callable, and the primitive wrapper interfaces that give `number`,
//! `string`, and `boolean` their apparent members.

use vela_binder::{ResolveState, Symbol, SymbolFlags, SymbolId, SymbolKind};
use vela_solver::{SigFlags, Signature, TypeData, TypeId, TypeSymbol};

use crate::state::Checker;

pub fn install(c: &mut Checker) {
    let object = interface(c, "Object");
    let to_string = method(c, "toString", &[], TypeId::STRING);
    let has_own = method(c, "hasOwnProperty", &[("key", TypeId::STRING)], TypeId::BOOLEAN);
    add_member(c, object, "toString", to_string);
    add_member(c, object, "hasOwnProperty", has_own);

    let function = interface(c, "Function");
    let length = property(c, "length", TypeId::NUMBER);
    add_member(c, function, "length", length);
    c.types.get_mut(function).extends.push(object);

    let number_wrapper = interface(c, "Number");
    let to_fixed = method(c, "toFixed", &[("digits", TypeId::NUMBER)], TypeId::STRING);
    add_member(c, number_wrapper, "toFixed", to_fixed);
    c.types.get_mut(number_wrapper).extends.push(object);

    let string_wrapper = interface(c, "String");
    let str_length = property(c, "length", TypeId::NUMBER);
    let char_at = method(c, "charAt", &[("pos", TypeId::NUMBER)], TypeId::STRING);
    let index_of = method(c, "indexOf", &[("search", TypeId::STRING)], TypeId::NUMBER);
    add_member(c, string_wrapper, "length", str_length);
    add_member(c, string_wrapper, "charAt", char_at);
    add_member(c, string_wrapper, "indexOf", index_of);
    c.types.get_mut(string_wrapper).extends.push(object);

    let boolean_wrapper = interface(c, "Boolean");
    c.types.get_mut(boolean_wrapper).extends.push(object);

    c.types.global_object = Some(object);
    c.types.global_function = Some(function);
    c.types.number_wrapper = Some(number_wrapper);
    c.types.string_wrapper = Some(string_wrapper);
    c.types.boolean_wrapper = Some(boolean_wrapper);
}

/// Type-position lookup for built-in interface names, consulted when
/// scope resolution finds nothing.
pub fn builtin_type_named(c: &Checker, name: &str) -> Option<TypeId> {
    match name {
        "Object" => c.types.global_object,
        "Function" => c.types.global_function,
        "Number" => c.types.number_wrapper,
        "String" => c.types.string_wrapper,
        "Boolean" => c.types.boolean_wrapper,
        _ => None,
    }
}

fn interface(c: &mut Checker, name: &str) -> TypeId {
    let atom = c.interner.intern(name);
    c.types.alloc(TypeSymbol::new(atom, TypeData::Interface))
}

fn add_member(c: &mut Checker, owner: TypeId, name: &str, member: SymbolId) {
    let atom = c.interner.intern(name);
    c.types.get_mut(owner).members.insert(atom, member);
}

fn property(c: &mut Checker, name: &str, ty: TypeId) -> SymbolId {
    let atom = c.interner.intern(name);
    let mut symbol = Symbol::new(atom, SymbolKind::Property, SymbolFlags::empty());
    symbol.state = ResolveState::Resolved;
    let id = c.symbols.alloc(symbol);
    c.types.set_symbol_type(id, ty);
    id
}

/// A method member: a property whose type is a one-signature function
/// interface.
fn method(c: &mut Checker, name: &str, params: &[(&str, TypeId)], ret: TypeId) -> SymbolId {
    let mut param_symbols = Vec::with_capacity(params.len());
    for &(param_name, param_ty) in params {
        let atom = c.interner.intern(param_name);
        let mut symbol = Symbol::new(atom, SymbolKind::Parameter, SymbolFlags::empty());
        symbol.state = ResolveState::Resolved;
        let id = c.symbols.alloc(symbol);
        c.types.set_symbol_type(id, param_ty);
        param_symbols.push(id);
    }
    let sig = c.types.alloc_sig(Signature {
        params: param_symbols,
        ret,
        type_params: Vec::new(),
        flags: SigFlags::DEFINITION,
        decl: None,
    });
    let fn_atom = c.interner.intern("__function");
    let mut fn_ty = TypeSymbol::new(fn_atom, TypeData::Interface);
    fn_ty.call_sigs.push(sig);
    let fn_ty = c.types.alloc(fn_ty);

    let atom = c.interner.intern(name);
    let mut symbol = Symbol::new(atom, SymbolKind::Method, SymbolFlags::empty());
    symbol.state = ResolveState::Resolved;
    let id = c.symbols.alloc(symbol);
    c.types.set_symbol_type(id, fn_ty);
    id
}
