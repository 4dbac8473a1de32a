//! Type display for diagnostics.
//!
//! Short, source-like renderings: named types print their name (with
//! `<...>` argument lists for instantiations), arrays print `T[]`,
//! anonymous shapes print structurally with a depth cap so recursive
//! types stay finite.

use vela_binder::SymbolFlags;

use crate::resolver::TypeResolver;
use crate::types::{SigId, TypeData, TypeId};

const MAX_FORMAT_DEPTH: u32 = 3;

pub fn format_type(r: &mut dyn TypeResolver, ty: TypeId) -> String {
    format_with_depth(r, ty, 0)
}

fn format_with_depth(r: &mut dyn TypeResolver, ty: TypeId, depth: u32) -> String {
    if depth > MAX_FORMAT_DEPTH {
        return "...".to_string();
    }
    let data = r.types().data(ty).clone();
    match data {
        TypeData::StringLiteral(text) => {
            format!("\"{}\"", r.interner().resolve(text))
        }
        TypeData::Array { element } => {
            format!("{}[]", format_with_depth(r, element, depth + 1))
        }
        _ => {
            let (name_atom, root, type_args) = {
                let record = r.types().get(ty);
                (record.name, record.root, record.type_args.clone())
            };
            if root.is_some() && !type_args.is_empty() {
                let args: Vec<String> = type_args
                    .into_iter()
                    .map(|a| format_with_depth(r, a, depth + 1))
                    .collect();
                let name = r.interner().resolve(name_atom).to_string();
                return format!("{}<{}>", name, args.join(", "));
            }
            let name = r.interner().resolve(name_atom).to_string();
            // Synthesized names mark anonymous shapes, which print
            // structurally.
            if name.starts_with("__") && matches!(data, TypeData::Interface) {
                return format_anonymous(r, ty, depth);
            }
            name
        }
    }
}

fn format_anonymous(r: &mut dyn TypeResolver, ty: TypeId, depth: u32) -> String {
    let (members, calls) = {
        let record = r.types().get(ty);
        (
            record
                .members
                .iter()
                .map(|(&name, &sym)| (name, sym))
                .collect::<Vec<_>>(),
            record.call_sigs.clone(),
        )
    };
    // A pure function type prints as its lone call signature.
    if members.is_empty() && calls.len() == 1 {
        return format_signature(r, calls[0], depth);
    }
    let mut parts = Vec::with_capacity(members.len());
    for (name, sym) in members {
        let member_ty = r.type_of_symbol(sym);
        let rendered = format_with_depth(r, member_ty, depth + 1);
        let name = r.interner().resolve(name).to_string();
        parts.push(format!("{name}: {rendered};"));
    }
    if parts.is_empty() {
        return "{}".to_string();
    }
    format!("{{ {} }}", parts.join(" "))
}

fn format_signature(r: &mut dyn TypeResolver, sig: SigId, depth: u32) -> String {
    let (params, ret) = {
        let record = r.types().sig(sig);
        (record.params.clone(), record.ret)
    };
    let mut rendered = Vec::with_capacity(params.len());
    for param in params {
        let (name_atom, optional, rest) = {
            let symbol = r.symbols().get(param);
            (
                symbol.name,
                symbol.flags.contains(SymbolFlags::OPTIONAL),
                symbol.flags.contains(SymbolFlags::REST),
            )
        };
        let param_ty = r.type_of_symbol(param);
        let ty_text = format_with_depth(r, param_ty, depth + 1);
        let name = r.interner().resolve(name_atom).to_string();
        let prefix = if rest { "..." } else { "" };
        let suffix = if optional { "?" } else { "" };
        rendered.push(format!("{prefix}{name}{suffix}: {ty_text}"));
    }
    let ret_text = format_with_depth(r, ret, depth + 1);
    format!("({}) => {}", rendered.join(", "), ret_text)
}
