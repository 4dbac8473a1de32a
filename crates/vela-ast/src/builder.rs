//! Programmatic tree construction.
//!
//! The semantic core is exercised without a parser: integration tests
//! and embedding collaborators build trees through `AstBuilder`, which
//! pairs a `NodeArena` with the session interner and stamps synthetic
//! spans so diagnostics stay distinguishable.

use crate::arena::{NodeArena, NodeIndex};
use crate::node::{BinaryOp, FunctionData, IndexKeyKind, NodeKind, UnaryOp};
use vela_common::{Atom, Interner, Span};

pub struct AstBuilder<'a> {
    pub arena: &'a mut NodeArena,
    pub interner: &'a mut Interner,
    next_pos: u32,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a mut NodeArena, interner: &'a mut Interner) -> Self {
        Self {
            arena,
            interner,
            next_pos: 0,
        }
    }

    pub fn atom(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    fn add(&mut self, kind: NodeKind) -> NodeIndex {
        let span = Span::new(self.next_pos, 1);
        self.next_pos += 1;
        self.arena.add(span, kind)
    }

    // ----- Expressions -----

    pub fn number(&mut self, value: f64) -> NodeIndex {
        self.add(NodeKind::NumberLit(value))
    }

    pub fn string(&mut self, text: &str) -> NodeIndex {
        let atom = self.atom(text);
        self.add(NodeKind::StringLit(atom))
    }

    pub fn bool_lit(&mut self, value: bool) -> NodeIndex {
        self.add(if value { NodeKind::True } else { NodeKind::False })
    }

    pub fn null(&mut self) -> NodeIndex {
        self.add(NodeKind::NullLit)
    }

    pub fn ident(&mut self, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::Ident(atom))
    }

    pub fn member(&mut self, object: NodeIndex, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::Member { object, name: atom })
    }

    pub fn index(&mut self, object: NodeIndex, index: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Index { object, index })
    }

    pub fn array(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::ArrayLit { elements })
    }

    pub fn object(&mut self, props: Vec<(&str, NodeIndex)>) -> NodeIndex {
        let props = props
            .into_iter()
            .map(|(name, value)| {
                let atom = self.atom(name);
                self.add(NodeKind::ObjectProp { name: atom, value })
            })
            .collect();
        self.add(NodeKind::ObjectLit { props })
    }

    pub fn call(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Call {
            callee,
            type_args: Vec::new(),
            args,
        })
    }

    pub fn call_with_type_args(
        &mut self,
        callee: NodeIndex,
        type_args: Vec<NodeIndex>,
        args: Vec<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::Call {
            callee,
            type_args,
            args,
        })
    }

    pub fn new_expr(&mut self, callee: NodeIndex, args: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::New {
            callee,
            type_args: Vec::new(),
            args,
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Binary { op, left, right })
    }

    pub fn prefix(&mut self, op: UnaryOp, operand: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Prefix { op, operand })
    }

    pub fn cond(
        &mut self,
        cond: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        self.add(NodeKind::Cond {
            cond,
            when_true,
            when_false,
        })
    }

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.add(NodeKind::Assign { target, value })
    }

    /// `(params) => body-expression` — a function expression with an
    /// inferred return and expression body wrapped in a return statement.
    pub fn arrow(&mut self, params: Vec<NodeIndex>, body_expr: NodeIndex) -> NodeIndex {
        let ret = self.add(NodeKind::Return {
            value: Some(body_expr),
        });
        let block = self.add(NodeKind::Block { stmts: vec![ret] });
        self.add(NodeKind::FunctionExpr(FunctionData {
            name: None,
            type_params: Vec::new(),
            params,
            return_ty: None,
            body: Some(block),
            exported: false,
        }))
    }

    // ----- Statements -----

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ExprStmt(expr))
    }

    pub fn ret(&mut self, value: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Return { value })
    }

    pub fn if_stmt(
        &mut self,
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn block(&mut self, stmts: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Block { stmts })
    }

    pub fn var(&mut self, name: &str, ty: Option<NodeIndex>, init: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        let decl = self.add(NodeKind::VarDecl {
            name: atom,
            ty,
            init,
            exported: false,
        });
        self.add(NodeKind::VarStmt {
            declarators: vec![decl],
        })
    }

    pub fn var_group(&mut self, declarators: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::VarStmt { declarators })
    }

    pub fn var_declarator(
        &mut self,
        name: &str,
        ty: Option<NodeIndex>,
        init: Option<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::VarDecl {
            name: atom,
            ty,
            init,
            exported: false,
        })
    }

    // ----- Declarations -----

    pub fn param(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::Param {
            name: atom,
            ty,
            optional: false,
            rest: false,
        })
    }

    pub fn optional_param(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::Param {
            name: atom,
            ty,
            optional: true,
            rest: false,
        })
    }

    pub fn rest_param(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::Param {
            name: atom,
            ty,
            optional: false,
            rest: true,
        })
    }

    pub fn type_param(&mut self, name: &str, constraint: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::TypeParam {
            name: atom,
            constraint,
        })
    }

    pub fn function(
        &mut self,
        name: &str,
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
        body: Option<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::FunctionDecl(FunctionData {
            name: Some(atom),
            type_params,
            params,
            return_ty,
            body,
            exported: false,
        }))
    }

    pub fn interface(
        &mut self,
        name: &str,
        type_params: Vec<NodeIndex>,
        extends: Vec<NodeIndex>,
        members: Vec<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::InterfaceDecl {
            name: atom,
            type_params,
            extends,
            members,
            exported: false,
        })
    }

    pub fn property_sig(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::PropertySig {
            name: atom,
            ty,
            optional: false,
        })
    }

    pub fn optional_property_sig(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::PropertySig {
            name: atom,
            ty,
            optional: true,
        })
    }

    pub fn method_sig(
        &mut self,
        name: &str,
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::MethodSig {
            name: atom,
            type_params,
            params,
            return_ty,
            optional: false,
        })
    }

    pub fn call_sig(
        &mut self,
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
    ) -> NodeIndex {
        self.add(NodeKind::CallSig {
            type_params,
            params,
            return_ty,
        })
    }

    pub fn index_sig(&mut self, param_name: &str, key: IndexKeyKind, ty: NodeIndex) -> NodeIndex {
        let atom = self.atom(param_name);
        self.add(NodeKind::IndexSig {
            param_name: atom,
            key,
            ty,
        })
    }

    pub fn class(
        &mut self,
        name: &str,
        type_params: Vec<NodeIndex>,
        extends: Option<NodeIndex>,
        implements: Vec<NodeIndex>,
        members: Vec<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::ClassDecl {
            name: atom,
            type_params,
            extends,
            implements,
            members,
            exported: false,
        })
    }

    pub fn property_decl(&mut self, name: &str, ty: Option<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::PropertyDecl {
            name: atom,
            ty,
            init: None,
            is_static: false,
            is_private: false,
        })
    }

    pub fn method_decl(
        &mut self,
        name: &str,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
        body: Option<NodeIndex>,
    ) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::MethodDecl {
            name: atom,
            type_params: Vec::new(),
            params,
            return_ty,
            body,
            is_static: false,
            is_private: false,
        })
    }

    pub fn ctor(&mut self, params: Vec<NodeIndex>, body: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::CtorDecl { params, body })
    }

    pub fn enum_decl(&mut self, name: &str, members: Vec<&str>) -> NodeIndex {
        let atom = self.atom(name);
        let members = members
            .into_iter()
            .map(|m| {
                let m = self.atom(m);
                self.add(NodeKind::EnumMember {
                    name: m,
                    init: None,
                })
            })
            .collect();
        self.add(NodeKind::EnumDecl {
            name: atom,
            members,
            exported: false,
        })
    }

    pub fn module(&mut self, name: &str, body: Vec<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::ModuleDecl {
            name: atom,
            body,
            exported: false,
        })
    }

    /// Mark a declaration node as exported. Mutates in place so test
    /// fixtures can stay linear.
    pub fn export(&mut self, idx: NodeIndex) -> NodeIndex {
        // Arena hands back the node by index; rewrite the flag in the kind.
        let node = self.arena.get(idx).clone();
        let kind = match node.kind {
            NodeKind::VarDecl {
                name, ty, init, ..
            } => NodeKind::VarDecl {
                name,
                ty,
                init,
                exported: true,
            },
            NodeKind::FunctionDecl(mut f) => {
                f.exported = true;
                NodeKind::FunctionDecl(f)
            }
            NodeKind::ClassDecl {
                name,
                type_params,
                extends,
                implements,
                members,
                ..
            } => NodeKind::ClassDecl {
                name,
                type_params,
                extends,
                implements,
                members,
                exported: true,
            },
            NodeKind::InterfaceDecl {
                name,
                type_params,
                extends,
                members,
                ..
            } => NodeKind::InterfaceDecl {
                name,
                type_params,
                extends,
                members,
                exported: true,
            },
            NodeKind::EnumDecl { name, members, .. } => NodeKind::EnumDecl {
                name,
                members,
                exported: true,
            },
            NodeKind::ModuleDecl { name, body, .. } => NodeKind::ModuleDecl {
                name,
                body,
                exported: true,
            },
            other => other,
        };
        self.arena.replace_kind(idx, kind);
        idx
    }

    // ----- Type annotations -----

    pub fn type_ref(&mut self, name: &str) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::TypeRef {
            path: vec![atom],
            type_args: Vec::new(),
        })
    }

    pub fn generic_type_ref(&mut self, name: &str, type_args: Vec<NodeIndex>) -> NodeIndex {
        let atom = self.atom(name);
        self.add(NodeKind::TypeRef {
            path: vec![atom],
            type_args,
        })
    }

    pub fn qualified_type_ref(&mut self, path: &[&str], type_args: Vec<NodeIndex>) -> NodeIndex {
        let path = path.iter().map(|p| self.interner.intern(p)).collect();
        self.add(NodeKind::TypeRef { path, type_args })
    }

    pub fn array_type(&mut self, element: NodeIndex) -> NodeIndex {
        self.add(NodeKind::ArrayType { element })
    }

    pub fn function_type(&mut self, params: Vec<NodeIndex>, return_ty: NodeIndex) -> NodeIndex {
        self.add(NodeKind::FunctionType { params, return_ty })
    }

    pub fn object_type(&mut self, members: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::ObjectType { members })
    }

    /// Finish a unit: wrap top-level statements into the root node.
    pub fn unit(&mut self, stmts: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeKind::Unit { stmts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_common::Interner;

    #[test]
    fn builder_allocates_distinct_spans() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut b = AstBuilder::new(&mut arena, &mut interner);
        let one = b.number(1.0);
        let two = b.number(2.0);
        assert_ne!(arena.span(one), arena.span(two));
    }

    #[test]
    fn export_rewrites_declaration_flag() {
        let mut arena = NodeArena::new();
        let mut interner = Interner::new();
        let mut b = AstBuilder::new(&mut arena, &mut interner);
        let f = b.function("f", vec![], vec![], None, None);
        b.export(f);
        match arena.kind(f) {
            NodeKind::FunctionDecl(data) => assert!(data.exported),
            other => panic!("expected function declaration, got {other:?}"),
        }
    }
}
