//! Node kinds and payloads.

use crate::arena::NodeIndex;
use vela_common::{Atom, Span};

/// A positioned syntax-tree node.
#[derive(Debug, Clone)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

/// Shared payload of function declarations and function expressions.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: Option<Atom>,
    pub type_params: Vec<NodeIndex>,
    pub params: Vec<NodeIndex>,
    pub return_ty: Option<NodeIndex>,
    /// `None` marks an overload-declaration-only signature.
    pub body: Option<NodeIndex>,
    pub exported: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    InstanceOf,
    In,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Typeof,
}

/// Key kind of an index signature.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexKeyKind {
    String,
    Number,
}

/// The closed set of syntax-node kinds the semantic core understands.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Root of one compilation unit.
    Unit { stmts: Vec<NodeIndex> },

    // ----- Expressions -----
    NumberLit(f64),
    StringLit(Atom),
    True,
    False,
    NullLit,
    Ident(Atom),
    /// Dotted access `object.name`, value or type position.
    Member {
        object: NodeIndex,
        name: Atom,
    },
    Index {
        object: NodeIndex,
        index: NodeIndex,
    },
    ArrayLit {
        elements: Vec<NodeIndex>,
    },
    ObjectLit {
        props: Vec<NodeIndex>,
    },
    ObjectProp {
        name: Atom,
        value: NodeIndex,
    },
    FunctionExpr(FunctionData),
    Call {
        callee: NodeIndex,
        type_args: Vec<NodeIndex>,
        args: Vec<NodeIndex>,
    },
    New {
        callee: NodeIndex,
        type_args: Vec<NodeIndex>,
        args: Vec<NodeIndex>,
    },
    Binary {
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    },
    Prefix {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Cond {
        cond: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    },
    Assign {
        target: NodeIndex,
        value: NodeIndex,
    },
    Paren(NodeIndex),

    // ----- Statements -----
    Block {
        stmts: Vec<NodeIndex>,
    },
    ExprStmt(NodeIndex),
    Return {
        value: Option<NodeIndex>,
    },
    If {
        cond: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    },
    /// One `var` statement; all declarators share it and must agree on type.
    VarStmt {
        declarators: Vec<NodeIndex>,
    },
    VarDecl {
        name: Atom,
        ty: Option<NodeIndex>,
        init: Option<NodeIndex>,
        exported: bool,
    },

    // ----- Declarations -----
    FunctionDecl(FunctionData),
    Param {
        name: Atom,
        ty: Option<NodeIndex>,
        optional: bool,
        rest: bool,
    },
    ClassDecl {
        name: Atom,
        type_params: Vec<NodeIndex>,
        extends: Option<NodeIndex>,
        implements: Vec<NodeIndex>,
        members: Vec<NodeIndex>,
        exported: bool,
    },
    PropertyDecl {
        name: Atom,
        ty: Option<NodeIndex>,
        init: Option<NodeIndex>,
        is_static: bool,
        is_private: bool,
    },
    MethodDecl {
        name: Atom,
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
        /// `None` marks an overload-declaration-only signature.
        body: Option<NodeIndex>,
        is_static: bool,
        is_private: bool,
    },
    CtorDecl {
        params: Vec<NodeIndex>,
        body: Option<NodeIndex>,
    },
    InterfaceDecl {
        name: Atom,
        type_params: Vec<NodeIndex>,
        extends: Vec<NodeIndex>,
        members: Vec<NodeIndex>,
        exported: bool,
    },
    PropertySig {
        name: Atom,
        ty: Option<NodeIndex>,
        optional: bool,
    },
    MethodSig {
        name: Atom,
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
        optional: bool,
    },
    CallSig {
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
    },
    ConstructSig {
        type_params: Vec<NodeIndex>,
        params: Vec<NodeIndex>,
        return_ty: Option<NodeIndex>,
    },
    IndexSig {
        param_name: Atom,
        key: IndexKeyKind,
        ty: NodeIndex,
    },
    EnumDecl {
        name: Atom,
        members: Vec<NodeIndex>,
        exported: bool,
    },
    EnumMember {
        name: Atom,
        init: Option<NodeIndex>,
    },
    ModuleDecl {
        name: Atom,
        body: Vec<NodeIndex>,
        exported: bool,
    },
    TypeParam {
        name: Atom,
        constraint: Option<NodeIndex>,
    },

    // ----- Type annotations -----
    TypeRef {
        path: Vec<Atom>,
        type_args: Vec<NodeIndex>,
    },
    ArrayType {
        element: NodeIndex,
    },
    FunctionType {
        params: Vec<NodeIndex>,
        return_ty: NodeIndex,
    },
    ObjectType {
        members: Vec<NodeIndex>,
    },
}

impl NodeKind {
    /// Literal and function-expression arguments are re-resolved under
    /// each overload candidate's parameter type during applicability
    /// trials; everything else keeps its natural type.
    pub fn is_contextually_retypable(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionExpr(_) | NodeKind::ObjectLit { .. } | NodeKind::ArrayLit { .. }
        )
    }
}
