//! Expression definitions for the AST

use super::*;
use std::fmt;

/// Integer literal as written, suffix included (`10`, `255u8`, `-3i64`)
#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteral {
    pub text: String,
}

impl IntLiteral {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Float literal as written (`1.5`, `2.0f`, `3e2f64`)
#[derive(Debug, Clone, PartialEq)]
pub struct FloatLiteral {
    pub text: String,
}

impl FloatLiteral {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Name reference. `target` is the declaration the resolver bound it to.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub target: Option<NodeId>,
}

impl Identifier {
    pub fn resolved(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target: Some(target),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    /// `a ?? b`
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub op: BinaryOp,
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: NodeId,
}

/// `callee<generic_args>(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: NodeId,
    /// Explicit generic argument annotations, empty when inferred
    pub generic_args: Vec<NodeId>,
    pub args: Vec<NodeId>,
}

/// `base.name` or `base?.name`
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub base: NodeId,
    pub name: String,
    pub optional: bool,
}

/// `base[index]` or `base?.[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub base: NodeId,
    pub index: NodeId,
    pub optional: bool,
}

/// `if c => a else b`
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: NodeId,
    pub then_branch: NodeId,
    pub else_branch: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub scrutinee: NodeId,
    /// `MatchArm` nodes
    pub arms: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub guard: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<NodeId>,
}

/// `{x: 1, y: 2}`
#[derive(Debug, Clone, PartialEq)]
pub struct StructLiteral {
    /// `StructLiteralField` nodes
    pub fields: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructLiteralField {
    pub name: String,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleLiteral {
    pub elements: Vec<NodeId>,
}

/// `new Class<Args>(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct New {
    /// A `ReferenceType` node naming the class
    pub class: NodeId,
    pub args: Vec<NodeId>,
}

/// `fn<T>(x: T) -> T = body`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub generics: Vec<NodeId>,
    pub params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub body: NodeId,
    pub kind: FnKind,
}

/// `as`, `as?`, `as!`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    Regular,
    Safe,
    Forced,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub expr: NodeId,
    pub target: NodeId,
    pub kind: CastKind,
}

/// `expr is Type`
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCheck {
    pub expr: NodeId,
    pub target: NodeId,
}

/// `coroutine f`
#[derive(Debug, Clone, PartialEq)]
pub struct CoroutineExpr {
    pub function: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Yield {
    pub value: Option<NodeId>,
}

/// `expr!`
#[derive(Debug, Clone, PartialEq)]
pub struct Denull {
    pub expr: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: NodeId,
    pub value: NodeId,
}
