//! Declaration definitions for the AST

use super::*;
use std::fmt;

/// Root of a compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub items: Vec<NodeId>,
}

/// Call kind of a function: plain (`fn`) or coroutine-capable (`cfn`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FnKind {
    #[default]
    Fn,
    Cfn,
}

impl fmt::Display for FnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FnKind::Fn => write!(f, "fn"),
            FnKind::Cfn => write!(f, "cfn"),
        }
    }
}

/// Function declaration: `fn name<T>(params) -> ret = body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    /// `GenericParam` nodes
    pub generics: Vec<NodeId>,
    /// `Param` nodes
    pub params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    /// Either an expression (`= expr`) or a `Block`
    pub body: Option<NodeId>,
    pub kind: FnKind,
}

/// Function, method or lambda parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<NodeId>,
    pub is_mut: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Let,
    Const,
}

/// `let name: annotation = init`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub kind: VarKind,
    pub annotation: Option<NodeId>,
    pub init: Option<NodeId>,
}

/// `type Name<T, U> = definition`
///
/// Every named type (classes, interfaces, variants, enums, aliases) is
/// introduced through one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    /// `GenericParam` nodes
    pub generics: Vec<NodeId>,
    /// A type annotation node
    pub definition: NodeId,
}

/// Generic parameter `T: Constraint`
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub constraint: Option<NodeId>,
}

/// Class attribute `let static const name: T`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAttribute {
    pub name: String,
    pub annotation: NodeId,
    pub is_static: bool,
    pub is_const: bool,
    pub is_local: bool,
}

/// Class method. A method may answer to several names, which is how
/// operator overloads are spelled (`fn + add(other: T) -> T`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    /// Never empty; the first name is the primary one
    pub names: Vec<String>,
    pub generics: Vec<NodeId>,
    pub params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub body: Option<NodeId>,
    pub is_static: bool,
    pub kind: FnKind,
}

/// Interface method signature
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub names: Vec<String>,
    pub generics: Vec<NodeId>,
    pub params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
}

/// Struct field, also used for variant constructor parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub annotation: NodeId,
}

/// Variant constructor `Some(value: T)`
#[derive(Debug, Clone, PartialEq)]
pub struct VariantConstructorDecl {
    pub name: String,
    /// `StructField` nodes
    pub params: Vec<NodeId>,
}

/// Enum case, with an optional explicit value (integer text for numeric
/// enums, string text for string enums)
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    pub name: String,
    pub value: Option<String>,
}
