//! Type annotation definitions for the AST

use super::*;
use std::fmt;

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    String,
    Void,
    Null,
    Never,
    Any,
    Unset,
}

impl PrimitiveType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let prim = match keyword {
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "string" => PrimitiveType::String,
            "void" => PrimitiveType::Void,
            "null" => PrimitiveType::Null,
            "never" => PrimitiveType::Never,
            "any" => PrimitiveType::Any,
            "unset" => PrimitiveType::Unset,
            _ => return None,
        };
        Some(prim)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::String => "string",
            PrimitiveType::Void => "void",
            PrimitiveType::Null => "null",
            PrimitiveType::Never => "never",
            PrimitiveType::Any => "any",
            PrimitiveType::Unset => "unset",
        };
        write!(f, "{}", s)
    }
}

/// `T[]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element: NodeId,
}

/// `T?`
#[derive(Debug, Clone, PartialEq)]
pub struct NullableType {
    pub base: NodeId,
}

/// `A | B`
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub members: Vec<NodeId>,
}

/// `A & B`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinType {
    pub members: Vec<NodeId>,
}

/// `(A, B)`
#[derive(Debug, Clone, PartialEq)]
pub struct TupleType {
    pub elements: Vec<NodeId>,
}

/// `struct { x: u32, y: u32 }`
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    /// `StructField` nodes
    pub fields: Vec<NodeId>,
}

/// `class SuperA, SuperB { attributes; methods; impls }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    /// `ClassAttribute` nodes
    pub attributes: Vec<NodeId>,
    /// `ClassMethod` nodes
    pub methods: Vec<NodeId>,
    /// Super-interface annotations
    pub super_types: Vec<NodeId>,
    /// Implemented interface annotations (`impl` blocks)
    pub impls: Vec<NodeId>,
}

/// `interface SuperA { methods }`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    /// `InterfaceMethod` nodes
    pub methods: Vec<NodeId>,
    pub super_types: Vec<NodeId>,
}

/// `variant { Some(value: T), None }`
#[derive(Debug, Clone, PartialEq)]
pub struct VariantType {
    /// `VariantConstructorDecl` nodes
    pub constructors: Vec<NodeId>,
}

/// `enum as u8 { A = 1, B }`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    /// `EnumCase` nodes
    pub cases: Vec<NodeId>,
    /// Explicit representation type (`as u8`), if any
    pub repr: Option<PrimitiveType>,
}

/// `"get" | "post"`
#[derive(Debug, Clone, PartialEq)]
pub struct StringEnumType {
    pub cases: Vec<String>,
}

/// `fn(x: u32) -> bool` / `cfn(...) -> T`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeAnnotation {
    /// `Param` nodes
    pub params: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub kind: FnKind,
}

/// `coroutine<cfn(...) -> T>`
#[derive(Debug, Clone, PartialEq)]
pub struct CoroutineTypeAnnotation {
    /// A `FunctionType` node
    pub function: NodeId,
}

/// `Name<Args>`; `target` is filled by the name resolver and points at a
/// `TypeDecl` or a `GenericParam`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceType {
    pub name: String,
    pub target: Option<NodeId>,
    pub args: Vec<NodeId>,
}
