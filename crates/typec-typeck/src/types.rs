//! Internal type representation
//!
//! A [`Type`] is an immutable value: a shared [`TypeKind`] plus an optional
//! back-reference to the syntax node it was derived from. The back-reference
//! exists for diagnostics and navigation only. Equality, assignability and
//! the canonical string form never look at it.

use std::fmt;
use std::rc::Rc;

use typec_ast::{FnKind, NodeId};

use crate::error::TypeErrorKind;

/// Type description handed out by the checker
#[derive(Clone)]
pub struct Type {
    kind: Rc<TypeKind>,
    node: Option<NodeId>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind: Rc::new(kind),
            node: None,
        }
    }

    /// Attach the syntax node this type was derived from
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether both handles share one allocation
    pub fn ptr_eq(&self, other: &Type) -> bool {
        Rc::ptr_eq(&self.kind, &other.kind)
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.kind() {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self, prim: Primitive) -> bool {
        self.as_primitive() == Some(prim)
    }

    pub fn is_never(&self) -> bool {
        self.is_primitive(Primitive::Never)
    }

    pub fn is_null(&self) -> bool {
        self.is_primitive(Primitive::Null)
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive(Primitive::Void)
    }

    pub fn is_any(&self) -> bool {
        self.is_primitive(Primitive::Any)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_numeric())
    }

    pub fn is_integer(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_integer())
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.kind(), TypeKind::Nullable(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind(), TypeKind::Error(_))
    }

    /// One of the two internal sentinels that must never reach a user
    pub fn is_placeholder(&self) -> bool {
        match self.kind() {
            TypeKind::Error(err) => err.kind.is_placeholder(),
            _ => false,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorType> {
        match self.kind() {
            TypeKind::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceType> {
        match self.kind() {
            TypeKind::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self.kind() {
            TypeKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self.kind() {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The base of a nullable type, or the type itself
    pub fn strip_nullable(&self) -> Type {
        match self.kind() {
            TypeKind::Nullable(base) => base.clone(),
            _ => self.clone(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.kind, &other.kind) || self.kind == other.kind
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

/// The closed set of type forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(Primitive),
    Array(Type),
    Nullable(Type),
    Union(Vec<Type>),
    Join(Vec<Type>),
    Tuple(Vec<Type>),
    Struct(StructType),
    Class(ClassType),
    Interface(InterfaceType),
    Variant(VariantType),
    VariantConstructor(VariantConstructorType),
    Enum(EnumType),
    StringEnum(StringEnumType),
    Function(FunctionType),
    /// A coroutine instance built from a `cfn` signature
    Coroutine(FunctionType),
    Generic(GenericType),
    Reference(ReferenceType),
    Prototype(PrototypeType),
    Error(ErrorType),
}

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
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

impl Primitive {
    pub const INTEGERS: [Primitive; 8] = [
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
    ];

    pub const NUMERICS: [Primitive; 10] = [
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::F32,
        Primitive::F64,
    ];

    pub fn is_integer(&self) -> bool {
        Self::INTEGERS.contains(self)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        self.is_integer() && !self.is_signed()
    }

    /// Width in bits for numeric primitives
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Primitive::U8 | Primitive::I8 => Some(8),
            Primitive::U16 | Primitive::I16 => Some(16),
            Primitive::U32 | Primitive::I32 | Primitive::F32 => Some(32),
            Primitive::U64 | Primitive::I64 | Primitive::F64 => Some(64),
            _ => None,
        }
    }

    /// Inclusive value range of an integer primitive
    pub fn int_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            Primitive::U8 => (0, u8::MAX as i128),
            Primitive::U16 => (0, u16::MAX as i128),
            Primitive::U32 => (0, u32::MAX as i128),
            Primitive::U64 => (0, u64::MAX as i128),
            Primitive::I8 => (i8::MIN as i128, i8::MAX as i128),
            Primitive::I16 => (i16::MIN as i128, i16::MAX as i128),
            Primitive::I32 => (i32::MIN as i128, i32::MAX as i128),
            Primitive::I64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    pub fn fits(&self, value: i128) -> bool {
        self.int_range()
            .is_some_and(|(min, max)| value >= min && value <= max)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
            Primitive::String => "string",
            Primitive::Void => "void",
            Primitive::Null => "null",
            Primitive::Never => "never",
            Primitive::Any => "any",
            Primitive::Unset => "unset",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub fields: Vec<StructField>,
    /// Built from a literal rather than a declared annotation
    pub is_anonymous: bool,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The non-empty alias set of a method. The first name is the primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodNames {
    primary: String,
    aliases: Vec<String>,
}

impl MethodNames {
    pub fn new(names: &[String]) -> Option<Self> {
        let (primary, aliases) = names.split_first()?;
        Some(Self {
            primary: primary.clone(),
            aliases: aliases.to_vec(),
        })
    }

    pub fn single(name: impl Into<String>) -> Self {
        Self {
            primary: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|n| n == name)
    }

    pub fn overlaps(&self, other: &MethodNames) -> bool {
        self.iter().any(|n| other.contains(n))
    }
}

impl fmt::Display for MethodNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join("|"))
    }
}

#[derive(Debug, Clone)]
pub struct ClassAttribute {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub is_const: bool,
    pub is_local: bool,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ClassMethod {
    pub names: MethodNames,
    pub ty: FunctionType,
    pub is_static: bool,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassType {
    pub attributes: Vec<ClassAttribute>,
    pub methods: Vec<ClassMethod>,
    /// Declared super-interfaces
    pub super_types: Vec<Type>,
    /// Interfaces implemented through `impl` blocks
    pub impls: Vec<Type>,
}

impl ClassType {
    pub fn attribute(&self, name: &str) -> Option<&ClassAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&ClassMethod> {
        self.methods.iter().find(|m| m.names.contains(name))
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub names: MethodNames,
    pub ty: FunctionType,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub methods: Vec<InterfaceMethod>,
    pub super_types: Vec<Type>,
}

#[derive(Debug, Clone)]
pub struct VariantConstructor {
    pub name: String,
    pub params: Vec<StructField>,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantType {
    pub constructors: Vec<VariantConstructor>,
}

impl VariantType {
    pub fn constructor(&self, name: &str) -> Option<&VariantConstructor> {
        self.constructors.iter().find(|c| c.name == name)
    }
}

/// A single constructor of a variant, seen as a subtype of that variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantConstructorType {
    /// The `TypeDecl` declaring the variant, when known
    pub variant_decl: Option<NodeId>,
    pub variant_name: String,
    /// The owning variant, already substituted with `generic_args`
    pub variant: Type,
    pub name: String,
    /// Concrete arguments for the variant's generic parameters; empty while
    /// they are still to be inferred from a call
    pub generic_args: Vec<Type>,
    pub params: Vec<StructField>,
}

#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub value: Option<i64>,
    pub node: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub cases: Vec<EnumCase>,
    /// Integer representation of the cases
    pub repr: Primitive,
}

/// Member payloads compare by their structure; the `node` back-reference is
/// left out.
macro_rules! eq_without_node {
    ($($ty:ident { $($field:ident),+ })+) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $(self.$field == other.$field)&&+
                }
            }

            impl Eq for $ty {}
        )+
    };
}

eq_without_node! {
    StructField { name, ty }
    ClassAttribute { name, ty, is_static, is_const, is_local }
    ClassMethod { names, ty, is_static }
    InterfaceMethod { names, ty }
    VariantConstructor { name, params }
    EnumCase { name, value }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEnumType {
    pub cases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParam {
    pub name: String,
    pub ty: Type,
    pub is_mut: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub params: Vec<FunctionParam>,
    pub return_type: Type,
    pub generics: Vec<GenericType>,
    pub kind: FnKind,
}

impl FunctionType {
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn generic_names(&self) -> Vec<String> {
        self.generics.iter().map(|g| g.name.clone()).collect()
    }
}

/// A generic parameter standing for a not-yet-substituted type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericType {
    pub name: String,
    pub constraint: Option<Type>,
}

/// "Declaration + generic arguments", resolved lazily through the context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceType {
    /// The `TypeDecl` node
    pub decl: NodeId,
    pub name: String,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrototypeTarget {
    Array,
    Coroutine,
}

impl fmt::Display for PrototypeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrototypeTarget::Array => write!(f, "array"),
            PrototypeTarget::Coroutine => write!(f, "coroutine"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeMember {
    pub name: String,
    pub ty: Type,
}

/// Method/property table of an intrinsic type. Members are written against
/// the generic parameter `T`, which the member lookup substitutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeType {
    pub target: PrototypeTarget,
    pub members: Vec<PrototypeMember>,
}

impl PrototypeType {
    pub fn member(&self, name: &str) -> Option<&PrototypeMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorType {
    pub kind: TypeErrorKind,
    /// What the context expected, when that helps the reader
    pub expected: Option<Type>,
}

// =============================================================================
// Canonical string form
// =============================================================================

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn write_signature(f: &mut fmt::Formatter<'_>, func: &FunctionType) -> fmt::Result {
    if !func.generics.is_empty() {
        let names: Vec<&str> = func.generics.iter().map(|g| g.name.as_str()).collect();
        write!(f, "<{}>", names.join(", "))?;
    }
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| {
            if p.is_mut {
                format!("mut {}: {}", p.name, p.ty)
            } else {
                format!("{}: {}", p.name, p.ty)
            }
        })
        .collect();
    write!(f, "({}) -> {}", params.join(", "), func.return_type)
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        write_signature(f, self)
    }
}

impl fmt::Display for StructField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Primitive(p) => write!(f, "{}", p),
            TypeKind::Array(elem) => match elem.kind() {
                TypeKind::Union(_) | TypeKind::Join(_) | TypeKind::Function(_) => {
                    write!(f, "({})[]", elem)
                }
                _ => write!(f, "{}[]", elem),
            },
            TypeKind::Nullable(base) => match base.kind() {
                TypeKind::Union(_) | TypeKind::Join(_) | TypeKind::Function(_) => {
                    write!(f, "({})?", base)
                }
                _ => write!(f, "{}?", base),
            },
            TypeKind::Union(members) => write!(f, "{}", join(members, " | ")),
            TypeKind::Join(members) => write!(f, "{}", join(members, " & ")),
            TypeKind::Tuple(elems) => write!(f, "({})", join(elems, ", ")),
            TypeKind::Struct(s) => write!(f, "struct {{{}}}", join(&s.fields, ", ")),
            TypeKind::Class(c) => {
                let mut parts: Vec<String> = c
                    .attributes
                    .iter()
                    .map(|a| {
                        let prefix = if a.is_static { "static " } else { "" };
                        format!("{}{}: {}", prefix, a.name, a.ty)
                    })
                    .collect();
                for m in &c.methods {
                    let prefix = if m.is_static { "static " } else { "" };
                    parts.push(format!("{}{} {}{}", prefix, m.ty.kind, m.names, Signature(&m.ty)));
                }
                write!(f, "class {{{}}}", parts.join("; "))
            }
            TypeKind::Interface(i) => {
                let parts: Vec<String> = i
                    .methods
                    .iter()
                    .map(|m| format!("fn {}{}", m.names, Signature(&m.ty)))
                    .collect();
                write!(f, "interface {{{}}}", parts.join("; "))
            }
            TypeKind::Variant(v) => {
                let parts: Vec<String> = v
                    .constructors
                    .iter()
                    .map(|c| {
                        if c.params.is_empty() {
                            c.name.clone()
                        } else {
                            format!("{}({})", c.name, join(&c.params, ", "))
                        }
                    })
                    .collect();
                write!(f, "variant {{{}}}", parts.join(", "))
            }
            TypeKind::VariantConstructor(c) => {
                write!(f, "{}.{}", c.variant_name, c.name)?;
                if !c.generic_args.is_empty() {
                    write!(f, "<{}>", join(&c.generic_args, ", "))?;
                }
                Ok(())
            }
            TypeKind::Enum(e) => {
                let parts: Vec<String> = e
                    .cases
                    .iter()
                    .map(|c| match c.value {
                        Some(v) => format!("{} = {}", c.name, v),
                        None => c.name.clone(),
                    })
                    .collect();
                write!(f, "enum as {} {{{}}}", e.repr, parts.join(", "))
            }
            TypeKind::StringEnum(s) => {
                let parts: Vec<String> = s.cases.iter().map(|c| format!("\"{}\"", c)).collect();
                write!(f, "{}", parts.join(" | "))
            }
            TypeKind::Function(func) => write!(f, "{}", func),
            TypeKind::Coroutine(func) => write!(f, "coroutine<{}>", func),
            TypeKind::Generic(g) => write!(f, "{}", g.name),
            TypeKind::Reference(r) => {
                write!(f, "{}", r.name)?;
                if !r.args.is_empty() {
                    write!(f, "<{}>", join(&r.args, ", "))?;
                }
                Ok(())
            }
            TypeKind::Prototype(p) => write!(f, "prototype<{}>", p.target),
            TypeKind::Error(e) => write!(f, "error<{}>", e.kind),
        }
    }
}

/// Displays a signature without its call-kind keyword
struct Signature<'a>(&'a FunctionType);

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_signature(f, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_properties() {
        assert!(Primitive::U8.is_unsigned());
        assert!(Primitive::I64.is_signed());
        assert!(!Primitive::F32.is_integer());
        assert_eq!(Primitive::U16.bit_width(), Some(16));
        assert!(Primitive::U8.fits(255));
        assert!(!Primitive::U8.fits(256));
        assert!(Primitive::I8.fits(-128));
        assert_eq!(Primitive::Bool.bit_width(), None);
    }

    #[test]
    fn test_method_names() {
        let names = MethodNames::new(&["+".to_string(), "add".to_string()]).unwrap();
        assert_eq!(names.primary(), "+");
        assert!(names.contains("add"));
        assert!(!names.contains("sub"));
        assert_eq!(names.to_string(), "+|add");
        assert!(MethodNames::new(&[]).is_none());
    }

    #[test]
    fn test_equality_ignores_node() {
        let mut program = typec_ast::Program::new();
        let node = program.alloc(typec_ast::NodeKind::NullLiteral, Default::default());

        let plain = Type::primitive(Primitive::U32);
        let tagged = Type::primitive(Primitive::U32).with_node(node);
        assert_eq!(plain, tagged);
        assert_eq!(tagged.node(), Some(node));
    }

    #[test]
    fn test_display_forms() {
        let u32_ty = Type::primitive(Primitive::U32);
        assert_eq!(Type::array(u32_ty.clone()).to_string(), "u32[]");
        assert_eq!(Type::nullable(u32_ty.clone()).to_string(), "u32?");
        assert_eq!(
            Type::anonymous_struct(vec![("x", u32_ty.clone()), ("y", u32_ty.clone())]).to_string(),
            "struct {x: u32, y: u32}"
        );
        let func = Type::function(
            vec![FunctionParam {
                name: "x".into(),
                ty: u32_ty.clone(),
                is_mut: false,
            }],
            Type::primitive(Primitive::Bool),
            vec![],
            FnKind::Fn,
        );
        assert_eq!(func.to_string(), "fn(x: u32) -> bool");
        let union = Type::union(vec![u32_ty.clone(), Type::primitive(Primitive::String)]);
        assert_eq!(Type::nullable(union).to_string(), "(u32 | string)?");
    }
}
