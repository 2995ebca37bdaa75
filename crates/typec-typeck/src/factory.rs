//! Type factory: one constructor per type form.
//!
//! Constructors never fail. Conditions a caller cannot satisfy are reported by
//! building an error type instead, so the numeric literal helpers here return
//! a [`TypeErrorKind`] for the caller to wrap.

use typec_ast::{FnKind, NodeId, PrimitiveType};

use crate::error::TypeErrorKind;
use crate::types::*;

impl Type {
    pub fn primitive(prim: Primitive) -> Type {
        Type::new(TypeKind::Primitive(prim))
    }

    pub fn never() -> Type {
        Type::primitive(Primitive::Never)
    }

    pub fn null() -> Type {
        Type::primitive(Primitive::Null)
    }

    pub fn void() -> Type {
        Type::primitive(Primitive::Void)
    }

    pub fn bool() -> Type {
        Type::primitive(Primitive::Bool)
    }

    pub fn string() -> Type {
        Type::primitive(Primitive::String)
    }

    pub fn any() -> Type {
        Type::primitive(Primitive::Any)
    }

    pub fn array(element: Type) -> Type {
        Type::new(TypeKind::Array(element))
    }

    /// `T?`. Already-nullable types, `null`, `any` and errors are returned
    /// unchanged.
    pub fn nullable(base: Type) -> Type {
        match base.kind() {
            TypeKind::Nullable(_) | TypeKind::Error(_) => base,
            TypeKind::Primitive(Primitive::Null | Primitive::Any) => base,
            _ => Type::new(TypeKind::Nullable(base)),
        }
    }

    pub fn union(members: Vec<Type>) -> Type {
        Type::new(TypeKind::Union(members))
    }

    pub fn join(members: Vec<Type>) -> Type {
        Type::new(TypeKind::Join(members))
    }

    pub fn tuple(elements: Vec<Type>) -> Type {
        Type::new(TypeKind::Tuple(elements))
    }

    pub fn structure(fields: Vec<StructField>, is_anonymous: bool) -> Type {
        Type::new(TypeKind::Struct(StructType {
            fields,
            is_anonymous,
        }))
    }

    /// Anonymous struct from `(name, type)` pairs
    pub fn anonymous_struct(fields: Vec<(&str, Type)>) -> Type {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| StructField {
                name: name.to_string(),
                ty,
                node: None,
            })
            .collect();
        Type::structure(fields, true)
    }

    pub fn class(class: ClassType) -> Type {
        Type::new(TypeKind::Class(class))
    }

    pub fn interface(interface: InterfaceType) -> Type {
        Type::new(TypeKind::Interface(interface))
    }

    pub fn variant(variant: VariantType) -> Type {
        Type::new(TypeKind::Variant(variant))
    }

    pub fn variant_constructor(ctor: VariantConstructorType) -> Type {
        Type::new(TypeKind::VariantConstructor(ctor))
    }

    /// Enum with its representation picked from the explicit values when the
    /// declaration does not name one.
    pub fn enumeration(cases: Vec<EnumCase>, repr: Option<Primitive>) -> Type {
        let repr = repr.unwrap_or_else(|| enum_repr_for(&cases));
        Type::new(TypeKind::Enum(EnumType { cases, repr }))
    }

    pub fn string_enum(cases: Vec<String>) -> Type {
        Type::new(TypeKind::StringEnum(StringEnumType { cases }))
    }

    pub fn function(
        params: Vec<FunctionParam>,
        return_type: Type,
        generics: Vec<GenericType>,
        kind: FnKind,
    ) -> Type {
        Type::new(TypeKind::Function(FunctionType {
            params,
            return_type,
            generics,
            kind,
        }))
    }

    pub fn coroutine(function: FunctionType) -> Type {
        Type::new(TypeKind::Coroutine(function))
    }

    pub fn generic(name: impl Into<String>, constraint: Option<Type>) -> Type {
        Type::new(TypeKind::Generic(GenericType {
            name: name.into(),
            constraint,
        }))
    }

    pub fn reference(decl: NodeId, name: impl Into<String>, args: Vec<Type>) -> Type {
        Type::new(TypeKind::Reference(ReferenceType {
            decl,
            name: name.into(),
            args,
        }))
    }

    pub fn prototype(target: PrototypeTarget, members: Vec<PrototypeMember>) -> Type {
        Type::new(TypeKind::Prototype(PrototypeType { target, members }))
    }

    pub fn error(kind: TypeErrorKind) -> Type {
        Type::new(TypeKind::Error(ErrorType {
            kind,
            expected: None,
        }))
    }

    pub fn error_expected(kind: TypeErrorKind, expected: Type) -> Type {
        Type::new(TypeKind::Error(ErrorType {
            kind,
            expected: Some(expected),
        }))
    }

    pub fn recursion_placeholder() -> Type {
        Type::error(TypeErrorKind::RecursionPlaceholder)
    }
}

pub fn convert_primitive(prim: PrimitiveType) -> Primitive {
    match prim {
        PrimitiveType::U8 => Primitive::U8,
        PrimitiveType::U16 => Primitive::U16,
        PrimitiveType::U32 => Primitive::U32,
        PrimitiveType::U64 => Primitive::U64,
        PrimitiveType::I8 => Primitive::I8,
        PrimitiveType::I16 => Primitive::I16,
        PrimitiveType::I32 => Primitive::I32,
        PrimitiveType::I64 => Primitive::I64,
        PrimitiveType::F32 => Primitive::F32,
        PrimitiveType::F64 => Primitive::F64,
        PrimitiveType::Bool => Primitive::Bool,
        PrimitiveType::String => Primitive::String,
        PrimitiveType::Void => Primitive::Void,
        PrimitiveType::Null => Primitive::Null,
        PrimitiveType::Never => Primitive::Never,
        PrimitiveType::Any => Primitive::Any,
        PrimitiveType::Unset => Primitive::Unset,
    }
}

/// Integer primitive named by a keyword or literal suffix (`"u8"`, `"i64"`)
pub fn int_kind_from_str(s: &str) -> Option<Primitive> {
    Primitive::INTEGERS.iter().copied().find(|p| p.name() == s)
}

/// A parsed integer literal: its value and the kind its suffix asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLiteralValue {
    pub value: i128,
    pub suffix: Option<Primitive>,
}

/// Digits after a `0x`-style prefix, in either case
fn strip_radix(text: &str, marker: char) -> Option<&str> {
    let rest = text.strip_prefix('0')?;
    rest.strip_prefix(marker)
        .or_else(|| rest.strip_prefix(marker.to_ascii_uppercase()))
}

/// Parse `42`, `-7i8`, `0xffu8`, `1_000_000u64`, `0b1010`, `0o17`.
pub fn parse_int_literal(text: &str) -> Result<IntLiteralValue, TypeErrorKind> {
    let invalid = || TypeErrorKind::InvalidLiteral(text.to_string());

    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (radix, digits) = if let Some(d) = strip_radix(rest, 'x') {
        (16, d)
    } else if let Some(d) = strip_radix(rest, 'b') {
        (2, d)
    } else if let Some(d) = strip_radix(rest, 'o') {
        (8, d)
    } else {
        (10, rest)
    };

    // Hex digits include 'b'/'e', so the suffix is only split at 'u'/'i'.
    let (digits, suffix) = match digits.find(['u', 'i']) {
        Some(pos) => {
            let kind = int_kind_from_str(&digits[pos..]).ok_or_else(invalid)?;
            (&digits[..pos], Some(kind))
        }
        None => (digits, None),
    };

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }
    let magnitude = i128::from_str_radix(&cleaned, radix).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };

    if let Some(kind) = suffix {
        if !kind.fits(value) {
            return Err(TypeErrorKind::LiteralOutOfRange {
                literal: text.to_string(),
                ty: kind.to_string(),
            });
        }
    }

    Ok(IntLiteralValue { value, suffix })
}

/// Parse `1.5`, `2.0f`, `3e2f32`, `0.5f64`; returns the suffix kind if any.
pub fn parse_float_literal(text: &str) -> Result<Option<Primitive>, TypeErrorKind> {
    let (number, suffix) = if let Some(n) = text.strip_suffix("f64") {
        (n, Some(Primitive::F64))
    } else if let Some(n) = text.strip_suffix("f32") {
        (n, Some(Primitive::F32))
    } else if let Some(n) = text.strip_suffix('f') {
        (n, Some(Primitive::F32))
    } else {
        (text, None)
    };

    let cleaned: String = number.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| TypeErrorKind::InvalidLiteral(text.to_string()))?;
    Ok(suffix)
}

/// Context-free kind of an unsuffixed integer: the configured default when
/// the value fits, else the first of `i64`, `u64` that does.
pub fn default_int_kind(value: i128, default: Primitive) -> Primitive {
    [default, Primitive::I64, Primitive::U64]
        .into_iter()
        .find(|p| p.fits(value))
        .unwrap_or(Primitive::U64)
}

/// Smallest unsigned integer able to hold every explicit case value, or the
/// smallest signed one when a value is negative.
pub fn enum_repr_for(cases: &[EnumCase]) -> Primitive {
    let values: Vec<i128> = cases
        .iter()
        .enumerate()
        .map(|(i, c)| c.value.map(i128::from).unwrap_or(i as i128))
        .collect();
    let candidates = if values.iter().any(|v| *v < 0) {
        [Primitive::I8, Primitive::I16, Primitive::I32, Primitive::I64]
    } else {
        [Primitive::U8, Primitive::U16, Primitive::U32, Primitive::U64]
    };
    candidates
        .into_iter()
        .find(|p| values.iter().all(|v| p.fits(*v)))
        .unwrap_or(Primitive::I64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_literals() {
        assert_eq!(
            parse_int_literal("42").unwrap(),
            IntLiteralValue { value: 42, suffix: None }
        );
        assert_eq!(
            parse_int_literal("255u8").unwrap(),
            IntLiteralValue { value: 255, suffix: Some(Primitive::U8) }
        );
        assert_eq!(parse_int_literal("-7i8").unwrap().value, -7);
        assert_eq!(parse_int_literal("0xffu16").unwrap().value, 255);
        assert_eq!(parse_int_literal("0b1010").unwrap().value, 10);
        assert_eq!(parse_int_literal("1_000_000u64").unwrap().value, 1_000_000);
        assert_eq!(parse_int_literal("0xbe").unwrap().value, 0xbe);
    }

    #[test]
    fn test_parse_int_literal_errors() {
        assert!(matches!(
            parse_int_literal("256u8"),
            Err(TypeErrorKind::LiteralOutOfRange { .. })
        ));
        assert!(matches!(
            parse_int_literal("12u7"),
            Err(TypeErrorKind::InvalidLiteral(_))
        ));
        assert!(parse_int_literal("").is_err());
        assert!(parse_int_literal("-1u8").is_err());
    }

    #[test]
    fn test_parse_float_literals() {
        assert_eq!(parse_float_literal("1.5").unwrap(), None);
        assert_eq!(parse_float_literal("2.0f").unwrap(), Some(Primitive::F32));
        assert_eq!(parse_float_literal("3e2f64").unwrap(), Some(Primitive::F64));
        assert!(parse_float_literal("abc").is_err());
    }

    #[test]
    fn test_default_int_kind() {
        assert_eq!(default_int_kind(5, Primitive::I32), Primitive::I32);
        assert_eq!(default_int_kind(1 << 40, Primitive::I32), Primitive::I64);
        assert_eq!(default_int_kind(u64::MAX as i128, Primitive::I32), Primitive::U64);
    }

    #[test]
    fn test_int_kind_from_str() {
        assert_eq!(int_kind_from_str("u16"), Some(Primitive::U16));
        assert_eq!(int_kind_from_str("f32"), None);
    }

    #[test]
    fn test_nullable_normalizes() {
        let u8_ty = Type::primitive(Primitive::U8);
        let once = Type::nullable(u8_ty.clone());
        assert_eq!(Type::nullable(once.clone()), once);
        assert_eq!(Type::nullable(Type::null()), Type::null());
    }

    #[test]
    fn test_enum_repr() {
        let case = |name: &str, value: Option<i64>| EnumCase {
            name: name.into(),
            value,
            node: None,
        };
        assert_eq!(enum_repr_for(&[case("A", None), case("B", None)]), Primitive::U8);
        assert_eq!(enum_repr_for(&[case("A", Some(300))]), Primitive::U16);
        assert_eq!(enum_repr_for(&[case("A", Some(-1))]), Primitive::I8);
    }
}
