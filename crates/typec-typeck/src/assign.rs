//! Assignability and cast classification

use std::collections::HashSet;

use typec_ast::NodeId;

use crate::types::*;

/// Reference types are resolved lazily by whoever owns the declarations.
pub trait ReferenceResolver {
    fn resolve_reference(&mut self, reference: &ReferenceType) -> Type;
}

/// Resolver for types built without any declaration behind them.
/// References stay as they are and compare by their string form.
pub struct NoReferences;

impl ReferenceResolver for NoReferences {
    fn resolve_reference(&mut self, reference: &ReferenceType) -> Type {
        Type::new(TypeKind::Reference(reference.clone()))
    }
}

/// Result of an assignability query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignability {
    pub success: bool,
    pub message: Option<String>,
}

impl Assignability {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// How a cast from one type to another behaves at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastSafety {
    /// The source is already assignable to the target
    Safe,
    /// The cast may succeed but needs a runtime check or conversion
    Unchecked,
    /// No value of the source type can be a value of the target type
    Unrelated,
}

/// Implicit numeric coercion.
///
/// Integers widen within their signedness, unsigned integers widen into a
/// strictly larger signed type, every integer converts to every float, and
/// `f32` widens to `f64`.
pub fn can_coerce(from: Primitive, to: Primitive) -> bool {
    if from == to {
        return true;
    }
    if !from.is_numeric() || !to.is_numeric() {
        return false;
    }
    let (Some(from_width), Some(to_width)) = (from.bit_width(), to.bit_width()) else {
        return false;
    };

    match (from, to) {
        (f, t) if f.is_integer() && t.is_float() => true,
        (Primitive::F32, Primitive::F64) => true,
        (f, _) if f.is_float() => false,
        (f, t) if f.is_signed() == t.is_signed() => from_width <= to_width,
        (f, t) if f.is_unsigned() && t.is_signed() => from_width < to_width,
        _ => false,
    }
}

pub fn is_assignable<R: ReferenceResolver + ?Sized>(
    resolver: &mut R,
    actual: &Type,
    expected: &Type,
) -> Assignability {
    let result = Oracle::new(resolver).check(actual, expected);
    tracing::trace!(%actual, %expected, ok = result.is_ok(), "assignability");
    match result {
        Ok(()) => Assignability::ok(),
        Err(message) => Assignability::fail(message),
    }
}

pub fn can_cast<R: ReferenceResolver + ?Sized>(
    resolver: &mut R,
    source: &Type,
    target: &Type,
) -> CastSafety {
    let mut oracle = Oracle::new(resolver);
    if oracle.check(source, target).is_ok() {
        return CastSafety::Safe;
    }

    let source = oracle.resolve(source);
    let target = oracle.resolve(target);

    if source.is_any() || target.is_any() {
        return CastSafety::Unchecked;
    }
    if let (Some(s), Some(t)) = (source.as_primitive(), target.as_primitive()) {
        if s.is_numeric() && t.is_numeric() {
            return CastSafety::Unchecked;
        }
    }
    match (source.kind(), target.kind()) {
        (TypeKind::Enum(_), _) if target.is_integer() => return CastSafety::Unchecked,
        (_, TypeKind::Enum(_)) if source.is_integer() => return CastSafety::Unchecked,
        (TypeKind::Nullable(base), _) if oracle.check(base, &target).is_ok() => {
            return CastSafety::Unchecked
        }
        _ => {}
    }
    // Downcasts: interface to class, variant to one of its constructors,
    // union to one of its members.
    if oracle.check(&target, &source).is_ok() {
        return CastSafety::Unchecked;
    }
    CastSafety::Unrelated
}

/// One assignability query. Pairs currently under comparison are assumed to
/// hold, which makes recursive types compare coinductively.
pub(crate) struct Oracle<'r, R: ReferenceResolver + ?Sized> {
    resolver: &'r mut R,
    assuming: HashSet<(String, String)>,
}

const MAX_ALIAS_CHAIN: usize = 64;

fn mismatch(actual: &Type, expected: &Type) -> String {
    format!("type {} is not assignable to {}", actual, expected)
}

impl<'r, R: ReferenceResolver + ?Sized> Oracle<'r, R> {
    pub(crate) fn new(resolver: &'r mut R) -> Self {
        Self {
            resolver,
            assuming: HashSet::new(),
        }
    }

    /// Resolve a top-level reference, following alias chains
    pub(crate) fn resolve(&mut self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_ALIAS_CHAIN {
            let next = match current.as_reference() {
                Some(r) => self.resolver.resolve_reference(r),
                None => return current,
            };
            if next == current {
                return current;
            }
            current = next;
        }
        current
    }

    /// Like [`Oracle::resolve`], also returning the declaration that named the
    /// final type
    fn resolve_declared(&mut self, ty: &Type) -> (Option<NodeId>, Type) {
        let mut decl = None;
        let mut current = ty.clone();
        for _ in 0..MAX_ALIAS_CHAIN {
            let next = match current.as_reference() {
                Some(r) => {
                    decl = Some(r.decl);
                    self.resolver.resolve_reference(r)
                }
                None => break,
            };
            if next == current {
                break;
            }
            current = next;
        }
        (decl, current)
    }

    pub(crate) fn check(&mut self, actual: &Type, expected: &Type) -> Result<(), String> {
        if actual == expected {
            return Ok(());
        }
        // bottom type, and no cascades out of earlier errors
        if actual.is_never() || actual.is_error() || expected.is_error() || expected.is_any() {
            return Ok(());
        }

        match (actual.kind(), expected.kind()) {
            (TypeKind::Primitive(Primitive::Null), TypeKind::Nullable(_)) => return Ok(()),
            (TypeKind::Nullable(a), TypeKind::Nullable(e)) => return self.check(a, e),
            (_, TypeKind::Nullable(e)) => return self.check(actual, e),
            (TypeKind::Nullable(_), _) => {
                return Err(format!("{}: value may be null", mismatch(actual, expected)))
            }
            (TypeKind::Reference(a), TypeKind::Reference(e)) if a.decl == e.decl => {
                return self.check_arguments(&a.args, &e.args, actual, expected);
            }
            // a constructor is its variant at the same arguments
            (TypeKind::VariantConstructor(c), TypeKind::Reference(e))
                if c.variant_decl == Some(e.decl) && c.generic_args.len() == e.args.len() =>
            {
                return self.check_arguments(&c.generic_args, &e.args, actual, expected);
            }
            _ => {}
        }

        if actual.as_reference().is_none() && expected.as_reference().is_none() {
            return self.check_resolved(actual, expected);
        }

        let key = (actual.to_string(), expected.to_string());
        if self.assuming.contains(&key) {
            return Ok(());
        }
        self.assuming.insert(key.clone());

        let (actual_decl, resolved_actual) = self.resolve_declared(actual);
        let (expected_decl, resolved_expected) = self.resolve_declared(expected);

        let result = match (resolved_actual.kind(), resolved_expected.kind()) {
            // classes are nominal, whatever their shape
            (TypeKind::Class(_), TypeKind::Class(_))
                if actual_decl.is_some() && expected_decl.is_some() =>
            {
                if actual_decl == expected_decl && resolved_actual == resolved_expected {
                    Ok(())
                } else if actual_decl == expected_decl {
                    Err(mismatch(actual, expected))
                } else {
                    Err(format!("{}: distinct classes", mismatch(actual, expected)))
                }
            }
            _ if resolved_actual == resolved_expected => Ok(()),
            (TypeKind::Reference(_), _) | (_, TypeKind::Reference(_)) => {
                Err(mismatch(actual, expected))
            }
            _ => self
                .check(&resolved_actual, &resolved_expected)
                .map_err(|detail| format!("{} ({})", mismatch(actual, expected), detail)),
        };

        self.assuming.remove(&key);
        result
    }

    fn check_arguments(
        &mut self,
        actual_args: &[Type],
        expected_args: &[Type],
        actual: &Type,
        expected: &Type,
    ) -> Result<(), String> {
        if actual_args.len() != expected_args.len() {
            return Err(mismatch(actual, expected));
        }
        for (a, e) in actual_args.iter().zip(expected_args) {
            if !self.element_compatible(a, e) {
                return Err(format!(
                    "{}: argument {} does not match {}",
                    mismatch(actual, expected),
                    a,
                    e
                ));
            }
        }
        Ok(())
    }

    /// Element positions are invariant for primitives; `never` fills any slot.
    fn element_compatible(&mut self, actual: &Type, expected: &Type) -> bool {
        if actual == expected || actual.is_never() || expected.is_error() {
            return true;
        }
        if actual.as_primitive().is_some() || expected.as_primitive().is_some() {
            return false;
        }
        self.check(actual, expected).is_ok()
    }

    fn check_resolved(&mut self, actual: &Type, expected: &Type) -> Result<(), String> {
        match (actual.kind(), expected.kind()) {
            (TypeKind::Primitive(a), TypeKind::Primitive(e)) => {
                if can_coerce(*a, *e) {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }
            (TypeKind::Generic(g), _) => match &g.constraint {
                Some(constraint) => self.check(constraint, expected),
                None => Err(mismatch(actual, expected)),
            },

            (TypeKind::Union(members), _) => {
                for member in members {
                    self.check(member, expected)?;
                }
                Ok(())
            }
            (_, TypeKind::Union(members)) => {
                if members.iter().any(|m| self.check(actual, m).is_ok()) {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }
            (_, TypeKind::Join(members)) => {
                for member in members {
                    self.check(actual, member)?;
                }
                Ok(())
            }
            (TypeKind::Join(members), _) => {
                if members.iter().any(|m| self.check(m, expected).is_ok()) {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }

            (TypeKind::Array(a), TypeKind::Array(e)) => {
                if self.element_compatible(a, e) {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }
            (TypeKind::Tuple(a), TypeKind::Tuple(e)) => {
                if a.len() != e.len() {
                    return Err(format!(
                        "{}: expected {} elements, found {}",
                        mismatch(actual, expected),
                        e.len(),
                        a.len()
                    ));
                }
                for (x, y) in a.iter().zip(e) {
                    self.check(x, y)?;
                }
                Ok(())
            }
            (TypeKind::Struct(a), TypeKind::Struct(e)) => {
                for field in &e.fields {
                    let Some(found) = a.field(&field.name) else {
                        return Err(format!("missing field '{}'", field.name));
                    };
                    self.check(&found.ty, &field.ty)
                        .map_err(|detail| format!("field '{}': {}", field.name, detail))?;
                }
                Ok(())
            }

            (TypeKind::Class(c), TypeKind::Interface(i)) => {
                let instance: Vec<(&MethodNames, &FunctionType)> = c
                    .methods
                    .iter()
                    .filter(|m| !m.is_static)
                    .map(|m| (&m.names, &m.ty))
                    .collect();
                self.conforms(&instance, i)
            }
            (TypeKind::Interface(a), TypeKind::Interface(e)) => {
                let methods = self.interface_methods(a);
                let available: Vec<(&MethodNames, &FunctionType)> =
                    methods.iter().map(|m| (&m.names, &m.ty)).collect();
                self.conforms(&available, e)
            }

            (TypeKind::VariantConstructor(c), TypeKind::Variant(_)) => {
                let variant = c.variant.clone();
                self.check(&variant, expected)
            }
            (TypeKind::VariantConstructor(a), TypeKind::VariantConstructor(e)) => {
                if a.variant_name != e.variant_name || a.name != e.name {
                    return Err(mismatch(actual, expected));
                }
                self.check_arguments(&a.generic_args, &e.generic_args, actual, expected)
            }
            (TypeKind::Variant(a), TypeKind::Variant(e)) => {
                if a.constructors.len() != e.constructors.len() {
                    return Err(mismatch(actual, expected));
                }
                for ctor in &e.constructors {
                    let Some(found) = a.constructor(&ctor.name) else {
                        return Err(format!("missing constructor '{}'", ctor.name));
                    };
                    if found.params.len() != ctor.params.len() {
                        return Err(mismatch(actual, expected));
                    }
                    for (x, y) in found.params.iter().zip(&ctor.params) {
                        self.check(&x.ty, &y.ty)?;
                    }
                }
                Ok(())
            }

            (TypeKind::Function(a), TypeKind::Function(e))
            | (TypeKind::Coroutine(a), TypeKind::Coroutine(e)) => {
                if self.signature_matches(a, e) {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }

            _ => {
                if actual.to_string() == expected.to_string() {
                    Ok(())
                } else {
                    Err(mismatch(actual, expected))
                }
            }
        }
    }

    /// Every interface method needs an instance method sharing one of its
    /// names with a matching signature.
    fn conforms(
        &mut self,
        available: &[(&MethodNames, &FunctionType)],
        interface: &InterfaceType,
    ) -> Result<(), String> {
        for required in self.interface_methods(interface) {
            let found = available.iter().any(|(names, ty)| {
                names.overlaps(&required.names) && self.signature_matches(ty, &required.ty)
            });
            if !found {
                return Err(format!(
                    "missing method '{}' with signature {}",
                    required.names.primary(),
                    required.ty
                ));
            }
        }
        Ok(())
    }

    /// Methods of an interface including those of its super-interfaces
    pub(crate) fn interface_methods(&mut self, interface: &InterfaceType) -> Vec<InterfaceMethod> {
        let mut methods = interface.methods.clone();
        let mut pending = interface.super_types.clone();
        let mut seen: Vec<Type> = Vec::new();
        while let Some(super_type) = pending.pop() {
            if seen.contains(&super_type) || seen.len() > MAX_ALIAS_CHAIN {
                continue;
            }
            seen.push(super_type.clone());
            if let TypeKind::Interface(parent) = self.resolve(&super_type).kind() {
                methods.extend(parent.methods.iter().cloned());
                pending.extend(parent.super_types.iter().cloned());
            }
        }
        methods
    }

    fn signature_matches(&mut self, actual: &FunctionType, expected: &FunctionType) -> bool {
        if actual.kind != expected.kind || actual.params.len() != expected.params.len() {
            return false;
        }
        // parameters are contravariant, the return type covariant
        for (a, e) in actual.params.iter().zip(&expected.params) {
            if self.check(&e.ty, &a.ty).is_err() {
                return false;
            }
        }
        self.check(&actual.return_type, &expected.return_type).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typec_ast::FnKind;

    fn prim(p: Primitive) -> Type {
        Type::primitive(p)
    }

    fn assignable(actual: &Type, expected: &Type) -> bool {
        is_assignable(&mut NoReferences, actual, expected).success
    }

    fn method(name: &str, params: Vec<Type>, ret: Type) -> (MethodNames, FunctionType) {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| FunctionParam {
                name: format!("p{}", i),
                ty,
                is_mut: false,
            })
            .collect();
        (
            MethodNames::single(name),
            FunctionType {
                params,
                return_type: ret,
                generics: vec![],
                kind: FnKind::Fn,
            },
        )
    }

    #[test]
    fn test_numeric_lattice() {
        use Primitive::*;
        assert!(can_coerce(U8, U64));
        assert!(can_coerce(I8, I32));
        assert!(can_coerce(U16, I32));
        assert!(!can_coerce(U32, I32));
        assert!(!can_coerce(I8, U64));
        assert!(can_coerce(I64, F32));
        assert!(can_coerce(F32, F64));
        assert!(!can_coerce(F64, F32));
        assert!(!can_coerce(F32, I64));
        assert!(!can_coerce(U64, U8));
        assert!(!can_coerce(Bool, U8));
    }

    #[test]
    fn test_numeric_lattice_is_a_partial_order() {
        for a in Primitive::NUMERICS {
            for b in Primitive::NUMERICS {
                if a != b && can_coerce(a, b) {
                    assert!(!can_coerce(b, a), "{} <-> {}", a, b);
                }
                for c in Primitive::NUMERICS {
                    if can_coerce(a, b) && can_coerce(b, c) {
                        assert!(can_coerce(a, c), "{} -> {} -> {}", a, b, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_never_null_and_any() {
        let u32_ty = prim(Primitive::U32);
        assert!(assignable(&Type::never(), &u32_ty));
        assert!(assignable(&Type::never(), &Type::array(Type::string())));
        assert!(assignable(&Type::null(), &Type::nullable(u32_ty.clone())));
        assert!(!assignable(&Type::null(), &u32_ty));
        assert!(assignable(&u32_ty, &Type::any()));
        let unknown = Type::error(crate::error::TypeErrorKind::CannotInfer("x".into()));
        assert!(assignable(&u32_ty, &unknown));
        assert!(assignable(&u32_ty, &Type::nullable(u32_ty.clone())));
        assert!(!assignable(&Type::nullable(u32_ty.clone()), &u32_ty));
    }

    #[test]
    fn test_struct_width_subtyping() {
        let u32_ty = prim(Primitive::U32);
        let narrow = Type::anonymous_struct(vec![("x", u32_ty.clone()), ("y", u32_ty.clone())]);
        let wide = Type::anonymous_struct(vec![
            ("x", u32_ty.clone()),
            ("y", u32_ty.clone()),
            ("z", u32_ty.clone()),
        ]);
        assert!(assignable(&wide, &narrow));

        let result = is_assignable(&mut NoReferences, &narrow, &wide);
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("missing field 'z'"));
    }

    #[test]
    fn test_array_elements_are_invariant_for_primitives() {
        let small = Type::array(prim(Primitive::U8));
        let large = Type::array(prim(Primitive::U32));
        assert!(!assignable(&small, &large));
        assert!(assignable(&Type::array(Type::never()), &large));
    }

    #[test]
    fn test_class_conforms_to_interface() {
        let (names, ty) = method("len", vec![], prim(Primitive::U64));
        let interface = Type::interface(InterfaceType {
            methods: vec![InterfaceMethod {
                names: names.clone(),
                ty: ty.clone(),
                node: None,
            }],
            super_types: vec![],
        });
        let class = Type::class(ClassType {
            attributes: vec![],
            methods: vec![ClassMethod {
                names: MethodNames::new(&["size".to_string(), "len".to_string()]).unwrap(),
                ty,
                is_static: false,
                node: None,
            }],
            super_types: vec![],
            impls: vec![],
        });
        assert!(assignable(&class, &interface));

        let (names, ty) = method("push", vec![prim(Primitive::U8)], Type::void());
        let other = Type::interface(InterfaceType {
            methods: vec![InterfaceMethod { names, ty, node: None }],
            super_types: vec![],
        });
        assert!(!assignable(&class, &other));
    }

    fn class_with(name: &str, params: Vec<Type>, ret: Type) -> Type {
        let (names, ty) = method(name, params, ret);
        Type::class(ClassType {
            attributes: vec![],
            methods: vec![ClassMethod { names, ty, is_static: false, node: None }],
            super_types: vec![],
            impls: vec![],
        })
    }

    fn interface_with(name: &str, params: Vec<Type>, ret: Type) -> Type {
        let (names, ty) = method(name, params, ret);
        Type::interface(InterfaceType {
            methods: vec![InterfaceMethod { names, ty, node: None }],
            super_types: vec![],
        })
    }

    #[test]
    fn test_void_method_requires_void_return() {
        let class = class_with("len", vec![], Type::string());
        assert!(!assignable(&class, &interface_with("len", vec![], Type::void())));
        assert!(assignable(&class, &interface_with("len", vec![], Type::string())));
    }

    #[test]
    fn test_method_parameters_are_contravariant() {
        let interface = interface_with("push", vec![prim(Primitive::U32)], Type::void());

        let narrower = class_with("push", vec![prim(Primitive::U8)], Type::void());
        assert!(!assignable(&narrower, &interface));

        let wider = class_with("push", vec![prim(Primitive::U64)], Type::void());
        assert!(assignable(&wider, &interface));
    }

    #[test]
    fn test_unions() {
        let u8_ty = prim(Primitive::U8);
        let union = Type::union(vec![u8_ty.clone(), Type::string()]);
        assert!(assignable(&u8_ty, &union));
        assert!(!assignable(&Type::bool(), &union));
        assert!(!assignable(&union, &u8_ty));
    }

    #[test]
    fn test_cast_classification() {
        let u8_ty = prim(Primitive::U8);
        let u32_ty = prim(Primitive::U32);
        assert_eq!(can_cast(&mut NoReferences, &u8_ty, &u32_ty), CastSafety::Safe);
        assert_eq!(can_cast(&mut NoReferences, &u32_ty, &u8_ty), CastSafety::Unchecked);
        assert_eq!(
            can_cast(&mut NoReferences, &Type::nullable(u8_ty.clone()), &u8_ty),
            CastSafety::Unchecked
        );
        assert_eq!(
            can_cast(&mut NoReferences, &Type::string(), &u8_ty),
            CastSafety::Unrelated
        );
    }
}
