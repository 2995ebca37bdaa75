//! Generic substitution and union/join simplification

use indexmap::IndexMap;

use crate::types::*;

/// One flat `name -> type` map, scoped to a single instantiation
pub type GenericBindings = IndexMap<String, Type>;

/// Build bindings by pairing generic parameter names with arguments.
/// Extra names on either side are ignored.
pub fn bindings_from(names: &[String], args: &[Type]) -> GenericBindings {
    names
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

fn rebuilt(original: &Type, kind: TypeKind) -> Type {
    let ty = Type::new(kind);
    match original.node() {
        Some(node) => ty.with_node(node),
        None => ty,
    }
}

/// Substitute type parameters with concrete types.
///
/// Every `Generic` leaf whose name is bound is replaced; unbound generics
/// stay. A function or method that declares its own generic parameters
/// shadows outer bindings of the same name inside its signature.
pub fn substitute_generics(ty: &Type, bindings: &GenericBindings) -> Type {
    if bindings.is_empty() {
        return ty.clone();
    }

    match ty.kind() {
        TypeKind::Generic(g) => match bindings.get(&g.name) {
            Some(concrete) => concrete.clone(),
            None => match &g.constraint {
                Some(constraint) => rebuilt(
                    ty,
                    TypeKind::Generic(GenericType {
                        name: g.name.clone(),
                        constraint: Some(substitute_generics(constraint, bindings)),
                    }),
                ),
                None => ty.clone(),
            },
        },
        TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::StringEnum(_) => ty.clone(),
        TypeKind::Array(elem) => rebuilt(ty, TypeKind::Array(substitute_generics(elem, bindings))),
        TypeKind::Nullable(base) => Type::nullable(substitute_generics(base, bindings)),
        TypeKind::Union(members) => rebuilt(ty, TypeKind::Union(substitute_all(members, bindings))),
        TypeKind::Join(members) => rebuilt(ty, TypeKind::Join(substitute_all(members, bindings))),
        TypeKind::Tuple(elems) => rebuilt(ty, TypeKind::Tuple(substitute_all(elems, bindings))),
        TypeKind::Struct(s) => rebuilt(
            ty,
            TypeKind::Struct(StructType {
                fields: substitute_fields(&s.fields, bindings),
                is_anonymous: s.is_anonymous,
            }),
        ),
        TypeKind::Class(c) => rebuilt(
            ty,
            TypeKind::Class(ClassType {
                attributes: c
                    .attributes
                    .iter()
                    .map(|a| ClassAttribute {
                        ty: substitute_generics(&a.ty, bindings),
                        ..a.clone()
                    })
                    .collect(),
                methods: c
                    .methods
                    .iter()
                    .map(|m| ClassMethod {
                        ty: substitute_function(&m.ty, bindings),
                        ..m.clone()
                    })
                    .collect(),
                super_types: substitute_all(&c.super_types, bindings),
                impls: substitute_all(&c.impls, bindings),
            }),
        ),
        TypeKind::Interface(i) => rebuilt(
            ty,
            TypeKind::Interface(InterfaceType {
                methods: i
                    .methods
                    .iter()
                    .map(|m| InterfaceMethod {
                        ty: substitute_function(&m.ty, bindings),
                        ..m.clone()
                    })
                    .collect(),
                super_types: substitute_all(&i.super_types, bindings),
            }),
        ),
        TypeKind::Variant(v) => rebuilt(
            ty,
            TypeKind::Variant(VariantType {
                constructors: v
                    .constructors
                    .iter()
                    .map(|c| VariantConstructor {
                        params: substitute_fields(&c.params, bindings),
                        ..c.clone()
                    })
                    .collect(),
            }),
        ),
        TypeKind::VariantConstructor(c) => rebuilt(
            ty,
            TypeKind::VariantConstructor(VariantConstructorType {
                variant: substitute_generics(&c.variant, bindings),
                generic_args: substitute_all(&c.generic_args, bindings),
                params: substitute_fields(&c.params, bindings),
                ..c.clone()
            }),
        ),
        TypeKind::Function(f) => rebuilt(ty, TypeKind::Function(substitute_function(f, bindings))),
        TypeKind::Coroutine(f) => {
            rebuilt(ty, TypeKind::Coroutine(substitute_function(f, bindings)))
        }
        TypeKind::Reference(r) => rebuilt(
            ty,
            TypeKind::Reference(ReferenceType {
                decl: r.decl,
                name: r.name.clone(),
                args: substitute_all(&r.args, bindings),
            }),
        ),
        TypeKind::Prototype(p) => rebuilt(
            ty,
            TypeKind::Prototype(PrototypeType {
                target: p.target,
                members: p
                    .members
                    .iter()
                    .map(|m| PrototypeMember {
                        name: m.name.clone(),
                        ty: substitute_generics(&m.ty, bindings),
                    })
                    .collect(),
            }),
        ),
        TypeKind::Error(_) => ty.clone(),
    }
}

fn substitute_all(types: &[Type], bindings: &GenericBindings) -> Vec<Type> {
    types.iter().map(|t| substitute_generics(t, bindings)).collect()
}

fn substitute_fields(fields: &[StructField], bindings: &GenericBindings) -> Vec<StructField> {
    fields
        .iter()
        .map(|f| StructField {
            name: f.name.clone(),
            ty: substitute_generics(&f.ty, bindings),
            node: f.node,
        })
        .collect()
}

/// Substitute inside a signature, honoring the signature's own generic
/// parameters as a nested scope.
pub fn substitute_function(func: &FunctionType, bindings: &GenericBindings) -> FunctionType {
    let shadowed: GenericBindings;
    let scope = if func.generics.iter().any(|g| bindings.contains_key(&g.name)) {
        shadowed = bindings
            .iter()
            .filter(|(name, _)| !func.generics.iter().any(|g| &g.name == *name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        &shadowed
    } else {
        bindings
    };

    FunctionType {
        params: func
            .params
            .iter()
            .map(|p| FunctionParam {
                name: p.name.clone(),
                ty: substitute_generics(&p.ty, scope),
                is_mut: p.is_mut,
            })
            .collect(),
        return_type: substitute_generics(&func.return_type, scope),
        generics: func
            .generics
            .iter()
            .map(|g| GenericType {
                name: g.name.clone(),
                constraint: g.constraint.as_ref().map(|c| substitute_generics(c, scope)),
            })
            .collect(),
        kind: func.kind,
    }
}

/// Instantiate a generic signature: bind its own generic parameters and drop
/// them from the result.
pub fn instantiate_function(func: &FunctionType, bindings: &GenericBindings) -> FunctionType {
    let open = FunctionType {
        generics: Vec::new(),
        ..func.clone()
    };
    let mut result = substitute_function(&open, bindings);
    result.generics = func
        .generics
        .iter()
        .filter(|g| !bindings.contains_key(&g.name))
        .cloned()
        .collect();
    result
}

/// Flatten nested unions/joins, drop structural duplicates and collapse a
/// single-member union/join to that member.
pub fn simplify(ty: &Type) -> Type {
    match ty.kind() {
        TypeKind::Union(members) => {
            let flat = flatten(members, |t| match t.kind() {
                TypeKind::Union(inner) => Some(inner.clone()),
                _ => None,
            });
            collapse(ty, flat, TypeKind::Union)
        }
        TypeKind::Join(members) => {
            let flat = flatten(members, |t| match t.kind() {
                TypeKind::Join(inner) => Some(inner.clone()),
                _ => None,
            });
            collapse(ty, flat, TypeKind::Join)
        }
        TypeKind::Nullable(base) => Type::nullable(simplify(base)),
        TypeKind::Array(elem) => rebuilt(ty, TypeKind::Array(simplify(elem))),
        _ => ty.clone(),
    }
}

fn flatten(members: &[Type], nested: impl Fn(&Type) -> Option<Vec<Type>> + Copy) -> Vec<Type> {
    let mut out: Vec<Type> = Vec::new();
    for member in members {
        let member = simplify(member);
        match nested(&member) {
            Some(inner) => {
                for t in flatten(&inner, nested) {
                    if !out.contains(&t) {
                        out.push(t);
                    }
                }
            }
            None => {
                if !out.contains(&member) {
                    out.push(member);
                }
            }
        }
    }
    out
}

fn collapse(original: &Type, mut members: Vec<Type>, wrap: fn(Vec<Type>) -> TypeKind) -> Type {
    match members.len() {
        0 => Type::never(),
        1 => members.remove(0),
        _ => rebuilt(original, wrap(members)),
    }
}

/// Whether any free `Generic` leaf remains anywhere in the type. Generics a
/// function signature declares itself are bound inside that signature.
pub fn contains_generics(ty: &Type) -> bool {
    has_free_generics(ty, &mut Vec::new())
}

fn has_free_generics(ty: &Type, bound: &mut Vec<String>) -> bool {
    match ty.kind() {
        TypeKind::Generic(g) => !bound.contains(&g.name),
        TypeKind::Primitive(_)
        | TypeKind::Enum(_)
        | TypeKind::StringEnum(_)
        | TypeKind::Error(_) => false,
        TypeKind::Array(t) | TypeKind::Nullable(t) => has_free_generics(t, bound),
        TypeKind::Union(ts) | TypeKind::Join(ts) | TypeKind::Tuple(ts) => {
            ts.iter().any(|t| has_free_generics(t, bound))
        }
        TypeKind::Struct(s) => s.fields.iter().any(|f| has_free_generics(&f.ty, bound)),
        TypeKind::Class(c) => {
            c.attributes.iter().any(|a| has_free_generics(&a.ty, bound))
                || c.methods.iter().any(|m| function_has_free_generics(&m.ty, bound))
        }
        TypeKind::Interface(i) => i
            .methods
            .iter()
            .any(|m| function_has_free_generics(&m.ty, bound)),
        TypeKind::Variant(v) => v
            .constructors
            .iter()
            .any(|c| c.params.iter().any(|p| has_free_generics(&p.ty, bound))),
        TypeKind::VariantConstructor(c) => {
            c.generic_args.iter().any(|t| has_free_generics(t, bound))
        }
        TypeKind::Function(f) | TypeKind::Coroutine(f) => function_has_free_generics(f, bound),
        TypeKind::Reference(r) => r.args.iter().any(|t| has_free_generics(t, bound)),
        TypeKind::Prototype(p) => p.members.iter().any(|m| has_free_generics(&m.ty, bound)),
    }
}

fn function_has_free_generics(func: &FunctionType, bound: &mut Vec<String>) -> bool {
    let scope = bound.len();
    bound.extend(func.generics.iter().map(|g| g.name.clone()));
    let open = func.params.iter().any(|p| has_free_generics(&p.ty, bound))
        || has_free_generics(&func.return_type, bound);
    bound.truncate(scope);
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use typec_ast::FnKind;

    fn u32_ty() -> Type {
        Type::primitive(Primitive::U32)
    }

    fn t() -> Type {
        Type::generic("T", None)
    }

    fn bind(name: &str, ty: Type) -> GenericBindings {
        let mut b = GenericBindings::new();
        b.insert(name.to_string(), ty);
        b
    }

    fn param(name: &str, ty: Type) -> FunctionParam {
        FunctionParam {
            name: name.into(),
            ty,
            is_mut: false,
        }
    }

    #[test]
    fn test_substitute_composites() {
        let ty = Type::anonymous_struct(vec![
            ("items", Type::array(t())),
            ("first", Type::nullable(t())),
            ("pair", Type::tuple(vec![t(), Type::string()])),
        ]);
        let result = substitute_generics(&ty, &bind("T", u32_ty()));
        assert_eq!(
            result.to_string(),
            "struct {items: u32[], first: u32?, pair: (u32, string)}"
        );
    }

    #[test]
    fn test_unbound_generic_untouched() {
        let ty = Type::array(Type::generic("U", None));
        let result = substitute_generics(&ty, &bind("T", u32_ty()));
        assert_eq!(result, ty);
    }

    #[test]
    fn test_substitution_is_idempotent() {
        let ty = Type::function(
            vec![param("x", t()), param("xs", Type::array(t()))],
            Type::nullable(t()),
            vec![],
            FnKind::Fn,
        );
        let bindings = bind("T", Type::string());
        let once = substitute_generics(&ty, &bindings);
        let twice = substitute_generics(&once, &bindings);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inner_generic_scope_is_not_captured() {
        // fn map<T>(x: T) -> T inside a scope that binds an outer T
        let inner = Type::function(
            vec![param("x", t())],
            t(),
            vec![GenericType { name: "T".into(), constraint: None }],
            FnKind::Fn,
        );
        let result = substitute_generics(&inner, &bind("T", u32_ty()));
        assert_eq!(result, inner);
    }

    #[test]
    fn test_instantiate_function_drops_bound_generics() {
        let func = FunctionType {
            params: vec![param("x", t())],
            return_type: t(),
            generics: vec![GenericType { name: "T".into(), constraint: None }],
            kind: FnKind::Fn,
        };
        let result = instantiate_function(&func, &bind("T", u32_ty()));
        assert!(result.generics.is_empty());
        assert_eq!(result.return_type, u32_ty());
    }

    #[test]
    fn test_simplify_flattens_and_dedupes() {
        let nested = Type::union(vec![
            u32_ty(),
            Type::union(vec![Type::string(), u32_ty()]),
            Type::string(),
        ]);
        assert_eq!(simplify(&nested).to_string(), "u32 | string");

        let single = Type::join(vec![u32_ty(), Type::join(vec![u32_ty()])]);
        assert_eq!(simplify(&single), u32_ty());
    }

    #[test]
    fn test_contains_generics() {
        assert!(contains_generics(&Type::array(t())));
        assert!(!contains_generics(&Type::array(u32_ty())));
        let own = Type::function(
            vec![param("x", t())],
            t(),
            vec![GenericType { name: "T".into(), constraint: None }],
            FnKind::Fn,
        );
        assert!(!contains_generics(&own));
    }

    #[test]
    fn test_own_generics_are_bound_below_the_signature() {
        let t_own = vec![GenericType { name: "T".into(), constraint: None }];
        let xs = param("xs", Type::array(t()));
        let nested = Type::function(vec![xs], t(), t_own.clone(), FnKind::Fn);
        assert!(!contains_generics(&nested));
        assert!(!contains_generics(&Type::array(nested.clone())));
        // the binding ends with the signature
        assert!(contains_generics(&Type::tuple(vec![nested, t()])));

        let free = Type::function(
            vec![param("xs", Type::array(Type::generic("U", None)))],
            t(),
            t_own,
            FnKind::Fn,
        );
        assert!(contains_generics(&free));
    }
}
