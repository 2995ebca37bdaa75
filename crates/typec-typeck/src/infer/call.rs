//! Calls, constructions and generic argument inference

use indexmap::IndexMap;
use typec_ast::{Call, NodeId, NodeKind, New};

use crate::assign::can_coerce;
use crate::error::TypeErrorKind;
use crate::subst::{bindings_from, instantiate_function, substitute_generics, GenericBindings};
use crate::types::*;

use super::Inferer;

/// Infer generic bindings for `names` by matching parameter types against
/// argument types structurally. Conflicting numeric bindings widen to the
/// type both sides coerce to; `null` makes a binding nullable. Parameters
/// nothing constrains are bound to `never`. Bindings follow the order of
/// `names`.
pub fn infer_generics_from_arguments(
    names: &[String],
    params: &[Type],
    args: &[Type],
) -> GenericBindings {
    let mut solved: IndexMap<String, Type> = IndexMap::new();
    for (param, arg) in params.iter().zip(args) {
        unify(param, arg, names, &mut solved);
    }
    let bindings: GenericBindings = names
        .iter()
        .map(|name| {
            let ty = solved.swap_remove(name).unwrap_or_else(Type::never);
            (name.clone(), ty)
        })
        .collect();
    tracing::debug!(?bindings, "inferred generic arguments");
    bindings
}

fn unify(param: &Type, arg: &Type, names: &[String], solved: &mut IndexMap<String, Type>) {
    if arg.is_never() || arg.is_error() {
        return;
    }
    match (param.kind(), arg.kind()) {
        (TypeKind::Generic(g), _) if names.contains(&g.name) => bind(solved, &g.name, arg),
        (TypeKind::Array(p), TypeKind::Array(a)) => unify(p, a, names, solved),
        (TypeKind::Nullable(p), TypeKind::Nullable(a)) => unify(p, a, names, solved),
        (TypeKind::Nullable(_), TypeKind::Primitive(Primitive::Null)) => {}
        (TypeKind::Nullable(p), _) => unify(p, arg, names, solved),
        (TypeKind::Tuple(ps), TypeKind::Tuple(as_)) => {
            for (p, a) in ps.iter().zip(as_) {
                unify(p, a, names, solved);
            }
        }
        (TypeKind::Reference(p), TypeKind::Reference(a)) if p.decl == a.decl => {
            for (p, a) in p.args.iter().zip(&a.args) {
                unify(p, a, names, solved);
            }
        }
        (TypeKind::Reference(p), TypeKind::VariantConstructor(c))
            if c.variant_decl == Some(p.decl) =>
        {
            for (p, a) in p.args.iter().zip(&c.generic_args) {
                unify(p, a, names, solved);
            }
        }
        (TypeKind::Struct(p), TypeKind::Struct(a)) => {
            for field in &p.fields {
                if let Some(found) = a.field(&field.name) {
                    unify(&field.ty, &found.ty, names, solved);
                }
            }
        }
        (TypeKind::Function(p), TypeKind::Function(a)) => {
            for (p, a) in p.params.iter().zip(&a.params) {
                unify(&p.ty, &a.ty, names, solved);
            }
            unify(&p.return_type, &a.return_type, names, solved);
        }
        _ => {}
    }
}

fn bind(solved: &mut IndexMap<String, Type>, name: &str, arg: &Type) {
    let merged = match solved.get(name) {
        None => arg.clone(),
        Some(existing) if existing == arg => return,
        Some(existing) if existing.is_null() => Type::nullable(arg.clone()),
        Some(existing) if arg.is_null() => Type::nullable(existing.clone()),
        Some(existing) => match (existing.as_primitive(), arg.as_primitive()) {
            (Some(a), Some(b)) if can_coerce(a, b) => arg.clone(),
            (Some(a), Some(b)) if can_coerce(b, a) => return,
            (Some(a), Some(b)) => match super::unify::numeric_join(a, b) {
                Some(p) => Type::primitive(p),
                None => return,
            },
            _ => return,
        },
    };
    solved.insert(name.to_string(), merged);
}

impl Inferer<'_> {
    pub(super) fn call(&mut self, call: &Call) -> Type {
        let callee_ty = self.get_type(call.callee);
        if callee_ty.is_error() {
            return callee_ty;
        }

        let mut callee = self.resolve_deep(&callee_ty);
        let mut optional = false;
        if callee.is_nullable() && self.in_optional_chain(call.callee) {
            callee = self.resolve_deep(&callee.strip_nullable());
            optional = true;
        }

        let args = self.types_of(&call.args);
        let result = match callee.kind() {
            TypeKind::Function(func) => {
                let names = func.generic_names();
                let bindings = if !call.generic_args.is_empty() {
                    if call.generic_args.len() != names.len() {
                        return Type::error(TypeErrorKind::GenericArity {
                            name: callee_ty.to_string(),
                            expected: names.len(),
                            found: call.generic_args.len(),
                        });
                    }
                    let explicit = self.types_of(&call.generic_args);
                    bindings_from(&names, &explicit)
                } else if names.is_empty() {
                    GenericBindings::new()
                } else {
                    infer_generics_from_arguments(&names, &func.param_types(), &args)
                };
                self.register_call(&callee_ty, call.callee, &bindings);
                instantiate_function(func, &bindings).return_type
            }
            TypeKind::Coroutine(func) => func.return_type.clone(),
            TypeKind::VariantConstructor(ctor) => self.construct_variant(ctor, &args),
            TypeKind::Primitive(Primitive::Any) => Type::any(),
            _ => Type::error(TypeErrorKind::NotCallable(callee_ty.to_string())),
        };

        if optional && !result.is_error() {
            Type::nullable(result)
        } else {
            result
        }
    }

    /// A constructor applied to arguments: the variant's open generic slots
    /// are solved from the arguments.
    fn construct_variant(&mut self, ctor: &VariantConstructorType, args: &[Type]) -> Type {
        if !ctor.generic_args.is_empty() {
            return Type::variant_constructor(ctor.clone());
        }
        let names = match ctor.variant_decl.map(|d| self.program.kind(d)) {
            Some(NodeKind::TypeDecl(decl)) => self.generic_names(&decl.generics),
            _ => Vec::new(),
        };
        if names.is_empty() {
            return Type::variant_constructor(ctor.clone());
        }

        let params: Vec<Type> = ctor.params.iter().map(|p| p.ty.clone()).collect();
        let bindings = infer_generics_from_arguments(&names, &params, args);
        Type::variant_constructor(VariantConstructorType {
            variant_decl: ctor.variant_decl,
            variant_name: ctor.variant_name.clone(),
            variant: substitute_generics(&ctor.variant, &bindings),
            name: ctor.name.clone(),
            generic_args: bindings.values().cloned().collect(),
            params: ctor
                .params
                .iter()
                .map(|p| StructField {
                    name: p.name.clone(),
                    ty: substitute_generics(&p.ty, &bindings),
                    node: p.node,
                })
                .collect(),
        })
    }

    /// Record the instantiation a generic call performs. Free functions are
    /// keyed by name; methods by their class instantiation and name.
    fn register_call(&mut self, callee_ty: &Type, callee: NodeId, bindings: &GenericBindings) {
        if !self.ctx.config.register_instantiations || bindings.is_empty() {
            return;
        }
        let program = self.program;
        let Some(decl) = callee_ty.node() else {
            return;
        };
        let args: Vec<Type> = bindings.values().cloned().collect();

        match program.kind(decl) {
            NodeKind::FunctionDecl(func) => {
                self.ctx
                    .registry
                    .register_function_instantiation(decl, &func.name, &args);
            }
            NodeKind::ClassMethod(method) => {
                let NodeKind::Member(member) = program.kind(callee) else {
                    return;
                };
                let owner = self.get_type(member.base).strip_nullable();
                let Some(owner) = owner.as_reference() else {
                    return;
                };
                let class_key = self
                    .ctx
                    .registry
                    .register_class_instantiation(owner.decl, &owner.name, &owner.args);
                let name = method.names.first().map(String::as_str).unwrap_or_default();
                self.ctx
                    .registry
                    .register_method_instantiation(&class_key, decl, name, &args);
            }
            _ => {}
        }
    }

    pub(super) fn new_expr(&mut self, new: &New) -> Type {
        let program = self.program;
        let annotated = self.get_type(new.class);
        if annotated.is_error() {
            return annotated;
        }
        let Some(reference) = annotated.as_reference() else {
            return Type::error(TypeErrorKind::NotInstantiable(annotated.to_string()));
        };
        let NodeKind::TypeDecl(decl) = program.kind(reference.decl) else {
            return Type::error(TypeErrorKind::NotInstantiable(annotated.to_string()));
        };
        if !matches!(program.kind(decl.definition), NodeKind::ClassType(_)) {
            return Type::error(TypeErrorKind::NotInstantiable(annotated.to_string()));
        }

        let names = self.generic_names(&decl.generics);
        let mut class_args = reference.args.clone();
        if class_args.is_empty() && !names.is_empty() {
            let params = match self.class_syntax_member(decl.definition, "init", false) {
                Some(init) => self.signature_of(init).param_types(),
                None => Vec::new(),
            };
            let args = self.types_of(&new.args);
            class_args = infer_generics_from_arguments(&names, &params, &args)
                .into_values()
                .collect();
        }

        if self.ctx.config.register_instantiations {
            self.ctx
                .registry
                .register_class_instantiation(reference.decl, &decl.name, &class_args);
        }
        Type::reference(reference.decl, decl.name.clone(), class_args)
    }
}
