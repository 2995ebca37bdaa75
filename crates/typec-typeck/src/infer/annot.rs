//! Type annotations

use typec_ast as ast;
use typec_ast::{FnKind, NodeId, NodeKind};

use crate::error::TypeErrorKind;
use crate::factory::{convert_primitive, parse_int_literal};
use crate::subst::simplify;
use crate::types::*;

use super::Inferer;

impl Inferer<'_> {
    /// `StructField` nodes as struct fields (also constructor parameters)
    pub(super) fn fields(&mut self, fields: &[NodeId]) -> Vec<StructField> {
        let program = self.program;
        fields
            .iter()
            .filter_map(|f| match program.kind(*f) {
                NodeKind::StructField(field) => Some(StructField {
                    name: field.name.clone(),
                    ty: self.get_type(*f),
                    node: Some(*f),
                }),
                _ => None,
            })
            .collect()
    }

    pub(super) fn union_type(&mut self, members: &[NodeId]) -> Type {
        simplify(&Type::union(self.types_of(members)))
    }

    pub(super) fn join_type(&mut self, members: &[NodeId]) -> Type {
        simplify(&Type::join(self.types_of(members)))
    }

    pub(super) fn struct_type(&mut self, fields: &[NodeId]) -> Type {
        Type::structure(self.fields(fields), false)
    }

    pub(super) fn class_type(&mut self, class: &ast::ClassType) -> Type {
        let program = self.program;

        let mut attributes = Vec::new();
        for node in &class.attributes {
            if let NodeKind::ClassAttribute(attr) = program.kind(*node) {
                attributes.push(ClassAttribute {
                    name: attr.name.clone(),
                    ty: self.get_type(*node),
                    is_static: attr.is_static,
                    is_const: attr.is_const,
                    is_local: attr.is_local,
                    node: Some(*node),
                });
            }
        }

        let mut methods = Vec::new();
        for node in &class.methods {
            if let NodeKind::ClassMethod(method) = program.kind(*node) {
                let Some(names) = MethodNames::new(&method.names) else {
                    continue;
                };
                methods.push(ClassMethod {
                    names,
                    ty: self.signature_of(*node),
                    is_static: method.is_static,
                    node: Some(*node),
                });
            }
        }

        Type::class(ClassType {
            attributes,
            methods,
            super_types: self.types_of(&class.super_types),
            impls: self.types_of(&class.impls),
        })
    }

    pub(super) fn interface_type(&mut self, interface: &ast::InterfaceType) -> Type {
        let program = self.program;
        let mut methods = Vec::new();
        for node in &interface.methods {
            if let NodeKind::InterfaceMethod(method) = program.kind(*node) {
                let Some(names) = MethodNames::new(&method.names) else {
                    continue;
                };
                methods.push(InterfaceMethod {
                    names,
                    ty: self.signature_of(*node),
                    node: Some(*node),
                });
            }
        }
        Type::interface(InterfaceType {
            methods,
            super_types: self.types_of(&interface.super_types),
        })
    }

    pub(super) fn variant_type(&mut self, variant: &ast::VariantType) -> Type {
        let program = self.program;
        let mut constructors = Vec::new();
        for node in &variant.constructors {
            if let NodeKind::VariantConstructorDecl(ctor) = program.kind(*node) {
                constructors.push(VariantConstructor {
                    name: ctor.name.clone(),
                    params: self.fields(&ctor.params),
                    node: Some(*node),
                });
            }
        }
        Type::variant(VariantType { constructors })
    }

    pub(super) fn enum_type(&mut self, enumeration: &ast::EnumType) -> Type {
        let program = self.program;
        let mut cases = Vec::new();
        for node in &enumeration.cases {
            let NodeKind::EnumCase(case) = program.kind(*node) else {
                continue;
            };
            let value = match &case.value {
                Some(text) => match parse_int_literal(text) {
                    Ok(lit) => match i64::try_from(lit.value) {
                        Ok(v) => Some(v),
                        Err(_) => {
                            return Type::error(TypeErrorKind::LiteralOutOfRange {
                                literal: text.clone(),
                                ty: Primitive::I64.to_string(),
                            })
                        }
                    },
                    Err(err) => return Type::error(err),
                },
                None => None,
            };
            cases.push(EnumCase {
                name: case.name.clone(),
                value,
                node: Some(*node),
            });
        }
        Type::enumeration(cases, enumeration.repr.map(convert_primitive))
    }

    pub(super) fn function_type_annotation(&mut self, func: &ast::FunctionTypeAnnotation) -> Type {
        let params = self.params(&func.params);
        let return_type = match func.return_type {
            Some(ret) => self.get_type(ret),
            None => Type::void(),
        };
        Type::function(params, return_type, Vec::new(), func.kind)
    }

    pub(super) fn coroutine_type_annotation(&mut self, function: NodeId) -> Type {
        let ty = self.get_type(function);
        match ty.kind() {
            TypeKind::Function(f) if f.kind == FnKind::Cfn => Type::coroutine(f.clone()),
            TypeKind::Error(_) => ty,
            _ => Type::error(TypeErrorKind::NotCoroutineFunction(ty.to_string())),
        }
    }

    /// Named types become references to their declaration; generic
    /// parameters become the parameter itself.
    pub(super) fn reference_type(&mut self, reference: &ast::ReferenceType) -> Type {
        let program = self.program;
        let Some(target) = reference.target else {
            return Type::error(TypeErrorKind::UnresolvedName(reference.name.clone()));
        };
        match program.kind(target) {
            NodeKind::TypeDecl(decl) => {
                let args = self.types_of(&reference.args);
                Type::reference(target, decl.name.clone(), args)
            }
            NodeKind::GenericParam(_) => {
                if !reference.args.is_empty() {
                    return Type::error(TypeErrorKind::GenericArity {
                        name: reference.name.clone(),
                        expected: 0,
                        found: reference.args.len(),
                    });
                }
                self.get_type(target)
            }
            _ => Type::error(TypeErrorKind::NotAType(reference.name.clone())),
        }
    }
}
