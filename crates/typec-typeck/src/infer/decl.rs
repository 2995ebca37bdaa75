//! Declarations and signatures

use typec_ast::{
    ClassMethod, FnKind, FunctionDecl, GenericParam, InterfaceMethod, NodeId, NodeKind, Param,
    VariableDecl, VariantConstructorDecl,
};

use crate::error::TypeErrorKind;
use crate::types::*;

use super::Inferer;

impl Inferer<'_> {
    pub(super) fn generic_types(&mut self, generics: &[NodeId]) -> Vec<GenericType> {
        let program = self.program;
        generics
            .iter()
            .filter_map(|g| match program.kind(*g) {
                NodeKind::GenericParam(p) => Some(GenericType {
                    name: p.name.clone(),
                    constraint: p.constraint.map(|c| self.get_type(c)),
                }),
                _ => None,
            })
            .collect()
    }

    pub(super) fn generic_param(&mut self, param: &GenericParam) -> Type {
        let constraint = param.constraint.map(|c| self.get_type(c));
        Type::generic(param.name.clone(), constraint)
    }

    pub(super) fn params(&mut self, params: &[NodeId]) -> Vec<FunctionParam> {
        let program = self.program;
        params
            .iter()
            .filter_map(|p| match program.kind(*p) {
                NodeKind::Param(param) => Some(FunctionParam {
                    name: param.name.clone(),
                    ty: self.get_type(*p),
                    is_mut: param.is_mut,
                }),
                _ => None,
            })
            .collect()
    }

    /// A parameter without annotation is only allowed on a lambda whose
    /// context expects a function type.
    pub(super) fn param(&mut self, node: NodeId, param: &Param) -> Type {
        if let Some(annotation) = param.annotation {
            return self.get_type(annotation);
        }

        let program = self.program;
        if let Some(parent) = program.parent(node) {
            if let NodeKind::Lambda(lambda) = program.kind(parent) {
                let index = lambda.params.iter().position(|p| *p == node);
                let expected = self.expected_type(parent).map(|t| self.resolve_deep(&t));
                if let (Some(index), Some(expected)) = (index, expected) {
                    if let Some(f) = expected.as_function() {
                        if let Some(p) = f.params.get(index) {
                            return p.ty.clone();
                        }
                    }
                }
            }
        }
        Type::error(TypeErrorKind::MissingAnnotation(param.name.clone()))
    }

    pub(super) fn variable_decl(&mut self, var: &VariableDecl) -> Type {
        if let Some(annotation) = var.annotation {
            return self.get_type(annotation);
        }
        let Some(init) = var.init else {
            return Type::error(TypeErrorKind::CannotInfer(var.name.clone()));
        };
        let ty = self.get_type(init);
        if ty.is_null() {
            return Type::error(TypeErrorKind::CannotInferFromNull(var.name.clone()));
        }
        ty
    }

    pub(super) fn function_decl(&mut self, func: &FunctionDecl) -> Type {
        let generics = self.generic_types(&func.generics);
        let params = self.params(&func.params);
        let return_type = match func.return_type {
            Some(annotation) => self.get_type(annotation),
            None => self.infer_body_type(func.body, func.kind),
        };
        Type::function(params, return_type, generics, func.kind)
    }

    pub(super) fn class_method(&mut self, method: &ClassMethod) -> Type {
        let generics = self.generic_types(&method.generics);
        let params = self.params(&method.params);
        let return_type = match method.return_type {
            Some(annotation) => self.get_type(annotation),
            None => self.infer_body_type(method.body, method.kind),
        };
        Type::function(params, return_type, generics, method.kind)
    }

    pub(super) fn interface_method(&mut self, method: &InterfaceMethod) -> Type {
        let generics = self.generic_types(&method.generics);
        let params = self.params(&method.params);
        let return_type = match method.return_type {
            Some(annotation) => self.get_type(annotation),
            None => Type::void(),
        };
        Type::function(params, return_type, generics, FnKind::Fn)
    }

    /// Signature of a method-like node; anything else becomes a signature
    /// returning the node's (error) type.
    pub(super) fn signature_of(&mut self, node: NodeId) -> FunctionType {
        let ty = self.get_type(node);
        match ty.kind() {
            TypeKind::Function(f) => f.clone(),
            _ => FunctionType {
                params: Vec::new(),
                return_type: ty.clone(),
                generics: Vec::new(),
                kind: FnKind::Fn,
            },
        }
    }

    /// Return type of a body without annotation: the common type of its
    /// `return` values (or `yield` values for `cfn`), the expression itself
    /// for expression bodies, `void` when nothing is returned.
    pub(super) fn infer_body_type(&mut self, body: Option<NodeId>, kind: FnKind) -> Type {
        let Some(body) = body else {
            return Type::void();
        };
        let program = self.program;

        let values: Vec<Option<NodeId>> = match (kind, program.kind(body)) {
            (FnKind::Cfn, _) => self
                .collect_in_body(body, |k| matches!(k, NodeKind::Yield(_)))
                .into_iter()
                .map(|n| match program.kind(n) {
                    NodeKind::Yield(y) => y.value,
                    _ => None,
                })
                .collect(),
            (FnKind::Fn, NodeKind::Block(_)) => self
                .collect_in_body(body, |k| matches!(k, NodeKind::Return(_)))
                .into_iter()
                .map(|n| match program.kind(n) {
                    NodeKind::Return(r) => r.value,
                    _ => None,
                })
                .collect(),
            (FnKind::Fn, _) => return settle_recursive(self.get_type(body)),
        };

        if values.is_empty() {
            return Type::void();
        }
        let types = values
            .into_iter()
            .map(|v| match v {
                Some(value) => self.get_type(value),
                None => Type::void(),
            })
            .collect();
        settle_recursive(self.common_type(types))
    }

    /// Nodes below `root` matching `pred`, not descending into nested
    /// functions, methods or lambdas.
    fn collect_in_body(&self, root: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        let program = self.program;
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let kind = program.kind(node);
            if pred(kind) {
                found.push(node);
            }
            let nested = matches!(
                kind,
                NodeKind::FunctionDecl(_) | NodeKind::ClassMethod(_) | NodeKind::Lambda(_)
            );
            if node == root || !nested {
                stack.extend(kind.children().into_iter().rev());
            }
        }
        found
    }

    /// A constructor seen from its declaration, with the variant's generic
    /// parameters still open.
    pub(super) fn variant_constructor_decl(
        &mut self,
        node: NodeId,
        ctor: &VariantConstructorDecl,
    ) -> Type {
        let program = self.program;
        let Some(variant_node) = program.parent(node) else {
            return Type::error(TypeErrorKind::IncompleteNode);
        };
        let variant = self.get_type(variant_node);
        let decl = program
            .parent(variant_node)
            .filter(|d| matches!(program.kind(*d), NodeKind::TypeDecl(_)));
        let variant_name = match decl.map(|d| program.kind(d)) {
            Some(NodeKind::TypeDecl(t)) => t.name.clone(),
            _ => "variant".to_string(),
        };
        Type::variant_constructor(VariantConstructorType {
            variant_decl: decl,
            variant_name,
            variant,
            name: ctor.name.clone(),
            generic_args: Vec::new(),
            params: self.fields(&ctor.params),
        })
    }

    pub(super) fn enum_case(&mut self, node: NodeId) -> Type {
        match self.program.parent(node) {
            Some(enum_node) => self.get_type(enum_node),
            None => Type::error(TypeErrorKind::IncompleteNode),
        }
    }
}

/// A body whose only value is the function's own recursion never returns
/// normally.
fn settle_recursive(ty: Type) -> Type {
    if ty.is_placeholder() {
        Type::never()
    } else {
        ty
    }
}
