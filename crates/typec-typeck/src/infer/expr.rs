//! Literals, operators and the remaining expression forms

use typec_ast::{
    Binary, BinaryOp, Cast, CastKind, FnKind, Identifier, Lambda, NodeId, NodeKind, Unary, UnaryOp,
};

use crate::error::TypeErrorKind;
use crate::factory::{default_int_kind, parse_float_literal, parse_int_literal};
use crate::types::*;

use super::unify::numeric_join;
use super::Inferer;

fn invalid_operands(op: BinaryOp, lhs: &Type, rhs: &Type) -> Type {
    Type::error(TypeErrorKind::InvalidOperands {
        op: op.symbol().to_string(),
        lhs: lhs.to_string(),
        rhs: rhs.to_string(),
    })
}

fn invalid_operand(op: UnaryOp, operand: &Type) -> Type {
    Type::error(TypeErrorKind::InvalidOperand {
        op: op.symbol().to_string(),
        operand: operand.to_string(),
    })
}

impl Inferer<'_> {
    /// The numeric primitive the context of `node` asks for, if any
    fn expected_numeric(&mut self, node: NodeId) -> Option<Primitive> {
        let expected = self.expected_type(node)?;
        let expected = self.resolve_deep(&expected.strip_nullable());
        expected.as_primitive().filter(|p| p.is_numeric())
    }

    fn is_negated(&self, node: NodeId) -> bool {
        let program = self.program;
        program.parent(node).is_some_and(|p| {
            matches!(program.kind(p), NodeKind::Unary(Unary { op: UnaryOp::Neg, .. }))
        })
    }

    pub(super) fn int_literal(&mut self, node: NodeId, text: &str) -> Type {
        let literal = match parse_int_literal(text) {
            Ok(literal) => literal,
            Err(err) => return Type::error(err),
        };
        if let Some(suffix) = literal.suffix {
            return Type::primitive(suffix);
        }

        let value = if self.is_negated(node) {
            -literal.value
        } else {
            literal.value
        };
        match self.expected_numeric(node) {
            Some(p) if p.is_float() || p.fits(value) => Type::primitive(p),
            _ => Type::primitive(default_int_kind(value, self.ctx.config.default_int)),
        }
    }

    pub(super) fn float_literal(&mut self, node: NodeId, text: &str) -> Type {
        match parse_float_literal(text) {
            Ok(Some(suffix)) => Type::primitive(suffix),
            Ok(None) => match self.expected_numeric(node) {
                Some(p) if p.is_float() => Type::primitive(p),
                _ => Type::primitive(self.ctx.config.default_float),
            },
            Err(err) => Type::error(err),
        }
    }

    pub(super) fn identifier(&mut self, id: &Identifier) -> Type {
        let program = self.program;
        let Some(target) = id.target else {
            return Type::error(TypeErrorKind::UnresolvedName(id.name.clone()));
        };
        match program.kind(target) {
            NodeKind::TypeDecl(decl) => Type::reference(target, decl.name.clone(), Vec::new()),
            NodeKind::GenericParam(_) => Type::error(TypeErrorKind::NotAValue(id.name.clone())),
            NodeKind::Pending => Type::error(TypeErrorKind::IncompleteNode),
            _ => self.get_type(target),
        }
    }

    /// `this` is the enclosing class, instantiated with its own generic
    /// parameters.
    pub(super) fn this(&mut self, node: NodeId) -> Type {
        let program = self.program;
        let class = program
            .ancestors(node)
            .find(|a| matches!(program.kind(*a), NodeKind::ClassType(_)));
        let decl = class.and_then(|c| program.parent(c));
        match decl.map(|d| (d, program.kind(d))) {
            Some((decl_node, NodeKind::TypeDecl(decl))) => {
                let args = self.types_of(&decl.generics);
                Type::reference(decl_node, decl.name.clone(), args)
            }
            _ => Type::error(TypeErrorKind::ThisOutsideClass("this".to_string())),
        }
    }

    pub(super) fn binary(&mut self, binary: &Binary) -> Type {
        let lhs = self.get_type(binary.lhs);
        let rhs = self.get_type(binary.rhs);
        for operand in [&lhs, &rhs] {
            if operand.is_placeholder() {
                return operand.clone();
            }
        }
        for operand in [&lhs, &rhs] {
            if operand.is_error() {
                return operand.clone();
            }
        }

        let op = binary.op;
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let l = self.resolve_deep(&lhs);
                let r = self.resolve_deep(&rhs);
                if l.is_primitive(Primitive::Bool) && r.is_primitive(Primitive::Bool) {
                    Type::bool()
                } else {
                    invalid_operands(op, &lhs, &rhs)
                }
            }
            BinaryOp::Coalesce => self.common_type(vec![lhs.strip_nullable(), rhs]),
            BinaryOp::Eq | BinaryOp::NotEq => Type::bool(),
            _ => {
                if let Some(method) = self.operator_method(&lhs, op.symbol(), 1) {
                    return method.return_type;
                }
                let l = self.resolve_deep(&lhs);
                let r = self.resolve_deep(&rhs);
                if l.is_any() || r.is_any() {
                    return if op.is_comparison() { Type::bool() } else { Type::any() };
                }

                if op.is_comparison() {
                    let strings =
                        l.is_primitive(Primitive::String) && r.is_primitive(Primitive::String);
                    return if strings || (l.is_numeric() && r.is_numeric()) {
                        Type::bool()
                    } else {
                        invalid_operands(op, &lhs, &rhs)
                    };
                }
                if op == BinaryOp::Add
                    && l.is_primitive(Primitive::String)
                    && r.is_primitive(Primitive::String)
                {
                    return Type::string();
                }

                let (Some(a), Some(b)) = (l.as_primitive(), r.as_primitive()) else {
                    return invalid_operands(op, &lhs, &rhs);
                };
                if op.is_bitwise() {
                    if !a.is_integer() || !b.is_integer() {
                        return invalid_operands(op, &lhs, &rhs);
                    }
                    if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                        return Type::primitive(a);
                    }
                }
                match numeric_join(a, b) {
                    Some(p) => Type::primitive(p),
                    None => invalid_operands(op, &lhs, &rhs),
                }
            }
        }
    }

    pub(super) fn unary(&mut self, unary: &Unary) -> Type {
        let operand = self.get_type(unary.operand);
        if operand.is_error() {
            return operand;
        }
        if let Some(method) = self.operator_method(&operand, unary.op.symbol(), 0) {
            return method.return_type;
        }

        let resolved = self.resolve_deep(&operand);
        if resolved.is_any() {
            return Type::any();
        }
        let ok = match unary.op {
            UnaryOp::Neg => resolved.is_numeric(),
            UnaryOp::Not => resolved.is_primitive(Primitive::Bool),
            UnaryOp::BitNot => resolved.is_integer(),
        };
        if ok {
            operand
        } else {
            invalid_operand(unary.op, &operand)
        }
    }

    pub(super) fn array_literal(&mut self, node: NodeId, elements: &[NodeId]) -> Type {
        if elements.is_empty() {
            let expected = self.expected_type(node).map(|t| self.resolve_deep(&t.strip_nullable()));
            return match expected.as_ref().map(|t| t.kind()) {
                Some(TypeKind::Array(element)) => Type::array(element.clone()),
                _ => Type::array(Type::never()),
            };
        }
        let types = self.types_of(elements);
        let element = self.common_type(types);
        if element.is_error() {
            return element;
        }
        Type::array(element)
    }

    pub(super) fn struct_literal(&mut self, fields: &[NodeId]) -> Type {
        let program = self.program;
        let mut out = Vec::with_capacity(fields.len());
        for node in fields {
            let NodeKind::StructLiteralField(field) = program.kind(*node) else {
                continue;
            };
            let ty = self.get_type(*node);
            if ty.is_placeholder() {
                return ty;
            }
            out.push(StructField {
                name: field.name.clone(),
                ty,
                node: Some(*node),
            });
        }
        Type::structure(out, true)
    }

    pub(super) fn lambda(&mut self, lambda: &Lambda) -> Type {
        let generics = self.generic_types(&lambda.generics);
        let params = self.params(&lambda.params);
        let return_type = match lambda.return_type {
            Some(annotation) => self.get_type(annotation),
            None => self.infer_body_type(Some(lambda.body), lambda.kind),
        };
        Type::function(params, return_type, generics, lambda.kind)
    }

    pub(super) fn cast(&mut self, cast: &Cast) -> Type {
        let source = self.get_type(cast.expr);
        if source.is_placeholder() {
            return source;
        }
        let target = self.get_type(cast.target);
        match cast.kind {
            CastKind::Safe => Type::nullable(target),
            CastKind::Regular | CastKind::Forced => target,
        }
    }

    pub(super) fn coroutine_expr(&mut self, function: NodeId) -> Type {
        let ty = self.get_type(function);
        if ty.is_error() {
            return ty;
        }
        let resolved = self.resolve_deep(&ty);
        match resolved.kind() {
            TypeKind::Function(f) if f.kind == FnKind::Cfn => Type::coroutine(f.clone()),
            _ => Type::error(TypeErrorKind::NotCoroutineFunction(ty.to_string())),
        }
    }
}
