//! The type a syntactic context expects
//!
//! Only literals, lambda parameters and empty arrays consult this; every
//! other rule types its node bottom-up.

use typec_ast::{BinaryOp, NodeId, NodeKind, UnaryOp};

use crate::types::*;

use super::Inferer;

impl Inferer<'_> {
    pub(super) fn is_numeric_literal(&self, node: NodeId) -> bool {
        match self.program.kind(node) {
            NodeKind::IntLiteral(_) | NodeKind::FloatLiteral(_) => true,
            NodeKind::Unary(u) if u.op == UnaryOp::Neg => self.is_numeric_literal(u.operand),
            _ => false,
        }
    }

    /// Annotated return type of the function, method or lambda enclosing
    /// `node`
    pub(super) fn enclosing_return_type(&mut self, node: NodeId) -> Option<Type> {
        let program = self.program;
        let owner = program.ancestors(node).find(|a| {
            matches!(
                program.kind(*a),
                NodeKind::FunctionDecl(_) | NodeKind::ClassMethod(_) | NodeKind::Lambda(_)
            )
        })?;
        let annotation = match program.kind(owner) {
            NodeKind::FunctionDecl(f) => f.return_type,
            NodeKind::ClassMethod(m) => m.return_type,
            NodeKind::Lambda(l) => l.return_type,
            _ => None,
        };
        annotation.map(|a| self.get_type(a))
    }

    fn expected_resolved(&mut self, node: NodeId) -> Option<Type> {
        let expected = self.expected_type(node)?;
        Some(self.resolve_deep(&expected.strip_nullable()))
    }

    pub(super) fn expected_type(&mut self, node: NodeId) -> Option<Type> {
        let program = self.program;
        let parent = program.parent(node)?;
        match program.kind(parent) {
            NodeKind::VariableDecl(var) if var.init == Some(node) => {
                var.annotation.map(|a| self.get_type(a))
            }
            NodeKind::StructLiteralField(field) => {
                let literal = program.parent(parent)?;
                let expected = self.expected_resolved(literal)?;
                let ty = expected.as_struct()?.field(&field.name)?.ty.clone();
                Some(ty)
            }
            NodeKind::ArrayLiteral(_) => match self.expected_resolved(parent)?.kind() {
                TypeKind::Array(element) => Some(element.clone()),
                _ => None,
            },
            NodeKind::TupleLiteral(tuple) => {
                let position = tuple.elements.iter().position(|e| *e == node)?;
                match self.expected_resolved(parent)?.kind() {
                    TypeKind::Tuple(elements) => elements.get(position).cloned(),
                    _ => None,
                }
            }
            NodeKind::Conditional(c) if c.condition != node => self.expected_type(parent),
            NodeKind::MatchArm(arm) if arm.body == node => self.expected_type(parent),
            NodeKind::Match(m) if m.scrutinee != node => self.expected_type(parent),
            NodeKind::Return(_) | NodeKind::Yield(_) => self.enclosing_return_type(parent),
            NodeKind::FunctionDecl(f) if f.body == Some(node) => {
                f.return_type.map(|r| self.get_type(r))
            }
            NodeKind::ClassMethod(m) if m.body == Some(node) => {
                m.return_type.map(|r| self.get_type(r))
            }
            NodeKind::Lambda(l) if l.body == node => match l.return_type {
                Some(r) => Some(self.get_type(r)),
                None => match self.expected_resolved(parent)?.kind() {
                    TypeKind::Function(f) => Some(f.return_type.clone()),
                    _ => None,
                },
            },
            NodeKind::Call(call) => {
                let position = call.args.iter().position(|a| *a == node)?;
                let callee = self.get_type(call.callee);
                let callee = self.resolve_deep(&callee.strip_nullable());
                match callee.kind() {
                    TypeKind::Function(f) if f.generics.is_empty() => {
                        f.params.get(position).map(|p| p.ty.clone())
                    }
                    TypeKind::VariantConstructor(c) if !c.generic_args.is_empty() => {
                        c.params.get(position).map(|p| p.ty.clone())
                    }
                    _ => None,
                }
            }
            NodeKind::New(new) => {
                let position = new.args.iter().position(|a| *a == node)?;
                self.init_param(new.class, position)
            }
            NodeKind::Assignment(a) if a.value == node => Some(self.get_type(a.target)),
            NodeKind::Unary(u) if u.op == UnaryOp::Neg => self.expected_type(parent),
            NodeKind::Binary(b) => {
                let sibling = if b.lhs == node { b.rhs } else { b.lhs };
                match b.op {
                    BinaryOp::Coalesce if b.rhs == node => {
                        Some(self.get_type(b.lhs).strip_nullable())
                    }
                    BinaryOp::Coalesce | BinaryOp::And | BinaryOp::Or => None,
                    _ if self.is_numeric_literal(sibling) => {
                        if b.op.is_comparison() {
                            None
                        } else {
                            self.expected_type(parent)
                        }
                    }
                    _ => {
                        let ty = self.get_type(sibling);
                        (!ty.is_error()).then_some(ty)
                    }
                }
            }
            _ => None,
        }
    }

    /// Parameter `position` of the `init` method of a non-generic class
    fn init_param(&mut self, class: NodeId, position: usize) -> Option<Type> {
        let program = self.program;
        let NodeKind::ReferenceType(reference) = program.kind(class) else {
            return None;
        };
        let NodeKind::TypeDecl(decl) = program.kind(reference.target?) else {
            return None;
        };
        if !decl.generics.is_empty() {
            return None;
        }
        let init = self.class_syntax_member(decl.definition, "init", false)?;
        self.signature_of(init).params.get(position).map(|p| p.ty.clone())
    }
}
