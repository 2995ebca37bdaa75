//! Member and index access

use typec_ast::{Index, Member, NodeId, NodeKind};

use crate::assign::Oracle;
use crate::error::TypeErrorKind;
use crate::subst::{bindings_from, substitute_generics};
use crate::types::*;

use super::Inferer;

fn member_not_found(member: &str, ty: &Type) -> Type {
    Type::error(TypeErrorKind::MemberNotFound {
        member: member.to_string(),
        ty: ty.to_string(),
    })
}

impl Inferer<'_> {
    /// Whether `node` sits below a `?.` in the same access chain
    pub(super) fn in_optional_chain(&self, node: NodeId) -> bool {
        let program = self.program;
        let mut current = node;
        loop {
            match program.kind(current) {
                NodeKind::Member(m) if m.optional => return true,
                NodeKind::Member(m) => current = m.base,
                NodeKind::Index(i) if i.optional => return true,
                NodeKind::Index(i) => current = i.base,
                NodeKind::Call(c) => current = c.callee,
                _ => return false,
            }
        }
    }

    /// Attribute or method node named `name` in class syntax
    pub(super) fn class_syntax_member(
        &self,
        class: NodeId,
        name: &str,
        want_static: bool,
    ) -> Option<NodeId> {
        let program = self.program;
        let NodeKind::ClassType(class) = program.kind(class) else {
            return None;
        };
        let attribute = class.attributes.iter().copied().find(|a| {
            matches!(program.kind(*a), NodeKind::ClassAttribute(attr)
                if attr.name == name && attr.is_static == want_static)
        });
        attribute.or_else(|| {
            class.methods.iter().copied().find(|m| {
                matches!(program.kind(*m), NodeKind::ClassMethod(method)
                    if method.is_static == want_static && method.names.iter().any(|n| n == name))
            })
        })
    }

    /// Instance method answering to an operator symbol with `arity`
    /// parameters
    pub(super) fn operator_method(
        &mut self,
        ty: &Type,
        symbol: &str,
        arity: usize,
    ) -> Option<FunctionType> {
        let resolved = self.resolve_deep(ty);
        let TypeKind::Class(class) = resolved.kind() else {
            return None;
        };
        class
            .methods
            .iter()
            .find(|m| !m.is_static && m.names.contains(symbol) && m.ty.params.len() == arity)
            .map(|m| m.ty.clone())
    }

    pub(super) fn member(&mut self, member: &Member) -> Type {
        if let Some(ty) = self.static_member(member) {
            return ty;
        }

        if let Some(ty) = self.this_member(member) {
            return ty;
        }

        let base = self.get_type(member.base);
        if base.is_error() {
            return base;
        }
        let mut target = self.resolve_deep(&base);
        let mut optional = false;
        if target.is_nullable() {
            if !member.optional && !self.in_optional_chain(member.base) {
                return Type::error(TypeErrorKind::NullableAccess {
                    member: member.name.clone(),
                    ty: base.to_string(),
                });
            }
            target = target.strip_nullable();
            optional = true;
        }

        let found = self.instance_member(&target, &member.name);
        if optional && !found.is_error() {
            // keep the declaration so calls through `?.` still register
            let node = found.node();
            with_optional_node(Type::nullable(found), node)
        } else {
            found
        }
    }

    /// Members of `this` are read from the class syntax, so a class body can
    /// use its own members while its type is still being computed.
    fn this_member(&mut self, member: &Member) -> Option<Type> {
        let program = self.program;
        if !matches!(program.kind(member.base), NodeKind::This) {
            return None;
        }
        let class = program
            .ancestors(member.base)
            .find(|a| matches!(program.kind(*a), NodeKind::ClassType(_)))?;
        let node = self.class_syntax_member(class, &member.name, false)?;
        Some(self.get_type(node))
    }

    /// `Type.member`: variant constructors, enum cases and static class
    /// members. `None` when the base does not name a type.
    fn static_member(&mut self, member: &Member) -> Option<Type> {
        let program = self.program;
        let NodeKind::Identifier(id) = program.kind(member.base) else {
            return None;
        };
        let decl_node = id.target?;
        let NodeKind::TypeDecl(decl) = program.kind(decl_node) else {
            return None;
        };
        let owner = Type::reference(decl_node, decl.name.clone(), Vec::new());

        let found = match program.kind(decl.definition) {
            NodeKind::VariantType(variant) => {
                let ctor = variant.constructors.iter().copied().find(|c| {
                    matches!(program.kind(*c), NodeKind::VariantConstructorDecl(d)
                        if d.name == member.name)
                });
                match ctor {
                    Some(ctor) => self.static_constructor(ctor, &decl.generics),
                    None => member_not_found(&member.name, &owner),
                }
            }
            NodeKind::EnumType(enumeration) => {
                let known = enumeration.cases.iter().any(|c| {
                    matches!(program.kind(*c), NodeKind::EnumCase(case) if case.name == member.name)
                });
                if known {
                    owner
                } else {
                    member_not_found(&member.name, &owner)
                }
            }
            NodeKind::StringEnumType(enumeration) => {
                if enumeration.cases.contains(&member.name) {
                    owner
                } else {
                    member_not_found(&member.name, &owner)
                }
            }
            NodeKind::ClassType(_) => {
                match self.class_syntax_member(decl.definition, &member.name, true) {
                    Some(node) => self.get_type(node),
                    None => member_not_found(&member.name, &owner),
                }
            }
            _ => return None,
        };
        Some(found)
    }

    /// A constructor named through its variant. Generic slots are closed
    /// with `never` when no call argument can ever fill them.
    fn static_constructor(&mut self, ctor: NodeId, generics: &[NodeId]) -> Type {
        let ty = self.get_type(ctor);
        let TypeKind::VariantConstructor(open) = ty.kind() else {
            return ty;
        };
        let names = self.generic_names(generics);
        if names.is_empty() || !open.params.is_empty() {
            return ty;
        }

        let args = vec![Type::never(); names.len()];
        let bindings = bindings_from(&names, &args);
        Type::variant_constructor(VariantConstructorType {
            variant_decl: open.variant_decl,
            variant_name: open.variant_name.clone(),
            variant: substitute_generics(&open.variant, &bindings),
            name: open.name.clone(),
            generic_args: args,
            params: Vec::new(),
        })
    }

    /// Member `name` of a value of type `ty`
    pub(super) fn instance_member(&mut self, ty: &Type, name: &str) -> Type {
        let resolved = self.resolve_deep(ty);
        match resolved.kind() {
            TypeKind::Array(element) => self
                .ctx
                .prototypes
                .member(PrototypeTarget::Array, name, element)
                .unwrap_or_else(|| member_not_found(name, ty)),
            TypeKind::Coroutine(func) => self
                .ctx
                .prototypes
                .member(PrototypeTarget::Coroutine, name, &func.return_type)
                .unwrap_or_else(|| member_not_found(name, ty)),
            TypeKind::Struct(s) => match s.field(name) {
                Some(field) => field.ty.clone(),
                None => member_not_found(name, ty),
            },
            TypeKind::VariantConstructor(c) => match c.params.iter().find(|p| p.name == name) {
                Some(param) => param.ty.clone(),
                None => member_not_found(name, ty),
            },
            TypeKind::Class(class) => {
                let attribute = class.attributes.iter().find(|a| a.name == name && !a.is_static);
                if let Some(attr) = attribute {
                    return attr.ty.clone();
                }
                match class.methods.iter().find(|m| m.names.contains(name) && !m.is_static) {
                    Some(method) => {
                        let ty = Type::new(TypeKind::Function(method.ty.clone()));
                        with_optional_node(ty, method.node)
                    }
                    None => member_not_found(name, ty),
                }
            }
            TypeKind::Interface(interface) => {
                let interface = interface.clone();
                let methods = Oracle::new(self).interface_methods(&interface);
                match methods.into_iter().find(|m| m.names.contains(name)) {
                    Some(method) => {
                        with_optional_node(Type::new(TypeKind::Function(method.ty)), method.node)
                    }
                    None => member_not_found(name, ty),
                }
            }
            TypeKind::Join(members) => {
                let members = members.clone();
                members
                    .iter()
                    .map(|m| self.instance_member(m, name))
                    .find(|t| !t.is_error())
                    .unwrap_or_else(|| member_not_found(name, ty))
            }
            TypeKind::Union(members) => {
                let members = members.clone();
                let mut found = Vec::with_capacity(members.len());
                for m in &members {
                    let t = self.instance_member(m, name);
                    if t.is_error() {
                        return member_not_found(name, ty);
                    }
                    found.push(t);
                }
                self.common_type(found)
            }
            TypeKind::Generic(g) => match &g.constraint {
                Some(constraint) => {
                    let constraint = constraint.clone();
                    self.instance_member(&constraint, name)
                }
                None => member_not_found(name, ty),
            },
            TypeKind::Primitive(Primitive::Any) => Type::any(),
            TypeKind::Primitive(Primitive::String) if name == "length" => {
                Type::primitive(Primitive::U64)
            }
            TypeKind::Error(_) => resolved.clone(),
            _ => member_not_found(name, ty),
        }
    }

    pub(super) fn index(&mut self, index: &Index) -> Type {
        let base = self.get_type(index.base);
        if base.is_error() {
            return base;
        }
        let position = self.get_type(index.index);
        if position.is_placeholder() {
            return position;
        }

        let mut target = self.resolve_deep(&base);
        let mut optional = false;
        if target.is_nullable() {
            if !index.optional && !self.in_optional_chain(index.base) {
                return Type::error(TypeErrorKind::NullableAccess {
                    member: "[]".to_string(),
                    ty: base.to_string(),
                });
            }
            target = self.resolve_deep(&target.strip_nullable());
            optional = true;
        }

        let found = self.index_into(&base, &target, index.index, &position);
        if optional && !found.is_error() {
            Type::nullable(found)
        } else {
            found
        }
    }

    fn index_into(&mut self, base: &Type, target: &Type, index: NodeId, position: &Type) -> Type {
        let invalid_index = |position: &Type| {
            Type::error(TypeErrorKind::InvalidOperands {
                op: "[]".to_string(),
                lhs: base.to_string(),
                rhs: position.to_string(),
            })
        };

        match target.kind() {
            TypeKind::Array(element) => {
                let position = self.resolve_deep(position);
                if position.is_integer() || position.is_any() || position.is_error() {
                    element.clone()
                } else {
                    invalid_index(&position)
                }
            }
            TypeKind::Tuple(elements) => {
                let literal = match self.program.kind(index) {
                    NodeKind::IntLiteral(lit) => crate::factory::parse_int_literal(&lit.text).ok(),
                    _ => None,
                };
                let Some(literal) = literal else {
                    return invalid_index(position);
                };
                usize::try_from(literal.value)
                    .ok()
                    .and_then(|i| elements.get(i).cloned())
                    .unwrap_or_else(|| {
                        Type::error(TypeErrorKind::TupleIndexOutOfBounds {
                            index: usize::try_from(literal.value).unwrap_or(usize::MAX),
                            ty: base.to_string(),
                        })
                    })
            }
            TypeKind::Primitive(Primitive::String) => Type::string(),
            TypeKind::Primitive(Primitive::Any) => Type::any(),
            TypeKind::Class(_) => match self.operator_method(target, "[]", 1) {
                Some(method) => method.return_type,
                None => Type::error(TypeErrorKind::NotIndexable(base.to_string())),
            },
            _ => Type::error(TypeErrorKind::NotIndexable(base.to_string())),
        }
    }
}

fn with_optional_node(ty: Type, node: Option<NodeId>) -> Type {
    match node {
        Some(node) => ty.with_node(node),
        None => ty,
    }
}
