//! Lazy type inference
//!
//! [`Inferer::get_type`] checks the context's cache by node identity and, on
//! a miss, dispatches on the node kind to one rule. Rules query other nodes
//! through `get_type` again, so the order in which a host asks for types does
//! not matter. Self-reference is cut by the in-progress cache state: the
//! inner query sees the recursion placeholder, which every rule either
//! propagates or filters.
//!
//! Rules live in submodules by family:
//! - `decl`: declarations and signatures
//! - `annot`: type annotations
//! - `expr`: literals, operators and the remaining expression forms
//! - `call`: calls, constructions and generic argument inference
//! - `member`: member and index access
//! - `unify`: common type of several branches
//! - `expect`: the type a syntactic context expects

mod annot;
mod call;
mod decl;
mod expect;
mod expr;
mod member;
mod unify;

pub use call::infer_generics_from_arguments;

use typec_ast::{NodeId, NodeKind, Program};

use crate::assign::ReferenceResolver;
use crate::cache::CacheEntry;
use crate::context::{reference_key, TypeContext};
use crate::error::TypeErrorKind;
use crate::subst::{bindings_from, substitute_generics};
use crate::types::*;

pub(crate) struct Inferer<'a> {
    pub(crate) program: &'a Program,
    pub(crate) ctx: &'a mut TypeContext,
    reference_depth: usize,
}

impl<'a> Inferer<'a> {
    pub(crate) fn new(program: &'a Program, ctx: &'a mut TypeContext) -> Self {
        Self {
            program,
            ctx,
            reference_depth: 0,
        }
    }

    pub(crate) fn get_type(&mut self, node: NodeId) -> Type {
        match self.ctx.cache.get(node) {
            Some(CacheEntry::Done(ty)) => return ty.clone(),
            Some(CacheEntry::InProgress) => {
                tracing::trace!(?node, "recursion placeholder");
                self.ctx.cache.observe_in_progress(node);
                return Type::recursion_placeholder();
            }
            None => {}
        }

        tracing::trace!(?node, kind = self.program.kind(node).name(), "cache miss");
        self.ctx.cache.begin(node);
        let ty = self.dispatch(node);
        let ty = match ty.node() {
            Some(_) => ty,
            None => ty.with_node(node),
        };
        self.ctx.cache.finish(node, ty.clone());
        ty
    }

    fn dispatch(&mut self, node: NodeId) -> Type {
        let program = self.program;
        match program.kind(node) {
            NodeKind::Pending => Type::error(TypeErrorKind::IncompleteNode),

            // Declarations
            NodeKind::Module(_) => Type::void(),
            NodeKind::FunctionDecl(f) => self.function_decl(f),
            NodeKind::Param(p) => self.param(node, p),
            NodeKind::VariableDecl(v) => self.variable_decl(v),
            NodeKind::TypeDecl(t) => self.get_type(t.definition),
            NodeKind::GenericParam(g) => self.generic_param(g),
            NodeKind::ClassAttribute(a) => self.get_type(a.annotation),
            NodeKind::ClassMethod(m) => self.class_method(m),
            NodeKind::InterfaceMethod(m) => self.interface_method(m),
            NodeKind::StructField(f) => self.get_type(f.annotation),
            NodeKind::VariantConstructorDecl(c) => self.variant_constructor_decl(node, c),
            NodeKind::EnumCase(_) => self.enum_case(node),

            // Annotations
            NodeKind::PrimitiveType(p) => Type::primitive(crate::factory::convert_primitive(*p)),
            NodeKind::ArrayType(a) => Type::array(self.get_type(a.element)),
            NodeKind::NullableType(n) => Type::nullable(self.get_type(n.base)),
            NodeKind::UnionType(u) => self.union_type(&u.members),
            NodeKind::JoinType(j) => self.join_type(&j.members),
            NodeKind::TupleType(t) => Type::tuple(self.types_of(&t.elements)),
            NodeKind::StructType(s) => self.struct_type(&s.fields),
            NodeKind::ClassType(c) => self.class_type(c),
            NodeKind::InterfaceType(i) => self.interface_type(i),
            NodeKind::VariantType(v) => self.variant_type(v),
            NodeKind::EnumType(e) => self.enum_type(e),
            NodeKind::StringEnumType(s) => Type::string_enum(s.cases.clone()),
            NodeKind::FunctionType(f) => self.function_type_annotation(f),
            NodeKind::CoroutineType(c) => self.coroutine_type_annotation(c.function),
            NodeKind::ReferenceType(r) => self.reference_type(r),

            // Expressions
            NodeKind::IntLiteral(lit) => self.int_literal(node, &lit.text),
            NodeKind::FloatLiteral(lit) => self.float_literal(node, &lit.text),
            NodeKind::BoolLiteral(_) => Type::bool(),
            NodeKind::StringLiteral(_) => Type::string(),
            NodeKind::NullLiteral => Type::null(),
            NodeKind::Identifier(id) => self.identifier(id),
            NodeKind::This => self.this(node),
            NodeKind::Binary(b) => self.binary(b),
            NodeKind::Unary(u) => self.unary(u),
            NodeKind::Call(c) => self.call(c),
            NodeKind::Member(m) => self.member(m),
            NodeKind::Index(i) => self.index(i),
            NodeKind::Conditional(c) => {
                let branches = vec![self.get_type(c.then_branch), self.get_type(c.else_branch)];
                self.common_type(branches)
            }
            NodeKind::Match(m) => {
                if m.arms.is_empty() {
                    return Type::void();
                }
                let arms = self.types_of(&m.arms);
                self.common_type(arms)
            }
            NodeKind::MatchArm(a) => self.get_type(a.body),
            NodeKind::ArrayLiteral(a) => self.array_literal(node, &a.elements),
            NodeKind::StructLiteral(s) => self.struct_literal(&s.fields),
            NodeKind::StructLiteralField(f) => self.get_type(f.value),
            NodeKind::TupleLiteral(t) => Type::tuple(self.types_of(&t.elements)),
            NodeKind::New(n) => self.new_expr(n),
            NodeKind::Lambda(l) => self.lambda(l),
            NodeKind::Cast(c) => self.cast(c),
            NodeKind::InstanceCheck(_) => Type::bool(),
            NodeKind::CoroutineExpr(c) => self.coroutine_expr(c.function),
            NodeKind::Yield(_) => Type::void(),
            NodeKind::Denull(d) => self.get_type(d.expr).strip_nullable(),
            NodeKind::Assignment(a) => self.get_type(a.target),

            // Statements
            NodeKind::Block(_)
            | NodeKind::ExprStatement(_)
            | NodeKind::Return(_)
            | NodeKind::If(_)
            | NodeKind::While(_)
            | NodeKind::For(_) => Type::void(),
            NodeKind::Break | NodeKind::Continue => Type::never(),
        }
    }

    pub(crate) fn types_of(&mut self, nodes: &[NodeId]) -> Vec<Type> {
        nodes.iter().map(|n| self.get_type(*n)).collect()
    }

    /// Names of the `GenericParam` nodes in a generic parameter list
    pub(crate) fn generic_names(&self, generics: &[NodeId]) -> Vec<String> {
        generics
            .iter()
            .filter_map(|g| match self.program.kind(*g) {
                NodeKind::GenericParam(p) => Some(p.name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolve a reference (following alias chains); other types pass through
    pub(crate) fn resolve_deep(&mut self, ty: &Type) -> Type {
        match ty.as_reference() {
            Some(reference) => {
                let reference = reference.clone();
                self.resolve_reference(&reference)
            }
            None => ty.clone(),
        }
    }

    fn compute_reference(&mut self, reference: &ReferenceType) -> Type {
        let program = self.program;
        let decl = match program.kind(reference.decl) {
            NodeKind::TypeDecl(decl) => decl,
            NodeKind::GenericParam(_) => return self.get_type(reference.decl),
            _ => return Type::error(TypeErrorKind::NotAType(reference.name.clone())),
        };

        let definition = self.get_type(reference.decl);
        if definition.is_placeholder() {
            return definition;
        }

        let names = self.generic_names(&decl.generics);
        if !reference.args.is_empty() && reference.args.len() != names.len() {
            return Type::error(TypeErrorKind::GenericArity {
                name: decl.name.clone(),
                expected: names.len(),
                found: reference.args.len(),
            });
        }

        let resolved = substitute_generics(&definition, &bindings_from(&names, &reference.args));
        self.ctx.references.computations += 1;
        tracing::debug!(
            reference = %Type::new(TypeKind::Reference(reference.clone())),
            %resolved,
            "resolved reference"
        );

        let is_class = matches!(resolved.kind(), TypeKind::Class(_));
        if is_class && self.ctx.config.register_instantiations {
            self.ctx
                .registry
                .register_class_instantiation(reference.decl, &decl.name, &reference.args);
        }

        match resolved.as_reference() {
            Some(next) => {
                let next = next.clone();
                self.resolve_reference(&next)
            }
            None => resolved,
        }
    }

    /// Syntax nodes naming the members of `ty`
    pub(crate) fn identifiable_fields(&mut self, ty: &Type) -> Vec<NodeId> {
        let resolved = self.resolve_deep(&ty.strip_nullable());
        match resolved.kind() {
            TypeKind::Struct(s) => s.fields.iter().filter_map(|f| f.node).collect(),
            TypeKind::Class(c) => c
                .attributes
                .iter()
                .filter_map(|a| a.node)
                .chain(c.methods.iter().filter_map(|m| m.node))
                .collect(),
            TypeKind::Interface(i) => {
                let mut oracle = crate::assign::Oracle::new(self);
                oracle
                    .interface_methods(i)
                    .iter()
                    .filter_map(|m| m.node)
                    .collect()
            }
            TypeKind::Variant(v) => v.constructors.iter().filter_map(|c| c.node).collect(),
            TypeKind::VariantConstructor(c) => c.params.iter().filter_map(|p| p.node).collect(),
            TypeKind::Enum(e) => e.cases.iter().filter_map(|c| c.node).collect(),
            _ => Vec::new(),
        }
    }
}

impl ReferenceResolver for Inferer<'_> {
    /// Resolved at most once per `(declaration, arguments)` pair and context,
    /// unless the declaration was still being computed at the time.
    fn resolve_reference(&mut self, reference: &ReferenceType) -> Type {
        let key = reference_key(reference);
        if let Some(ty) = self.ctx.references.resolved.get(&key) {
            return ty.clone();
        }
        if self.reference_depth >= self.ctx.config.max_reference_depth {
            return Type::error(TypeErrorKind::ReferenceDepth(reference.name.clone()));
        }

        let mark = self.ctx.cache.mark();
        self.reference_depth += 1;
        let resolved = self.compute_reference(reference);
        self.reference_depth -= 1;

        if !self.ctx.cache.observed_outside(mark) && !resolved.is_placeholder() {
            self.ctx.references.resolved.insert(key, resolved.clone());
        }
        resolved
    }
}
