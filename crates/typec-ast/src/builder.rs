//! Convenience constructors for building resolved trees.
//!
//! The parser and the name resolver use these to materialize a [`Program`];
//! so do the checker's tests. Each node gets a distinct one-byte span so
//! diagnostics can tell nodes apart even without real source text.

use super::*;

/// Incrementally builds a [`Program`] and its root module
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    items: Vec<NodeId>,
    offset: usize,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_span(&mut self) -> Span {
        let span = Span::new(self.offset, self.offset + 1, 0);
        self.offset += 1;
        span
    }

    /// Allocate any node kind
    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        let span = self.next_span();
        self.program.alloc(kind, span)
    }

    /// Allocate a node with an explicit span
    pub fn node_at(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.program.alloc(kind, span)
    }

    pub fn reserve(&mut self) -> NodeId {
        self.program.reserve()
    }

    pub fn fill(&mut self, id: NodeId, kind: NodeKind) {
        let span = self.next_span();
        self.program.fill(id, kind, span);
    }

    /// Register a top-level item of the module
    pub fn item(&mut self, id: NodeId) -> NodeId {
        self.items.push(id);
        id
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Wrap the registered items in a `Module` root and hand the tree over
    pub fn finish(mut self) -> Program {
        let items = std::mem::take(&mut self.items);
        let root = self.node(NodeKind::Module(Module { items }));
        self.program.set_root(root);
        self.program
    }

    // -------------------------------------------------------------------------
    // Type annotations
    // -------------------------------------------------------------------------

    pub fn prim(&mut self, prim: PrimitiveType) -> NodeId {
        self.node(NodeKind::PrimitiveType(prim))
    }

    pub fn array_ty(&mut self, element: NodeId) -> NodeId {
        self.node(NodeKind::ArrayType(ArrayType { element }))
    }

    pub fn nullable_ty(&mut self, base: NodeId) -> NodeId {
        self.node(NodeKind::NullableType(NullableType { base }))
    }

    pub fn union_ty(&mut self, members: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::UnionType(UnionType { members }))
    }

    pub fn join_ty(&mut self, members: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::JoinType(JoinType { members }))
    }

    pub fn tuple_ty(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TupleType(TupleType { elements }))
    }

    pub fn field(&mut self, name: &str, annotation: NodeId) -> NodeId {
        self.node(NodeKind::StructField(StructField {
            name: name.to_string(),
            annotation,
        }))
    }

    pub fn struct_ty(&mut self, fields: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::StructType(StructType { fields }))
    }

    pub fn reference(&mut self, name: &str, target: NodeId, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::ReferenceType(ReferenceType {
            name: name.to_string(),
            target: Some(target),
            args,
        }))
    }

    pub fn function_ty(
        &mut self,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        kind: FnKind,
    ) -> NodeId {
        self.node(NodeKind::FunctionType(FunctionTypeAnnotation {
            params,
            return_type,
            kind,
        }))
    }

    pub fn coroutine_ty(&mut self, function: NodeId) -> NodeId {
        self.node(NodeKind::CoroutineType(CoroutineTypeAnnotation { function }))
    }

    pub fn attribute(&mut self, name: &str, annotation: NodeId) -> NodeId {
        self.node(NodeKind::ClassAttribute(ClassAttribute {
            name: name.to_string(),
            annotation,
            is_static: false,
            is_const: false,
            is_local: false,
        }))
    }

    pub fn method(
        &mut self,
        names: &[&str],
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::ClassMethod(ClassMethod {
            names: names.iter().map(|n| n.to_string()).collect(),
            generics: vec![],
            params,
            return_type,
            body,
            is_static: false,
            kind: FnKind::Fn,
        }))
    }

    pub fn class_ty(
        &mut self,
        attributes: Vec<NodeId>,
        methods: Vec<NodeId>,
        super_types: Vec<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::ClassType(ClassType {
            attributes,
            methods,
            super_types,
            impls: vec![],
        }))
    }

    pub fn interface_method(
        &mut self,
        names: &[&str],
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::InterfaceMethod(InterfaceMethod {
            names: names.iter().map(|n| n.to_string()).collect(),
            generics: vec![],
            params,
            return_type,
        }))
    }

    pub fn interface_ty(&mut self, methods: Vec<NodeId>, super_types: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::InterfaceType(InterfaceType {
            methods,
            super_types,
        }))
    }

    pub fn variant_ctor(&mut self, name: &str, params: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::VariantConstructorDecl(VariantConstructorDecl {
            name: name.to_string(),
            params,
        }))
    }

    pub fn variant_ty(&mut self, constructors: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::VariantType(VariantType { constructors }))
    }

    pub fn enum_case(&mut self, name: &str, value: Option<&str>) -> NodeId {
        self.node(NodeKind::EnumCase(EnumCase {
            name: name.to_string(),
            value: value.map(str::to_string),
        }))
    }

    pub fn enum_ty(&mut self, cases: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::EnumType(EnumType { cases, repr: None }))
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    pub fn generic(&mut self, name: &str, constraint: Option<NodeId>) -> NodeId {
        self.node(NodeKind::GenericParam(GenericParam {
            name: name.to_string(),
            constraint,
        }))
    }

    pub fn param(&mut self, name: &str, annotation: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Param(Param {
            name: name.to_string(),
            annotation,
            is_mut: false,
        }))
    }

    pub fn var(&mut self, name: &str, annotation: Option<NodeId>, init: Option<NodeId>) -> NodeId {
        self.node(NodeKind::VariableDecl(VariableDecl {
            name: name.to_string(),
            kind: VarKind::Let,
            annotation,
            init,
        }))
    }

    pub fn function(
        &mut self,
        name: &str,
        generics: Vec<NodeId>,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::FunctionDecl(FunctionDecl {
            name: name.to_string(),
            generics,
            params,
            return_type,
            body,
            kind: FnKind::Fn,
        }))
    }

    pub fn type_decl(&mut self, name: &str, generics: Vec<NodeId>, definition: NodeId) -> NodeId {
        self.node(NodeKind::TypeDecl(TypeDecl {
            name: name.to_string(),
            generics,
            definition,
        }))
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    pub fn int(&mut self, text: &str) -> NodeId {
        self.node(NodeKind::IntLiteral(IntLiteral::new(text)))
    }

    pub fn float(&mut self, text: &str) -> NodeId {
        self.node(NodeKind::FloatLiteral(FloatLiteral::new(text)))
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.node(NodeKind::BoolLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.node(NodeKind::StringLiteral(value.to_string()))
    }

    pub fn null(&mut self) -> NodeId {
        self.node(NodeKind::NullLiteral)
    }

    pub fn ident(&mut self, name: &str, target: NodeId) -> NodeId {
        self.node(NodeKind::Identifier(Identifier::resolved(name, target)))
    }

    pub fn this(&mut self) -> NodeId {
        self.node(NodeKind::This)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.node(NodeKind::Binary(Binary { op, lhs, rhs }))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.node(NodeKind::Unary(Unary { op, operand }))
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        self.call_generic(callee, vec![], args)
    }

    pub fn call_generic(
        &mut self,
        callee: NodeId,
        generic_args: Vec<NodeId>,
        args: Vec<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::Call(Call {
            callee,
            generic_args,
            args,
        }))
    }

    pub fn member(&mut self, base: NodeId, name: &str) -> NodeId {
        self.node(NodeKind::Member(Member {
            base,
            name: name.to_string(),
            optional: false,
        }))
    }

    pub fn optional_member(&mut self, base: NodeId, name: &str) -> NodeId {
        self.node(NodeKind::Member(Member {
            base,
            name: name.to_string(),
            optional: true,
        }))
    }

    pub fn index(&mut self, base: NodeId, index: NodeId) -> NodeId {
        self.node(NodeKind::Index(Index {
            base,
            index,
            optional: false,
        }))
    }

    pub fn conditional(
        &mut self,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> NodeId {
        self.node(NodeKind::Conditional(Conditional {
            condition,
            then_branch,
            else_branch,
        }))
    }

    pub fn match_expr(&mut self, scrutinee: NodeId, bodies: Vec<NodeId>) -> NodeId {
        let arms = bodies
            .into_iter()
            .map(|body| self.node(NodeKind::MatchArm(MatchArm { guard: None, body })))
            .collect();
        self.node(NodeKind::Match(Match { scrutinee, arms }))
    }

    pub fn array(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::ArrayLiteral(ArrayLiteral { elements }))
    }

    pub fn tuple(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::TupleLiteral(TupleLiteral { elements }))
    }

    pub fn struct_lit(&mut self, fields: Vec<(&str, NodeId)>) -> NodeId {
        let fields = fields
            .into_iter()
            .map(|(name, value)| {
                self.node(NodeKind::StructLiteralField(StructLiteralField {
                    name: name.to_string(),
                    value,
                }))
            })
            .collect();
        self.node(NodeKind::StructLiteral(StructLiteral { fields }))
    }

    pub fn new_expr(&mut self, class: NodeId, args: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::New(New { class, args }))
    }

    pub fn lambda(
        &mut self,
        params: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.node(NodeKind::Lambda(Lambda {
            generics: vec![],
            params,
            return_type,
            body,
            kind: FnKind::Fn,
        }))
    }

    pub fn cast(&mut self, expr: NodeId, target: NodeId, kind: CastKind) -> NodeId {
        self.node(NodeKind::Cast(Cast { expr, target, kind }))
    }

    pub fn denull(&mut self, expr: NodeId) -> NodeId {
        self.node(NodeKind::Denull(Denull { expr }))
    }

    pub fn yield_expr(&mut self, value: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Yield(Yield { value }))
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        self.node(NodeKind::Assignment(Assignment { target, value }))
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block(Block { stmts }))
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.node(NodeKind::ExprStatement(ExprStatement { expr }))
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Return(Return { value }))
    }

    pub fn if_stmt(
        &mut self,
        condition: NodeId,
        then_block: NodeId,
        else_block: Option<NodeId>,
    ) -> NodeId {
        self.node(NodeKind::If(If {
            condition,
            then_block,
            else_block,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_wraps_items_in_module() {
        let mut b = ProgramBuilder::new();
        let ty = b.prim(PrimitiveType::U32);
        let init = b.int("10");
        let x = b.var("x", Some(ty), Some(init));
        b.item(x);
        let program = b.finish();

        let root = program.root().expect("root module");
        assert_eq!(program.children(root), vec![x]);
        assert_eq!(program.parent(x), Some(root));
        assert_eq!(program.parent(init), Some(x));
    }

    #[test]
    fn test_spans_are_distinct() {
        let mut b = ProgramBuilder::new();
        let a = b.null();
        let c = b.null();
        assert_ne!(b.program().span(a), b.program().span(c));
    }
}
