//! # Type-C AST
//!
//! Syntax tree consumed by the Type-C type checker.
//!
//! The tree is produced by the parser and the name resolver, so every name
//! reference already carries the `NodeId` of its declaration. Nodes live in a
//! single arena and are addressed by stable handles; the checker keys its
//! caches on those handles.

use la_arena::{Arena, Idx};

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub file_id: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, file_id: usize) -> Self {
        Self { start, end, file_id }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }
}

/// Handle of a node inside a [`Program`]
pub type NodeId = Idx<Node>;

/// A syntax node: its kind, where it came from and who owns it
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod types;
pub mod expr;
pub mod stmt;
pub mod decl;
pub mod builder;

pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use builder::ProgramBuilder;

// =============================================================================
// Node kinds
// =============================================================================

/// Every syntax form the checker reads.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Reserved by [`Program::reserve`] and not filled yet
    Pending,

    // Declarations
    Module(Module),
    FunctionDecl(FunctionDecl),
    Param(Param),
    VariableDecl(VariableDecl),
    TypeDecl(TypeDecl),
    GenericParam(GenericParam),
    ClassAttribute(ClassAttribute),
    ClassMethod(ClassMethod),
    InterfaceMethod(InterfaceMethod),
    StructField(StructField),
    VariantConstructorDecl(VariantConstructorDecl),
    EnumCase(EnumCase),

    // Type annotations
    PrimitiveType(PrimitiveType),
    ArrayType(ArrayType),
    NullableType(NullableType),
    UnionType(UnionType),
    JoinType(JoinType),
    TupleType(TupleType),
    StructType(StructType),
    ClassType(ClassType),
    InterfaceType(InterfaceType),
    VariantType(VariantType),
    EnumType(EnumType),
    StringEnumType(StringEnumType),
    FunctionType(FunctionTypeAnnotation),
    CoroutineType(CoroutineTypeAnnotation),
    ReferenceType(ReferenceType),

    // Expressions
    IntLiteral(IntLiteral),
    FloatLiteral(FloatLiteral),
    BoolLiteral(bool),
    StringLiteral(String),
    NullLiteral,
    Identifier(Identifier),
    This,
    Binary(Binary),
    Unary(Unary),
    Call(Call),
    Member(Member),
    Index(Index),
    Conditional(Conditional),
    Match(Match),
    MatchArm(MatchArm),
    ArrayLiteral(ArrayLiteral),
    StructLiteral(StructLiteral),
    StructLiteralField(StructLiteralField),
    TupleLiteral(TupleLiteral),
    New(New),
    Lambda(Lambda),
    Cast(Cast),
    InstanceCheck(InstanceCheck),
    CoroutineExpr(CoroutineExpr),
    Yield(Yield),
    Denull(Denull),
    Assignment(Assignment),

    // Statements
    Block(Block),
    ExprStatement(ExprStatement),
    Return(Return),
    If(If),
    While(While),
    For(For),
    Break,
    Continue,
}

impl NodeKind {
    /// Syntactic children in source order. Name references (identifier
    /// targets, reference-type targets) are not children.
    pub fn children(&self) -> Vec<NodeId> {
        fn opt(v: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                v.push(*id);
            }
        }

        let mut out = Vec::new();
        match self {
            NodeKind::Pending
            | NodeKind::PrimitiveType(_)
            | NodeKind::StringEnumType(_)
            | NodeKind::EnumCase(_)
            | NodeKind::IntLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::NullLiteral
            | NodeKind::Identifier(_)
            | NodeKind::This
            | NodeKind::Break
            | NodeKind::Continue => {}

            NodeKind::Module(m) => out.extend(&m.items),
            NodeKind::FunctionDecl(f) => {
                out.extend(&f.generics);
                out.extend(&f.params);
                opt(&mut out, &f.return_type);
                opt(&mut out, &f.body);
            }
            NodeKind::Param(p) => opt(&mut out, &p.annotation),
            NodeKind::VariableDecl(v) => {
                opt(&mut out, &v.annotation);
                opt(&mut out, &v.init);
            }
            NodeKind::TypeDecl(t) => {
                out.extend(&t.generics);
                out.push(t.definition);
            }
            NodeKind::GenericParam(g) => opt(&mut out, &g.constraint),
            NodeKind::ClassAttribute(a) => out.push(a.annotation),
            NodeKind::ClassMethod(m) => {
                out.extend(&m.generics);
                out.extend(&m.params);
                opt(&mut out, &m.return_type);
                opt(&mut out, &m.body);
            }
            NodeKind::InterfaceMethod(m) => {
                out.extend(&m.generics);
                out.extend(&m.params);
                opt(&mut out, &m.return_type);
            }
            NodeKind::StructField(f) => out.push(f.annotation),
            NodeKind::VariantConstructorDecl(c) => out.extend(&c.params),

            NodeKind::ArrayType(a) => out.push(a.element),
            NodeKind::NullableType(n) => out.push(n.base),
            NodeKind::UnionType(u) => out.extend(&u.members),
            NodeKind::JoinType(j) => out.extend(&j.members),
            NodeKind::TupleType(t) => out.extend(&t.elements),
            NodeKind::StructType(s) => out.extend(&s.fields),
            NodeKind::ClassType(c) => {
                out.extend(&c.super_types);
                out.extend(&c.attributes);
                out.extend(&c.methods);
                out.extend(&c.impls);
            }
            NodeKind::InterfaceType(i) => {
                out.extend(&i.super_types);
                out.extend(&i.methods);
            }
            NodeKind::VariantType(v) => out.extend(&v.constructors),
            NodeKind::EnumType(e) => out.extend(&e.cases),
            NodeKind::FunctionType(f) => {
                out.extend(&f.params);
                opt(&mut out, &f.return_type);
            }
            NodeKind::CoroutineType(c) => out.push(c.function),
            NodeKind::ReferenceType(r) => out.extend(&r.args),

            NodeKind::Binary(b) => {
                out.push(b.lhs);
                out.push(b.rhs);
            }
            NodeKind::Unary(u) => out.push(u.operand),
            NodeKind::Call(c) => {
                out.push(c.callee);
                out.extend(&c.generic_args);
                out.extend(&c.args);
            }
            NodeKind::Member(m) => out.push(m.base),
            NodeKind::Index(i) => {
                out.push(i.base);
                out.push(i.index);
            }
            NodeKind::Conditional(c) => {
                out.push(c.condition);
                out.push(c.then_branch);
                out.push(c.else_branch);
            }
            NodeKind::Match(m) => {
                out.push(m.scrutinee);
                out.extend(&m.arms);
            }
            NodeKind::MatchArm(a) => {
                opt(&mut out, &a.guard);
                out.push(a.body);
            }
            NodeKind::ArrayLiteral(a) => out.extend(&a.elements),
            NodeKind::StructLiteral(s) => out.extend(&s.fields),
            NodeKind::StructLiteralField(f) => out.push(f.value),
            NodeKind::TupleLiteral(t) => out.extend(&t.elements),
            NodeKind::New(n) => {
                out.push(n.class);
                out.extend(&n.args);
            }
            NodeKind::Lambda(l) => {
                out.extend(&l.generics);
                out.extend(&l.params);
                opt(&mut out, &l.return_type);
                out.push(l.body);
            }
            NodeKind::Cast(c) => {
                out.push(c.expr);
                out.push(c.target);
            }
            NodeKind::InstanceCheck(i) => {
                out.push(i.expr);
                out.push(i.target);
            }
            NodeKind::CoroutineExpr(c) => out.push(c.function),
            NodeKind::Yield(y) => opt(&mut out, &y.value),
            NodeKind::Denull(d) => out.push(d.expr),
            NodeKind::Assignment(a) => {
                out.push(a.target);
                out.push(a.value);
            }

            NodeKind::Block(b) => out.extend(&b.stmts),
            NodeKind::ExprStatement(e) => out.push(e.expr),
            NodeKind::Return(r) => opt(&mut out, &r.value),
            NodeKind::If(i) => {
                out.push(i.condition);
                out.push(i.then_block);
                opt(&mut out, &i.else_block);
            }
            NodeKind::While(w) => {
                out.push(w.condition);
                out.push(w.body);
            }
            NodeKind::For(f) => {
                opt(&mut out, &f.init);
                opt(&mut out, &f.condition);
                opt(&mut out, &f.step);
                out.push(f.body);
            }
        }
        out
    }

    /// Short lowercase name of the kind, for logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Pending => "pending",
            NodeKind::Module(_) => "module",
            NodeKind::FunctionDecl(_) => "function declaration",
            NodeKind::Param(_) => "parameter",
            NodeKind::VariableDecl(_) => "variable declaration",
            NodeKind::TypeDecl(_) => "type declaration",
            NodeKind::GenericParam(_) => "generic parameter",
            NodeKind::ClassAttribute(_) => "class attribute",
            NodeKind::ClassMethod(_) => "class method",
            NodeKind::InterfaceMethod(_) => "interface method",
            NodeKind::StructField(_) => "struct field",
            NodeKind::VariantConstructorDecl(_) => "variant constructor",
            NodeKind::EnumCase(_) => "enum case",
            NodeKind::PrimitiveType(_) => "primitive type",
            NodeKind::ArrayType(_) => "array type",
            NodeKind::NullableType(_) => "nullable type",
            NodeKind::UnionType(_) => "union type",
            NodeKind::JoinType(_) => "join type",
            NodeKind::TupleType(_) => "tuple type",
            NodeKind::StructType(_) => "struct type",
            NodeKind::ClassType(_) => "class type",
            NodeKind::InterfaceType(_) => "interface type",
            NodeKind::VariantType(_) => "variant type",
            NodeKind::EnumType(_) => "enum type",
            NodeKind::StringEnumType(_) => "string enum type",
            NodeKind::FunctionType(_) => "function type",
            NodeKind::CoroutineType(_) => "coroutine type",
            NodeKind::ReferenceType(_) => "reference type",
            NodeKind::IntLiteral(_) => "integer literal",
            NodeKind::FloatLiteral(_) => "float literal",
            NodeKind::BoolLiteral(_) => "bool literal",
            NodeKind::StringLiteral(_) => "string literal",
            NodeKind::NullLiteral => "null literal",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::This => "this",
            NodeKind::Binary(_) => "binary expression",
            NodeKind::Unary(_) => "unary expression",
            NodeKind::Call(_) => "call",
            NodeKind::Member(_) => "member access",
            NodeKind::Index(_) => "index access",
            NodeKind::Conditional(_) => "conditional",
            NodeKind::Match(_) => "match",
            NodeKind::MatchArm(_) => "match arm",
            NodeKind::ArrayLiteral(_) => "array literal",
            NodeKind::StructLiteral(_) => "struct literal",
            NodeKind::StructLiteralField(_) => "struct literal field",
            NodeKind::TupleLiteral(_) => "tuple literal",
            NodeKind::New(_) => "new expression",
            NodeKind::Lambda(_) => "lambda",
            NodeKind::Cast(_) => "cast",
            NodeKind::InstanceCheck(_) => "instance check",
            NodeKind::CoroutineExpr(_) => "coroutine expression",
            NodeKind::Yield(_) => "yield",
            NodeKind::Denull(_) => "denull",
            NodeKind::Assignment(_) => "assignment",
            NodeKind::Block(_) => "block",
            NodeKind::ExprStatement(_) => "expression statement",
            NodeKind::Return(_) => "return",
            NodeKind::If(_) => "if",
            NodeKind::While(_) => "while",
            NodeKind::For(_) => "for",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
        }
    }
}

// =============================================================================
// Program
// =============================================================================

/// A parsed and name-resolved compilation unit
#[derive(Debug, Clone, Default)]
pub struct Program {
    nodes: Arena<Node>,
    root: Option<NodeId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node and adopt its children.
    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let children = kind.children();
        let id = self.nodes.alloc(Node { kind, span, parent: None });
        for child in children {
            self.nodes[child].parent = Some(id);
        }
        id
    }

    /// Reserve a handle for a node whose children refer back to it
    /// (recursive functions, self-referencing types).
    pub fn reserve(&mut self) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::Pending,
            span: Span::default(),
            parent: None,
        })
    }

    /// Fill a reserved handle, or replace an existing node in place after an
    /// edit. The node keeps its identity and its parent.
    pub fn fill(&mut self, id: NodeId, kind: NodeKind, span: Span) {
        let children = kind.children();
        let node = &mut self.nodes[id];
        node.kind = kind;
        node.span = span;
        for child in children {
            self.nodes[child].parent = Some(id);
        }
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id].kind.children()
    }

    /// Strict ancestors, innermost first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            program: self,
            next: self.parent(id),
        }
    }

    /// The node itself followed by every node below it, pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }
}

impl std::ops::Index<NodeId> for Program {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

/// Iterator over the strict ancestors of a node
pub struct Ancestors<'a> {
    program: &'a Program,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.program.parent(current);
        Some(current)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_links_parents() {
        let mut program = Program::new();
        let lhs = program.alloc(NodeKind::IntLiteral(IntLiteral::new("1")), Span::default());
        let rhs = program.alloc(NodeKind::IntLiteral(IntLiteral::new("2")), Span::default());
        let sum = program.alloc(
            NodeKind::Binary(Binary { op: BinaryOp::Add, lhs, rhs }),
            Span::new(0, 5, 0),
        );

        assert_eq!(program.parent(lhs), Some(sum));
        assert_eq!(program.parent(rhs), Some(sum));
        assert_eq!(program.parent(sum), None);
        assert_eq!(program.children(sum), vec![lhs, rhs]);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut program = Program::new();
        let a = program.alloc(NodeKind::BoolLiteral(true), Span::default());
        let b = program.alloc(NodeKind::NullLiteral, Span::default());
        let not = program.alloc(
            NodeKind::Unary(Unary { op: UnaryOp::Not, operand: a }),
            Span::default(),
        );
        let block = program.alloc(
            NodeKind::Block(Block { stmts: vec![not, b] }),
            Span::default(),
        );

        assert_eq!(program.descendants(block), vec![block, not, a, b]);
        assert_eq!(program.ancestors(a).collect::<Vec<_>>(), vec![not, block]);
    }

    #[test]
    fn test_reserve_and_fill() {
        let mut program = Program::new();
        let func = program.reserve();
        assert!(matches!(program.kind(func), NodeKind::Pending));

        let call_target = program.alloc(
            NodeKind::Identifier(Identifier::resolved("f", func)),
            Span::default(),
        );
        let body = program.alloc(
            NodeKind::ExprStatement(ExprStatement { expr: call_target }),
            Span::default(),
        );
        program.fill(
            func,
            NodeKind::FunctionDecl(FunctionDecl {
                name: "f".into(),
                generics: vec![],
                params: vec![],
                return_type: None,
                body: Some(body),
                kind: FnKind::Fn,
            }),
            Span::new(0, 10, 0),
        );

        assert_eq!(program.parent(body), Some(func));
        // identifier targets are references, not children
        assert_eq!(program.parent(func), None);
    }
}
