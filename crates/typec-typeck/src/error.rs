//! Type checking errors
//!
//! Type errors are values: inference produces a `TypeKind::Error` carrying a
//! [`TypeErrorKind`] instead of failing. [`TypeError`] is what the
//! diagnostics pass hands to the outside world once an error type has been
//! pinned to a node and a span.

use thiserror::Error;
use typec_ast::{NodeId, Span};

/// Type error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeErrorKind {
    /// Observed while the node's own type is still being computed
    #[error("type is still being computed")]
    RecursionPlaceholder,

    #[error("unresolved name '{0}'")]
    UnresolvedName(String),
    #[error("'{0}' does not name a type")]
    NotAType(String),
    #[error("'{0}' does not name a value")]
    NotAValue(String),
    #[error("member '{member}' not found on type {ty}")]
    MemberNotFound { member: String, ty: String },
    #[error("cannot access member '{member}' of nullable type {ty} without optional chaining")]
    NullableAccess { member: String, ty: String },
    #[error("cannot call value of type {0}")]
    NotCallable(String),
    #[error("cannot index value of type {0}")]
    NotIndexable(String),
    #[error("cannot instantiate {0}")]
    NotInstantiable(String),
    #[error("tuple index {index} out of bounds for {ty}")]
    TupleIndexOutOfBounds { index: usize, ty: String },
    #[error("operator '{op}' cannot be applied to {lhs} and {rhs}")]
    InvalidOperands { op: String, lhs: String, rhs: String },
    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand { op: String, operand: String },
    #[error("no common type between {}", .0.join(", "))]
    NoCommonType(Vec<String>),
    #[error("cannot infer the type of '{0}' from null")]
    CannotInferFromNull(String),
    #[error("cannot infer the type of '{0}' without an initializer or annotation")]
    CannotInfer(String),
    #[error("parameter '{0}' requires a type annotation")]
    MissingAnnotation(String),
    #[error("'{name}' expects {expected} generic argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("'{0}' is not a coroutine function (declare it with cfn)")]
    NotCoroutineFunction(String),
    #[error("invalid numeric literal '{0}'")]
    InvalidLiteral(String),
    #[error("literal {literal} does not fit in {ty}")]
    LiteralOutOfRange { literal: String, ty: String },
    #[error("type '{0}' expands too deeply")]
    ReferenceDepth(String),
    #[error("'{0}' is only valid inside a class")]
    ThisOutsideClass(String),
    #[error("syntax node was reserved but never filled")]
    IncompleteNode,
}

impl TypeErrorKind {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeErrorKind::RecursionPlaceholder)
    }
}

/// Type error with location information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type error at {}:{}: {kind}", .span.start, .span.end)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
    pub node: NodeId,
    /// Rendered expected type, if the error carried one
    pub expected: Option<String>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span, node: NodeId) -> Self {
        Self {
            kind,
            span,
            node,
            expected: None,
        }
    }

    /// Stable short code used in rendered reports
    pub fn code(&self) -> &'static str {
        match self.kind {
            TypeErrorKind::RecursionPlaceholder => "T0000",
            TypeErrorKind::UnresolvedName(_)
            | TypeErrorKind::NotAType(_)
            | TypeErrorKind::NotAValue(_) => "T0001",
            TypeErrorKind::MemberNotFound { .. } | TypeErrorKind::NullableAccess { .. } => "T0002",
            TypeErrorKind::NotCallable(_)
            | TypeErrorKind::NotIndexable(_)
            | TypeErrorKind::NotInstantiable(_)
            | TypeErrorKind::TupleIndexOutOfBounds { .. } => "T0003",
            TypeErrorKind::InvalidOperands { .. } | TypeErrorKind::InvalidOperand { .. } => "T0004",
            TypeErrorKind::NoCommonType(_) => "T0005",
            TypeErrorKind::CannotInferFromNull(_)
            | TypeErrorKind::CannotInfer(_)
            | TypeErrorKind::MissingAnnotation(_) => "T0006",
            TypeErrorKind::GenericArity { .. } => "T0007",
            TypeErrorKind::NotCoroutineFunction(_) => "T0008",
            TypeErrorKind::InvalidLiteral(_) | TypeErrorKind::LiteralOutOfRange { .. } => "T0009",
            TypeErrorKind::ReferenceDepth(_) => "T0010",
            TypeErrorKind::ThisOutsideClass(_) => "T0011",
            TypeErrorKind::IncompleteNode => "T0012",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TypeErrorKind::MemberNotFound {
            member: "len".into(),
            ty: "u32".into(),
        };
        assert_eq!(err.to_string(), "member 'len' not found on type u32");

        let err = TypeErrorKind::NoCommonType(vec!["u32".into(), "string".into()]);
        assert_eq!(err.to_string(), "no common type between u32, string");
    }

    #[test]
    fn test_placeholders_are_flagged() {
        assert!(TypeErrorKind::RecursionPlaceholder.is_placeholder());
        assert!(!TypeErrorKind::IncompleteNode.is_placeholder());
    }
}
