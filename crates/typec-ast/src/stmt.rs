//! Statement definitions for the AST

use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStatement {
    pub expr: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: NodeId,
    pub then_block: NodeId,
    pub else_block: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: NodeId,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub init: Option<NodeId>,
    pub condition: Option<NodeId>,
    pub step: Option<NodeId>,
    pub body: NodeId,
}
