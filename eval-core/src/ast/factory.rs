//! # 节点工厂
//!
//! 按 token 标签查表构造节点，不修改树。

use super::node::{Brace, BraceShape, Node, NodeKind};
use crate::error::ParseError;
use crate::token::Token;

const fn brace(shape: BraceShape, open: bool) -> NodeKind {
    NodeKind::Brace(Brace { shape, open })
}

/// token 标签 → 节点种类
const NODE_TABLE: &[(&str, NodeKind)] = &[
    ("[", NodeKind::Command),
    ("(", brace(BraceShape::Paren, true)),
    ("{", NodeKind::Block),
    ("]", brace(BraceShape::Bracket, false)),
    (")", brace(BraceShape::Paren, false)),
    ("}", brace(BraceShape::Curly, false)),
    ("cmd", NodeKind::CommandFragment),
    ("ID", NodeKind::Variable),
    ("prop", NodeKind::Property),
    ("PLUS", NodeKind::Operator),
    ("MINUS", NodeKind::Operator),
    ("STAR", NodeKind::Operator),
    ("SLASH", NodeKind::Operator),
    ("PERCENT", NodeKind::Operator),
    ("CARAT", NodeKind::Operator),
    ("PIPE", NodeKind::Operator),
    ("AMP", NodeKind::Operator),
    ("TILDE", NodeKind::Operator),
    ("DOUBLETILDE", NodeKind::Operator),
    ("exp", NodeKind::Expression),
    ("new", NodeKind::New),
    ("init", NodeKind::NewInit),
    ("type", NodeKind::TypeSpec),
    ("isvar", NodeKind::IsVar),
];

/// 查找标签对应的节点种类
pub fn kind_for_tag(tag: &str) -> Option<NodeKind> {
    NODE_TABLE
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|&(_, kind)| kind)
}

/// 由 token 构造节点
pub fn make_node(token: Token) -> Result<Node, ParseError> {
    match kind_for_tag(&token.name) {
        Some(kind) => Ok(Node::new(kind, token)),
        None => Err(ParseError::UnsupportedToken {
            token: token.to_string(),
        }),
    }
}
