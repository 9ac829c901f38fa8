//! # 节点定义
//!
//! 节点种类是封闭的变体集合，构造时由工厂按 token 标签选定。

use std::fmt;

use super::scope::ScopeId;
use crate::token::Token;

/// 节点在 [`Ast`](super::Ast) 中的稳定 id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// 在节点表中的下标
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 括号族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BraceShape {
    /// `[]`
    Bracket,
    /// `()`
    Paren,
    /// `{}`
    Curly,
}

/// 括号属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Brace {
    pub shape: BraceShape,
    pub open: bool,
}

impl Brace {
    /// 开括号能否被 `close` 闭合
    pub fn matches_close_brace(self, close: Brace) -> bool {
        self.open && !close.open && self.shape == close.shape
    }

    /// 纯分组圆括号：没有自身语义，闭合时被消除
    pub fn is_irrelevant(self) -> bool {
        self.open && self.shape == BraceShape::Paren
    }
}

/// 节点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// 树的哨兵根节点
    Root,
    /// `[` 命令列表
    Command,
    /// `{` 代码块，引入新作用域
    Block,
    /// `(` 分组括号或任一闭括号
    Brace(Brace),
    CommandFragment,
    Variable,
    Property,
    Operator,
    Expression,
    New,
    NewInit,
    TypeSpec,
    IsVar,
}

impl NodeKind {
    /// 括号属性；非括号节点返回 `None`
    pub fn brace(self) -> Option<Brace> {
        match self {
            NodeKind::Command => Some(Brace {
                shape: BraceShape::Bracket,
                open: true,
            }),
            NodeKind::Block => Some(Brace {
                shape: BraceShape::Curly,
                open: true,
            }),
            NodeKind::Brace(brace) => Some(brace),
            _ => None,
        }
    }

    /// 能否作为错误恢复时的截断目标
    pub fn is_block(self) -> bool {
        matches!(self, NodeKind::Block)
    }

    /// 是否暴露静态分析能力（语句类节点）
    pub fn has_analysis(self) -> bool {
        matches!(
            self,
            NodeKind::Command
                | NodeKind::Block
                | NodeKind::New
                | NodeKind::Expression
                | NodeKind::IsVar
        )
    }
}

/// 生命周期标记
///
/// 只会按 `initialized → setup → analyzed → evaluated` 顺序由 false 变为 true。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    pub(crate) initialized: bool,
    pub(crate) setup: bool,
    pub(crate) analyzed: bool,
    pub(crate) evaluated: bool,
}

impl Lifecycle {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_setup(&self) -> bool {
        self.setup
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// 是否已可求值
    pub fn is_ready(&self) -> bool {
        self.initialized && self.setup && self.analyzed
    }
}

/// 语法树节点
///
/// 子节点以 id 列表的形式由本节点独占；`parent` 与作用域只是反向引用。
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    pub(crate) value: Option<String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// 本节点引入的作用域
    pub(crate) scope: Option<ScopeId>,
    /// 继承自外层的作用域
    pub(crate) parent_scope: Option<ScopeId>,
    pub(crate) lifecycle: Lifecycle,
}

impl Node {
    /// 由 token 创建尚未挂入树的节点
    pub fn new(kind: NodeKind, token: Token) -> Self {
        Self {
            kind,
            name: token.name,
            value: token.value,
            children: Vec::new(),
            parent: None,
            scope: None,
            parent_scope: None,
            lifecycle: Lifecycle::default(),
        }
    }

    pub(crate) fn root() -> Self {
        Self::new(NodeKind::Root, Token::new("root"))
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 本节点引入的作用域
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    /// 继承的外层作用域
    pub fn parent_scope(&self) -> Option<ScopeId> {
        self.parent_scope
    }

    /// 子节点应继承的作用域
    pub fn enclosing_scope(&self) -> Option<ScopeId> {
        self.scope.or(self.parent_scope)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// `name` 或 `name:value`
    pub fn label(&self) -> String {
        match self.value.as_deref() {
            Some(value) if !value.is_empty() => format!("{}:{}", self.name, value),
            _ => self.name.clone(),
        }
    }
}
