//! # 作用域表
//!
//! 词法作用域链。节点只持有 [`ScopeId`]，作用域本身归 [`ScopeTable`] 所有。

use super::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// 单个作用域
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// 引入该作用域的节点
    pub owner: NodeId,
    /// 外层作用域
    pub parent: Option<ScopeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&mut self, owner: NodeId, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { owner, parent });
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    /// 从 `id` 开始向外的作用域链（含 `id` 本身）
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), |&scope| self.get(scope).and_then(|s| s.parent))
    }

    /// 作用域嵌套深度，最外层为 1
    pub fn depth(&self, id: ScopeId) -> usize {
        self.chain(id).count()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
