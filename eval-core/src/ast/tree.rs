//! # 语法树
//!
//! 以节点表（arena）保存整棵树：每个节点由稳定的 [`NodeId`] 引用，
//! 销毁节点只清空它在表中的槽位，id 永不复用。

use tracing::debug;

use super::node::{Node, NodeId};
use super::scope::ScopeTable;
use crate::error::LifecycleError;

/// 语法树
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    pub(crate) scopes: ScopeTable,
}

impl Ast {
    /// 创建只含根节点的树
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::root())],
            root: NodeId(0),
            scopes: ScopeTable::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// 获取节点；不存在时返回错误
    pub fn node(&self, id: NodeId) -> Result<&Node, LifecycleError> {
        self.get(id).ok_or(LifecycleError::NoSuchNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, LifecycleError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(LifecycleError::NoSuchNode(id))
    }

    /// 子节点列表；节点不存在时为空
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// 存活节点数（含根节点）
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// 先序遍历 `id` 的整棵子树
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.contains(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// 把新节点挂为 `parent` 的最后一个子节点
    pub(crate) fn append_child(
        &mut self,
        parent: NodeId,
        mut node: Node,
    ) -> Result<NodeId, LifecycleError> {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.node_mut(parent)?.children.push(id);
        self.nodes.push(Some(node));
        Ok(id)
    }

    /// 取走 `id` 的全部子节点（只断开列表，不修改子节点的父链接）
    pub(crate) fn take_children(&mut self, id: NodeId) -> Result<Vec<NodeId>, LifecycleError> {
        Ok(std::mem::take(&mut self.node_mut(id)?.children))
    }

    /// 让 `parent` 收养 `children`，追加到其子节点末尾并改写父链接
    pub(crate) fn adopt(
        &mut self,
        parent: NodeId,
        children: Vec<NodeId>,
    ) -> Result<(), LifecycleError> {
        for &child in &children {
            self.node_mut(child)?.parent = Some(parent);
        }
        self.node_mut(parent)?.children.extend(children);
        Ok(())
    }

    /// 在 `parent` 的子节点列表中把 `old` 原位替换为 `new`
    pub(crate) fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), LifecycleError> {
        let slot = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == old)
            .ok_or_else(|| self.not_a_child(parent, old))?;
        self.node_mut(parent)?.children[slot] = new;
        self.node_mut(new)?.parent = Some(parent);
        debug!(
            "在 {} 中将 {} 替换为 {}",
            self.print(parent),
            self.label(old),
            self.label(new)
        );
        Ok(())
    }

    /// 删除并销毁 `parent` 从 `child` 开始的所有子节点
    pub fn remove_children_starting_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), LifecycleError> {
        debug!(
            "从 {} 中移除自 {} 起的子节点",
            self.print(parent),
            self.print(child)
        );
        let start = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| self.not_a_child(parent, child))?;
        let removed = self.node_mut(parent)?.children.split_off(start);
        for id in removed {
            self.destroy(id);
        }
        Ok(())
    }

    /// 递归销毁 `id` 的整棵子树
    ///
    /// 不会从父节点的子节点列表中摘除 `id`，调用方负责断开。
    pub(crate) fn destroy(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        debug!("销毁节点 {}", node.label());
        for child in node.children {
            self.destroy(child);
        }
    }

    fn not_a_child(&self, parent: NodeId, child: NodeId) -> LifecycleError {
        LifecycleError::NotAChild {
            parent: self.label(parent),
            child: self.label(child),
        }
    }

    fn label(&self, id: NodeId) -> String {
        self.get(id).map_or_else(|| id.to_string(), Node::label)
    }

    /// 打印子树：`name[:value]`，有子节点时后接 `(child child ...)`
    pub fn print(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return id.to_string();
        };
        let mut out = node.label();
        if !node.children.is_empty() {
            let children: Vec<String> = node.children.iter().map(|&c| self.print(c)).collect();
            out.push('(');
            out.push_str(&children.join(" "));
            out.push(')');
        }
        out
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}
