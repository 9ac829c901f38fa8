//! # 节点生命周期
//!
//! ```text
//! Created ──init──► Initialized ──setup──► SetUp ──analyze──► Analyzed ──evaluate──► Evaluated
//! ```
//!
//! 标记只会单调地由 false 变为 true；缺少前置标记的操作直接失败。
//! 唯一的例外：根节点的直接子节点如果没有完成 setup，求值时静默跳过，
//! 这样被错误恢复丢弃的顶层语句不会中止整个程序的求值。
//!
//! setup、分析与求值都是后序的：先处理子节点，再处理节点本身。

use tracing::debug;

use super::node::{NodeId, NodeKind};
use super::tree::Ast;
use crate::error::{AstResult, LifecycleError, ParseError};
use crate::evaluator::Evaluator;

impl Ast {
    /// 最早期的初始化：从父节点继承作用域，执行种类自身的 init 钩子
    ///
    /// 此时的父节点未必是最终的父节点（可能是稍后被消除的分组括号），
    /// 但其作用域与最终父节点一致。
    pub fn init_node(&mut self, id: NodeId) -> AstResult<()> {
        let node = self.node(id)?;
        let kind = node.kind;
        let parent = node.parent.ok_or(LifecycleError::InitRoot)?;
        let inherited = self.node(parent)?.enclosing_scope();

        self.node_mut(id)?.parent_scope = inherited;
        if kind == NodeKind::Block {
            let scope = self.scopes.create(id, inherited);
            self.node_mut(id)?.scope = Some(scope);
        }
        self.node_mut(id)?.lifecycle.initialized = true;
        Ok(())
    }

    /// 对刚闭合的父节点执行 setup：先逐个 setup 子节点，再 setup 自身
    pub fn setup_as_parent(&mut self, id: NodeId) -> AstResult<()> {
        // 孙节点此时都应已完成 setup
        let children = self.node(id)?.children.clone();
        for child in children {
            self.setup_node(child)?;
        }
        self.setup_node(id)?;
        debug!("完成节点 setup {}", self.print(id));
        Ok(())
    }

    /// 叶子形式的 setup，完成后立即做静态分析；已 setup 时不做任何事
    pub fn setup_node(&mut self, id: NodeId) -> AstResult<()> {
        let node = self.node(id)?;
        if node.lifecycle.setup {
            return Ok(());
        }
        if !node.lifecycle.initialized {
            return Err(LifecycleError::SetupBeforeInit {
                node: self.print(id),
            }
            .into());
        }
        if node.parent.is_none() {
            return Err(LifecycleError::SetupWithoutParent {
                node: self.print(id),
            }
            .into());
        }

        debug!(" - setup 节点 {}", self.print(id));
        self.setup_hook(id)?;
        self.node_mut(id)?.lifecycle.setup = true;

        debug!(" - 分析节点 {}", self.print(id));
        self.analyze_node(id)?;
        self.node_mut(id)?.lifecycle.analyzed = true;
        Ok(())
    }

    fn analyze_node(&mut self, id: NodeId) -> AstResult<()> {
        let node = self.node(id)?;
        if node.lifecycle.analyzed {
            return Ok(());
        }
        if !node.lifecycle.initialized || !node.lifecycle.setup {
            return Err(LifecycleError::AnalyzeBeforeSetup {
                node: self.print(id),
            }
            .into());
        }
        if node.kind.has_analysis() {
            debug!(" - - 分析语句 {}", self.print(id));
            self.analyze_hook(id)?;
        }
        Ok(())
    }

    /// 各节点种类自带的结构检查
    ///
    /// 运算符的操作数个数属于运算符自身的语义，这里不检查。
    fn setup_hook(&self, id: NodeId) -> AstResult<()> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Expression | NodeKind::New | NodeKind::IsVar if node.children.is_empty() => {
                Err(ParseError::OperandCount {
                    node: node.label(),
                    expected: "至少 1".to_string(),
                    actual: 0,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn analyze_hook(&self, id: NodeId) -> AstResult<()> {
        let node = self.node(id)?;
        let expected = match node.kind {
            NodeKind::New => NodeKind::NewInit,
            NodeKind::IsVar => NodeKind::Variable,
            _ => return Ok(()),
        };
        // new 的每个子节点都是 init；isvar 只检查第一个子节点
        let checked = match node.kind {
            NodeKind::IsVar => &node.children[..node.children.len().min(1)],
            _ => &node.children[..],
        };
        for &child in checked {
            let child = self.node(child)?;
            if child.kind != expected {
                return Err(ParseError::InvalidChild {
                    node: node.label(),
                    found: child.label(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// 后序求值：子节点先于父节点；每个节点只能求值一次
    pub fn evaluate_node(&mut self, id: NodeId, evaluator: &mut dyn Evaluator) -> AstResult<()> {
        let node = self.node(id)?;
        if node.lifecycle.evaluated {
            return Err(LifecycleError::AlreadyEvaluated {
                node: self.print(id),
            }
            .into());
        }
        if !node.lifecycle.is_ready() {
            // 根节点的直接子节点可以在未 setup 时跳过求值
            if node.parent == Some(self.root()) {
                debug!("跳过未完成 setup 的顶层语句 {}", self.print(id));
                return Ok(());
            }
            return Err(LifecycleError::EvaluateBeforeSetup {
                node: self.print(id),
            }
            .into());
        }

        let children = node.children.clone();
        for child in children {
            self.evaluate_node(child, evaluator)?;
        }
        debug!(" - 求值节点 {}", self.print(id));
        evaluator.evaluate(self, id)?;
        self.node_mut(id)?.lifecycle.evaluated = true;
        Ok(())
    }

    /// 求值整个程序：按顺序求值根节点的每个子节点，最后标记根节点
    pub fn evaluate_program(&mut self, evaluator: &mut dyn Evaluator) -> AstResult<()> {
        let root = self.root();
        if self.node(root)?.lifecycle.evaluated {
            return Err(LifecycleError::AlreadyEvaluated {
                node: self.print(root),
            }
            .into());
        }
        let children = self.children(root).to_vec();
        for child in children {
            self.evaluate_node(child, evaluator)?;
        }
        self.node_mut(root)?.lifecycle.evaluated = true;
        Ok(())
    }
}
