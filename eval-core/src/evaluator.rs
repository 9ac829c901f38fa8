//! # Evaluator 模块
//!
//! 求值阶段与外部运行时层之间的接缝。
//!
//! 对象模型、类型系统等语义不在本 crate 内；生命周期驱动只保证
//! 按后序、每个节点恰好一次地调用 [`Evaluator::evaluate`]。

use crate::ast::{Ast, NodeId};
use crate::error::EvalError;

/// 节点求值钩子
pub trait Evaluator {
    /// 求值单个节点；调用时其所有子节点都已求值完毕
    fn evaluate(&mut self, ast: &Ast, id: NodeId) -> Result<(), EvalError>;
}

/// 什么也不做的求值器
#[derive(Debug, Default)]
pub struct NoopEvaluator;

impl Evaluator for NoopEvaluator {
    fn evaluate(&mut self, _ast: &Ast, _id: NodeId) -> Result<(), EvalError> {
        Ok(())
    }
}

/// 按求值顺序记录节点标签的求值器
#[derive(Debug, Default)]
pub struct TraceEvaluator {
    /// 已求值节点的 `name[:value]`
    pub trace: Vec<String>,
}

impl TraceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Evaluator for TraceEvaluator {
    fn evaluate(&mut self, ast: &Ast, id: NodeId) -> Result<(), EvalError> {
        let node = ast
            .get(id)
            .ok_or_else(|| EvalError::new(id.to_string(), "节点不存在"))?;
        self.trace.push(node.label());
        Ok(())
    }
}
