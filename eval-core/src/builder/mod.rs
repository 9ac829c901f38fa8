//! # Builder 模块
//!
//! 增量建树：每次插入一个 token 对应的节点，沿途维护一个"当前焦点"节点。
//!
//! ## 焦点移动
//!
//! ```text
//! 普通 token  → 挂为焦点的最后一个子节点，焦点不动
//! 开括号      → 挂为焦点的最后一个子节点，焦点下移到它
//! 闭括号      → 与焦点（开括号）匹配，setup 闭合的子树，焦点上移到其父节点
//! ```
//!
//! 分组圆括号 `(` 闭合时被消除：第一个子节点（运算符）接替圆括号的位置，
//! 其余子节点成为它的操作数。其他括号作为结构容器保留在树中。
//! 闭括号本身从不进入树。
//!
//! ## 模块结构
//!
//! - `recovery`: setup 失败后的局部错误恢复

mod recovery;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::ast::{Ast, Brace, Node, NodeId, make_node};
use crate::config::EvalConfig;
use crate::diagnostic::{Diagnostic, DiagnosticResult};
use crate::error::{AstError, AstResult, BuildError, LifecycleError, ParseError, Recovered};
use crate::evaluator::Evaluator;
use crate::token::{Token, tokenize};

pub use recovery::recover_from_error;

/// 插入一个节点，返回下一个焦点
///
/// # 返回
///
/// - `Ok(next)`: 新的焦点
/// - `Err(BuildError::Recovered)`: 闭合的子树 setup 失败，受损语句已截断
/// - `Err(BuildError::Fatal)`: 结构错误或前置条件错误
pub fn insert(ast: &mut Ast, current: NodeId, node: Node) -> Result<NodeId, BuildError> {
    if !ast.contains(current) {
        return Err(LifecycleError::NoSuchNode(current).into());
    }

    let Some(brace) = node.kind().brace() else {
        // 非括号：挂为子节点，停留
        let id = ast.append_child(current, node)?;
        ast.init_node(id)?;
        return Ok(current);
    };

    if brace.open {
        // 开括号：下移，之后的节点都是它的子节点
        let id = ast.append_child(current, node)?;
        ast.init_node(id)?;
        return Ok(id);
    }

    close_brace(ast, current, &node, brace)
}

/// 闭括号：与焦点匹配后 setup 闭合的子树，焦点上移
fn close_brace(
    ast: &mut Ast,
    current: NodeId,
    close: &Node,
    close_brace: Brace,
) -> Result<NodeId, BuildError> {
    let open = ast.node(current)?;
    let Some(parent) = open.parent() else {
        return Err(ParseError::AboveRoot {
            name: open.label(),
        }
        .into());
    };
    let Some(open_brace) = open.kind().brace().filter(|b| b.open) else {
        return Err(ParseError::NotOpenBrace {
            close: close.label(),
            found: open.label(),
        }
        .into());
    };
    if !open_brace.matches_close_brace(close_brace) {
        return Err(ParseError::BraceMismatch {
            open: open.label(),
            close: close.label(),
        }
        .into());
    }

    let finished = if open_brace.is_irrelevant() {
        promote_first_child(ast, current, parent)?
    } else {
        current
    };

    // 这里的 setup 失败都可以尝试恢复
    if let Err(error) = ast.setup_as_parent(finished) {
        return Err(recover_from_error(ast, error, finished));
    }

    debug!("丢弃闭括号 {}", close.label());
    Ok(parent)
}

/// 消除分组圆括号：第一个子节点接替圆括号在父节点中的位置，
/// 其余子节点成为它的子节点，随后销毁圆括号节点本身
fn promote_first_child(ast: &mut Ast, paren: NodeId, parent: NodeId) -> AstResult<NodeId> {
    let Some(&op) = ast.node(paren)?.children().first() else {
        return Err(ParseError::EmptyParens.into());
    };
    // `((PLUS a b) c)` 这类写法在此被拒绝
    let op_node = ast.node(op)?;
    if !op_node.children().is_empty() {
        return Err(ParseError::PromoteWithChildren {
            name: op_node.label(),
            count: op_node.children().len(),
        }
        .into());
    }

    let mut operands = ast.take_children(paren)?;
    operands.remove(0);
    ast.adopt(op, operands)?;
    ast.replace_child(parent, paren, op)?;
    // 子节点列表已清空，销毁不会波及刚转移的节点
    ast.destroy(paren);
    Ok(op)
}

/// 建树结果
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// 构建完成的树
    pub ast: Ast,
    /// 建树过程中的诊断（每次错误恢复一条）
    pub diagnostics: DiagnosticResult,
}

impl BuiltTree {
    /// 求值整个程序
    pub fn evaluate(&mut self, evaluator: &mut dyn Evaluator) -> AstResult<()> {
        self.ast.evaluate_program(evaluator)
    }
}

/// 增量建树器
///
/// 逐个消费 token，在 setup 失败时执行局部恢复并继续。
pub struct TreeBuilder {
    source_id: String,
    ast: Ast,
    current: NodeId,
    recover: bool,
    /// 恢复后仍需丢弃的未闭合括号层数
    discard_depth: usize,
    token_index: usize,
    diagnostics: DiagnosticResult,
}

impl TreeBuilder {
    /// 创建新的建树器
    pub fn new(source_id: impl Into<String>) -> Self {
        let ast = Ast::new();
        let current = ast.root();
        Self {
            source_id: source_id.into(),
            ast,
            current,
            recover: true,
            discard_depth: 0,
            token_index: 0,
            diagnostics: DiagnosticResult::new(),
        }
    }

    /// 按配置创建建树器
    pub fn with_config(source_id: impl Into<String>, config: &EvalConfig) -> Self {
        let mut builder = Self::new(source_id);
        builder.recover = config.recover;
        builder
    }

    /// 当前焦点
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn diagnostics(&self) -> &DiagnosticResult {
        &self.diagnostics
    }

    /// 消费一个 token
    pub fn feed(&mut self, token: Token) -> AstResult<()> {
        let index = self.token_index;
        self.token_index += 1;

        let node = make_node(token)?;
        if self.discard_depth > 0 {
            self.discard(node);
            return Ok(());
        }

        let chain = self.focus_chain();
        match insert(&mut self.ast, self.current, node) {
            Ok(next) => {
                self.current = next;
                Ok(())
            }
            Err(BuildError::Fatal(error)) => Err(error),
            Err(BuildError::Recovered(recovered)) => self.resume(recovered, &chain, index),
        }
    }

    /// 依次消费全部 token
    pub fn feed_all(&mut self, tokens: impl IntoIterator<Item = Token>) -> AstResult<()> {
        tokens.into_iter().try_for_each(|token| self.feed(token))
    }

    /// 结束建树：焦点必须回到根节点
    pub fn finish(self) -> AstResult<BuiltTree> {
        if self.current != self.ast.root() || self.discard_depth > 0 {
            let name = self
                .ast
                .get(self.current)
                .map_or_else(|| self.current.to_string(), Node::label);
            return Err(ParseError::Unclosed { name }.into());
        }
        debug!(nodes = self.ast.len(), "建树完成");
        Ok(BuiltTree {
            ast: self.ast,
            diagnostics: self.diagnostics,
        })
    }

    /// 焦点及其全部祖先，由近及远
    fn focus_chain(&self) -> Vec<NodeId> {
        std::iter::successors(Some(self.current), |&id| self.ast.parent(id)).collect()
    }

    fn resume(&mut self, recovered: Recovered, chain: &[NodeId], index: usize) -> AstResult<()> {
        if !self.recover {
            return Err(recovered.error);
        }
        // 焦点链上位于恢复位置之下、刚闭合节点之上的开括号尚未闭合，
        // 它们剩余的 token 属于受损语句
        let pending = chain
            .iter()
            .position(|&id| id == recovered.resume_at)
            .map_or(0, |pos| pos.saturating_sub(1));

        self.diagnostics.push(
            Diagnostic::warn(&self.source_id, format!("已恢复的错误: {}", recovered.error))
                .with_token(index)
                .with_detail(self.ast.print(recovered.resume_at)),
        );
        self.current = recovered.resume_at;
        self.discard_depth = pending;
        Ok(())
    }

    fn discard(&mut self, node: Node) {
        match node.kind().brace() {
            Some(brace) if brace.open => self.discard_depth += 1,
            Some(_) => self.discard_depth -= 1,
            None => {}
        }
        debug!("丢弃受损语句中的 token {}", node.label());
    }
}

/// 由 token 序列建树
pub fn build_tree(
    source_id: &str,
    tokens: impl IntoIterator<Item = Token>,
) -> AstResult<BuiltTree> {
    build_tree_with_config(source_id, tokens, &EvalConfig::default())
}

/// 由 token 序列按配置建树
pub fn build_tree_with_config(
    source_id: &str,
    tokens: impl IntoIterator<Item = Token>,
    config: &EvalConfig,
) -> AstResult<BuiltTree> {
    let mut builder = TreeBuilder::with_config(source_id, config);
    builder.feed_all(tokens)?;
    builder.finish()
}

/// 分词并建树
pub fn build_source(source_id: &str, source: &str, config: &EvalConfig) -> AstResult<BuiltTree> {
    let tokens = tokenize(source).map_err(AstError::from)?;
    build_tree_with_config(source_id, tokens, config)
}
