//! # 错误恢复
//!
//! 刚闭合的子树 setup 失败时，找到最近的外层代码块，从失败的子树开始
//! 截断该块，并把该块作为新的解析位置返回。一直找到根节点也没有代码块时，
//! 根节点本身成为恢复位置（受损的顶层语句留在树中，求值时被跳过）。

use tracing::warn;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{AstError, BuildError, Recovered};

/// 尝试从 `problem` 的 setup 失败中恢复
///
/// 总是返回错误：成功时为 [`BuildError::Recovered`]，
/// 无法定位恢复位置时为包装了原始错误的 [`AstError::Unrecoverable`]。
pub fn recover_from_error(ast: &mut Ast, error: AstError, problem: NodeId) -> BuildError {
    let mut current = problem;
    loop {
        let Some(node) = ast.get(current) else {
            return unrecoverable(error, format!("节点 {} 不存在", current));
        };
        let Some(parent) = node.parent() else {
            break;
        };
        let Some(parent_node) = ast.get(parent) else {
            return unrecoverable(error, format!("父节点 {} 不存在", parent));
        };
        if !parent_node.kind().is_block() {
            current = parent;
            continue;
        }

        // 删除受损子树以及其后的兄弟节点（正常情况下不应存在）
        if let Err(e) = ast.remove_children_starting_at(parent, current) {
            return unrecoverable(error, e.to_string());
        }
        warn!(error = %error, block = %ast.print(parent), "setup 失败，已截断所在代码块");
        return BuildError::Recovered(Recovered {
            error,
            resume_at: parent,
        });
    }

    let reached_root =
        current == ast.root() && ast.get(current).is_some_and(|n| n.kind() == NodeKind::Root);
    if !reached_root {
        return unrecoverable(error, "unknown error".to_string());
    }
    warn!(error = %error, "setup 失败，恢复到根节点");
    BuildError::Recovered(Recovered {
        error,
        resume_at: current,
    })
}

fn unrecoverable(error: AstError, reason: String) -> BuildError {
    BuildError::Fatal(AstError::Unrecoverable {
        original: Box::new(error),
        reason,
    })
}
