//! # Eval Core
//!
//! 括号记法程序的分词、建树与节点生命周期核心库。
//!
//! ## 架构概述
//!
//! `eval-core` 不依赖任何 IO。宿主提供源文本，按阶段驱动：
//!
//! ```text
//! 源文本 ──tokenize──► Vec<Token> ──TreeBuilder──► Ast ──evaluate_program──► Evaluator
//!                                     │
//!                                     └─ setup 失败时局部恢复，记录 Diagnostic
//! ```
//!
//! 节点的生命周期只能前进：
//!
//! ```text
//! 创建 → init → setup → 分析 → 求值
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use eval_core::{EvalConfig, TraceEvaluator, build_source};
//!
//! let mut built = build_source("main", "[{(PLUS ID:'a' ID:'b')}]", &EvalConfig::default())?;
//! let mut evaluator = TraceEvaluator::new();
//! built.evaluate(&mut evaluator)?;
//! assert_eq!(evaluator.trace, ["ID:a", "ID:b", "PLUS", "{", "["]);
//! ```
//!
//! ## 模块结构
//!
//! - [`token`]：Token 定义与分词器
//! - [`ast`]：节点、语法树、作用域与生命周期
//! - [`builder`]：增量建树与错误恢复
//! - [`evaluator`]：求值钩子
//! - [`diagnostic`]：诊断信息
//! - [`config`]：运行配置
//! - [`error`]：错误类型定义

pub mod ast;
pub mod builder;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod evaluator;
pub mod token;

// 重导出核心类型
pub use ast::{Ast, Brace, BraceShape, Lifecycle, Node, NodeId, NodeKind, ScopeTable, make_node};
pub use builder::{BuiltTree, TreeBuilder, build_source, build_tree, build_tree_with_config, insert};
pub use config::{ConfigError, EvalConfig};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_tree, check_source};
pub use error::{
    AstError, AstResult, BuildError, EvalError, LexError, LifecycleError, ParseError, Recovered,
};
pub use evaluator::{Evaluator, NoopEvaluator, TraceEvaluator};
pub use token::{Token, tokenize};
