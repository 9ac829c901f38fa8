//! # AST 模块
//!
//! 语法树的数据模型与节点生命周期。
//!
//! ## 模块结构
//!
//! - [`node`]：节点、节点种类与生命周期标记
//! - [`tree`]：以 id 引用节点的树（arena）
//! - [`scope`]：词法作用域表
//! - [`factory`]：token → 节点的查表工厂
//! - `lifecycle`：init / setup / 分析 / 求值 的驱动

pub mod factory;
mod lifecycle;
pub mod node;
pub mod scope;
pub mod tree;

pub use factory::{kind_for_tag, make_node};
pub use node::{Brace, BraceShape, Lifecycle, Node, NodeId, NodeKind};
pub use scope::{Scope, ScopeId, ScopeTable};
pub use tree::Ast;
