//! # Error 模块
//!
//! 定义 eval-core 中使用的错误类型。
//!
//! 分类：
//!
//! - [`LexError`]：词法错误，整个解析直接失败
//! - [`ParseError`]：结构性解析错误（括号不匹配、空括号、未知 token 等）
//! - [`LifecycleError`]：节点生命周期前置条件被违反
//! - [`EvalError`]：外部求值钩子报告的失败
//! - [`AstError`]：统一错误类型
//!
//! 建树阶段的结果额外区分"致命"与"已恢复"两种情况，见 [`BuildError`]。

use thiserror::Error;

use crate::ast::NodeId;

/// 词法错误
///
/// `pos` 为源字符串中的字符下标（从 0 开始）。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    /// 命令列表之外的字符
    #[error("位置 {pos}：AST 输入中出现非法字符 '{ch}'，期望 '['")]
    BadLeadingChar { ch: char, pos: usize },

    /// CMD 模式中出现 '}'
    #[error("位置 {pos}：CMD 模式中出现意外的 '}}'")]
    UnexpectedCloseBrace { pos: usize },

    /// ':' 前没有正在累积的 token
    #[error("位置 {pos}：CODE 模式中 ':' 前没有 token")]
    ColonOutsideToken { pos: usize },

    /// 同一个 token 出现两次 ':'
    #[error("位置 {pos}：token '{token}' 中出现重复的 ':'")]
    DuplicateColon { token: String, pos: usize },

    /// 值位置之外的单引号
    #[error("位置 {pos}：值位置之外出现意外的单引号")]
    StrayQuote { pos: usize },

    /// ':' 之后缺少起始单引号
    #[error("位置 {pos}：token '{token}' 的 ':' 之后期望单引号，实际 '{ch}'")]
    ExpectedQuote { token: String, ch: char, pos: usize },

    /// 输入在未完成的结构中结束
    #[error("输入意外结束：{context}")]
    UnexpectedEnd { context: String },
}

/// 结构性解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 工厂无法识别的 token
    #[error("不支持的 token {token}")]
    UnsupportedToken { token: String },

    /// 在根节点处遇到闭括号
    #[error("无法越过根节点 {name} 向上移动")]
    AboveRoot { name: String },

    /// 闭括号对应的节点不是开括号
    #[error("遇到闭括号 {close}，但其父节点 {found} 不是开括号")]
    NotOpenBrace { close: String, found: String },

    /// 开闭括号种类不匹配
    #[error("括号匹配错误：'{open}' 对 '{close}'")]
    BraceMismatch { open: String, close: String },

    /// 空的分组括号
    #[error("AST 中不允许出现空括号")]
    EmptyParens,

    /// 被提升的节点已经有子节点
    #[error("无法提升已有 {count} > 0 个子节点的节点 {name}")]
    PromoteWithChildren { name: String, count: usize },

    /// 操作数个数不符
    #[error("节点 {node} 期望 {expected} 个操作数，实际 {actual}")]
    OperandCount {
        node: String,
        expected: String,
        actual: usize,
    },

    /// 子节点种类不符合父节点的要求
    #[error("节点 {node} 不接受子节点 {found}")]
    InvalidChild { node: String, found: String },

    /// 输入结束时仍有未闭合的括号
    #[error("输入结束时括号 '{name}' 尚未闭合")]
    Unclosed { name: String },
}

/// 生命周期前置条件错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// 节点 id 不存在或已被销毁
    #[error("节点 {0} 不存在")]
    NoSuchNode(NodeId),

    /// 节点不在父节点的子节点列表中
    #[error("节点 {child} 不是 {parent} 的子节点")]
    NotAChild { parent: String, child: String },

    /// 尝试初始化根节点
    #[error("无法初始化根节点")]
    InitRoot,

    /// 初始化之前 setup
    #[error("节点 {node} 初始化之前无法 setup")]
    SetupBeforeInit { node: String },

    /// 没有父节点时 setup
    #[error("节点 {node} 没有父节点，无法 setup")]
    SetupWithoutParent { node: String },

    /// setup 之前做静态分析
    #[error("节点 {node} 在 init 与 setup 之前无法做静态分析")]
    AnalyzeBeforeSetup { node: String },

    /// 尚未完成 setup/分析就求值
    #[error("节点 {node} 在 init、setup 与分析完成之前无法求值")]
    EvaluateBeforeSetup { node: String },

    /// 重复求值
    #[error("节点 {node} 已经求值过")]
    AlreadyEvaluated { node: String },
}

/// 外部求值错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("求值节点 {node} 失败：{message}")]
pub struct EvalError {
    pub node: String,
    pub message: String,
}

impl EvalError {
    pub fn new(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            message: message.into(),
        }
    }
}

/// eval-core 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstError {
    /// 词法错误
    #[error("词法错误: {0}")]
    Lex(#[from] LexError),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 生命周期错误
    #[error("生命周期错误: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// 求值错误
    #[error("求值错误: {0}")]
    Eval(#[from] EvalError),

    /// 错误恢复本身失败
    #[error("Cannot recover from error '{original}': {reason}")]
    Unrecoverable {
        original: Box<AstError>,
        reason: String,
    },
}

/// Result 类型别名
pub type AstResult<T> = Result<T, AstError>;

/// 已恢复的错误
///
/// 受损的子树已被截断，解析应从 `resume_at` 继续。
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// 原始错误
    pub error: AstError,
    /// 新的解析位置
    pub resume_at: NodeId,
}

/// 建树错误
///
/// 调用方必须同时处理两种结果。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// 致命错误，整个构建中止
    #[error("{0}")]
    Fatal(AstError),

    /// 已恢复：受损语句被丢弃
    #[error("已恢复的错误: {}（从节点 {} 继续）", .0.error, .0.resume_at)]
    Recovered(Recovered),
}

impl From<AstError> for BuildError {
    fn from(e: AstError) -> Self {
        BuildError::Fatal(e)
    }
}

impl From<ParseError> for BuildError {
    fn from(e: ParseError) -> Self {
        BuildError::Fatal(e.into())
    }
}

impl From<LifecycleError> for BuildError {
    fn from(e: LifecycleError) -> Self {
        BuildError::Fatal(e.into())
    }
}
