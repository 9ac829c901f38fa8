//! # 诊断模块
//!
//! 建树过程的结构化诊断，不依赖 IO 或日志订阅者。
//!
//! ## 设计原则
//!
//! - 诊断分级：Error（致命错误，无法建树）、Warn（已恢复或会被跳过）
//! - 错误恢复产生的每一次截断都会留下一条 Warn
//! - [`analyze_tree`] 复用已构建的树，不重复解析

use crate::ast::Ast;
use crate::builder::build_source;
use crate::config::EvalConfig;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 源标识 / 文件路径
    pub source_id: String,
    /// 触发诊断的 token 下标（如果可定位，从 0 开始）
    pub token: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如恢复点的打印形式）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, source_id, message)
    }

    /// 创建警告诊断
    pub fn warn(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, source_id, message)
    }

    fn with_level(
        level: DiagnosticLevel,
        source_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            source_id: source_id.into(),
            token: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 设置 token 下标
    pub fn with_token(mut self, token: usize) -> Self {
        self.token = Some(token);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.source_id)?;
        if let Some(token) = self.token {
            write!(f, "#{}", token)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// 分析已构建的树，返回诊断结果
///
/// 执行以下检查：
/// - 根节点下未完成 setup 的顶层语句（求值时会被跳过）
pub fn analyze_tree(source_id: &str, ast: &Ast) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    for &child in ast.children(ast.root()) {
        let Some(node) = ast.get(child) else {
            continue;
        };
        if !node.lifecycle().is_setup() {
            result.push(
                Diagnostic::warn(source_id, format!("顶层语句 {} 未完成 setup，求值时将跳过", node.label()))
                    .with_detail(ast.print(child)),
            );
        }
    }
    result
}

/// 检查一段源文本：分词、建树、分析顶层语句
///
/// 无法建树的致命错误记为一条 Error；不会中止调用方。
pub fn check_source(source_id: &str, source: &str, config: &EvalConfig) -> DiagnosticResult {
    match build_source(source_id, source, config) {
        Ok(built) => {
            let mut result = built.diagnostics;
            result.merge(analyze_tree(source_id, &built.ast));
            result
        }
        Err(error) => {
            let mut result = DiagnosticResult::new();
            result.push(Diagnostic::error(source_id, error.to_string()));
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_tree;
    use crate::token::tokenize;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warn("main.ast", "已恢复").with_token(7).with_detail("{");
        assert_eq!(diag.to_string(), "[WARN] main.ast#7: 已恢复\n  | {");

        let diag = Diagnostic::error("main.ast", "失败");
        assert_eq!(diag.to_string(), "[ERROR] main.ast: 失败");
    }

    #[test]
    fn test_check_source_reports_fatal_error() {
        let config = EvalConfig {
            recover: false,
            ..EvalConfig::default()
        };
        let fatal = build_source("main", "[{exp}]", &config).unwrap_err();

        let result = check_source("main", "[{exp}]", &config);
        assert!(result.has_errors());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].level, DiagnosticLevel::Error);
        assert_eq!(result.diagnostics[0].message, fatal.to_string());

        // 分词错误同样记为 Error
        let result = check_source("main", "x", &EvalConfig::default());
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn test_check_source_merges_recovery_and_analysis() {
        // 一条恢复警告，加上一条被跳过的顶层语句
        let result = check_source("main", "[a][{exp}][c]", &EvalConfig::default());
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 2);

        let result = check_source("main", "[{(PLUS ID:'a' ID:'b')}]", &EvalConfig::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_analyze_tree_reports_damaged_top_level_statement() {
        // 第二条顶层命令中的 `exp` 没有子节点，setup 失败后恢复到根节点
        let tokens = tokenize("[a][{exp}][c]").unwrap();
        let built = build_tree("main", tokens).unwrap();
        let result = analyze_tree("main", &built.ast);
        assert_eq!(result.warn_count(), 1);
        assert!(result.diagnostics[0].message.contains("["));
    }

    #[test]
    fn test_analyze_tree_clean() {
        let tokens = tokenize("[a][b]").unwrap();
        let built = build_tree("main", tokens).unwrap();
        assert!(analyze_tree("main", &built.ast).is_empty());
    }
}
