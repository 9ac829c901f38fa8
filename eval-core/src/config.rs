//! # Config 模块
//!
//! 建树与求值的配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件 {path} 失败: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("解析配置文件 {path} 失败: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// 运行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// setup 失败时是否尝试局部恢复；为 false 时直接作为致命错误返回
    pub recover: bool,
    /// 宿主是否执行求值阶段
    pub evaluate: bool,
    /// 日志级别（trace/debug/info/warn/error）
    pub log_level: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            recover: true,
            evaluate: true,
            log_level: "info".to_string(),
        }
    }
}

impl EvalConfig {
    /// 从 JSON 文件加载配置；缺省字段取默认值
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// 从 JSON 字符串解析配置
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EvalConfig::from_json(r#"{ "recover": false }"#).unwrap();
        assert!(!config.recover);
        assert!(config.evaluate);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EvalConfig::from_json("{}").unwrap(), EvalConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = EvalConfig::load("/nonexistent/eval-config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
