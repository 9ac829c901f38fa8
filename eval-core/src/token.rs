//! # Token 模块
//!
//! 词法单元定义与括号记法的分词器。
//!
//! ## 三种模式
//!
//! ```text
//! NONE ──'['──► CMD ──'{'──► CODE
//!  ▲             │  ▲          │
//!  └─────']'─────┘  └───'}'────┘   (深度归零时返回)
//! ```
//!
//! - `NONE`：只接受开启命令列表的 `[`（允许空白）
//! - `CMD`：裸文本累积为 `cmd` token；`[`/`]` 为结构 token；`{` 进入 CODE
//! - `CODE`：`name` 或 `name:'value'` 形式的 token；空白与 `;` 分隔 token；
//!   其余标点各自成为单字符 token
//!
//! 单次前向扫描，不回溯。

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LexError;

/// 词法单元
///
/// 由分词器生成后不可变；每个 token 恰好被建树器消费一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 类别标签
    pub name: String,
    /// 字面文本（`name:''` 时为 `Some("")`）
    pub value: Option<String>,
}

impl Token {
    /// 创建不带值的 token
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// 创建带值的 token
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// 对括号记法的源字符串分词
///
/// # 返回
///
/// 按源顺序排列的 token，或指明出错字符与位置的 [`LexError`]
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::new();
    for (pos, c) in source.chars().enumerate() {
        tokenizer.feed(pos, c)?;
    }
    let tokens = tokenizer.finish()?;
    debug!(count = tokens.len(), "分词完成");
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Cmd,
    Code,
}

/// CODE 模式下 token 值的累积状态
#[derive(Debug)]
enum ValueState {
    /// 尚未出现 ':'
    Absent,
    /// 刚读到 ':'，等待起始单引号
    AwaitQuote,
    /// 位于单引号内
    Quoted { text: String, escape: bool },
}

/// CODE 模式下正在累积的 token
#[derive(Debug)]
struct Pending {
    name: String,
    value: ValueState,
}

struct Tokenizer {
    mode: Mode,
    tokens: Vec<Token>,
    /// CMD 模式下累积的命令文本
    text: Option<String>,
    pending: Option<Pending>,
    cmd_depth: usize,
    code_depth: usize,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            mode: Mode::None,
            tokens: Vec::new(),
            text: None,
            pending: None,
            cmd_depth: 0,
            code_depth: 0,
        }
    }

    fn feed(&mut self, pos: usize, c: char) -> Result<(), LexError> {
        match self.mode {
            Mode::None => self.feed_none(pos, c),
            Mode::Cmd => self.feed_cmd(pos, c),
            Mode::Code => self.feed_code(pos, c),
        }
    }

    fn feed_none(&mut self, pos: usize, c: char) -> Result<(), LexError> {
        if c == '[' {
            self.tokens.push(Token::new("["));
            self.mode = Mode::Cmd;
            self.cmd_depth = 1;
            Ok(())
        } else if c.is_whitespace() {
            Ok(())
        } else {
            Err(LexError::BadLeadingChar { ch: c, pos })
        }
    }

    fn feed_cmd(&mut self, pos: usize, c: char) -> Result<(), LexError> {
        match c {
            '[' => {
                self.flush_text();
                self.tokens.push(Token::new("["));
                self.cmd_depth += 1;
            }
            ']' => {
                self.flush_text();
                self.tokens.push(Token::new("]"));
                self.cmd_depth -= 1;
                if self.cmd_depth == 0 {
                    self.mode = Mode::None;
                }
            }
            '{' => {
                self.flush_text();
                self.tokens.push(Token::new("{"));
                self.mode = Mode::Code;
                self.code_depth += 1;
            }
            '}' => return Err(LexError::UnexpectedCloseBrace { pos }),
            _ => self.text.get_or_insert_with(String::new).push(c),
        }
        Ok(())
    }

    fn feed_code(&mut self, pos: usize, c: char) -> Result<(), LexError> {
        // 值内部：只有反斜杠转义和闭合单引号是特殊字符
        if let Some(Pending {
            value: ValueState::Quoted { text, escape },
            ..
        }) = &mut self.pending
        {
            if *escape {
                text.push(c);
                *escape = false;
            } else if c == '\\' {
                *escape = true;
            } else if c == '\'' {
                if text.is_empty() {
                    info!("遇到 :'' 空值 token");
                }
                self.flush_pending();
            } else {
                text.push(c);
            }
            return Ok(());
        }

        if let Some(pending) = &mut self.pending {
            if matches!(pending.value, ValueState::AwaitQuote) {
                return match c {
                    '\'' => {
                        pending.value = ValueState::Quoted {
                            text: String::new(),
                            escape: false,
                        };
                        Ok(())
                    }
                    ':' => Err(LexError::DuplicateColon {
                        token: pending.name.clone(),
                        pos,
                    }),
                    _ => Err(LexError::ExpectedQuote {
                        token: pending.name.clone(),
                        ch: c,
                        pos,
                    }),
                };
            }
        }

        match c {
            '}' => {
                self.flush_pending();
                self.tokens.push(Token::new("}"));
                self.code_depth -= 1;
                if self.code_depth == 0 {
                    self.mode = Mode::Cmd;
                }
            }
            '{' => {
                self.flush_pending();
                self.tokens.push(Token::new("{"));
                self.code_depth += 1;
            }
            ':' => match &mut self.pending {
                Some(pending) => pending.value = ValueState::AwaitQuote,
                None => return Err(LexError::ColonOutsideToken { pos }),
            },
            ';' => self.flush_pending(),
            '\'' => return Err(LexError::StrayQuote { pos }),
            c if c.is_whitespace() => self.flush_pending(),
            c if c.is_ascii_alphabetic() => {
                self.pending
                    .get_or_insert_with(|| Pending {
                        name: String::new(),
                        value: ValueState::Absent,
                    })
                    .name
                    .push(c);
            }
            c => {
                self.flush_pending();
                self.tokens.push(Token::new(c.to_string()));
            }
        }
        Ok(())
    }

    fn flush_text(&mut self) {
        if let Some(text) = self.text.take() {
            self.tokens.push(Token::with_value("cmd", text));
        }
    }

    fn flush_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let token = match pending.value {
            ValueState::Quoted { text, .. } => Token::with_value(pending.name, text),
            ValueState::Absent | ValueState::AwaitQuote => Token::new(pending.name),
        };
        self.tokens.push(token);
    }

    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        match self.mode {
            Mode::None => Ok(self.tokens),
            Mode::Cmd => Err(LexError::UnexpectedEnd {
                context: format!("CMD 模式中仍有 {} 层 '[' 未闭合", self.cmd_depth),
            }),
            Mode::Code => match self.pending.take() {
                Some(Pending {
                    name,
                    value: ValueState::Quoted { .. } | ValueState::AwaitQuote,
                }) => Err(LexError::UnexpectedEnd {
                    context: format!("token '{}' 的值未闭合", name),
                }),
                _ => Err(LexError::UnexpectedEnd {
                    context: format!("CODE 模式中仍有 {} 层 '{{' 未闭合", self.code_depth),
                }),
            },
        }
    }
}
