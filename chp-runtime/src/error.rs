//! # Error 模块
//!
//! 定义 chp-runtime 中使用的错误类型。
//!
//! 只有会中止解析的问题才以错误返回；可恢复的问题（跳过行、数字回退、
//! 数组长度不一致）作为 [`Diagnostic`](crate::diagnostic::Diagnostic) 收集。

use thiserror::Error;

use crate::model::PomyuChara;

/// 十六进制（可变进制）解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// 进制超出 2..=36
    #[error("进制 {base} 超出范围（2..=36）")]
    BaseOutOfRange { base: u32 },

    /// 字符不在 `0-9A-Z` 字母表内
    #[error("无效的数字字符 '{ch}'")]
    InvalidDigit { ch: char },

    /// 数字值不小于进制
    #[error("数字 '{ch}' 的值 {digit} 超出进制 {base}")]
    DigitOutOfRange { ch: char, digit: u32, base: u32 },

    /// 空 token
    #[error("空的数字 token")]
    EmptyToken,

    /// 解码值溢出
    #[error("token '{token}' 的值溢出")]
    Overflow { token: String },
}

/// 解析错误（致命，中止后续行）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 缺少必需参数
    #[error("第 {line} 行：指令 '{command}' 缺少参数 '{param}'")]
    MissingParameter {
        line: usize,
        command: String,
        param: String,
    },

    /// 无效的整数
    #[error("第 {line} 行：参数 '{param}' 不是有效的整数 - '{value}'")]
    InvalidNumber {
        line: usize,
        param: String,
        value: String,
    },

    /// 动画状态编号超出 1..=18
    #[error("第 {line} 行：动画状态编号 {index} 超出范围（1..=18）")]
    StateOutOfRange { line: usize, index: i64 },

    /// 无效的 `#Data` 进制
    #[error("第 {line} 行：#Data 进制 {base} 超出范围（2..=36）")]
    InvalidDataBase { line: usize, base: i64 },
}

impl ParseError {
    /// 解析停止所在的行号（从 1 开始）
    pub fn line(&self) -> usize {
        match self {
            Self::MissingParameter { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::StateOutOfRange { line, .. }
            | Self::InvalidDataBase { line, .. } => *line,
        }
    }
}

/// 致命解析失败
///
/// 携带已解析的部分模型（`loaded == false`），便于宿主展示已知字段。
#[derive(Error, Debug, Clone)]
#[error("{error}")]
pub struct ParseFailure {
    /// 导致中止的错误
    #[source]
    pub error: ParseError,
    /// 中止前已解析的部分模型
    pub partial: Box<PomyuChara>,
}

impl ParseFailure {
    /// 解析停止所在的行号
    pub fn line(&self) -> usize {
        self.error.line()
    }
}

/// Result 类型别名
pub type ChpResult<T> = Result<T, ParseFailure>;
