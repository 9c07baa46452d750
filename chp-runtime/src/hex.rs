//! # Hex 模块
//!
//! CHP 帧数组使用的可变进制编码。
//!
//! 帧数组是定宽 token 的拼接（默认每 2 个字符一个 token），每个 token
//! 按指定进制解码；`--` 表示"本帧无值，保持/插值"，解码为 `-1`。
//!
//! ```text
//! "--AB" (base 16) → [-1, 0xAB]
//! ```

use crate::error::HexError;

/// 帧数组中"保持"占位值
pub const HOLD: i32 = -1;

/// 帧数组 token 的默认宽度
pub const TOKEN_WIDTH: usize = 2;

/// 支持的最大进制（`0-9A-Z`）
pub const MAX_BASE: u32 = 36;

/// 解码单个数字字符
///
/// 大小写不敏感；`base` 超过 36 时返回 [`HexError::BaseOutOfRange`]。
pub fn parse_digit(ch: char, base: u32) -> Result<u32, HexError> {
    if !(2..=MAX_BASE).contains(&base) {
        return Err(HexError::BaseOutOfRange { base });
    }

    let digit = match ch.to_ascii_uppercase() {
        c @ '0'..='9' => c as u32 - '0' as u32,
        c @ 'A'..='Z' => c as u32 - 'A' as u32 + 10,
        _ => return Err(HexError::InvalidDigit { ch }),
    };

    if digit >= base {
        return Err(HexError::DigitOutOfRange { ch, digit, base });
    }
    Ok(digit)
}

/// 解码单个 token
///
/// 全部由 `-` 组成的 token 无条件返回 [`HOLD`]。
pub fn parse_token(token: &str, base: u32) -> Result<i32, HexError> {
    if token.is_empty() {
        return Err(HexError::EmptyToken);
    }
    if token.chars().all(|c| c == '-') {
        return Ok(HOLD);
    }

    let mut value: i32 = 0;
    for ch in token.chars() {
        let digit = parse_digit(ch, base)? as i32;
        value = value
            .checked_mul(base as i32)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| HexError::Overflow {
                token: token.to_string(),
            })?;
    }
    Ok(value)
}

/// 单个 token 解码失败后回退到上一个值的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitFallback {
    /// token 在序列中的位置（帧索引）
    pub position: usize,
    /// 原始 token 文本
    pub token: String,
    /// 解码错误
    pub error: HexError,
    /// 实际使用的回退值
    pub fallback: i32,
}

/// 序列解码结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedSequence {
    /// 每帧的值
    pub values: Vec<i32>,
    /// 发生回退的 token
    pub fallbacks: Vec<DigitFallback>,
    /// 末尾不足一个 token 宽度而被忽略的字符
    pub trailing: Option<String>,
}

/// 序列首个 token 解码失败（没有可回退的值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceError {
    /// 原始 token 文本
    pub token: String,
    /// 解码错误
    pub error: HexError,
}

/// 解码整个帧数组
///
/// 长度为 `hex.len() / width`。位置 > 0 的 token 失败时沿用上一个 token
/// 的值并记录在 [`DecodedSequence::fallbacks`]；位置 0 失败则整体返回错误。
pub fn parse_sequence(hex: &str, base: u32, width: usize) -> Result<DecodedSequence, SequenceError> {
    let width = width.max(1);
    let chars: Vec<char> = hex.chars().collect();
    let mut decoded = DecodedSequence {
        values: Vec::with_capacity(chars.len() / width),
        ..Default::default()
    };

    let mut chunks = chars.chunks_exact(width);
    for (position, chunk) in chunks.by_ref().enumerate() {
        let token: String = chunk.iter().collect();
        match parse_token(&token, base) {
            Ok(value) => decoded.values.push(value),
            Err(error) => {
                let Some(&previous) = decoded.values.last() else {
                    return Err(SequenceError { token, error });
                };
                decoded.values.push(previous);
                decoded.fallbacks.push(DigitFallback {
                    position,
                    token,
                    error,
                    fallback: previous,
                });
            }
        }
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        decoded.trailing = Some(rest.iter().collect());
    }

    Ok(decoded)
}
