//! # 文本解码
//!
//! CHP 文件常见的编码有 UTF-8、UTF-16（带 BOM）和 Shift_JIS。
//! 带 BOM 的输入总是按 BOM 解码，其余情况按 [`EncodingHint`] 处理。

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, UTF_16LE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// 编码提示
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingHint {
    /// 先尝试 UTF-8，失败后按 Shift_JIS 解码
    #[default]
    Auto,
    Utf8,
    /// 无 BOM 时按小端处理
    Utf16,
    ShiftJis,
}

/// 解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("不是有效的 {encoding} 文本")]
    Malformed { encoding: &'static str },
}

/// 文本解码 trait
pub trait TextDecoder {
    fn decode(&self, bytes: &[u8], hint: EncodingHint) -> Result<String, DecodeError>;
}

/// 基于 `encoding_rs` 的解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsDecoder;

impl TextDecoder for EncodingRsDecoder {
    fn decode(&self, bytes: &[u8], hint: EncodingHint) -> Result<String, DecodeError> {
        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            return decode_strict(encoding, &bytes[bom_len..]);
        }

        match hint {
            EncodingHint::Utf8 => decode_strict(UTF_8, bytes),
            EncodingHint::Utf16 => decode_strict(UTF_16LE, bytes),
            EncodingHint::ShiftJis => decode_strict(SHIFT_JIS, bytes),
            EncodingHint::Auto => {
                decode_strict(UTF_8, bytes).or_else(|_| Ok(decode_lossy(SHIFT_JIS, bytes)))
            }
        }
    }
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, DecodeError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(DecodeError::Malformed {
            encoding: encoding.name(),
        })
}

fn decode_lossy(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        warn!(encoding = encoding.name(), "文本包含无法解码的字节，已替换");
    }
    text.into_owned()
}
