//! # Parser 模块
//!
//! 两阶段 CHP 解析器（手写，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 行识别] → Vec<SourceLine> → [阶段2: 指令解析] → PomyuChara
//!                                                          ↓
//!                                              [后处理: 帧数 / 插值弧]
//! ```
//!
//! ## 容错策略
//!
//! - 可恢复的问题（未知指令、参数不足的帧条目、数字回退）记录为
//!   [`Diagnostic`] 并跳过，可通过 [`Parser::warnings`] 获取
//! - 致命问题（状态编号越界、无效整数、缺少必需参数）中止解析，
//!   返回带部分模型的 [`ParseFailure`]
//!
//! ## 模块结构
//!
//! - `helpers`: 参数读取
//! - `phase1`: 行识别
//! - `phase2`: 指令解析

mod helpers;
mod phase1;
mod phase2;

#[cfg(test)]
mod tests;

use crate::diagnostic::Diagnostic;
use crate::error::ParseFailure;
use crate::model::PomyuChara;

use phase1::recognize_lines;
use phase2::Phase2Parser;

/// 未指定来源时的诊断标识
const DEFAULT_SOURCE_ID: &str = "<chp>";

/// CHP 解析器
pub struct Parser {
    /// 阶段2解析器
    phase2: Phase2Parser,
}

impl Parser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self::with_source_id(DEFAULT_SOURCE_ID)
    }

    /// 创建带来源标识的解析器（诊断中显示，通常是文件路径）
    pub fn with_source_id(source_id: impl Into<String>) -> Self {
        Self {
            phase2: Phase2Parser::new(source_id),
        }
    }

    /// 解析 CHP 文本
    ///
    /// 成功时返回 `loaded == true` 的模型。致命错误时返回 [`ParseFailure`]，
    /// 其中的部分模型同样经过后处理，但 `loaded == false`。
    pub fn parse(&mut self, text: &str) -> Result<PomyuChara, ParseFailure> {
        self.phase2.warnings.clear();
        let mut chara = PomyuChara::default();

        // 阶段 1：行识别
        let lines = recognize_lines(text);

        // 阶段 2：指令解析
        for line in &lines {
            if let Err(error) = self.phase2.parse_line(line, &mut chara) {
                chara.finalize();
                chara.loaded = false;
                return Err(ParseFailure {
                    error,
                    partial: Box::new(chara),
                });
            }
        }

        // 后处理
        for (state, lengths) in chara.finalize() {
            let lengths = lengths
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            self.phase2.warnings.push(
                Diagnostic::warn(
                    &self.phase2.source_id,
                    format!("状态 {state} 的帧数组长度不一致，按最短长度播放"),
                )
                .with_detail(format!("长度: {lengths}")),
            );
        }
        chara.loaded = true;
        Ok(chara)
    }

    /// 获取最近一次解析的诊断（警告与信息）
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.phase2.warnings
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
