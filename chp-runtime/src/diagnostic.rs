//! # 诊断模块
//!
//! 解析警告与角色模型的静态检查，不依赖 IO 或渲染。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（无法正常显示）、Warn（建议修复）、Info（信息提示）
//! - 解析器的可恢复问题同样以 [`Diagnostic`] 记录，带行号

use std::collections::BTreeSet;

use serde::Serialize;

use crate::hex::HOLD;
use crate::model::{AnimeState, BitmapSlot, EntryKind, PomyuChara, Track};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（无法正常显示）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 来源标识（通常是 CHP 文件路径）
    pub source_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如原始行内容）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source_id: source_id.into(),
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, source_id, message)
    }

    /// 创建警告诊断
    pub fn warn(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, source_id, message)
    }

    /// 创建信息诊断
    pub fn info(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, source_id, message)
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
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
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default, Serialize)]
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

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticResult {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

/// 位图引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitmapReference {
    pub slot: BitmapSlot,
    /// 文件中的原始路径（相对 CHP 文件目录）
    pub path: String,
}

//=============================================================================
// 模型分析 API
//=============================================================================

/// 分析角色模型，返回诊断结果
///
/// 执行以下检查：
/// - 没有任何已加载的动画状态
/// - 帧条目引用了矩形表以外的索引（Error）或未定义的矩形（Info）
/// - 使用了 CharBMP / CharTex 却没有声明对应位图
/// - 没有 `#Size` 且背景矩形为空，包围盒尺寸为 0
pub fn analyze_chara(chara: &PomyuChara, source_id: &str) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    if chara.states().all(|(_, s)| !s.loaded) {
        result.push(Diagnostic::warn(source_id, "没有任何已加载的动画状态"));
    }

    let mut needs_bmp = false;
    let mut needs_tex = false;

    for (anime, state) in chara.states() {
        for (kind, entry) in state.all_entries() {
            match kind {
                EntryKind::Texture => needs_tex = true,
                EntryKind::Pattern | EntryKind::Layer => needs_bmp = true,
            }
            check_rect_track(chara, source_id, anime, kind, "Sprite", &entry.sprite, &mut result);
            if let Some(offset) = &entry.offset {
                check_rect_track(chara, source_id, anime, kind, "Offset", offset, &mut result);
            }
        }
    }

    if needs_bmp && chara.info.bitmaps.get(BitmapSlot::CharBmp).is_none() {
        result.push(Diagnostic::error(
            source_id,
            "Pattern/Layer 需要 #CharBMP，但文件中没有声明",
        ));
    }
    if needs_tex && chara.info.bitmaps.get(BitmapSlot::CharTex).is_none() {
        result.push(Diagnostic::error(
            source_id,
            "Texture 需要 #CharTex，但文件中没有声明",
        ));
    }

    let (w, h) = chara.box_size();
    if w <= 0 || h <= 0 {
        result.push(
            Diagnostic::warn(source_id, "角色包围盒尺寸为 0")
                .with_detail("没有 #Size，且背景矩形（索引 1）未定义"),
        );
    }

    result
}

fn check_rect_track(
    chara: &PomyuChara,
    source_id: &str,
    anime: AnimeState,
    kind: EntryKind,
    track_name: &str,
    track: &Track,
    result: &mut DiagnosticResult,
) {
    let indices: BTreeSet<i32> = track.values.iter().copied().filter(|&v| v != HOLD).collect();

    for index in indices {
        match chara.atlas.entry(index) {
            None => result.push(
                Diagnostic::error(
                    source_id,
                    format!("状态 {anime} 的 {kind:?} {track_name} 引用了不存在的矩形 {index}"),
                )
                .with_detail(format!("矩形表大小为 {}", chara.atlas.len())),
            ),
            Some(entry) if !entry.defined => result.push(Diagnostic::info(
                source_id,
                format!("状态 {anime} 的 {kind:?} {track_name} 引用了未定义的矩形 {index}"),
            )),
            Some(_) => {}
        }
    }
}

/// 提取角色文件中的所有位图引用
pub fn extract_bitmap_references(chara: &PomyuChara) -> Vec<BitmapReference> {
    chara
        .info
        .bitmaps
        .iter()
        .map(|(slot, path)| BitmapReference {
            slot,
            path: path.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warn("chara.chp", "跳过该行")
            .with_line(10)
            .with_detail("#Pattern 1");

        let display = format!("{}", diag);
        assert!(display.contains("[WARN]"));
        assert!(display.contains("chara.chp:10"));
        assert!(display.contains("跳过该行"));
        assert!(display.contains("| #Pattern 1"));
    }

    #[test]
    fn test_analyze_reports_out_of_range_rect() {
        let text = "\
#Data 4
#CharBMP chara.bmp
#Size 10 10
#01 0 0 10 10
#Pattern 1 0155 0101
";
        let chara = Parser::new().parse(text).unwrap();
        let result = analyze_chara(&chara, "test.chp");

        // "55" 在 base 4 下非法，回退为 1；没有越界引用
        assert!(!result.has_errors());

        let text = "\
#Data 4
#CharBMP chara.bmp
#Size 10 10
#Pattern 1 0155 0101
";
        let chara = Parser::new().parse(text).unwrap();
        let result = analyze_chara(&chara, "test.chp");
        assert!(!result.has_errors());
        // 索引 1 未定义
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.level == DiagnosticLevel::Info && d.message.contains("未定义的矩形 1"))
        );
    }

    #[test]
    fn test_analyze_reports_missing_bitmaps() {
        let text = "\
#Size 10 10
#Texture 1 00
#Layer 1 00
";
        let chara = Parser::new().parse(text).unwrap();
        let result = analyze_chara(&chara, "test.chp");
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_analyze_legacy_index_outside_atlas() {
        // 旧格式帧数组按 16 进制解码，可以超出 100 个矩形
        let text = "\
#CharBMP a.bmp
#Size 10 10
#Pattern 1 FF
";
        let chara = Parser::new().parse(text).unwrap();
        let result = analyze_chara(&chara, "test.chp");
        assert_eq!(result.error_count(), 1);
        assert!(result.diagnostics[0].message.contains("不存在的矩形 255"));
    }

    #[test]
    fn test_analyze_empty_chara() {
        let chara = Parser::new().parse("#CharName Empty").unwrap();
        let result = analyze_chara(&chara, "empty.chp");
        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 2);
    }

    #[test]
    fn test_extract_bitmap_references() {
        let text = "#CharBMP body.bmp\n#CharTex tex dir/tex.png\n";
        let chara = Parser::new().parse(text).unwrap();
        let refs = extract_bitmap_references(&chara);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].slot, BitmapSlot::CharBmp);
        assert_eq!(refs[1].path, "tex dir/tex.png");
    }
}
