//! # Atlas 模块
//!
//! 矩形表：按索引引用的源/目标矩形。

use serde::{Deserialize, Serialize};

/// 未声明 `#Data` 时（旧格式）使用的进制
pub const LEGACY_DATA_BASE: u32 = 10;

/// 整数矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// 宽高是否都为正
    pub fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }
}

/// 矩形表条目
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AtlasEntry {
    pub rect: Rect,
    /// 定义行的尾注释
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 是否被文件显式定义过
    #[serde(default)]
    pub defined: bool,
}

/// 矩形表
///
/// 大小为 `base × base`。索引 0 约定为名称 logo，索引 1 为背景（基准）矩形，
/// 但不做强制。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectAtlas {
    entries: Vec<AtlasEntry>,
}

impl RectAtlas {
    /// 索引 1：背景（基准）矩形
    pub const BASE: usize = 1;

    /// 创建 `base × base` 个零矩形
    pub fn with_base(base: u32) -> Self {
        let len = (base as usize) * (base as usize);
        Self {
            entries: vec![AtlasEntry::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按索引查找矩形
    ///
    /// 负数或越界索引返回 `None`。
    pub fn get(&self, index: i32) -> Option<&Rect> {
        self.entry(index).map(|e| &e.rect)
    }

    /// 按索引查找完整条目
    pub fn entry(&self, index: i32) -> Option<&AtlasEntry> {
        usize::try_from(index).ok().and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[AtlasEntry] {
        &self.entries
    }

    /// 背景（基准）矩形
    pub fn base_rect(&self) -> Option<&Rect> {
        self.entries.get(Self::BASE).map(|e| &e.rect)
    }

    /// 显式定义过的条目数量
    pub fn defined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.defined).count()
    }

    /// 仅供解析器在构建阶段写入
    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut AtlasEntry> {
        self.entries.get_mut(index)
    }
}

impl Default for RectAtlas {
    fn default() -> Self {
        Self::with_base(LEGACY_DATA_BASE)
    }
}
