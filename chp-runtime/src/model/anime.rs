//! # Anime 模块
//!
//! 动画状态枚举、每个状态的帧表以及帧条目。

use serde::{Deserialize, Serialize};

use crate::hex::HOLD;
use crate::tween::{TweenArc, build_arcs};

/// 动画状态数量
pub const ANIME_STATE_COUNT: usize = 18;

/// 固定的 18 个动画状态（文件中以 1 开始编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimeState {
    Neutral,
    Second,
    Ojama,
    Miss,
    Standing,
    Fever,
    Great,
    Good,
    PlayerHits1,
    PlayerHits2,
    PlayerHits3,
    PlayerHits4,
    State13,
    Dance,
    Win,
    Lose,
    FeverWin,
    AttackedByOjama,
}

impl AnimeState {
    /// 按文件顺序排列的全部状态
    pub const ALL: [AnimeState; ANIME_STATE_COUNT] = [
        Self::Neutral,
        Self::Second,
        Self::Ojama,
        Self::Miss,
        Self::Standing,
        Self::Fever,
        Self::Great,
        Self::Good,
        Self::PlayerHits1,
        Self::PlayerHits2,
        Self::PlayerHits3,
        Self::PlayerHits4,
        Self::State13,
        Self::Dance,
        Self::Win,
        Self::Lose,
        Self::FeverWin,
        Self::AttackedByOjama,
    ];

    /// 0 开始的数组下标
    pub fn index(self) -> usize {
        self as usize
    }

    /// 从 0 开始的下标获取状态
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 从文件中的 1 开始编号获取状态
    pub fn from_number(number: i64) -> Option<Self> {
        usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(Self::from_index)
    }

    /// 文件中的 1 开始编号
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Second => "Second",
            Self::Ojama => "Ojama",
            Self::Miss => "Miss",
            Self::Standing => "Standing",
            Self::Fever => "Fever",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::PlayerHits1 => "PlayerHits1",
            Self::PlayerHits2 => "PlayerHits2",
            Self::PlayerHits3 => "PlayerHits3",
            Self::PlayerHits4 => "PlayerHits4",
            Self::State13 => "State13",
            Self::Dance => "Dance",
            Self::Win => "Win",
            Self::Lose => "Lose",
            Self::FeverWin => "FeverWin",
            Self::AttackedByOjama => "AttackedByOjama",
        }
    }
}

impl std::fmt::Display for AnimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// 单条逐帧整数数组及其插值弧
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Track {
    /// 原始逐帧值，[`HOLD`] 表示本帧无值
    pub values: Vec<i32>,
    /// 由 `values` 推导出的插值弧（按起始时间排序）
    pub arcs: Vec<TweenArc>,
}

impl Track {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            arcs: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 指定帧的离散值
    ///
    /// 帧号先夹到 `[0, len-1]`；遇到 [`HOLD`] 时向前沿用最近的有效值。
    pub fn discrete_at(&self, frame: usize) -> Option<i32> {
        let last = self.values.len().checked_sub(1)?;
        self.values[..=frame.min(last)]
            .iter()
            .rev()
            .copied()
            .find(|&v| v != HOLD)
    }

    /// 包含 `time_ms` 的插值弧（闭区间，取第一个）
    pub fn arc_at(&self, time_ms: u64) -> Option<&TweenArc> {
        self.arcs.iter().find(|arc| arc.contains(time_ms))
    }

    pub(crate) fn rebuild_arcs(&mut self, frame_ms: u32) {
        self.arcs = build_arcs(&self.values, frame_ms);
    }
}

/// 帧条目所属的层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// 背景图案
    Pattern,
    /// 可独立变换的纹理层
    Texture,
    /// 需要裁剪的前景层
    Layer,
}

/// Pattern / Texture / Layer 条目
///
/// `alpha` 与 `rotation` 仅 Texture 使用。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameEntry {
    /// 源矩形索引（必需）
    pub sprite: Track,
    /// 目标矩形索引
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Track>,
    /// 透明度字节 0-255
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<Track>,
    /// 旋转字节 0-255（一圈 256）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FrameEntry {
    /// 条目中所有存在的数组
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        std::iter::once(&self.sprite)
            .chain(self.offset.as_ref())
            .chain(self.alpha.as_ref())
            .chain(self.rotation.as_ref())
    }

    fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        std::iter::once(&mut self.sprite)
            .chain(self.offset.as_mut())
            .chain(self.alpha.as_mut())
            .chain(self.rotation.as_mut())
    }
}

/// 单个动画状态的帧表
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateAnimation {
    /// 是否定义过任何条目
    pub loaded: bool,
    /// 每帧毫秒数，0 表示使用全局默认值
    pub frame: u32,
    /// 完整播放一遍后回到的帧号，0 表示不循环
    pub loop_frame: u32,
    /// 帧数（所有数组长度的最小值）
    pub frame_count: usize,
    pub patterns: Vec<FrameEntry>,
    pub textures: Vec<FrameEntry>,
    pub layers: Vec<FrameEntry>,
}

impl StateAnimation {
    /// 实际使用的每帧毫秒数
    pub fn effective_frame_ms(&self, default_frame_ms: u32) -> u32 {
        if self.frame > 0 {
            self.frame
        } else {
            default_frame_ms
        }
    }

    /// 指定层的条目
    pub fn entries(&self, kind: EntryKind) -> &[FrameEntry] {
        match kind {
            EntryKind::Pattern => &self.patterns,
            EntryKind::Texture => &self.textures,
            EntryKind::Layer => &self.layers,
        }
    }

    pub(crate) fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<FrameEntry> {
        match kind {
            EntryKind::Pattern => &mut self.patterns,
            EntryKind::Texture => &mut self.textures,
            EntryKind::Layer => &mut self.layers,
        }
    }

    /// 所有条目（按 Pattern → Texture → Layer 顺序）
    pub fn all_entries(&self) -> impl Iterator<Item = (EntryKind, &FrameEntry)> {
        self.patterns
            .iter()
            .map(|e| (EntryKind::Pattern, e))
            .chain(self.textures.iter().map(|e| (EntryKind::Texture, e)))
            .chain(self.layers.iter().map(|e| (EntryKind::Layer, e)))
    }

    /// 所有数组的长度（去重、升序）
    pub fn distinct_track_lengths(&self) -> Vec<usize> {
        let mut lengths: Vec<usize> = self
            .all_entries()
            .flat_map(|(_, e)| e.tracks().map(Track::len))
            .collect();
        lengths.sort_unstable();
        lengths.dedup();
        lengths
    }

    /// 帧数与插值弧的后处理
    ///
    /// 返回不一致时的全部长度（用于告警）。
    pub(crate) fn finalize(&mut self, default_frame_ms: u32) -> Option<Vec<usize>> {
        let lengths = self.distinct_track_lengths();
        self.frame_count = lengths.first().copied().unwrap_or(0);

        let frame_ms = self.effective_frame_ms(default_frame_ms);
        for entry in self
            .patterns
            .iter_mut()
            .chain(self.textures.iter_mut())
            .chain(self.layers.iter_mut())
        {
            for track in entry.tracks_mut() {
                track.rebuild_arcs(frame_ms);
            }
        }

        (lengths.len() > 1).then_some(lengths)
    }
}
