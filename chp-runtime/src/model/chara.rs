//! # Chara 模块
//!
//! 角色整体模型：元数据、矩形表与 18 个动画状态。

use serde::{Deserialize, Serialize};

use super::anime::{ANIME_STATE_COUNT, AnimeState, StateAnimation};
use super::atlas::{LEGACY_DATA_BASE, Rect, RectAtlas};

/// 未声明 `#Anime` 时的每帧毫秒数
pub const DEFAULT_FRAME_MS: u32 = 100;

/// 位图槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitmapSlot {
    CharBmp,
    CharBmp2P,
    CharFace,
    CharFace2P,
    SelectCg,
    SelectCg2P,
    CharTex,
    CharTex2P,
}

impl BitmapSlot {
    pub const ALL: [BitmapSlot; 8] = [
        Self::CharBmp,
        Self::CharBmp2P,
        Self::CharFace,
        Self::CharFace2P,
        Self::SelectCg,
        Self::SelectCg2P,
        Self::CharTex,
        Self::CharTex2P,
    ];

    /// 对应的指令名（不含 `#`）
    pub fn directive(self) -> &'static str {
        match self {
            Self::CharBmp => "CharBMP",
            Self::CharBmp2P => "CharBMP2P",
            Self::CharFace => "CharFace",
            Self::CharFace2P => "CharFace2P",
            Self::SelectCg => "SelectCG",
            Self::SelectCg2P => "SelectCG2P",
            Self::CharTex => "CharTex",
            Self::CharTex2P => "CharTex2P",
        }
    }

    /// 按指令名（大小写不敏感，不含 `#`）查找
    pub fn from_directive(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.directive().eq_ignore_ascii_case(name))
    }

    /// 2P 配色对应的槽位
    pub fn for_player2(self) -> Self {
        match self {
            Self::CharBmp => Self::CharBmp2P,
            Self::CharFace => Self::CharFace2P,
            Self::SelectCg => Self::SelectCg2P,
            Self::CharTex => Self::CharTex2P,
            other => other,
        }
    }
}

/// 8 个位图路径（相对 CHP 文件目录）
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BitmapPaths {
    paths: [Option<String>; 8],
}

impl BitmapPaths {
    pub fn get(&self, slot: BitmapSlot) -> Option<&str> {
        self.paths[slot as usize].as_deref()
    }

    pub(crate) fn set(&mut self, slot: BitmapSlot, path: String) {
        self.paths[slot as usize] = Some(path);
    }

    /// 已声明的槽位与路径
    pub fn iter(&self) -> impl Iterator<Item = (BitmapSlot, &str)> {
        BitmapSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|p| (slot, p)))
    }
}

/// 角色元数据（标量指令）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharaInfo {
    pub name: Option<String>,
    pub artist: Option<String>,
    /// 全局每帧毫秒数（`#Anime`），0 表示未声明
    pub anime: u32,
    /// 角色包围盒尺寸（`#Size`）
    pub size: Option<(i32, i32)>,
    pub wait: u32,
    /// 矩形索引进制（`#Data`）
    pub data: u32,
    /// 是否为旧格式（未声明 `#Data`）
    pub legacy: bool,
    /// 显式 `#AutoColorSet`
    pub auto_color_set: bool,
    pub char_face_all_size: Option<Rect>,
    pub char_face_upper_size: Option<Rect>,
    pub bitmaps: BitmapPaths,
}

impl Default for CharaInfo {
    fn default() -> Self {
        Self {
            name: None,
            artist: None,
            anime: 0,
            size: None,
            wait: 0,
            data: LEGACY_DATA_BASE,
            legacy: true,
            auto_color_set: false,
            char_face_all_size: None,
            char_face_upper_size: None,
            bitmaps: BitmapPaths::default(),
        }
    }
}

impl CharaInfo {
    /// 帧数组 Sprite/Offset 使用的进制
    pub fn sprite_base(&self) -> u32 {
        if self.legacy { 16 } else { self.data }
    }

    /// 是否需要颜色键（旧格式总是开启）
    pub fn color_key(&self) -> bool {
        self.legacy || self.auto_color_set
    }
}

/// Pomyu Chara 完整模型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomyuChara {
    pub info: CharaInfo,
    pub atlas: RectAtlas,
    states: [StateAnimation; ANIME_STATE_COUNT],
    /// 解析是否完整成功
    pub loaded: bool,
}

impl Default for PomyuChara {
    fn default() -> Self {
        Self {
            info: CharaInfo::default(),
            atlas: RectAtlas::default(),
            states: Default::default(),
            loaded: false,
        }
    }
}

impl PomyuChara {
    pub fn state(&self, state: AnimeState) -> &StateAnimation {
        &self.states[state.index()]
    }

    pub(crate) fn state_mut(&mut self, state: AnimeState) -> &mut StateAnimation {
        &mut self.states[state.index()]
    }

    /// 按文件顺序遍历全部状态
    pub fn states(&self) -> impl Iterator<Item = (AnimeState, &StateAnimation)> {
        AnimeState::ALL.into_iter().zip(self.states.iter())
    }

    /// 全局默认每帧毫秒数
    pub fn default_frame_ms(&self) -> u32 {
        if self.info.anime > 0 {
            self.info.anime
        } else {
            DEFAULT_FRAME_MS
        }
    }

    /// 角色包围盒尺寸
    ///
    /// 未声明 `#Size` 时使用背景矩形（索引 1）的尺寸。
    pub fn box_size(&self) -> (i32, i32) {
        self.info.size.unwrap_or_else(|| {
            self.atlas
                .base_rect()
                .map(|r| (r.w, r.h))
                .unwrap_or((0, 0))
        })
    }

    /// 解析结束后的统一后处理：帧数与插值弧
    ///
    /// 返回帧数组长度不一致的状态及其全部长度。
    pub(crate) fn finalize(&mut self) -> Vec<(AnimeState, Vec<usize>)> {
        let default_frame_ms = self.default_frame_ms();
        AnimeState::ALL
            .into_iter()
            .filter_map(|state| {
                self.states[state.index()]
                    .finalize(default_frame_ms)
                    .map(|lengths| (state, lengths))
            })
            .collect()
    }
}
