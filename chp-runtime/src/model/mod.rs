//! # Model 模块
//!
//! CHP 角色的数据模型：矩形表、18 个动画状态以及角色元数据。
//!
//! 模型在一次解析中构建完成，之后只读；重载时整体替换。
//!
//! ## 模块结构
//!
//! - [`atlas`]：矩形表（Rect Atlas）
//! - [`anime`]：动画状态与帧条目
//! - [`chara`]：角色整体模型与元数据

pub mod anime;
pub mod atlas;
pub mod chara;

pub use anime::{ANIME_STATE_COUNT, AnimeState, EntryKind, FrameEntry, StateAnimation, Track};
pub use atlas::{AtlasEntry, LEGACY_DATA_BASE, Rect, RectAtlas};
pub use chara::{BitmapPaths, BitmapSlot, CharaInfo, DEFAULT_FRAME_MS, PomyuChara};
