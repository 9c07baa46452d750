//! # Timeline 模块
//!
//! 将经过的时间映射为离散帧号与周期内时间。
//!
//! ## 播放上下文
//!
//! 当前选中的状态、暂停、循环开关与 2P 配色都保存在显式的
//! [`PlaybackContext`] 中，由调用方传入，不存在全局状态。
//! 切换状态时时钟归零（重新开始播放）。

use serde::{Deserialize, Serialize};

use crate::model::{AnimeState, StateAnimation};

/// 当前帧位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramePosition {
    /// 离散帧号
    pub frame: usize,
    /// 周期内经过的毫秒数（与插值弧的时间轴一致）
    pub time_ms: u64,
}

/// 计算当前帧位置
///
/// 状态未加载或没有帧时返回 `None`（无内容可显示，不是错误）。
///
/// - 循环（`loop_frame > 0` 且 `loop_enabled`）：在 `[loop, frame_count)` 内周期播放
/// - 否则：在 `[0, frame_count)` 内周期播放
pub fn advance(
    state: &StateAnimation,
    default_frame_ms: u32,
    elapsed_ms: u64,
    loop_enabled: bool,
) -> Option<FramePosition> {
    if !state.loaded || state.frame_count == 0 {
        return None;
    }

    let frame_ms = u64::from(state.effective_frame_ms(default_frame_ms).max(1));
    let frame_count = state.frame_count as u64;

    if state.loop_frame > 0 && loop_enabled {
        let loop_start = u64::from(state.loop_frame).min(frame_count - 1);
        let span = frame_count - loop_start;
        Some(FramePosition {
            frame: ((elapsed_ms / frame_ms) % span + loop_start) as usize,
            time_ms: elapsed_ms % (frame_ms * span) + frame_ms * loop_start,
        })
    } else {
        Some(FramePosition {
            frame: ((elapsed_ms / frame_ms) % frame_count) as usize,
            time_ms: elapsed_ms % (frame_ms * frame_count),
        })
    }
}

/// 播放上下文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    /// 当前选中的动画状态
    selected: AnimeState,
    /// 时钟累加（毫秒）
    clock_ms: u64,
    /// 是否暂停
    pub paused: bool,
    /// 是否启用 `#Loop`
    pub loop_enabled: bool,
    /// 是否使用 2P 配色位图
    pub use_2p_palette: bool,
}

impl Default for PlaybackContext {
    fn default() -> Self {
        Self {
            selected: AnimeState::Neutral,
            clock_ms: 0,
            paused: false,
            loop_enabled: true,
            use_2p_palette: false,
        }
    }
}

impl PlaybackContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> AnimeState {
        self.selected
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// 选择动画状态
    ///
    /// 状态变化时时钟归零；重复选择同一状态不影响播放。
    pub fn select(&mut self, state: AnimeState) {
        if self.selected != state {
            self.selected = state;
            self.clock_ms = 0;
        }
    }

    /// 推进时钟（暂停时不变）
    pub fn tick(&mut self, delta_ms: u64) {
        if !self.paused {
            self.clock_ms = self.clock_ms.saturating_add(delta_ms);
        }
    }

    /// 时钟归零
    pub fn restart(&mut self) {
        self.clock_ms = 0;
    }

    /// 暂停/继续
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}
