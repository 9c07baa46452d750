//! # Player 模块
//!
//! 把模型、播放上下文和时间轴串起来的驱动器。
//!
//! ## 执行模型
//!
//! ```text
//! tick(delta_ms) -> FrameOutput
//! ```
//!
//! 1. 推进播放上下文的时钟（暂停时不变）
//! 2. 由时间轴计算当前帧位置
//! 3. 合成当前状态的绘制指令

use serde::Serialize;

use crate::compositor::{Anchor, DrawCommand, compose};
use crate::model::{AnimeState, PomyuChara};
use crate::timeline::{FramePosition, PlaybackContext, advance};

/// 一帧的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    /// 当前播放的状态
    pub state: AnimeState,
    /// 当前帧位置；状态未加载或没有帧时为 `None`
    pub position: Option<FramePosition>,
    /// 绘制指令（按绘制顺序）
    pub draws: Vec<DrawCommand>,
}

/// 角色播放器
///
/// 持有一份不可变的 [`PomyuChara`]。重新加载时由宿主整体替换播放器。
///
/// # 使用示例
///
/// ```ignore
/// let chara = Parser::new().parse(text)?;
/// let mut player = CharaPlayer::new(chara, (640, 480));
///
/// loop {
///     let output = player.tick(16);
///     for draw in &output.draws {
///         host.blit(draw);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CharaPlayer {
    chara: PomyuChara,
    context: PlaybackContext,
    viewport: (u32, u32),
}

impl CharaPlayer {
    /// 创建播放器
    ///
    /// - `viewport`: 视口尺寸，角色包围盒居中放置
    pub fn new(chara: PomyuChara, viewport: (u32, u32)) -> Self {
        Self::with_context(chara, viewport, PlaybackContext::new())
    }

    /// 使用已有的播放上下文创建（重新加载时保留选中状态与开关）
    pub fn with_context(chara: PomyuChara, viewport: (u32, u32), context: PlaybackContext) -> Self {
        Self {
            chara,
            context,
            viewport,
        }
    }

    pub fn chara(&self) -> &PomyuChara {
        &self.chara
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PlaybackContext {
        &mut self.context
    }

    /// 切换动画状态（状态变化时从头播放）
    pub fn select(&mut self, state: AnimeState) {
        self.context.select(state);
    }

    /// 角色包围盒在视口中的锚点
    pub fn anchor(&self) -> Anchor {
        Anchor::centered(self.viewport, self.chara.box_size())
    }

    /// 当前帧位置
    pub fn position(&self) -> Option<FramePosition> {
        if !self.chara.loaded {
            return None;
        }
        advance(
            self.chara.state(self.context.selected()),
            self.chara.default_frame_ms(),
            self.context.clock_ms(),
            self.context.loop_enabled,
        )
    }

    /// 当前帧输出（不推进时钟）
    pub fn frame(&self) -> FrameOutput {
        let state = self.context.selected();
        let position = self.position();
        let draws = match position {
            Some(position) => compose(
                &self.chara,
                self.chara.state(state),
                position,
                self.anchor(),
                self.context.use_2p_palette,
            ),
            None => Vec::new(),
        };

        FrameOutput {
            state,
            position,
            draws,
        }
    }

    /// 推进时钟并返回新的帧输出
    pub fn tick(&mut self, delta_ms: u64) -> FrameOutput {
        self.context.tick(delta_ms);
        self.frame()
    }

    /// 取回模型与上下文
    pub fn into_parts(self) -> (PomyuChara, PlaybackContext) {
        (self.chara, self.context)
    }
}
