//! # CHP Runtime
//!
//! Pomyu Chara（`.chp`）角色动画的核心库。
//!
//! ## 架构概述
//!
//! `chp-runtime` 是纯逻辑核心，不依赖任何 IO、解码或渲染。
//! 宿主层（Host）负责读取文件并解码文本，然后逐帧驱动播放：
//!
//! ```text
//! Host                              Runtime
//!   │                                  │
//!   │──── 文本 ─────────────────────►│ Parser::parse()
//!   │◄─── PomyuChara / ParseFailure ──│
//!   │                                  │
//!   │──── delta_ms ─────────────────►│ CharaPlayer::tick()
//!   │◄─── FrameOutput (DrawCommand) ──│
//!   │                                  │
//! ```
//!
//! ## 核心类型
//!
//! - [`PomyuChara`]：解析后的完整模型（矩形表 + 18 个动画状态）
//! - [`Parser`]：两阶段 CHP 解析器
//! - [`CharaPlayer`]：播放驱动
//! - [`DrawCommand`]：交给外部渲染器的绘制指令
//!
//! ## 使用示例
//!
//! ```ignore
//! use chp_runtime::{AnimeState, CharaPlayer, Parser};
//!
//! let chara = Parser::new().parse(text)?;
//! let mut player = CharaPlayer::new(chara, (640, 480));
//! player.select(AnimeState::Fever);
//!
//! loop {
//!     let output = player.tick(16);
//!     for draw in &output.draws {
//!         host.blit(draw);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`hex`]：可变进制数字解码
//! - [`model`]：模型定义
//! - [`parser`]：文本解析
//! - [`tween`]：插值弧推导
//! - [`timeline`]：时间到帧的映射与播放上下文
//! - [`compositor`]：源/目标矩形、透明度与旋转的合成
//! - [`player`]：播放驱动
//! - [`diagnostic`]：解析警告与静态检查
//! - [`error`]：错误类型定义

pub mod compositor;
pub mod diagnostic;
pub mod error;
pub mod hex;
pub mod model;
pub mod parser;
pub mod player;
pub mod timeline;
pub mod tween;

// 重导出核心类型
pub use compositor::{Anchor, DrawCommand, RectF, ResolvedFrame};
pub use diagnostic::{
    BitmapReference, Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_chara,
    extract_bitmap_references,
};
pub use error::{ChpResult, HexError, ParseError, ParseFailure};
pub use model::{
    AnimeState, BitmapSlot, EntryKind, FrameEntry, PomyuChara, Rect, RectAtlas, StateAnimation,
    Track,
};
pub use parser::Parser;
pub use player::{CharaPlayer, FrameOutput};
pub use timeline::{FramePosition, PlaybackContext};
pub use tween::TweenArc;
