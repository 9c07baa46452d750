//! # Compositor 模块
//!
//! 根据当前帧位置解析每个条目的绘制参数。
//!
//! ## 解析规则
//!
//! 每个属性（源矩形、目标矩形、透明度、旋转）独立解析：
//!
//! 1. 帧号夹到该数组的 `[0, len-1]`
//! 2. 取离散值（`-1` 沿用前一个有效值）
//! 3. 若某段插值弧的闭区间包含当前时间，用插值结果覆盖离散值
//!
//! 目标矩形再按锚点平移；Layer 裁剪到角色包围盒，Pattern 的宽高不超过
//! 背景矩形。
//!
//! 所有调用方（预览、导出、检查）都走这一套算法。

use serde::{Deserialize, Serialize};

use crate::hex::HOLD;
use crate::model::{
    BitmapSlot, EntryKind, FrameEntry, PomyuChara, Rect, RectAtlas, StateAnimation, Track,
};
use crate::timeline::FramePosition;
use crate::tween::lerp;

/// 透明度字节的最大值
const ALPHA_MAX: f32 = 255.0;
/// 旋转字节一圈的刻度数
const ROTATION_STEPS: f32 = 256.0;
/// 裁剪后源矩形的最小边长（像素）
const MIN_SOURCE_EDGE: f32 = 1.0;

/// 浮点矩形（插值与裁剪后的结果）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// 逐分量线性插值
    pub fn lerp(a: RectF, b: RectF, t: f32) -> Self {
        Self {
            x: lerp(a.x, b.x, t),
            y: lerp(a.y, b.y, t),
            w: lerp(a.w, b.w, t),
            h: lerp(a.h, b.h, t),
        }
    }
}

impl From<Rect> for RectF {
    fn from(r: Rect) -> Self {
        Self::new(r.x as f32, r.y as f32, r.w as f32, r.h as f32)
    }
}

/// 角色包围盒左上角的屏幕坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    /// 视口中心减去角色尺寸的一半
    pub fn centered(viewport: (u32, u32), box_size: (i32, i32)) -> Self {
        Self {
            x: viewport.0 as f32 / 2.0 - box_size.0 as f32 / 2.0,
            y: viewport.1 as f32 / 2.0 - box_size.1 as f32 / 2.0,
        }
    }

    /// 以锚点为左上角的包围盒
    pub fn bounding_box(&self, box_size: (i32, i32)) -> RectF {
        RectF::new(self.x, self.y, box_size.0 as f32, box_size.1 as f32)
    }
}

/// 单个条目的解析结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFrame {
    /// 位图上的源矩形
    pub src: RectF,
    /// 屏幕上的目标矩形（已按锚点平移）
    pub dst: RectF,
    /// 透明度 `[0, 1]`
    pub alpha: f32,
    /// 旋转角度（度）
    pub rotation_deg: f32,
}

/// 交给外部渲染器的一条绘制指令
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub kind: EntryKind,
    /// 条目在所属层中的序号
    pub entry_index: usize,
    pub bitmap: BitmapSlot,
    pub src: RectF,
    pub dst: RectF,
    pub alpha: f32,
    pub rotation_deg: f32,
}

/// 解析单个条目
///
/// 源矩形无法解析（没有有效索引或索引越界）时返回 `None`，该条目不绘制。
pub fn resolve(
    entry: &FrameEntry,
    atlas: &RectAtlas,
    anchor: Anchor,
    position: FramePosition,
) -> Option<ResolvedFrame> {
    let src = resolve_rect(&entry.sprite, atlas, position)?;
    let dst = entry
        .offset
        .as_ref()
        .and_then(|track| resolve_rect(track, atlas, position))
        .unwrap_or(RectF::new(0.0, 0.0, src.w, src.h))
        .translate(anchor.x, anchor.y);

    let alpha = entry
        .alpha
        .as_ref()
        .and_then(|track| resolve_scalar(track, position))
        .unwrap_or(ALPHA_MAX);
    let rotation = entry
        .rotation
        .as_ref()
        .and_then(|track| resolve_scalar(track, position))
        .unwrap_or(0.0);

    Some(ResolvedFrame {
        src,
        dst,
        alpha: (alpha / ALPHA_MAX).clamp(0.0, 1.0),
        rotation_deg: rotation / ROTATION_STEPS * 360.0,
    })
}

/// 解析矩形属性
fn resolve_rect(track: &Track, atlas: &RectAtlas, position: FramePosition) -> Option<RectF> {
    if let Some(arc) = track.arc_at(position.time_ms)
        && let (Some(from), Some(to)) = (atlas.get(arc.start_value), atlas.get(arc.end_value))
    {
        return Some(RectF::lerp(
            (*from).into(),
            (*to).into(),
            arc.progress(position.time_ms),
        ));
    }

    let last = track.len().checked_sub(1)?;
    track.values[..=position.frame.min(last)]
        .iter()
        .rev()
        .filter(|&&v| v != HOLD)
        .find_map(|&v| atlas.get(v))
        .map(|r| (*r).into())
}

/// 解析标量属性（返回原始字节值）
fn resolve_scalar(track: &Track, position: FramePosition) -> Option<f32> {
    match track.arc_at(position.time_ms) {
        Some(arc) => Some(arc.lerp(position.time_ms)),
        None => track.discrete_at(position.frame).map(|v| v as f32),
    }
}

/// 将 Layer 裁剪到包围盒
///
/// 每条边超出的部分从目标矩形去掉，源矩形按同一比例去掉。
/// 裁剪后源矩形宽或高小于 1 像素时返回 `None`（不绘制）。
pub fn clip_to_box(src: RectF, dst: RectF, bbox: RectF) -> Option<(RectF, RectF)> {
    if dst.w <= 0.0 || dst.h <= 0.0 {
        return None;
    }
    let scale_x = src.w / dst.w;
    let scale_y = src.h / dst.h;
    let (mut src, mut dst) = (src, dst);

    let left = bbox.x - dst.x;
    if left > 0.0 {
        dst.x += left;
        dst.w -= left;
        src.x += left * scale_x;
        src.w -= left * scale_x;
    }
    let right = dst.right() - bbox.right();
    if right > 0.0 {
        dst.w -= right;
        src.w -= right * scale_x;
    }
    let top = bbox.y - dst.y;
    if top > 0.0 {
        dst.y += top;
        dst.h -= top;
        src.y += top * scale_y;
        src.h -= top * scale_y;
    }
    let bottom = dst.bottom() - bbox.bottom();
    if bottom > 0.0 {
        dst.h -= bottom;
        src.h -= bottom * scale_y;
    }

    if src.w < MIN_SOURCE_EDGE || src.h < MIN_SOURCE_EDGE || dst.w <= 0.0 || dst.h <= 0.0 {
        return None;
    }
    Some((src, dst))
}

/// 将 Pattern 的目标宽高限制在背景矩形之内（取最小值，不按比例裁剪）
pub fn cap_to_base(dst: RectF, base: Option<&Rect>) -> RectF {
    match base {
        Some(base) if base.has_area() => RectF {
            w: dst.w.min(base.w as f32),
            h: dst.h.min(base.h as f32),
            ..dst
        },
        _ => dst,
    }
}

/// 合成一个状态在指定帧位置的全部绘制指令
///
/// 顺序：Pattern（CharBMP）→ Texture（CharTex）→ Layer（CharBMP）。
pub fn compose(
    chara: &PomyuChara,
    state: &StateAnimation,
    position: FramePosition,
    anchor: Anchor,
    use_2p_palette: bool,
) -> Vec<DrawCommand> {
    let bbox = anchor.bounding_box(chara.box_size());
    let mut commands = Vec::new();

    for kind in [EntryKind::Pattern, EntryKind::Texture, EntryKind::Layer] {
        let bitmap = bitmap_for(kind, use_2p_palette);
        for (entry_index, entry) in state.entries(kind).iter().enumerate() {
            let Some(frame) = resolve(entry, &chara.atlas, anchor, position) else {
                continue;
            };

            let (src, dst) = match kind {
                EntryKind::Pattern => (frame.src, cap_to_base(frame.dst, chara.atlas.base_rect())),
                EntryKind::Texture => (frame.src, frame.dst),
                EntryKind::Layer => match clip_to_box(frame.src, frame.dst, bbox) {
                    Some(clipped) => clipped,
                    None => continue,
                },
            };

            commands.push(DrawCommand {
                kind,
                entry_index,
                bitmap,
                src,
                dst,
                alpha: frame.alpha,
                rotation_deg: frame.rotation_deg,
            });
        }
    }

    commands
}

fn bitmap_for(kind: EntryKind, use_2p_palette: bool) -> BitmapSlot {
    let slot = match kind {
        EntryKind::Pattern | EntryKind::Layer => BitmapSlot::CharBmp,
        EntryKind::Texture => BitmapSlot::CharTex,
    };
    if use_2p_palette {
        slot.for_player2()
    } else {
        slot
    }
}
