//! # Tween 模块
//!
//! 从带 `-1` 占位的逐帧数组推导插值弧。
//!
//! 连续的 `-1` 表示在两侧关键帧之间线性插值：
//!
//! ```text
//! 帧:    0    1    2    3
//! 值:    5   --   --    7
//! 弧:    [0 ms ─────────── 300 ms]  5 → 7     (frame_ms = 100)
//! ```
//!
//! 两侧都是 `-1` 的关键帧（枢轴帧）同时结束前一段弧并开启下一段。

use serde::{Deserialize, Serialize};

use crate::hex::HOLD;

/// 插值弧
///
/// 时间窗口 `[start_ms, start_ms + duration_ms]` 为闭区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TweenArc {
    pub start_ms: u64,
    pub duration_ms: u64,
    pub start_value: i32,
    pub end_value: i32,
}

impl TweenArc {
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    /// `time_ms` 是否落在闭区间内
    pub fn contains(&self, time_ms: u64) -> bool {
        (self.start_ms..=self.end_ms()).contains(&time_ms)
    }

    /// 插值进度，夹到 `[0, 1]`
    pub fn progress(&self, time_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = time_ms.saturating_sub(self.start_ms) as f64;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    /// 标量插值（原始字节值）
    pub fn lerp(&self, time_ms: u64) -> f32 {
        lerp(
            self.start_value as f32,
            self.end_value as f32,
            self.progress(time_ms),
        )
    }
}

/// 线性插值
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// 推导插值弧
///
/// 单次前向遍历，同一时刻最多只有一段进行中的弧；未闭合的弧被丢弃。
pub fn build_arcs(values: &[i32], frame_ms: u32) -> Vec<TweenArc> {
    let frame_ms = u64::from(frame_ms);
    let mut arcs = Vec::new();
    let mut current: Option<TweenArc> = None;

    for (i, &value) in values.iter().enumerate() {
        if value == HOLD {
            if let Some(arc) = current.as_mut() {
                arc.duration_ms += frame_ms;
            }
            continue;
        }

        let prev_hold = i > 0 && values[i - 1] == HOLD;
        let next_hold = values.get(i + 1) == Some(&HOLD);

        // 关闭：本帧计入前一段弧
        if prev_hold && let Some(mut arc) = current.take() {
            arc.duration_ms += frame_ms;
            arc.end_value = value;
            arcs.push(arc);
        }

        // 开启：枢轴帧已在上面计入，新弧从 0 开始累计
        if next_hold {
            current = Some(TweenArc {
                start_ms: i as u64 * frame_ms,
                duration_ms: 0,
                start_value: value,
                end_value: value,
            });
        } else {
            current = None;
        }
    }

    arcs
}
