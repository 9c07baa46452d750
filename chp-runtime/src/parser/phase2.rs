//! # 阶段 2：指令解析
//!
//! 逐行应用指令到 [`PomyuChara`]。可恢复的问题记录为诊断并跳过该行，
//! 其余问题以 [`ParseError`] 中止解析。

use crate::diagnostic::Diagnostic;
use crate::error::ParseError;
use crate::hex::{self, TOKEN_WIDTH};
use crate::model::{
    AnimeState, BitmapSlot, EntryKind, FrameEntry, LEGACY_DATA_BASE, PomyuChara, Rect, RectAtlas,
    Track,
};

use super::helpers::{parse_int, required_int, rest_text};
use super::phase1::SourceLine;

/// Alpha / Rotation 数组固定使用 16 进制
const SCALAR_BASE: u32 = 16;

/// 阶段 2 解析器
pub struct Phase2Parser {
    /// 诊断来源标识
    pub source_id: String,
    /// 解析过程中收集的诊断
    pub warnings: Vec<Diagnostic>,
}

impl Phase2Parser {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, line: &SourceLine<'_>, message: impl Into<String>) {
        self.warnings.push(
            Diagnostic::warn(&self.source_id, message)
                .with_line(line.line_number)
                .with_detail(line.tokens.join(" ")),
        );
    }

    fn info(&mut self, line: &SourceLine<'_>, message: impl Into<String>) {
        self.warnings
            .push(Diagnostic::info(&self.source_id, message).with_line(line.line_number));
    }

    /// 解析单行并写入模型
    pub fn parse_line(
        &mut self,
        line: &SourceLine<'_>,
        chara: &mut PomyuChara,
    ) -> Result<(), ParseError> {
        let keyword = line.keyword();
        let Some(name) = keyword.strip_prefix('#') else {
            self.info(line, format!("忽略非指令行 '{}'", line.tokens[0]));
            return Ok(());
        };

        match name {
            "charname" => chara.info.name = Some(rest_text(line, 1, "name")?),
            "artist" => chara.info.artist = Some(rest_text(line, 1, "artist")?),
            "anime" => chara.info.anime = required_int(line, 1, "ms")?,
            "wait" => chara.info.wait = required_int(line, 1, "wait")?,
            "size" => {
                let w = required_int(line, 1, "w")?;
                let h = required_int(line, 2, "h")?;
                chara.info.size = Some((w, h));
            }
            "data" => self.parse_data(line, chara)?,
            "autocolorset" => chara.info.auto_color_set = true,
            "charfaceallsize" => chara.info.char_face_all_size = Some(parse_rect_params(line)?),
            "charfaceuppersize" => {
                chara.info.char_face_upper_size = Some(parse_rect_params(line)?);
            }
            "loop" => {
                let state = parse_state(line)?;
                chara.state_mut(state).loop_frame = required_int(line, 2, "frame")?;
            }
            "frame" | "flame" => {
                let state = parse_state(line)?;
                chara.state_mut(state).frame = required_int(line, 2, "ms")?;
            }
            "pattern" | "patern" => self.parse_entry(line, chara, EntryKind::Pattern)?,
            "texture" => self.parse_entry(line, chara, EntryKind::Texture)?,
            "layer" => self.parse_entry(line, chara, EntryKind::Layer)?,
            other => {
                if let Some(slot) = BitmapSlot::from_directive(other) {
                    let path = rest_text(line, 1, "path")?;
                    chara.info.bitmaps.set(slot, path);
                } else if (1..=2).contains(&other.chars().count()) {
                    self.parse_rect(line, chara)?;
                } else {
                    self.warn(line, format!("未知指令 '{}'，跳过该行", line.tokens[0]));
                }
            }
        }

        Ok(())
    }

    /// `#Data N`：设定进制并重建矩形表，切换到新格式
    fn parse_data(&mut self, line: &SourceLine<'_>, chara: &mut PomyuChara) -> Result<(), ParseError> {
        let base: i64 = required_int(line, 1, "base")?;
        let base = u32::try_from(base)
            .ok()
            .filter(|b| (2..=hex::MAX_BASE).contains(b))
            .ok_or(ParseError::InvalidDataBase {
                line: line.line_number,
                base,
            })?;

        if chara.atlas.defined_count() > 0 {
            self.warn(line, "#Data 出现在矩形定义之后，已定义的矩形被清空");
        }
        chara.info.data = base;
        chara.info.legacy = false;
        chara.atlas = RectAtlas::with_base(base);
        Ok(())
    }

    /// `#XX x y w h`：写入矩形表
    fn parse_rect(&mut self, line: &SourceLine<'_>, chara: &mut PomyuChara) -> Result<(), ParseError> {
        let key = &line.tokens[0][1..];
        let index = hex::parse_token(key, LEGACY_DATA_BASE)
            .or_else(|_| hex::parse_token(key, chara.info.data))
            .ok()
            .and_then(|i| usize::try_from(i).ok());

        let Some(index) = index else {
            self.warn(line, format!("无法解析的矩形索引 '{key}'，跳过该行"));
            return Ok(());
        };

        let values: Vec<i32> = line.tokens[1..]
            .iter()
            .take(4)
            .map(|token| parse_int(line, token, "rect"))
            .collect::<Result<_, _>>()?;

        let atlas_len = chara.atlas.len();
        let Some(entry) = chara.atlas.entry_mut(index) else {
            self.warn(
                line,
                format!("矩形索引 {index} 超出矩形表大小 {atlas_len}，跳过该行"),
            );
            return Ok(());
        };

        let current = entry.rect;
        entry.rect = Rect {
            x: values.first().copied().unwrap_or(current.x),
            y: values.get(1).copied().unwrap_or(current.y),
            w: values.get(2).copied().unwrap_or(current.w),
            h: values.get(3).copied().unwrap_or(current.h),
        };
        entry.defined = true;
        if let Some(comment) = line.comment {
            entry.comment = Some(comment.to_string());
        }

        if values.len() < 4 {
            self.warn(
                line,
                format!("矩形 {index} 只提供了 {} 个值，其余沿用原值", values.len()),
            );
        }
        Ok(())
    }

    /// `#Pattern` / `#Texture` / `#Layer`：追加一个帧条目
    fn parse_entry(
        &mut self,
        line: &SourceLine<'_>,
        chara: &mut PomyuChara,
        kind: EntryKind,
    ) -> Result<(), ParseError> {
        if line.tokens.len() < 3 {
            self.warn(line, "参数不足，跳过该行");
            return Ok(());
        }

        let state = parse_state(line)?;
        let sprite_base = chara.info.sprite_base();

        let mut columns: Vec<(&str, u32)> = vec![("Sprite", sprite_base), ("Offset", sprite_base)];
        if kind == EntryKind::Texture {
            columns.extend([("Alpha", SCALAR_BASE), ("Rotation", SCALAR_BASE)]);
        }

        let data: Vec<&str> = match &line.tokens[2..] {
            [packed] => split_packed(packed),
            separate => separate.to_vec(),
        };

        let mut tracks = Vec::with_capacity(columns.len());
        for (&token, &(name, base)) in data.iter().zip(&columns) {
            match self.decode_track(line, token, name, base) {
                Some(track) => tracks.push(track),
                None => return Ok(()),
            }
        }

        let mut tracks = tracks.into_iter();
        let entry = FrameEntry {
            sprite: tracks.next().unwrap_or_default(),
            offset: tracks.next(),
            alpha: tracks.next(),
            rotation: tracks.next(),
            comment: line.comment.map(str::to_string),
        };

        let anim = chara.state_mut(state);
        anim.entries_mut(kind).push(entry);
        anim.loaded = true;
        Ok(())
    }

    /// 解码一列帧数组；首个 token 失败时记录警告并返回 `None`（跳过整行）
    fn decode_track(
        &mut self,
        line: &SourceLine<'_>,
        token: &str,
        name: &str,
        base: u32,
    ) -> Option<Track> {
        let decoded = match hex::parse_sequence(token, base, TOKEN_WIDTH) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.warn(
                    line,
                    format!("{name} 数组首个值 '{}' 无法解码（{}），跳过该行", e.token, e.error),
                );
                return None;
            }
        };

        for fallback in &decoded.fallbacks {
            self.warn(
                line,
                format!(
                    "{name} 数组第 {} 帧 '{}' 无法解码（{}），沿用上一帧的值 {}",
                    fallback.position, fallback.token, fallback.error, fallback.fallback
                ),
            );
        }
        if let Some(trailing) = &decoded.trailing {
            self.warn(line, format!("{name} 数组末尾多余字符 '{trailing}' 被忽略"));
        }

        Some(Track::new(decoded.values))
    }
}

/// 拆分合写的 Sprite + Offset 列
///
/// 单个数据 token 恰好包含 2 个值时，第一个为 Sprite，第二个为 Offset；
/// 其余情况整个 token 都是 Sprite。
fn split_packed(token: &str) -> Vec<&str> {
    if token.chars().count() != 2 * TOKEN_WIDTH {
        return vec![token];
    }
    match token.char_indices().nth(TOKEN_WIDTH) {
        Some((mid, _)) => vec![&token[..mid], &token[mid..]],
        None => vec![token],
    }
}

/// 解析第二个 token 的 1 开始状态编号
fn parse_state(line: &SourceLine<'_>) -> Result<AnimeState, ParseError> {
    let number: i64 = required_int(line, 1, "state")?;
    AnimeState::from_number(number).ok_or(ParseError::StateOutOfRange {
        line: line.line_number,
        index: number,
    })
}

/// 解析 `x y w h` 四个参数
fn parse_rect_params(line: &SourceLine<'_>) -> Result<Rect, ParseError> {
    Ok(Rect {
        x: required_int(line, 1, "x")?,
        y: required_int(line, 2, "y")?,
        w: required_int(line, 3, "w")?,
        h: required_int(line, 4, "h")?,
    })
}
