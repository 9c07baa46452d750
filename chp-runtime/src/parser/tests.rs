//! # Parser 测试

use super::*;
use crate::diagnostic::DiagnosticLevel;
use crate::error::ParseError;
use crate::model::{AnimeState, BitmapSlot, Rect};

fn parse_ok(text: &str) -> (PomyuChara, Vec<Diagnostic>) {
    let mut parser = Parser::new();
    let chara = parser.parse(text).expect("解析应成功");
    (chara, parser.warnings().to_vec())
}

fn warns(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
        .collect()
}

// -------------------------------------------------------------------------
// 端到端
// -------------------------------------------------------------------------

#[test]
fn test_minimal_modern_file() {
    let text = "\
#Data 16
#00 0 0 10 10
#01 0 0 20 20
#Pattern 1 0001
";
    let (chara, warnings) = parse_ok(text);

    assert!(chara.loaded);
    assert!(!chara.info.legacy);
    assert_eq!(chara.atlas.len(), 256);
    assert_eq!(chara.atlas.defined_count(), 2);
    assert_eq!(chara.atlas.get(0), Some(&Rect::new(0, 0, 10, 10)));
    assert_eq!(chara.atlas.get(1), Some(&Rect::new(0, 0, 20, 20)));

    let neutral = chara.state(AnimeState::Neutral);
    assert!(neutral.loaded);
    assert_eq!(neutral.frame_count, 1);
    assert_eq!(neutral.patterns.len(), 1);
    assert_eq!(neutral.patterns[0].sprite.values, vec![0x00]);
    assert_eq!(
        neutral.patterns[0].offset.as_ref().map(|t| t.values.clone()),
        Some(vec![0x01])
    );

    assert!(
        chara
            .states()
            .filter(|(s, _)| *s != AnimeState::Neutral)
            .all(|(_, s)| !s.loaded)
    );
    assert!(warns(&warnings).is_empty());
}

#[test]
fn test_single_sprite_token_is_not_split() {
    let (chara, warnings) = parse_ok("#01 0 0 10 10\n#Pattern 1 00010203\n");

    let neutral = chara.state(AnimeState::Neutral);
    assert_eq!(neutral.frame_count, 4);
    assert_eq!(neutral.patterns[0].sprite.values, vec![0, 1, 2, 3]);
    assert_eq!(neutral.patterns[0].offset, None);
    assert!(warns(&warnings).is_empty());
}

#[test]
fn test_scalar_directives() {
    let text = "\
#CharName  Pomyu   Chara
#Artist someone
#Anime 80
#Wait 500
#Size 120 240
#AutoColorSet
#CharFaceAllSize 0 0 256 256
#CharFaceUpperSize 0 0 256 128
#CharBMP chara dir/body.bmp
#charbmp2p body2p.bmp
#CharTex tex.png
";
    let (chara, _) = parse_ok(text);

    assert_eq!(chara.info.name.as_deref(), Some("Pomyu Chara"));
    assert_eq!(chara.info.artist.as_deref(), Some("someone"));
    assert_eq!(chara.info.anime, 80);
    assert_eq!(chara.default_frame_ms(), 80);
    assert_eq!(chara.info.wait, 500);
    assert_eq!(chara.info.size, Some((120, 240)));
    assert_eq!(chara.box_size(), (120, 240));
    assert!(chara.info.auto_color_set);
    assert_eq!(chara.info.char_face_all_size, Some(Rect::new(0, 0, 256, 256)));
    assert_eq!(chara.info.char_face_upper_size, Some(Rect::new(0, 0, 256, 128)));
    assert_eq!(
        chara.info.bitmaps.get(BitmapSlot::CharBmp),
        Some("chara dir/body.bmp")
    );
    assert_eq!(chara.info.bitmaps.get(BitmapSlot::CharBmp2P), Some("body2p.bmp"));
    assert_eq!(chara.info.bitmaps.get(BitmapSlot::CharTex), Some("tex.png"));
    assert_eq!(chara.info.bitmaps.get(BitmapSlot::CharFace), None);
}

#[test]
fn test_frame_and_loop_aliases() {
    let text = "\
#Frame 1 50
#Flame 2 80
#Loop 2 3
#Patern 2 00 00
";
    let (chara, _) = parse_ok(text);

    assert_eq!(chara.state(AnimeState::Neutral).frame, 50);
    let second = chara.state(AnimeState::Second);
    assert_eq!(second.frame, 80);
    assert_eq!(second.loop_frame, 3);
    assert!(second.loaded);
    assert_eq!(second.patterns.len(), 1);
}

#[test]
fn test_bom_and_comments() {
    let text = "\u{feff}// header comment\n#01 0 0 20 20 // base rect\n#Pattern 1 01 01 // idle\n";
    let (chara, _) = parse_ok(text);

    let base = chara.atlas.entry(1).unwrap();
    assert_eq!(base.comment.as_deref(), Some("base rect"));
    assert_eq!(
        chara.state(AnimeState::Neutral).patterns[0].comment.as_deref(),
        Some("idle")
    );
}

// -------------------------------------------------------------------------
// 帧数组
// -------------------------------------------------------------------------

#[test]
fn test_frame_count_uses_minimum_length() {
    let pattern = "00".repeat(10);
    let texture = "00".repeat(8);
    let text = format!("#Pattern 1 {pattern} {pattern}\n#Texture 1 {texture} {texture}\n");
    let (chara, warnings) = parse_ok(&text);

    let neutral = chara.state(AnimeState::Neutral);
    assert_eq!(neutral.frame_count, 8);

    let warnings = warns(&warnings);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("长度不一致"));
    assert_eq!(warnings[0].detail.as_deref(), Some("长度: 8, 10"));
}

#[test]
fn test_legacy_sprite_base_is_16() {
    let (chara, _) = parse_ok("#Pattern 1 0A1F 0000\n");
    let neutral = chara.state(AnimeState::Neutral);
    assert_eq!(neutral.patterns[0].sprite.values, vec![10, 31]);
}

#[test]
fn test_texture_scalars_always_base_16() {
    let text = "\
#Data 10
#Texture 1 00 00 FF 40
";
    let (chara, _) = parse_ok(text);
    let entry = &chara.state(AnimeState::Neutral).textures[0];
    assert_eq!(entry.alpha.as_ref().unwrap().values, vec![255]);
    assert_eq!(entry.rotation.as_ref().unwrap().values, vec![64]);
}

#[test]
fn test_holds_build_tween_arcs() {
    let text = "\
#Anime 50
#Texture 1 00000000 -------- 00----FF 00000000
";
    let (chara, _) = parse_ok(text);
    let neutral = chara.state(AnimeState::Neutral);
    assert_eq!(neutral.frame_count, 4);

    let entry = &neutral.textures[0];
    assert_eq!(entry.offset.as_ref().unwrap().values, vec![-1; 4]);

    let alpha = entry.alpha.as_ref().unwrap();
    assert_eq!(alpha.values, vec![0, -1, -1, 255]);
    assert_eq!(alpha.arcs.len(), 1);
    assert_eq!(alpha.arcs[0].start_ms, 0);
    assert_eq!(alpha.arcs[0].duration_ms, 150);
    assert_eq!((alpha.arcs[0].start_value, alpha.arcs[0].end_value), (0, 255));
}

#[test]
fn test_state_frame_overrides_arc_timing() {
    let text = "\
#Anime 50
#Frame 1 200
#Pattern 1 01--03 000000
";
    let (chara, _) = parse_ok(text);
    let sprite = &chara.state(AnimeState::Neutral).patterns[0].sprite;
    assert_eq!(sprite.arcs[0].duration_ms, 400);
}

#[test]
fn test_digit_fallback_warns_and_keeps_line() {
    let (chara, warnings) = parse_ok("#Pattern 1 05ZZ 0000\n");

    let neutral = chara.state(AnimeState::Neutral);
    assert!(neutral.loaded);
    assert_eq!(neutral.patterns[0].sprite.values, vec![5, 5]);

    let warnings = warns(&warnings);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line, Some(1));
    assert!(warnings[0].message.contains("沿用上一帧"));
}

#[test]
fn test_leading_digit_failure_skips_line() {
    let (chara, warnings) = parse_ok("#Pattern 1 ZZ00 0000\n");

    assert!(!chara.state(AnimeState::Neutral).loaded);
    let warnings = warns(&warnings);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("跳过该行"));
}

#[test]
fn test_entry_without_data_is_skipped() {
    let text = "#CharName A\n#Pattern 1\n#Layer\n";
    let (chara, warnings) = parse_ok(text);

    assert!(chara.loaded);
    assert!(!chara.state(AnimeState::Neutral).loaded);

    let lines: Vec<_> = warns(&warnings).iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![Some(2), Some(3)]);
}

// -------------------------------------------------------------------------
// 矩形表
// -------------------------------------------------------------------------

#[test]
fn test_rect_keys() {
    let text = "\
#Data 16
#05 1 2 3 4
#1A 5 6 7 8
#FF 9 9 9 9
";
    let (chara, _) = parse_ok(text);
    // "05" 按 10 进制，"1A" 与 "FF" 回退到 #Data 进制
    assert_eq!(chara.atlas.get(5), Some(&Rect::new(1, 2, 3, 4)));
    assert_eq!(chara.atlas.get(26), Some(&Rect::new(5, 6, 7, 8)));
    assert_eq!(chara.atlas.get(255), Some(&Rect::new(9, 9, 9, 9)));
}

#[test]
fn test_legacy_rect_keys() {
    let (chara, warnings) = parse_ok("#99 1 1 1 1\n#1A 1 1 1 1\n");

    assert_eq!(chara.atlas.len(), 100);
    assert_eq!(chara.atlas.get(99), Some(&Rect::new(1, 1, 1, 1)));
    // 旧格式下 "1A" 无法按任何进制解码
    assert_eq!(warns(&warnings).len(), 1);
    assert_eq!(chara.atlas.defined_count(), 1);
}

#[test]
fn test_rect_outside_atlas_is_skipped() {
    let (chara, warnings) = parse_ok("#Data 4\n#99 1 1 1 1\n");

    assert_eq!(chara.atlas.len(), 16);
    assert_eq!(chara.atlas.defined_count(), 0);
    let warnings = warns(&warnings);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].line, Some(2));
}

#[test]
fn test_partial_rect_keeps_current_values() {
    let (chara, warnings) = parse_ok("#01 5 6\n");

    assert_eq!(chara.atlas.get(1), Some(&Rect::new(5, 6, 0, 0)));
    assert_eq!(warns(&warnings).len(), 1);
}

#[test]
fn test_data_reallocates_atlas() {
    let (chara, warnings) = parse_ok("#01 1 1 1 1\n#Data 8\n");

    assert_eq!(chara.atlas.len(), 64);
    assert_eq!(chara.atlas.defined_count(), 0);
    assert_eq!(warns(&warnings).len(), 1);
}

// -------------------------------------------------------------------------
// 诊断
// -------------------------------------------------------------------------

#[test]
fn test_unknown_directive_and_plain_text() {
    let (chara, warnings) = parse_ok("hello world\n#Unknown 1 2\n#CharName A\n");

    assert!(chara.loaded);
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].level, DiagnosticLevel::Info);
    assert_eq!(warnings[0].line, Some(1));
    assert_eq!(warnings[1].level, DiagnosticLevel::Warn);
    assert_eq!(warnings[1].line, Some(2));
}

#[test]
fn test_warnings_are_reset_per_parse() {
    let mut parser = Parser::with_source_id("a.chp");
    parser.parse("#Unknown\n").unwrap();
    assert_eq!(parser.warnings().len(), 1);
    assert_eq!(parser.warnings()[0].source_id, "a.chp");

    parser.parse("#CharName A\n").unwrap();
    assert!(parser.warnings().is_empty());
}

// -------------------------------------------------------------------------
// 致命错误
// -------------------------------------------------------------------------

#[test]
fn test_state_out_of_range_is_fatal() {
    let text = "#CharName A\n#Pattern 19 00 00\n#Artist B\n";
    let failure = Parser::new().parse(text).unwrap_err();

    assert_eq!(failure.line(), 2);
    assert_eq!(
        failure.error,
        ParseError::StateOutOfRange { line: 2, index: 19 }
    );
    assert!(!failure.partial.loaded);
    assert_eq!(failure.partial.info.name.as_deref(), Some("A"));
    assert_eq!(failure.partial.info.artist, None);
}

#[test]
fn test_state_zero_is_fatal() {
    let failure = Parser::new().parse("#Loop 0 1\n").unwrap_err();
    assert!(matches!(
        failure.error,
        ParseError::StateOutOfRange { line: 1, index: 0 }
    ));
}

#[test]
fn test_invalid_number_is_fatal() {
    let failure = Parser::new().parse("\n\n#Anime fast\n").unwrap_err();
    assert_eq!(failure.line(), 3);
    assert!(matches!(failure.error, ParseError::InvalidNumber { .. }));
    assert!(failure.to_string().contains("第 3 行"));
}

#[test]
fn test_missing_parameter_is_fatal() {
    let failure = Parser::new().parse("#Size 120\n").unwrap_err();
    assert!(matches!(
        failure.error,
        ParseError::MissingParameter { line: 1, .. }
    ));
}

#[test]
fn test_invalid_data_base_is_fatal() {
    let failure = Parser::new().parse("#Data 40\n").unwrap_err();
    assert_eq!(
        failure.error,
        ParseError::InvalidDataBase { line: 1, base: 40 }
    );
}

#[test]
fn test_partial_model_is_finalized() {
    let text = "#Pattern 1 000102 000000\n#Frame 30 1\n";
    let failure = Parser::new().parse(text).unwrap_err();

    let neutral = failure.partial.state(AnimeState::Neutral);
    assert!(neutral.loaded);
    assert_eq!(neutral.frame_count, 3);
}

// -------------------------------------------------------------------------
// 快照
// -------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct Summary {
    name: String,
    data: u32,
    legacy: bool,
    atlas_len: usize,
    defined_rects: usize,
    loaded_states: usize,
    neutral_frame_count: usize,
    box_w: i32,
    box_h: i32,
}

#[test]
fn test_model_summary_snapshot() {
    let text = "\
#CharName Demo
#Data 16
#00 0 0 10 10
#01 0 0 20 20
#Pattern 1 01010101 01010101
#Texture 6 02--0202 00000000 FF--80FF 00000000
";
    let (chara, _) = parse_ok(text);
    let (box_w, box_h) = chara.box_size();
    let summary = Summary {
        name: chara.info.name.clone().unwrap_or_default(),
        data: chara.info.data,
        legacy: chara.info.legacy,
        atlas_len: chara.atlas.len(),
        defined_rects: chara.atlas.defined_count(),
        loaded_states: chara.states().filter(|(_, s)| s.loaded).count(),
        neutral_frame_count: chara.state(AnimeState::Neutral).frame_count,
        box_w,
        box_h,
    };

    insta::assert_yaml_snapshot!(summary, @r"
    name: Demo
    data: 16
    legacy: false
    atlas_len: 256
    defined_rects: 2
    loaded_states: 2
    neutral_frame_count: 4
    box_w: 20
    box_h: 20
    ");
}
