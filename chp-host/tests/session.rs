//! # 会话集成测试
//!
//! 测试 文件 → 解码 → 解析 → 播放 的完整链路，以及重新加载的原子性。

use std::fs;
use std::path::Path;

use chp_host::{AppConfig, CharaSession, EncodingHint, LoadError};
use chp_runtime::{AnimeState, BitmapSlot, EntryKind};

const CHARA: &str = "\
#CharName Tester
#CharBMP body.bmp
#Anime 100
#01 0 0 40 40
#02 0 0 20 20
#03 20 0 20 20
#Pattern 1 0203 0101
#Layer 1 0202 0101
#Pattern 6 03 01
";

fn write_bitmap(dir: &Path, name: &str, w: u32, h: u32) {
    image::RgbImage::new(w, h).save(dir.join(name)).unwrap();
}

#[test]
fn test_load_and_play() {
    let dir = tempfile::tempdir().unwrap();
    let chp = dir.path().join("chara.chp");
    fs::write(&chp, CHARA).unwrap();
    write_bitmap(dir.path(), "body.bmp", 64, 32);

    let mut session = CharaSession::new(AppConfig::default());
    session.reload(&chp).unwrap();

    assert!(session.is_loaded());
    assert_eq!(session.error(), None);
    let chara = session.chara().unwrap();
    assert_eq!(chara.info.name.as_deref(), Some("Tester"));
    assert_eq!(chara.state(AnimeState::Neutral).frame_count, 2);

    let bitmaps = session.bitmaps();
    assert_eq!(bitmaps.len(), 1);
    assert_eq!(bitmaps[0].slot, BitmapSlot::CharBmp);
    assert_eq!(bitmaps[0].size, Some((64, 32)));

    let first = session.tick(0);
    let kinds: Vec<_> = first.draws.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![EntryKind::Pattern, EntryKind::Layer]);
    assert_eq!(first.draws[0].src.x, 0.0);

    let second = session.tick(100);
    assert_eq!(second.position.map(|p| p.frame), Some(1));
    assert_eq!(second.draws[0].src.x, 20.0);
}

#[test]
fn test_reload_nonexistent_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = CharaSession::new(AppConfig::default());

    let result = session.reload(dir.path().join("missing.chp"));

    assert!(matches!(result, Err(LoadError::Resource(_))));
    assert!(!session.is_loaded());
    assert!(!session.error().unwrap_or_default().is_empty());
    assert!(session.tick(100).draws.is_empty());
}

#[test]
fn test_reload_missing_path_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let chp = dir.path().join("chara.chp");
    fs::write(&chp, CHARA).unwrap();

    let mut session = CharaSession::new(AppConfig::default());
    session.reload(&chp).unwrap();
    assert!(!session.tick(0).draws.is_empty());

    let result = session.reload(dir.path().join("gone.chp"));

    assert!(matches!(result, Err(LoadError::Resource(_))));
    assert!(!session.is_loaded());
    assert!(session.chara().is_none());
    assert!(session.error().is_some_and(|e| !e.is_empty()));
    assert!(session.bitmaps().is_empty());

    let output = session.tick(100);
    assert!(output.draws.is_empty());
    assert_eq!(output.position, None);
}

#[test]
fn test_failed_reload_discards_model() {
    let dir = tempfile::tempdir().unwrap();
    let chp = dir.path().join("chara.chp");
    fs::write(&chp, CHARA).unwrap();

    let mut session = CharaSession::new(AppConfig::default());
    session.reload(&chp).unwrap();
    session.select(AnimeState::Fever);
    assert!(!session.tick(0).draws.is_empty());

    fs::write(&chp, "#CharName Broken\n#Pattern 30 00 00\n").unwrap();
    let result = session.reload_current();

    assert!(matches!(result, Err(LoadError::Parse(_))));
    assert!(!session.is_loaded());
    assert!(session.error().unwrap().contains("第 2 行"));
    assert!(session.diagnostics().is_empty());

    let output = session.tick(500);
    assert!(output.draws.is_empty());
    assert_eq!(output.state, AnimeState::Fever);

    // 修复后重新加载恢复播放，保留选中状态
    fs::write(&chp, CHARA).unwrap();
    session.reload_current().unwrap();
    assert!(session.is_loaded());
    assert_eq!(session.error(), None);
    let output = session.tick(0);
    assert_eq!(output.state, AnimeState::Fever);
    assert_eq!(output.draws.len(), 1);
}

#[test]
fn test_missing_bitmap_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let chp = dir.path().join("chara.chp");
    fs::write(&chp, CHARA).unwrap();

    let mut session = CharaSession::new(AppConfig::default());
    session.reload(&chp).unwrap();

    assert!(session.is_loaded());
    assert!(!session.bitmaps()[0].loaded());
}

#[test]
fn test_shift_jis_file() {
    let dir = tempfile::tempdir().unwrap();
    let chp = dir.path().join("sjis.chp");
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("#CharName キャラ\n#Artist 作者\n");
    fs::write(&chp, &bytes).unwrap();

    let mut session = CharaSession::new(AppConfig::default());
    session.reload(&chp).unwrap();
    let info = &session.chara().unwrap().info;
    assert_eq!(info.name.as_deref(), Some("キャラ"));
    assert_eq!(info.artist.as_deref(), Some("作者"));

    let mut config = AppConfig::default();
    config.encoding = EncodingHint::Utf8;
    let mut strict = CharaSession::new(config);
    assert!(matches!(strict.reload(&chp), Err(LoadError::Resource(_))));
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = AppConfig::default();
    config.viewport.width = 320;
    config.viewport.height = 240;
    config.playback.initial_state = 6;
    config.playback.use_2p_palette = true;
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path);
    assert_eq!(loaded, config);

    let session = CharaSession::new(loaded);
    assert_eq!(session.context().selected(), AnimeState::Fever);
    assert!(session.context().use_2p_palette);

    // 损坏的配置文件回退到默认值
    fs::write(&path, "{ not json").unwrap();
    assert_eq!(AppConfig::load(&path), AppConfig::default());
}
