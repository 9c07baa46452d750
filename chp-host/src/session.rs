//! # Session 模块
//!
//! 加载 / 重新加载会话：持有当前角色模型、播放上下文与加载结果。
//!
//! ## 重新加载
//!
//! 新文件完整读取、解码并解析之后才替换当前模型。失败时会话不再持有模型，
//! 只保留错误文本，此后每一帧的绘制列表为空。播放上下文（选中状态、开关）
//! 在重新加载之间保留，时钟归零。

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use chp_runtime::{
    AnimeState, BitmapSlot, CharaPlayer, Diagnostic, DiagnosticLevel, FrameOutput, ParseFailure,
    Parser, PlaybackContext, PomyuChara, analyze_chara,
};

use crate::config::AppConfig;
use crate::resources::{
    EncodingRsDecoder, FsSource, ImageCrateProbe, ImageProbe, ResourceError, ResourceSource,
    TextDecoder,
};

/// 加载错误
#[derive(Error, Debug)]
pub enum LoadError {
    /// 文件读取或解码失败
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// 致命解析错误
    #[error("解析失败: {0}")]
    Parse(#[from] ParseFailure),

    /// 没有可重新加载的文件
    #[error("尚未加载任何 CHP 文件")]
    NoFile,
}

/// 位图加载状态
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BitmapStatus {
    pub slot: BitmapSlot,
    /// 文件中声明的路径
    pub path: String,
    /// 像素尺寸；读取或解码失败时为 `None`
    pub size: Option<(u32, u32)>,
}

impl BitmapStatus {
    pub fn loaded(&self) -> bool {
        self.size.is_some()
    }
}

/// 一次成功加载的结果
#[derive(Debug)]
struct LoadedChara {
    player: CharaPlayer,
    diagnostics: Vec<Diagnostic>,
    bitmaps: Vec<BitmapStatus>,
}

/// 角色会话
pub struct CharaSession {
    config: AppConfig,
    decoder: Box<dyn TextDecoder>,
    probe: Box<dyn ImageProbe>,
    /// 最近一次加载的文件
    path: Option<PathBuf>,
    current: Option<LoadedChara>,
    /// 没有模型时保存的播放上下文
    idle_context: PlaybackContext,
    /// 最近一次加载失败的错误文本
    error: Option<String>,
}

impl CharaSession {
    /// 使用默认协作者（`encoding_rs` 解码、`image` 探测）创建会话
    pub fn new(config: AppConfig) -> Self {
        Self::with_collaborators(
            config,
            Box::new(EncodingRsDecoder),
            Box::new(ImageCrateProbe),
        )
    }

    pub fn with_collaborators(
        config: AppConfig,
        decoder: Box<dyn TextDecoder>,
        probe: Box<dyn ImageProbe>,
    ) -> Self {
        let idle_context = config.playback_context();
        Self {
            config,
            decoder,
            probe,
            path: None,
            current: None,
            idle_context,
            error: None,
        }
    }

    /// 加载（或重新加载）指定文件
    ///
    /// 成功后替换当前模型；失败时丢弃当前模型并保留错误文本。
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        self.path = Some(path.to_path_buf());

        let outcome = self.build(path);
        let mut context = self.take_context();
        context.restart();

        match outcome {
            Ok((chara, diagnostics, bitmaps)) => {
                info!(
                    path = %path.display(),
                    name = chara.info.name.as_deref().unwrap_or(""),
                    diagnostics = diagnostics.len(),
                    "CHP 加载成功"
                );
                let player = CharaPlayer::with_context(chara, self.config.viewport_size(), context);
                self.current = Some(LoadedChara {
                    player,
                    diagnostics,
                    bitmaps,
                });
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "CHP 加载失败");
                self.idle_context = context;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// 重新加载最近一次的文件
    pub fn reload_current(&mut self) -> Result<(), LoadError> {
        let path = self.path.clone().ok_or(LoadError::NoFile)?;
        self.reload(path)
    }

    /// 读取、解码、解析并检查，不修改会话
    fn build(
        &self,
        path: &Path,
    ) -> Result<(PomyuChara, Vec<Diagnostic>, Vec<BitmapStatus>), LoadError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ResourceError::NotFound {
                path: path.display().to_string(),
            })?;

        let source = FsSource::new(dir);
        let bytes = source.read(&file_name)?;
        let text = self
            .decoder
            .decode(&bytes, self.config.encoding)
            .map_err(|source_error| ResourceError::Decode {
                path: source.full_path(&file_name),
                source: source_error,
            })?;

        let source_id = path.display().to_string();
        let mut parser = Parser::with_source_id(&source_id);
        let chara = parser.parse(&text)?;

        let mut diagnostics = parser.warnings().to_vec();
        diagnostics.extend(analyze_chara(&chara, &source_id).diagnostics);
        log_diagnostics(&diagnostics);

        let bitmaps = self.probe_bitmaps(&source, &chara);
        Ok((chara, diagnostics, bitmaps))
    }

    fn probe_bitmaps(&self, source: &dyn ResourceSource, chara: &PomyuChara) -> Vec<BitmapStatus> {
        chara
            .info
            .bitmaps
            .iter()
            .map(|(slot, path)| {
                let size = match source.read(path) {
                    Ok(bytes) => {
                        let size = self.probe.probe(&bytes);
                        if size.is_none() {
                            warn!(slot = slot.directive(), path, "位图无法解码");
                        }
                        size
                    }
                    Err(e) => {
                        warn!(slot = slot.directive(), error = %e, "位图读取失败");
                        None
                    }
                };
                BitmapStatus {
                    slot,
                    path: path.to_string(),
                    size,
                }
            })
            .collect()
    }

    fn take_context(&mut self) -> PlaybackContext {
        match self.current.take() {
            Some(loaded) => loaded.player.into_parts().1,
            None => self.idle_context.clone(),
        }
    }

    /// 是否持有成功加载的模型
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// 最近一次加载失败的错误文本
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn chara(&self) -> Option<&PomyuChara> {
        self.current.as_ref().map(|loaded| loaded.player.chara())
    }

    pub fn player(&self) -> Option<&CharaPlayer> {
        self.current.as_ref().map(|loaded| &loaded.player)
    }

    /// 最近一次成功加载的诊断（解析警告 + 静态检查）
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.current
            .as_ref()
            .map(|loaded| loaded.diagnostics.as_slice())
            .unwrap_or_default()
    }

    pub fn bitmaps(&self) -> &[BitmapStatus] {
        self.current
            .as_ref()
            .map(|loaded| loaded.bitmaps.as_slice())
            .unwrap_or_default()
    }

    /// 当前播放上下文
    pub fn context(&self) -> &PlaybackContext {
        match &self.current {
            Some(loaded) => loaded.player.context(),
            None => &self.idle_context,
        }
    }

    pub fn context_mut(&mut self) -> &mut PlaybackContext {
        match &mut self.current {
            Some(loaded) => loaded.player.context_mut(),
            None => &mut self.idle_context,
        }
    }

    /// 切换动画状态
    pub fn select(&mut self, state: AnimeState) {
        self.context_mut().select(state);
    }

    /// 推进一帧；没有模型时返回空绘制列表
    pub fn tick(&mut self, delta_ms: u64) -> FrameOutput {
        match &mut self.current {
            Some(loaded) => loaded.player.tick(delta_ms),
            None => {
                self.idle_context.tick(delta_ms);
                FrameOutput {
                    state: self.idle_context.selected(),
                    position: None,
                    draws: Vec::new(),
                }
            }
        }
    }
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.level {
            DiagnosticLevel::Error | DiagnosticLevel::Warn => warn!(
                line = ?diagnostic.line,
                level = %diagnostic.level,
                "{}",
                diagnostic.message
            ),
            DiagnosticLevel::Info => debug!(line = ?diagnostic.line, "{}", diagnostic.message),
        }
    }
}
