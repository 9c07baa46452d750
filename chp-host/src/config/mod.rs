//! # Config 模块
//!
//! 查看器配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use chp_runtime::{AnimeState, PlaybackContext};

use crate::resources::EncodingHint;

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 视口配置
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// CHP 文件的文本编码
    ///
    /// 默认 `auto`：先尝试 UTF-8，失败后按 Shift_JIS 解码。
    #[serde(default)]
    pub encoding: EncodingHint,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 视口配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportConfig {
    /// 视口宽度
    #[serde(default = "default_viewport_width")]
    pub width: u32,

    /// 视口高度
    #[serde(default = "default_viewport_height")]
    pub height: u32,
}

/// 播放配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// 是否启用 `#Loop`
    #[serde(default = "default_loop_enabled")]
    pub loop_enabled: bool,

    /// 是否使用 2P 配色位图
    #[serde(default)]
    pub use_2p_palette: bool,

    /// 初始动画状态（1..=18）
    #[serde(default = "default_initial_state")]
    pub initial_state: usize,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub level: String,
}

// 默认值函数
fn default_viewport_width() -> u32 {
    640
}

fn default_viewport_height() -> u32 {
    480
}

fn default_loop_enabled() -> bool {
    true
}

fn default_initial_state() -> usize {
    AnimeState::Neutral.number()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            loop_enabled: default_loop_enabled(),
            use_2p_palette: false,
            initial_state: default_initial_state(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "配置加载完成");
                config
            }
            Err(e) => {
                warn!(error = %e, "使用默认配置");
                Self::default()
            }
        }
    }

    /// 加载配置文件，不记录日志
    ///
    /// 文件不存在时返回默认配置；读取或解析失败时返回错误，由调用方决定如何报告。
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("{}: {}", path.display(), e)))
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "视口尺寸必须为正: {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }

        if self.initial_state().is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "初始动画状态必须在 1 - 18 之间: {}",
                self.playback.initial_state
            )));
        }

        if self.log_level().is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "无效的日志级别: {}",
                self.log.level
            )));
        }

        Ok(())
    }

    /// 视口尺寸
    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport.width, self.viewport.height)
    }

    /// 初始动画状态
    pub fn initial_state(&self) -> Option<AnimeState> {
        i64::try_from(self.playback.initial_state)
            .ok()
            .and_then(AnimeState::from_number)
    }

    /// 日志级别
    pub fn log_level(&self) -> Option<tracing::Level> {
        self.log.level.parse().ok()
    }

    /// 按配置创建播放上下文
    pub fn playback_context(&self) -> PlaybackContext {
        let mut context = PlaybackContext::new();
        context.loop_enabled = self.playback.loop_enabled;
        context.use_2p_palette = self.playback.use_2p_palette;
        if let Some(state) = self.initial_state() {
            context.select(state);
        }
        context
    }
}

/// 配置错误
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// 解析失败
    #[error("配置解析失败: {0}")]
    ParseFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
