//! # Host 层
//!
//! CHP 角色查看器的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置文件
//! - 文件读取与文本解码
//! - 位图探测
//! - 加载 / 重新加载会话
//!
//! Host 层不包含解析与合成逻辑，这些都在 `chp-runtime` 中。
//! 绘制指令交给外部渲染器，本 crate 只提供无界面的命令行。

pub mod config;
pub mod resources;
pub mod session;

pub use config::{AppConfig, ConfigError, LogConfig, PlaybackConfig, ViewportConfig};
pub use resources::{
    DecodeError, EncodingHint, EncodingRsDecoder, FsSource, ImageCrateProbe, ImageProbe,
    ResourceError, ResourceSource, TextDecoder,
};
pub use session::{BitmapStatus, CharaSession, LoadError};
