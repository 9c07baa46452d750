//! # Resources 模块
//!
//! 宿主层的外部协作者：文件读取、文本解码与位图探测。
//!
//! ## 模块结构
//!
//! - `source`: 资源来源抽象（[`ResourceSource`] / [`FsSource`]）
//! - `path`: 逻辑路径规范化
//! - `text`: 按编码提示解码文本（[`TextDecoder`]）
//! - `probe`: 位图尺寸探测（[`ImageProbe`]）

mod error;
pub mod path;
mod probe;
mod source;
mod text;

pub use error::ResourceError;
pub use probe::{ImageCrateProbe, ImageProbe};
pub use source::{FsSource, ResourceSource};
pub use text::{DecodeError, EncodingHint, EncodingRsDecoder, TextDecoder};
