//! # Resource Error 模块
//!
//! 定义文件读取与文本解码相关的错误类型。

use thiserror::Error;

use super::text::DecodeError;

/// 资源错误
#[derive(Error, Debug)]
pub enum ResourceError {
    /// 资源未找到
    #[error("资源未找到: {path}")]
    NotFound {
        /// 资源路径
        path: String,
    },

    /// 资源读取失败
    #[error("读取 {kind} 失败: {path} - {message}")]
    LoadFailed {
        /// 资源路径
        path: String,
        /// 资源类型（chp, bitmap 等）
        kind: String,
        /// 错误消息
        message: String,
    },

    /// 文本解码失败
    #[error("文本解码失败: {path} - {source}")]
    Decode {
        /// 资源路径
        path: String,
        #[source]
        source: DecodeError,
    },
}
