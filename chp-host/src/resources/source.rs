//! # Resource Source 模块
//!
//! 资源来源抽象层。CHP 文件与其引用的位图都通过 [`ResourceSource`] 读取，
//! 路径均为相对于来源根目录的逻辑路径。

use std::path::PathBuf;

use super::ResourceError;
use super::path::normalize_logical_path;

/// 资源来源 trait
///
/// ## 路径约定
///
/// 所有路径参数都是**逻辑路径**：相对于来源根目录，经过
/// [`normalize_logical_path`] 规范化。
pub trait ResourceSource: Send + Sync {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 获取资源的完整路径（用于日志）
    fn full_path(&self, path: &str) -> String;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    /// 根目录（通常是 CHP 文件所在目录）
    base_path: PathBuf,
}

impl FsSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(path);

        std::fs::read(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ResourceError::NotFound {
                path: full_path.to_string_lossy().to_string(),
            },
            _ => ResourceError::LoadFailed {
                path: full_path.to_string_lossy().to_string(),
                kind: "file".to_string(),
                message: e.to_string(),
            },
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }
}
