//! # 位图探测
//!
//! 宿主只需要知道位图能否加载以及像素尺寸，不解码到纹理。

use image::GenericImageView;

/// 位图探测 trait
pub trait ImageProbe {
    /// 返回像素尺寸；无法解码时返回 `None`
    fn probe(&self, bytes: &[u8]) -> Option<(u32, u32)>;
}

/// 使用 image crate 解码（BMP / PNG / JPEG）
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateProbe;

impl ImageProbe for ImageCrateProbe {
    fn probe(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        image::load_from_memory(bytes)
            .ok()
            .map(|img| img.dimensions())
    }
}
