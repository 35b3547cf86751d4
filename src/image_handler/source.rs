//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“剪贴板来源”和“流水线中间结果”解耦：
//! - `DecodedImage` 表示从剪贴板解码出的独立图片（不引用剪贴板内存）
//! - `DecodedImages` 表示一次性物化的图片序列
//! - `CanonicalImage` 表示编码阶段的规范表示（RGBA 像素 + 一次 PNG 编码）

use std::path::PathBuf;

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};

use super::ImageError;
use crate::board::FormatName;

/// 解码结果。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// 解码后的图像。
    pub image: DynamicImage,
    /// 来源格式（来自文件列表时为 `FileDrop`）。
    pub source: FormatName,
    /// 来自文件列表时对应的路径。
    pub path: Option<PathBuf>,
}

impl DecodedImage {
    pub(crate) fn from_format(image: DynamicImage, source: FormatName) -> Self {
        Self {
            image,
            source,
            path: None,
        }
    }

    pub(crate) fn from_file(image: DynamicImage, path: PathBuf) -> Self {
        Self {
            image,
            source: FormatName::FILE_DROP,
            path: Some(path),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// 一次性、有限的图片序列。
///
/// 剪贴板访问在构造时已经结束，迭代过程不再触碰剪贴板。
#[derive(Debug)]
pub struct DecodedImages {
    inner: std::vec::IntoIter<DecodedImage>,
}

impl DecodedImages {
    pub(crate) fn new(images: Vec<DecodedImage>) -> Self {
        Self {
            inner: images.into_iter(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for DecodedImages {
    type Item = DecodedImage;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DecodedImages {}

/// 编码阶段的规范表示：所有格式分支都从这里派生。
pub(crate) struct CanonicalImage {
    pub(crate) rgba: RgbaImage,
    pub(crate) png: Vec<u8>,
}

impl CanonicalImage {
    /// 渲染一次 RGBA 像素并做一次无损 PNG 编码。
    pub(crate) fn render(image: &DynamicImage) -> Result<Self, ImageError> {
        let rgba = image.to_rgba8();
        let png = encode_png(&rgba)?;
        Ok(Self { rgba, png })
    }

    pub(crate) fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub(crate) fn height(&self) -> u32 {
        self.rgba.height()
    }
}

/// RGBA8 → PNG（全彩，不做调色板缩减）。
pub(crate) fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ColorType::Rgba8.into(),
        )
        .map_err(|e| ImageError::Encode(format!("PNG 编码失败: {}", e)))?;
    Ok(buf)
}
