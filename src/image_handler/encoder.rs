//! # 编码链模块
//!
//! ## 设计思路
//!
//! 一张图片按配置同时生成多个格式，一次写入剪贴板：
//!
//! ```text
//! DynamicImage
//!    ↓ CanonicalImage::render（RGBA + 一次 PNG 编码）
//!    ├─ PNG   → 规范 PNG 字节
//!    ├─ DIB   → 24 位 BMP 编码后去掉 14 字节文件头
//!    ├─ HTML  → PNG 落盘 + file:/// 片段（或 HTMLDATAURL：重新编码 + base64 片段）
//!    └─ BITMAP → 规范 PNG 字节（由后端转换为系统位图）
//!    ↓
//! AccessGuard::write（一次获取内提交全部格式）
//! ```
//!
//! ## 实现思路
//!
//! - 所有编码在获取剪贴板之前完成，持有剪贴板的窗口只做拷贝。
//! - 单个分支失败只记日志，不影响其他分支；一个格式都没生成才返回错误。
//! - 暂存缓冲在写入完成前一直存活，写入后随 `StagedPayloads` 一起释放。

use std::io::Cursor;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};

use super::config::{ClipboardFormatsConfig, HtmlVariant, OutgoingFormat};
use super::source::{encode_png, CanonicalImage};
use super::{ImageConfig, ImageError};
use crate::board::{AccessGuard, FormatName, RawPayload, RetryPolicy};
use crate::codec::{build_data_url, build_file_reference, strip_file_header, DATA_URL_TEMPLATE, FILE_REFERENCE_TEMPLATE};

/// 待提交的格式集合。
#[derive(Debug, Default)]
pub struct StagedPayloads {
    payloads: Vec<RawPayload>,
    fragment_file: Option<PathBuf>,
}

impl StagedPayloads {
    pub fn payloads(&self) -> &[RawPayload] {
        &self.payloads
    }

    pub fn formats(&self) -> Vec<FormatName> {
        self.payloads.iter().map(|p| p.format.clone()).collect()
    }

    /// HTML 文件引用变体落盘的图片路径。
    pub fn fragment_file(&self) -> Option<&PathBuf> {
        self.fragment_file.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    fn push(&mut self, format: FormatName, bytes: Vec<u8>) {
        log::debug!("📦 已暂存格式 {}（{} 字节）", format, bytes.len());
        self.payloads.push(RawPayload::new(format, bytes));
    }
}

/// 编码并在一次获取内写入剪贴板。
pub fn encode(
    guard: &AccessGuard,
    policy: RetryPolicy,
    image: &DynamicImage,
    formats: &ClipboardFormatsConfig,
    config: &ImageConfig,
) -> Result<(), ImageError> {
    let staged = stage(image, formats, config)?;

    // 写入完成前 staged 一直存活
    guard.write_with_policy(policy, staged.payloads(), true)?;
    log::info!(
        "✅ 图片已写入剪贴板 - {}x{} 格式: {}",
        image.width(),
        image.height(),
        staged
            .formats()
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    drop(staged);
    Ok(())
}

/// 只做编码与暂存，不触碰剪贴板。
pub fn stage(
    image: &DynamicImage,
    formats: &ClipboardFormatsConfig,
    config: &ImageConfig,
) -> Result<StagedPayloads, ImageError> {
    if formats.is_empty() {
        return Err(ImageError::InvalidFormat("未选择任何剪贴板格式".to_string()));
    }

    let canonical = CanonicalImage::render(image)?;
    let mut staged = StagedPayloads::default();
    let mut failures = Vec::new();

    if formats.contains(OutgoingFormat::Png) {
        staged.push(FormatName::PNG, canonical.png.clone());
    }

    if formats.contains(OutgoingFormat::Dib) {
        match dib_from_rgba(&canonical) {
            Ok(dib) => staged.push(FormatName::DIB, dib),
            Err(err) => {
                log::warn!("⚠️ DIB 分支失败：{}", err);
                failures.push(format!("DIB: {}", err));
            }
        }
    }

    match formats.html_variant() {
        Some(HtmlVariant::FileReference) => match stage_file_reference(&canonical, config) {
            Ok((html, path)) => {
                staged.push(FormatName::HTML, html);
                staged.fragment_file = Some(path);
            }
            Err(err) => {
                log::warn!("⚠️ HTML 分支失败：{}", err);
                failures.push(format!("HTML: {}", err));
            }
        },
        Some(HtmlVariant::DataUrl) => match stage_data_url(&canonical) {
            Ok(html) => staged.push(FormatName::HTML, html),
            Err(err) => {
                log::warn!("⚠️ HTMLDATAURL 分支失败：{}", err);
                failures.push(format!("HTMLDATAURL: {}", err));
            }
        },
        None => {}
    }

    if formats.contains(OutgoingFormat::Bitmap) {
        staged.push(FormatName::BITMAP, canonical.png.clone());
    }

    if staged.is_empty() {
        return Err(ImageError::Encode(format!(
            "没有生成任何剪贴板格式：{}",
            failures.join("; ")
        )));
    }
    Ok(staged)
}

/// 任意图片 → 24 位 BI_RGB DIB（无文件头）。
pub(crate) fn dib_from_image(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut bmp = Cursor::new(Vec::new());
    rgb.write_to(&mut bmp, ImageFormat::Bmp)
        .map_err(|e| ImageError::Encode(format!("BMP 编码失败: {}", e)))?;
    strip_file_header(bmp.get_ref())
        .map_err(|e| ImageError::Encode(format!("DIB 生成失败: {}", e)))
}

fn dib_from_rgba(canonical: &CanonicalImage) -> Result<Vec<u8>, ImageError> {
    dib_from_image(&DynamicImage::ImageRgba8(canonical.rgba.clone()))
}

fn stage_file_reference(
    canonical: &CanonicalImage,
    config: &ImageConfig,
) -> Result<(Vec<u8>, PathBuf), ImageError> {
    let path = crate::storage::fragment_file_path(config.fragment_dir.as_deref())
        .map_err(|e| ImageError::FileSystem(e.to_string()))?;
    std::fs::write(&path, &canonical.png)
        .map_err(|e| ImageError::FileSystem(format!("写入片段图片失败 {}：{}", path.display(), e)))?;

    let fragment = build_file_reference(
        FILE_REFERENCE_TEMPLATE,
        canonical.width(),
        canonical.height(),
        &path.to_string_lossy(),
    )
    .map_err(|e| ImageError::Encode(format!("HTML 片段生成失败: {}", e)))?;

    Ok((fragment.into_bytes(), path))
}

fn stage_data_url(canonical: &CanonicalImage) -> Result<Vec<u8>, ImageError> {
    // 部分粘贴目标不接受调色板 PNG，这里重新做一次全彩 RGBA 编码
    let png = encode_png(&canonical.rgba)?;
    let encoded = STANDARD.encode(&png);

    let fragment = build_data_url(
        DATA_URL_TEMPLATE,
        canonical.width(),
        canonical.height(),
        "png",
        &encoded,
    )
    .map_err(|e| ImageError::Encode(format!("HTML 片段生成失败: {}", e)))?;

    Ok(fragment.into_bytes())
}
