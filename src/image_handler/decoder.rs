//! # 解码链模块
//!
//! ## 设计思路
//!
//! 剪贴板上的同一张图往往同时以多种格式存在，质量参差不齐。
//! 这里用一张有序的 `(格式, 解码函数)` 表表达优先级，第一个成功者胜出：
//!
//! ```text
//! PNG → JPG → TIFF → DIB 特殊路径（需开关）→ FileContents → Bitmap（兜底，总会尝试）
//! ```
//!
//! 每个尝试相互隔离：某个格式解码失败只记日志，继续下一个；
//! 全部失败时汇总一行告警。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView};

use super::source::{DecodedImage, DecodedImages};
use super::{ImageConfig, ImageError};
use crate::board::{BoardSnapshot, FormatName};
use crate::codec::{reconstruct_bitmap, Reconstruction};

/// 单个解码尝试：`Ok(None)` 表示格式不存在或不适用，`Err` 表示存在但解码失败。
type DecodeFn = fn(&BoardSnapshot<'_>, &ImageConfig) -> Result<Option<DynamicImage>, ImageError>;

struct DecodeAttempt {
    format: FormatName,
    decode: DecodeFn,
}

/// 解码优先级表。
fn decode_attempts() -> [DecodeAttempt; 6] {
    [
        DecodeAttempt {
            format: FormatName::PNG,
            decode: decode_png,
        },
        DecodeAttempt {
            format: FormatName::JPG,
            decode: decode_jpg,
        },
        DecodeAttempt {
            format: FormatName::TIFF,
            decode: decode_tiff,
        },
        DecodeAttempt {
            format: FormatName::DIB,
            decode: decode_special_dib,
        },
        DecodeAttempt {
            format: FormatName::FILE_CONTENTS,
            decode: decode_file_contents,
        },
        DecodeAttempt {
            format: FormatName::BITMAP,
            decode: decode_board_bitmap,
        },
    ]
}

/// 按优先级解码出一张图片。
pub fn decode_best(snapshot: &BoardSnapshot<'_>, config: &ImageConfig) -> Option<DecodedImage> {
    let mut failures = Vec::new();

    for attempt in decode_attempts() {
        match (attempt.decode)(snapshot, config) {
            Ok(Some(image)) => {
                let (width, height) = image.dimensions();
                log::info!(
                    "✅ 剪贴板图片解码成功 - 格式: {} 尺寸: {}x{}",
                    attempt.format,
                    width,
                    height
                );
                return Some(DecodedImage::from_format(image, attempt.format));
            }
            Ok(None) => {}
            Err(err) => {
                log::debug!("❌ 格式 {} 解码失败：{}", attempt.format, err);
                failures.push(format!("{}: {}", attempt.format, err));
            }
        }
    }

    if !failures.is_empty() {
        log::warn!("⚠️ 剪贴板图片解码全部失败：{}", failures.join("; "));
    }
    None
}

/// 解码全部图片。
///
/// 有直接图片格式时只返回那一张；否则按文件列表顺序逐个解码图片文件，失败的路径跳过。
pub fn decode_all(snapshot: &BoardSnapshot<'_>, config: &ImageConfig) -> DecodedImages {
    if let Some(best) = decode_best(snapshot, config) {
        return DecodedImages::new(vec![best]);
    }

    let mut images = Vec::new();
    for path in snapshot.image_paths() {
        match load_image_file(&path, config) {
            Ok(image) => images.push(DecodedImage::from_file(image, path)),
            Err(err) => log::error!("❌ 图片文件解码失败，已跳过 {}：{}", path.display(), err),
        }
    }

    if !images.is_empty() {
        log::info!("📂 从文件列表解码 {} 张图片", images.len());
    }
    DecodedImages::new(images)
}

/// 读取并解码本地图片文件（带体积与像素上限）。
pub fn load_image_file(path: &Path, config: &ImageConfig) -> Result<DynamicImage, ImageError> {
    let metadata = fs::metadata(path)
        .map_err(|e| ImageError::FileSystem(format!("无法读取文件信息 {}：{}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(ImageError::FileSystem(format!("不是文件：{}", path.display())));
    }
    if metadata.len() > config.max_file_size {
        return Err(ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            metadata.len() as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    let bytes = fs::read(path)
        .map_err(|e| ImageError::FileSystem(format!("读取文件失败 {}：{}", path.display(), e)))?;
    decode_bytes(&bytes, config)
}

/// 解码内存中的图片字节（先看 header 尺寸，再完整解码）。
pub fn decode_bytes(bytes: &[u8], config: &ImageConfig) -> Result<DynamicImage, ImageError> {
    let (header_width, header_height) = inspect_dimensions_from_memory(bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;
    validate_decoded_memory_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    validate_pixel_limits(config, width, height)?;
    Ok(decoded)
}

fn decode_png(snapshot: &BoardSnapshot<'_>, config: &ImageConfig) -> Result<Option<DynamicImage>, ImageError> {
    decode_stream(snapshot, &FormatName::PNG, config)
}

fn decode_jpg(snapshot: &BoardSnapshot<'_>, config: &ImageConfig) -> Result<Option<DynamicImage>, ImageError> {
    decode_stream(snapshot, &FormatName::JPG, config)
}

fn decode_tiff(snapshot: &BoardSnapshot<'_>, config: &ImageConfig) -> Result<Option<DynamicImage>, ImageError> {
    decode_stream(snapshot, &FormatName::TIFF, config)
}

fn decode_file_contents(
    snapshot: &BoardSnapshot<'_>,
    config: &ImageConfig,
) -> Result<Option<DynamicImage>, ImageError> {
    decode_stream(snapshot, &FormatName::FILE_CONTENTS, config)
}

fn decode_stream(
    snapshot: &BoardSnapshot<'_>,
    format: &FormatName,
    config: &ImageConfig,
) -> Result<Option<DynamicImage>, ImageError> {
    if !snapshot.contains(format) {
        return Ok(None);
    }
    let Some(bytes) = snapshot.read(format) else {
        return Err(ImageError::Clipboard(format!("格式 {} 已列出但无法读取", format)));
    };
    decode_bytes(&bytes, config).map(Some)
}

/// 压缩 DIB：补文件头后交给通用解码器。仅在开关打开时参与。
fn decode_special_dib(
    snapshot: &BoardSnapshot<'_>,
    config: &ImageConfig,
) -> Result<Option<DynamicImage>, ImageError> {
    if !config.use_alternative_dib_reader || !snapshot.contains(&FormatName::DIB) {
        return Ok(None);
    }
    let Some(dib) = snapshot.read(&FormatName::DIB) else {
        return Ok(None);
    };

    match reconstruct_bitmap(&dib) {
        Reconstruction::Applicable(bmp) => {
            log::debug!("🧩 DIB 已补齐文件头（{} 字节）", bmp.len());
            decode_bytes(&bmp, config).map(Some)
        }
        Reconstruction::NotApplicable => Ok(None),
    }
}

/// 系统原生位图兜底：即使未列出也会尝试读取。
fn decode_board_bitmap(
    snapshot: &BoardSnapshot<'_>,
    config: &ImageConfig,
) -> Result<Option<DynamicImage>, ImageError> {
    match snapshot.read(&FormatName::BITMAP) {
        Some(bytes) => decode_bytes(&bytes, config).map(Some),
        None => Ok(None),
    }
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn validate_decoded_memory_limits(
    config: &ImageConfig,
    width: u32,
    height: u32,
) -> Result<(), ImageError> {
    let estimated = (width as u64)
        .checked_mul(height as u64)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{AccessGuard, MemoryBoard};
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::sync::Arc;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).expect("encode");
        out.into_inner()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([9, 8, 7, 255]))),
            ImageFormat::Png,
        )
    }

    fn decode_with(board: MemoryBoard, config: &ImageConfig) -> Option<DecodedImage> {
        let guard = AccessGuard::new(Arc::new(board));
        guard
            .read(|snapshot| decode_best(snapshot, config))
            .flatten()
    }

    #[test]
    fn png_wins_over_lower_priority_formats() {
        let board = MemoryBoard::new();
        board.set(FormatName::BITMAP, png(1, 1));
        board.set(FormatName::PNG, png(4, 3));

        let decoded = decode_with(board, &ImageConfig::default()).expect("png should decode");
        assert_eq!(decoded.source, FormatName::PNG);
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn broken_png_falls_through_to_next_format() {
        let board = MemoryBoard::new();
        board.set(FormatName::PNG, b"\x89PNG broken".to_vec());
        let jpg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 2, Rgb([1, 2, 3]))),
            ImageFormat::Jpeg,
        );
        board.set(FormatName::JPG, jpg);

        let decoded = decode_with(board, &ImageConfig::default()).expect("jpg should decode");
        assert_eq!(decoded.source, FormatName::JPG);
    }

    #[test]
    fn bitmap_is_attempted_even_when_not_listed() {
        struct HiddenBitmap(Vec<u8>);

        impl crate::board::BoardReader for HiddenBitmap {
            fn formats(&self) -> Vec<FormatName> {
                Vec::new()
            }

            fn read(&self, format: &FormatName) -> Option<Vec<u8>> {
                (format == &FormatName::BITMAP).then(|| self.0.clone())
            }
        }

        let reader = HiddenBitmap(png(2, 2));
        let snapshot = BoardSnapshot::new(&reader);
        let decoded = decode_best(&snapshot, &ImageConfig::default()).expect("bitmap fallback");
        assert_eq!(decoded.source, FormatName::BITMAP);
    }

    #[test]
    fn special_dib_path_requires_flag() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let bmp = encode(rgba, ImageFormat::Bmp);
        let dib = crate::codec::strip_file_header(&bmp).expect("strip");

        let board = MemoryBoard::new();
        board.set(FormatName::DIB, dib.clone());
        assert!(decode_with(board, &ImageConfig::default()).is_none());

        let board = MemoryBoard::new();
        board.set(FormatName::DIB, dib);
        let config = ImageConfig {
            use_alternative_dib_reader: true,
            ..ImageConfig::default()
        };
        let decoded = decode_with(board, &config).expect("flagged dib path");
        assert_eq!(decoded.source, FormatName::DIB);
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn oversized_images_are_rejected_before_full_decode() {
        let board = MemoryBoard::new();
        board.set(FormatName::PNG, png(10, 10));
        let config = ImageConfig {
            max_decoded_pixels: 99,
            ..ImageConfig::default()
        };
        assert!(decode_with(board, &config).is_none());

        let err = decode_bytes(&png(10, 10), &config).expect_err("pixel guard");
        assert!(matches!(err, ImageError::ResourceLimit(_)));
    }

    #[test]
    fn empty_board_decodes_nothing() {
        assert!(decode_with(MemoryBoard::new(), &ImageConfig::default()).is_none());
    }
}
