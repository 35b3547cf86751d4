//! # 非 Windows 回退方案：沿用 arboard
//!
//! arboard 不支持枚举格式，也不支持任意格式名，这里只映射：
//! - 文本 → `UnicodeText` + `Text`
//! - 图片 → `Bitmap`（读取时编码为 PNG 字节）
//!
//! 每次 `set_*` 都会替换整个剪贴板，因此同一批载荷里图片优先于文本。

use std::borrow::Cow;
use std::cell::RefCell;
use std::io::Cursor;

use crate::board::{BoardError, BoardReader, ClipboardBackend, FormatName, RawPayload};
use crate::codec::text::{decode_ansi_text, decode_unicode_text, encode_ansi_text, encode_unicode_text};

pub(crate) struct ArboardBoard;

struct ArboardReader {
    clipboard: RefCell<arboard::Clipboard>,
}

impl ArboardReader {
    fn text(&self) -> Option<String> {
        self.clipboard.borrow_mut().get_text().ok()
    }

    fn image_as_png(&self) -> Option<Vec<u8>> {
        let data = self.clipboard.borrow_mut().get_image().ok()?;
        let rgba = image::RgbaImage::from_raw(data.width as u32, data.height as u32, data.bytes.into_owned())?;

        let mut out = Cursor::new(Vec::new());
        if let Err(e) = rgba.write_to(&mut out, image::ImageFormat::Png) {
            log::debug!("arboard 图片转 PNG 失败：{}", e);
            return None;
        }
        Some(out.into_inner())
    }
}

impl BoardReader for ArboardReader {
    fn formats(&self) -> Vec<FormatName> {
        let mut formats = Vec::new();
        if self.text().is_some() {
            formats.push(FormatName::UNICODE_TEXT);
            formats.push(FormatName::TEXT);
        }
        if self.clipboard.borrow_mut().get_image().is_ok() {
            formats.push(FormatName::BITMAP);
        }
        formats
    }

    fn read(&self, format: &FormatName) -> Option<Vec<u8>> {
        if format == &FormatName::UNICODE_TEXT {
            return self.text().map(|text| encode_unicode_text(&text));
        }
        if format == &FormatName::TEXT {
            return self.text().map(|text| encode_ansi_text(&text));
        }
        if format == &FormatName::BITMAP {
            return self.image_as_png();
        }
        None
    }
}

impl ClipboardBackend for ArboardBoard {
    fn open_read(&self) -> Result<Box<dyn BoardReader + '_>, BoardError> {
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| BoardError::busy(format!("无法访问剪贴板：{}", e)))?;
        Ok(Box::new(ArboardReader {
            clipboard: RefCell::new(clipboard),
        }))
    }

    fn write_all(&self, payloads: &[RawPayload], persist_after_exit: bool) -> Result<(), BoardError> {
        if !persist_after_exit {
            log::debug!("arboard 后端不区分退出后是否保留");
        }

        // ── 预处理（不持有剪贴板）──
        let image = find_image(payloads);
        let text = find_text(payloads);

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| BoardError::busy(format!("无法访问剪贴板：{}", e)))?;

        if let Some(rgba) = image {
            let image_data = arboard::ImageData {
                width: rgba.width() as usize,
                height: rgba.height() as usize,
                bytes: Cow::Borrowed(rgba.as_raw()),
            };
            clipboard
                .set_image(image_data)
                .map_err(|e| BoardError::transient(format!("复制失败：{}", e)))?;
            if text.is_some() {
                log::debug!("arboard 后端仅保留图片，文本格式被忽略");
            }
        } else if let Some(text) = text {
            clipboard
                .set_text(text)
                .map_err(|e| BoardError::transient(format!("复制失败：{}", e)))?;
        } else if payloads.is_empty() {
            clipboard
                .clear()
                .map_err(|e| BoardError::transient(format!("清空失败：{}", e)))?;
        } else {
            let names: Vec<&str> = payloads.iter().map(|p| p.format.as_str()).collect();
            return Err(BoardError::fatal(format!(
                "arboard 后端不支持这些格式：{}",
                names.join(", ")
            )));
        }

        Ok(())
    }
}

/// 图片载荷按 PNG → Bitmap 的顺序取第一个可解码的。
fn find_image(payloads: &[RawPayload]) -> Option<image::RgbaImage> {
    [FormatName::PNG, FormatName::BITMAP]
        .iter()
        .filter_map(|format| payloads.iter().find(|p| &p.format == format))
        .find_map(|payload| match image::load_from_memory(&payload.bytes) {
            Ok(image) => Some(image.to_rgba8()),
            Err(e) => {
                log::debug!("{} 载荷无法解码：{}", payload.format, e);
                None
            }
        })
}

fn find_text(payloads: &[RawPayload]) -> Option<String> {
    if let Some(payload) = payloads.iter().find(|p| p.format == FormatName::UNICODE_TEXT) {
        return Some(decode_unicode_text(&payload.bytes));
    }
    payloads
        .iter()
        .find(|p| p.format == FormatName::TEXT)
        .map(|payload| decode_ansi_text(&payload.bytes))
}
