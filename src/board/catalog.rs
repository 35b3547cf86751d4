//! # 格式目录查询
//!
//! 在一次读取快照上回答“剪贴板里有什么”：文本、图片、指定格式、文件列表。
//! 所有查询只看快照创建时捕获的格式列表，任何解析失败都按“不存在”处理。

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::{BoardSnapshot, FormatName};
use crate::codec::decode_drop_files;

/// 视为“图片”的剪贴板格式。
pub const IMAGE_FORMATS: [FormatName; 6] = [
    FormatName::BITMAP,
    FormatName::DIB,
    FormatName::TIFF,
    FormatName::ENHANCED_METAFILE,
    FormatName::PNG,
    FormatName::JPG,
];

/// 文件列表中视为图片的扩展名（不区分大小写）。
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "tiff", "gif", "png", "bmp", "ico", "wmf"];

/// 路径扩展名是否属于图片。
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

impl BoardSnapshot<'_> {
    pub fn list_formats(&self) -> BTreeSet<FormatName> {
        self.formats().clone()
    }

    pub fn has_text(&self) -> bool {
        self.contains(&FormatName::TEXT) || self.contains(&FormatName::UNICODE_TEXT)
    }

    /// 图片格式、图片文件路径、可解码的原始文件字节，三者满足其一即可。
    pub fn has_image(&self) -> bool {
        if IMAGE_FORMATS.iter().any(|format| self.contains(format)) {
            return true;
        }

        if self.file_drop_list().iter().any(|path| is_image_path(path)) {
            return true;
        }

        self.file_contents_is_image()
    }

    /// 请求集合与当前格式有交集。空请求返回 `false`。
    pub fn contains_any(&self, names: &[FormatName]) -> bool {
        names.iter().any(|name| self.contains(name))
    }

    /// 解析 `FileDrop` 载荷；缺失或损坏时返回空列表。
    pub fn file_drop_list(&self) -> Vec<PathBuf> {
        if !self.contains(&FormatName::FILE_DROP) {
            return Vec::new();
        }

        let Some(bytes) = self.read(&FormatName::FILE_DROP) else {
            return Vec::new();
        };

        match decode_drop_files(&bytes) {
            Ok(paths) => paths,
            Err(err) => {
                log::warn!("⚠️ 文件列表解析失败：{}", err);
                Vec::new()
            }
        }
    }

    /// 文件列表中扩展名属于图片的路径（保持原顺序）。
    pub fn image_paths(&self) -> Vec<PathBuf> {
        self.file_drop_list()
            .into_iter()
            .filter(|path| is_image_path(path))
            .collect()
    }

    fn file_contents_is_image(&self) -> bool {
        if !self.contains(&FormatName::FILE_CONTENTS) {
            return false;
        }
        let Some(bytes) = self.read(&FormatName::FILE_CONTENTS) else {
            return false;
        };

        // 先用文件签名快速排除，再只读图片头取尺寸，不解码像素
        if !infer::is_image(&bytes) {
            return false;
        }
        let reader = match image::ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format() {
            Ok(reader) => reader,
            Err(err) => {
                log::debug!("FileContents 格式识别失败：{}", err);
                return false;
            }
        };
        matches!(reader.into_dimensions(), Ok((width, height)) if width > 0 && height > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{AccessGuard, MemoryBoard};
    use crate::codec::encode_drop_files;
    use std::io::Cursor;
    use std::sync::Arc;

    fn tiny_png() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("png encode");
        out.into_inner()
    }

    fn query<R>(board: MemoryBoard, f: impl FnOnce(&BoardSnapshot<'_>) -> R) -> R {
        let guard = AccessGuard::new(Arc::new(board));
        guard.read(f).expect("memory board is never busy")
    }

    #[test]
    fn empty_board_has_nothing() {
        let (formats, text, image, any) = query(MemoryBoard::new(), |snapshot| {
            (
                snapshot.list_formats(),
                snapshot.has_text(),
                snapshot.has_image(),
                snapshot.contains_any(&[FormatName::PNG]),
            )
        });
        assert!(formats.is_empty());
        assert!(!text && !image && !any);
    }

    #[test]
    fn text_is_detected_from_either_text_format() {
        let board = MemoryBoard::new();
        board.set(FormatName::TEXT, b"a\0".to_vec());
        assert!(query(board, |snapshot| snapshot.has_text()));

        let board = MemoryBoard::new();
        board.set(FormatName::UNICODE_TEXT, vec![b'a', 0, 0, 0]);
        assert!(query(board, |snapshot| snapshot.has_text()));
    }

    #[test]
    fn contains_any_requires_intersection() {
        let board = MemoryBoard::new();
        board.set(FormatName::PNG, vec![1]);

        let (empty_request, hit, miss) = query(board, |snapshot| {
            (
                snapshot.contains_any(&[]),
                snapshot.contains_any(&[FormatName::JPG, FormatName::PNG]),
                snapshot.contains_any(&[FormatName::HTML]),
            )
        });
        assert!(!empty_request);
        assert!(hit);
        assert!(!miss);
    }

    #[test]
    fn image_extension_in_file_drop_counts_as_image() {
        let board = MemoryBoard::new();
        board.set(
            FormatName::FILE_DROP,
            encode_drop_files(&[PathBuf::from("C:/a.PNG")]),
        );
        assert!(query(board, |snapshot| snapshot.has_image()));

        let board = MemoryBoard::new();
        board.set(
            FormatName::FILE_DROP,
            encode_drop_files(&[PathBuf::from("C:/notes.txt")]),
        );
        assert!(!query(board, |snapshot| snapshot.has_image()));
    }

    #[test]
    fn file_contents_must_trial_decode() {
        let board = MemoryBoard::new();
        board.set(FormatName::FILE_CONTENTS, tiny_png());
        assert!(query(board, |snapshot| snapshot.has_image()));

        let board = MemoryBoard::new();
        board.set(FormatName::FILE_CONTENTS, b"plain text".to_vec());
        assert!(!query(board, |snapshot| snapshot.has_image()));

        // 签名像 PNG 但内容被截断
        let board = MemoryBoard::new();
        board.set(FormatName::FILE_CONTENTS, tiny_png()[..16].to_vec());
        assert!(!query(board, |snapshot| snapshot.has_image()));
    }

    #[test]
    fn file_contents_check_reads_header_only() {
        // 24 位 BMP 头声明 3000x3000，但没有任何像素数据
        let mut bmp = Vec::new();
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&54i32.to_le_bytes());
        bmp.extend_from_slice(&[0, 0, 0, 0]);
        bmp.extend_from_slice(&54u32.to_le_bytes());
        bmp.extend_from_slice(&40u32.to_le_bytes());
        bmp.extend_from_slice(&3000i32.to_le_bytes());
        bmp.extend_from_slice(&3000i32.to_le_bytes());
        bmp.extend_from_slice(&1u16.to_le_bytes());
        bmp.extend_from_slice(&24u16.to_le_bytes());
        bmp.extend_from_slice(&[0u8; 24]);

        let board = MemoryBoard::new();
        board.set(FormatName::FILE_CONTENTS, bmp);
        assert!(query(board, |snapshot| snapshot.has_image()));
    }

    #[test]
    fn corrupt_file_drop_is_treated_as_empty() {
        let board = MemoryBoard::new();
        board.set(FormatName::FILE_DROP, vec![1, 2, 3]);
        let (paths, image) = query(board, |snapshot| (snapshot.file_drop_list(), snapshot.has_image()));
        assert!(paths.is_empty());
        assert!(!image);
    }

    #[test]
    fn image_paths_keep_order_and_skip_other_files() {
        let board = MemoryBoard::new();
        board.set(
            FormatName::FILE_DROP,
            encode_drop_files(&[
                PathBuf::from("b.jpeg"),
                PathBuf::from("readme.md"),
                PathBuf::from("a.Wmf"),
            ]),
        );
        let paths = query(board, |snapshot| snapshot.image_paths());
        assert_eq!(paths, vec![PathBuf::from("b.jpeg"), PathBuf::from("a.Wmf")]);
    }
}
