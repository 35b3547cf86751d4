//! # 位图文件头编解码
//!
//! ## 设计思路
//!
//! 剪贴板上的 DIB 只有信息头 + 调色板 + 像素，没有 14 字节的 BMP 文件头；
//! 通用图片解码器（`image` crate）只认带文件头的 BMP。这里提供纯字节变换：
//! - `strip_file_header`：BMP → DIB（写入剪贴板 DIB 格式时使用）
//! - `reconstruct_bitmap`：压缩 DIB → BMP（部分生产者写出的压缩 DIB 无法被直接解码）
//! - `dib_to_bmp`：任意 DIB → BMP（后端把系统原生位图转成可解码字节时使用）
//!
//! 所有整数均为小端。解析失败只返回错误或 `NotApplicable`，不会 panic。

pub const FILE_HEADER_SIZE: usize = 14;
pub const BITMAPINFOHEADER_SIZE: usize = 40;

const BMP_MAGIC: [u8; 2] = *b"BM";

pub const BI_RGB: u32 = 0;
pub const BI_RLE8: u32 = 1;
pub const BI_RLE4: u32 = 2;
pub const BI_BITFIELDS: u32 = 3;
pub const BI_ALPHABITFIELDS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    #[error("位图数据过短：需要 {needed} 字节，实际 {actual} 字节")]
    Truncated { needed: usize, actual: usize },

    #[error("缺少 BM 文件头标识")]
    BadMagic,

    #[error("不支持的信息头长度：{0}")]
    UnsupportedHeader(u32),

    #[error("位图尺寸超出文件头可表示范围")]
    TooLarge,
}

/// 14 字节 BMP 文件头。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFileHeader {
    pub file_size: i32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl BitmapFileHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, BitmapError> {
        ensure_len(bytes, FILE_HEADER_SIZE)?;
        if bytes[..2] != BMP_MAGIC {
            return Err(BitmapError::BadMagic);
        }

        Ok(Self {
            file_size: read_i32_le(bytes, 2),
            reserved1: read_u16_le(bytes, 6),
            reserved2: read_u16_le(bytes, 8),
            pixel_offset: read_u32_le(bytes, 10),
        })
    }

    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut out = [0u8; FILE_HEADER_SIZE];
        out[..2].copy_from_slice(&BMP_MAGIC);
        out[2..6].copy_from_slice(&self.file_size.to_le_bytes());
        out[6..8].copy_from_slice(&self.reserved1.to_le_bytes());
        out[8..10].copy_from_slice(&self.reserved2.to_le_bytes());
        out[10..14].copy_from_slice(&self.pixel_offset.to_le_bytes());
        out
    }
}

/// DIB 信息头（BITMAPINFOHEADER 及其 V4/V5 扩展的公共前 40 字节）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

impl BitmapInfoHeader {
    pub fn parse(dib: &[u8]) -> Result<Self, BitmapError> {
        ensure_len(dib, BITMAPINFOHEADER_SIZE)?;

        let header_size = read_u32_le(dib, 0);
        if (header_size as usize) < BITMAPINFOHEADER_SIZE {
            return Err(BitmapError::UnsupportedHeader(header_size));
        }
        ensure_len(dib, header_size as usize)?;

        Ok(Self {
            header_size,
            width: read_i32_le(dib, 4),
            height: read_i32_le(dib, 8),
            planes: read_u16_le(dib, 12),
            bit_count: read_u16_le(dib, 14),
            compression: read_u32_le(dib, 16),
            image_size: read_u32_le(dib, 20),
            x_pels_per_meter: read_i32_le(dib, 24),
            y_pels_per_meter: read_i32_le(dib, 28),
            colors_used: read_u32_le(dib, 32),
            colors_important: read_u32_le(dib, 36),
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != BI_RGB
    }

    /// 实际调色板字节数：`colors_used` 为 0 且位深 ≤ 8 时按满调色板计算。
    pub fn palette_bytes(&self) -> usize {
        let entries = if self.colors_used != 0 {
            self.colors_used as usize
        } else if self.bit_count <= 8 {
            1usize << self.bit_count
        } else {
            0
        };
        entries.saturating_mul(4)
    }

    /// 紧跟在 40 字节信息头后的颜色掩码字节数（V4/V5 头把掩码放在头内部）。
    pub fn trailing_mask_bytes(&self) -> usize {
        if self.header_size as usize != BITMAPINFOHEADER_SIZE {
            return 0;
        }
        match self.compression {
            BI_BITFIELDS => 12,
            BI_ALPHABITFIELDS => 16,
            _ => 0,
        }
    }
}

/// `reconstruct_bitmap` 的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconstruction {
    /// 已补齐文件头，可交给通用解码器。
    Applicable(Vec<u8>),
    /// 未压缩或头部无法解析，调用方应走普通解码路径。
    NotApplicable,
}

impl Reconstruction {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Applicable(bytes) => Some(bytes),
            Self::NotApplicable => None,
        }
    }
}

/// 去掉 BMP 的 14 字节文件头，得到可直接写入剪贴板 DIB 格式的字节。
pub fn strip_file_header(bmp: &[u8]) -> Result<Vec<u8>, BitmapError> {
    BitmapFileHeader::parse(bmp)?;
    Ok(bmp[FILE_HEADER_SIZE..].to_vec())
}

/// 为压缩 DIB 补一个文件头。
///
/// - `pixel_offset = 14 + header_size + colors_used * 4`
/// - `file_size = 14 + header_size + image_size`
///
/// `compression == 0` 返回 `NotApplicable`：未压缩 DIB 由普通解码器处理。
pub fn reconstruct_bitmap(dib: &[u8]) -> Reconstruction {
    let header = match BitmapInfoHeader::parse(dib) {
        Ok(header) => header,
        Err(err) => {
            log::debug!("DIB 信息头无法解析，跳过重建：{}", err);
            return Reconstruction::NotApplicable;
        }
    };

    if !header.is_compressed() {
        return Reconstruction::NotApplicable;
    }

    let header_size = header.header_size as u64;
    let palette = (header.colors_used as u64) * 4;
    // image_size 为 0 时按原值写入，不做推算
    let image_size = header.image_size as u64;

    let pixel_offset = FILE_HEADER_SIZE as u64 + header_size + palette;
    let file_size = FILE_HEADER_SIZE as u64 + header_size + image_size;

    if pixel_offset > FILE_HEADER_SIZE as u64 + dib.len() as u64 {
        log::debug!(
            "DIB 调色板超出缓冲范围（offset={} len={}），跳过重建",
            pixel_offset,
            dib.len()
        );
        return Reconstruction::NotApplicable;
    }

    let (Ok(pixel_offset), Ok(file_size)) = (u32::try_from(pixel_offset), i32::try_from(file_size))
    else {
        return Reconstruction::NotApplicable;
    };

    let file_header = BitmapFileHeader {
        file_size,
        reserved1: 0,
        reserved2: 0,
        pixel_offset,
    };

    Reconstruction::Applicable(concat_header(&file_header, dib))
}

/// 为任意 DIB 补文件头（调色板与颜色掩码都计入像素偏移）。
pub fn dib_to_bmp(dib: &[u8]) -> Result<Vec<u8>, BitmapError> {
    let header = BitmapInfoHeader::parse(dib)?;

    let pixel_offset = FILE_HEADER_SIZE
        .checked_add(header.header_size as usize)
        .and_then(|v| v.checked_add(header.trailing_mask_bytes()))
        .and_then(|v| v.checked_add(header.palette_bytes()))
        .ok_or(BitmapError::TooLarge)?;
    ensure_len(dib, pixel_offset - FILE_HEADER_SIZE)?;

    let file_size = FILE_HEADER_SIZE
        .checked_add(dib.len())
        .ok_or(BitmapError::TooLarge)?;

    let file_header = BitmapFileHeader {
        file_size: i32::try_from(file_size).map_err(|_| BitmapError::TooLarge)?,
        reserved1: 0,
        reserved2: 0,
        pixel_offset: u32::try_from(pixel_offset).map_err(|_| BitmapError::TooLarge)?,
    };

    Ok(concat_header(&file_header, dib))
}

fn concat_header(header: &BitmapFileHeader, dib: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(FILE_HEADER_SIZE + dib.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(dib);
    out
}

fn ensure_len(bytes: &[u8], needed: usize) -> Result<(), BitmapError> {
    if bytes.len() < needed {
        return Err(BitmapError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}

// 调用前已通过 ensure_len 保证范围
fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_i32_le(bytes: &[u8], offset: usize) -> i32 {
    read_u32_le(bytes, offset) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_bmp(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Bmp)
            .expect("bmp encode should succeed");
        buf.into_inner()
    }

    /// 手工构造 8 位 RLE8 DIB：2x2，两色调色板。
    fn rle8_dib(colors_used: u32, image_size: u32) -> Vec<u8> {
        let pixels: [u8; 10] = [
            0x02, 0x00, 0x00, 0x00, // 第一行：两个 0 号色 + 行尾
            0x02, 0x01, 0x00, 0x00, // 第二行：两个 1 号色 + 行尾
            0x00, 0x01, // 位图结束
        ];
        let mut dib = Vec::new();
        dib.extend_from_slice(&40u32.to_le_bytes());
        dib.extend_from_slice(&2i32.to_le_bytes());
        dib.extend_from_slice(&2i32.to_le_bytes());
        dib.extend_from_slice(&1u16.to_le_bytes());
        dib.extend_from_slice(&8u16.to_le_bytes());
        dib.extend_from_slice(&BI_RLE8.to_le_bytes());
        dib.extend_from_slice(&image_size.to_le_bytes());
        dib.extend_from_slice(&0i32.to_le_bytes());
        dib.extend_from_slice(&0i32.to_le_bytes());
        dib.extend_from_slice(&colors_used.to_le_bytes());
        dib.extend_from_slice(&0u32.to_le_bytes());
        // 调色板：黑、白（BGRX）
        dib.extend_from_slice(&[0, 0, 0, 0, 255, 255, 255, 0]);
        dib.extend_from_slice(&pixels);
        dib
    }

    #[test]
    fn file_header_round_trips_through_bytes() {
        let header = BitmapFileHeader {
            file_size: 1234,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: 54,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(BitmapFileHeader::parse(&bytes), Ok(header));
    }

    #[test]
    fn strip_removes_exactly_fourteen_bytes() {
        let bmp = encode_bmp(DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]))));
        let dib = strip_file_header(&bmp).expect("strip should succeed");

        assert_eq!(dib.len(), bmp.len() - FILE_HEADER_SIZE);
        assert_eq!(&dib[..], &bmp[FILE_HEADER_SIZE..]);
    }

    #[test]
    fn strip_rejects_non_bmp_input() {
        assert_eq!(strip_file_header(b"not a bitmap file"), Err(BitmapError::BadMagic));
        assert!(matches!(
            strip_file_header(b"BM"),
            Err(BitmapError::Truncated { .. })
        ));
    }

    #[test]
    fn uncompressed_dib_is_not_applicable() {
        let bmp = encode_bmp(DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]))));
        let dib = strip_file_header(&bmp).expect("strip should succeed");

        let header = BitmapInfoHeader::parse(&dib).expect("header should parse");
        assert_eq!(header.compression, BI_RGB);
        assert_eq!(reconstruct_bitmap(&dib), Reconstruction::NotApplicable);
    }

    #[test]
    fn malformed_header_is_not_applicable() {
        assert_eq!(reconstruct_bitmap(&[]), Reconstruction::NotApplicable);
        assert_eq!(reconstruct_bitmap(&[40, 0, 0, 0, 1, 2]), Reconstruction::NotApplicable);

        let mut tiny_header = rle8_dib(2, 10);
        tiny_header[..4].copy_from_slice(&12u32.to_le_bytes());
        assert_eq!(reconstruct_bitmap(&tiny_header), Reconstruction::NotApplicable);
    }

    #[test]
    fn bitfields_dib_is_restored_with_computed_offsets() {
        let rgba = RgbaImage::from_pixel(5, 3, Rgba([10, 20, 30, 255]));
        let bmp = encode_bmp(DynamicImage::ImageRgba8(rgba));
        let dib = strip_file_header(&bmp).expect("strip should succeed");
        let info = BitmapInfoHeader::parse(&dib).expect("header should parse");
        assert!(info.is_compressed(), "32 位 BMP 使用 BI_BITFIELDS");

        let restored = reconstruct_bitmap(&dib)
            .into_bytes()
            .expect("compressed dib should be reconstructed");
        let file_header = BitmapFileHeader::parse(&restored).expect("file header should parse");

        assert_eq!(restored.len(), FILE_HEADER_SIZE + dib.len());
        assert_eq!(
            file_header.file_size as usize,
            FILE_HEADER_SIZE + info.header_size as usize + info.image_size as usize
        );
        assert_eq!(
            file_header.pixel_offset as usize,
            FILE_HEADER_SIZE + info.header_size as usize + info.colors_used as usize * 4
        );

        let decoded = image::load_from_memory_with_format(&restored, ImageFormat::Bmp)
            .expect("restored bitmap should decode");
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }

    #[test]
    fn rle8_dib_reconstruction_decodes() {
        let dib = rle8_dib(2, 10);
        let restored = reconstruct_bitmap(&dib)
            .into_bytes()
            .expect("rle8 dib should be reconstructed");
        let file_header = BitmapFileHeader::parse(&restored).expect("file header should parse");

        assert_eq!(file_header.pixel_offset, 14 + 40 + 8);
        assert_eq!(file_header.file_size, 14 + 40 + 10);

        let decoded = image::load_from_memory_with_format(&restored, ImageFormat::Bmp)
            .expect("rle8 bitmap should decode");
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn zero_image_size_is_written_as_declared() {
        let dib = rle8_dib(2, 0);
        let restored = reconstruct_bitmap(&dib)
            .into_bytes()
            .expect("rle8 dib should be reconstructed");
        let file_header = BitmapFileHeader::parse(&restored).expect("file header should parse");

        assert_eq!(file_header.file_size as usize, FILE_HEADER_SIZE + BITMAPINFOHEADER_SIZE);
        assert_eq!(file_header.pixel_offset, 14 + 40 + 8);
        assert_eq!(restored.len(), FILE_HEADER_SIZE + dib.len());
    }

    #[test]
    fn dib_to_bmp_accounts_for_implicit_palette() {
        // colors_used = 0，8 位深 → 256 项调色板
        let mut dib = rle8_dib(0, 10);
        dib.truncate(BITMAPINFOHEADER_SIZE);
        dib.extend(std::iter::repeat_n(0u8, 256 * 4));
        dib.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);

        let bmp = dib_to_bmp(&dib).expect("dib_to_bmp should succeed");
        let file_header = BitmapFileHeader::parse(&bmp).expect("file header should parse");
        assert_eq!(file_header.pixel_offset as usize, 14 + 40 + 1024);
        assert_eq!(file_header.file_size as usize, bmp.len());
    }

    #[test]
    fn dib_to_bmp_round_trips_a_24_bit_image() {
        let bmp = encode_bmp(DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 5, Rgb([200, 100, 50]))));
        let dib = strip_file_header(&bmp).expect("strip should succeed");
        let rebuilt = dib_to_bmp(&dib).expect("dib_to_bmp should succeed");

        let decoded = image::load_from_memory(&rebuilt).expect("rebuilt bitmap should decode");
        assert_eq!((decoded.width(), decoded.height()), (7, 5));
    }
}
