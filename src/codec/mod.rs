//! # 剪贴板二进制格式编解码（codec）
//!
//! 与剪贴板后端无关的纯函数层，只处理字节：
//!
//! - `bitmap`：BMP 文件头的剥离 / 重建（DIB ↔ BMP）
//! - `fragment`：CF_HTML 片段模板与字节偏移回填
//! - `drop_files`：DROPFILES 文件列表
//! - `text`：`Text` / `UnicodeText` 的 NUL 结尾编码

pub mod bitmap;
pub mod drop_files;
pub mod fragment;
pub mod text;

pub use bitmap::{
    dib_to_bmp, reconstruct_bitmap, strip_file_header, BitmapError, BitmapFileHeader,
    BitmapInfoHeader, Reconstruction,
};
pub use drop_files::{decode_drop_files, encode_drop_files, DropFilesError};
pub use fragment::{
    build_data_url, build_file_reference, FragmentError, FragmentOffsets, HtmlFragment,
    DATA_URL_TEMPLATE, FILE_REFERENCE_TEMPLATE,
};
