//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“剪贴板格式 ↔ 图片”的双向转换按职责拆分，避免单文件膨胀与耦合。
//!
//! - `decoder`：有序解码链（PNG → JPG → TIFF → DIB 特殊路径 → FileContents → Bitmap）
//! - `encoder`：规范表示 → 多格式暂存 → 一次写入
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 读取：AccessGuard::read ── BoardSnapshot ── decoder::decode_best / decode_all
//!                                                   ↓
//!                                           DecodedImage（独立所有权）
//!
//! 写入：DynamicImage ── encoder::stage（不持有剪贴板）
//!                            ↓
//!                     AccessGuard::write（一次提交）
//! ```
//!
//! ## 分层职责建议
//!
//! - 格式优先级变更优先改 `decoder.rs` 的尝试表
//! - 新增输出格式优先改 `config.rs`（`OutgoingFormat`）与 `encoder.rs`
//! - 字节布局问题（BMP 头、CF_HTML 偏移）去 `crate::codec`

mod config;
mod decoder;
mod encoder;
mod error;
mod source;

pub use config::{ClipboardFormatsConfig, HtmlVariant, ImageConfig, OutgoingFormat};
pub use decoder::{decode_all, decode_best, decode_bytes, load_image_file};
pub use encoder::{encode, stage, StagedPayloads};
pub use error::ImageError;
pub use source::{DecodedImage, DecodedImages};

#[cfg_attr(not(target_os = "windows"), allow(unused_imports))]
pub(crate) use encoder::dib_from_image;
