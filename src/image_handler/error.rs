//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

use crate::board::{BoardError, BoardErrorKind};

/// 图片处理统一错误类型。
///
/// 该类型会在库入口被上转为 `InterchangeError`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("剪贴板被占用：{0}")]
    ClipboardBusy(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("剪贴板中没有可用的图片")]
    NotFound,
}

impl From<BoardError> for ImageError {
    fn from(error: BoardError) -> Self {
        match error.kind {
            BoardErrorKind::Busy => Self::ClipboardBusy(error.message),
            _ => Self::Clipboard(error.message),
        }
    }
}
