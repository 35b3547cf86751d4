//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义库级统一的 `InterchangeError` 枚举，各子模块的细分错误
//! （`BoardError`、`ImageError`、`std::io::Error` 等）通过 `From` 自动上转，
//! 调用方只需处理一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 实现 `Serialize` 将错误序列化为字符串，便于嵌入 IPC / JSON 响应。

use serde::Serialize;

use crate::board::BoardError;
use crate::image_handler::ImageError;

/// 库级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    /// 剪贴板获取或写入失败（已重试）
    #[error("剪贴板操作失败: {0}")]
    Board(#[from] BoardError),

    /// 图片解码 / 编码错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 存储目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 配置加载或校验失败
    #[error("配置错误: {0}")]
    Settings(String),

    /// 格式名非法或未注册
    #[error("格式错误: {0}")]
    Format(String),

    /// 对象序列化 / 反序列化失败
    #[error("对象序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Serialize for InterchangeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_message() {
        let err = InterchangeError::Format("空格式名".to_string());
        let json = serde_json::to_string(&err).expect("error should serialize");
        assert_eq!(json, "\"格式错误: 空格式名\"");
    }

    #[test]
    fn board_errors_convert_automatically() {
        fn fails() -> Result<(), InterchangeError> {
            Err(BoardError::busy("占用"))?
        }
        assert!(matches!(fails(), Err(InterchangeError::Board(_))));
    }
}
