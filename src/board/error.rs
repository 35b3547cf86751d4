//! # 剪贴板访问错误
//!
//! 后端失败按可恢复性分为三类，`AccessGuard` 只对前两类重试：
//! - `Busy`：剪贴板被其他进程占用
//! - `Transient`：短暂资源不足（内存、句柄）
//! - `Fatal`：格式注册失败、数据非法等重试无意义的错误

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardErrorKind {
    Busy,
    Transient,
    Fatal,
}

/// 剪贴板后端错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BoardError {
    pub kind: BoardErrorKind,
    pub message: String,
}

impl BoardError {
    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: BoardErrorKind::Busy,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: BoardErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: BoardErrorKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, BoardErrorKind::Busy | BoardErrorKind::Transient)
    }
}
