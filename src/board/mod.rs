//! # 剪贴板访问层（board）
//!
//! ## 设计思路
//!
//! 把“和系统剪贴板打交道”收敛到一处：
//!
//! - `format`：格式名、原始载荷、自定义对象格式注册表
//! - `backend`：后端原语 trait（打开读取 / 一次性写入 / 占用者探测）
//! - `guard`：进程级互斥 + 有限重试，以及一次获取内的快照
//! - `catalog`：快照上的格式查询（文本 / 图片 / 文件列表）
//! - `memory`：进程内实现，测试与无桌面环境使用
//! - `sys`：平台实现（Win32 / arboard）
//!
//! ```text
//! 调用方
//!    ↓
//! AccessGuard::read / write   (Mutex + 3 次 × 100ms 重试)
//!    ↓
//! ClipboardBackend            (Win32Board / ArboardBoard / MemoryBoard)
//! ```

mod backend;
mod catalog;
mod error;
mod format;
mod guard;
mod memory;
mod sys;

pub use backend::{BoardOwner, BoardReader, ClipboardBackend, OwnerProbe};
pub use catalog::{is_image_path, IMAGE_EXTENSIONS, IMAGE_FORMATS};
pub use error::{BoardError, BoardErrorKind};
pub use format::{FormatName, FormatRegistry, RawPayload, OBJECT_FORMAT_PREFIX};
pub use guard::{
    AccessGuard, BoardSnapshot, RetryPolicy, DEFAULT_ACCESS_ATTEMPTS, DEFAULT_ACCESS_RETRY_DELAY_MS,
};
pub use memory::MemoryBoard;
