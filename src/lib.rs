//! # 剪贴板交换库：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              ClipboardInterchange（门面）                 │
//! │   get_image / get_images / copy_image / copy_text ...    │
//! │   配置快照 Arc<RwLock<InterchangeConfig>>                 │
//! └───────┬───────────────────────────────┬──────────────────┘
//!         ↓                               ↓
//! ┌─ image_handler ──────────┐   ┌─ codec ─────────────────────┐
//! │  decoder  有序解码链      │   │  bitmap     BMP 文件头      │
//! │  encoder  多格式暂存      │──→│  fragment   CF_HTML 偏移    │
//! │  config   输出格式集合    │   │  drop_files DROPFILES       │
//! └───────┬──────────────────┘   │  text       文本载荷         │
//!         ↓                      └─────────────────────────────┘
//! ┌─ board ──────────────────────────────────────────────────┐
//! │  AccessGuard（进程内互斥 + 有限重试）── BoardSnapshot      │
//! │  catalog 格式查询 · FormatRegistry 自定义格式              │
//! │       ↓ ClipboardBackend                                 │
//! │  MemoryBoard │ Win32（windows）│ arboard 兜底             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`board`] | 后端抽象、访问守卫、格式目录、内存/系统剪贴板 |
//! | [`codec`] | 与剪贴板格式相关的二进制布局 |
//! | [`image_handler`] | 图片解码链与编码链 |
//! | [`interchange`] | 对外门面 `ClipboardInterchange` |
//! | [`config`] | 运行时配置的加载、校验与保存 |
//! | [`storage`] | HTML 片段图片的落盘目录 |
//! | [`error`] | 统一错误类型 `InterchangeError` |

pub mod board;
pub mod codec;
pub mod config;
pub mod error;
pub mod image_handler;
pub mod interchange;
pub mod storage;

pub use config::InterchangeConfig;
pub use error::InterchangeError;
pub use interchange::ClipboardInterchange;
