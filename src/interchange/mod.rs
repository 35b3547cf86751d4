//! # 剪贴板交换入口
//!
//! ## 设计思路
//!
//! `ClipboardInterchange` 只负责编排与配置管理：
//! 1. 读取配置快照
//! 2. 通过同一个 `AccessGuard` 获取剪贴板
//! 3. 调用 `board`/`image_handler`/`codec` 完成具体工作
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<InterchangeConfig>>` 支持运行时替换。
//! - 单次调用内使用同一份配置快照，避免处理中途配置漂移。
//! - 查询类方法在剪贴板不可用时返回空值/`false`，写入类方法返回 `Err`。
//! - 方法按主题拆在 `image_io.rs`（图片）与 `transfer.rs`（文本 / 文件列表 / 对象）。

mod image_io;
mod transfer;

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::board::{AccessGuard, BoardSnapshot, FormatName, FormatRegistry};
use crate::config::InterchangeConfig;
use crate::error::InterchangeError;

/// 剪贴板交换入口。
pub struct ClipboardInterchange {
    guard: Arc<AccessGuard>,
    config: Arc<RwLock<InterchangeConfig>>,
    registry: RwLock<FormatRegistry>,
}

impl ClipboardInterchange {
    /// 使用系统剪贴板。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use clipboard_interchange::{ClipboardInterchange, InterchangeConfig};
    ///
    /// let interchange = ClipboardInterchange::system(InterchangeConfig::default())?;
    /// if interchange.contains_image() {
    ///     let _image = interchange.get_image();
    /// }
    /// # Ok::<(), clipboard_interchange::InterchangeError>(())
    /// ```
    pub fn system(config: InterchangeConfig) -> Result<Self, InterchangeError> {
        Self::with_guard(AccessGuard::system(), config)
    }

    /// 使用指定守卫（例如包装 `MemoryBoard` 的守卫）。
    pub fn with_guard(guard: Arc<AccessGuard>, config: InterchangeConfig) -> Result<Self, InterchangeError> {
        config.validate()?;
        Ok(Self {
            guard,
            config: Arc::new(RwLock::new(config)),
            registry: RwLock::new(FormatRegistry::new()),
        })
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次调用链路使用一致参数。
    pub fn config_snapshot(&self) -> InterchangeConfig {
        match self.config.read() {
            Ok(cfg) => cfg.clone(),
            Err(poisoned) => {
                log::warn!("配置读取锁中毒，继续使用恢复数据");
                poisoned.into_inner().clone()
            }
        }
    }

    /// 校验并替换配置。
    pub fn set_config(&self, config: InterchangeConfig) -> Result<(), InterchangeError> {
        config.validate()?;
        let mut current = self
            .config
            .write()
            .map_err(|_| InterchangeError::Settings("配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 已更新剪贴板配置（attempts={}, delay={}ms, formats={:?}, alt_dib={}）",
            config.access_attempts,
            config.access_retry_delay_ms,
            config.clipboard_formats.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
            config.image.use_alternative_dib_reader
        );
        *current = config;
        Ok(())
    }

    /// 当前剪贴板上的全部格式；获取失败时为空。
    pub fn list_formats(&self) -> BTreeSet<FormatName> {
        self.read(|snapshot| snapshot.list_formats()).unwrap_or_default()
    }

    pub fn contains_text(&self) -> bool {
        self.read(|snapshot| snapshot.has_text()).unwrap_or(false)
    }

    pub fn contains_image(&self) -> bool {
        self.read(|snapshot| snapshot.has_image()).unwrap_or(false)
    }

    pub fn contains_file_drop_list(&self) -> bool {
        self.read(|snapshot| snapshot.contains(&FormatName::FILE_DROP))
            .unwrap_or(false)
    }

    /// 请求的任一格式存在即为 `true`。
    pub fn contains_format(&self, names: &[FormatName]) -> bool {
        if names.is_empty() {
            return false;
        }
        self.read(|snapshot| snapshot.contains_any(names)).unwrap_or(false)
    }

    fn read<R>(&self, f: impl FnOnce(&BoardSnapshot<'_>) -> R) -> Option<R> {
        let policy = self.config_snapshot().retry_policy();
        self.guard.read_with_policy(policy, f)
    }

    fn write(
        &self,
        payloads: &[crate::board::RawPayload],
        persist_after_exit: bool,
    ) -> Result<(), InterchangeError> {
        let policy = self.config_snapshot().retry_policy();
        self.guard
            .write_with_policy(policy, payloads, persist_after_exit)
            .map_err(InterchangeError::from)
    }
}
