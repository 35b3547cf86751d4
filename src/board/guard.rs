//! # 剪贴板访问守卫
//!
//! ## 设计思路
//!
//! 系统剪贴板是进程间共享的单例资源：
//! - 进程内：由守卫持有的 `Mutex<()>` 串行化所有读写，任意时刻只有一次获取在进行。
//! - 进程间：无法保证独占，只能“有限重试”协商（3 次，间隔 100ms，无指数退避、无抖动）。
//!
//! ## 实现思路
//!
//! - 读取通过闭包表达作用域：`read(|snapshot| ...)`，闭包返回后依次关闭剪贴板、释放进程锁，
//!   任何返回路径（包括解码失败）都能保证释放。
//! - 写入在一次获取内提交全部格式。
//! - 重试耗尽时通过可选的 `OwnerProbe` 在日志中指出占用者；调用方只会收到 `None`/`Err`，不会 panic。

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use super::backend::GENERIC_OWNER_MESSAGE;
use super::{BoardError, BoardErrorKind, BoardReader, ClipboardBackend, FormatName, OwnerProbe, RawPayload};

pub const DEFAULT_ACCESS_ATTEMPTS: u32 = 3;
pub const DEFAULT_ACCESS_RETRY_DELAY_MS: u64 = 100;

/// 获取剪贴板的重试策略（固定间隔）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次）。
    pub attempts: u32,
    /// 两次尝试之间的固定等待。
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ACCESS_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_ACCESS_RETRY_DELAY_MS),
        }
    }
}

static SYSTEM_GUARD: Lazy<Arc<AccessGuard>> = Lazy::new(|| {
    let guard = AccessGuard::new(super::sys::system_backend());
    Arc::new(match super::sys::system_owner_probe() {
        Some(probe) => guard.with_owner_probe(probe),
        None => guard,
    })
});

/// 剪贴板访问守卫。
pub struct AccessGuard {
    backend: Arc<dyn ClipboardBackend>,
    owner_probe: Option<Arc<dyn OwnerProbe>>,
    policy: RetryPolicy,
    lock: Mutex<()>,
}

impl AccessGuard {
    pub fn new(backend: Arc<dyn ClipboardBackend>) -> Self {
        Self {
            backend,
            owner_probe: None,
            policy: RetryPolicy::default(),
            lock: Mutex::new(()),
        }
    }

    /// 进程级系统剪贴板守卫（默认策略）。所有调用方共享同一个实例。
    pub fn system() -> Arc<AccessGuard> {
        Arc::clone(&SYSTEM_GUARD)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_owner_probe(mut self, probe: Arc<dyn OwnerProbe>) -> Self {
        self.owner_probe = Some(probe);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 获取读取快照并在闭包内使用。
    ///
    /// 重试耗尽返回 `None`。
    pub fn read<R>(&self, f: impl FnOnce(&BoardSnapshot<'_>) -> R) -> Option<R> {
        self.read_with_policy(self.policy, f)
    }

    /// 使用指定策略获取读取快照（供按请求覆盖重试参数的调用方使用）。
    pub fn read_with_policy<R>(
        &self,
        policy: RetryPolicy,
        f: impl FnOnce(&BoardSnapshot<'_>) -> R,
    ) -> Option<R> {
        let _process_lock = self.lock_process();
        let reader = self
            .with_retry("读取", policy, || self.backend.open_read())
            .ok()?;
        let snapshot = BoardSnapshot::new(reader.as_ref());
        Some(f(&snapshot))
    }

    /// 一次获取内提交全部载荷。
    pub fn write(&self, payloads: &[RawPayload], persist_after_exit: bool) -> Result<(), BoardError> {
        self.write_with_policy(self.policy, payloads, persist_after_exit)
    }

    pub fn write_with_policy(
        &self,
        policy: RetryPolicy,
        payloads: &[RawPayload],
        persist_after_exit: bool,
    ) -> Result<(), BoardError> {
        let _process_lock = self.lock_process();
        log::debug!(
            "📋 准备写入剪贴板 - {} 个格式（persist_after_exit={}）",
            payloads.len(),
            persist_after_exit
        );
        self.with_retry("写入", policy, || {
            self.backend.write_all(payloads, persist_after_exit)
        })
    }

    fn lock_process(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("剪贴板进程锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    fn with_retry<T>(
        &self,
        operation: &str,
        policy: RetryPolicy,
        mut attempt_fn: impl FnMut() -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let attempts = policy.attempts.max(1);
        let started = Instant::now();
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                log::debug!(
                    "🔄 剪贴板{}重试 {}/{}，等待 {}ms",
                    operation,
                    attempt,
                    attempts,
                    policy.delay.as_millis()
                );
                std::thread::sleep(policy.delay);
            }

            match attempt_fn() {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("✅ 剪贴板{}成功 (尝试 {})", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    let retryable = failure.is_retryable();
                    log::debug!(
                        "❌ 剪贴板{}尝试 {} 失败: {}（kind={:?}, retryable={}）",
                        operation,
                        attempt,
                        failure.message,
                        failure.kind,
                        retryable
                    );
                    last_error = Some(failure);

                    if !retryable {
                        log::warn!("🛑 非可重试错误，提前终止重试");
                        break;
                    }
                }
            }
        }

        let failure = last_error.unwrap_or_else(|| BoardError::fatal("未知错误"));
        if failure.kind == BoardErrorKind::Busy {
            // 占用者查询不依赖日志是否启用
            let owner = self.describe_owner();
            log::warn!(
                "⛔ {}：剪贴板{}失败，{}ms 内尝试 {} 次（{}）",
                owner,
                operation,
                started.elapsed().as_millis(),
                attempts,
                failure.message
            );
        } else {
            log::warn!("⛔ 剪贴板{}失败：{}", operation, failure.message);
        }
        Err(failure)
    }

    fn describe_owner(&self) -> String {
        self.owner_probe
            .as_ref()
            .and_then(|probe| probe.current_owner())
            .map(|owner| owner.describe())
            .unwrap_or_else(|| GENERIC_OWNER_MESSAGE.to_string())
    }
}

/// 一次获取内的剪贴板快照。
///
/// 格式列表在创建时捕获一次；同一次解码/编码会话内的所有读取都经过它。
pub struct BoardSnapshot<'a> {
    reader: &'a dyn BoardReader,
    formats: BTreeSet<FormatName>,
}

impl<'a> BoardSnapshot<'a> {
    pub fn new(reader: &'a dyn BoardReader) -> Self {
        let formats = reader.formats().into_iter().collect();
        Self { reader, formats }
    }

    pub fn formats(&self) -> &BTreeSet<FormatName> {
        &self.formats
    }

    pub fn contains(&self, format: &FormatName) -> bool {
        self.formats.contains(format)
    }

    /// 读取原始字节（返回的是独立副本）。
    pub fn read(&self, format: &FormatName) -> Option<Vec<u8>> {
        self.reader.read(format)
    }

    pub fn read_payload(&self, format: &FormatName) -> Option<RawPayload> {
        self.read(format)
            .map(|bytes| RawPayload::new(format.clone(), bytes))
    }
}
