//! # 内存剪贴板
//!
//! 进程内实现的 `ClipboardBackend`，用于无桌面环境（CI、服务端）和测试。
//! 支持模拟“其他进程占用剪贴板”、不可恢复错误，以及所属进程退出后的数据清理，
//! 并记录每次打开的时间点，便于校验重试节奏。

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::{BoardError, BoardReader, ClipboardBackend, FormatName, RawPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contention {
    Free,
    Remaining(u32),
    Permanent,
}

#[derive(Debug)]
struct MemoryState {
    payloads: Vec<RawPayload>,
    persist_after_exit: bool,
    contention: Contention,
    fatal: bool,
    attempts: Vec<Instant>,
    commits: u32,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            payloads: Vec::new(),
            persist_after_exit: true,
            contention: Contention::Free,
            fatal: false,
            attempts: Vec::new(),
            commits: 0,
        }
    }
}

/// 内存剪贴板。
#[derive(Debug, Default)]
pub struct MemoryBoard {
    state: Mutex<MemoryState>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定载荷初始化。
    pub fn with_payloads(payloads: impl IntoIterator<Item = RawPayload>) -> Self {
        let board = Self::new();
        for payload in payloads {
            board.set(payload.format, payload.bytes);
        }
        board
    }

    /// 直接放入一个格式（模拟其他进程写入），同名格式会被覆盖。
    pub fn set(&self, format: FormatName, bytes: Vec<u8>) {
        let mut state = self.state();
        upsert(&mut state.payloads, RawPayload::new(format, bytes));
    }

    /// 模拟其他进程占用：`Some(n)` 表示接下来 n 次打开失败，`None` 表示永久占用。
    pub fn simulate_contention(&self, failures: Option<u32>) {
        self.state().contention = match failures {
            Some(0) => Contention::Free,
            Some(n) => Contention::Remaining(n),
            None => Contention::Permanent,
        };
    }

    /// 模拟不可重试的后端错误。
    pub fn simulate_fatal_failure(&self, enabled: bool) {
        self.state().fatal = enabled;
    }

    /// 模拟写入方进程退出：非持久数据被清空。
    pub fn simulate_owner_exit(&self) {
        let mut state = self.state();
        if !state.persist_after_exit {
            state.payloads.clear();
        }
    }

    /// 累计打开次数（读写都计）。
    pub fn open_attempts(&self) -> usize {
        self.state().attempts.len()
    }

    /// 每次打开的时间点。
    pub fn attempt_instants(&self) -> Vec<Instant> {
        self.state().attempts.clone()
    }

    /// 成功提交写入的次数。
    pub fn commit_count(&self) -> u32 {
        self.state().commits
    }

    pub fn payloads(&self) -> Vec<RawPayload> {
        self.state().payloads.clone()
    }

    pub fn payload(&self, format: &FormatName) -> Option<Vec<u8>> {
        self.state()
            .payloads
            .iter()
            .find(|p| &p.format == format)
            .map(|p| p.bytes.clone())
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn try_open(state: &mut MemoryState) -> Result<(), BoardError> {
        state.attempts.push(Instant::now());

        if state.fatal {
            return Err(BoardError::fatal("内存剪贴板不可用"));
        }

        match state.contention {
            Contention::Free => Ok(()),
            Contention::Permanent => Err(BoardError::busy("内存剪贴板被占用")),
            Contention::Remaining(n) => {
                state.contention = if n <= 1 {
                    Contention::Free
                } else {
                    Contention::Remaining(n - 1)
                };
                Err(BoardError::busy("内存剪贴板被占用"))
            }
        }
    }
}

fn upsert(payloads: &mut Vec<RawPayload>, payload: RawPayload) {
    match payloads.iter_mut().find(|p| p.format == payload.format) {
        Some(existing) => existing.bytes = payload.bytes,
        None => payloads.push(payload),
    }
}

struct MemoryReader {
    payloads: Vec<RawPayload>,
}

impl BoardReader for MemoryReader {
    fn formats(&self) -> Vec<FormatName> {
        self.payloads.iter().map(|p| p.format.clone()).collect()
    }

    fn read(&self, format: &FormatName) -> Option<Vec<u8>> {
        self.payloads
            .iter()
            .find(|p| &p.format == format)
            .map(|p| p.bytes.clone())
    }
}

impl ClipboardBackend for MemoryBoard {
    fn open_read(&self) -> Result<Box<dyn BoardReader + '_>, BoardError> {
        let mut state = self.state();
        Self::try_open(&mut state)?;
        Ok(Box::new(MemoryReader {
            payloads: state.payloads.clone(),
        }))
    }

    fn write_all(&self, payloads: &[RawPayload], persist_after_exit: bool) -> Result<(), BoardError> {
        let mut state = self.state();
        Self::try_open(&mut state)?;

        state.payloads.clear();
        for payload in payloads {
            upsert(&mut state.payloads, payload.clone());
        }
        state.persist_after_exit = persist_after_exit;
        state.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_replaces_previous_content() {
        let board = MemoryBoard::new();
        board.set(FormatName::TEXT, b"old\0".to_vec());

        board
            .write_all(&[RawPayload::new(FormatName::PNG, vec![1, 2, 3])], true)
            .expect("write should succeed");

        assert_eq!(board.payload(&FormatName::TEXT), None);
        assert_eq!(board.payload(&FormatName::PNG), Some(vec![1, 2, 3]));
        assert_eq!(board.commit_count(), 1);
    }

    #[test]
    fn non_persistent_data_disappears_when_owner_exits() {
        let board = MemoryBoard::new();
        board
            .write_all(&[RawPayload::new(FormatName::PNG, vec![1])], false)
            .expect("write should succeed");
        board.simulate_owner_exit();
        assert!(board.payloads().is_empty());

        board
            .write_all(&[RawPayload::new(FormatName::PNG, vec![1])], true)
            .expect("write should succeed");
        board.simulate_owner_exit();
        assert_eq!(board.payloads().len(), 1);
    }

    #[test]
    fn limited_contention_clears_after_n_failures() {
        let board = MemoryBoard::new();
        board.simulate_contention(Some(2));

        assert!(board.open_read().is_err());
        assert!(board.open_read().is_err());
        assert!(board.open_read().is_ok());
        assert_eq!(board.open_attempts(), 3);
    }
}
