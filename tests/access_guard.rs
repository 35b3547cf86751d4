// 剪贴板访问守卫：重试节奏、进程内串行、占用者诊断
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use clipboard_interchange::board::{
    AccessGuard, BoardOwner, FormatName, MemoryBoard, OwnerProbe, RawPayload, RetryPolicy,
};

struct CountingProbe {
    calls: AtomicUsize,
}

impl OwnerProbe for CountingProbe {
    fn current_owner(&self) -> Option<BoardOwner> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(BoardOwner {
            pid: Some(4242),
            exe_path: None,
            process_name: Some("screenshot.exe".to_string()),
        })
    }
}

#[test]
fn busy_board_is_tried_three_times_100ms_apart() {
    let board = Arc::new(MemoryBoard::new());
    board.simulate_contention(None);
    let guard = AccessGuard::new(board.clone());

    assert!(guard.read(|snapshot| snapshot.list_formats()).is_none());

    let instants = board.attempt_instants();
    assert_eq!(instants.len(), 3);
    for pair in instants.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(100));
    }
}

#[test]
fn write_failure_reaches_caller_after_retries() {
    let board = Arc::new(MemoryBoard::new());
    board.simulate_contention(None);
    let probe = Arc::new(CountingProbe {
        calls: AtomicUsize::new(0),
    });
    let guard = AccessGuard::new(board.clone())
        .with_policy(RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(2),
        })
        .with_owner_probe(probe.clone());

    let result = guard.write(&[RawPayload::new(FormatName::PNG, vec![1, 2, 3])], true);

    let err = result.expect_err("busy board must fail");
    assert!(err.is_retryable());
    assert_eq!(board.open_attempts(), 3);
    assert_eq!(board.commit_count(), 0);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn exhausted_read_consults_owner_once_without_logger() {
    let board = Arc::new(MemoryBoard::new());
    board.simulate_contention(None);
    let probe = Arc::new(CountingProbe {
        calls: AtomicUsize::new(0),
    });
    let guard = AccessGuard::new(board.clone())
        .with_policy(RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(1),
        })
        .with_owner_probe(probe.clone());

    assert!(guard.read(|snapshot| snapshot.has_text()).is_none());
    assert_eq!(board.open_attempts(), 2);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn contention_that_clears_before_last_attempt_succeeds() {
    let board = Arc::new(MemoryBoard::new());
    board.simulate_contention(Some(2));
    let guard = AccessGuard::new(board.clone()).with_policy(RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(2),
    });

    guard
        .write(&[RawPayload::new(FormatName::TEXT, b"ok\0".to_vec())], true)
        .expect("third attempt wins");
    assert_eq!(board.commit_count(), 1);
}

#[test]
fn concurrent_callers_share_one_guard() {
    let board = Arc::new(MemoryBoard::new());
    let guard = Arc::new(AccessGuard::new(board.clone()));

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let guard = Arc::clone(&guard);
            thread::spawn(move || {
                guard
                    .write(&[RawPayload::new(FormatName::PNG, vec![i])], true)
                    .expect("uncontended write");
                guard.read(|snapshot| snapshot.read(&FormatName::PNG)).flatten()
            })
        })
        .collect();

    for handle in handles {
        let bytes = handle.join().expect("thread panicked").expect("png present");
        assert_eq!(bytes.len(), 1);
    }
    assert_eq!(board.commit_count(), 8);
}

#[test]
fn system_guard_is_shared() {
    let first = AccessGuard::system();
    let second = AccessGuard::system();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.policy(), RetryPolicy::default());
}
