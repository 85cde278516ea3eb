//! 探索の停止フラグ
//!
//! ワーカーは `is_set` をポーリングし、無制限探索のメインスレッドは `wait` で停止要求を待つ。

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
pub struct StopSignal {
    flag: AtomicBool,
    lock: Mutex<()>,
    requested: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 停止を要求し、`wait` 中のスレッドを起こす
    pub fn request(&self) {
        let _guard = self.lock.lock();
        self.flag.store(true, Ordering::Release);
        self.requested.notify_all();
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// 停止要求が来るまでブロックする
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while !self.is_set() {
            self.requested.wait(&mut guard);
        }
    }

    /// 破棄時に停止を要求するガード
    pub(crate) fn request_on_drop(&self) -> StopOnDrop<'_> {
        StopOnDrop(self)
    }
}

/// スコープを抜けるとき（パニックによる巻き戻しを含む）に停止を要求する
pub(crate) struct StopOnDrop<'a>(&'a StopSignal);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wait_wakes_on_request() {
        let stop = StopSignal::new();
        std::thread::scope(|s| {
            let waiter = s.spawn(|| stop.wait());
            std::thread::sleep(Duration::from_millis(20));
            assert!(!waiter.is_finished());
            stop.request();
            waiter.join().unwrap();
        });
        assert!(stop.is_set());
        stop.reset();
        assert!(!stop.is_set());
    }

    #[test]
    fn test_wait_returns_immediately_when_set() {
        let stop = StopSignal::new();
        stop.request();
        stop.wait();
    }

    #[test]
    fn test_guard_requests_on_panic() {
        let stop = StopSignal::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = stop.request_on_drop();
            panic!("search failed");
        }));
        assert!(result.is_err());
        assert!(stop.is_set());
    }
}
