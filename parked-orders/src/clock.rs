//! 时钟抽象
//!
//! 挂单的过期判断依赖当前时间。生产环境使用 [`SystemClock`]，
//! 测试使用可手动推进的 [`ManualClock`]。

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time in Unix millis
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    /// Start at the current wall clock time
    pub fn starting_now() -> Self {
        Self::new(shared::util::now_millis())
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
