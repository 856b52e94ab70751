//! 时钟抽象
//!
//! 控制循环、等待原语和仿真底盘都通过 [`Clock`] 取时间和休眠，
//! 这样测试可以用虚拟时钟（`mock::ManualClock`）在零真实时间内跑完整个自动程序。

use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};

/// 单调时钟
pub trait Clock {
    /// 自时钟创建以来经过的时间（单调递增）
    fn now(&self) -> Duration;

    /// 阻塞调用线程指定时长
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// 系统时钟
///
/// 以创建时刻为锚点的单调时间，使用 `spin_sleep` 实现低抖动的周期休眠
/// （10ms 控制周期下 `std::thread::sleep` 的抖动可达数毫秒）。
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
    sleeper: SpinSleeper,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            sleeper: SpinSleeper::default(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }
}
