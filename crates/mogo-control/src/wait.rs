//! 有界等待
//!
//! 所有"等到某个条件成立"的操作都必须有上限：条件成立、超时、阶段结束三者先到者为准。
//! 等待期间按固定周期调用轮询闭包，调用方在闭包里推进子系统控制周期，
//! 因此等待不会让其他子系统停摆。

use crate::signal::PeriodSignal;
use mogo_hal::Clock;
use std::time::Duration;
use tracing::warn;

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 条件成立
    Completed,
    /// 超时
    TimedOut,
    /// 阶段结束信号
    Interrupted,
}

/// 等待结果及耗时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitResult {
    pub outcome: WaitOutcome,
    pub elapsed: Duration,
}

impl WaitResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == WaitOutcome::Completed
    }
}

/// 有界等待
#[derive(Debug, Clone, Copy)]
pub struct BoundedWait {
    label: &'static str,
    timeout: Duration,
    period: Duration,
}

impl BoundedWait {
    pub fn new(label: &'static str, timeout: Duration, period: Duration) -> Self {
        Self {
            label,
            timeout,
            period,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 执行等待
    ///
    /// `poll` 每个周期调用一次，参数为当前时刻，返回 `true` 表示条件成立。
    /// 第一次轮询立即发生，周期按绝对截止时间对齐，不会累计漂移。
    /// 最后一次休眠截断在超时时刻，超时不是周期整数倍时也在超时时刻做最后一次轮询。
    pub fn run<C, F>(&self, clock: &C, signal: &PeriodSignal, mut poll: F) -> WaitResult
    where
        C: Clock + ?Sized,
        F: FnMut(Duration) -> bool,
    {
        let start = clock.now();
        let limit = start + self.timeout;
        let mut deadline = start;

        loop {
            let now = clock.now();
            let elapsed = now.saturating_sub(start);

            if signal.is_ended() {
                return WaitResult {
                    outcome: WaitOutcome::Interrupted,
                    elapsed,
                };
            }

            if poll(now) {
                return WaitResult {
                    outcome: WaitOutcome::Completed,
                    elapsed,
                };
            }

            if elapsed >= self.timeout {
                warn!(wait = self.label, ?elapsed, "wait timed out");
                return WaitResult {
                    outcome: WaitOutcome::TimedOut,
                    elapsed,
                };
            }

            deadline += self.period;
            let wake = deadline.min(limit);
            let now = clock.now();
            if wake > now {
                clock.sleep(wake - now);
            }
        }
    }
}
