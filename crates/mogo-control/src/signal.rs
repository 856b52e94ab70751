//! 比赛阶段结束信号

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 阶段结束信号
///
/// 可克隆，所有克隆共享同一个标志。比赛控制（或 Ctrl-C）调用 [`PeriodSignal::end`] 后，
/// 所有等待和控制循环在下一个周期退出。
#[derive(Debug, Clone, Default)]
pub struct PeriodSignal {
    ended: Arc<AtomicBool>,
}

impl PeriodSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn end(&self) {
        if !self.ended.swap(true, Ordering::AcqRel) {
            info!("period end signalled");
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// 为下一个阶段复位
    pub fn reset(&self) {
        self.ended.store(false, Ordering::Release);
    }
}
