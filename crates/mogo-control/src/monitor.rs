//! 状态显示线程
//!
//! 按固定间隔读取观察者快照并输出日志，相当于车上的屏幕刷新任务。
//! 只读，不持有控制权。

use crate::observer::Observer;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// 默认刷新间隔
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(50);

/// 状态显示线程句柄
///
/// 调用 [`StatusMonitor::stop`] 或 drop 时通知线程退出并等待其结束。
#[derive(Debug)]
pub struct StatusMonitor {
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl StatusMonitor {
    /// 启动显示线程
    pub fn spawn(observer: Observer, interval: Duration) -> std::io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("mogo-status".to_string())
            .spawn(move || monitor_loop(observer, shutdown_rx, interval))?;

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// 停止线程，返回输出的状态行数
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn monitor_loop(observer: Observer, shutdown_rx: Receiver<()>, interval: Duration) -> u64 {
    let mut last_ticks = None;
    let mut reported = 0;

    loop {
        match shutdown_rx.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {},
        }

        let snapshot = observer.snapshot();
        // 控制周期没有推进时不重复输出
        if last_ticks == Some(snapshot.ticks) {
            continue;
        }
        last_ticks = Some(snapshot.ticks);
        reported += 1;

        info!(
            ticks = snapshot.ticks,
            mode = ?snapshot.mode,
            arm_angle = ?snapshot.arm.measured_angle,
            arm_intent = ?snapshot.arm.intent,
            arm_velocity = snapshot.arm.commanded_velocity(),
            intake_intent = ?snapshot.intake.intent,
            intake_velocity = snapshot.intake.velocity,
            loader = ?snapshot.intake.occupancy,
            clamp = ?snapshot.clamp,
            interlock = snapshot.interlock_blocking,
            "status"
        );
    }

    debug!(reported, "status monitor stopped");
    reported
}
