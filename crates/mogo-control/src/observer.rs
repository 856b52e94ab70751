//! 子系统状态观察者
//!
//! 控制周期每次 tick 后把快照原子替换进 `ArcSwap`；
//! 观察者（屏幕刷新、日志、测试）无锁读取，不参与控制，也不需要控制权。

use crate::arm::ArmState;
use crate::clamp::ClampState;
use crate::intake::IntakeState;
use crate::ownership::ControlMode;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

/// 一个控制周期结束时的子系统快照
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemSnapshot {
    /// 已执行的控制周期数
    pub ticks: u64,
    /// 快照时刻（控制时钟）
    pub at: Duration,
    /// 当前持有控制权的模式
    pub mode: Option<ControlMode>,
    pub arm: ArmState,
    pub intake: IntakeState,
    pub clamp: ClampState,
    /// 限位开关是否禁止下放（读取失败时为 `true`）
    pub interlock_blocking: bool,
}

impl Default for SubsystemSnapshot {
    fn default() -> Self {
        Self {
            ticks: 0,
            at: Duration::ZERO,
            mode: None,
            arm: ArmState {
                measured_angle: None,
                intent: Default::default(),
                command: crate::arm::ArmCommand::Brake,
            },
            intake: IntakeState {
                intent: Default::default(),
                velocity: 0,
                occupancy: None,
            },
            clamp: ClampState::Unlatched,
            interlock_blocking: false,
        }
    }
}

/// 快照发布端（只由控制周期持有）
#[derive(Debug)]
pub struct StatusPublisher {
    inner: Arc<ArcSwap<SubsystemSnapshot>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(SubsystemSnapshot::default())),
        }
    }

    pub fn publish(&self, snapshot: SubsystemSnapshot) {
        self.inner.store(Arc::new(snapshot));
    }

    pub fn observer(&self) -> Observer {
        Observer {
            inner: self.inner.clone(),
        }
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// 只读观察者（可克隆，可跨线程）
#[derive(Debug, Clone)]
pub struct Observer {
    inner: Arc<ArcSwap<SubsystemSnapshot>>,
}

impl Observer {
    /// 最新快照（无锁读取，返回副本）
    pub fn snapshot(&self) -> SubsystemSnapshot {
        self.inner.load().as_ref().clone()
    }

    /// 已执行的控制周期数
    pub fn ticks(&self) -> u64 {
        self.inner.load().ticks
    }
}
