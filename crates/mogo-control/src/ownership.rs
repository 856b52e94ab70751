//! 控制权仲裁
//!
//! 任意时刻最多只有一个控制模式（自动或遥控）可以驱动子系统。
//! [`Robot::take_control`] 通过原子仲裁器登记模式并返回 [`ControlToken`]，
//! 令牌独占子系统的可变访问；令牌释放时停止电机并归还控制权。
//!
//! ```rust,ignore
//! let robot = Robot::new(hardware, config);
//! {
//!     let mut token = robot.take_control(ControlMode::Autonomous)?;
//!     executor.run(&mut token, &script, &mut chassis, &clock)?;
//! } // 令牌释放：手臂刹车、滚筒停止
//! let mut token = robot.take_control(ControlMode::Teleop)?;
//! ```

use crate::config::RobotConfig;
use crate::error::ControlError;
use crate::hardware::Hardware;
use crate::observer::Observer;
use crate::subsystems::Subsystems;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, info};

/// 控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Autonomous,
    Teleop,
}

impl ControlMode {
    fn to_raw(self) -> u8 {
        match self {
            ControlMode::Autonomous => 1,
            ControlMode::Teleop => 2,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(ControlMode::Autonomous),
            2 => Some(ControlMode::Teleop),
            _ => None,
        }
    }
}

const UNOWNED: u8 = 0;

/// 控制权仲裁器
#[derive(Debug, Default)]
pub struct OwnershipArbiter {
    owner: AtomicU8,
}

impl OwnershipArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记控制模式；已被持有时返回冲突错误
    pub fn acquire(&self, mode: ControlMode) -> Result<(), ControlError> {
        self.owner
            .compare_exchange(UNOWNED, mode.to_raw(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|held| ControlError::OwnershipConflict {
                held: ControlMode::from_raw(held).unwrap_or(mode),
                requested: mode,
            })
    }

    pub fn release(&self) {
        self.owner.store(UNOWNED, Ordering::Release);
    }

    /// 当前持有者
    pub fn current(&self) -> Option<ControlMode> {
        ControlMode::from_raw(self.owner.load(Ordering::Acquire))
    }
}

/// 整车：子系统 + 控制权仲裁
#[derive(Debug)]
pub struct Robot {
    subsystems: Mutex<Subsystems>,
    arbiter: OwnershipArbiter,
    observer: Observer,
}

impl Robot {
    pub fn new(hw: Hardware, config: RobotConfig) -> Self {
        let subsystems = Subsystems::new(hw, config);
        let observer = subsystems.observer();
        Self {
            subsystems: Mutex::new(subsystems),
            arbiter: OwnershipArbiter::new(),
            observer,
        }
    }

    /// 只读观察者（不需要控制权）
    pub fn observer(&self) -> Observer {
        self.observer.clone()
    }

    /// 当前持有控制权的模式
    pub fn owner(&self) -> Option<ControlMode> {
        self.arbiter.current()
    }

    /// 获取控制权
    ///
    /// # 错误
    ///
    /// 另一个模式仍持有令牌时返回 [`ControlError::OwnershipConflict`]。
    pub fn take_control(&self, mode: ControlMode) -> Result<ControlToken<'_>, ControlError> {
        self.arbiter.acquire(mode)?;

        let mut subsystems = self.subsystems.lock();
        subsystems.set_mode(Some(mode));
        subsystems.prepare();
        info!(?mode, "control acquired");

        Ok(ControlToken {
            mode,
            subsystems,
            arbiter: &self.arbiter,
        })
    }
}

/// 控制令牌
///
/// 持有期间独占子系统；释放时刹车手臂、停止滚筒并归还控制权。
/// 夹爪状态保持不变。
pub struct ControlToken<'a> {
    mode: ControlMode,
    subsystems: MutexGuard<'a, Subsystems>,
    arbiter: &'a OwnershipArbiter,
}

impl ControlToken<'_> {
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// 检查令牌模式是否符合入口要求
    pub fn require(&self, entry: &'static str, expected: ControlMode) -> Result<(), ControlError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(ControlError::WrongMode {
                entry,
                expected,
                actual: self.mode,
            })
        }
    }
}

impl Deref for ControlToken<'_> {
    type Target = Subsystems;

    fn deref(&self) -> &Subsystems {
        &self.subsystems
    }
}

impl DerefMut for ControlToken<'_> {
    fn deref_mut(&mut self) -> &mut Subsystems {
        &mut self.subsystems
    }
}

impl std::fmt::Debug for ControlToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlToken").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl Drop for ControlToken<'_> {
    fn drop(&mut self) {
        self.subsystems.stop_all();
        self.subsystems.set_mode(None);
        self.arbiter.release();
        debug!(mode = ?self.mode, "control released");
    }
}
