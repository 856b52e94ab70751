//! 子系统协调
//!
//! [`Subsystems`] 持有全部设备和三个控制器。每个控制周期调用一次 [`Subsystems::tick`]：
//!
//! 1. 采样传感器（手臂角度、限位开关、两个取环位）
//! 2. 各控制器根据意图和读数做决策
//! 3. 把决策写到执行器上
//! 4. 发布状态快照
//!
//! 意图可以在任意时刻修改，下一次 tick 生效。

use crate::arm::{ArmCommand, ArmController, ArmIntent};
use crate::clamp::{ClampAction, ClampController, ClampRequest};
use crate::config::RobotConfig;
use crate::hardware::Hardware;
use crate::intake::{IntakeController, IntakeIntent, LoaderOccupancy};
use crate::observer::{Observer, StatusPublisher, SubsystemSnapshot};
use crate::ownership::ControlMode;
use mogo_hal::BrakeMode;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// 手臂、取环、夹爪三个子系统
#[derive(Debug)]
pub struct Subsystems {
    hw: Hardware,
    config: RobotConfig,
    arm: ArmController,
    intake: IntakeController,
    clamp: ClampController,
    publisher: StatusPublisher,
    mode: Option<ControlMode>,
    interlock_blocking: bool,
    interlock_fault: bool,
    ticks: u64,
    last_tick: Duration,
}

impl Subsystems {
    pub fn new(hw: Hardware, config: RobotConfig) -> Self {
        Self {
            arm: ArmController::new(config.arm.clone()),
            intake: IntakeController::new(config.intake.clone(), &config.loader),
            clamp: ClampController::new(config.clamp.settle_delay()),
            hw,
            config,
            publisher: StatusPublisher::new(),
            mode: None,
            interlock_blocking: false,
            interlock_fault: false,
            ticks: 0,
            last_tick: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// 创建只读观察者
    pub fn observer(&self) -> Observer {
        self.publisher.observer()
    }

    /// 进入控制阶段前的准备：手臂使用位置保持刹车
    pub fn prepare(&mut self) {
        self.hw.arm.set_brake_mode(BrakeMode::Hold);
    }

    pub(crate) fn set_mode(&mut self, mode: Option<ControlMode>) {
        self.mode = mode;
    }

    pub fn arm(&self) -> &ArmController {
        &self.arm
    }

    pub fn intake(&self) -> &IntakeController {
        &self.intake
    }

    pub fn clamp(&self) -> &ClampController {
        &self.clamp
    }

    pub fn set_arm_intent(&mut self, intent: ArmIntent) {
        self.arm.set_intent(intent);
    }

    pub fn set_intake_intent(&mut self, intent: IntakeIntent) {
        self.intake.set_intent(intent);
    }

    /// 处理夹爪请求，需要的输出动作立即生效
    pub fn request_clamp(&mut self, request: ClampRequest, now: Duration) {
        if let Some(action) = self.clamp.request(request, now) {
            self.apply_clamp(action);
        }
    }

    /// 最近一次 tick 的取环位状态
    pub fn loader_occupancy(&self) -> Option<LoaderOccupancy> {
        self.intake.occupancy()
    }

    /// 最近一次 tick 的限位状态
    pub fn interlock_blocking(&self) -> bool {
        self.interlock_blocking
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 执行一个控制周期
    pub fn tick(&mut self, now: Duration) -> SubsystemSnapshot {
        let angle = self.hw.arm_rotation.angle().ok();
        self.sample_interlock();
        let loader = [
            self.hw.loader[0].distance().ok(),
            self.hw.loader[1].distance().ok(),
        ];

        match self.arm.tick(angle, self.interlock_blocking) {
            ArmCommand::Velocity(rpm) => self.hw.arm.set_velocity(rpm),
            ArmCommand::Brake => self.hw.arm.brake(),
        }

        let intake_velocity = self.intake.tick(loader);
        self.hw.intake.set_velocity(intake_velocity);

        if let Some(action) = self.clamp.tick(now) {
            self.apply_clamp(action);
        }

        self.ticks += 1;
        self.last_tick = now;

        let snapshot = self.snapshot();
        trace!(ticks = self.ticks, ?angle, intake_velocity, "subsystems tick");
        self.publisher.publish(snapshot.clone());
        snapshot
    }

    /// 当前状态快照（不执行控制周期）
    pub fn snapshot(&self) -> SubsystemSnapshot {
        SubsystemSnapshot {
            ticks: self.ticks,
            at: self.last_tick,
            mode: self.mode,
            arm: self.arm.state(),
            intake: self.intake.state(),
            clamp: self.clamp.state(),
            interlock_blocking: self.interlock_blocking,
        }
    }

    /// 停止全部电机，意图复位
    ///
    /// 夹爪保持当前状态：停止控制不应该丢下已经夹住的移动目标。
    pub fn stop_all(&mut self) {
        debug!("stopping all subsystems");
        self.arm.set_intent(ArmIntent::Hold);
        self.intake.set_intent(IntakeIntent::Off);
        self.hw.arm.brake();
        self.hw.intake.set_velocity(0);
    }

    /// 立即采样限位开关并更新限位状态
    ///
    /// 读取失败时按"禁止下放"处理（每次故障只告警一次）。
    pub fn sample_interlock(&mut self) -> bool {
        let blocking = match self.hw.interlock.read() {
            Ok(level) => {
                if self.interlock_fault {
                    debug!("arm interlock recovered");
                    self.interlock_fault = false;
                }
                level == self.config.teleop.interlock_active_high
            },
            Err(e) => {
                if !self.interlock_fault {
                    warn!("arm interlock unavailable, treating as blocking: {}", e);
                    self.interlock_fault = true;
                }
                true
            },
        };
        self.interlock_blocking = blocking;
        blocking
    }

    fn apply_clamp(&mut self, action: ClampAction) {
        match action {
            ClampAction::Stage => {
                for output in self.hw.clamp_prestage.iter_mut() {
                    output.set(true);
                }
            },
            ClampAction::Engage => self.hw.clamp_primary.set(true),
            ClampAction::Release => {
                self.hw.clamp_primary.set(false);
                for output in self.hw.clamp_prestage.iter_mut() {
                    output.set(false);
                }
            },
        }
    }
}
