//! 遥控阶段主循环
//!
//! 每个周期读取手柄，把按键组合翻译成子系统意图，然后推进一次控制周期：
//!
//! | 输入 | 结果 |
//! |------|------|
//! | 左摇杆 Y / 右摇杆 X | 底盘 arcade |
//! | L1 + R2 且手臂在底部 | 取环自动送环（优先于手动） |
//! | L2 | 取环反转 |
//! | L1 | 取环正转 |
//! | R2 且手臂不在底部 | 手臂下放 |
//! | R1 | 手臂抬升（角度带保护） |
//! | B 按下沿 | 夹爪切换 |
//!
//! 夹爪两步闭合由控制周期推进，等待期间底盘和其他子系统照常响应。

use crate::arm::ArmIntent;
use crate::clamp::{ClampRequest, ClampState};
use crate::config::{ButtonMap, TeleopConfig};
use crate::edge::RisingEdge;
use crate::error::ControlError;
use crate::intake::IntakeIntent;
use crate::observer::SubsystemSnapshot;
use crate::ownership::{ControlMode, ControlToken};
use crate::signal::PeriodSignal;
use crate::subsystems::Subsystems;
use mogo_hal::{Axis, Clock, Gamepad, MotionController};
use std::time::Duration;
use tracing::{debug, info};

/// 遥控阶段统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeleopReport {
    /// 执行的控制周期数
    pub ticks: u64,
    /// 生效的夹爪切换次数
    pub clamp_toggles: u32,
    /// 闭合过程中被忽略的切换次数
    pub toggles_ignored: u32,
    /// 是否因阶段结束信号退出
    pub ended_by_signal: bool,
}

/// 遥控主循环
#[derive(Debug, Clone)]
pub struct TeleopLoop {
    buttons: ButtonMap,
    period: Duration,
    clamp_edge: RisingEdge,
    report: TeleopReport,
}

impl TeleopLoop {
    pub fn new(config: &TeleopConfig) -> Self {
        Self {
            buttons: config.buttons.clone(),
            period: config.period(),
            clamp_edge: RisingEdge::new(),
            report: TeleopReport::default(),
        }
    }

    pub fn report(&self) -> TeleopReport {
        self.report
    }

    /// 执行一个遥控周期
    pub fn step<G, M>(
        &mut self,
        subsystems: &mut Subsystems,
        gamepad: &G,
        motion: &mut M,
        now: Duration,
    ) -> SubsystemSnapshot
    where
        G: Gamepad + ?Sized,
        M: MotionController + ?Sized,
    {
        let b = &self.buttons;

        motion.arcade(gamepad.axis(Axis::LeftY), gamepad.axis(Axis::RightX));

        let intake_forward = gamepad.button(b.intake_forward);
        let intake_reverse = gamepad.button(b.intake_reverse);
        let arm_raise = gamepad.button(b.arm_raise);
        let arm_lower = gamepad.button(b.arm_lower);
        let at_bottom = subsystems.sample_interlock();

        let intake = if intake_forward && arm_lower && at_bottom {
            IntakeIntent::AutoFeed
        } else if intake_reverse {
            IntakeIntent::ManualReverse
        } else if intake_forward {
            IntakeIntent::ManualForward
        } else {
            IntakeIntent::Off
        };
        subsystems.set_intake_intent(intake);

        let arm = if arm_lower && !at_bottom {
            ArmIntent::FreeLower
        } else if arm_raise {
            ArmIntent::FreeRaise
        } else {
            ArmIntent::Hold
        };
        subsystems.set_arm_intent(arm);

        if self.clamp_edge.update(gamepad.button(b.clamp_toggle)) {
            if matches!(subsystems.clamp().state(), ClampState::Staging { .. }) {
                self.report.toggles_ignored += 1;
            } else {
                self.report.clamp_toggles += 1;
            }
            subsystems.request_clamp(ClampRequest::Toggle, now);
        }

        self.report.ticks += 1;
        subsystems.tick(now)
    }

    /// 运行遥控阶段直到阶段结束信号（或达到 `max_ticks`）
    ///
    /// # 错误
    ///
    /// 令牌不是 [`ControlMode::Teleop`] 时返回 [`ControlError::WrongMode`]。
    pub fn run<C, G, M>(
        &mut self,
        token: &mut ControlToken<'_>,
        gamepad: &G,
        motion: &mut M,
        clock: &C,
        signal: &PeriodSignal,
        max_ticks: Option<u64>,
    ) -> Result<TeleopReport, ControlError>
    where
        C: Clock + ?Sized,
        G: Gamepad + ?Sized,
        M: MotionController + ?Sized,
    {
        token.require("TeleopLoop::run", ControlMode::Teleop)?;
        info!(period = ?self.period, ?max_ticks, "teleop started");

        self.clamp_edge.reset();
        let mut deadline = clock.now();

        loop {
            if signal.is_ended() {
                self.report.ended_by_signal = true;
                break;
            }
            if max_ticks.is_some_and(|max| self.report.ticks >= max) {
                break;
            }

            self.step(token, gamepad, motion, clock.now());

            deadline += self.period;
            let now = clock.now();
            if deadline > now {
                clock.sleep(deadline - now);
            } else if now > deadline {
                debug!(overrun = ?(now - deadline), "teleop tick overran period");
                deadline = now;
            }
        }

        info!(report = ?self.report, "teleop finished");
        Ok(self.report)
    }
}
