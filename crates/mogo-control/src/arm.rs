//! 手臂控制器
//!
//! 把"手臂意图 + 当前角度 + 限位开关"转换为一次执行器动作（速度或刹车）。
//!
//! # 意图
//!
//! | 意图 | 行为 | 结束条件 |
//! |------|------|----------|
//! | `Hold` | 刹车保持 | - |
//! | `RaiseToHigh` | 正转直到角度达到阈值 | 角度 >= 阈值，自动转为 `Hold` |
//! | `LowerToLow` | 反转直到角度降到阈值 | 角度 <= 阈值或限位触发，自动转为 `Hold` |
//! | `FreeRaise` | 操作手按住时正转（角度带保护） | 由调用方撤销 |
//! | `FreeLower` | 操作手按住时反转（限位保护） | 由调用方撤销 |
//!
//! 阈值比较都是严格不等式，且每个周期都重新采样角度。
//! 自动意图没有内置超时：需要等待它结束的调用方必须使用有界等待（见 [`crate::wait`]）。

use crate::config::ArmConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 手臂意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmIntent {
    /// 刹车保持（空闲）
    #[default]
    Hold,
    /// 抬升到阈值后保持
    RaiseToHigh { threshold: i32 },
    /// 下放到阈值后保持
    LowerToLow { threshold: i32 },
    /// 手动抬升
    FreeRaise,
    /// 手动下放
    FreeLower,
}

impl ArmIntent {
    /// 使用配置中的默认高位阈值
    pub fn raise_to_high(config: &ArmConfig) -> Self {
        ArmIntent::RaiseToHigh {
            threshold: config.high_threshold,
        }
    }

    /// 使用配置中的默认低位阈值
    pub fn lower_to_low(config: &ArmConfig) -> Self {
        ArmIntent::LowerToLow {
            threshold: config.low_threshold,
        }
    }

    /// 是否为会自行结束的阈值意图
    pub fn is_self_terminating(&self) -> bool {
        matches!(
            self,
            ArmIntent::RaiseToHigh { .. } | ArmIntent::LowerToLow { .. }
        )
    }
}

/// 手臂执行器动作
///
/// 刹车与零速度是两种不同的执行器状态：保持位置必须用刹车。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmCommand {
    Velocity(i32),
    Brake,
}

impl ArmCommand {
    /// 带符号的命令速度（刹车为 0）
    pub fn velocity(&self) -> i32 {
        match self {
            ArmCommand::Velocity(v) => *v,
            ArmCommand::Brake => 0,
        }
    }
}

/// 手臂状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmState {
    /// 最近一次采样的角度（传感器故障时为 `None`）
    pub measured_angle: Option<i32>,
    pub intent: ArmIntent,
    pub command: ArmCommand,
}

impl ArmState {
    pub fn commanded_velocity(&self) -> i32 {
        self.command.velocity()
    }
}

/// 手臂控制器
#[derive(Debug, Clone)]
pub struct ArmController {
    config: ArmConfig,
    intent: ArmIntent,
    measured_angle: Option<i32>,
    command: ArmCommand,
    sensor_fault: bool,
    lower_refused: bool,
}

impl ArmController {
    pub fn new(config: ArmConfig) -> Self {
        Self {
            config,
            intent: ArmIntent::Hold,
            measured_angle: None,
            command: ArmCommand::Brake,
            sensor_fault: false,
            lower_refused: false,
        }
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub fn intent(&self) -> ArmIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: ArmIntent) {
        if intent != self.intent {
            debug!(from = ?self.intent, to = ?intent, "arm intent");
            self.intent = intent;
            self.lower_refused = false;
        }
    }

    /// 意图已回到 `Hold`（阈值动作已完成）
    pub fn is_holding(&self) -> bool {
        self.intent == ArmIntent::Hold
    }

    pub fn state(&self) -> ArmState {
        ArmState {
            measured_angle: self.measured_angle,
            intent: self.intent,
            command: self.command,
        }
    }

    /// 手动抬升允许的角度带：低于上限，或已回绕过零点
    pub fn free_raise_allowed(&self, angle: i32) -> bool {
        angle < self.config.free_raise_upper_bound || angle > self.config.wrap_bound
    }

    /// 计算一个控制周期的动作
    ///
    /// # 参数
    ///
    /// - `angle`: 本周期采样的角度，`None` 表示传感器读取失败
    /// - `interlock_blocking`: 限位开关是否禁止下放
    pub fn tick(&mut self, angle: Option<i32>, interlock_blocking: bool) -> ArmCommand {
        self.measured_angle = angle;

        let command = match angle {
            None => {
                if !self.sensor_fault {
                    warn!(intent = ?self.intent, "arm rotation sensor unavailable, braking");
                    self.sensor_fault = true;
                }
                ArmCommand::Brake
            },
            Some(angle) => {
                if self.sensor_fault {
                    debug!(angle, "arm rotation sensor recovered");
                    self.sensor_fault = false;
                }
                self.decide(angle, interlock_blocking)
            },
        };

        if command != self.command {
            debug!(?command, intent = ?self.intent, ?angle, "arm command");
        }
        self.command = command;
        command
    }

    fn decide(&mut self, angle: i32, interlock_blocking: bool) -> ArmCommand {
        let speed = self.config.speed;

        match self.intent {
            ArmIntent::Hold => ArmCommand::Brake,

            ArmIntent::RaiseToHigh { threshold } => {
                if angle < threshold {
                    ArmCommand::Velocity(speed)
                } else {
                    self.intent = ArmIntent::Hold;
                    ArmCommand::Brake
                }
            },

            ArmIntent::LowerToLow { threshold } => {
                if interlock_blocking {
                    warn!(angle, threshold, "arm lower stopped by interlock before threshold");
                    self.intent = ArmIntent::Hold;
                    ArmCommand::Brake
                } else if angle > threshold {
                    ArmCommand::Velocity(-speed)
                } else {
                    self.intent = ArmIntent::Hold;
                    ArmCommand::Brake
                }
            },

            ArmIntent::FreeRaise => {
                if self.free_raise_allowed(angle) {
                    ArmCommand::Velocity(speed)
                } else {
                    ArmCommand::Brake
                }
            },

            ArmIntent::FreeLower => {
                if interlock_blocking {
                    if !self.lower_refused {
                        warn!(angle, "arm lower refused: interlock asserted");
                        self.lower_refused = true;
                    }
                    ArmCommand::Brake
                } else {
                    self.lower_refused = false;
                    ArmCommand::Velocity(-speed)
                }
            },
        }
    }
}
