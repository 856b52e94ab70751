//! 脚本步骤
//!
//! 脚本文件中每一步都是带 `type` 标签的表：
//!
//! ```toml
//! [[steps]]
//! type = "move_to_pose"
//! x = 37.0
//! y = -5.0
//! heading = 272.0
//! timeout_ms = 5000
//! options = { forwards = false, min_speed = 35.0 }
//!
//! [[steps]]
//! type = "wait_until_progress"
//! percent = 30.0
//!
//! [[steps]]
//! type = "set_intent"
//! target = { clamp = "latch" }
//! ```

use mogo_control::{ArmIntent, ClampRequest, IntakeIntent, LoaderOccupancy};
use mogo_hal::MotionOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 脚本步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// 移动到指定点（朝向由运动控制器决定）
    MoveToPoint {
        x: f64,
        y: f64,
        timeout_ms: u64,
        #[serde(default)]
        options: MotionOptions,
    },

    /// 移动到指定位姿
    MoveToPose {
        x: f64,
        y: f64,
        heading: f64,
        timeout_ms: u64,
        #[serde(default)]
        options: MotionOptions,
    },

    /// 原地转向
    TurnToHeading {
        heading: f64,
        timeout_ms: u64,
        #[serde(default)]
        options: MotionOptions,
    },

    /// 等待最近一条运动命令结束（到位或超时）
    WaitUntilDone,

    /// 等待最近一条运动命令的进度达到百分比，运动在后台继续
    WaitUntilProgress { percent: f64 },

    /// 修改子系统意图（不等待）
    SetIntent { target: IntentChange },

    /// 固定延时（子系统照常更新）
    Delay { ms: u64 },

    /// 等待手臂阈值动作结束
    WaitForArm { timeout_ms: u64 },

    /// 等待取环位达到指定状态
    WaitForLoader {
        until: LoaderOccupancy,
        timeout_ms: u64,
    },
}

/// 子系统意图变更
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentChange {
    Arm(ArmIntent),
    Intake(IntakeIntent),
    Clamp(ClampRequest),
}

impl ScriptStep {
    /// 是否为运动命令
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            ScriptStep::MoveToPoint { .. }
                | ScriptStep::MoveToPose { .. }
                | ScriptStep::TurnToHeading { .. }
        )
    }

    /// 是否为等待运动命令的步骤
    pub fn waits_on_motion(&self) -> bool {
        matches!(self, ScriptStep::WaitUntilDone | ScriptStep::WaitUntilProgress { .. })
    }

    /// 运动命令的超时
    pub fn motion_timeout(&self) -> Option<Duration> {
        match self {
            ScriptStep::MoveToPoint { timeout_ms, .. }
            | ScriptStep::MoveToPose { timeout_ms, .. }
            | ScriptStep::TurnToHeading { timeout_ms, .. } => {
                Some(Duration::from_millis(*timeout_ms))
            },
            _ => None,
        }
    }

    /// 第一个非有限（NaN 或无穷大）的数值字段名
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let (mut fields, options) = match self {
            ScriptStep::MoveToPoint { x, y, options, .. } => {
                (vec![("x", *x), ("y", *y)], Some(options))
            },
            ScriptStep::MoveToPose {
                x,
                y,
                heading,
                options,
                ..
            } => (vec![("x", *x), ("y", *y), ("heading", *heading)], Some(options)),
            ScriptStep::TurnToHeading { heading, options, .. } => {
                (vec![("heading", *heading)], Some(options))
            },
            ScriptStep::WaitUntilProgress { percent } => (vec![("percent", *percent)], None),
            _ => return None,
        };

        if let Some(options) = options {
            fields.extend(options.max_speed.map(|v| ("max_speed", v)));
            fields.extend(options.min_speed.map(|v| ("min_speed", v)));
        }

        fields
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }

    /// 日志中使用的步骤名
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptStep::MoveToPoint { .. } => "move_to_point",
            ScriptStep::MoveToPose { .. } => "move_to_pose",
            ScriptStep::TurnToHeading { .. } => "turn_to_heading",
            ScriptStep::WaitUntilDone => "wait_until_done",
            ScriptStep::WaitUntilProgress { .. } => "wait_until_progress",
            ScriptStep::SetIntent { .. } => "set_intent",
            ScriptStep::Delay { .. } => "delay",
            ScriptStep::WaitForArm { .. } => "wait_for_arm",
            ScriptStep::WaitForLoader { .. } => "wait_for_loader",
        }
    }
}
