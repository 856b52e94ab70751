//! 内置自动程序
//!
//! 比赛使用的自动路线以 TOML 数据形式随库分发（`routines/*.toml`），
//! 编译时嵌入。执行器本身不包含任何路线相关的数值。

use crate::error::ScriptError;
use crate::script::Script;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 内置自动程序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    /// 左侧联盟桩
    StakeLeft,
    /// 右侧联盟桩
    StakeRight,
    /// 右侧移动目标
    GoalRight,
    /// 左侧移动目标
    GoalLeft,
    /// 技能赛（一分钟）
    Skills,
}

impl Routine {
    /// 全部内置程序
    pub const ALL: [Routine; 5] = [
        Routine::StakeLeft,
        Routine::StakeRight,
        Routine::GoalRight,
        Routine::GoalLeft,
        Routine::Skills,
    ];

    /// 比赛默认程序
    pub const DEFAULT: Routine = Routine::StakeRight;

    pub fn name(&self) -> &'static str {
        match self {
            Routine::StakeLeft => "stake-left",
            Routine::StakeRight => "stake-right",
            Routine::GoalRight => "goal-right",
            Routine::GoalLeft => "goal-left",
            Routine::Skills => "skills",
        }
    }

    /// 阶段时长：比赛自动阶段 15s，技能赛 60s
    pub fn period_limit(&self) -> Duration {
        match self {
            Routine::Skills => Duration::from_secs(60),
            _ => Duration::from_secs(15),
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Routine::StakeLeft => include_str!("../routines/stake-left.toml"),
            Routine::StakeRight => include_str!("../routines/stake-right.toml"),
            Routine::GoalRight => include_str!("../routines/goal-right.toml"),
            Routine::GoalLeft => include_str!("../routines/goal-left.toml"),
            Routine::Skills => include_str!("../routines/skills.toml"),
        }
    }

    /// 解析内置脚本
    pub fn script(&self) -> Result<Script, ScriptError> {
        Script::from_toml_str(self.source())
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Routine {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Routine::ALL
            .into_iter()
            .find(|routine| routine.name() == s)
            .ok_or_else(|| ScriptError::UnknownRoutine(s.to_string()))
    }
}
