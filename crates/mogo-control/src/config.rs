//! # 机器人配置
//!
//! 各子系统的阈值、速度和时序参数。默认值来自比赛车的标定结果，
//! 可以从 TOML 文件覆盖（未写出的字段保持默认值）。
//!
//! ```toml
//! [arm]
//! high_threshold = 9000
//! low_threshold = 7100
//!
//! [loader]
//! occupancy_threshold_mm = 63
//!
//! [clamp]
//! settle_delay_ms = 150
//! ```

use mogo_hal::Button;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 整车配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub arm: ArmConfig,
    pub intake: IntakeConfig,
    pub loader: LoaderConfig,
    pub clamp: ClampConfig,
    pub teleop: TeleopConfig,
}

impl RobotConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 检查参数之间的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arm = &self.arm;
        if arm.speed <= 0 {
            return Err(invalid("arm.speed", format!("must be > 0, got {}", arm.speed)));
        }
        if arm.low_threshold >= arm.high_threshold {
            return Err(invalid(
                "arm.low_threshold",
                format!(
                    "must be below arm.high_threshold ({} >= {})",
                    arm.low_threshold, arm.high_threshold
                ),
            ));
        }
        if arm.free_raise_upper_bound >= arm.wrap_bound {
            return Err(invalid(
                "arm.free_raise_upper_bound",
                format!(
                    "must be below arm.wrap_bound ({} >= {})",
                    arm.free_raise_upper_bound, arm.wrap_bound
                ),
            ));
        }
        if !(0..36000).contains(&arm.wrap_bound) {
            return Err(invalid(
                "arm.wrap_bound",
                format!("must be within one revolution (0..36000), got {}", arm.wrap_bound),
            ));
        }

        let intake = &self.intake;
        for (field, value) in [
            ("intake.forward_speed", intake.forward_speed),
            ("intake.reverse_speed", intake.reverse_speed),
            ("intake.feed_speed", intake.feed_speed),
            ("intake.clear_speed", intake.clear_speed),
        ] {
            if value <= 0 {
                return Err(invalid(field, format!("must be > 0, got {}", value)));
            }
        }

        if self.teleop.period_ms == 0 {
            return Err(invalid("teleop.period_ms", "must be > 0".to_string()));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// 手臂参数（角度单位：旋转传感器的百分之一度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// 自动抬升的停止角度
    pub high_threshold: i32,
    /// 自动下放的默认停止角度（各自动程序可以单独指定）
    pub low_threshold: i32,
    /// 电机速度（RPM）
    pub speed: i32,
    /// 手动抬升允许的上限
    pub free_raise_upper_bound: i32,
    /// 越过零点后的回绕角度：读数大于此值说明手臂已转过零点，同样允许抬升
    pub wrap_bound: i32,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            high_threshold: 9000,
            low_threshold: 7100,
            speed: 600,
            free_raise_upper_bound: 15300,
            wrap_bound: 30000,
        }
    }
}

/// 取环滚筒参数（速度单位：RPM，均为正值，方向由意图决定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub forward_speed: i32,
    pub reverse_speed: i32,
    /// 自动送环：两个取环位都为空时的正转速度
    pub feed_speed: i32,
    /// 自动送环：任一取环位有环时的反转速度
    pub clear_speed: i32,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            forward_speed: 600,
            reverse_speed: 100,
            feed_speed: 130,
            clear_speed: 140,
        }
    }
}

/// 取环位距离传感器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// 距离不大于此值视为该取环位有环
    pub occupancy_threshold_mm: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            occupancy_threshold_mm: 63,
        }
    }
}

/// 移动目标夹爪参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampConfig {
    /// 预压气缸动作后到主夹爪闭合之间的等待
    pub settle_delay_ms: u64,
}

impl ClampConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ClampConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 150,
        }
    }
}

/// 遥控阶段参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    /// 控制周期
    pub period_ms: u64,
    /// 限位开关高电平表示"手臂在底部"（禁止继续下放）
    pub interlock_active_high: bool,
    pub buttons: ButtonMap,
}

impl TeleopConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for TeleopConfig {
    fn default() -> Self {
        Self {
            period_ms: 10,
            interlock_active_high: true,
            buttons: ButtonMap::default(),
        }
    }
}

/// 按键映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonMap {
    pub intake_forward: Button,
    pub intake_reverse: Button,
    pub arm_raise: Button,
    /// 手臂下放；与 `intake_forward` 同时按下且手臂在底部时触发自动送环
    pub arm_lower: Button,
    pub clamp_toggle: Button,
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            intake_forward: Button::L1,
            intake_reverse: Button::L2,
            arm_raise: Button::R1,
            arm_lower: Button::R2,
            clamp_toggle: Button::B,
        }
    }
}
