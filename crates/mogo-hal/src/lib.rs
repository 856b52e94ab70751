//! # Mogo HAL
//!
//! 设备抽象层：控制逻辑通过这里的 trait 访问电机、气动输出、传感器、手柄和底盘运动控制器。
//!
//! 所有设备调用都是立即返回的非阻塞调用，没有排队语义：
//! - 执行器写入（电机速度、刹车、数字输出）不会失败
//! - 传感器读取可能失败（端口断开、读数过期），由上层决定安全的降级行为
//!
//! 启用 `mock` feature 后，[`mock`] 模块提供纯内存实现，用于测试和仿真。

use std::time::Duration;
use thiserror::Error;

pub mod clock;
pub mod motion;

#[cfg(feature = "mock")]
pub mod mock;

pub use clock::{Clock, SystemClock};
pub use motion::{AngularDirection, MotionController, MotionOptions, Point, Pose};

/// 设备层统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalError {
    /// 设备未连接（端口上没有设备或线缆松动）
    #[error("Device on port {port} is disconnected")]
    Disconnected { port: u8 },

    /// 读数过期（传感器长时间未刷新）
    #[error("Stale reading on port {port} (age: {age:?})")]
    StaleReading { port: u8, age: Duration },

    /// 读数超出传感器量程
    #[error("Reading out of range on port {port}: {value}")]
    OutOfRange { port: u8, value: i64 },
}

/// 电机停止时的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrakeMode {
    /// 断电滑行
    Coast,
    /// 短路制动
    #[default]
    Brake,
    /// 主动保持当前位置
    Hold,
}

/// 智能电机
pub trait Motor {
    /// 设置目标速度（RPM，带符号）
    fn set_velocity(&mut self, rpm: i32);

    /// 按当前刹车模式停止
    ///
    /// 注意：刹车与 `set_velocity(0)` 是不同的执行器状态。
    fn brake(&mut self);

    fn set_brake_mode(&mut self, mode: BrakeMode);
}

/// 数字输出（电磁阀）
pub trait DigitalOut {
    fn set(&mut self, high: bool);
}

/// 数字输入（限位开关）
pub trait DigitalIn {
    fn read(&self) -> Result<bool, HalError>;
}

/// 旋转传感器
pub trait RotationSensor {
    /// 当前角度（百分之一度，0..36000）
    fn angle(&self) -> Result<i32, HalError>;
}

/// 距离传感器
pub trait DistanceSensor {
    /// 当前距离（毫米）
    fn distance(&self) -> Result<u32, HalError>;
}

/// 手柄摇杆轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// 手柄按键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Button {
    L1,
    L2,
    R1,
    R2,
    A,
    B,
    X,
    Y,
    Up,
    Down,
    Left,
    Right,
}

/// 操作手柄
///
/// 只提供按住状态，按下沿（new press）由调用方检测。
pub trait Gamepad {
    /// 摇杆值（-127..=127）
    fn axis(&self, axis: Axis) -> i32;

    /// 按键是否处于按下状态
    fn button(&self, button: Button) -> bool;
}
