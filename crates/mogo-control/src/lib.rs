//! # Mogo Control
//!
//! 子系统协调层：手臂、取环滚筒、移动目标夹爪三个控制器，以及遥控阶段主循环。
//!
//! # 结构
//!
//! - [`arm`] / [`intake`] / [`clamp`]：纯决策控制器（输入读数，输出执行器动作）
//! - [`subsystems`]：把控制器和设备连接起来，每个控制周期采样、决策、执行
//! - [`ownership`]：控制权仲裁，自动与遥控互斥
//! - [`wait`] / [`signal`]：有界等待和阶段结束信号
//! - [`observer`] / [`monitor`]：只读状态快照和显示线程
//! - [`teleop`]：遥控主循环
//!
//! # 示例
//!
//! ```rust,ignore
//! use mogo_control::{ControlMode, PeriodSignal, Robot, RobotConfig, TeleopLoop};
//!
//! let config = RobotConfig::load_from_file("robot.toml")?;
//! let robot = Robot::new(hardware, config.clone());
//! let signal = PeriodSignal::new();
//!
//! let mut token = robot.take_control(ControlMode::Teleop)?;
//! let report = TeleopLoop::new(&config.teleop)
//!     .run(&mut token, &gamepad, &mut chassis, &clock, &signal, None)?;
//! ```

pub mod arm;
pub mod clamp;
pub mod config;
pub mod edge;
pub mod error;
pub mod hardware;
pub mod intake;
pub mod monitor;
pub mod observer;
pub mod ownership;
pub mod signal;
pub mod subsystems;
pub mod teleop;
pub mod wait;

pub use arm::{ArmCommand, ArmController, ArmIntent, ArmState};
pub use clamp::{ClampAction, ClampController, ClampRequest, ClampState};
pub use config::{
    ArmConfig, ButtonMap, ClampConfig, ConfigError, IntakeConfig, LoaderConfig, RobotConfig,
    TeleopConfig,
};
pub use edge::RisingEdge;
pub use error::ControlError;
pub use hardware::Hardware;
pub use intake::{IntakeController, IntakeIntent, IntakeState, LoaderOccupancy};
pub use monitor::{DEFAULT_MONITOR_INTERVAL, StatusMonitor};
pub use observer::{Observer, StatusPublisher, SubsystemSnapshot};
pub use ownership::{ControlMode, ControlToken, OwnershipArbiter, Robot};
pub use signal::PeriodSignal;
pub use subsystems::Subsystems;
pub use teleop::{TeleopLoop, TeleopReport};
pub use wait::{BoundedWait, WaitOutcome, WaitResult};
