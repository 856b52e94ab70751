//! # Mogo Auton
//!
//! 声明式自动程序：脚本由运动命令、等待和子系统意图变更组成，
//! 由 [`ScriptExecutor`] 在持有自动控制权的线程上按顺序执行。
//!
//! # 示例
//!
//! ```rust,ignore
//! use mogo_auton::{ExecutorConfig, Routine, ScriptExecutor};
//! use mogo_control::{ControlMode, PeriodSignal};
//!
//! let script = Routine::DEFAULT.script()?;
//! let executor = ScriptExecutor::new(ExecutorConfig::default(), PeriodSignal::new());
//!
//! let mut token = robot.take_control(ControlMode::Autonomous)?;
//! let report = executor.run(&mut token, &script, &mut chassis, &clock)?;
//! println!("{:?} after {:?}", report.outcome, report.elapsed);
//! ```

pub mod error;
pub mod executor;
pub mod routines;
pub mod script;
pub mod step;

pub use error::ScriptError;
pub use executor::{ExecutorConfig, ScriptExecutor, ScriptOutcome, ScriptReport};
pub use routines::Routine;
pub use script::Script;
pub use step::{IntentChange, ScriptStep};
