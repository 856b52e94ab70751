//! 控制层错误类型定义
//!
//! 决策逻辑本身没有错误通道：拒绝不安全的动作、超时后继续执行都不是错误。
//! 这里的错误只覆盖"入口被错误使用"的情况（控制权冲突、配置非法）。

use crate::config::ConfigError;
use crate::ownership::ControlMode;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 控制权已被另一个模式持有
    #[error("Subsystems are already owned by {held:?} (requested by {requested:?})")]
    OwnershipConflict {
        held: ControlMode,
        requested: ControlMode,
    },

    /// 入口需要的控制模式与令牌不符
    #[error("{entry} requires {expected:?} control, but the token is {actual:?}")]
    WrongMode {
        entry: &'static str,
        expected: ControlMode,
        actual: ControlMode,
    },

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
