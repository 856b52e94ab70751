//! 自动程序错误类型

use mogo_control::ControlError;
use std::path::PathBuf;
use thiserror::Error;

/// 脚本加载、校验与执行错误
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML script: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON script: {0}")]
    Json(#[from] serde_json::Error),

    /// 无法根据扩展名判断脚本格式
    #[error("Unsupported script format: {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// 脚本内容不合法
    #[error("Invalid step {index} in script `{script}`: {reason}")]
    InvalidStep {
        script: String,
        index: usize,
        reason: String,
    },

    #[error("Unknown routine `{0}`")]
    UnknownRoutine(String),

    /// 控制权错误（令牌模式不符等）
    #[error(transparent)]
    Control(#[from] ControlError),
}
