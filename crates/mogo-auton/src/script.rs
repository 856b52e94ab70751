//! 脚本加载与校验

use crate::error::ScriptError;
use crate::step::ScriptStep;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 自动程序脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 脚本名称
    pub name: String,

    /// 脚本描述
    #[serde(default)]
    pub description: String,

    /// 步骤序列
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ScriptError> {
        let script: Script = toml::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    /// 从 JSON 字符串解析并校验
    pub fn from_json_str(content: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_json::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    /// 加载脚本文件（按扩展名选择 `.toml` 或 `.json`）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let script = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&fs::read_to_string(path)?)?,
            Some("json") => Self::from_json_str(&fs::read_to_string(path)?)?,
            _ => return Err(ScriptError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = %path.display(), name = %script.name, steps = script.steps.len(), "script loaded");
        Ok(script)
    }

    /// 保存为 JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ScriptError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 校验步骤
    ///
    /// - 坐标、航向、速度和进度必须是有限数值
    /// - 运动和等待的超时必须大于 0
    /// - 进度百分比必须在 0..=100 之间
    /// - 等待运动的步骤之前必须已有运动命令
    pub fn validate(&self) -> Result<(), ScriptError> {
        let mut motion_issued = false;

        for (index, step) in self.steps.iter().enumerate() {
            let reason = step
                .non_finite_field()
                .map(|field| format!("{} must be a finite number", field))
                .or_else(|| match step {
                    ScriptStep::MoveToPoint { timeout_ms: 0, .. }
                    | ScriptStep::MoveToPose { timeout_ms: 0, .. }
                    | ScriptStep::TurnToHeading { timeout_ms: 0, .. }
                    | ScriptStep::WaitForArm { timeout_ms: 0 }
                    | ScriptStep::WaitForLoader { timeout_ms: 0, .. } => {
                        Some("timeout_ms must be > 0".to_string())
                    },
                    ScriptStep::WaitUntilProgress { percent } if !(0.0..=100.0).contains(percent) => {
                        Some(format!("progress must be within 0..=100, got {}", percent))
                    },
                    step if step.waits_on_motion() && !motion_issued => {
                        Some(format!("{} has no preceding motion command", step.kind()))
                    },
                    _ => None,
                });

            if let Some(reason) = reason {
                return Err(ScriptError::InvalidStep {
                    script: self.name.clone(),
                    index,
                    reason,
                });
            }

            motion_issued |= step.is_motion();
        }

        Ok(())
    }
}
