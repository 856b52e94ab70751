//! validate 命令

use anyhow::{Context, Result};
use clap::Args;
use mogo_auton::Script;
use std::path::PathBuf;

/// 脚本校验命令参数
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// 脚本文件路径（.toml 或 .json）
    pub path: PathBuf,
}

impl ValidateCommand {
    pub fn execute(&self) -> Result<()> {
        let script = Script::load(&self.path)
            .with_context(|| format!("invalid script {}", self.path.display()))?;

        let motions = script.steps.iter().filter(|step| step.is_motion()).count();
        println!("✅ {}: {} 步（{} 条运动命令）", script.name, script.steps.len(), motions);
        Ok(())
    }
}
