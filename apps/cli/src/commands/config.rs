//! config 命令
//!
//! 输出默认整车配置，可作为 `run --config` 的起点

use anyhow::{Context, Result};
use clap::Args;
use mogo_control::RobotConfig;
use std::path::PathBuf;

/// 配置命令参数
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// 写入文件而不是标准输出
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn execute(&self) -> Result<()> {
        let config = RobotConfig::default();
        match &self.output {
            Some(path) => {
                config
                    .save_to_file(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("✅ 默认配置已写入 {}", path.display());
            },
            None => print!("{}", config.to_toml_string()?),
        }
        Ok(())
    }
}
