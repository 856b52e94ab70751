//! # Mogo CLI
//!
//! 自动程序仿真器：在 mock 设备组和仿真底盘上执行内置程序或脚本文件。
//!
//! ```bash
//! # 列出内置程序
//! mogo list
//!
//! # 在虚拟时钟上执行默认程序（瞬间完成）
//! mogo run
//!
//! # 按真实时间执行技能赛程序，并启动状态显示线程
//! mogo run --routine skills --realtime --monitor
//!
//! # 校验脚本文件
//! mogo validate my-auton.toml
//!
//! # 输出默认配置
//! mogo config > robot.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sim;

use commands::{ConfigCommand, RunCommand, ValidateCommand};

/// Mogo CLI - 自动程序仿真工具
#[derive(Parser, Debug)]
#[command(name = "mogo")]
#[command(about = "Simulate mogo robot autonomous routines on mock hardware", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 执行内置程序或脚本文件
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 列出内置程序
    List,

    /// 校验脚本文件
    Validate {
        #[command(flatten)]
        args: ValidateCommand,
    },

    /// 输出默认配置
    Config {
        #[command(flatten)]
        args: ConfigCommand,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => args.execute(),
        Commands::List => commands::list::execute(),
        Commands::Validate { args } => args.execute(),
        Commands::Config { args } => args.execute(),
    }
}
