//! run 命令
//!
//! 在仿真整车上执行内置程序或脚本文件。默认使用虚拟时钟（瞬间完成），
//! `--realtime` 按真实时间执行。Ctrl-C 相当于阶段结束信号。

use anyhow::{Context, Result};
use clap::Args;
use mogo_auton::{ExecutorConfig, Routine, Script, ScriptExecutor, ScriptReport};
use mogo_control::{ControlMode, DEFAULT_MONITOR_INTERVAL, PeriodSignal, RobotConfig, StatusMonitor};
use mogo_hal::mock::ManualClock;
use mogo_hal::{Clock, MotionController, SystemClock};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::sim::SimRobot;

/// 脚本文件的默认阶段时长（比赛自动阶段）
const DEFAULT_PERIOD_LIMIT: Duration = Duration::from_secs(15);

/// 执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 内置程序名（默认 stake-right）
    #[arg(short, long, conflicts_with = "script")]
    pub routine: Option<String>,

    /// 脚本文件路径（.toml 或 .json）
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// 整车配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 按真实时间执行
    #[arg(long)]
    pub realtime: bool,

    /// 启动状态显示线程（与 --realtime 一起使用）
    #[arg(long)]
    pub monitor: bool,

    /// 覆盖阶段时长上限（毫秒）
    #[arg(long)]
    pub period_limit_ms: Option<u64>,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let signal = PeriodSignal::new();
        let handler_signal = signal.clone();
        ctrlc::set_handler(move || handler_signal.end())
            .context("failed to install Ctrl-C handler")?;

        let report = self.simulate(signal)?;

        println!();
        println!("📊 执行结果:");
        println!("  结束原因: {:?}", report.outcome);
        println!("  已执行: {} 步", report.steps_executed);
        println!("  耗时: {:.2} 秒", report.elapsed.as_secs_f64());
        if !report.timed_out.is_empty() {
            println!("  ⚠️ 超时步骤: {:?}", report.timed_out);
        }
        Ok(())
    }

    /// 加载配置和脚本并执行
    pub fn simulate(&self, signal: PeriodSignal) -> Result<ScriptReport> {
        let config = match &self.config {
            Some(path) => RobotConfig::load_from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => RobotConfig::default(),
        };
        let (script, default_limit) = self.load_script()?;
        let period_limit = self
            .period_limit_ms
            .map(Duration::from_millis)
            .unwrap_or(default_limit);

        println!("📜 脚本: {} ({} 步)", script.name, script.steps.len());
        if !script.description.is_empty() {
            println!("    {}", script.description);
        }

        let executor = ScriptExecutor::new(
            ExecutorConfig {
                period: config.teleop.period(),
                period_limit: Some(period_limit),
                ..ExecutorConfig::default()
            },
            signal,
        );

        if self.realtime {
            self.run_on(SystemClock::new(), config, &script, &executor)
        } else {
            self.run_on(ManualClock::new(), config, &script, &executor)
        }
    }

    fn load_script(&self) -> Result<(Script, Duration)> {
        if let Some(path) = &self.script {
            let script = Script::load(path)
                .with_context(|| format!("failed to load script {}", path.display()))?;
            return Ok((script, DEFAULT_PERIOD_LIMIT));
        }

        let routine = match &self.routine {
            Some(name) => name.parse::<Routine>()?,
            None => Routine::DEFAULT,
        };
        Ok((routine.script()?, routine.period_limit()))
    }

    fn run_on<C>(
        &self,
        clock: C,
        config: RobotConfig,
        script: &Script,
        executor: &ScriptExecutor,
    ) -> Result<ScriptReport>
    where
        C: Clock + Clone + Send + Sync + 'static,
    {
        let mut sim = SimRobot::new(clock.clone(), config);

        let monitor = if self.monitor {
            let monitor = StatusMonitor::spawn(sim.robot.observer(), DEFAULT_MONITOR_INTERVAL)
                .context("failed to start status monitor")?;
            Some(monitor)
        } else {
            None
        };

        let report = {
            let mut token = sim.robot.take_control(ControlMode::Autonomous)?;
            executor.run(&mut token, script, &mut sim.chassis, &clock)?
        };

        if let Some(monitor) = monitor {
            let lines = monitor.stop();
            debug!(lines, "status monitor stopped");
        }

        let pose = sim.chassis.pose();
        debug!(events = sim.rig.events().len(), "device events recorded");
        println!(
            "📍 最终位姿: x={:.1} y={:.1} heading={:.1}",
            pose.x, pose.y, pose.heading
        );
        Ok(report)
    }
}
