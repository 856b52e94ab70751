//! 脚本执行器
//!
//! 在单一控制线程上严格按顺序执行脚本步骤。运动命令由运动控制器在后台执行，
//! 执行器只在等待步骤上挂起；挂起期间每个控制周期都推进一次子系统，
//! 因此手臂阈值动作、自动送环和夹爪两步闭合在等待时照常进行。
//!
//! # 等待上限
//!
//! | 步骤 | 结束条件 | 上限 |
//! |------|----------|------|
//! | `wait_until_done` | 运动结束 | 运动超时 + 余量 |
//! | `wait_until_progress` | 进度达到百分比或运动结束 | 运动超时 + 余量 |
//! | `wait_for_arm` | 手臂意图回到 `Hold` | 步骤超时 |
//! | `wait_for_loader` | 取环位达到指定状态 | 步骤超时 |
//! | `delay` | 时间到 | - |
//!
//! 超时不是错误：记录告警后继续执行下一步。阶段结束信号或阶段时长上限会终止脚本。

use crate::error::ScriptError;
use crate::script::Script;
use crate::step::{IntentChange, ScriptStep};
use mogo_control::{
    ArmIntent, BoundedWait, ControlMode, ControlToken, PeriodSignal, WaitOutcome, WaitResult,
};
use mogo_hal::{Clock, MotionController, Point, Pose};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 执行器参数
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// 等待期间的控制周期
    pub period: Duration,
    /// 运动等待在命令超时之外的余量
    pub motion_slack: Duration,
    /// 阶段时长上限（比赛自动阶段为 15s）
    pub period_limit: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
            motion_slack: Duration::from_millis(250),
            period_limit: Some(Duration::from_secs(15)),
        }
    }
}

/// 脚本结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// 全部步骤执行完毕
    Completed,
    /// 收到阶段结束信号
    Interrupted,
    /// 达到阶段时长上限
    PeriodExpired,
}

/// 执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptReport {
    pub script: String,
    /// 已执行（含被中断）的步骤数
    pub steps_executed: usize,
    /// 超时结束的步骤索引
    pub timed_out: Vec<usize>,
    pub outcome: ScriptOutcome,
    pub elapsed: Duration,
}

/// 单步执行后的走向
enum Flow {
    Continue,
    TimedOut,
    Stop(ScriptOutcome),
}

/// 最近一次运动命令
#[derive(Debug, Clone, Copy)]
struct ActiveMotion {
    /// 运动等待的绝对截止时刻
    deadline: Duration,
}

/// 脚本执行器
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    config: ExecutorConfig,
    signal: PeriodSignal,
}

impl ScriptExecutor {
    pub fn new(config: ExecutorConfig, signal: PeriodSignal) -> Self {
        Self { config, signal }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// 执行脚本
    ///
    /// # 错误
    ///
    /// - 令牌不是 [`ControlMode::Autonomous`]
    /// - 脚本校验失败
    ///
    /// 运动或等待超时不会返回错误，而是记录在 [`ScriptReport::timed_out`] 中。
    pub fn run<C, M>(
        &self,
        token: &mut ControlToken<'_>,
        script: &Script,
        motion: &mut M,
        clock: &C,
    ) -> Result<ScriptReport, ScriptError>
    where
        C: Clock + ?Sized,
        M: MotionController + ?Sized,
    {
        token.require("ScriptExecutor::run", ControlMode::Autonomous)?;
        script.validate()?;

        info!(script = %script.name, steps = script.steps.len(), "autonomous script started");

        let mut run = Run {
            config: &self.config,
            signal: &self.signal,
            token,
            motion,
            clock,
            start: clock.now(),
            active: None,
        };

        let mut report = ScriptReport {
            script: script.name.clone(),
            steps_executed: 0,
            timed_out: Vec::new(),
            outcome: ScriptOutcome::Completed,
            elapsed: Duration::ZERO,
        };

        for (index, step) in script.steps.iter().enumerate() {
            if let Some(outcome) = run.stop_reason() {
                report.outcome = outcome;
                break;
            }

            info!(index, step = step.kind(), at = ?run.elapsed(), "script step");
            report.steps_executed += 1;

            match run.step(step) {
                Flow::Continue => {},
                Flow::TimedOut => report.timed_out.push(index),
                Flow::Stop(outcome) => {
                    report.outcome = outcome;
                    break;
                },
            }
        }

        report.elapsed = run.elapsed();
        info!(
            script = %report.script,
            outcome = ?report.outcome,
            steps = report.steps_executed,
            timed_out = report.timed_out.len(),
            elapsed = ?report.elapsed,
            "autonomous script finished"
        );
        Ok(report)
    }
}

/// 一次执行的上下文
struct Run<'r, 't, C: ?Sized, M: ?Sized> {
    config: &'r ExecutorConfig,
    signal: &'r PeriodSignal,
    token: &'r mut ControlToken<'t>,
    motion: &'r mut M,
    clock: &'r C,
    start: Duration,
    active: Option<ActiveMotion>,
}

impl<C, M> Run<'_, '_, C, M>
where
    C: Clock + ?Sized,
    M: MotionController + ?Sized,
{
    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start)
    }

    /// 阶段时长剩余（无上限时为 `None`）
    fn remaining(&self) -> Option<Duration> {
        self.config
            .period_limit
            .map(|limit| limit.saturating_sub(self.elapsed()))
    }

    fn stop_reason(&self) -> Option<ScriptOutcome> {
        if self.signal.is_ended() {
            Some(ScriptOutcome::Interrupted)
        } else if self.remaining() == Some(Duration::ZERO) {
            Some(ScriptOutcome::PeriodExpired)
        } else {
            None
        }
    }

    fn step(&mut self, step: &ScriptStep) -> Flow {
        match step {
            ScriptStep::MoveToPoint {
                x,
                y,
                timeout_ms,
                options,
            } => {
                let timeout = Duration::from_millis(*timeout_ms);
                self.motion
                    .move_to_point(Point::new(*x, *y), timeout, *options);
                self.begin_motion(timeout);
                Flow::Continue
            },

            ScriptStep::MoveToPose {
                x,
                y,
                heading,
                timeout_ms,
                options,
            } => {
                let timeout = Duration::from_millis(*timeout_ms);
                self.motion
                    .move_to_pose(Pose::new(*x, *y, *heading), timeout, *options);
                self.begin_motion(timeout);
                Flow::Continue
            },

            ScriptStep::TurnToHeading {
                heading,
                timeout_ms,
                options,
            } => {
                let timeout = Duration::from_millis(*timeout_ms);
                self.motion.turn_to_heading(*heading, timeout, *options);
                self.begin_motion(timeout);
                Flow::Continue
            },

            ScriptStep::WaitUntilDone => self.wait_motion("wait_until_done", None),

            ScriptStep::WaitUntilProgress { percent } => {
                self.wait_motion("wait_until_progress", Some(*percent))
            },

            ScriptStep::SetIntent { target } => self.set_intent(*target),

            ScriptStep::Delay { ms } => {
                let duration = Duration::from_millis(*ms);
                let end = self.clock.now() + duration;
                let result = self.wait("delay", duration, |_, _, now| now >= end);
                match result.outcome {
                    WaitOutcome::Interrupted => Flow::Stop(ScriptOutcome::Interrupted),
                    _ => self.after_limit(Flow::Continue),
                }
            },

            ScriptStep::WaitForArm { timeout_ms } => {
                let result = self.wait("wait_for_arm", Duration::from_millis(*timeout_ms), |token, _, _| {
                    token.arm().is_holding()
                });
                match result.outcome {
                    WaitOutcome::Completed => Flow::Continue,
                    WaitOutcome::Interrupted => Flow::Stop(ScriptOutcome::Interrupted),
                    WaitOutcome::TimedOut => {
                        let intent = self.token.arm().intent();
                        warn!(?intent, "arm did not reach its threshold in time, holding");
                        self.token.set_arm_intent(ArmIntent::Hold);
                        self.tick();
                        self.after_limit(Flow::TimedOut)
                    },
                }
            },

            ScriptStep::WaitForLoader { until, timeout_ms } => {
                let until = *until;
                let result = self.wait(
                    "wait_for_loader",
                    Duration::from_millis(*timeout_ms),
                    move |token, _, _| token.loader_occupancy() == Some(until),
                );
                match result.outcome {
                    WaitOutcome::Completed => Flow::Continue,
                    WaitOutcome::Interrupted => Flow::Stop(ScriptOutcome::Interrupted),
                    WaitOutcome::TimedOut => self.after_limit(Flow::TimedOut),
                }
            },
        }
    }

    fn begin_motion(&mut self, timeout: Duration) {
        let deadline = self.clock.now() + timeout + self.config.motion_slack;
        self.active = Some(ActiveMotion { deadline });
    }

    /// 等待当前运动结束（`percent` 为 `None`）或达到进度
    fn wait_motion(&mut self, label: &'static str, percent: Option<f64>) -> Flow {
        let Some(active) = self.active else {
            return Flow::Continue;
        };

        let budget = active.deadline.saturating_sub(self.clock.now());
        let result = self.wait(label, budget, |_, motion, _| match percent {
            None => !motion.is_in_motion(),
            // 运动已结束（到位或超时）也视为达到进度
            Some(percent) => motion.progress().is_none_or(|progress| progress >= percent),
        });

        match result.outcome {
            WaitOutcome::Completed => Flow::Continue,
            WaitOutcome::Interrupted => Flow::Stop(ScriptOutcome::Interrupted),
            WaitOutcome::TimedOut => {
                if self.stop_reason().is_some() {
                    return self.after_limit(Flow::TimedOut);
                }
                warn!(
                    wait = label,
                    elapsed = ?result.elapsed,
                    "motion overran its timeout, cancelling"
                );
                self.motion.cancel();
                self.active = None;
                Flow::TimedOut
            },
        }
    }

    fn set_intent(&mut self, target: IntentChange) -> Flow {
        debug!(?target, "set intent");
        match target {
            IntentChange::Arm(intent) => self.token.set_arm_intent(intent),
            IntentChange::Intake(intent) => self.token.set_intake_intent(intent),
            IntentChange::Clamp(request) => {
                let now = self.clock.now();
                self.token.request_clamp(request, now);
                if self.token.clamp().is_staging() {
                    return self.wait_clamp();
                }
            },
        }
        self.tick();
        Flow::Continue
    }

    /// 两步闭合期间阻塞脚本（其他子系统照常推进）
    fn wait_clamp(&mut self) -> Flow {
        let budget = self.token.config().clamp.settle_delay();
        let result = self.wait("clamp_latch", budget, |token, _, _| {
            !token.clamp().is_staging()
        });
        match result.outcome {
            WaitOutcome::Completed => Flow::Continue,
            WaitOutcome::Interrupted => Flow::Stop(ScriptOutcome::Interrupted),
            WaitOutcome::TimedOut => self.after_limit(Flow::TimedOut),
        }
    }

    /// 按控制周期推进子系统，直到 `done` 成立、超时或阶段结束
    ///
    /// 超时会被阶段剩余时间截断。
    fn wait<F>(&mut self, label: &'static str, timeout: Duration, mut done: F) -> WaitResult
    where
        F: FnMut(&ControlToken<'_>, &M, Duration) -> bool,
    {
        let timeout = match self.remaining() {
            Some(remaining) => timeout.min(remaining),
            None => timeout,
        };

        let token = &mut *self.token;
        let motion = &*self.motion;
        BoundedWait::new(label, timeout, self.config.period).run(self.clock, self.signal, |now| {
            token.tick(now);
            done(token, motion, now)
        })
    }

    fn tick(&mut self) {
        let now = self.clock.now();
        self.token.tick(now);
    }

    /// 等待结束后检查是否已到阶段时长上限
    fn after_limit(&self, flow: Flow) -> Flow {
        match self.stop_reason() {
            Some(outcome) => Flow::Stop(outcome),
            None => flow,
        }
    }
}
