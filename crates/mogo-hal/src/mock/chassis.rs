//! 仿真底盘
//!
//! 按时间参数化的运动控制器：命令下发后，进度随时钟线性增长，
//! 到达 100% 即稳定，或在超时时刻停止。位姿在起点和目标之间线性插值。
//!
//! 进度完全由时钟推算，因此在调用方休眠期间运动"在后台继续"，
//! 与真实运动控制器在独立任务中执行轨迹的行为一致。

use crate::{AngularDirection, Clock, MotionController, MotionOptions, Point, Pose};
use std::time::Duration;
use tracing::trace;

/// 仿真底盘参数
#[derive(Debug, Clone)]
pub struct SimChassisConfig {
    /// 满速（max_speed = 127）时的直线速度（英寸/秒）
    pub top_speed_ips: f64,
    /// 满速时的转向速度（度/秒）
    pub turn_rate_dps: f64,
    /// 单条命令的最短执行时间
    pub min_duration: Duration,
}

impl Default for SimChassisConfig {
    fn default() -> Self {
        Self {
            top_speed_ips: 60.0,
            turn_rate_dps: 360.0,
            min_duration: Duration::from_millis(50),
        }
    }
}

/// 运动命令类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommandKind {
    Point(Point),
    Pose(Pose),
    Heading(f64),
}

/// 已下发的运动命令记录
#[derive(Debug, Clone, PartialEq)]
pub struct MotionRecord {
    pub issued_at: Duration,
    pub kind: MotionCommandKind,
    pub timeout: Duration,
    pub options: MotionOptions,
}

#[derive(Debug, Clone)]
struct ActiveCommand {
    start: Pose,
    target: Pose,
    /// 航向变化量（带符号，已按转向方向展开）
    heading_delta: f64,
    issued_at: Duration,
    /// 名义执行时间，`None` 表示底盘卡住（进度不增长）
    nominal: Option<Duration>,
    timeout: Duration,
}

impl ActiveCommand {
    /// 命令结束时刻（相对下发时刻）
    fn end(&self) -> Duration {
        match self.nominal {
            Some(nominal) => nominal.min(self.timeout),
            None => self.timeout,
        }
    }

    /// 已完成比例（0.0-1.0）
    fn fraction(&self, elapsed: Duration) -> f64 {
        match self.nominal {
            Some(nominal) => {
                let elapsed = elapsed.min(self.end());
                (elapsed.as_secs_f64() / nominal.as_secs_f64()).min(1.0)
            },
            None => 0.0,
        }
    }

    fn pose_at(&self, fraction: f64) -> Pose {
        Pose::new(
            self.start.x + (self.target.x - self.start.x) * fraction,
            self.start.y + (self.target.y - self.start.y) * fraction,
            (self.start.heading + self.heading_delta * fraction).rem_euclid(360.0),
        )
    }
}

/// 从 `from` 转到 `to` 的最短带符号角度差（度）
fn shortest_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// 按指定方向从 `from` 转到 `to` 的带符号角度差（度）
fn directed_delta(from: f64, to: f64, direction: Option<AngularDirection>) -> f64 {
    match direction {
        Some(AngularDirection::Clockwise) => (to - from).rem_euclid(360.0),
        Some(AngularDirection::Counterclockwise) => -(from - to).rem_euclid(360.0),
        None => shortest_delta(from, to),
    }
}

/// 仿真底盘
pub struct SimChassis<C: Clock> {
    clock: C,
    config: SimChassisConfig,
    rest: Pose,
    active: Option<ActiveCommand>,
    stalled: bool,
    last_arcade: (i32, i32),
    history: Vec<MotionRecord>,
}

impl<C: Clock> SimChassis<C> {
    pub fn new(clock: C) -> Self {
        Self::with_config(clock, SimChassisConfig::default())
    }

    pub fn with_config(clock: C, config: SimChassisConfig) -> Self {
        Self {
            clock,
            config,
            rest: Pose::default(),
            active: None,
            stalled: false,
            last_arcade: (0, 0),
            history: Vec::new(),
        }
    }

    /// 设置初始位姿
    pub fn set_pose(&mut self, pose: Pose) {
        self.active = None;
        self.rest = pose;
    }

    /// 模拟底盘卡住：之后下发的命令进度不再增长，只能以超时结束
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// 已下发的运动命令
    pub fn history(&self) -> &[MotionRecord] {
        &self.history
    }

    /// 最近一次 arcade 输入
    pub fn last_arcade(&self) -> (i32, i32) {
        self.last_arcade
    }

    fn speed_scale(options: &MotionOptions) -> f64 {
        (options.max_speed.unwrap_or(127.0) / 127.0).clamp(0.05, 1.0)
    }

    fn issue(&mut self, kind: MotionCommandKind, timeout: Duration, options: MotionOptions) {
        let now = self.clock.now();
        let start = self.pose();
        let scale = Self::speed_scale(&options);
        let linear = self.config.top_speed_ips * scale;
        let angular = self.config.turn_rate_dps * scale;

        let (target, heading_delta, seconds) = match kind {
            MotionCommandKind::Point(point) => {
                let distance = start.point().distance(&point);
                let mut heading = (point.x - start.x).atan2(point.y - start.y).to_degrees();
                if !options.forwards {
                    heading += 180.0;
                }
                let heading = if distance > f64::EPSILON {
                    heading.rem_euclid(360.0)
                } else {
                    start.heading
                };
                let delta = shortest_delta(start.heading, heading);
                (Pose::new(point.x, point.y, heading), delta, distance / linear)
            },
            MotionCommandKind::Pose(pose) => {
                let distance = start.point().distance(&pose.point());
                let delta = shortest_delta(start.heading, pose.heading);
                (pose, delta, distance / linear + delta.abs() / angular)
            },
            MotionCommandKind::Heading(heading) => {
                let delta = directed_delta(start.heading, heading, options.direction);
                let target = Pose::new(start.x, start.y, heading.rem_euclid(360.0));
                (target, delta, delta.abs() / angular)
            },
        };

        let nominal = if self.stalled {
            None
        } else {
            // 目标不可达（非有限数值）时按超时结束
            let nominal = Duration::try_from_secs_f64(seconds).unwrap_or(timeout);
            Some(nominal.max(self.config.min_duration))
        };

        trace!(?kind, ?nominal, ?timeout, "sim chassis command");

        self.rest = start;
        self.active = Some(ActiveCommand {
            start,
            target,
            heading_delta,
            issued_at: now,
            nominal,
            timeout,
        });
        self.history.push(MotionRecord {
            issued_at: now,
            kind,
            timeout,
            options,
        });
    }
}

impl<C: Clock> MotionController for SimChassis<C> {
    fn move_to_point(&mut self, target: Point, timeout: Duration, options: MotionOptions) {
        self.issue(MotionCommandKind::Point(target), timeout, options);
    }

    fn move_to_pose(&mut self, target: Pose, timeout: Duration, options: MotionOptions) {
        self.issue(MotionCommandKind::Pose(target), timeout, options);
    }

    fn turn_to_heading(&mut self, heading: f64, timeout: Duration, options: MotionOptions) {
        self.issue(MotionCommandKind::Heading(heading), timeout, options);
    }

    fn arcade(&mut self, throttle: i32, turn: i32) {
        self.last_arcade = (throttle, turn);
    }

    fn pose(&self) -> Pose {
        match &self.active {
            Some(cmd) => {
                let elapsed = self.clock.now().saturating_sub(cmd.issued_at);
                cmd.pose_at(cmd.fraction(elapsed))
            },
            None => self.rest,
        }
    }

    fn is_in_motion(&self) -> bool {
        match &self.active {
            Some(cmd) => self.clock.now().saturating_sub(cmd.issued_at) < cmd.end(),
            None => false,
        }
    }

    fn progress(&self) -> Option<f64> {
        if !self.is_in_motion() {
            return None;
        }
        let cmd = self.active.as_ref()?;
        let elapsed = self.clock.now().saturating_sub(cmd.issued_at);
        Some(cmd.fraction(elapsed) * 100.0)
    }

    fn cancel(&mut self) {
        self.rest = self.pose();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ManualClock;

    #[test]
    fn test_progress_grows_then_settles() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());

        // 满速 60 ips，30 英寸需要 0.5s
        chassis.move_to_point(
            Point::new(0.0, 30.0),
            Duration::from_secs(2),
            MotionOptions::default(),
        );
        assert!(chassis.is_in_motion());
        assert_eq!(chassis.progress(), Some(0.0));

        clock.advance(Duration::from_millis(250));
        let progress = chassis.progress().unwrap();
        assert!((progress - 50.0).abs() < 1e-6, "progress = {}", progress);
        assert!((chassis.pose().y - 15.0).abs() < 1e-6);

        clock.advance(Duration::from_millis(250));
        assert!(!chassis.is_in_motion());
        assert_eq!(chassis.progress(), None);
        assert!((chassis.pose().y - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_timeout_stops_short_of_target() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());

        chassis.move_to_point(
            Point::new(0.0, 60.0),
            Duration::from_millis(500),
            MotionOptions::default(),
        );
        clock.advance(Duration::from_millis(600));

        assert!(!chassis.is_in_motion());
        let pose = chassis.pose();
        assert!((pose.y - 30.0).abs() < 1e-6, "pose = {:?}", pose);
    }

    #[test]
    fn test_stalled_chassis_only_times_out() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());
        chassis.set_stalled(true);

        chassis.turn_to_heading(90.0, Duration::from_millis(1000), MotionOptions::default());
        clock.advance(Duration::from_millis(999));
        assert_eq!(chassis.progress(), Some(0.0));

        clock.advance(Duration::from_millis(1));
        assert!(!chassis.is_in_motion());
        assert_eq!(chassis.pose().heading, 0.0);
    }

    #[test]
    fn test_directed_turn_takes_long_way() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());

        // 0 -> 297 逆时针只需 63 度，顺时针需要 297 度
        chassis.turn_to_heading(
            297.0,
            Duration::from_secs(5),
            MotionOptions::default().with_direction(AngularDirection::Counterclockwise),
        );
        clock.advance(Duration::from_millis(175)); // 63 / 360 s
        assert!(!chassis.is_in_motion());
        assert!((chassis.pose().heading - 297.0).abs() < 1e-6);

        chassis.turn_to_heading(
            296.0,
            Duration::from_secs(5),
            MotionOptions::default().with_direction(AngularDirection::Clockwise),
        );
        clock.advance(Duration::from_millis(175));
        assert!(chassis.is_in_motion(), "clockwise 359 degrees should take ~1s");
    }

    #[test]
    fn test_directed_turn_sweeps_requested_way() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());

        // 0 -> 90 强制逆时针，要转 270 度，用时 0.75s
        chassis.turn_to_heading(
            90.0,
            Duration::from_secs(5),
            MotionOptions::default().with_direction(AngularDirection::Counterclockwise),
        );
        clock.advance(Duration::from_millis(250));
        let heading = chassis.pose().heading;
        assert!((heading - 270.0).abs() < 1e-6, "heading = {}", heading);

        clock.advance(Duration::from_millis(500));
        assert!(!chassis.is_in_motion());
        assert!((chassis.pose().heading - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_target_ends_at_timeout() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());

        chassis.move_to_point(
            Point::new(f64::INFINITY, 0.0),
            Duration::from_millis(400),
            MotionOptions::default(),
        );
        clock.advance(Duration::from_millis(399));
        assert!(chassis.is_in_motion());

        clock.advance(Duration::from_millis(1));
        assert!(!chassis.is_in_motion());
    }

    #[test]
    fn test_cancel_freezes_pose() {
        let clock = ManualClock::new();
        let mut chassis = SimChassis::new(clock.clone());
        chassis.move_to_point(
            Point::new(0.0, 30.0),
            Duration::from_secs(2),
            MotionOptions::default(),
        );
        clock.advance(Duration::from_millis(250));
        chassis.cancel();
        clock.advance(Duration::from_millis(250));

        assert!(!chassis.is_in_motion());
        assert!((chassis.pose().y - 15.0).abs() < 1e-6);
        assert_eq!(chassis.history().len(), 1);
    }
}
