//! 脚本执行器集成测试
//!
//! mock 设备组 + 仿真底盘 + 手动时钟，完整执行脚本后检查设备事件和执行报告。

use mogo_auton::{ExecutorConfig, Routine, Script, ScriptError, ScriptExecutor, ScriptOutcome};
use mogo_control::{ControlError, ControlMode, Hardware, PeriodSignal, Robot, RobotConfig};
use mogo_hal::mock::{EventKind, LoaderPlantConfig, ManualClock, MockRig, SimChassis};
use mogo_hal::{Clock, MotionController, MotionOptions, Point, Pose, RotationSensor};
use std::time::Duration;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

struct Bench {
    clock: ManualClock,
    rig: MockRig,
    robot: Robot,
    chassis: SimChassis<ManualClock>,
}

impl Bench {
    fn new(rig: impl FnOnce(MockRig) -> MockRig) -> Self {
        Self::with_config(rig, RobotConfig::default())
    }

    fn with_config(rig: impl FnOnce(MockRig) -> MockRig, config: RobotConfig) -> Self {
        let clock = ManualClock::new();
        let rig = rig(MockRig::new(clock.clone()));
        let robot = Robot::new(Hardware::from_mock(&rig), config);
        let chassis = SimChassis::new(clock.clone());
        Self {
            clock,
            rig,
            robot,
            chassis,
        }
    }

    fn plain() -> Self {
        Self::new(|rig| rig)
    }

    fn first_event(&self, device: &str, kind: EventKind) -> Option<Duration> {
        self.rig
            .recorder
            .events_for(device)
            .into_iter()
            .find(|e| e.kind == kind)
            .map(|e| e.at)
    }
}

fn executor() -> ScriptExecutor {
    ScriptExecutor::new(ExecutorConfig::default(), PeriodSignal::new())
}

/// 运动命令只能被取消，永远不会自己结束
#[derive(Default)]
struct StuckChassis {
    in_motion: bool,
    cancelled: u32,
}

impl MotionController for StuckChassis {
    fn move_to_point(&mut self, _: Point, _: Duration, _: MotionOptions) {
        self.in_motion = true;
    }

    fn move_to_pose(&mut self, _: Pose, _: Duration, _: MotionOptions) {
        self.in_motion = true;
    }

    fn turn_to_heading(&mut self, _: f64, _: Duration, _: MotionOptions) {
        self.in_motion = true;
    }

    fn arcade(&mut self, _: i32, _: i32) {}

    fn pose(&self) -> Pose {
        Pose::default()
    }

    fn is_in_motion(&self) -> bool {
        self.in_motion
    }

    fn progress(&self) -> Option<f64> {
        self.in_motion.then_some(0.0)
    }

    fn cancel(&mut self) {
        self.in_motion = false;
        self.cancelled += 1;
    }
}

/// 到达指定时刻后发出阶段结束信号的时钟
struct EndsPeriodAt {
    clock: ManualClock,
    signal: PeriodSignal,
    at: Duration,
}

impl Clock for EndsPeriodAt {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn sleep(&self, duration: Duration) {
        self.clock.sleep(duration);
        if self.clock.now() >= self.at {
            self.signal.end();
        }
    }
}

#[test]
fn test_progress_wait_returns_while_still_moving() {
    let mut bench = Bench::plain();
    let script = Script::from_toml_str(
        r#"
        name = "progress"

        [[steps]]
        type = "move_to_point"
        x = 0
        y = 30
        timeout_ms = 2000

        [[steps]]
        type = "wait_until_progress"
        percent = 50

        [[steps]]
        type = "set_intent"
        target = { intake = { run = 600 } }

        [[steps]]
        type = "wait_until_done"
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert_eq!(report.steps_executed, 4);
    assert!(report.timed_out.is_empty());

    // 30 英寸满速 0.5s：滚筒在半程启动，脚本在到位后结束
    let started = bench.first_event("intake", EventKind::Velocity(600)).unwrap();
    assert!(started >= ms(250) && started < ms(270), "{:?}", started);
    assert!(report.elapsed >= ms(500) && report.elapsed < ms(520), "{:?}", report.elapsed);
    assert_eq!(bench.chassis.history().len(), 1);
    assert!((bench.chassis.pose().y - 30.0).abs() < 1e-6);
}

#[test]
fn test_overrunning_motion_is_cancelled_and_script_continues() {
    let bench = Bench::plain();
    let mut chassis = StuckChassis::default();
    let script = Script::from_toml_str(
        r#"
        name = "stuck"

        [[steps]]
        type = "turn_to_heading"
        heading = 90
        timeout_ms = 1000

        [[steps]]
        type = "wait_until_done"

        [[steps]]
        type = "set_intent"
        target = { intake = "manual_forward" }
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert_eq!(report.timed_out, vec![1]);
    assert_eq!(report.steps_executed, 3);
    assert_eq!(chassis.cancelled, 1);

    // 命令超时 1000ms + 余量 250ms
    assert_eq!(report.elapsed, ms(1250));
    assert_eq!(bench.first_event("intake", EventKind::Velocity(600)), Some(ms(1250)));
}

#[test]
fn test_stalled_chassis_ends_at_command_timeout() {
    let mut bench = Bench::plain();
    bench.chassis.set_stalled(true);
    let script = Script::from_toml_str(
        r#"
        name = "stalled"

        [[steps]]
        type = "move_to_point"
        x = 0
        y = 24
        timeout_ms = 800

        [[steps]]
        type = "wait_until_done"
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert!(report.timed_out.is_empty());
    assert_eq!(report.elapsed, ms(800));
    assert_eq!(bench.chassis.pose(), Pose::default());
}

#[test]
fn test_period_limit_stops_script() {
    let mut bench = Bench::plain();
    let config = ExecutorConfig {
        period_limit: Some(Duration::from_secs(1)),
        ..ExecutorConfig::default()
    };
    let script = Script::from_toml_str(
        r#"
        name = "too-long"

        [[steps]]
        type = "move_to_point"
        x = 0
        y = 600
        timeout_ms = 10000

        [[steps]]
        type = "wait_until_done"

        [[steps]]
        type = "set_intent"
        target = { intake = { run = 600 } }
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = ScriptExecutor::new(config, PeriodSignal::new())
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::PeriodExpired);
    assert_eq!(report.steps_executed, 2);
    assert_eq!(report.elapsed, Duration::from_secs(1));
    assert_eq!(bench.first_event("intake", EventKind::Velocity(600)), None);
}

#[test]
fn test_period_signal_interrupts_delay() {
    let mut bench = Bench::plain();
    let signal = PeriodSignal::new();
    let clock = EndsPeriodAt {
        clock: bench.clock.clone(),
        signal: signal.clone(),
        at: Duration::from_secs(2),
    };
    let script = Script::from_toml_str(
        r#"
        name = "interrupted"

        [[steps]]
        type = "move_to_point"
        x = 0
        y = 30
        timeout_ms = 2000

        [[steps]]
        type = "wait_until_done"

        [[steps]]
        type = "delay"
        ms = 5000

        [[steps]]
        type = "set_intent"
        target = { intake = { run = 600 } }
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = ScriptExecutor::new(ExecutorConfig::default(), signal)
        .run(&mut token, &script, &mut bench.chassis, &clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Interrupted);
    assert_eq!(report.steps_executed, 3);
    assert_eq!(report.elapsed, Duration::from_secs(2));
    assert_eq!(bench.first_event("intake", EventKind::Velocity(600)), None);
}

#[test]
fn test_delay_and_settle_off_period_boundary() {
    let mut config = RobotConfig::default();
    config.clamp.settle_delay_ms = 155;
    let mut bench = Bench::with_config(|rig| rig, config);
    let script = Script::from_toml_str(
        r#"
        name = "odd-timing"

        [[steps]]
        type = "delay"
        ms = 155

        [[steps]]
        type = "set_intent"
        target = { clamp = "latch" }
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert!(report.timed_out.is_empty());
    assert_eq!(report.elapsed, ms(310));

    let staged = bench.first_event("clamp_prestage_right", EventKind::Digital(true)).unwrap();
    let engaged = bench.first_event("clamp", EventKind::Digital(true)).unwrap();
    assert_eq!(staged, ms(155));
    assert_eq!(engaged, ms(310));
    assert!(token.clamp().is_latched());
}

#[test]
fn test_teleop_token_rejected() {
    let mut bench = Bench::plain();
    let script = Routine::DEFAULT.script().unwrap();

    let mut token = bench.robot.take_control(ControlMode::Teleop).unwrap();
    let err = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap_err();

    assert!(matches!(
        err,
        ScriptError::Control(ControlError::WrongMode {
            expected: ControlMode::Autonomous,
            actual: ControlMode::Teleop,
            ..
        })
    ));
    assert!(bench.chassis.history().is_empty());
}

#[test]
fn test_latch_while_moving() {
    let mut bench = Bench::plain();
    let script = Script::from_toml_str(
        r#"
        name = "grab"

        [[steps]]
        type = "move_to_point"
        x = 0
        y = -30
        timeout_ms = 2000
        options = { forwards = false }

        [[steps]]
        type = "wait_until_progress"
        percent = 30

        [[steps]]
        type = "set_intent"
        target = { clamp = "latch" }

        [[steps]]
        type = "wait_until_done"
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert!(token.clamp().is_latched());

    let staged = bench.first_event("clamp_prestage_right", EventKind::Digital(true)).unwrap();
    let engaged = bench.first_event("clamp", EventKind::Digital(true)).unwrap();
    assert_eq!(engaged - staged, ms(150));
    // 两步闭合在运动过程中完成
    assert!(staged >= ms(150) && engaged < ms(500), "{:?} {:?}", staged, engaged);
}

#[test]
fn test_wait_for_arm_with_plant() {
    let mut bench = Bench::new(|rig| rig.with_arm_plant(10.0));
    bench.rig.arm_rotation.set(5000);
    let script = Script::from_toml_str(
        r#"
        name = "arm"

        [[steps]]
        type = "set_intent"
        target = { arm = { raise_to_high = { threshold = 9000 } } }

        [[steps]]
        type = "wait_for_arm"
        timeout_ms = 2000
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert!(report.timed_out.is_empty());
    assert!(token.arm().is_holding());

    // 600 RPM * 10 = 6000/s，4000 需要约 670ms
    let angle = bench.rig.arm_rotation.angle().unwrap();
    assert!((9000..9100).contains(&angle), "angle = {}", angle);
    assert!(report.elapsed >= ms(660) && report.elapsed <= ms(700), "{:?}", report.elapsed);
    assert!(bench.rig.arm.is_braked());
}

#[test]
fn test_wait_for_arm_timeout_holds() {
    let mut bench = Bench::plain();
    bench.rig.arm_rotation.set(5000);
    let script = Script::from_toml_str(
        r#"
        name = "arm-stuck"

        [[steps]]
        type = "set_intent"
        target = { arm = { raise_to_high = { threshold = 9000 } } }

        [[steps]]
        type = "wait_for_arm"
        timeout_ms = 300
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert_eq!(report.timed_out, vec![1]);
    assert!(token.arm().is_holding());
    assert_eq!(
        bench.rig.recorder.events_for("arm").last().map(|e| e.kind),
        Some(EventKind::Brake)
    );
}

#[test]
fn test_wait_for_loader_feed_then_clear() {
    let mut bench = Bench::new(|rig| rig.with_loader_plant(LoaderPlantConfig::default()));
    let script = Script::from_toml_str(
        r#"
        name = "loader"

        [[steps]]
        type = "set_intent"
        target = { intake = { run = 140 } }

        [[steps]]
        type = "wait_for_loader"
        until = "occupied"
        timeout_ms = 3000

        [[steps]]
        type = "set_intent"
        target = { intake = { run = -285 } }

        [[steps]]
        type = "wait_for_loader"
        until = "clear"
        timeout_ms = 2000
        "#,
    )
    .unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert!(report.timed_out.is_empty());

    // 进料 300ms + 清出 200ms
    let reversed = bench.first_event("intake", EventKind::Velocity(-285)).unwrap();
    assert!(reversed >= ms(300) && reversed <= ms(320), "{:?}", reversed);
    assert!(report.elapsed >= ms(500) && report.elapsed <= ms(540), "{:?}", report.elapsed);
}

#[test]
fn test_stake_right_routine_on_mock() {
    let mut bench = Bench::new(|rig| {
        rig.with_arm_plant(10.0)
            .with_loader_plant(LoaderPlantConfig::default())
    });
    let script = Routine::StakeRight.script().unwrap();

    let mut token = bench.robot.take_control(ControlMode::Autonomous).unwrap();
    let report = executor()
        .run(&mut token, &script, &mut bench.chassis, &bench.clock)
        .unwrap();

    assert_eq!(report.outcome, ScriptOutcome::Completed);
    assert_eq!(report.steps_executed, script.steps.len());
    assert!(report.timed_out.is_empty(), "{:?}", report.timed_out);
    assert!(report.elapsed < Duration::from_secs(15));

    assert!(token.clamp().is_latched());
    assert!(token.arm().is_holding());
    assert_eq!(bench.chassis.history().len(), 10);

    // 预载圆环反转入位
    assert!(bench.first_event("intake", EventKind::Velocity(-285)).is_some());

    drop(token);
    assert_eq!(bench.robot.owner(), None);
    assert_eq!(
        bench.rig.recorder.events_for("intake").last().map(|e| e.kind),
        Some(EventKind::Velocity(0))
    );
}
