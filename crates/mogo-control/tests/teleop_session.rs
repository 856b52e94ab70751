//! 遥控阶段集成测试
//!
//! 使用 mock 设备组 + 手动时钟运行完整的 `TeleopLoop::run`，
//! 通过设备事件记录检查执行器命令的顺序和时间。

use mogo_control::{
    ClampState, ControlError, ControlMode, Hardware, PeriodSignal, Robot, RobotConfig, TeleopLoop,
};
use mogo_hal::mock::{EventKind, LoaderPlantConfig, ManualClock, MockRig, SimChassis};
use mogo_hal::{Button, Clock, RotationSensor};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG=debug cargo test` 时输出控制层日志
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn hardware(rig: &MockRig) -> Hardware {
    let [loader_a, loader_b] = rig.loader.clone();
    let [prestage_a, prestage_b] = rig.clamp_prestage.clone();
    Hardware {
        intake: Box::new(rig.intake.clone()),
        arm: Box::new(rig.arm.clone()),
        arm_rotation: Box::new(rig.arm_rotation.clone()),
        loader: [Box::new(loader_a), Box::new(loader_b)],
        clamp_primary: Box::new(rig.clamp_primary.clone()),
        clamp_prestage: [Box::new(prestage_a), Box::new(prestage_b)],
        interlock: Box::new(rig.interlock.clone()),
    }
}

fn setup(rig: MockRig, clock: &ManualClock) -> (MockRig, Robot, SimChassis<ManualClock>) {
    init_tracing();
    let robot = Robot::new(hardware(&rig), RobotConfig::default());
    let chassis = SimChassis::new(clock.clone());
    (rig, robot, chassis)
}

#[test]
fn test_clamp_staging_while_driving() {
    let clock = ManualClock::new();
    let (rig, robot, mut chassis) = setup(MockRig::new(clock.clone()), &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();

    rig.gamepad.press(Button::B);
    rig.gamepad.set_axis(mogo_hal::Axis::LeftY, 80);

    let mut token = robot.take_control(ControlMode::Teleop).unwrap();
    let report = TeleopLoop::new(&config.teleop)
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(50))
        .unwrap();

    assert_eq!(report.ticks, 50);
    assert_eq!(report.clamp_toggles, 1);
    assert!(!report.ended_by_signal);
    assert_eq!(clock.now(), Duration::from_millis(500));
    assert_eq!(chassis.last_arcade(), (80, 0));
    assert_eq!(token.clamp().state(), ClampState::Latched);

    // 预压气缸先动作，主气缸在 150ms 后闭合
    let prestage = rig.recorder.events_for("clamp_prestage_left");
    let primary = rig.recorder.events_for("clamp");
    assert_eq!(prestage.len(), 1);
    assert_eq!(primary.len(), 1);
    assert_eq!(prestage[0].kind, EventKind::Digital(true));
    assert_eq!(primary[0].at - prestage[0].at, Duration::from_millis(150));

    // 等待期间手臂和滚筒每个周期都有命令
    let arm_commands_during_settle = rig
        .recorder
        .events_for("arm")
        .iter()
        .filter(|e| e.at < primary[0].at && e.kind == EventKind::Brake)
        .count();
    assert!(arm_commands_during_settle >= 15, "{}", arm_commands_during_settle);
}

#[test]
fn test_release_turns_all_outputs_off_in_one_tick() {
    let clock = ManualClock::new();
    let (rig, robot, mut chassis) = setup(MockRig::new(clock.clone()), &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();
    let mut teleop = TeleopLoop::new(&config.teleop);
    let mut token = robot.take_control(ControlMode::Teleop).unwrap();

    rig.gamepad.press(Button::B);
    teleop
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(20))
        .unwrap();
    rig.gamepad.release(Button::B);
    teleop
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(21))
        .unwrap();
    rig.gamepad.press(Button::B);
    teleop
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(22))
        .unwrap();

    assert_eq!(token.clamp().state(), ClampState::Unlatched);
    let offs: Vec<_> = rig
        .events()
        .into_iter()
        .filter(|e| e.kind == EventKind::Digital(false))
        .collect();
    assert_eq!(offs.len(), 3);
    assert_eq!(offs[0].device, "clamp");
    assert!(offs.iter().all(|e| e.at == offs[0].at));
}

#[test]
fn test_free_raise_stops_at_band_limit() {
    let clock = ManualClock::new();
    let rig = MockRig::new(clock.clone()).with_arm_plant(10.0);
    rig.arm_rotation.set(5000);
    let (rig, robot, mut chassis) = setup(rig, &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();

    rig.gamepad.press(Button::R1);
    let mut token = robot.take_control(ControlMode::Teleop).unwrap();
    TeleopLoop::new(&config.teleop)
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(300))
        .unwrap();

    let angle = rig.arm_rotation.angle().unwrap();
    assert!((15300..15400).contains(&angle), "angle = {}", angle);
    assert!(rig.arm.is_braked());
}

#[test]
fn test_auto_feed_cycles_with_loader() {
    let clock = ManualClock::new();
    let rig = MockRig::new(clock.clone()).with_loader_plant(LoaderPlantConfig::default());
    let (rig, robot, mut chassis) = setup(rig, &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();

    rig.interlock.set(true);
    rig.gamepad.press(Button::L1);
    rig.gamepad.press(Button::R2);

    let mut token = robot.take_control(ControlMode::Teleop).unwrap();
    TeleopLoop::new(&config.teleop)
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(120))
        .unwrap();

    let velocities: Vec<i32> = rig
        .recorder
        .events_for("intake")
        .into_iter()
        .filter_map(|e| match e.kind {
            EventKind::Velocity(v) => Some(v),
            _ => None,
        })
        .collect();
    assert!(velocities.contains(&130));
    assert!(velocities.contains(&-140));
    assert!(velocities.iter().all(|v| *v == 130 || *v == -140));
    // 手臂在底部，R2 不会驱动手臂
    assert!(rig.arm.is_braked());
}

#[test]
fn test_period_signal_ends_loop() {
    let clock = ManualClock::new();
    let (rig, robot, mut chassis) = setup(MockRig::new(clock.clone()), &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();
    signal.end();

    let mut token = robot.take_control(ControlMode::Teleop).unwrap();
    let report = TeleopLoop::new(&config.teleop)
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, None)
        .unwrap();

    assert_eq!(report.ticks, 0);
    assert!(report.ended_by_signal);
}

#[test]
fn test_teleop_requires_teleop_token() {
    let clock = ManualClock::new();
    let (rig, robot, mut chassis) = setup(MockRig::new(clock.clone()), &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();

    let mut token = robot.take_control(ControlMode::Autonomous).unwrap();
    let err = TeleopLoop::new(&config.teleop)
        .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(1))
        .unwrap_err();
    assert!(matches!(err, ControlError::WrongMode { .. }));
}

#[test]
fn test_token_release_stops_motors() {
    let clock = ManualClock::new();
    let (rig, robot, mut chassis) = setup(MockRig::new(clock.clone()), &clock);
    let config = RobotConfig::default();
    let signal = PeriodSignal::new();

    rig.gamepad.press(Button::L1);
    {
        let mut token = robot.take_control(ControlMode::Teleop).unwrap();
        TeleopLoop::new(&config.teleop)
            .run(&mut token, &rig.gamepad, &mut chassis, &clock, &signal, Some(5))
            .unwrap();
        assert_eq!(rig.intake.velocity(), 600);
    }

    assert_eq!(rig.intake.velocity(), 0);
    assert_eq!(robot.owner(), None);
}
